use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    StrategicRecommendations,
    SentimentPlotting,
    FeedbackResponse,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrategicRecommendations => "strategic_recommendations",
            Self::SentimentPlotting => "sentiment_plotting",
            Self::FeedbackResponse => "feedback_response",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single incoming request. Lives for one `handle` call only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentRequest {
    pub request_id: String,
    pub text: String,
}

impl AgentRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { request_id: Uuid::new_v4().to_string(), text: text.into() }
    }

    pub fn with_id(request_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { request_id: request_id.into(), text: text.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Text,
    FilePath,
    InvalidInput,
}

/// The one value threaded through the orchestration graph, whatever agent produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub kind: OutcomeKind,
    pub value: String,
}

impl AgentOutcome {
    pub fn text(value: impl Into<String>) -> Self {
        Self { kind: OutcomeKind::Text, value: value.into() }
    }

    pub fn file_path(value: impl Into<String>) -> Self {
        Self { kind: OutcomeKind::FilePath, value: value.into() }
    }

    pub fn invalid_input(value: impl Into<String>) -> Self {
        Self { kind: OutcomeKind::InvalidInput, value: value.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_invalid_input(&self) -> bool {
        self.kind == OutcomeKind::InvalidInput
    }
}

impl fmt::Display for AgentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
