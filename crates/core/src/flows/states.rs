use serde::{Deserialize, Serialize};

use crate::domain::request::Category;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowState {
    Router,
    StrategicRecommendations,
    SentimentPlotting,
    FeedbackResponse,
    Done,
}

impl FlowState {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::StrategicRecommendations => Self::StrategicRecommendations,
            Category::SentimentPlotting => Self::SentimentPlotting,
            Category::FeedbackResponse => Self::FeedbackResponse,
        }
    }

    /// The task category a state runs, if it is a task state.
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::StrategicRecommendations => Some(Category::StrategicRecommendations),
            Self::SentimentPlotting => Some(Category::SentimentPlotting),
            Self::FeedbackResponse => Some(Category::FeedbackResponse),
            Self::Router | Self::Done => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    Classified(Category),
    OutcomeProduced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    RunAgent(Category),
    ReturnOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: FlowState,
    pub to: FlowState,
    pub event: FlowEvent,
    pub actions: Vec<FlowAction>,
}
