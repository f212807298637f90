use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reviewlens_analytics::{
    ChartKind, ChartRenderer, ReplyDrafter, ReportGenerator, ReportPersister,
    INVALID_CHART_TYPE_MESSAGE,
};
use reviewlens_core::domain::{AgentOutcome, DateRange};
use reviewlens_core::errors::{ApplicationError, DomainError};
use reviewlens_core::store::ReviewStore;
use serde::Deserialize;
use serde_json::{json, Value};

pub const RECOMMENDATIONS_REPORT_TOOL: &str = "get_recommendations_report";
pub const SAVE_REPORT_TOOL: &str = "save_report_to_pdf";
pub const SENTIMENT_VISUALIZATION_TOOL: &str = "get_sentiment_visualization";
pub const FEEDBACK_RESPONSE_TOOL: &str = "generate_feedback_response";

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<Value>;
}

/// A typed tool invocation chosen by a task agent's planner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolCall {
    RecommendationsReport { start_date: String, end_date: String },
    SaveReportToPdf { report: String, file_name: String },
    SentimentVisualization { chart_type: String, start_date: String, end_date: String },
    FeedbackResponse { review_text: String },
}

impl ToolCall {
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::RecommendationsReport { .. } => RECOMMENDATIONS_REPORT_TOOL,
            Self::SaveReportToPdf { .. } => SAVE_REPORT_TOOL,
            Self::SentimentVisualization { .. } => SENTIMENT_VISUALIZATION_TOOL,
            Self::FeedbackResponse { .. } => FEEDBACK_RESPONSE_TOOL,
        }
    }

    pub fn arguments(&self) -> Value {
        match self {
            Self::RecommendationsReport { start_date, end_date } => {
                json!({ "start_date": start_date, "end_date": end_date })
            }
            Self::SaveReportToPdf { report, file_name } => {
                json!({ "report": report, "file_name": file_name })
            }
            Self::SentimentVisualization { chart_type, start_date, end_date } => json!({
                "chart_type": chart_type,
                "start_date": start_date,
                "end_date": end_date,
            }),
            Self::FeedbackResponse { review_text } => json!({ "review_text": review_text }),
        }
    }
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs one call and normalizes whatever the tool returned into an
    /// [`AgentOutcome`]. Typed application errors raised by a tool pass
    /// through; anything else is reported as an upstream failure of that tool.
    pub async fn invoke(&self, call: &ToolCall) -> Result<AgentOutcome, ApplicationError> {
        let name = call.tool_name();
        let tool = self.get(name).ok_or_else(|| {
            ApplicationError::Configuration(format!("tool `{name}` is not registered"))
        })?;

        let output = tool.execute(call.arguments()).await.map_err(|error| {
            match error.downcast::<ApplicationError>() {
                Ok(application) => application,
                Err(other) => ApplicationError::upstream(name, format!("{other:#}")),
            }
        })?;
        Ok(normalize_tool_output(output))
    }
}

/// Tools return either a plain string or a serialized [`AgentOutcome`].
pub fn normalize_tool_output(output: Value) -> AgentOutcome {
    match output {
        Value::String(text) => AgentOutcome::text(text),
        Value::Object(fields) => {
            let object = Value::Object(fields);
            serde_json::from_value::<AgentOutcome>(object.clone())
                .unwrap_or_else(|_| AgentOutcome::text(object.to_string()))
        }
        other => AgentOutcome::text(other.to_string()),
    }
}

fn outcome_value(outcome: AgentOutcome) -> Result<Value> {
    Ok(serde_json::to_value(outcome)?)
}

fn parse_arguments<T>(tool: &str, input: Value) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(input).map_err(|error| {
        ApplicationError::invalid_input(format!("malformed arguments for `{tool}`: {error}"))
            .into()
    })
}

fn invalid_input_message(error: DomainError) -> String {
    match error {
        DomainError::InvalidInput(message) => message,
        other => other.to_string(),
    }
}

#[derive(Deserialize)]
struct DateRangeArgs {
    start_date: String,
    end_date: String,
}

pub struct RecommendationsReportTool {
    store: Arc<ReviewStore>,
    generator: ReportGenerator,
}

impl RecommendationsReportTool {
    pub fn new(store: Arc<ReviewStore>, generator: ReportGenerator) -> Self {
        Self { store, generator }
    }
}

#[async_trait]
impl Tool for RecommendationsReportTool {
    fn name(&self) -> &'static str {
        RECOMMENDATIONS_REPORT_TOOL
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: DateRangeArgs = parse_arguments(self.name(), input)?;
        let range = match DateRange::parse(&args.start_date, &args.end_date) {
            Ok(range) => range,
            Err(error) => {
                return outcome_value(AgentOutcome::invalid_input(invalid_input_message(error)))
            }
        };

        let reviews = self.store.query_range(range.start, range.end);
        let report = self.generator.generate(&reviews, range).await;
        Ok(Value::String(report))
    }
}

#[derive(Deserialize)]
struct SaveReportArgs {
    report: String,
    file_name: String,
}

pub struct SaveReportTool {
    persister: ReportPersister,
}

impl SaveReportTool {
    pub fn new(persister: ReportPersister) -> Self {
        Self { persister }
    }
}

#[async_trait]
impl Tool for SaveReportTool {
    fn name(&self) -> &'static str {
        SAVE_REPORT_TOOL
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: SaveReportArgs = parse_arguments(self.name(), input)?;
        let persisted = self
            .persister
            .persist(&args.report, &args.file_name)
            .await
            .map_err(|error| ApplicationError::upstream("report_persister", error.to_string()))?;
        Ok(Value::String(persisted.confirmation()))
    }
}

#[derive(Deserialize)]
struct VisualizationArgs {
    chart_type: String,
    start_date: String,
    end_date: String,
}

pub struct SentimentVisualizationTool {
    store: Arc<ReviewStore>,
    renderer: ChartRenderer,
}

impl SentimentVisualizationTool {
    pub fn new(store: Arc<ReviewStore>, renderer: ChartRenderer) -> Self {
        Self { store, renderer }
    }
}

#[async_trait]
impl Tool for SentimentVisualizationTool {
    fn name(&self) -> &'static str {
        SENTIMENT_VISUALIZATION_TOOL
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: VisualizationArgs = parse_arguments(self.name(), input)?;
        let Ok(kind) = args.chart_type.parse::<ChartKind>() else {
            return outcome_value(AgentOutcome::invalid_input(INVALID_CHART_TYPE_MESSAGE));
        };
        let range = match DateRange::parse(&args.start_date, &args.end_date) {
            Ok(range) => range,
            Err(error) => {
                return outcome_value(AgentOutcome::invalid_input(invalid_input_message(error)))
            }
        };

        let reviews = self.store.query_range(range.start, range.end);
        let path = self
            .renderer
            .render(kind, &reviews, range)
            .await
            .map_err(|error| ApplicationError::upstream("chart_renderer", error.to_string()))?;
        outcome_value(AgentOutcome::file_path(path.display().to_string()))
    }
}

#[derive(Deserialize)]
struct FeedbackArgs {
    review_text: String,
}

pub struct FeedbackResponseTool {
    drafter: ReplyDrafter,
}

impl FeedbackResponseTool {
    pub fn new(drafter: ReplyDrafter) -> Self {
        Self { drafter }
    }
}

#[async_trait]
impl Tool for FeedbackResponseTool {
    fn name(&self) -> &'static str {
        FEEDBACK_RESPONSE_TOOL
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: FeedbackArgs = parse_arguments(self.name(), input)?;
        let review_text = args.review_text.trim();
        if review_text.is_empty() {
            return outcome_value(AgentOutcome::invalid_input(
                "Please include the review text to respond to, for example `Respond to this review: <text>`.",
            ));
        }

        let reply = self.drafter.draft(review_text).await?;
        Ok(Value::String(reply))
    }
}
