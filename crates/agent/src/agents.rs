//! Task agents.
//!
//! Each agent pairs a [`ToolPlanner`], which decides the tool calls for a
//! request, with the [`GuardrailPolicy`] that checks those calls against the
//! agent's contract before any of them run. Planning is rule based and
//! deterministic; a different planner can be swapped in per category.

use reviewlens_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use reviewlens_core::domain::{AgentOutcome, AgentRequest, Category, DateRange};
use reviewlens_core::errors::{ApplicationError, DomainError};

use crate::chart_kind::ChartSelection;
use crate::guardrails::{GuardrailDecision, GuardrailPolicy, ToolPlan};
use crate::intent::ExtractedIntent;
use crate::tools::{ToolCall, ToolRegistry};

/// Request-independent defaults a planner falls back on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanningContext {
    pub default_range: DateRange,
    pub default_report_name: String,
}

impl PlanningContext {
    /// `YYYY-MM-DD` bounds for a tool call. Malformed request dates are passed
    /// through as written so the tool rejects them.
    fn bounds_for(&self, intent: &ExtractedIntent) -> (String, String) {
        if let Some(dates) = &intent.malformed_dates {
            return (dates.start.clone(), dates.end.clone());
        }
        let range = intent.date_range.unwrap_or(self.default_range);
        (range.start.to_string(), range.end.to_string())
    }
}

pub trait ToolPlanner: Send + Sync {
    fn category(&self) -> Category;

    fn plan(
        &self,
        request: &AgentRequest,
        intent: &ExtractedIntent,
        context: &PlanningContext,
    ) -> Vec<ToolCall>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StrategicPlanner;

impl ToolPlanner for StrategicPlanner {
    fn category(&self) -> Category {
        Category::StrategicRecommendations
    }

    fn plan(
        &self,
        _request: &AgentRequest,
        intent: &ExtractedIntent,
        context: &PlanningContext,
    ) -> Vec<ToolCall> {
        let (start_date, end_date) = context.bounds_for(intent);
        let mut calls = vec![ToolCall::RecommendationsReport { start_date, end_date }];
        if intent.persistence_requested {
            // report text is filled in from the first call's output
            calls.push(ToolCall::SaveReportToPdf {
                report: String::new(),
                file_name: intent
                    .file_name
                    .clone()
                    .unwrap_or_else(|| context.default_report_name.clone()),
            });
        }
        calls
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PlottingPlanner;

impl ToolPlanner for PlottingPlanner {
    fn category(&self) -> Category {
        Category::SentimentPlotting
    }

    fn plan(
        &self,
        _request: &AgentRequest,
        intent: &ExtractedIntent,
        context: &PlanningContext,
    ) -> Vec<ToolCall> {
        let (start_date, end_date) = context.bounds_for(intent);
        let chart_type = match &intent.chart {
            ChartSelection::Kind(kind) => kind.as_str().to_string(),
            ChartSelection::Unsupported(name) => name.clone(),
        };
        vec![ToolCall::SentimentVisualization { chart_type, start_date, end_date }]
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FeedbackPlanner;

impl ToolPlanner for FeedbackPlanner {
    fn category(&self) -> Category {
        Category::FeedbackResponse
    }

    fn plan(
        &self,
        _request: &AgentRequest,
        intent: &ExtractedIntent,
        _context: &PlanningContext,
    ) -> Vec<ToolCall> {
        let review_text = intent.review_text.clone().unwrap_or_default();
        vec![ToolCall::FeedbackResponse { review_text }]
    }
}

pub struct TaskAgent {
    planner: Box<dyn ToolPlanner>,
    guardrails: GuardrailPolicy,
}

impl TaskAgent {
    pub fn new(planner: Box<dyn ToolPlanner>) -> Self {
        Self { planner, guardrails: GuardrailPolicy }
    }

    pub fn category(&self) -> Category {
        self.planner.category()
    }

    /// Plans, checks the plan, then executes its calls in order. Returns the
    /// last call's outcome, or the first invalid-input outcome encountered.
    pub async fn run(
        &self,
        request: &AgentRequest,
        intent: &ExtractedIntent,
        context: &PlanningContext,
        tools: &ToolRegistry,
        audit_sink: &dyn AuditSink,
    ) -> Result<AgentOutcome, ApplicationError> {
        let category = self.category();
        let calls = self.planner.plan(request, intent, context);

        let decision = self.guardrails.evaluate(&ToolPlan {
            category,
            persistence_requested: intent.persistence_requested,
            calls: &calls,
        });
        if let GuardrailDecision::Deny { reason_code, message } = &decision {
            tracing::error!(
                event_name = "agent.contract_violation",
                correlation_id = %request.request_id,
                category = %category,
                reason_code = *reason_code,
                message = %message,
                "tool plan rejected"
            );
            audit_sink.emit(
                AuditEvent::new(
                    request.request_id.clone(),
                    "agent.plan_rejected",
                    AuditCategory::Agent,
                    category.as_str(),
                    AuditOutcome::Rejected,
                )
                .with_metadata("reason_code", *reason_code)
                .with_metadata("calls", calls.len().to_string()),
            );
        }
        decision.into_result(category)?;

        let mut last: Option<AgentOutcome> = None;
        for call in calls {
            let call = match (call, &last) {
                (ToolCall::SaveReportToPdf { file_name, .. }, Some(report)) => {
                    ToolCall::SaveReportToPdf { report: report.value.clone(), file_name }
                }
                (call, _) => call,
            };

            let outcome = match tools.invoke(&call).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    audit_sink.emit(tool_event(request, category, &call, AuditOutcome::Failed));
                    return Err(error);
                }
            };
            audit_sink.emit(
                tool_event(request, category, &call, AuditOutcome::Success)
                    .with_metadata("outcome_kind", format!("{:?}", outcome.kind)),
            );
            tracing::info!(
                event_name = "agent.tool_invoked",
                correlation_id = %request.request_id,
                category = %category,
                tool = call.tool_name(),
                outcome_kind = ?outcome.kind,
                "tool call completed"
            );

            if outcome.is_invalid_input() {
                return Ok(outcome);
            }
            last = Some(outcome);
        }

        last.ok_or_else(|| {
            DomainError::InvariantViolation(format!("{category} agent produced no outcome")).into()
        })
    }
}

fn tool_event(
    request: &AgentRequest,
    category: Category,
    call: &ToolCall,
    outcome: AuditOutcome,
) -> AuditEvent {
    AuditEvent::new(
        request.request_id.clone(),
        "agent.tool_invoked",
        AuditCategory::Tool,
        category.as_str(),
        outcome,
    )
    .with_metadata("tool", call.tool_name())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use async_trait::async_trait;
    use reviewlens_analytics::ChartKind;
    use reviewlens_core::audit::{AuditOutcome, InMemoryAuditSink};
    use reviewlens_core::domain::{AgentOutcome, AgentRequest, Category, DateRange};
    use reviewlens_core::errors::ApplicationError;
    use serde_json::{json, Value};

    use super::{
        FeedbackPlanner, PlanningContext, PlottingPlanner, StrategicPlanner, TaskAgent,
        ToolPlanner,
    };
    use crate::chart_kind::ChartSelection;
    use crate::intent::{ExtractedIntent, IntentExtractor};
    use crate::tools::{Tool, ToolCall, ToolRegistry};

    #[derive(Clone)]
    struct RecordingTool {
        name: &'static str,
        reply: Value,
        inputs: Arc<Mutex<Vec<Value>>>,
    }

    impl RecordingTool {
        fn new(name: &'static str, reply: Value) -> Self {
            Self { name, reply, inputs: Arc::default() }
        }

        fn inputs(&self) -> Vec<Value> {
            self.inputs.lock().expect("inputs lock").clone()
        }
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self, input: Value) -> Result<Value> {
            self.inputs.lock().expect("inputs lock").push(input);
            Ok(self.reply.clone())
        }
    }

    struct TwoChartPlanner;

    impl ToolPlanner for TwoChartPlanner {
        fn category(&self) -> Category {
            Category::SentimentPlotting
        }

        fn plan(
            &self,
            request: &AgentRequest,
            intent: &ExtractedIntent,
            context: &PlanningContext,
        ) -> Vec<ToolCall> {
            let mut calls = PlottingPlanner.plan(request, intent, context);
            let repeated = calls.clone();
            calls.extend(repeated);
            calls
        }
    }

    fn context() -> PlanningContext {
        PlanningContext {
            default_range: DateRange::parse("2018-01-01", "2019-12-31").expect("range"),
            default_report_name: "strategic_report.pdf".to_string(),
        }
    }

    fn plan_for(planner: &dyn ToolPlanner, text: &str) -> Vec<ToolCall> {
        let request = AgentRequest::new(text);
        planner.plan(&request, &IntentExtractor::new().extract(text), &context())
    }

    #[test]
    fn strategic_plan_persists_only_when_asked() {
        let calls = plan_for(&StrategicPlanner, "Generate a report for 2019");
        assert_eq!(
            calls,
            vec![ToolCall::RecommendationsReport {
                start_date: "2019-01-01".to_string(),
                end_date: "2019-12-31".to_string(),
            }]
        );

        let calls = plan_for(&StrategicPlanner, "Generate a report and save it as a PDF");
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            ToolCall::RecommendationsReport {
                start_date: "2018-01-01".to_string(),
                end_date: "2019-12-31".to_string(),
            }
        );
        assert_eq!(
            calls[1],
            ToolCall::SaveReportToPdf {
                report: String::new(),
                file_name: "strategic_report.pdf".to_string(),
            }
        );
    }

    #[test]
    fn malformed_request_dates_reach_the_tool_as_written() {
        let calls = plan_for(&StrategicPlanner, "Generate a report for 2019-02-30 to 2019-06-30");
        assert_eq!(
            calls,
            vec![ToolCall::RecommendationsReport {
                start_date: "2019-02-30".to_string(),
                end_date: "2019-06-30".to_string(),
            }]
        );

        let calls = plan_for(&PlottingPlanner, "Plot the sentiment trend from 2019-13-01");
        assert!(matches!(
            &calls[..],
            [ToolCall::SentimentVisualization { start_date, end_date, .. }]
                if start_date == "2019-13-01" && end_date == "2019-13-01"
        ));
    }

    #[test]
    fn plotting_plan_passes_unsupported_kinds_through() {
        let calls = plan_for(&PlottingPlanner, "Plot a scatter chart for 2019");
        assert!(matches!(
            &calls[..],
            [ToolCall::SentimentVisualization { chart_type, .. }] if chart_type == "scatter"
        ));

        let request = AgentRequest::new("plot");
        let mut intent = IntentExtractor::new().extract("plot");
        intent.chart = ChartSelection::Kind(ChartKind::Pie);
        let calls = PlottingPlanner.plan(&request, &intent, &context());
        assert!(matches!(
            &calls[..],
            [ToolCall::SentimentVisualization { chart_type, .. }] if chart_type == "pie"
        ));
    }

    #[test]
    fn feedback_plan_is_a_single_reply_call() {
        let calls = plan_for(&FeedbackPlanner, "Respond to this review: The food was cold");
        assert_eq!(
            calls,
            vec![ToolCall::FeedbackResponse { review_text: "The food was cold".to_string() }]
        );
    }

    #[tokio::test]
    async fn strategic_agent_feeds_report_into_persistence() {
        let report_tool = RecordingTool::new("get_recommendations_report", json!("# Report"));
        let save_tool =
            RecordingTool::new("save_report_to_pdf", json!("Report saved as PDF to r.pdf"));
        let mut tools = ToolRegistry::default();
        tools.register(report_tool.clone());
        tools.register(save_tool.clone());

        let text = "Generate a report for 2019 and save it as a PDF";
        let request = AgentRequest::new(text);
        let intent = IntentExtractor::new().extract(text);
        let sink = InMemoryAuditSink::default();

        let outcome = TaskAgent::new(Box::new(StrategicPlanner))
            .run(&request, &intent, &context(), &tools, &sink)
            .await
            .expect("outcome");

        assert_eq!(outcome, AgentOutcome::text("Report saved as PDF to r.pdf"));
        assert_eq!(report_tool.inputs().len(), 1);
        let saved = save_tool.inputs();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0]["report"], "# Report");
        assert_eq!(
            sink.events().iter().filter(|event| event.event_type == "agent.tool_invoked").count(),
            2
        );
    }

    #[tokio::test]
    async fn invalid_report_input_skips_persistence() {
        let report_tool = RecordingTool::new(
            "get_recommendations_report",
            json!({ "kind": "invalid_input", "value": "start_date must not be empty" }),
        );
        let save_tool = RecordingTool::new("save_report_to_pdf", json!("saved"));
        let mut tools = ToolRegistry::default();
        tools.register(report_tool);
        tools.register(save_tool.clone());

        let text = "report and save it";
        let outcome = TaskAgent::new(Box::new(StrategicPlanner))
            .run(
                &AgentRequest::new(text),
                &IntentExtractor::new().extract(text),
                &context(),
                &tools,
                &InMemoryAuditSink::default(),
            )
            .await
            .expect("outcome");

        assert!(outcome.is_invalid_input());
        assert!(save_tool.inputs().is_empty());
    }

    #[tokio::test]
    async fn nonconforming_plan_fails_before_any_tool_runs() {
        let chart_tool = RecordingTool::new("get_sentiment_visualization", json!("chart.svg"));
        let mut tools = ToolRegistry::default();
        tools.register(chart_tool.clone());
        let sink = InMemoryAuditSink::default();

        let text = "plot the trend";
        let error = TaskAgent::new(Box::new(TwoChartPlanner))
            .run(
                &AgentRequest::with_id("req-7", text),
                &IntentExtractor::new().extract(text),
                &context(),
                &tools,
                &sink,
            )
            .await
            .expect_err("two charts violate the contract");

        assert!(matches!(
            error,
            ApplicationError::ContractViolation {
                category: Category::SentimentPlotting,
                reason_code: "chart_call_count",
                ..
            }
        ));
        assert!(chart_tool.inputs().is_empty());
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "agent.plan_rejected");
        assert_eq!(events[0].outcome, AuditOutcome::Rejected);
        assert_eq!(events[0].request_id, "req-7");
    }
}
