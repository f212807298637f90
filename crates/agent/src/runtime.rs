use std::collections::HashMap;
use std::sync::Arc;

use reviewlens_analytics::{
    ChartRenderer, LlmClient, ReplyDrafter, ReportGenerator, ReportPersister,
    SentimentClassifier, ThemeSummarizer,
};
use reviewlens_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink,
};
use reviewlens_core::config::AppConfig;
use reviewlens_core::domain::{AgentOutcome, AgentRequest, Category, DateRange};
use reviewlens_core::errors::{ApplicationError, DomainError};
use reviewlens_core::flows::{FlowAction, FlowEngine, FlowEvent, RequestFlow};
use reviewlens_core::store::ReviewStore;

use crate::agents::{
    FeedbackPlanner, PlanningContext, PlottingPlanner, StrategicPlanner, TaskAgent, ToolPlanner,
};
use crate::intent::IntentExtractor;
use crate::router;
use crate::tools::{
    FeedbackResponseTool, RecommendationsReportTool, SaveReportTool, SentimentVisualizationTool,
    ToolRegistry,
};

const ACTOR: &str = "reviewlens-agent";

/// Drives one request through the orchestration graph:
/// router, then exactly one task agent, then done.
///
/// Holds no per-request state; the review store is shared read-only.
pub struct AgentRuntime {
    flow: FlowEngine<RequestFlow>,
    extractor: IntentExtractor,
    agents: HashMap<Category, TaskAgent>,
    tools: ToolRegistry,
    context: PlanningContext,
    audit_sink: Arc<dyn AuditSink>,
}

impl AgentRuntime {
    pub fn new(
        store: Arc<ReviewStore>,
        llm: Arc<dyn LlmClient>,
        config: &AppConfig,
    ) -> Result<Self, ApplicationError> {
        let classifier = SentimentClassifier::new(llm.clone());
        let summarizer = ThemeSummarizer::new(llm.clone(), config.summarizer.batch_token_budget);
        let renderer = ChartRenderer::new(&config.output)
            .map_err(|error| ApplicationError::Configuration(error.to_string()))?;
        let persister = ReportPersister::new(&config.output)
            .map_err(|error| ApplicationError::Configuration(error.to_string()))?;

        let mut tools = ToolRegistry::default();
        tools.register(RecommendationsReportTool::new(
            store.clone(),
            ReportGenerator::new(llm.clone(), summarizer),
        ));
        tools.register(SaveReportTool::new(persister));
        tools.register(SentimentVisualizationTool::new(store.clone(), renderer));
        tools.register(FeedbackResponseTool::new(ReplyDrafter::new(llm, classifier)));

        let default_range = store.date_span().or_else(supported_calendar).ok_or_else(|| {
            ApplicationError::Data("no default date range available".to_string())
        })?;

        let runtime = Self {
            flow: FlowEngine::default(),
            extractor: IntentExtractor::new(),
            agents: HashMap::new(),
            tools,
            context: PlanningContext {
                default_range,
                default_report_name: config.output.default_report_name.clone(),
            },
            audit_sink: Arc::new(TracingAuditSink),
        };
        Ok(runtime
            .with_planner(Box::new(StrategicPlanner))
            .with_planner(Box::new(PlottingPlanner))
            .with_planner(Box::new(FeedbackPlanner)))
    }

    pub fn with_audit_sink(mut self, audit_sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = audit_sink;
        self
    }

    /// Replaces the agent for the planner's category.
    pub fn with_planner(mut self, planner: Box<dyn ToolPlanner>) -> Self {
        let agent = TaskAgent::new(planner);
        self.agents.insert(agent.category(), agent);
        self
    }

    pub fn default_range(&self) -> DateRange {
        self.context.default_range
    }

    pub async fn handle(&self, request_text: &str) -> Result<AgentOutcome, ApplicationError> {
        self.handle_request(AgentRequest::new(request_text)).await
    }

    pub async fn handle_request(
        &self,
        request: AgentRequest,
    ) -> Result<AgentOutcome, ApplicationError> {
        let result = self.drive(&request).await;
        match &result {
            Ok(outcome) => tracing::info!(
                event_name = "request.completed",
                correlation_id = %request.request_id,
                outcome_kind = ?outcome.kind,
                "request completed"
            ),
            Err(error) => tracing::error!(
                event_name = "request.failed",
                correlation_id = %request.request_id,
                error = %error,
                "request failed"
            ),
        }
        result
    }

    async fn drive(&self, request: &AgentRequest) -> Result<AgentOutcome, ApplicationError> {
        let audit = AuditContext::new(request.request_id.clone(), ACTOR);
        let sink = self.audit_sink.as_ref();

        let category = router::classify(&request.text);
        sink.emit(
            AuditEvent::new(
                request.request_id.clone(),
                "router.classified",
                AuditCategory::Routing,
                ACTOR,
                AuditOutcome::Success,
            )
            .with_metadata("category", category.as_str()),
        );
        tracing::info!(
            event_name = "router.classified",
            correlation_id = %request.request_id,
            category = %category,
            "request routed"
        );

        let mut state = self.flow.initial_state();
        let mut event = FlowEvent::Classified(category);
        let mut outcome: Option<AgentOutcome> = None;

        loop {
            let transition = self
                .flow
                .apply_with_audit(&state, &event, sink, &audit)
                .map_err(DomainError::from)?;
            state = transition.to;

            for action in &transition.actions {
                match action {
                    FlowAction::RunAgent(category) => {
                        outcome = Some(self.run_agent(*category, request).await?);
                    }
                    FlowAction::ReturnOutcome => {
                        return outcome.take().ok_or_else(|| {
                            DomainError::InvariantViolation(
                                "flow reached done without an outcome".to_string(),
                            )
                            .into()
                        });
                    }
                }
            }

            if state.is_terminal() {
                return Err(DomainError::InvariantViolation(
                    "flow terminated without returning an outcome".to_string(),
                )
                .into());
            }
            event = FlowEvent::OutcomeProduced;
        }
    }

    async fn run_agent(
        &self,
        category: Category,
        request: &AgentRequest,
    ) -> Result<AgentOutcome, ApplicationError> {
        let agent = self.agents.get(&category).ok_or_else(|| {
            ApplicationError::Configuration(format!("no task agent registered for {category}"))
        })?;
        tracing::info!(
            event_name = "agent.started",
            correlation_id = %request.request_id,
            category = %category,
            "task agent started"
        );

        let intent = self.extractor.extract(&request.text);
        agent.run(request, &intent, &self.context, &self.tools, self.audit_sink.as_ref()).await
    }
}

/// Widest range request extraction can produce; used for an empty dataset.
fn supported_calendar() -> Option<DateRange> {
    Some(DateRange::new(DateRange::year(1900)?.start, DateRange::year(2100)?.end))
}
