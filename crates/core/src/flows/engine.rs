use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::flows::states::{FlowAction, FlowEvent, FlowState, TransitionOutcome};

pub trait FlowDefinition {
    fn name(&self) -> &'static str;
    fn initial_state(&self) -> FlowState;
    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Single-pass request graph: Router -> one task state -> Done.
#[derive(Clone, Debug, Default)]
pub struct RequestFlow;

impl FlowDefinition for RequestFlow {
    fn name(&self) -> &'static str {
        "request"
    }

    fn initial_state(&self) -> FlowState {
        FlowState::Router
    }

    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_request(current, event)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn name(&self) -> &'static str {
        self.flow.name()
    }

    pub fn initial_state(&self) -> FlowState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &FlowState,
        event: &FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit.request_id.clone(),
                        "flow.transition_applied",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.request_id.clone(),
                        "flow.transition_rejected",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<RequestFlow> {
    fn default() -> Self {
        Self::new(RequestFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: FlowState, event: FlowEvent },
}

fn transition_request(
    current: &FlowState,
    event: &FlowEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    let (to, actions) = match (current, event) {
        (FlowState::Router, FlowEvent::Classified(category)) => {
            (FlowState::for_category(*category), vec![FlowAction::RunAgent(*category)])
        }
        (
            FlowState::StrategicRecommendations
            | FlowState::SentimentPlotting
            | FlowState::FeedbackResponse,
            FlowEvent::OutcomeProduced,
        ) => (FlowState::Done, vec![FlowAction::ReturnOutcome]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition { state: *current, event: *event });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: *event, actions })
}

#[cfg(test)]
mod tests {
    use crate::audit::{AuditContext, InMemoryAuditSink};
    use crate::domain::request::Category;
    use crate::flows::engine::{FlowEngine, FlowTransitionError, RequestFlow};
    use crate::flows::states::{FlowAction, FlowEvent, FlowState};

    #[test]
    fn every_category_reaches_done_in_two_steps() {
        let engine = FlowEngine::new(RequestFlow);
        for category in [
            Category::StrategicRecommendations,
            Category::SentimentPlotting,
            Category::FeedbackResponse,
        ] {
            let routed = engine
                .apply(&engine.initial_state(), &FlowEvent::Classified(category))
                .expect("router -> task");
            assert_eq!(routed.to, FlowState::for_category(category));
            assert_eq!(routed.actions, vec![FlowAction::RunAgent(category)]);
            assert_eq!(routed.to.category(), Some(category));

            let done =
                engine.apply(&routed.to, &FlowEvent::OutcomeProduced).expect("task -> done");
            assert_eq!(done.to, FlowState::Done);
            assert!(done.to.is_terminal());
            assert_eq!(done.actions, vec![FlowAction::ReturnOutcome]);
        }
    }

    #[test]
    fn router_cannot_skip_to_done() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(&FlowState::Router, &FlowEvent::OutcomeProduced)
            .expect_err("router must classify first");
        assert_eq!(
            error,
            FlowTransitionError::InvalidTransition {
                state: FlowState::Router,
                event: FlowEvent::OutcomeProduced
            }
        );
    }

    #[test]
    fn task_states_do_not_reroute() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(
                &FlowState::SentimentPlotting,
                &FlowEvent::Classified(Category::FeedbackResponse),
            )
            .expect_err("no fallback between task states");
        assert!(matches!(error, FlowTransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn done_is_terminal() {
        let engine = FlowEngine::default();
        assert!(engine.apply(&FlowState::Done, &FlowEvent::OutcomeProduced).is_err());
        assert!(engine
            .apply(&FlowState::Done, &FlowEvent::Classified(Category::SentimentPlotting))
            .is_err());
    }

    #[test]
    fn transitions_emit_audit_events() {
        let engine = FlowEngine::default();
        let sink = InMemoryAuditSink::default();
        let audit = AuditContext::new("req-42", "orchestrator");

        let _ = engine
            .apply_with_audit(
                &FlowState::Router,
                &FlowEvent::Classified(Category::FeedbackResponse),
                &sink,
                &audit,
            )
            .expect("transition should succeed");
        let _ =
            engine.apply_with_audit(&FlowState::Done, &FlowEvent::OutcomeProduced, &sink, &audit);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].request_id, "req-42");
        assert_eq!(events[0].event_type, "flow.transition_applied");
        assert_eq!(events[1].event_type, "flow.transition_rejected");
        assert!(events[1].metadata.contains_key("error"));
    }
}
