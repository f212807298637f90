use reviewlens_core::domain::Category;
use reviewlens_core::errors::ApplicationError;

use crate::tools::{
    ToolCall, FEEDBACK_RESPONSE_TOOL, RECOMMENDATIONS_REPORT_TOOL, SAVE_REPORT_TOOL,
    SENTIMENT_VISUALIZATION_TOOL,
};

/// The tool calls a task agent intends to make for one request.
#[derive(Clone, Copy, Debug)]
pub struct ToolPlan<'a> {
    pub category: Category,
    pub persistence_requested: bool,
    pub calls: &'a [ToolCall],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Deny { reason_code: &'static str, message: String },
}

impl GuardrailDecision {
    pub fn into_result(self, category: Category) -> Result<(), ApplicationError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny { reason_code, message } => {
                Err(ApplicationError::ContractViolation { category, reason_code, message })
            }
        }
    }
}

/// Enforces each task agent's tool contract before anything runs. A plan that
/// breaks the contract is rejected outright; it is never repaired.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuardrailPolicy;

impl GuardrailPolicy {
    pub fn permitted_tools(category: Category) -> &'static [&'static str] {
        match category {
            Category::StrategicRecommendations => &[RECOMMENDATIONS_REPORT_TOOL, SAVE_REPORT_TOOL],
            Category::SentimentPlotting => &[SENTIMENT_VISUALIZATION_TOOL],
            Category::FeedbackResponse => &[FEEDBACK_RESPONSE_TOOL],
        }
    }

    pub fn evaluate(&self, plan: &ToolPlan<'_>) -> GuardrailDecision {
        if plan.calls.is_empty() {
            return deny("no_tool_call", format!("{} agent selected no tool", plan.category));
        }

        let permitted = Self::permitted_tools(plan.category);
        if let Some(call) = plan.calls.iter().find(|call| !permitted.contains(&call.tool_name())) {
            return deny(
                "tool_not_permitted",
                format!("{} agent may not call `{}`", plan.category, call.tool_name()),
            );
        }

        match plan.category {
            Category::StrategicRecommendations => evaluate_strategic(plan),
            Category::SentimentPlotting => exactly_one(plan, "chart_call_count"),
            Category::FeedbackResponse => exactly_one(plan, "tool_call_count"),
        }
    }
}

fn evaluate_strategic(plan: &ToolPlan<'_>) -> GuardrailDecision {
    let count = |name: &str| plan.calls.iter().filter(|call| call.tool_name() == name).count();
    let reports = count(RECOMMENDATIONS_REPORT_TOOL);
    let saves = count(SAVE_REPORT_TOOL);

    if plan.calls[0].tool_name() != RECOMMENDATIONS_REPORT_TOOL {
        return deny("report_not_first", "the report must be produced before anything else");
    }
    if reports > 1 {
        return deny("duplicate_report_call", format!("report requested {reports} times"));
    }
    if saves > 1 {
        return deny("duplicate_persist_call", format!("report persisted {saves} times"));
    }
    match (plan.persistence_requested, saves) {
        (false, 1) => deny("unrequested_persistence", "report persisted without being asked to"),
        (true, 0) => deny("missing_persistence", "request asked for a saved report"),
        _ => GuardrailDecision::Allow,
    }
}

fn exactly_one(plan: &ToolPlan<'_>, reason_code: &'static str) -> GuardrailDecision {
    match plan.calls.len() {
        1 => GuardrailDecision::Allow,
        count => deny(reason_code, format!("{} agent selected {count} tool calls", plan.category)),
    }
}

fn deny(reason_code: &'static str, message: impl Into<String>) -> GuardrailDecision {
    GuardrailDecision::Deny { reason_code, message: message.into() }
}
