//! Agent Runtime - request routing and task-agent orchestration
//!
//! This crate is the request-handling core of reviewlens:
//! - Classifies free-text requests into one of three categories (`router`)
//! - Extracts date ranges, file names, review text and chart kinds (`intent`, `chart_kind`)
//! - Plans tool calls per category and enforces each agent's contract (`agents`, `guardrails`)
//! - Executes tool calls against the analysis collaborators (`tools`)
//!
//! # Architecture
//!
//! Every request makes a single pass through the flow graph:
//! 1. **Routing** (`router`) - keyword priority: report > chart > feedback
//! 2. **Planning** (`agents`) - the category's planner picks tool calls
//! 3. **Guardrails** (`guardrails`) - zero, extra or out-of-order calls are rejected
//! 4. **Execution** (`tools`) - calls run in order and normalize to one `AgentOutcome`
//!
//! # Key Types
//!
//! - `AgentRuntime` - main orchestrator (see `runtime` module)
//! - `TaskAgent` / `ToolPlanner` - pluggable per-category planning
//! - `GuardrailPolicy` - tool contract checks
//!
//! # Safety Principle
//!
//! The LLM only writes prose inside collaborators. It never chooses which
//! tool runs, how often, or with which date range.

pub mod agents;
pub mod chart_kind;
pub mod guardrails;
pub mod intent;
pub mod router;
pub mod runtime;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use agents::{PlanningContext, TaskAgent, ToolPlanner};
pub use chart_kind::{select_chart_kind, ChartSelection};
pub use guardrails::{GuardrailDecision, GuardrailPolicy, ToolPlan};
pub use intent::{ExtractedIntent, IntentExtractor, MalformedDates};
pub use runtime::AgentRuntime;
pub use tools::{Tool, ToolCall, ToolRegistry};
