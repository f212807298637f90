//! Analysis collaborators used by the task agents.
//!
//! Each collaborator is a narrow wrapper over one external concern:
//! - `llm` - chat-completion client (Groq, OpenAI, Ollama)
//! - `sentiment` - single-review sentiment classification, Neutral on failure
//! - `themes` - batched theme summarization under a token budget
//! - `report` - strategic report assembly
//! - `responder` - customer-service reply drafting
//! - `charts` - SVG chart rendering
//! - `pdf` - report persistence (PDF via wkhtmltopdf, HTML otherwise)
//!
//! The LLM only writes prose. Counts, percentages, date ranges and chart
//! geometry are computed deterministically from the review store.

pub mod charts;
pub mod llm;
pub mod pdf;
pub mod report;
pub mod responder;
pub mod sentiment;
pub mod themes;

#[cfg(test)]
pub(crate) mod testing;

pub use charts::{ChartError, ChartKind, ChartRenderer, INVALID_CHART_TYPE_MESSAGE};
pub use llm::{LlmClient, LlmPrompt, OpenAiCompatibleClient};
pub use pdf::{PersistError, PersistedReport, ReportBlock, ReportFormat, ReportPersister};
pub use report::{ReportGenerator, NO_REVIEWS_MESSAGE};
pub use responder::ReplyDrafter;
pub use sentiment::SentimentClassifier;
pub use themes::{ThemeSummarizer, THEME_SUMMARY_UNAVAILABLE};
