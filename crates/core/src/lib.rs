pub mod audit;
pub mod batching;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod store;

pub use audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink,
    TracingAuditSink,
};
pub use batching::{chunk_by_token_budget, estimate_tokens, TextBatch};
pub use config::{AppConfig, ConfigError, LlmProvider, LoadOptions, LogFormat};
pub use domain::{
    AgentOutcome, AgentRequest, Category, DateRange, OutcomeKind, ReviewCollection, ReviewRecord,
    Sentiment, SentimentCounts,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{FlowEngine, FlowEvent, FlowState, RequestFlow};
pub use store::{ReviewStore, StoreError};
