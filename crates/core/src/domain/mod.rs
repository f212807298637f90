pub mod request;
pub mod review;

pub use request::{AgentOutcome, AgentRequest, Category, OutcomeKind};
pub use review::{DateRange, ReviewCollection, ReviewRecord, Sentiment, SentimentCounts};
