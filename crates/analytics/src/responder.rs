use std::sync::Arc;

use reviewlens_core::errors::ApplicationError;

use crate::llm::{LlmClient, LlmPrompt};
use crate::sentiment::SentimentClassifier;

pub const COLLABORATOR: &str = "reply_drafter";

/// Drafts customer-service replies. Sentiment is classified first and fed
/// into the prompt so the tone matches the review.
#[derive(Clone)]
pub struct ReplyDrafter {
    llm: Arc<dyn LlmClient>,
    classifier: SentimentClassifier,
}

impl ReplyDrafter {
    pub fn new(llm: Arc<dyn LlmClient>, classifier: SentimentClassifier) -> Self {
        Self { llm, classifier }
    }

    pub async fn draft(&self, review_text: &str) -> Result<String, ApplicationError> {
        let sentiment = self.classifier.classify(review_text).await;
        let prompt = LlmPrompt::new(
            format!(
                "You are a customer service representative for SteamNoodles. Your task is to \
                 generate a short, polite, and context-aware response to a customer review. \
                 The review has a sentiment of: {sentiment}."
            ),
            format!("Review: {review_text}\nResponse:"),
        );

        let reply = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|error| ApplicationError::upstream(COLLABORATOR, error.to_string()))?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ApplicationError::upstream(COLLABORATOR, "model returned an empty reply"));
        }

        tracing::debug!(
            event_name = "reply.drafted",
            sentiment = %sentiment,
            chars = reply.len(),
            "customer reply drafted"
        );
        Ok(reply.to_string())
    }
}
