use std::sync::Arc;

use reviewlens_core::batching::chunk_by_token_budget;
use reviewlens_core::domain::Sentiment;

use crate::llm::{LlmClient, LlmPrompt};

pub const THEME_SUMMARY_UNAVAILABLE: &str =
    "Theme summary unavailable: the summarization service returned an error.";

/// Summarizes review batches into short bulleted theme lists.
#[derive(Clone)]
pub struct ThemeSummarizer {
    llm: Arc<dyn LlmClient>,
    batch_token_budget: usize,
}

impl ThemeSummarizer {
    pub fn new(llm: Arc<dyn LlmClient>, batch_token_budget: usize) -> Self {
        Self { llm, batch_token_budget }
    }

    /// One summarizer call over an already-joined batch. Never fails; an
    /// upstream error becomes [`THEME_SUMMARY_UNAVAILABLE`].
    pub async fn summarize(&self, batch_text: &str, label: Sentiment) -> String {
        let prompt = LlmPrompt::new(
            format!(
                "You summarize {label} restaurant reviews. Reply with a short bulleted list \
                 of the key recurring themes, one theme per line starting with '- '. \
                 Do not add an introduction."
            ),
            format!("Reviews:\n{batch_text}"),
        );

        match self.llm.complete(&prompt).await {
            Ok(summary) => summary.trim().to_string(),
            Err(error) => {
                tracing::warn!(
                    event_name = "themes.upstream_failed",
                    sentiment = %label,
                    error = %error,
                    "theme summary degraded to sentinel"
                );
                THEME_SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }

    /// Chunks `reviews` under the batch budget and concatenates each batch
    /// summary in input order. Returns an empty string for no reviews.
    pub async fn summarize_reviews(&self, reviews: &[&str], label: Sentiment) -> String {
        let batches = chunk_by_token_budget(reviews.iter().copied(), self.batch_token_budget);
        tracing::debug!(
            event_name = "themes.batched",
            sentiment = %label,
            reviews = reviews.len(),
            batches = batches.len(),
            "summarizing review batches"
        );

        let mut summaries = Vec::with_capacity(batches.len());
        for batch in &batches {
            summaries.push(self.summarize(&batch.joined(), label).await);
        }
        summaries.join("\n")
    }
}
