use std::sync::Arc;

use reviewlens_core::domain::Sentiment;

use crate::llm::{LlmClient, LlmPrompt};

const SYSTEM_PROMPT: &str = "You are a sentiment analysis expert. Classify the sentiment of the \
customer review as Positive, Negative, or Neutral. Respond with only one word.";

/// Labels a single review. Any upstream failure or unreadable reply yields Neutral.
#[derive(Clone)]
pub struct SentimentClassifier {
    llm: Arc<dyn LlmClient>,
}

impl SentimentClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, text: &str) -> Sentiment {
        let prompt = LlmPrompt::new(SYSTEM_PROMPT, format!("Review: {text}\nSentiment:"));
        match self.llm.complete(&prompt).await {
            Ok(reply) => parse_sentiment_label(&reply).unwrap_or_else(|| {
                tracing::warn!(
                    event_name = "sentiment.unparseable_reply",
                    reply = %reply,
                    "defaulting to neutral"
                );
                Sentiment::Neutral
            }),
            Err(error) => {
                tracing::warn!(
                    event_name = "sentiment.upstream_failed",
                    error = %error,
                    "defaulting to neutral"
                );
                Sentiment::Neutral
            }
        }
    }
}

/// First word of the reply that names a sentiment label.
pub fn parse_sentiment_label(reply: &str) -> Option<Sentiment> {
    reply
        .split(|ch: char| !ch.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
        .find_map(|word| word.parse::<Sentiment>().ok())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reviewlens_core::domain::Sentiment;

    use super::{parse_sentiment_label, SentimentClassifier};
    use crate::testing::ScriptedLlm;

    #[test]
    fn parses_labels_wrapped_in_prose() {
        assert_eq!(parse_sentiment_label("Negative."), Some(Sentiment::Negative));
        assert_eq!(parse_sentiment_label("The sentiment is: POSITIVE"), Some(Sentiment::Positive));
        assert_eq!(parse_sentiment_label("mixed feelings"), None);
    }

    #[tokio::test]
    async fn upstream_failure_defaults_to_neutral() {
        let classifier = SentimentClassifier::new(Arc::new(ScriptedLlm::failing()));
        assert_eq!(classifier.classify("The soup was cold").await, Sentiment::Neutral);
    }

    #[tokio::test]
    async fn unreadable_reply_defaults_to_neutral() {
        let llm = ScriptedLlm::default().push_reply("I cannot say");
        let classifier = SentimentClassifier::new(Arc::new(llm));
        assert_eq!(classifier.classify("ok").await, Sentiment::Neutral);
    }

    #[tokio::test]
    async fn passes_review_text_to_the_model() {
        let llm = ScriptedLlm::default().push_reply("Negative");
        let classifier = SentimentClassifier::new(Arc::new(llm.clone()));

        assert_eq!(classifier.classify("rude waiter").await, Sentiment::Negative);
        assert!(llm.prompts()[0].user.contains("rude waiter"));
    }
}
