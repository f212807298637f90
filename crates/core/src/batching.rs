//! Deterministic, order-preserving batching of review text under a per-batch
//! token budget. Feeds the theme summarizer, whose context window is the
//! binding constraint.

/// Rough token estimate for English review text (about four characters per token).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

const SEPARATOR: &str = "\n";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBatch {
    pub items: Vec<String>,
    /// Includes one separator per item after the first.
    pub estimated_tokens: usize,
}

impl TextBatch {
    pub fn joined(&self) -> String {
        self.items.join(SEPARATOR)
    }
}

/// Splits `texts` into consecutive batches. A text is appended to the open
/// batch unless that would push it past `token_budget`, in which case the batch
/// is flushed first. A single text larger than the whole budget is truncated to
/// fit so every batch stays bounded.
pub fn chunk_by_token_budget<I, S>(texts: I, token_budget: usize) -> Vec<TextBatch>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let budget = token_budget.max(1);
    let mut batches = Vec::new();
    let mut current = TextBatch { items: Vec::new(), estimated_tokens: 0 };

    for text in texts {
        let mut text = text.as_ref().trim().to_string();
        if text.is_empty() {
            continue;
        }

        let mut tokens = estimate_tokens(&text);
        if tokens > budget {
            text = text.chars().take(budget * 4).collect();
            tokens = estimate_tokens(&text);
            tracing::debug!(
                event_name = "batching.text_truncated",
                token_budget = budget,
                "review text exceeded the batch budget and was truncated"
            );
        }

        let separator = estimate_tokens(SEPARATOR);
        if !current.items.is_empty() && current.estimated_tokens + separator + tokens > budget {
            batches.push(std::mem::replace(
                &mut current,
                TextBatch { items: Vec::new(), estimated_tokens: 0 },
            ));
        }

        if !current.items.is_empty() {
            current.estimated_tokens += separator;
        }
        current.items.push(text);
        current.estimated_tokens += tokens;
    }

    if !current.items.is_empty() {
        batches.push(current);
    }

    batches
}
