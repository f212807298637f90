use std::fmt::Write as _;
use std::sync::Arc;

use reviewlens_core::domain::{DateRange, ReviewCollection, Sentiment, SentimentCounts};

use crate::llm::{LlmClient, LlmPrompt};
use crate::themes::ThemeSummarizer;

pub const NO_REVIEWS_MESSAGE: &str = "No reviews found for the specified date range.";

const RECOMMENDATIONS_UNAVAILABLE: &str =
    "Recommendations unavailable: the recommendation service returned an error.";

const RECOMMENDATIONS_SYSTEM_PROMPT: &str = "You are a strategic consultant for SteamNoodles, \
a restaurant chain. Using the review analysis provided, write three to five concrete, actionable \
recommendations for management. Reply with a numbered list only, one recommendation per line.";

/// Builds the strategic report text for one date range.
#[derive(Clone)]
pub struct ReportGenerator {
    llm: Arc<dyn LlmClient>,
    summarizer: ThemeSummarizer,
}

impl ReportGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, summarizer: ThemeSummarizer) -> Self {
        Self { llm, summarizer }
    }

    /// Produces the full report. An empty collection short-circuits to
    /// [`NO_REVIEWS_MESSAGE`] without touching the summarizer or the LLM.
    pub async fn generate(&self, reviews: &ReviewCollection, range: DateRange) -> String {
        if reviews.is_empty() {
            tracing::info!(event_name = "report.empty_range", range = %range, "no reviews in range");
            return NO_REVIEWS_MESSAGE.to_string();
        }

        let counts = reviews.sentiment_counts();
        let overview = overview_section(&counts);
        let trend = monthly_trend_section(reviews);
        let positive = self.theme_section(reviews, Sentiment::Positive).await;
        let negative = self.theme_section(reviews, Sentiment::Negative).await;
        let recommendations = self.recommendations(&overview, &positive, &negative).await;

        let mut report = String::new();
        let _ = writeln!(report, "# Strategic Report: Customer Review Analysis");
        let _ = writeln!(report, "Period: {range}");
        let _ = writeln!(report);
        let _ = writeln!(report, "## Sentiment Overview");
        let _ = writeln!(report, "{overview}");
        let _ = writeln!(report);
        let _ = writeln!(report, "## Monthly Sentiment Trend");
        let _ = writeln!(report, "{trend}");
        let _ = writeln!(report);
        let _ = writeln!(report, "## Key Positive Themes");
        let _ = writeln!(report, "{positive}");
        let _ = writeln!(report);
        let _ = writeln!(report, "## Key Negative Themes");
        let _ = writeln!(report, "{negative}");
        let _ = writeln!(report);
        let _ = writeln!(report, "## Strategic Recommendations");
        let _ = write!(report, "{recommendations}");

        tracing::info!(
            event_name = "report.generated",
            range = %range,
            reviews = counts.total(),
            "strategic report generated"
        );
        report
    }

    async fn theme_section(&self, reviews: &ReviewCollection, sentiment: Sentiment) -> String {
        let texts = reviews.reviews_for(sentiment);
        if texts.is_empty() {
            return format!("No {} reviews in this period.", sentiment.as_str().to_lowercase());
        }
        self.summarizer.summarize_reviews(&texts, sentiment).await
    }

    async fn recommendations(&self, overview: &str, positive: &str, negative: &str) -> String {
        let prompt = LlmPrompt::new(
            RECOMMENDATIONS_SYSTEM_PROMPT,
            format!(
                "Sentiment overview:\n{overview}\n\nPositive themes:\n{positive}\n\n\
                 Negative themes:\n{negative}\n\nRecommendations:"
            ),
        );
        match self.llm.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => RECOMMENDATIONS_UNAVAILABLE.to_string(),
            Err(error) => {
                tracing::warn!(
                    event_name = "report.recommendations_failed",
                    error = %error,
                    "recommendations degraded to sentinel"
                );
                RECOMMENDATIONS_UNAVAILABLE.to_string()
            }
        }
    }
}

fn overview_section(counts: &SentimentCounts) -> String {
    let mut section = format!("Total reviews analysed: {}", counts.total());
    for sentiment in Sentiment::ALL {
        let _ = write!(
            section,
            "\n- {}: {} ({:.1}%)",
            sentiment,
            counts.get(sentiment),
            counts.percentage(sentiment)
        );
    }
    section
}

fn monthly_trend_section(reviews: &ReviewCollection) -> String {
    reviews
        .monthly_counts()
        .iter()
        .map(|(month, counts)| {
            format!(
                "- {}: {} positive, {} negative, {} neutral",
                month.format("%Y-%m"),
                counts.positive,
                counts.negative,
                counts.neutral
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use reviewlens_core::domain::{DateRange, ReviewCollection, ReviewRecord, Sentiment};

    use super::{ReportGenerator, NO_REVIEWS_MESSAGE, RECOMMENDATIONS_UNAVAILABLE};
    use crate::testing::ScriptedLlm;
    use crate::themes::{ThemeSummarizer, THEME_SUMMARY_UNAVAILABLE};

    fn record(year: i32, month: u32, review: &str, sentiment: Sentiment) -> ReviewRecord {
        ReviewRecord {
            date: NaiveDate::from_ymd_opt(year, month, 1).expect("date"),
            review: review.to_string(),
            sentiment,
        }
    }

    fn generator(llm: &ScriptedLlm) -> ReportGenerator {
        let shared: Arc<ScriptedLlm> = Arc::new(llm.clone());
        ReportGenerator::new(shared.clone(), ThemeSummarizer::new(shared, 6_000))
    }

    fn first_half_2019() -> DateRange {
        DateRange::parse("2019-01-01", "2019-06-30").expect("range")
    }

    #[tokio::test]
    async fn empty_collection_returns_fixed_message_without_upstream_calls() {
        let llm = ScriptedLlm::replying("unused");
        let report =
            generator(&llm).generate(&ReviewCollection::default(), first_half_2019()).await;

        assert_eq!(report, NO_REVIEWS_MESSAGE);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn report_contains_every_section_in_order() {
        let llm = ScriptedLlm::default()
            .push_reply("- friendly staff")
            .push_reply("- slow service")
            .push_reply("1. Add staff at peak hours\n2. Keep the broth recipe");
        let reviews = ReviewCollection::new(vec![
            record(2019, 1, "Lovely staff", Sentiment::Positive),
            record(2019, 1, "Slow", Sentiment::Negative),
            record(2019, 2, "Fine", Sentiment::Neutral),
            record(2019, 2, "Great broth", Sentiment::Positive),
        ]);

        let report = generator(&llm).generate(&reviews, first_half_2019()).await;

        let headings = [
            "# Strategic Report",
            "Period: 2019-01-01 to 2019-06-30",
            "## Sentiment Overview",
            "- Positive: 2 (50.0%)",
            "## Monthly Sentiment Trend",
            "- 2019-01: 1 positive, 1 negative, 0 neutral",
            "## Key Positive Themes",
            "- friendly staff",
            "## Key Negative Themes",
            "- slow service",
            "## Strategic Recommendations",
            "1. Add staff at peak hours",
        ];
        let mut cursor = 0;
        for heading in headings {
            let found = report[cursor..].find(heading).map(|offset| cursor + offset);
            assert!(found.is_some(), "missing `{heading}` in:\n{report}");
            cursor = found.unwrap_or(cursor);
        }
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn upstream_failures_degrade_to_sentinels() {
        let llm = ScriptedLlm::failing();
        let reviews = ReviewCollection::new(vec![record(2019, 3, "Cold soup", Sentiment::Negative)]);

        let report = generator(&llm).generate(&reviews, first_half_2019()).await;

        assert!(report.contains("No positive reviews in this period."));
        assert!(report.contains(THEME_SUMMARY_UNAVAILABLE));
        assert!(report.contains(RECOMMENDATIONS_UNAVAILABLE));
        // negative themes + recommendations; positive had nothing to summarize
        assert_eq!(llm.call_count(), 2);
    }
}
