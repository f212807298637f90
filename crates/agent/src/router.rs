use reviewlens_core::domain::Category;

pub const STRATEGIC_KEYWORDS: [&str; 2] = ["report", "recommendation"];
pub const PLOTTING_KEYWORDS: [&str; 4] = ["chart", "plot", "visualization", "visualisation"];
pub const FEEDBACK_KEYWORDS: [&str; 3] = ["review", "respond", "feedback"];

/// Maps request text to a task category by case-insensitive substring match.
///
/// Keyword sets are checked in priority order: report/recommendation, then
/// chart/plot/visualization, then review/respond/feedback. A report request
/// that also mentions reviews is still a report. Anything unmatched is
/// treated as a plotting request.
pub fn classify(request_text: &str) -> Category {
    let normalized = request_text.to_lowercase();

    if mentions(&normalized, &STRATEGIC_KEYWORDS) {
        Category::StrategicRecommendations
    } else if mentions(&normalized, &PLOTTING_KEYWORDS) {
        Category::SentimentPlotting
    } else if mentions(&normalized, &FEEDBACK_KEYWORDS) {
        Category::FeedbackResponse
    } else {
        Category::SentimentPlotting
    }
}

fn mentions(normalized_text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| normalized_text.contains(keyword))
}

#[cfg(test)]
mod tests {
    use reviewlens_core::domain::Category;

    use super::classify;

    #[test]
    fn report_keywords_win_over_every_other_category() {
        for text in [
            "Generate a report",
            "Recommendations please, based on the reviews",
            "Plot a chart for the report",
            "Respond to each review and write a REPORT on the feedback",
        ] {
            assert_eq!(classify(text), Category::StrategicRecommendations, "{text}");
        }
    }

    #[test]
    fn plotting_keywords_win_over_feedback_keywords() {
        assert_eq!(classify("Plot the review sentiment"), Category::SentimentPlotting);
        assert_eq!(classify("Visualization of feedback"), Category::SentimentPlotting);
    }

    #[test]
    fn feedback_keywords_route_to_feedback() {
        assert_eq!(
            classify("Respond to this review: The food was cold and rude waiter"),
            Category::FeedbackResponse
        );
        assert_eq!(classify("Some FEEDBACK for you"), Category::FeedbackResponse);
    }

    #[test]
    fn unmatched_requests_default_to_plotting() {
        assert_eq!(
            classify("Show me the sentiment trend for the year 2019"),
            Category::SentimentPlotting
        );
        assert_eq!(classify(""), Category::SentimentPlotting);
    }

    #[test]
    fn classification_is_deterministic() {
        let text = "What is the sentiment distribution for Q3 2018";
        assert_eq!(classify(text), classify(text));
    }
}
