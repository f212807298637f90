use chrono::NaiveDate;
use reviewlens_core::domain::DateRange;

use crate::chart_kind::{select_chart_kind, ChartSelection};

/// Everything the task planners need from one request's text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedIntent {
    pub date_range: Option<DateRange>,
    /// Set when the request wrote a `YYYY-MM-DD` date that is not a calendar
    /// day; `date_range` is then `None`.
    pub malformed_dates: Option<MalformedDates>,
    pub persistence_requested: bool,
    pub file_name: Option<String>,
    pub review_text: Option<String>,
    pub chart: ChartSelection,
}

/// Raw date bounds as written in the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedDates {
    pub start: String,
    pub end: String,
}

#[derive(Clone, Debug, Default)]
pub struct IntentExtractor;

impl IntentExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> ExtractedIntent {
        let normalized_text = normalize_text(text);
        let tokens = tokenize(&normalized_text);
        let malformed_dates = malformed_iso_dates(&tokens);
        let date_range =
            if malformed_dates.is_some() { None } else { extract_date_range(&tokens) };

        ExtractedIntent {
            date_range,
            malformed_dates,
            persistence_requested: extract_persistence_request(&tokens),
            file_name: extract_file_name(text),
            review_text: extract_review_text(text),
            chart: select_chart_kind(text),
        }
    }
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase()
}

fn tokenize(text: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_ascii_alphanumeric() || character == '-' {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(|token| token.to_string()).collect()
}

/// Tries, in order: ISO dates, quarters, month-year mentions, bare years.
fn extract_date_range(tokens: &[String]) -> Option<DateRange> {
    iso_range(tokens)
        .or_else(|| quarter_range(tokens))
        .or_else(|| month_range(tokens))
        .or_else(|| year_range(tokens))
}

fn iso_date(token: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
}

fn iso_shaped(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

/// The first two `YYYY-MM-DD` tokens, if any of them fails to parse.
fn malformed_iso_dates(tokens: &[String]) -> Option<MalformedDates> {
    let shaped = tokens.iter().filter(|token| iso_shaped(token)).collect::<Vec<_>>();
    if shaped.iter().all(|token| iso_date(token).is_some()) {
        return None;
    }
    let start = *shaped.first()?;
    let end = shaped.get(1).copied().unwrap_or(start);
    Some(MalformedDates { start: start.clone(), end: end.clone() })
}

fn iso_range(tokens: &[String]) -> Option<DateRange> {
    let dates = tokens.iter().filter_map(|token| iso_date(token)).collect::<Vec<_>>();
    match dates.as_slice() {
        [] => None,
        [single] => Some(DateRange::new(*single, *single)),
        [start, end, ..] => Some(DateRange::new(*start, *end)),
    }
}

fn year_token(token: &str) -> Option<i32> {
    if token.len() != 4 || !token.chars().all(|character| character.is_ascii_digit()) {
        return None;
    }
    token.parse::<i32>().ok().filter(|year| (1900..=2100).contains(year))
}

/// Year adjacent to `index`, looking right first.
fn adjacent_year(tokens: &[String], index: usize) -> Option<i32> {
    tokens
        .get(index + 1)
        .and_then(|token| year_token(token))
        .or_else(|| index.checked_sub(1).and_then(|previous| year_token(&tokens[previous])))
}

fn quarter_number(token: &str) -> Option<u32> {
    match token {
        "q1" => Some(1),
        "q2" => Some(2),
        "q3" => Some(3),
        "q4" => Some(4),
        _ => None,
    }
}

fn quarter_range(tokens: &[String]) -> Option<DateRange> {
    let quarters = tokens
        .iter()
        .enumerate()
        .filter_map(|(index, token)| {
            let quarter = quarter_number(token)?;
            DateRange::quarter(adjacent_year(tokens, index)?, quarter)
        })
        .collect::<Vec<_>>();
    span_of(&quarters)
}

fn month_number(token: &str) -> Option<u32> {
    let month = match token {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

fn month_range(tokens: &[String]) -> Option<DateRange> {
    let months = tokens
        .windows(2)
        .filter_map(|pair| DateRange::month(year_token(&pair[1])?, month_number(&pair[0])?))
        .collect::<Vec<_>>();
    span_of(&months)
}

fn year_range(tokens: &[String]) -> Option<DateRange> {
    let years = tokens
        .iter()
        .flat_map(|token| token.split('-'))
        .filter_map(year_token)
        .collect::<Vec<_>>();
    match years.as_slice() {
        [] => None,
        [single] => DateRange::year(*single),
        [first, second, ..] => {
            Some(DateRange::new(DateRange::year(*first)?.start, DateRange::year(*second)?.end))
        }
    }
}

/// From the start of the first range to the end of the last one.
fn span_of(ranges: &[DateRange]) -> Option<DateRange> {
    let first = ranges.first()?;
    let last = ranges.last()?;
    Some(DateRange::new(first.start, last.end))
}

/// Whole-word `save`, `export` or `pdf`; `saved` or `exporter` do not count.
fn extract_persistence_request(tokens: &[String]) -> bool {
    tokens.iter().any(|token| matches!(token.as_str(), "save" | "export" | "pdf"))
}

fn clean_word(word: &str) -> &str {
    word.trim_matches(|character: char| {
        matches!(
            character,
            '"' | '\'' | '`' | '“' | '”' | '‘' | '’' | '(' | ')' | ',' | '.' | ';' | ':' | '!' | '?'
        )
    })
}

/// A `<name>.pdf` word anywhere, else the word after `named` / `called`.
fn extract_file_name(text: &str) -> Option<String> {
    let words = text.split_whitespace().map(clean_word).collect::<Vec<_>>();

    let explicit = words.iter().find(|word| {
        word.len() > 4 && word.to_ascii_lowercase().ends_with(".pdf")
    });
    if let Some(word) = explicit {
        return Some((*word).to_string());
    }

    words.windows(2).find_map(|pair| {
        let marker = pair[0].to_ascii_lowercase();
        let name = pair[1];
        let article = matches!(name.to_ascii_lowercase().as_str(), "a" | "an" | "the" | "pdf" | "it");
        (matches!(marker.as_str(), "named" | "called") && !name.is_empty() && !article)
            .then(|| format!("{name}.pdf"))
    })
}

/// Text after the first `:` with surrounding quotes removed, or the whole
/// request when there is no colon.
fn extract_review_text(text: &str) -> Option<String> {
    let candidate = text.split_once(':').map(|(_, rest)| rest).unwrap_or(text);
    let trimmed = candidate
        .trim()
        .trim_matches(|character: char| matches!(character, '"' | '\'' | '“' | '”' | '‘' | '’'))
        .trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use reviewlens_analytics::charts::ChartKind;
    use reviewlens_core::domain::DateRange;

    use super::{IntentExtractor, MalformedDates};
    use crate::chart_kind::ChartSelection;

    fn range(start: &str, end: &str) -> Option<DateRange> {
        Some(DateRange::parse(start, end).expect("valid range"))
    }

    #[test]
    fn extracts_year_quarter_and_iso_ranges() {
        let extractor = IntentExtractor::new();

        assert_eq!(
            extractor.extract("Show me the sentiment trend for the year 2019").date_range,
            range("2019-01-01", "2019-12-31")
        );
        assert_eq!(
            extractor.extract("What is the sentiment distribution for Q3 2018").date_range,
            range("2018-07-01", "2018-09-30")
        );
        assert_eq!(
            extractor
                .extract("Generate a report for 2019-01-01 to 2019-06-30 and save it")
                .date_range,
            range("2019-01-01", "2019-06-30")
        );
    }

    #[test]
    fn extracts_month_and_year_spans() {
        let extractor = IntentExtractor::new();

        assert_eq!(
            extractor.extract("sentiment for Sept 2019").date_range,
            range("2019-09-01", "2019-09-30")
        );
        assert_eq!(
            extractor.extract("from January 2018 to March 2018").date_range,
            range("2018-01-01", "2018-03-31")
        );
        assert_eq!(
            extractor.extract("compare 2017 and 2019").date_range,
            range("2017-01-01", "2019-12-31")
        );
        assert_eq!(extractor.extract("plot 2018-2019").date_range, range("2018-01-01", "2019-12-31"));
        assert_eq!(
            extractor.extract("reviews on 2019-03-01").date_range,
            range("2019-03-01", "2019-03-01")
        );
    }

    #[test]
    fn no_dates_means_no_range() {
        let intent = IntentExtractor::new().extract("Plot the sentiment please");
        assert_eq!(intent.date_range, None);
    }

    #[test]
    fn iso_dates_beat_bare_years() {
        let intent = IntentExtractor::new().extract("2018 report covering 2019-02-01 to 2019-02-28");
        assert_eq!(intent.date_range, range("2019-02-01", "2019-02-28"));
    }

    #[test]
    fn malformed_iso_dates_are_kept_instead_of_dropped() {
        let extractor = IntentExtractor::new();

        let intent = extractor.extract("Generate a report for 2019-02-30 to 2019-06-30");
        assert_eq!(intent.date_range, None);
        assert_eq!(
            intent.malformed_dates,
            Some(MalformedDates { start: "2019-02-30".to_string(), end: "2019-06-30".to_string() })
        );

        let intent = extractor.extract("Plot sentiment from 2019-13-01 to 2019-06-30");
        assert_eq!(intent.date_range, None);
        assert_eq!(
            intent.malformed_dates.map(|dates| dates.start),
            Some("2019-13-01".to_string())
        );

        let intent = extractor.extract("Generate a report for 2019-01-01 to 2019-06-30");
        assert_eq!(intent.malformed_dates, None);
    }

    #[test]
    fn detects_persistence_and_file_names() {
        let extractor = IntentExtractor::new();

        let intent = extractor.extract(
            "Generate a strategic recommendations report for 2019-01-01 to 2019-06-30 and save it as a PDF",
        );
        assert!(intent.persistence_requested);
        assert_eq!(intent.file_name, None);

        let intent = extractor.extract("Export the 2019 report as 'h1_summary.pdf'.");
        assert!(intent.persistence_requested);
        assert_eq!(intent.file_name.as_deref(), Some("h1_summary.pdf"));

        let intent = extractor.extract("Create a report called quarterly and save it");
        assert_eq!(intent.file_name.as_deref(), Some("quarterly.pdf"));

        assert!(!extractor.extract("Generate a report for 2019").persistence_requested);
    }

    #[test]
    fn persistence_needs_a_whole_word() {
        let extractor = IntentExtractor::new();

        for text in [
            "Generate a report on how the new menu saved the quarter",
            "Generate a report on customer savings for 2019",
            "Generate a report about the exporter complaints",
        ] {
            assert!(!extractor.extract(text).persistence_requested, "{text}");
        }
    }

    #[test]
    fn review_text_follows_the_first_colon() {
        let extractor = IntentExtractor::new();

        let intent = extractor.extract("Respond to this review: The food was cold and rude waiter");
        assert_eq!(intent.review_text.as_deref(), Some("The food was cold and rude waiter"));

        let intent = extractor.extract("Reply to feedback: \"Loved it: best ramen in town\"");
        assert_eq!(intent.review_text.as_deref(), Some("Loved it: best ramen in town"));

        let intent = extractor.extract("Respond to this review:   ");
        assert_eq!(intent.review_text, None);

        let intent = extractor.extract("great noodles, friendly staff");
        assert_eq!(intent.review_text.as_deref(), Some("great noodles, friendly staff"));
    }

    #[test]
    fn chart_selection_is_part_of_the_intent() {
        let intent = IntentExtractor::new().extract("What is the sentiment distribution for Q3 2018");
        assert_eq!(intent.chart, ChartSelection::Kind(ChartKind::Pie));
    }
}
