use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Sentiment {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                DomainError::InvalidInput(format!(
                    "unknown sentiment label `{trimmed}` (expected Positive|Negative|Neutral)"
                ))
            })
    }
}

/// One cleaned review row. `date` is always the first day of the review month.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub date: NaiveDate,
    pub review: String,
    pub sentiment: Sentiment,
}

/// Inclusive calendar date range. `start > end` is allowed and selects nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    pub fn quarter(year: i32, quarter: u32) -> Option<Self> {
        if !(1..=4).contains(&quarter) {
            return None;
        }
        let first_month = (quarter - 1) * 3 + 1;
        let start = NaiveDate::from_ymd_opt(year, first_month, 1)?;
        let end = last_day_of_month(year, first_month + 2)?;
        Some(Self { start, end })
    }

    pub fn month(year: i32, month: u32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, month, 1)?,
            end: last_day_of_month(year, month)?,
        })
    }

    /// Parses `YYYY-MM-DD` bounds. Blank or malformed strings are invalid input.
    pub fn parse(start: &str, end: &str) -> Result<Self, DomainError> {
        Ok(Self {
            start: parse_iso_date("start_date", start)?,
            end: parse_iso_date("end_date", end)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn parse_iso_date(field: &str, value: &str) -> Result<NaiveDate, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidInput(format!("{field} must not be empty")));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        DomainError::InvalidInput(format!("{field} `{trimmed}` is not a YYYY-MM-DD date"))
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    pub fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    pub fn get(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    /// Share of `sentiment` in percent, rounded to one decimal place.
    pub fn percentage(&self, sentiment: Sentiment) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let raw = self.get(sentiment) as f64 * 100.0 / total as f64;
        (raw * 10.0).round() / 10.0
    }
}

/// Immutable set of cleaned reviews. Order carries no meaning.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReviewCollection {
    records: Vec<ReviewRecord>,
}

impl ReviewCollection {
    pub fn new(records: Vec<ReviewRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReviewRecord> {
        self.records.iter()
    }

    pub fn in_range(&self, range: DateRange) -> Self {
        if range.is_empty() {
            return Self::default();
        }
        self.filtered(|record| range.contains(record.date))
    }

    /// Case-insensitive exact match on the sentiment label, composed with the range filter.
    pub fn with_sentiment(&self, label: &str, range: DateRange) -> Self {
        let label = label.trim();
        self.in_range(range)
            .filtered(|record| record.sentiment.as_str().eq_ignore_ascii_case(label))
    }

    pub fn reviews_for(&self, sentiment: Sentiment) -> Vec<&str> {
        self.records
            .iter()
            .filter(|record| record.sentiment == sentiment)
            .map(|record| record.review.as_str())
            .collect()
    }

    pub fn sentiment_counts(&self) -> SentimentCounts {
        let mut counts = SentimentCounts::default();
        for record in &self.records {
            counts.record(record.sentiment);
        }
        counts
    }

    /// Per-month counts keyed by the first day of each month, ascending.
    pub fn monthly_counts(&self) -> BTreeMap<NaiveDate, SentimentCounts> {
        let mut months = BTreeMap::<NaiveDate, SentimentCounts>::new();
        for record in &self.records {
            let month = record.date.with_day(1).unwrap_or(record.date);
            months.entry(month).or_default().record(record.sentiment);
        }
        months
    }

    pub fn date_span(&self) -> Option<DateRange> {
        let start = self.records.iter().map(|record| record.date).min()?;
        let last = self.records.iter().map(|record| record.date).max()?;
        let end = last_day_of_month(last.year(), last.month()).unwrap_or(last);
        Some(DateRange { start, end })
    }

    fn filtered<F>(&self, predicate: F) -> Self
    where
        F: Fn(&ReviewRecord) -> bool,
    {
        Self { records: self.records.iter().filter(|record| predicate(record)).cloned().collect() }
    }
}
