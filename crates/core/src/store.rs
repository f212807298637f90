//! Review Store
//!
//! Loads the restaurant review export once, cleans it, and answers range and
//! sentiment queries for the lifetime of the process. The store is read-only
//! after `load`, so one instance can be shared across concurrent requests.
//!
//! Cleaning mirrors the export's quirks:
//! - rows with any blank field are dropped
//! - exact duplicate rows are dropped (first occurrence wins)
//! - country, restaurant name and review title columns are discarded
//! - `Review Date` values like `Sept 2019 •` are scrubbed to `Sep 2019` and
//!   parsed at month resolution

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::domain::review::{DateRange, ReviewCollection, ReviewRecord, Sentiment};

pub const DATE_COLUMN: &str = "Review Date";
pub const REVIEW_COLUMN: &str = "Review";
pub const SENTIMENT_COLUMN: &str = "Sentiment";
pub const REQUIRED_COLUMNS: [&str; 3] = [DATE_COLUMN, REVIEW_COLUMN, SENTIMENT_COLUMN];
pub const DISCARDED_COLUMNS: [&str; 3] = ["Country", "Restaurant Name", "Review Title"];

const LOCALE_ARTIFACTS: [&str; 3] = [" â€¢", "â€¢", "•"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("review dataset not found: `{0}`")]
    NotFound(PathBuf),
    #[error("could not read review dataset: {0}")]
    Read(#[from] csv::Error),
    #[error("could not open review dataset `{path}`: {source}")]
    Open { path: PathBuf, source: std::io::Error },
    #[error("review dataset is malformed: {0}")]
    DataFormat(String),
}

#[derive(Clone, Debug, Default)]
pub struct ReviewStore {
    reviews: ReviewCollection,
}

impl ReviewStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path)
            .map_err(|source| StoreError::Open { path: path.to_path_buf(), source })?;
        let store = Self::from_reader(file)?;
        info!(
            event_name = "store.loaded",
            path = %path.display(),
            reviews = store.reviews.len(),
            "review dataset loaded"
        );
        Ok(store)
    }

    pub fn from_reader<R>(reader: R) -> Result<Self, StoreError>
    where
        R: Read,
    {
        let mut csv_reader =
            csv::ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(reader);

        let headers =
            csv_reader.headers()?.iter().map(|header| header.to_string()).collect::<Vec<_>>();
        let columns = ColumnIndex::resolve(&headers)?;

        let mut seen_rows = HashSet::new();
        let mut records = Vec::new();
        let mut rows_read = 0usize;

        for (row_index, row) in csv_reader.records().enumerate() {
            let row = row?;
            rows_read += 1;

            let fields = row.iter().map(str::to_string).collect::<Vec<_>>();
            if fields.len() < headers.len() || fields.iter().any(|field| field.is_empty()) {
                continue;
            }
            if !seen_rows.insert(fields.clone()) {
                continue;
            }

            // header is line 1
            let line = row_index + 2;
            let date = parse_review_date(&fields[columns.date]).ok_or_else(|| {
                StoreError::DataFormat(format!(
                    "line {line}: unparseable review date `{}`",
                    fields[columns.date]
                ))
            })?;
            let sentiment = fields[columns.sentiment].parse::<Sentiment>().map_err(|error| {
                StoreError::DataFormat(format!("line {line}: {error}"))
            })?;

            records.push(ReviewRecord {
                date,
                review: fields[columns.review].clone(),
                sentiment,
            });
        }

        tracing::debug!(
            event_name = "store.cleaned",
            rows_read,
            rows_kept = records.len(),
            "review rows cleaned"
        );

        Ok(Self { reviews: ReviewCollection::new(records) })
    }

    pub fn reviews(&self) -> &ReviewCollection {
        &self.reviews
    }

    pub fn query_range(&self, start: NaiveDate, end: NaiveDate) -> ReviewCollection {
        self.reviews.in_range(DateRange::new(start, end))
    }

    pub fn query_by_sentiment(
        &self,
        label: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ReviewCollection {
        self.reviews.with_sentiment(label, DateRange::new(start, end))
    }

    pub fn date_span(&self) -> Option<DateRange> {
        self.reviews.date_span()
    }
}

struct ColumnIndex {
    date: usize,
    review: usize,
    sentiment: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self, StoreError> {
        let analytic = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !DISCARDED_COLUMNS.contains(&header.as_str()))
            .collect::<Vec<_>>();
        let position = |name: &str| {
            analytic.iter().find(|(_, header)| header.as_str() == name).map(|(index, _)| *index)
        };

        let missing = REQUIRED_COLUMNS
            .iter()
            .filter(|name| position(name).is_none())
            .copied()
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(StoreError::DataFormat(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            date: position(DATE_COLUMN).unwrap_or_default(),
            review: position(REVIEW_COLUMN).unwrap_or_default(),
            sentiment: position(SENTIMENT_COLUMN).unwrap_or_default(),
        })
    }
}

/// Scrubs locale artifacts and the `Sept` abbreviation, then parses `%b %Y`.
pub fn parse_review_date(raw: &str) -> Option<NaiveDate> {
    let normalized = normalize_review_date(raw);
    NaiveDate::parse_from_str(&format!("1 {normalized}"), "%d %b %Y").ok()
}

pub fn normalize_review_date(raw: &str) -> String {
    let mut scrubbed = raw.to_string();
    for artifact in LOCALE_ARTIFACTS {
        scrubbed = scrubbed.replace(artifact, " ");
    }
    scrubbed
        .split_whitespace()
        .map(|token| if token.eq_ignore_ascii_case("sept") { "Sep" } else { token })
        .collect::<Vec<_>>()
        .join(" ")
}
