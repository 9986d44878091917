use crate::crawler::FetchError;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// Metadata of one article, as listed on an archive page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    /// The archive day whose listing produced this record
    pub archive_date: NaiveDate,

    /// Publication time in the source's local time zone, if the listing had one
    pub published_at: Option<NaiveDateTime>,

    /// Absolute article URL, unique within a run
    pub url: String,

    /// Article title as shown in the listing (may be empty)
    pub title: String,
}

/// Why an article ended up without a body
#[derive(Debug, Clone)]
pub enum ArticleFailure {
    /// The article page could not be fetched
    Fetch(FetchError),

    /// The page was fetched but none of the content selectors matched
    ExtractionFailed,
}

impl fmt::Display for ArticleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleFailure::Fetch(e) => write!(f, "{}", e),
            ArticleFailure::ExtractionFailed => write!(f, "no content selector matched"),
        }
    }
}

/// A fetched article: its metadata plus the extracted text body
///
/// Built once per record and handed to the output sink exactly once.
#[derive(Debug, Clone)]
pub struct ArticleContent {
    pub record: MetadataRecord,

    /// Plain-text body; empty when fetching or extraction failed
    pub body: String,

    /// Set when the body is empty because something went wrong
    pub failure: Option<ArticleFailure>,
}

impl ArticleContent {
    pub fn extracted(record: MetadataRecord, body: String) -> Self {
        Self {
            record,
            body,
            failure: None,
        }
    }

    pub fn failed(record: MetadataRecord, failure: ArticleFailure) -> Self {
        Self {
            record,
            body: String::new(),
            failure: Some(failure),
        }
    }

    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}
