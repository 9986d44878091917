//! Archive listing parser
//!
//! Turns one listing page into metadata records. Each listing entry is
//! expected to carry:
//! - a publication time (e.g. `14:05`), resolved against the archive day
//! - an anchor whose href is the article URL and whose text is the title
//!
//! Parsing never fails. Entries without a usable link are skipped and
//! counted; entries without a usable time are kept untimed.

use crate::config::SourceConfig;
use crate::model::MetadataRecord;
use crate::ConfigError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Records parsed from one listing page, with per-page diagnostics
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Records in listing order
    pub records: Vec<MetadataRecord>,

    /// Entries dropped for lack of a resolvable URL
    pub skipped: usize,
}

impl ListingPage {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parses archive listing pages with the configured selectors
#[derive(Debug, Clone)]
pub struct ListingParser {
    entry: Selector,
    time: Selector,
    link: Selector,
}

impl ListingParser {
    /// Compiles the listing selectors of a source configuration
    pub fn new(source: &SourceConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            entry: compile_selector(&source.entry_selector)?,
            time: compile_selector(&source.time_selector)?,
            link: compile_selector(&source.link_selector)?,
        })
    }

    /// Parses one listing page
    ///
    /// # Arguments
    ///
    /// * `markup` - The listing page HTML
    /// * `date` - The archive day the page belongs to
    /// * `page_url` - URL the page was fetched from, for resolving relative links
    ///
    /// # Example
    ///
    /// ```no_run
    /// use archive_harvest::config::SourceConfig;
    /// use archive_harvest::crawler::ListingParser;
    /// use chrono::NaiveDate;
    /// use url::Url;
    ///
    /// let parser = ListingParser::new(&SourceConfig::default()).unwrap();
    /// let html = r#"<div class="dayInArchive"><ul><li>
    ///     <span class="itemTime">09:15</span>
    ///     <a class="itemTitle" href="/kraj/news-1">First</a>
    /// </li></ul></div>"#;
    /// let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    /// let page_url = Url::parse("https://wiadomosci.onet.pl/archiwum/2023-01-01").unwrap();
    /// let page = parser.parse(html, date, &page_url);
    /// assert_eq!(page.records[0].url, "https://wiadomosci.onet.pl/kraj/news-1");
    /// ```
    pub fn parse(&self, markup: &str, date: NaiveDate, page_url: &Url) -> ListingPage {
        let document = Html::parse_document(markup);
        let mut page = ListingPage::default();

        for entry in document.select(&self.entry) {
            let Some(anchor) = entry.select(&self.link).next() else {
                tracing::warn!("Listing entry without a link on {}, skipping", page_url);
                page.skipped += 1;
                continue;
            };

            let Some(url) = anchor
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, page_url))
            else {
                tracing::warn!("Listing entry without a usable href on {}, skipping", page_url);
                page.skipped += 1;
                continue;
            };

            let title = element_text(anchor);

            let published_at = entry
                .select(&self.time)
                .next()
                .and_then(|time| resolve_time(&element_text(time), date));

            if published_at.is_none() {
                tracing::debug!("No usable publication time for {}", url);
            }

            page.records.push(MetadataRecord {
                archive_date: date,
                published_at,
                url,
                title,
            });
        }

        if page.records.is_empty() && page.skipped == 0 {
            tracing::debug!("No listing entries found on {}", page_url);
        }

        page
    }
}

/// Compiles a CSS selector, reporting failures as configuration errors
pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Resolves a listing time string against the archive day
///
/// Accepts `HH:MM`, `HH:MM:SS`, or a full `YYYY-MM-DD HH:MM` timestamp.
fn resolve_time(raw: &str, date: NaiveDate) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(full) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Some(full);
    }

    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
        .map(|time| date.and_time(time))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub(crate) fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Collects the text of an element with whitespace collapsed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Trims and collapses runs of whitespace into single spaces
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
