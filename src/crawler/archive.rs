//! Day-by-day archive traversal
//!
//! For every day of the range, listing pages are fetched one after another
//! (page `n + 1` only exists if page `n` had entries) until a page comes back
//! empty. Records are produced lazily, in (day, page, listing position) order,
//! with duplicate URLs suppressed across the whole run. A page that only
//! repeats entries already listed for the same day also ends that day.

use crate::config::{Config, SourceConfig};
use crate::crawler::fetcher::{FetchError, HttpFetcher};
use crate::crawler::parser::ListingParser;
use crate::model::{ArchiveDay, DateRange, MetadataRecord, RangeDays};
use crate::output::{Counter, Diagnostics};
use crate::ConfigError;
use chrono::NaiveDate;
use futures::stream::{self, Stream};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Builds the URL of one listing page
///
/// `listing-path` is resolved against `base-url` with `{date}` replaced by
/// the day in `YYYY-MM-DD` form; the page number goes into `page-param`.
pub fn listing_url(
    source: &SourceConfig,
    date: NaiveDate,
    page: u32,
) -> Result<Url, url::ParseError> {
    let path = source
        .listing_path
        .replace("{date}", &date.format("%Y-%m-%d").to_string());

    let mut url = Url::parse(&source.base_url)?.join(&path)?;
    url.query_pairs_mut()
        .append_pair(&source.page_param, &page.to_string());
    Ok(url)
}

/// Lazy producer of metadata records over a date range
pub struct ArchiveCrawler {
    fetcher: Arc<HttpFetcher>,
    parser: ListingParser,
    source: SourceConfig,
    first_page: u32,
    max_pages_per_day: u32,
    days: RangeDays,
    current: Option<ArchiveDay>,
    pending: VecDeque<MetadataRecord>,
    /// URLs emitted anywhere in the run
    seen: HashSet<String>,
    /// URLs listed so far for the current day
    day_urls: HashSet<String>,
    diagnostics: Arc<Diagnostics>,
    cancel: CancellationToken,
}

impl ArchiveCrawler {
    pub fn new(
        config: &Config,
        range: DateRange,
        fetcher: Arc<HttpFetcher>,
        diagnostics: Arc<Diagnostics>,
        cancel: CancellationToken,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            fetcher,
            parser: ListingParser::new(&config.source)?,
            source: config.source.clone(),
            first_page: config.crawler.first_page,
            max_pages_per_day: config.crawler.max_pages_per_day,
            days: range.days(),
            current: None,
            pending: VecDeque::new(),
            seen: HashSet::new(),
            day_urls: HashSet::new(),
            diagnostics,
            cancel,
        })
    }

    /// Returns the next record, fetching listing pages as needed
    ///
    /// Returns `None` once every day is exhausted or the run is cancelled.
    pub async fn next_record(&mut self) -> Option<MetadataRecord> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }

            if let Some(record) = self.pending.pop_front() {
                return Some(record);
            }

            let day = match self.current {
                Some(day) => day,
                None => {
                    let date = self.days.next()?;
                    tracing::info!("Crawling archive for {}", date);
                    self.diagnostics.incr(Counter::DatesCrawled);
                    self.day_urls.clear();
                    ArchiveDay::new(date, self.first_page)
                }
            };

            self.current = self.crawl_page(day).await;
        }
    }

    /// Turns the crawler into a stream of records
    pub fn into_stream(self) -> impl Stream<Item = MetadataRecord> {
        stream::unfold(self, |mut crawler| async move {
            let record = crawler.next_record().await?;
            Some((record, crawler))
        })
    }

    /// Fetches and parses one listing page
    ///
    /// Queues the new records and returns the cursor for the next page, or
    /// `None` when the day is done.
    async fn crawl_page(&mut self, day: ArchiveDay) -> Option<ArchiveDay> {
        if day.pages_fetched >= self.max_pages_per_day {
            tracing::warn!(
                "Reached {} listing pages for {}, moving on",
                self.max_pages_per_day,
                day.date
            );
            return None;
        }

        let url = match listing_url(&self.source, day.date, day.page) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build listing URL for {}: {}", day.date, e);
                self.diagnostics.incr(Counter::ListingFailures);
                return None;
            }
        };

        let page = match self.fetcher.fetch(url.as_str()).await {
            Ok(page) => page,
            Err(e) if e.is_cancelled() => return None,
            Err(FetchError::NotFound { status, .. }) if day.pages_fetched > 0 => {
                tracing::debug!(
                    "Listing page {} for {} returned HTTP {}, end of day",
                    day.page,
                    day.date,
                    status
                );
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    "Error fetching listing page {} for {}, skipping rest of day: {}",
                    day.page,
                    day.date,
                    e
                );
                self.diagnostics.incr(Counter::ListingFailures);
                return None;
            }
        };

        self.diagnostics.incr(Counter::ListingPages);

        let base = Url::parse(&page.final_url).unwrap_or(url);
        let listing = self.parser.parse(&page.body, day.date, &base);
        self.diagnostics
            .add(Counter::EntriesSkipped, listing.skipped as u64);

        if listing.is_empty() {
            tracing::debug!(
                "Listing for {} exhausted after {} page(s)",
                day.date,
                day.pages_fetched + 1
            );
            return None;
        }

        let mut fresh = 0;
        let mut new_for_day = 0;
        for record in listing.records {
            if self.day_urls.insert(record.url.clone()) {
                new_for_day += 1;
            }

            if !self.seen.insert(record.url.clone()) {
                tracing::debug!("Dropping duplicate {}", record.url);
                self.diagnostics.incr(Counter::DuplicatesDropped);
                continue;
            }

            if record.published_at.is_none() {
                self.diagnostics.incr(Counter::UntimedRecords);
            }
            fresh += 1;
            self.pending.push_back(record);
        }

        self.diagnostics
            .add(Counter::RecordsDiscovered, fresh as u64);

        if new_for_day == 0 {
            // some sites ignore the page parameter and serve page 1 forever
            tracing::debug!(
                "Listing page {} for {} repeats earlier pages, end of day",
                day.page,
                day.date
            );
            return None;
        }

        day.next_page()
    }
}
