//! Run statistics
//!
//! Every recoverable problem of a run (failed listing pages, duplicate or
//! malformed entries, failed article fetches, empty extractions, write errors)
//! is counted here and reported once the run finishes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    DatesCrawled,
    ListingPages,
    ListingFailures,
    RecordsDiscovered,
    DuplicatesDropped,
    EntriesSkipped,
    UntimedRecords,
    ArticlesFetched,
    ArticlesExtracted,
    ExtractionFailures,
    TransientFailures,
    NotFoundFailures,
    WriteFailures,
}

const COUNTERS: usize = 13;

/// Thread-safe run counters shared by the crawler and the article workers
#[derive(Debug, Default)]
pub struct Diagnostics {
    counts: [AtomicU64; COUNTERS],
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&self, counter: Counter) {
        self.add(counter, 1);
    }

    pub fn add(&self, counter: Counter, n: u64) {
        self.counts[counter as usize].fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counts[counter as usize].load(Ordering::Relaxed)
    }

    /// Freezes the counters into a summary
    pub fn summary(&self, retries: u64, cancelled: bool) -> CrawlSummary {
        CrawlSummary {
            dates_crawled: self.get(Counter::DatesCrawled),
            listing_pages: self.get(Counter::ListingPages),
            listing_failures: self.get(Counter::ListingFailures),
            records_discovered: self.get(Counter::RecordsDiscovered),
            duplicates_dropped: self.get(Counter::DuplicatesDropped),
            entries_skipped: self.get(Counter::EntriesSkipped),
            untimed_records: self.get(Counter::UntimedRecords),
            articles_fetched: self.get(Counter::ArticlesFetched),
            articles_extracted: self.get(Counter::ArticlesExtracted),
            extraction_failures: self.get(Counter::ExtractionFailures),
            transient_failures: self.get(Counter::TransientFailures),
            not_found_failures: self.get(Counter::NotFoundFailures),
            write_failures: self.get(Counter::WriteFailures),
            retries,
            cancelled,
        }
    }
}

/// End-of-run summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Archive days whose listing was traversed
    pub dates_crawled: u64,

    /// Listing pages fetched successfully
    pub listing_pages: u64,

    /// Days cut short by a listing fetch failure
    pub listing_failures: u64,

    /// Unique metadata records emitted
    pub records_discovered: u64,

    /// Records suppressed because their URL was already seen
    pub duplicates_dropped: u64,

    /// Listing entries without a usable URL
    pub entries_skipped: u64,

    /// Records without a publication time
    pub untimed_records: u64,

    /// Article pages fetched successfully
    pub articles_fetched: u64,

    /// Articles with a non-empty body
    pub articles_extracted: u64,

    /// Fetched articles where no content selector matched
    pub extraction_failures: u64,

    /// Article fetches that failed transiently after all retries
    pub transient_failures: u64,

    /// Article fetches rejected with a client error status
    pub not_found_failures: u64,

    /// Articles that could not be written out
    pub write_failures: u64,

    /// Retries performed across all requests
    pub retries: u64,

    /// Whether the run was interrupted
    pub cancelled: bool,
}

impl CrawlSummary {
    /// Failed article fetches of any kind
    pub fn fetch_failures(&self) -> u64 {
        self.transient_failures + self.not_found_failures
    }

    /// Every counted failure of the run
    pub fn total_failures(&self) -> u64 {
        self.listing_failures + self.fetch_failures() + self.extraction_failures + self.write_failures
    }
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Harvest Summary ===\n");

    if summary.cancelled {
        println!("Run was interrupted; output is partial.\n");
    }

    println!("Listing:");
    println!("  Days crawled: {}", summary.dates_crawled);
    println!("  Listing pages fetched: {}", summary.listing_pages);
    println!("  Records discovered: {}", summary.records_discovered);
    println!("  Duplicates dropped: {}", summary.duplicates_dropped);
    println!("  Entries skipped (no URL): {}", summary.entries_skipped);
    println!("  Records without time: {}", summary.untimed_records);
    println!();

    println!("Articles:");
    println!("  Fetched: {}", summary.articles_fetched);
    println!("  Extracted: {}", summary.articles_extracted);
    println!("  Retries: {}", summary.retries);
    println!();

    if summary.total_failures() > 0 {
        println!("Failures:");
        println!("  Listing days cut short: {}", summary.listing_failures);
        println!("  Transient fetch failures: {}", summary.transient_failures);
        println!("  Not found: {}", summary.not_found_failures);
        println!("  Extraction failed: {}", summary.extraction_failures);
        println!("  Write failures: {}", summary.write_failures);
        println!();
    }

    let success_rate = if summary.records_discovered > 0 {
        (summary.articles_extracted as f64 / summary.records_discovered as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} articles extracted)",
        success_rate, summary.articles_extracted, summary.records_discovered
    );
}
