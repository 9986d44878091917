//! Crawler module for archive traversal and article harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with throttling and retry logic
//! - Listing page parsing and article body extraction
//! - Day-by-day archive traversal
//! - The concurrent article pipeline and overall run coordination

mod archive;
mod extractor;
mod fetcher;
mod parser;
mod pipeline;

pub use archive::{listing_url, ArchiveCrawler};
pub use extractor::{ContentExtractor, Extraction, ExtractionOutcome};
pub use fetcher::{build_http_client, FetchError, FetchedPage, HttpFetcher, RetryPolicy};
pub use parser::{ListingPage, ListingParser};
pub use pipeline::ArticlePipeline;

pub(crate) use parser::compile_selector;

use crate::config::Config;
use crate::model::DateRange;
use crate::output::{ArticleSink, CrawlSummary, Diagnostics, FileSink};
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Coordinates one harvesting run
///
/// Owns the shared fetcher and counters, and wires the archive crawler into
/// the article pipeline.
pub struct Harvester {
    config: Config,
    fetcher: Arc<HttpFetcher>,
    diagnostics: Arc<Diagnostics>,
    cancel: CancellationToken,
}

impl Harvester {
    /// Creates a harvester; `cancel` interrupts the run when triggered
    pub fn new(config: Config, cancel: CancellationToken) -> Result<Self, HarvestError> {
        let fetcher = HttpFetcher::from_config(&config)?.with_cancellation(cancel.clone());

        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            diagnostics: Arc::new(Diagnostics::new()),
            cancel,
        })
    }

    /// Harvests every day of `range` into `sink`
    ///
    /// An empty range (start after end) is a successful run that touches
    /// nothing. Cancellation stops new fetches; articles already in flight
    /// still reach the sink.
    pub async fn run<K>(&self, range: DateRange, sink: &mut K) -> Result<CrawlSummary, HarvestError>
    where
        K: ArticleSink + ?Sized,
    {
        if range.is_empty() {
            tracing::info!("Start date {} is after end date {}, nothing to do", range.start, range.end);
        } else {
            tracing::info!(
                "Starting data extraction for dates: {} to {} ({} days)",
                range.start,
                range.end,
                range.len()
            );
        }

        let crawler = ArchiveCrawler::new(
            &self.config,
            range,
            self.fetcher.clone(),
            self.diagnostics.clone(),
            self.cancel.clone(),
        )?;
        let pipeline = ArticlePipeline::new(
            &self.config,
            self.fetcher.clone(),
            self.diagnostics.clone(),
            self.cancel.clone(),
        )?;

        pipeline.run(crawler.into_stream(), sink).await?;

        let summary = self
            .diagnostics
            .summary(self.fetcher.retry_count(), self.cancel.is_cancelled());

        if summary.cancelled {
            tracing::warn!("Harvest interrupted; output is partial");
        }
        tracing::info!(
            "Harvest finished: {} records, {} extracted, {} failures, {} requests",
            summary.records_discovered,
            summary.articles_extracted,
            summary.total_failures(),
            self.fetcher.request_count()
        );

        Ok(summary)
    }
}

/// Runs a complete harvest into `output_dir`
///
/// This is the main entry point for a run. It will:
/// 1. Create the output directory and the metadata CSV
/// 2. Crawl the archive listings day by day
/// 3. Fetch and extract every discovered article
/// 4. Return the run summary
///
/// Callers wanting the directory checked before anything else, as the CLI
/// does, run [`ensure_writable_dir`](crate::output::ensure_writable_dir) first.
pub async fn harvest(
    config: Config,
    range: DateRange,
    output_dir: &Path,
    cancel: CancellationToken,
) -> Result<CrawlSummary, HarvestError> {
    let mut sink = FileSink::create(output_dir, &config.output.metadata_file)?;

    let harvester = Harvester::new(config, cancel)?;
    harvester.run(range, &mut sink).await
}
