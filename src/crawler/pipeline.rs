//! Article fetching and extraction
//!
//! Records flow in discovery order; up to `concurrency` article fetches are
//! in flight at once, and finished articles reach the sink in the same order
//! the records were discovered.

use crate::config::Config;
use crate::crawler::extractor::ContentExtractor;
use crate::crawler::fetcher::{FetchError, HttpFetcher};
use crate::model::{ArticleContent, ArticleFailure, MetadataRecord};
use crate::output::{ArticleSink, Counter, Diagnostics, OutputResult};
use crate::ConfigError;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fetches articles concurrently and hands them to a sink
pub struct ArticlePipeline {
    fetcher: Arc<HttpFetcher>,
    extractor: ContentExtractor,
    concurrency: usize,
    diagnostics: Arc<Diagnostics>,
    cancel: CancellationToken,
}

impl ArticlePipeline {
    pub fn new(
        config: &Config,
        fetcher: Arc<HttpFetcher>,
        diagnostics: Arc<Diagnostics>,
        cancel: CancellationToken,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            fetcher,
            extractor: ContentExtractor::new(&config.source)?,
            concurrency: config.crawler.concurrency.max(1) as usize,
            diagnostics,
            cancel,
        })
    }

    /// Drains `records` into `sink`
    ///
    /// Every record that is taken from the stream before cancellation produces
    /// exactly one article, with an empty body if it could not be fetched or
    /// extracted. Sink failures are logged and counted; only a failure to
    /// finish the sink is returned.
    pub async fn run<S, K>(&self, records: S, sink: &mut K) -> OutputResult<()>
    where
        S: Stream<Item = MetadataRecord>,
        K: ArticleSink + ?Sized,
    {
        let articles = records
            .take_until(self.cancel.cancelled())
            .map(|record| self.process(record))
            .buffered(self.concurrency);
        futures::pin_mut!(articles);

        while let Some(article) = articles.next().await {
            // dropped after cancellation, before the fetch started
            let Some(article) = article else {
                continue;
            };

            if let Err(e) = sink.write_article(&article) {
                tracing::error!("Failed to save {}: {}", article.record.url, e);
                self.diagnostics.incr(Counter::WriteFailures);
            }
        }

        sink.finish()
    }

    /// Fetches one article and extracts its body
    ///
    /// Returns `None` if the run was cancelled before the request went out.
    pub async fn process(&self, record: MetadataRecord) -> Option<ArticleContent> {
        if self.cancel.is_cancelled() {
            tracing::debug!("Cancelled before fetching {}", record.url);
            return None;
        }

        let page = match self.fetcher.fetch(&record.url).await {
            Ok(page) => page,
            Err(e) if e.is_cancelled() => {
                tracing::debug!("Cancelled before fetching {}", e.url());
                return None;
            }
            Err(e) => {
                self.count_fetch_failure(&e);
                tracing::warn!("Error fetching article: {}", e);
                return Some(ArticleContent::failed(record, ArticleFailure::Fetch(e)));
            }
        };

        self.diagnostics.incr(Counter::ArticlesFetched);

        let extraction = self.extractor.extract(&page.body);
        if extraction.is_failed() {
            tracing::warn!("No article content found at {}", record.url);
            self.diagnostics.incr(Counter::ExtractionFailures);
            return Some(ArticleContent::failed(
                record,
                ArticleFailure::ExtractionFailed,
            ));
        }

        tracing::info!("Data extracted for URL {} ({:?})", record.url, extraction.outcome);
        self.diagnostics.incr(Counter::ArticlesExtracted);
        Some(ArticleContent::extracted(record, extraction.body))
    }

    fn count_fetch_failure(&self, error: &FetchError) {
        let counter = if error.is_transient() {
            Counter::TransientFailures
        } else {
            Counter::NotFoundFailures
        };
        self.diagnostics.incr(counter);
    }
}
