//! Output sink trait and errors
//!
//! A sink receives articles in discovery order, exactly once each, and is
//! finished once the run is over.

use crate::model::ArticleContent;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for output sinks
///
/// Sinks are driven from a single task, so they take `&mut self`.
pub trait ArticleSink {
    /// Records one article: its metadata row and, when present, its body
    ///
    /// A failure here concerns this article only; the run goes on.
    fn write_article(&mut self, article: &ArticleContent) -> OutputResult<()>;

    /// Flushes and closes the output
    fn finish(&mut self) -> OutputResult<()>;
}

/// Collecting sink, handy for embedding the harvester in other programs
impl ArticleSink for Vec<ArticleContent> {
    fn write_article(&mut self, article: &ArticleContent) -> OutputResult<()> {
        self.push(article.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
