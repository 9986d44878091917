//! Output module for persisting harvested articles
//!
//! This module handles:
//! - The sink interface articles are handed to
//! - The CSV metadata file and per-article body files
//! - Run statistics and the end-of-run summary

mod files;
pub mod stats;
mod traits;

pub use files::{article_path, ensure_writable_dir, format_timestamp, FileSink};
pub use stats::{print_summary, Counter, CrawlSummary, Diagnostics};
pub use traits::{ArticleSink, OutputError, OutputResult};
