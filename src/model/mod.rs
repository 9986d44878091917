//! Data model shared by the crawler and the output layer
//!
//! - [`DateRange`] and [`ArchiveDay`] drive the day-by-day traversal
//! - [`MetadataRecord`] describes one listed article
//! - [`ArticleContent`] pairs a record with its extracted body

mod article;
mod dates;

pub use article::{ArticleContent, ArticleFailure, MetadataRecord};
pub use dates::{parse_date, ArchiveDay, DateRange, RangeDays};
