//! File-system output
//!
//! Layout under the output directory:
//!
//! ```text
//! <dir>/onet_metadata.csv                  published_at,url,title
//! <dir>/2023-01-01/<slug>-<hash>.txt       one body per article
//! ```
//!
//! Metadata rows are flushed as they are written, so an interrupted run
//! leaves a usable, if partial, CSV behind.

use crate::model::{ArticleContent, MetadataRecord};
use crate::output::traits::{ArticleSink, OutputError, OutputResult};
use crate::ConfigError;
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use url::Url;

const MAX_SLUG_LEN: usize = 80;
const HASH_LEN: usize = 12;

/// Writes the metadata CSV and one text file per article body
pub struct FileSink {
    root: PathBuf,
    writer: csv::Writer<File>,
}

impl FileSink {
    /// Creates the output directory and the metadata file with its header
    ///
    /// An existing metadata file is truncated.
    pub fn create(root: &Path, metadata_file: &str) -> OutputResult<Self> {
        fs::create_dir_all(root)?;

        let metadata_path = root.join(metadata_file);
        let mut writer = csv::Writer::from_path(&metadata_path)?;
        writer.write_record(["published_at", "url", "title"])?;
        writer.flush()?;

        tracing::info!("New file created: {}", metadata_path.display());

        Ok(Self {
            root: root.to_path_buf(),
            writer,
        })
    }

    fn write_body(&self, article: &ArticleContent) -> OutputResult<PathBuf> {
        let path = self.root.join(article_path(&article.record));
        let write_error = |source| OutputError::Write {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(&path, &article.body).map_err(write_error)?;

        Ok(path)
    }
}

impl ArticleSink for FileSink {
    fn write_article(&mut self, article: &ArticleContent) -> OutputResult<()> {
        let record = &article.record;
        self.writer.write_record([
            format_timestamp(record.published_at).as_str(),
            record.url.as_str(),
            record.title.as_str(),
        ])?;
        self.writer.flush()?;

        // no body file for failed articles
        if article.has_body() {
            let path = self.write_body(article)?;
            tracing::debug!("Saved {} to {}", record.url, path.display());
        }

        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Checks that `path` exists (creating it if needed) and accepts new files
///
/// Runs before any network activity so an unusable output directory fails
/// the run up front.
pub fn ensure_writable_dir(path: &Path) -> Result<(), ConfigError> {
    let dir_error = |source| ConfigError::OutputDir {
        path: path.display().to_string(),
        source,
    };

    fs::create_dir_all(path).map_err(dir_error)?;

    let probe = path.join(".archive-harvest-probe");
    fs::write(&probe, b"").map_err(dir_error)?;
    fs::remove_file(&probe).map_err(dir_error)?;

    Ok(())
}

/// Relative path of an article's body file
///
/// `<archive date>/<slug>-<hash>.txt`, where the slug comes from the last URL
/// path segment and the hash is the first 12 hex digits of SHA-256 of the
/// URL. Distinct URLs get distinct names even when their slugs collide.
pub fn article_path(record: &MetadataRecord) -> PathBuf {
    let day = record.archive_date.format("%Y-%m-%d").to_string();
    let file_name = format!("{}-{}.txt", url_slug(&record.url), url_hash(&record.url));
    PathBuf::from(day).join(file_name)
}

fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_LEN);
    hash
}

/// Sanitized last path segment of a URL
fn url_slug(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string)
        })
        .unwrap_or_default();

    let mut slug = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug: String = slug
        .trim_matches(|c| c == '-' || c == '.')
        .chars()
        .take(MAX_SLUG_LEN)
        .collect();

    if slug.is_empty() {
        "article".to_string()
    } else {
        slug
    }
}

/// Formats a publication time for the CSV; untimed records get an empty cell
pub fn format_timestamp(published_at: Option<NaiveDateTime>) -> String {
    published_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
