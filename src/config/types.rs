use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Archive-Harvest
///
/// Every section is optional; a missing section or key falls back to the
/// defaults below, which target the Onet news archive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Page number of the first listing page of a day
    #[serde(rename = "first-page")]
    pub first_page: u32,

    /// Hard cap on listing pages fetched for a single day
    #[serde(rename = "max-pages-per-day")]
    pub max_pages_per_day: u32,

    /// Maximum number of article pages fetched concurrently
    pub concurrency: u32,

    /// Minimum time between two consecutive requests (milliseconds)
    #[serde(rename = "politeness-delay-ms")]
    pub politeness_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Number of retries after a transient failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base delay between retries, multiplied by the attempt number (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

impl CrawlerConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            first_page: 1,
            max_pages_per_day: 100,
            concurrency: 4,
            politeness_delay_ms: 500,
            request_timeout_secs: 10,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Where the archive lives and how its markup is laid out
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Scheme and host of the archive site
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of a day's listing; `{date}` is replaced with `YYYY-MM-DD`
    #[serde(rename = "listing-path")]
    pub listing_path: String,

    /// Query parameter carrying the listing page number
    #[serde(rename = "page-param")]
    pub page_param: String,

    /// Selector matching one listing entry per article
    #[serde(rename = "entry-selector")]
    pub entry_selector: String,

    /// Selector for the publication time inside an entry
    #[serde(rename = "time-selector")]
    pub time_selector: String,

    /// Selector for the article anchor inside an entry
    #[serde(rename = "link-selector")]
    pub link_selector: String,

    /// Selector for the main text container of an article page
    #[serde(rename = "content-selector")]
    pub content_selector: String,

    /// Alternate containers tried in order when the primary one yields nothing
    #[serde(rename = "fallback-selectors")]
    pub fallback_selectors: Vec<String>,

    /// Text-bearing elements collected from the matched container
    #[serde(rename = "paragraph-selector")]
    pub paragraph_selector: String,

    /// Article lead, prepended to the body when found
    #[serde(rename = "lead-selector")]
    pub lead_selector: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wiadomosci.onet.pl".to_string(),
            listing_path: "/archiwum/{date}".to_string(),
            page_param: "page".to_string(),
            entry_selector: ".dayInArchive li".to_string(),
            time_selector: ".itemTime".to_string(),
            link_selector: "a.itemTitle".to_string(),
            content_selector: "#detail".to_string(),
            fallback_selectors: vec![
                "article .articleBody".to_string(),
                ".article-body".to_string(),
                "article".to_string(),
                "main".to_string(),
            ],
            paragraph_selector: "p".to_string(),
            lead_selector: Some(".hyphenate.lead".to_string()),
        }
    }
}

/// User agent sent with every request
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File name of the metadata CSV, created inside the output directory
    #[serde(rename = "metadata-file")]
    pub metadata_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            metadata_file: "onet_metadata.csv".to_string(),
        }
    }
}
