use crate::config::types::{Config, CrawlerConfig, OutputConfig, SourceConfig, UserAgentConfig};
use crate::ConfigError;
use crate::crawler::compile_selector;
use url::Url;

const MAX_FIRST_PAGE: u32 = 1_000_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_source_config(&config.source)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.politeness_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "politeness_delay_ms must be >= 100ms, got {}ms",
            config.politeness_delay_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.max_pages_per_day < 1 {
        return Err(ConfigError::Validation(
            "max_pages_per_day must be >= 1".to_string(),
        ));
    }

    if config.first_page > MAX_FIRST_PAGE {
        return Err(ConfigError::Validation(format!(
            "first_page must be <= {}, got {}",
            MAX_FIRST_PAGE, config.first_page
        )));
    }

    Ok(())
}

/// Validates the archive source: base URL, listing template and selectors
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.listing_path.contains("{date}") {
        return Err(ConfigError::Validation(format!(
            "listing_path '{}' must contain the {{date}} placeholder",
            config.listing_path
        )));
    }

    if config.page_param.is_empty() {
        return Err(ConfigError::Validation(
            "page_param cannot be empty".to_string(),
        ));
    }

    validate_selector(&config.entry_selector)?;
    validate_selector(&config.time_selector)?;
    validate_selector(&config.link_selector)?;
    validate_selector(&config.content_selector)?;
    validate_selector(&config.paragraph_selector)?;
    for selector in &config.fallback_selectors {
        validate_selector(selector)?;
    }
    if let Some(lead) = &config.lead_selector {
        validate_selector(lead)?;
    }

    Ok(())
}

/// Checks that a CSS selector parses
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    compile_selector(selector).map(|_| ())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.metadata_file.is_empty() {
        return Err(ConfigError::Validation(
            "metadata_file cannot be empty".to_string(),
        ));
    }

    // must stay inside the output directory
    if config.metadata_file.contains('/')
        || config.metadata_file.contains('\\')
        || config.metadata_file == "."
        || config.metadata_file == ".."
    {
        return Err(ConfigError::Validation(format!(
            "metadata_file must be a plain file name, got '{}'",
            config.metadata_file
        )));
    }

    Ok(())
}
