use crate::config::types::{Config, CrawlerConfig, HttpConfig};
use crate::ConfigError;

/// Upper bound for every pool size and the per-host limit
const MAX_CONCURRENCY: usize = 1024;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates worker pool sizes and the per-host limit
pub fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.download_concurrency < 1 || config.download_concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "download_concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.download_concurrency
        )));
    }

    if config.extract_concurrency < 1 || config.extract_concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "extract_concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.extract_concurrency
        )));
    }

    // 0 disables per-host throttling
    if config.per_host_limit > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "per_host_limit must be at most {}, got {}",
            MAX_CONCURRENCY, config.per_host_limit
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    Ok(())
}
