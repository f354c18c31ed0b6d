use crate::config::types::{Config, OutputConfig, SpiderConfig, UserAgentConfig};
use crate::extract::SelectorSet;
use crate::ConfigError;
use url::Url;

/// Upper bound for `download-delay` (milliseconds)
const MAX_DOWNLOAD_DELAY: u64 = 60_000;

/// Upper bound for `retry-times`
const MAX_RETRY_TIMES: u32 = 10;

/// Upper bound for `request-timeout` (seconds)
const MAX_REQUEST_TIMEOUT: u64 = 600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_spider_config(&config.spider)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    SelectorSet::from_config(&config.selectors)?;
    Ok(())
}

/// Validates spider configuration
fn validate_spider_config(config: &SpiderConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "spider name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "spider name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.name
        )));
    }

    if config.start_urls.is_empty() {
        return Err(ConfigError::Validation(
            "at least one start URL is required".to_string(),
        ));
    }

    for start_url in &config.start_urls {
        let url = Url::parse(start_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", start_url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Start URL '{}' must use HTTP or HTTPS",
                start_url
            )));
        }
    }

    for pattern in &config.allowed_domains {
        validate_domain_pattern(pattern)?;
    }

    if config.download_delay > MAX_DOWNLOAD_DELAY {
        return Err(ConfigError::Validation(format!(
            "download_delay must be <= {}ms, got {}ms",
            MAX_DOWNLOAD_DELAY, config.download_delay
        )));
    }

    if config.retry_times > MAX_RETRY_TIMES {
        return Err(ConfigError::Validation(format!(
            "retry_times must be <= {}, got {}",
            MAX_RETRY_TIMES, config.retry_times
        )));
    }

    if config.request_timeout < 1 || config.request_timeout > MAX_REQUEST_TIMEOUT {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be between 1 and {} seconds, got {}",
            MAX_REQUEST_TIMEOUT, config.request_timeout
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if matches!(config.feed_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "feed_path cannot be empty when set".to_string(),
        ));
    }

    if matches!(config.summary_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    match pattern.strip_prefix("*.") {
        Some(domain) => validate_domain_string(domain),
        None => validate_domain_string(pattern),
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // "localhost" is the one dotless host worth allowing
    if !domain.contains('.') && domain != "localhost" {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeedFormat, SelectorConfig};
    use crate::extract::NextLinkScope;

    fn valid_config() -> Config {
        Config {
            spider: SpiderConfig {
                name: "quotes2".to_string(),
                start_urls: vec!["http://quotes.toscrape.com/page/1/".to_string()],
                allowed_domains: vec!["quotes.toscrape.com".to_string()],
                max_pages: 0,
                download_delay: 1000,
                obey_robots: true,
                next_link_scope: NextLinkScope::Page,
                retry_times: 2,
                retry_backoff: 500,
                request_timeout: 30,
            },
            user_agent: UserAgentConfig {
                crawler_name: "QuotesSpider".to_string(),
                crawler_version: "0.1".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                database_path: "./quotes.db".to_string(),
                feed_path: None,
                feed_format: FeedFormat::JsonLines,
                summary_path: None,
            },
            selectors: SelectorConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_spider_name_rules() {
        let mut config = valid_config();
        config.spider.name = "quotes 2".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.spider.name = "quotes_2-x".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_start_urls_required() {
        let mut config = valid_config();
        config.spider.start_urls.clear();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_start_url_must_parse() {
        let mut config = valid_config();
        config.spider.start_urls = vec!["/page/1/".to_string()];
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_start_url_scheme() {
        let mut config = valid_config();
        config.spider.start_urls = vec!["ftp://quotes.toscrape.com/".to_string()];
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_limits() {
        let mut config = valid_config();
        config.spider.download_delay = MAX_DOWNLOAD_DELAY + 1;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.spider.retry_times = MAX_RETRY_TIMES + 1;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.spider.request_timeout = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.spider.download_delay = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_optional_paths_rejected() {
        let mut config = valid_config();
        config.output.feed_path = Some(String::new());
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.output.summary_path = Some(String::new());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("example.com").is_ok());
        assert!(validate_domain_pattern("*.example.com").is_ok());
        assert!(validate_domain_pattern("127.0.0.1").is_ok());
        assert!(validate_domain_pattern("localhost").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern("example").is_err());
        assert!(validate_domain_pattern(".example.com").is_err());
        assert!(validate_domain_pattern("example.com.").is_err());
        assert!(validate_domain_pattern("exa..mple.com").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }
}
