use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use quotes_spider::config::load_config;
///
/// let config = load_config(Path::new("quotes.toml")).unwrap();
/// println!("Download delay: {}ms", config.spider.download_delay);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored with each run so runs made under different
/// configurations can be told apart.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedFormat;
    use crate::extract::NextLinkScope;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MINIMAL: &str = r#"
[spider]
name = "quotes2"
start-urls = ["http://quotes.toscrape.com/page/1/"]

[user-agent]
crawler-name = "QuotesSpider"
crawler-version = "0.1"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "./quotes.db"
"#;

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let file = create_temp_config(MINIMAL);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.spider.name, "quotes2");
        assert_eq!(config.spider.start_urls.len(), 1);
        assert!(config.spider.allowed_domains.is_empty());
        assert_eq!(config.spider.max_pages, 0);
        assert_eq!(config.spider.download_delay, 1000);
        assert!(config.spider.obey_robots);
        assert_eq!(config.spider.next_link_scope, NextLinkScope::Page);
        assert_eq!(config.spider.retry_times, 2);
        assert_eq!(config.output.feed_path, None);
        assert_eq!(config.output.feed_format, FeedFormat::JsonLines);
        assert_eq!(config.selectors.quote, "div.quote");
        assert_eq!(config.selectors.next_link, "li.next > a");
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[spider]
name = "quotes2"
start-urls = ["http://quotes.toscrape.com/page/1/"]
allowed-domains = ["quotes.toscrape.com"]
max-pages = 5
download-delay = 250
obey-robots = false
next-link-scope = "last-record"
retry-times = 0
retry-backoff = 10
request-timeout = 5

[user-agent]
crawler-name = "QuotesSpider"
crawler-version = "0.1"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "./quotes.db"
feed-path = "./quotes.json"
feed-format = "json"
summary-path = "./summary.md"

[selectors]
author = "span.author"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.spider.allowed_domains, vec!["quotes.toscrape.com"]);
        assert_eq!(config.spider.max_pages, 5);
        assert!(!config.spider.obey_robots);
        assert_eq!(config.spider.next_link_scope, NextLinkScope::LastRecord);
        assert_eq!(config.output.feed_format, FeedFormat::Json);
        assert_eq!(config.output.summary_path.as_deref(), Some("./summary.md"));
        assert_eq!(config.selectors.author, "span.author");
        assert_eq!(config.selectors.text, "span.text");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/quotes.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_scope_is_rejected() {
        let content = MINIMAL.replace(
            "start-urls = [",
            "next-link-scope = \"whole-site\"\nstart-urls = [",
        );
        assert!(matches!(parse_config(&content), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = MINIMAL.replace(r#"name = "quotes2""#, r#"name = """#);
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let content = format!("{}\n[selectors]\nquote = \"div[\"\n", MINIMAL);
        assert!(matches!(
            parse_config(&content),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_user_agent_string() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(
            config.user_agent_string(),
            "QuotesSpider/0.1 (+https://example.com/about; admin@example.com)"
        );
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
