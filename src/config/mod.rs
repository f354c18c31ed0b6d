//! Configuration module for Quotes-Spider
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use quotes_spider::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("quotes.toml")).unwrap();
//! println!("Spider {} starts at {:?}", config.spider.name, config.spider.start_urls);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FeedFormat, OutputConfig, SelectorConfig, SpiderConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
