//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: where each requested page ended up (queued, parsed, dead link, ...)
//! - `DomainState`: per-domain request timing, rate limiting, and cached robots.txt

mod domain_state;
mod page_state;

// Re-export main types
pub use domain_state::{DomainState, MAX_CRAWL_DELAY};
pub use page_state::PageState;
