//! Crawl app reviews from the Play Store, either from the rendered app page
//! or from the paginated review feed, into normalized review records.

pub mod api;
pub mod config;
pub mod crawl;
pub mod dates;
pub mod dom;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod locate;
pub mod models;
pub mod normalize;
pub mod rating;

pub use crawl::{crawl_feed, crawl_static, extract_static_page, FeedCrawl, StopReason};
pub use error::{CrawlError, FieldError};
pub use models::ReviewRecord;
