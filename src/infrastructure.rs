//! Infrastructure layer for HTTP fetching, HTML parsing, and storage
//!
//! Provides the marketplace HTTP client and batch fetcher, the listing
//! extraction pipeline, the SQLite collection store, and configuration and
//! logging setup.

pub mod collection_store;
pub mod config;
pub mod fetcher;
pub mod http_client;
pub mod logging;
pub mod parsing;

// Re-export commonly used items
pub use collection_store::SqliteCollectionStore;
pub use config::{coolstuffinc, AppConfig, LoggingConfig};
pub use fetcher::PageFetcher;
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::{init_logging, init_logging_with_config};
pub use parsing::{dedup_listings, ExtractError, ExtractResult, ListingExtractor};
