//! cardscout - Trading Card Marketplace Scraper
//!
//! This library scrapes card listings from a marketplace search page,
//! stages them in an in-memory working collection with undo support,
//! and persists named collections to SQLite.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the main types for easier access
pub use application::{read_query_list, CollectionService, ImportError, SearchService};
pub use domain::{
    identity_key, Collection, CollectionItem, CollectionStore, Condition, Listing, StagingEngine,
    StagingItem, PRICE_UNKNOWN,
};
pub use infrastructure::{
    dedup_listings, init_logging, AppConfig, ExtractError, HttpClient, HttpClientConfig,
    ListingExtractor, PageFetcher, SqliteCollectionStore,
};
