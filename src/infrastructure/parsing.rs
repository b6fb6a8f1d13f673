//! Listing extraction pipeline
//!
//! HTML parsing for marketplace search result pages: a four-tier fallback
//! cascade with per-row fault isolation, plus page-level deduplication.

pub mod dedup;
pub mod error;
pub mod listing_parser;

pub use dedup::dedup_listings;
pub use error::{ExtractError, ExtractResult};
pub use listing_parser::{ListingExtractor, RowOutcome, RowSkip};
