//! Domain module - Core business logic and entities
//!
//! Contains the listing model produced by extraction, the staging engine that
//! owns all working-collection mutation semantics, and the store contract for
//! durable collections.

pub mod listing;
pub mod repositories;
pub mod staging;

// Re-export commonly used items for convenience
pub use listing::{Condition, Listing, PRICE_UNKNOWN};
pub use repositories::{Collection, CollectionItem, CollectionStore};
pub use staging::{identity_key, StagingEngine, StagingItem};
