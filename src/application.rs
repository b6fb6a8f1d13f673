//! Application layer module
//!
//! Use cases that orchestrate the domain logic: card search, collection
//! persistence, and query-list import.

pub mod collections;
pub mod import;
pub mod search;

pub use collections::CollectionService;
pub use import::{read_query_list, ImportError};
pub use search::SearchService;
