//! Error types for the extraction pipeline
//!
//! Construction is the only fallible part of the extractor; routine per-row
//! skips are values, not errors (see `RowOutcome`).

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExtractError {
    #[error("invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl ExtractError {
    pub fn invalid_selector(selector: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;
