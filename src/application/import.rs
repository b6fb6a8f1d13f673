//! Query-list import
//!
//! Reads a plain-text card list and turns it into search terms. Only lines
//! in the `3x Card Name` form produce a term (the name); blank lines, section
//! headers ending in `:`, and anything else without the quantity prefix are
//! skipped. Repeated names keep their first position.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

static QUANTITY_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+x\s+(.+)$").expect("quantity prefix regex must compile"));

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Query list not found: {path}")]
    MissingSource { path: PathBuf },

    #[error("Failed to read query list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read search terms from a query-list file, in file order.
pub async fn read_query_list(path: impl AsRef<Path>) -> Result<Vec<String>, ImportError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ImportError::MissingSource {
            path: path.to_path_buf(),
        });
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    let mut terms = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.ends_with(':') {
            continue;
        }

        // Only quantity-prefixed lines name a card; everything else in a
        // deck list is prose or formatting.
        let Some(caps) = QUANTITY_PREFIX_RE.captures(line) else {
            continue;
        };

        let term = caps[1].trim().to_string();
        if seen.insert(term.clone()) {
            terms.push(term);
        }
    }

    debug!("Read {} query terms from {}", terms.len(), path.display());
    Ok(terms)
}
