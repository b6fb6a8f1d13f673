//! Listing model for marketplace search results
//!
//! A `Listing` is one marketplace offer for a specific printing and condition
//! of a card. Listings are produced fresh per search by the extraction
//! pipeline and discarded after selection; they are never persisted directly.

use serde::{Deserialize, Serialize};

/// Sentinel used when a listing exposes no parseable price.
pub const PRICE_UNKNOWN: &str = "N/A";

/// Physical condition of the offered card.
///
/// Classification is a substring search over the listing text, checked in
/// priority order: "Near Mint" wins over "Played"; anything else is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Condition {
    NearMint,
    Played,
    Unknown,
}

impl Condition {
    /// Classify a chunk of listing text.
    pub fn classify(text: &str) -> Self {
        if text.contains("Near Mint") {
            Self::NearMint
        } else if text.contains("Played") {
            Self::Played
        } else {
            Self::Unknown
        }
    }

    /// Human-readable label, as it appears on the marketplace pages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NearMint => "Near Mint",
            Self::Played => "Played",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Near Mint" => Ok(Self::NearMint),
            "Played" => Ok(Self::Played),
            "Unknown" => Ok(Self::Unknown),
            other => Err(format!("invalid condition: {other}")),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One marketplace offer extracted from a search results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Card display name; the page's canonical title when available,
    /// otherwise the caller-supplied query term.
    pub name: String,
    /// Set / edition the printing belongs to. Empty when the page layout
    /// does not expose it (full-text extraction).
    pub set: String,
    /// Printing code, e.g. "YS18-EN014". Always present; rows without a
    /// recognizable code are skipped during extraction.
    pub code: String,
    /// Formatted price string such as "$4.99", or [`PRICE_UNKNOWN`].
    pub price: String,
    /// Free-text rarity, default "Unknown".
    pub rarity: String,
    pub condition: Condition,
    /// Seller stock count, default 0 when the page does not state one.
    pub stock: u32,
}

impl Listing {
    /// Numeric value of the price for sorting; the sentinel maps to 0.0.
    pub fn price_value(&self) -> f64 {
        price_value(&self.price)
    }
}

/// Parse a formatted price string into its numeric value.
pub fn price_value(price: &str) -> f64 {
    if price == PRICE_UNKNOWN {
        return 0.0;
    }
    price
        .trim_start_matches('$')
        .replace(',', "")
        .parse()
        .unwrap_or(0.0)
}

/// Sort listings for display: name (case-insensitive) ascending, then price
/// descending within a name.
pub fn sort_listings(listings: &mut [Listing]) {
    listings.sort_by(|a, b| {
        let by_name = a.name.to_lowercase().cmp(&b.name.to_lowercase());
        by_name.then_with(|| {
            b.price_value()
                .partial_cmp(&a.price_value())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });
}
