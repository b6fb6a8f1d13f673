//! Page-level listing deduplication
//!
//! Identity at this stage is (code, condition, price), deliberately finer
//! than the staging identity of (code, condition). Two rows agreeing on code
//! and condition but differing in price are separate sale instances and both
//! survive; identical triples collapse to the first occurrence in document
//! order. Do not unify the two identity notions.

use std::collections::HashSet;

use crate::domain::listing::{Condition, Listing};

/// Collapse exact-duplicate listings from a single page, keeping the first
/// occurrence of each (code, condition, price) triple. Idempotent.
pub fn dedup_listings(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen: HashSet<(String, Condition, String)> = HashSet::new();
    let mut unique = Vec::with_capacity(listings.len());

    for listing in listings {
        let key = (listing.code.clone(), listing.condition, listing.price.clone());
        if seen.insert(key) {
            unique.push(listing);
        }
    }

    unique
}
