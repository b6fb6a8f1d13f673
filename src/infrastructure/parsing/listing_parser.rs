//! Listing extractor for marketplace search result pages
//!
//! Recovers structured listings from HTML whose shape varies and sometimes
//! degrades to unstructured prose. Structural selector tiers are attempted in
//! order; the first tier producing candidate row elements wins, and only when
//! the winning tier parses to zero listings does the last-resort full-text
//! scan run. Per-row parsing is fault-isolated: a row the parser cannot use
//! is skipped without aborting the rest of the page.
//!
//! The cascade is tuned to one page family, not a general scraping framework.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;

use super::error::{ExtractError, ExtractResult};
use crate::domain::listing::{Condition, Listing, PRICE_UNKNOWN};

/// Printing code shape: 2-4 uppercase letters, optional digits, hyphen,
/// 2-3 uppercase letters, digits. E.g. "YS18-EN014", "SDY-046".
static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{2,4}\d*-[A-Z]{2,3}\d+").expect("code pattern"));

/// Anchor for the full-text scan: an explicit "Card #:" label before a code.
static ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Card #:\s*([A-Z]{2,4}\d*-[A-Z]{2,3}\d+)").expect("anchor pattern"));

/// Rarity inside a structural row: label up to the first field that follows
/// it in the row layout.
static ROW_RARITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Rarity:\s*([A-Za-z\s]+?)(?:\s*Card #|\s*\(|\s*Only|\s*In Stock|\s*Out)")
        .expect("row rarity pattern")
});

/// Rarity inside a text window, where only the code label (or the window end)
/// terminates it.
static TEXT_RARITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Rarity:\s*([A-Za-z\s]+?)(?:Card #|$)").expect("text rarity pattern"));

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*(\d+\.?\d*)").expect("price pattern"));

static STOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:Only\s+)?(\d+)\s+In Stock").expect("stock pattern"));

/// Chars before / after the code anchor that bound a full-text window.
const WINDOW_BEFORE: usize = 500;
const WINDOW_AFTER: usize = 300;

/// In the full-text tier the condition search is restricted to this many
/// chars after the code, so the next listing in the same window cannot bleed
/// into this one.
const CONDITION_SCOPE: usize = 100;

/// Why a structural candidate row produced no listing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSkip {
    #[error("no printing code in row text")]
    MissingCode,
}

/// Outcome of parsing one candidate row. Routine skips are values, never
/// errors; a skipped row must not abort the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Listing(Listing),
    Skip(RowSkip),
}

/// Parser for extracting card listings from search result pages.
pub struct ListingExtractor {
    /// Structural row selectors, most specific first.
    row_selectors: Vec<Selector>,
    /// Set / edition link inside a row.
    set_selector: Selector,
    /// Canonical card title element; overrides the caller-supplied query term.
    title_selector: Selector,
}

impl ListingExtractor {
    /// Create an extractor with the selector cascade for the supported page
    /// family.
    pub fn new() -> ExtractResult<Self> {
        Ok(Self {
            row_selectors: vec![
                compile_selector("div.products-container div.row")?,
                compile_selector("div.row.product-row")?,
                compile_selector("div.row")?,
            ],
            set_selector: compile_selector("a.ItemSet.display-title")?,
            title_selector: compile_selector("h1.card-name")?,
        })
    }

    /// Extract all listings from a search results page, in document order,
    /// pre-dedup.
    ///
    /// `fallback_name` is the caller-supplied query term; it is replaced by
    /// the page's canonical title when the page exposes one, which corrects
    /// partial or typo query matches.
    pub fn extract(&self, html: &str, fallback_name: &str) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let display_name = self
            .page_card_name(&document)
            .unwrap_or_else(|| fallback_name.trim().to_string());

        let mut listings = Vec::new();
        for (tier, selector) in self.row_selectors.iter().enumerate() {
            let rows: Vec<ElementRef> = document.select(selector).collect();
            if rows.is_empty() {
                continue;
            }
            debug!("Structural tier {} matched {} candidate rows", tier + 1, rows.len());

            for row in &rows {
                let text = element_text(row);
                let set_name = row
                    .select(&self.set_selector)
                    .next()
                    .map(|el| element_text(&el).trim().to_string())
                    .unwrap_or_default();
                match parse_row_text(&text, &display_name, &set_name) {
                    RowOutcome::Listing(listing) => listings.push(listing),
                    RowOutcome::Skip(reason) => {
                        debug!("Skipping row: {}", reason);
                    }
                }
            }
            // First tier with candidates wins, parsed or not.
            break;
        }

        if listings.is_empty() {
            debug!("No structural listings; falling back to full-text scan");
            listings = self.scan_full_text(&document, &display_name);
        }

        listings
    }

    /// Canonical card title from the page, when present and non-empty.
    fn page_card_name(&self, document: &Html) -> Option<String> {
        document
            .select(&self.title_selector)
            .next()
            .map(|el| element_text(&el).trim().to_string())
            .filter(|name| !name.is_empty())
    }

    /// Last-resort tier: locate every "Card #:" anchor in the page text and
    /// extract fields from a bounded window around each. A window with no
    /// parseable price is noise and is discarded entirely.
    fn scan_full_text(&self, document: &Html, display_name: &str) -> Vec<Listing> {
        let full_text: String = document.root_element().text().collect();
        let mut listings = Vec::new();

        for caps in ANCHOR_RE.captures_iter(&full_text) {
            let Some(code_match) = caps.get(1) else {
                continue;
            };
            let code_pos = code_match.start();
            let start = floor_char_boundary(&full_text, code_pos.saturating_sub(WINDOW_BEFORE));
            let end = ceil_char_boundary(&full_text, code_pos + WINDOW_AFTER);
            let window = &full_text[start..end];
            let after_code = &window[code_pos - start..];

            let Some(price) = PRICE_RE
                .captures(after_code)
                .map(|c| format!("${}", &c[1]))
            else {
                debug!("Discarding text window for {}: no price", code_match.as_str());
                continue;
            };

            let rarity = TEXT_RARITY_RE
                .captures(window)
                .map(|c| c[1].trim().to_string())
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| "Unknown".to_string());

            let stock = STOCK_RE
                .captures(after_code)
                .and_then(|c| c[1].parse().ok())
                .unwrap_or(0);

            let scope_end = floor_char_boundary(after_code, CONDITION_SCOPE.min(after_code.len()));
            let condition = Condition::classify(&after_code[..scope_end]);

            listings.push(Listing {
                name: display_name.to_string(),
                set: String::new(),
                code: code_match.as_str().to_string(),
                price,
                rarity,
                condition,
                stock,
            });
        }

        listings
    }
}

/// Parse the flattened text of one structural candidate row. Pure; all skip
/// cases come back as [`RowOutcome::Skip`].
fn parse_row_text(text: &str, display_name: &str, set_name: &str) -> RowOutcome {
    let Some(code) = CODE_RE.find(text) else {
        return RowOutcome::Skip(RowSkip::MissingCode);
    };

    let rarity = ROW_RARITY_RE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let price = PRICE_RE
        .captures(text)
        .map(|c| format!("${}", &c[1]))
        .unwrap_or_else(|| PRICE_UNKNOWN.to_string());

    let stock = STOCK_RE
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);

    RowOutcome::Listing(Listing {
        name: display_name.to_string(),
        set: set_name.to_string(),
        code: code.as_str().to_string(),
        price,
        rarity,
        condition: Condition::classify(text),
        stock,
    })
}

fn compile_selector(selector: &str) -> ExtractResult<Selector> {
    Selector::parse(selector).map_err(|e| ExtractError::invalid_selector(selector, e))
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect()
}

/// Largest char boundary <= `index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut index = index;
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary >= `index`.
fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut index = index;
    while !s.is_char_boundary(index) {
        index += 1;
    }
    index
}
