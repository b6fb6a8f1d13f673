//! Card search use case
//!
//! Wires the batch fetcher, the extraction cascade, and the page-level
//! deduplicator. A failed term contributes zero listings and never aborts
//! the batch; an empty query is a legitimate zero-result, not an error.

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::listing::Listing;
use crate::infrastructure::fetcher::PageFetcher;
use crate::infrastructure::parsing::{dedup_listings, ExtractResult, ListingExtractor};

/// Search service for live marketplace listings.
pub struct SearchService {
    fetcher: PageFetcher,
    extractor: ListingExtractor,
}

impl SearchService {
    pub fn new(fetcher: PageFetcher) -> ExtractResult<Self> {
        Ok(Self {
            fetcher,
            extractor: ListingExtractor::new()?,
        })
    }

    /// Search for a single query term. A blank query yields no listings.
    pub async fn search(&self, query: &str) -> Vec<Listing> {
        let normalized = query.trim();
        if normalized.is_empty() {
            return Vec::new();
        }
        self.scrape_batch(&[normalized.to_string()]).await
    }

    /// Fetch and extract listings for an ordered batch of query terms.
    pub async fn scrape_batch(&self, terms: &[String]) -> Vec<Listing> {
        self.scrape_batch_with_cancellation(terms, CancellationToken::new())
            .await
    }

    /// Like [`scrape_batch`], with cooperative cancellation; cancelled terms
    /// contribute zero listings.
    ///
    /// [`scrape_batch`]: Self::scrape_batch
    pub async fn scrape_batch_with_cancellation(
        &self,
        terms: &[String],
        cancellation_token: CancellationToken,
    ) -> Vec<Listing> {
        let pages = self
            .fetcher
            .fetch_batch_with_cancellation(terms, cancellation_token)
            .await;
        self.extract_pages(terms, pages)
    }

    /// Combine fetched pages back with their originating terms, by index.
    fn extract_pages(&self, terms: &[String], pages: Vec<Option<String>>) -> Vec<Listing> {
        let mut all_listings = Vec::new();

        for (term, page) in terms.iter().zip(pages) {
            match page {
                Some(html) => {
                    let listings = dedup_listings(self.extractor.extract(&html, term));
                    info!("Found {} listings for '{}'", listings.len(), term);
                    all_listings.extend(listings);
                }
                None => {
                    info!("No page for '{}'; contributing zero listings", term);
                }
            }
        }

        all_listings
    }
}
