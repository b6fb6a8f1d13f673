//! Concurrent search page fetcher
//!
//! Issues one search request per query term. All requests for a batch are
//! dispatched concurrently; completion order is unconstrained, but results
//! are paired back to their originating term by index. Any transport error,
//! non-success status, or cancellation resolves that term's slot to absent
//! markup. A failed term never raises past this boundary, and never
//! disturbs results already obtained for other terms in the batch.

use tokio_util::sync::CancellationToken;
use tracing::warn;
use url::form_urlencoded;

use super::config::coolstuffinc;
use super::http_client::HttpClient;

/// Fetches marketplace search result pages for query terms.
pub struct PageFetcher {
    client: HttpClient,
    search_url: String,
}

impl PageFetcher {
    /// Fetcher against the default marketplace search endpoint.
    pub fn new(client: HttpClient) -> Self {
        Self::with_search_url(client, coolstuffinc::SEARCH_URL)
    }

    /// Fetcher against a custom search endpoint; the query term is appended
    /// to `search_url`. Used by tests against a local server.
    pub fn with_search_url(client: HttpClient, search_url: impl Into<String>) -> Self {
        Self {
            client,
            search_url: search_url.into(),
        }
    }

    /// Build the search URL for one query term: percent-encode the term with
    /// spaces as "+", then append to the search endpoint.
    pub fn build_search_url(&self, term: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(term.trim().as_bytes()).collect();
        format!("{}{}", self.search_url, encoded)
    }

    /// Fetch all terms concurrently. The returned vector has one slot per
    /// input term, in input order; `None` marks a failed or absent page.
    pub async fn fetch_batch(&self, terms: &[String]) -> Vec<Option<String>> {
        self.fetch_batch_with_cancellation(terms, CancellationToken::new())
            .await
    }

    /// Like [`fetch_batch`], with cooperative cancellation: a cancelled
    /// term's slot resolves to `None` without corrupting the other slots.
    ///
    /// [`fetch_batch`]: Self::fetch_batch
    pub async fn fetch_batch_with_cancellation(
        &self,
        terms: &[String],
        cancellation_token: CancellationToken,
    ) -> Vec<Option<String>> {
        let requests = terms.iter().map(|term| {
            let url = self.build_search_url(term);
            let token = cancellation_token.clone();
            async move {
                match self.client.get_text_with_cancellation(&url, token).await {
                    Ok(body) => Some(body),
                    Err(error) => {
                        warn!("Fetch failed for '{}': {:#}", term, error);
                        None
                    }
                }
            }
        });

        futures::future::join_all(requests).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::HttpClientConfig;

    fn fetcher() -> PageFetcher {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        PageFetcher::with_search_url(client, "https://example.com/search?q=")
    }

    #[test]
    fn spaces_encode_as_plus() {
        let url = fetcher().build_search_url("Dark Magician");
        assert_eq!(url, "https://example.com/search?q=Dark+Magician");
    }

    #[test]
    fn reserved_characters_are_percent_encoded() {
        let url = fetcher().build_search_url("Fool's Gold & Glory");
        assert_eq!(url, "https://example.com/search?q=Fool%27s+Gold+%26+Glory");
    }

    #[test]
    fn term_whitespace_is_trimmed_before_encoding() {
        let url = fetcher().build_search_url("  Kuriboh ");
        assert_eq!(url, "https://example.com/search?q=Kuriboh");
    }

    #[tokio::test]
    async fn failed_terms_resolve_to_absent_slots_in_input_order() {
        // Unroutable endpoint: every term fails, but each keeps its slot.
        let client = HttpClient::new(HttpClientConfig {
            timeout_seconds: 1,
            ..Default::default()
        })
        .unwrap();
        let fetcher = PageFetcher::with_search_url(client, "http://127.0.0.1:9/q=");

        let terms = vec!["one".to_string(), "two".to_string()];
        let results = fetcher.fetch_batch(&terms).await;
        assert_eq!(results, vec![None, None]);
    }

    #[tokio::test]
    async fn cancelled_batch_degrades_to_absent_slots() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        let fetcher = PageFetcher::with_search_url(client, "http://127.0.0.1:9/q=");
        let token = CancellationToken::new();
        token.cancel();

        let terms = vec!["one".to_string()];
        let results = fetcher
            .fetch_batch_with_cancellation(&terms, token)
            .await;
        assert_eq!(results, vec![None]);
    }
}
