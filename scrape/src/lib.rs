pub mod error;
pub mod extract;
pub mod provider;
pub mod retry;

use error::{ScrapeError, ScrapeErrorKind};
use provider::{ApiScraperProvider, LocalFetchProvider, ScrapeProvider};
use retry::RetryConfig;
use sentinel_core::model::document_content_hash;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ScrapedDocument {
    pub url: String,
    pub content: String,
    pub content_hash: String,
    pub title: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Picks the first provider with satisfied credentials, falling back to a purely local fetcher.
/// Logs the choice once, which is all a caller needs to audit which path is live.
pub fn select_provider(scraper_api_key: Option<&str>) -> Arc<dyn ScrapeProvider> {
    match scraper_api_key {
        Some(key) if !key.is_empty() => {
            info!(provider = "scraper-api", "selected scrape provider");
            Arc::new(ApiScraperProvider::new(key))
        }
        _ => {
            info!(provider = "local-fetch", "selected scrape provider");
            Arc::new(LocalFetchProvider::default())
        }
    }
}

pub struct Scraper {
    provider: Arc<dyn ScrapeProvider>,
    retry: RetryConfig,
}

impl Scraper {
    pub fn new(provider: Arc<dyn ScrapeProvider>) -> Self {
        Self {
            provider,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(provider: Arc<dyn ScrapeProvider>, retry: RetryConfig) -> Self {
        Self { provider, retry }
    }

    pub async fn scrape(&self, url: &str) -> Result<ScrapedDocument, ScrapeError> {
        let mut attempt = 0u32;
        loop {
            match self.try_once(url).await {
                Ok(doc) => return Ok(doc),
                Err(err) if err.is_transient() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(url, attempt, ?delay, error = %err, "scrape attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_once(&self, url: &str) -> Result<ScrapedDocument, ScrapeError> {
        let fetch = self.provider.fetch(url).await?;
        let (title, content) = provider::normalize(&fetch, url)?;

        if content.trim().is_empty() {
            return Err(ScrapeError::new(ScrapeErrorKind::Empty, "no extractable content"));
        }

        let content_hash = document_content_hash(&content);
        let mut metadata = HashMap::new();
        metadata.insert("provider".to_string(), self.provider.name().to_string());

        Ok(ScrapedDocument {
            url: url.to_string(),
            content,
            content_hash,
            title,
            metadata,
        })
    }

    /// Convenience used by the orchestrator's unchanged-detection path.
    pub async fn scrape_and_hash(&self, url: &str) -> Result<(String, String), ScrapeError> {
        let doc = self.scrape(url).await?;
        Ok((doc.content, doc.content_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use provider::RawFetch;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        calls: AtomicU32,
        fail_times: u32,
    }

    #[async_trait]
    impl ScrapeProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn fetch(&self, _url: &str) -> Result<RawFetch, ScrapeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                Err(ScrapeError::new(ScrapeErrorKind::Network, "simulated outage"))
            } else {
                Ok(RawFetch {
                    content_type: "text/plain".to_string(),
                    body: b"Tesla was founded in 2003.".to_vec(),
                })
            }
        }
    }

    struct EmptyProvider;

    #[async_trait]
    impl ScrapeProvider for EmptyProvider {
        fn name(&self) -> &str {
            "empty"
        }

        async fn fetch(&self, _url: &str) -> Result<RawFetch, ScrapeError> {
            Ok(RawFetch {
                content_type: "text/plain".to_string(),
                body: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_then_succeeds() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicU32::new(0),
            fail_times: 2,
        });
        let retry = RetryConfig {
            base_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(5),
            factor: 2,
            max_attempts: 5,
        };
        let scraper = Scraper::with_retry(provider, retry);

        let doc = scraper.scrape("https://example.com").await.unwrap();
        assert!(doc.content.contains("Tesla"));
        assert_eq!(doc.metadata.get("provider").map(String::as_str), Some("flaky"));
    }

    #[tokio::test]
    async fn empty_content_is_not_retried() {
        let scraper = Scraper::new(Arc::new(EmptyProvider));
        let err = scraper.scrape("https://example.com").await.unwrap_err();
        assert_eq!(err.kind, ScrapeErrorKind::Empty);
    }

    #[test]
    fn select_provider_prefers_api_key() {
        let provider = select_provider(Some("key123"));
        assert_eq!(provider.name(), "scraper-api");

        let provider = select_provider(None);
        assert_eq!(provider.name(), "local-fetch");
    }
}
