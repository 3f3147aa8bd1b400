use crate::error::{ScrapeError, ScrapeErrorKind};
use crate::extract::{detect_content_kind, extract_utf8, html_to_text, ContentKind};
use async_trait::async_trait;
use std::time::Duration;

pub struct RawFetch {
    pub content_type: String,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, url: &str) -> Result<RawFetch, ScrapeError>;
}

/// Calls a premium scraping vendor's rendering API when `scraper_api_key` is configured.
pub struct ApiScraperProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl ApiScraperProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: "https://api.scraperapi.com".to_string(),
        }
    }
}

#[async_trait]
impl ScrapeProvider for ApiScraperProvider {
    fn name(&self) -> &str {
        "scraper-api"
    }

    async fn fetch(&self, url: &str) -> Result<RawFetch, ScrapeError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("api_key", self.api_key.as_str()), ("url", url)])
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScrapeError::new(ScrapeErrorKind::RateLimited, "vendor rate limit"));
        }
        if !status.is_success() {
            return Err(ScrapeError::new(
                ScrapeErrorKind::VendorError,
                format!("vendor returned {status}"),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        let body = response.bytes().await.map_err(classify_reqwest_error)?.to_vec();
        Ok(RawFetch { content_type, body })
    }
}

/// A plain HTTP GET with no vendor credentials, used when no premium provider is configured.
pub struct LocalFetchProvider {
    client: reqwest::Client,
}

impl Default for LocalFetchProvider {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ScrapeProvider for LocalFetchProvider {
    fn name(&self) -> &str {
        "local-fetch"
    }

    async fn fetch(&self, url: &str) -> Result<RawFetch, ScrapeError> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScrapeError::new(ScrapeErrorKind::RateLimited, "rate limited"));
        }
        if !status.is_success() {
            return Err(ScrapeError::new(
                ScrapeErrorKind::Network,
                format!("server returned {status}"),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        let body = response.bytes().await.map_err(classify_reqwest_error)?.to_vec();
        Ok(RawFetch { content_type, body })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> ScrapeError {
    if err.is_timeout() {
        ScrapeError::new(ScrapeErrorKind::Network, "request timed out")
    } else if err.is_status() {
        ScrapeError::new(ScrapeErrorKind::VendorError, err.to_string())
    } else {
        ScrapeError::new(ScrapeErrorKind::Network, err.to_string())
    }
}

/// Normalizes a raw fetch into plain text plus an optional title, per `ContentKind`.
pub fn normalize(fetch: &RawFetch, url: &str) -> Result<(Option<String>, String), ScrapeError> {
    let kind = detect_content_kind(&fetch.content_type, Some(url));
    match kind {
        ContentKind::Html => Ok(html_to_text(
            &extract_utf8(&fetch.body).map_err(|_| {
                ScrapeError::new(ScrapeErrorKind::VendorError, "response was not valid utf-8")
            })?,
        )),
        ContentKind::Text | ContentKind::Markdown | ContentKind::Json | ContentKind::Unsupported => {
            let text = extract_utf8(&fetch.body)
                .map_err(|_| ScrapeError::new(ScrapeErrorKind::VendorError, "response was not valid utf-8"))?;
            Ok((None, text))
        }
    }
}
