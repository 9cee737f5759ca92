//! Search API client with bounded retry
//!
//! Provides the page fetcher that handles:
//! - Building the search request (query, page, session header, referer)
//! - Classifying responses into success, `SessionInvalid`, `Transient`, `Timeout`
//! - Retrying `Transient` and `Timeout` with a fixed backoff
//! - Writing one event line per attempt

use super::types::{FetchOutcome, PageFetcher, PageResponse};
use crate::error::{Error, Result};
use crate::events::{EventLog, EventStatus, HarvestEvent};
use crate::types::{FailureKind, SessionCredential};
use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Search endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "https://scraping-trial-test.vercel.app/api/search";

/// Header carrying the session credential
pub const DEFAULT_SESSION_HEADER: &str = "x-search-session";

/// Referer template; `{query}` is replaced by the URL-encoded query
pub const DEFAULT_REFERER: &str = "https://scraping-trial-test.vercel.app/search/results?q={query}";

/// Longest response body excerpt kept in an event detail
const MAX_BODY_EXCERPT: usize = 200;

/// Configuration for the search client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Search endpoint URL
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retries after the first attempt for `Transient` and `Timeout`
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub retry_backoff: Duration,
    /// Header name carrying the session credential
    pub session_header: String,
    /// Referer template (`{query}` placeholder)
    pub referer: Option<String>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let default_headers = [
            ("accept", "*/*"),
            ("accept-language", "en-US,en;q=0.9"),
            ("priority", "u=1, i"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_backoff: Duration::from_secs(2),
            session_header: DEFAULT_SESSION_HEADER.to_string(),
            referer: Some(DEFAULT_REFERER.to_string()),
            default_headers,
            user_agent: format!("search-harvester/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Total attempts per page (first try plus retries)
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Builder for the search client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the search endpoint
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the delay between attempts
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.config.retry_backoff = backoff;
        self
    }

    /// Set the session header name
    pub fn session_header(mut self, name: impl Into<String>) -> Self {
        self.config.session_header = name.into();
        self
    }

    /// Set the referer template
    pub fn referer(mut self, template: impl Into<String>) -> Self {
        self.config.referer = Some(template.into());
        self
    }

    /// Send no referer header
    pub fn no_referer(mut self) -> Self {
        self.config.referer = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Outcome of a single attempt, before retry policy is applied
enum Attempt {
    Page(PageResponse),
    SessionInvalid(String),
    Failed(FailureKind, String),
}

/// Page fetcher for the search API
pub struct SearchClient {
    client: Client,
    endpoint: Url,
    config: HttpClientConfig,
}

impl SearchClient {
    /// Create a client, validating the endpoint URL
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Render the referer header for a query
    pub fn referer_for(&self, query: &str) -> Option<String> {
        self.config.referer.as_ref().map(|template| {
            let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
            template.replace("{query}", &encoded)
        })
    }

    /// Issue one request and classify the response
    async fn attempt(&self, query: &str, page: u32, credential: &SessionCredential) -> Attempt {
        let page_param = page.to_string();
        let mut req = self
            .client
            .get(self.endpoint.clone())
            .query(&[("q", query), ("page", page_param.as_str())])
            .timeout(self.config.timeout);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(referer) = self.referer_for(query) {
            req = req.header(REFERER, referer);
        }
        req = req.header(self.config.session_header.as_str(), credential.expose());

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => return classify_transport_error(&e),
        };

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Attempt::SessionInvalid(
                "403 Forbidden - Session expired or ReCAPTCHA required".to_string(),
            );
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return classify_transport_error(&e),
        };

        if !status.is_success() {
            let err = Error::http_status(status.as_u16(), excerpt(&body));
            return Attempt::Failed(FailureKind::Transient, err.to_string());
        }

        let parsed: PageResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Attempt::Failed(FailureKind::Transient, format!("Invalid JSON body: {e}"));
            }
        };

        if let Some(message) = parsed.session_error() {
            return Attempt::SessionInvalid(format!("Session/ReCAPTCHA error: {message}"));
        }

        Attempt::Page(parsed)
    }
}

#[async_trait]
impl PageFetcher for SearchClient {
    async fn fetch_page(
        &self,
        query: &str,
        page: u32,
        credential: &SessionCredential,
        events: &mut dyn EventLog,
    ) -> Result<FetchOutcome> {
        let max_retries = self.config.max_retries;
        let max_attempts = self.config.max_attempts();
        let mut attempt = 0;

        loop {
            let (kind, detail) = match self.attempt(query, page, credential).await {
                Attempt::Page(body) => {
                    let count = body.records().len();
                    debug!("Fetched page {page} for '{query}': {count} results");
                    events.record(HarvestEvent::page(
                        query,
                        page,
                        EventStatus::Success,
                        format!("Retrieved {count} results"),
                    ))?;
                    return Ok(FetchOutcome::Page(body));
                }
                Attempt::SessionInvalid(detail) => {
                    events.record(HarvestEvent::page(query, page, EventStatus::Error, detail))?;
                    return Ok(FetchOutcome::Failed(FailureKind::SessionInvalid));
                }
                Attempt::Failed(kind, detail) => (kind, detail),
            };

            if attempt >= max_retries || !kind.is_retryable() {
                let message = match kind {
                    FailureKind::Timeout => format!("Timeout after {max_attempts} attempts"),
                    _ => format!("Failed after {max_attempts} attempts: {detail}"),
                };
                events.record(HarvestEvent::page(query, page, EventStatus::Error, message))?;
                return Ok(FetchOutcome::Failed(kind));
            }

            let message = match kind {
                FailureKind::Timeout => format!("Timeout, attempt {}/{max_attempts}", attempt + 1),
                _ => format!("Attempt {}/{max_attempts}: {detail}", attempt + 1),
            };
            warn!(
                "Page {page} {kind}, retrying in {:?}",
                self.config.retry_backoff
            );
            events.record(HarvestEvent::page(query, page, EventStatus::Retry, message))?;

            attempt += 1;
            tokio::time::sleep(self.config.retry_backoff).await;
        }
    }
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Classify a reqwest error raised before a usable response was read
fn classify_transport_error(err: &reqwest::Error) -> Attempt {
    if err.is_timeout() {
        Attempt::Failed(FailureKind::Timeout, err.to_string())
    } else {
        Attempt::Failed(FailureKind::Transient, err.to_string())
    }
}

/// Shorten a response body for an event detail
fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_BODY_EXCERPT {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_BODY_EXCERPT).collect();
        format!("{cut}...")
    }
}
