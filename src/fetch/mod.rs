//! HTTP client for the remote statistics service.
//!
//! All endpoints return JSON. Nothing is cached at this layer: list data is
//! cached per session, detailed stats in the content-addressed `StatsCache`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::models::{FormGames, HeadToHead, MapsResponse, MatchResult, Roster, StatsBlob};
use crate::source::{ListQuery, StatsSource};

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for the statistics service client.
#[derive(Debug, Clone)]
pub struct HubClientConfig {
    /// Service root, e.g. "https://hub.example.org/api/v1"
    pub base_url: String,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Maximum response size (default 10MB)
    pub max_content_size: usize,
}

impl Default for HubClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/v1".to_string(),
            timeout: Duration::from_secs(15),
            user_agent: format!("match-analytics/{}", env!("CARGO_PKG_VERSION")),
            max_content_size: 10 * 1024 * 1024,
        }
    }
}

/// Statistics service client.
pub struct HubClient {
    client: Client,
    base: Url,
    config: HubClientConfig,
}

impl HubClient {
    /// Create a new client with the given configuration.
    pub fn new(config: HubClientConfig) -> Result<Self, FetchError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("match-analytics")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// Create a client with default configuration.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(HubClientConfig::default())
    }

    /// Build an endpoint URL from path segments and query pairs.
    ///
    /// Segments are percent-encoded, so team tags with odd characters are safe.
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET a URL and decode its JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content = response.bytes().await?;

        if content.len() > self.config.max_content_size {
            return Err(FetchError::ContentTooLarge {
                size: content.len(),
                max_size: self.config.max_content_size,
            });
        }

        debug!("Got {} bytes from {}", content.len(), url);
        Ok(serde_json::from_slice(&content)?)
    }
}

fn list_query(query: ListQuery) -> Vec<(&'static str, String)> {
    let mut pairs = vec![("months", query.months.to_string())];
    if let Some(limit) = query.limit {
        pairs.push(("limit", limit.to_string()));
    }
    pairs
}

#[async_trait]
impl StatsSource for HubClient {
    fn name(&self) -> &'static str {
        "hub"
    }

    async fn match_history(&self, team: &str, months: u32) -> Result<Vec<MatchResult>, FetchError> {
        let url = self.endpoint(
            &["teams", team, "matches"],
            &[("months", months.to_string())],
        )?;
        self.get_json(url).await
    }

    async fn head_to_head(
        &self,
        team_a: &str,
        team_b: &str,
        query: ListQuery,
    ) -> Result<HeadToHead, FetchError> {
        let url = self.endpoint(&["h2h", team_a, team_b], &list_query(query))?;
        self.get_json(url).await
    }

    async fn form(&self, team: &str, query: ListQuery) -> Result<FormGames, FetchError> {
        let url = self.endpoint(&["teams", team, "form"], &list_query(query))?;
        self.get_json(url).await
    }

    async fn maps(&self, team: &str, months: u32) -> Result<MapsResponse, FetchError> {
        let url = self.endpoint(&["teams", team, "maps"], &[("months", months.to_string())])?;
        self.get_json(url).await
    }

    async fn roster(&self, team: &str, months: u32) -> Result<Roster, FetchError> {
        let url = self.endpoint(
            &["teams", team, "roster"],
            &[("months", months.to_string())],
        )?;
        self.get_json(url).await
    }

    async fn game_stats(&self, stats_ref: &str) -> Result<StatsBlob, FetchError> {
        let url = self.endpoint(&["games", stats_ref], &[])?;
        self.get_json(url).await
    }
}
