//! Upstream character API client.
//!
//! Thin typed wrapper over the public character REST API.
//!
//! ### Behaviour
//!
//! - **Endpoint**: `https://rickandmortyapi.com/api` (configurable for tests).
//! - **Degradation**: a non-success status never surfaces as an error.
//!   Listings come back empty, single lookups come back absent, and episode
//!   lookups come back as an empty list.
//! - **Failures**: network errors, timeouts and undecodable bodies are
//!   returned as [`UpstreamError`].
//! - **No retry**: every call is a single request.

pub mod error;
pub mod request;
pub mod response;

pub use error::UpstreamError;
pub use request::CharacterQuery;
pub use response::{ApiPage, PageInfo, WireCharacter, WireEpisode, WireLocation, decode, decode_episodes};

use async_trait::async_trait;
use reqwest::header;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::service::CharacterSource;
use citadel_core::AppConfig;
use citadel_core::config::DEFAULT_BASE_URL;

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "citadel/0.1";

/// Upstream client configuration.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL (default: https://rickandmortyapi.com/api).
    pub base_url: String,
    /// Optional request timeout; `None` keeps reqwest's defaults.
    pub timeout: Option<Duration>,
    /// User-agent string (default: citadel/0.x).
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), timeout: None, user_agent: DEFAULT_USER_AGENT.to_string() }
    }
}

impl From<&AppConfig> for UpstreamConfig {
    fn from(config: &AppConfig) -> Self {
        Self { base_url: config.base_url.clone(), timeout: config.timeout(), user_agent: config.user_agent.clone() }
    }
}

/// Upstream character API client.
///
/// Cheap to clone; clones share the HTTP connection pool and configuration.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: Arc<UpstreamConfig>,
}

impl UpstreamClient {
    /// Create a new client with the given configuration.
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder.build().map_err(|e| UpstreamError::Network(Arc::new(e)))?;

        Ok(Self { http, config: Arc::new(config) })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, url: &str, query: Option<&CharacterQuery>) -> Result<reqwest::Response, UpstreamError> {
        let mut request = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json");
        if let Some(query) = query {
            request = request.query(query);
        }

        request.send().await.map_err(UpstreamError::from)
    }

    async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, UpstreamError> {
        let bytes = response.bytes().await.map_err(UpstreamError::from)?;
        Ok(bytes.to_vec())
    }

    /// Fetch one page of characters.
    ///
    /// Only non-empty filters are sent. A non-success status yields an
    /// empty page.
    pub async fn list_characters(&self, query: &CharacterQuery) -> Result<ApiPage<WireCharacter>, UpstreamError> {
        query.validate()?;

        let start = Instant::now();
        let url = self.endpoint("character");

        tracing::debug!(page = query.page, name = ?query.name, status = ?query.status, species = ?query.species, "listing upstream characters");

        let response = self.send(&url, Some(query)).await.inspect_err(|e| {
            tracing::error!(error = %e, page = query.page, "upstream character listing failed");
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), page = query.page, "upstream listing returned non-success status");
            return Ok(ApiPage::empty());
        }

        let body = Self::read_body(response).await?;
        let page: ApiPage<WireCharacter> = decode(&body).inspect_err(|e| {
            tracing::error!(error = %e, page = query.page, "failed to decode upstream character page");
        })?;

        tracing::debug!(
            elapsed = ?start.elapsed(),
            results = page.results.len(),
            count = page.info.count,
            "upstream listing completed"
        );

        Ok(page)
    }

    /// Fetch a single character by id.
    ///
    /// A non-success status (e.g. 404) yields `None`.
    pub async fn get_character(&self, id: i64) -> Result<Option<WireCharacter>, UpstreamError> {
        let url = self.endpoint(&format!("character/{id}"));

        let response = self.send(&url, None).await.inspect_err(|e| {
            tracing::error!(error = %e, id, "upstream character lookup failed");
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), id, "character not found upstream");
            return Ok(None);
        }

        let body = Self::read_body(response).await?;
        let character = decode(&body).inspect_err(|e| {
            tracing::error!(error = %e, id, "failed to decode upstream character");
        })?;

        Ok(Some(character))
    }

    /// Fetch episodes by id.
    ///
    /// An empty id list returns immediately without a request. A non-success
    /// status yields an empty list.
    pub async fn get_episodes(&self, ids: &[i64]) -> Result<Vec<WireEpisode>, UpstreamError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint(&format!("episode/{}", request::episode_path(ids)));

        let response = self.send(&url, None).await.inspect_err(|e| {
            tracing::error!(error = %e, requested = ids.len(), "upstream episode lookup failed");
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), requested = ids.len(), "episodes not found upstream");
            return Ok(Vec::new());
        }

        let body = Self::read_body(response).await?;
        decode_episodes(&body, ids.len()).inspect_err(|e| {
            tracing::error!(error = %e, requested = ids.len(), "failed to decode upstream episodes");
        })
    }
}

#[async_trait]
impl CharacterSource for UpstreamClient {
    async fn list_characters(&self, query: &CharacterQuery) -> Result<ApiPage<WireCharacter>, UpstreamError> {
        UpstreamClient::list_characters(self, query).await
    }

    async fn get_character(&self, id: i64) -> Result<Option<WireCharacter>, UpstreamError> {
        UpstreamClient::get_character(self, id).await
    }

    async fn get_episodes(&self, ids: &[i64]) -> Result<Vec<WireEpisode>, UpstreamError> {
        UpstreamClient::get_episodes(self, ids).await
    }
}
