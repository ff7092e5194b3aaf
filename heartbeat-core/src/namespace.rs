//! External namespace search.
//!
//! An optional read-only check that a candidate slug is not already the name
//! of a public repository. Failures here never block validation.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum NamespaceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Existence query against an external namespace.
#[async_trait]
pub trait NamespaceSearch: Send + Sync {
    fn name(&self) -> &str;

    /// `true` when something named exactly `slug` already exists.
    async fn exists(&self, slug: &str) -> Result<bool, NamespaceError>;
}

/// GitHub repository-name search.
pub struct GithubSearch {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl GithubSearch {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, NamespaceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NamespaceError::Config(e.to_string()))?;
        Ok(Self {
            client,
            token: token.into(),
            base_url: API_BASE.to_string(),
        })
    }

    /// The search configured for this run, if any.
    ///
    /// `None` when the check is switched off or no token is available.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.validate_namespace {
            return None;
        }
        let token = config.github_token.as_ref()?;
        match Self::new(token, config.namespace_timeout) {
            Ok(search) => Some(search),
            Err(e) => {
                log::warn!("repository name search disabled: {e}");
                None
            }
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_headers(&self) -> Result<HeaderMap, NamespaceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("heartbeat"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|e| NamespaceError::Config(format!("Invalid token: {e}")))?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl NamespaceSearch for GithubSearch {
    fn name(&self) -> &str {
        "github"
    }

    async fn exists(&self, slug: &str) -> Result<bool, NamespaceError> {
        let response = self
            .client
            .get(format!("{}/search/repositories", self.base_url))
            .headers(self.build_headers()?)
            .query(&[("q", format!("{slug} in:name")), ("per_page", "5".to_string())])
            .send()
            .await
            .map_err(|e| NamespaceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(NamespaceError::Api { status, message });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| NamespaceError::Parse(e.to_string()))?;
        Ok(body.has_exact_match(slug))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    name: String,
}

impl SearchResponse {
    fn has_exact_match(&self, slug: &str) -> bool {
        self.items
            .iter()
            .take(5)
            .any(|item| item.name.eq_ignore_ascii_case(slug))
    }
}
