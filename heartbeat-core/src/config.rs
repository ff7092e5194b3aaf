//! Run configuration.
//!
//! Credentials and flags are read once into a [`Config`] value which is then
//! handed to the generator, validator and feed builders. Nothing below this
//! module reads the process environment.

use crate::feeds::Site;
use std::time::Duration;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_REPO_SLUG: &str = "lewiswigmore/heartbeat";

const AZURE_REQUIRED: [&str; 3] = [
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_DEPLOYMENT",
];

/// Azure OpenAI deployment settings (primary backend).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureConfig {
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub api_key: String,
}

/// OpenAI API settings (secondary backend).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub azure: Option<AzureConfig>,
    /// Required Azure variables left unset while others were given.
    pub azure_missing: Vec<&'static str>,
    pub openai: Option<OpenAiConfig>,
    /// Token for the repository-name search; without one the search is skipped.
    pub github_token: Option<String>,
    /// Whether candidate slugs are checked against the external namespace.
    pub validate_namespace: bool,
    /// `owner/repo` used for public links in feeds.
    pub repo_slug: String,
    pub backend_timeout: Duration,
    pub namespace_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            azure: None,
            azure_missing: Vec::new(),
            openai: None,
            github_token: None,
            validate_namespace: true,
            repo_slug: DEFAULT_REPO_SLUG.to_string(),
            backend_timeout: Duration::from_secs(20),
            namespace_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    /// Offline-only configuration: no remote backends, no namespace search.
    pub fn offline() -> Self {
        Self {
            validate_namespace: false,
            ..Self::default()
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let [api_key, endpoint, deployment] = AZURE_REQUIRED.map(|key| get(key));
        let mut azure_missing: Vec<&'static str> = AZURE_REQUIRED
            .iter()
            .zip([&api_key, &endpoint, &deployment])
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| *key)
            .collect();
        if azure_missing.len() == AZURE_REQUIRED.len() {
            azure_missing.clear();
        }

        let azure = match (api_key, endpoint, deployment) {
            (Some(api_key), Some(endpoint), Some(deployment)) => Some(AzureConfig {
                endpoint,
                deployment,
                api_version: get("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| openai::DEFAULT_AZURE_API_VERSION.to_string()),
                api_key,
            }),
            _ => None,
        };

        let openai = get("OPENAI_API_KEY").map(|api_key| OpenAiConfig {
            api_key,
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        });

        let github_token = get("GITHUB_TOKEN")
            .or_else(|| get("GH_TOKEN"))
            .or_else(|| get("GREEN_PAT"));

        let validate_namespace = get("IDEA_VALIDATE_GITHUB")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let repo_slug = get("REPO_SLUG")
            .or_else(|| get("GITHUB_REPOSITORY"))
            .unwrap_or_else(|| DEFAULT_REPO_SLUG.to_string());

        Self {
            azure,
            azure_missing,
            openai,
            github_token,
            validate_namespace,
            repo_slug,
            ..Self::default()
        }
    }

    /// Disable the external namespace search regardless of environment.
    pub fn without_namespace_check(mut self) -> Self {
        self.validate_namespace = false;
        self
    }

    /// Public URLs for feed builders.
    pub fn site(&self) -> Site {
        Site::from_repo_slug(&self.repo_slug)
    }
}
