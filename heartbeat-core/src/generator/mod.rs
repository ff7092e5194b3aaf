//! Idea generation through an ordered chain of backends.
//!
//! Backends are tried in priority order. A remote failure of any kind (missing
//! credentials, timeout, HTTP error, unparseable reply, shape violation) is
//! logged and the next backend is tried. The offline backend ends every chain,
//! so a run only fails here if that backend fails too.

pub mod offline;
pub mod remote;

use crate::config::Config;
use crate::idea::{Draft, Idea, ShapeError, Source, Theme};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::fmt;
use thiserror::Error;

pub use offline::OfflineBackend;
pub use remote::ChatBackend;

/// A single backend's failure. Recovered by falling through to the next backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("request failed: {0}")]
    Request(#[from] openai::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid idea: {0}")]
    Shape(#[from] ShapeError),

    #[error("{0}")]
    Failed(String),
}

/// One entry in the failure list of [`GenerateError::Exhausted`].
#[derive(Debug, Clone)]
pub struct BackendFailure {
    pub source: Source,
    pub reason: String,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

fn not_configured(source: Source, detail: String) -> BackendFailure {
    let reason = BackendError::NotConfigured(detail).to_string();
    warn!("{source} backend unavailable: {reason}");
    BackendFailure { source, reason }
}

/// Fatal generation errors.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("every backend failed ({})", join_failures(.failures))]
    Exhausted { failures: Vec<BackendFailure> },
}

fn join_failures(failures: &[BackendFailure]) -> String {
    if failures.is_empty() {
        return "no backend was ready".to_string();
    }
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Core trait for idea backends.
#[async_trait]
pub trait IdeaBackend: Send + Sync {
    /// Provenance recorded on ideas this backend produces.
    fn source(&self) -> Source;

    /// Whether the backend has what it needs to be tried at all.
    fn is_ready(&self) -> bool {
        true
    }

    /// Produce one raw draft. `attempt` counts regeneration requests for the same date.
    async fn generate(
        &self,
        date: NaiveDate,
        theme: Theme,
        attempt: u32,
    ) -> Result<Draft, BackendError>;
}

/// The ordered backend chain.
pub struct Generator {
    backends: Vec<Box<dyn IdeaBackend>>,
    /// Backends left out of the chain because their configuration is unusable.
    unavailable: Vec<BackendFailure>,
}

impl Generator {
    /// Build a chain from backends in priority order.
    ///
    /// An [`OfflineBackend`] is appended when no backend reports [`Source::Offline`].
    pub fn new(mut backends: Vec<Box<dyn IdeaBackend>>) -> Self {
        if !backends.iter().any(|b| b.source() == Source::Offline) {
            backends.push(Box::new(OfflineBackend::new()));
        }
        Self {
            backends,
            unavailable: Vec::new(),
        }
    }

    /// Offline generation only.
    pub fn offline() -> Self {
        Self::new(Vec::new())
    }

    /// Azure (when fully configured), then OpenAI (when keyed), then offline.
    pub fn from_config(config: &Config) -> Self {
        let mut backends: Vec<Box<dyn IdeaBackend>> = Vec::new();
        let mut unavailable = Vec::new();

        if !config.azure_missing.is_empty() {
            unavailable.push(not_configured(
                Source::Azure,
                format!("{} unset", config.azure_missing.join(", ")),
            ));
        }
        if let Some(azure) = &config.azure {
            match ChatBackend::azure(azure, config.backend_timeout) {
                Ok(backend) => backends.push(Box::new(backend)),
                Err(e) => unavailable.push(not_configured(Source::Azure, e.to_string())),
            }
        }
        if let Some(openai) = &config.openai {
            match ChatBackend::openai(openai, config.backend_timeout) {
                Ok(backend) => backends.push(Box::new(backend)),
                Err(e) => unavailable.push(not_configured(Source::OpenAi, e.to_string())),
            }
        }

        Self {
            unavailable,
            ..Self::new(backends)
        }
    }

    /// Configured backends that could not join the chain.
    pub fn unavailable(&self) -> &[BackendFailure] {
        &self.unavailable
    }

    /// Sources in the order they will be tried.
    pub fn sources(&self) -> Vec<Source> {
        self.backends.iter().map(|b| b.source()).collect()
    }

    /// Produce one normalized, shape-checked idea for `date`.
    pub async fn generate(&self, date: NaiveDate, attempt: u32) -> Result<Idea, GenerateError> {
        let theme = Theme::for_date(date);
        let mut failures = self.unavailable.clone();

        for backend in &self.backends {
            let source = backend.source();
            if !backend.is_ready() {
                debug!("skipping {source} backend: not ready");
                continue;
            }

            let result = match backend.generate(date, theme, attempt).await {
                Ok(draft) => draft.into_idea(date, source).map_err(BackendError::from),
                Err(e) => Err(e),
            };

            match result {
                Ok(idea) => {
                    info!(
                        "{source} backend produced `{}` for {date} (attempt {attempt})",
                        idea.concept
                    );
                    return Ok(idea);
                }
                Err(e) => {
                    warn!("{source} backend failed for {date}: {e}");
                    failures.push(BackendFailure {
                        source,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(GenerateError::Exhausted { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 10).unwrap()
    }

    #[test]
    fn test_offline_appended() {
        let generator = Generator::new(vec![Box::new(MockBackend::failing(
            Source::Azure,
            "down",
        ))]);
        assert_eq!(generator.sources(), vec![Source::Azure, Source::Offline]);
    }

    #[test]
    fn test_from_config_without_credentials() {
        let generator = Generator::from_config(&Config::offline());
        assert_eq!(generator.sources(), vec![Source::Offline]);
    }

    #[tokio::test]
    async fn test_partial_azure_config_is_reported() {
        let config = Config {
            azure_missing: vec!["AZURE_OPENAI_ENDPOINT"],
            ..Config::offline()
        };
        let generator = Generator::from_config(&config);
        assert_eq!(generator.sources(), vec![Source::Offline]);
        assert_eq!(generator.unavailable().len(), 1);
        assert_eq!(generator.unavailable()[0].source, Source::Azure);
        assert!(generator.unavailable()[0]
            .reason
            .starts_with("not configured: AZURE_OPENAI_ENDPOINT"));

        // Offline still produces the idea.
        let idea = generator.generate(date(), 0).await.unwrap();
        assert_eq!(idea.source, Source::Offline);

        let generator = Generator {
            backends: vec![Box::new(MockBackend::failing(Source::Offline, "disk full"))],
            unavailable: generator.unavailable().to_vec(),
        };
        let err = generator.generate(date(), 0).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("azure: not configured: AZURE_OPENAI_ENDPOINT unset"));
        assert!(message.contains("offline: disk full"));
    }

    #[tokio::test]
    async fn test_primary_wins() {
        let generator = Generator::new(vec![
            Box::new(MockBackend::always(
                Source::Azure,
                Draft::new("Edge notes cli", "Notes at the edge.", vec!["edge".into()]),
            )),
            Box::new(MockBackend::failing(Source::OpenAi, "unused")),
        ]);
        let idea = generator.generate(date(), 0).await.unwrap();
        assert_eq!(idea.source, Source::Azure);
        assert_eq!(idea.slug, "edge-notes-cli");
    }

    #[tokio::test]
    async fn test_falls_back_to_offline() {
        let primary = MockBackend::failing(Source::Azure, "timeout");
        let secondary = MockBackend::failing(Source::OpenAi, "401");
        let generator = Generator::new(vec![Box::new(primary), Box::new(secondary)]);

        let idea = generator.generate(date(), 0).await.unwrap();
        assert_eq!(idea.source, Source::Offline);
        assert!(idea.validate().is_ok());
    }

    #[tokio::test]
    async fn test_shape_failure_falls_through() {
        let generator = Generator::new(vec![
            Box::new(MockBackend::always(Source::Azure, Draft::new("!!!", "", vec![]))),
            Box::new(MockBackend::always(
                Source::OpenAi,
                Draft::new("Log file summarizer", "Summarizes logs.", vec![]),
            )),
        ]);
        let idea = generator.generate(date(), 0).await.unwrap();
        assert_eq!(idea.source, Source::OpenAi);
    }

    #[tokio::test]
    async fn test_unready_backend_skipped() {
        let unready = MockBackend::always(
            Source::Azure,
            Draft::new("Should not appear", "x", vec![]),
        )
        .not_ready();
        let generator = Generator::new(vec![Box::new(unready)]);
        let idea = generator.generate(date(), 0).await.unwrap();
        assert_eq!(idea.source, Source::Offline);
    }

    #[tokio::test]
    async fn test_exhausted_when_offline_fails() {
        let generator = Generator::new(vec![
            Box::new(MockBackend::failing(Source::Azure, "down")),
            Box::new(MockBackend::failing(Source::Offline, "disk on fire")),
        ]);
        let err = generator.generate(date(), 0).await.unwrap_err();
        let GenerateError::Exhausted { failures } = &err;
        assert_eq!(failures.len(), 2);
        assert!(err.to_string().contains("offline: disk on fire"));
    }
}
