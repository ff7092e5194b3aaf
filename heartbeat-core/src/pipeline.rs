//! One daily run: Generator → Validator → Store → Feed Builders.
//!
//! Every store mutation happens while [`StoreLock`](crate::store::StoreLock) is
//! held, and the lock stays held until the derived artifacts are rebuilt.

use crate::config::Config;
use crate::feeds::{self, FeedError, FeedReport, Site};
use crate::generator::{GenerateError, Generator};
use crate::idea::Idea;
use crate::namespace::{GithubSearch, NamespaceSearch};
use crate::store::{Store, StoreError};
use crate::validator::Validator;
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DOCS_DIR: &str = "docs";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Generation failed: {0}")]
    Generate(#[from] GenerateError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("End date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new idea was appended.
    Appended(Idea),
    /// The date was already in the store; nothing was generated.
    AlreadyRecorded,
}

#[derive(Debug)]
pub struct RunReport {
    pub date: NaiveDate,
    pub outcome: Outcome,
    pub feeds: FeedReport,
}

impl RunReport {
    pub fn appended(&self) -> Option<&Idea> {
        match &self.outcome {
            Outcome::Appended(idea) => Some(idea),
            Outcome::AlreadyRecorded => None,
        }
    }
}

#[derive(Debug)]
pub struct BackfillFailure {
    pub date: NaiveDate,
    pub error: GenerateError,
}

#[derive(Debug, Default)]
pub struct BackfillReport {
    pub appended: Vec<Idea>,
    pub already_recorded: Vec<NaiveDate>,
    pub failed: Vec<BackfillFailure>,
    pub feeds: FeedReport,
}

impl BackfillReport {
    /// Every date recorded and every artifact rebuilt.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.feeds.is_success()
    }
}

pub struct Pipeline {
    store: Store,
    docs_dir: PathBuf,
    generator: Generator,
    namespace: Option<Box<dyn NamespaceSearch>>,
    site: Site,
}

impl Pipeline {
    /// Pipeline over the repository at `root` (`root/ideas`, `root/docs`).
    pub fn new(root: impl AsRef<Path>, generator: Generator, site: Site) -> Self {
        let root = root.as_ref();
        Self {
            store: Store::new(root),
            docs_dir: root.join(DOCS_DIR),
            generator,
            namespace: None,
            site,
        }
    }

    /// Backends, namespace search and site URLs from `config`.
    pub fn from_config(root: impl AsRef<Path>, config: &Config) -> Self {
        let pipeline = Self::new(root, Generator::from_config(config), config.site());
        match GithubSearch::from_config(config) {
            Some(search) => pipeline.with_namespace(Box::new(search)),
            None => pipeline,
        }
    }

    pub fn with_namespace(mut self, namespace: Box<dyn NamespaceSearch>) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Record an idea for `date` and rebuild every artifact.
    pub async fn run(&self, date: NaiveDate) -> Result<RunReport, PipelineError> {
        let _lock = self.store.lock().await?;
        let mut history = self.store.load().await?;

        let outcome = self.record(date, &mut history).await?;
        let feeds = feeds::rebuild_all(&self.docs_dir, &history, &self.site).await;

        Ok(RunReport {
            date,
            outcome,
            feeds,
        })
    }

    /// Record every date in `start..=end`, then rebuild artifacts once.
    ///
    /// A date whose generation fails is reported and skipped. Store errors stop
    /// the backfill.
    pub async fn backfill(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BackfillReport, PipelineError> {
        if end < start {
            return Err(PipelineError::InvalidRange { start, end });
        }

        let _lock = self.store.lock().await?;
        let mut history = self.store.load().await?;
        let mut report = BackfillReport::default();

        for date in start.iter_days().take_while(|d| *d <= end) {
            match self.record(date, &mut history).await {
                Ok(Outcome::Appended(idea)) => report.appended.push(idea),
                Ok(Outcome::AlreadyRecorded) => report.already_recorded.push(date),
                Err(PipelineError::Generate(error)) => {
                    warn!("no idea recorded for {date}: {error}");
                    report.failed.push(BackfillFailure { date, error });
                }
                Err(e) => return Err(e),
            }
        }

        report.feeds = feeds::rebuild_all(&self.docs_dir, &history, &self.site).await;
        info!(
            "backfill {start}..={end}: {} appended, {} already recorded, {} failed",
            report.appended.len(),
            report.already_recorded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Rebuild the derived artifacts from the store without generating.
    pub async fn rebuild_feeds(&self) -> Result<FeedReport, PipelineError> {
        let _lock = self.store.lock().await?;
        let history = self.store.load().await?;
        Ok(feeds::rebuild_all(&self.docs_dir, &history, &self.site).await)
    }

    /// The published `latest.json`, checked against the idea shape.
    pub async fn check_latest(&self) -> Result<Option<Idea>, FeedError> {
        feeds::read_latest(&self.docs_dir).await
    }

    async fn record(
        &self,
        date: NaiveDate,
        history: &mut Vec<Idea>,
    ) -> Result<Outcome, PipelineError> {
        if history.iter().any(|idea| idea.date == date) {
            info!("{date} is already recorded, skipping generation");
            return Ok(Outcome::AlreadyRecorded);
        }

        let slugs: HashSet<String> = history.iter().map(|idea| idea.slug.clone()).collect();
        let mut validator = Validator::new(&slugs);
        if let Some(namespace) = &self.namespace {
            validator = validator.with_namespace(namespace.as_ref());
        }

        let idea = validator.validate(&self.generator, date).await?;
        self.store.append(&idea).await?;
        info!("recorded `{}` ({}) for {date}", idea.concept, idea.slug);

        history.push(idea.clone());
        Ok(Outcome::Appended(idea))
    }
}
