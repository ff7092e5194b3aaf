//! Derived artifacts rebuilt from the full idea history.
//!
//! Each builder is a pure projection `&[Idea] -> file contents`. Every run
//! regenerates every artifact wholesale, so the outputs always match the store.
//! Builders never embed the wall clock, which makes rebuilds byte-identical.

pub mod html;
pub mod json;
pub mod jsonfeed;
pub mod rss;
pub mod sitemap;

use crate::idea::{Idea, ShapeError};
use log::{info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

pub use html::ArchiveHtml;
pub use json::{read_latest, ArchiveJson, LatestJson, RecentJson};
pub use jsonfeed::JsonFeed;
pub use rss::RssFeed;
pub use sitemap::{Robots, Sitemap};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Invalid idea: {0}")]
    Invalid(#[from] ShapeError),
}

/// Public location of the generated site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// `owner/repo`.
    pub repo_slug: String,
    /// Base URL of the published pages, with trailing slash.
    pub home_url: String,
    pub title: String,
    pub description: String,
}

impl Site {
    pub fn from_repo_slug(repo_slug: &str) -> Self {
        let home_url = match repo_slug.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
                format!("https://{owner}.github.io/{repo}/")
            }
            _ => format!("https://github.com/{repo_slug}/"),
        };
        Self {
            repo_slug: repo_slug.to_string(),
            home_url,
            title: "Daily Ideas".to_string(),
            description: "Latest daily repo ideas".to_string(),
        }
    }

    pub fn repo_url(&self) -> String {
        format!("https://github.com/{}", self.repo_slug)
    }

    /// URL of a published artifact.
    pub fn page_url(&self, file_name: &str) -> String {
        format!("{}{file_name}", self.home_url)
    }

    /// Markdown ledger for a month, as rendered on GitHub.
    pub fn ledger_url(&self, month: &str) -> String {
        format!("{}/blob/main/ideas/{month}.md", self.repo_url())
    }

    /// Raw JSONL partition for a month.
    pub fn partition_url(&self, month: &str) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/main/ideas/{month}.jsonl",
            self.repo_slug
        )
    }
}

/// A pure projection of the history into one artifact.
pub trait FeedBuilder: Send + Sync {
    fn name(&self) -> &'static str;

    /// File name under the docs directory.
    fn file_name(&self) -> &'static str;

    /// Full file contents, or `None` when there is nothing to publish.
    fn render(&self, ideas: &[Idea], site: &Site) -> Result<Option<String>, FeedError>;
}

/// Every builder, in the order they run.
pub fn builders() -> Vec<Box<dyn FeedBuilder>> {
    vec![
        Box::new(LatestJson),
        Box::new(RecentJson::default()),
        Box::new(ArchiveJson),
        Box::new(RssFeed::default()),
        Box::new(JsonFeed::default()),
        Box::new(ArchiveHtml),
        Box::new(Sitemap),
        Box::new(Robots),
    ]
}

/// Ideas newest first; same-date ties by slug ascending.
pub fn newest_first(ideas: &[Idea]) -> Vec<&Idea> {
    let mut sorted: Vec<&Idea> = ideas.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
    sorted
}

#[derive(Debug)]
pub struct FeedFailure {
    pub name: &'static str,
    pub error: FeedError,
}

/// Outcome of one rebuild pass.
#[derive(Debug, Default)]
pub struct FeedReport {
    pub written: Vec<PathBuf>,
    /// Builders that had nothing to publish.
    pub skipped: Vec<&'static str>,
    pub failed: Vec<FeedFailure>,
}

impl FeedReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_names(&self) -> Vec<&'static str> {
        self.failed.iter().map(|f| f.name).collect()
    }
}

/// Run every builder into `docs_dir`.
pub async fn rebuild_all(docs_dir: &Path, ideas: &[Idea], site: &Site) -> FeedReport {
    rebuild_with(&builders(), docs_dir, ideas, site).await
}

/// Run `builders` into `docs_dir`. One builder failing does not stop the others.
pub async fn rebuild_with(
    builders: &[Box<dyn FeedBuilder>],
    docs_dir: &Path,
    ideas: &[Idea],
    site: &Site,
) -> FeedReport {
    let mut report = FeedReport::default();

    for builder in builders {
        let path = docs_dir.join(builder.file_name());
        let result = match builder.render(ideas, site) {
            Ok(Some(contents)) => write_atomic(&path, &contents).await.map(|()| true),
            Ok(None) => Ok(false),
            Err(e) => Err(e),
        };

        match result {
            Ok(true) => report.written.push(path),
            Ok(false) => {
                info!("{}: no data, left untouched", builder.name());
                report.skipped.push(builder.name());
            }
            Err(error) => {
                warn!("{} failed: {error}", builder.name());
                report.failed.push(FeedFailure {
                    name: builder.name(),
                    error,
                });
            }
        }
    }

    info!(
        "rebuilt {} artifacts ({} skipped, {} failed)",
        report.written.len(),
        report.skipped.len(),
        report.failed.len()
    );
    report
}

/// Write through a sibling temp file and rename over the target.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), FeedError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Escape text for XML and HTML bodies and attributes.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
