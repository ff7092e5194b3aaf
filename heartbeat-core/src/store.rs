//! Month-partitioned append-only idea log.
//!
//! Each month has two files under `ideas/`: `YYYY-MM.jsonl`, the authoritative
//! machine-readable log, and `YYYY-MM.md`, a human-readable ledger rendered
//! from the same records. Only the JSONL partitions are ever read back.

use crate::idea::{Idea, ShapeError};
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const IDEAS_DIR: &str = "ideas";
const LOCK_FILE: &str = ".lock";

/// Errors from store operations. All of them are fatal for a run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid idea: {0}")]
    Invalid(#[from] ShapeError),

    #[error("An idea is already recorded for {0}")]
    DuplicateDate(NaiveDate),

    #[error("Slug `{0}` is already recorded")]
    DuplicateSlug(String),

    #[error("Store is locked by another run ({})", .0.display())]
    Locked(PathBuf),
}

/// The idea log rooted at a repository directory.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Store for the repository at `root`; partitions live in `root/ideas`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(IDEAS_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn jsonl_path(&self, month: &str) -> PathBuf {
        self.dir.join(format!("{month}.jsonl"))
    }

    pub fn markdown_path(&self, month: &str) -> PathBuf {
        self.dir.join(format!("{month}.md"))
    }

    /// Every stored idea, oldest first (ties by slug).
    ///
    /// Malformed lines are skipped with a warning.
    pub async fn load(&self) -> Result<Vec<Idea>, StoreError> {
        let mut partitions = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "jsonl").unwrap_or(false) {
                partitions.push(path);
            }
        }
        partitions.sort();

        let mut ideas = Vec::new();
        for path in partitions {
            let content = fs::read_to_string(&path).await?;
            for (index, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Idea>(line) {
                    Ok(idea) => ideas.push(idea),
                    Err(e) => warn!(
                        "skipping malformed record {}:{}: {e}",
                        path.display(),
                        index + 1
                    ),
                }
            }
        }

        ideas.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.slug.cmp(&b.slug)));
        Ok(ideas)
    }

    /// Every slug in history.
    pub async fn slugs(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.load().await?.into_iter().map(|idea| idea.slug).collect())
    }

    pub async fn contains_date(&self, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.load().await?.iter().any(|idea| idea.date == date))
    }

    /// Append one validated idea to its month partition.
    ///
    /// The JSONL record is written first; the Markdown ledger follows. Callers
    /// that may race with another run should hold [`Store::lock`].
    pub async fn append(&self, idea: &Idea) -> Result<(), StoreError> {
        idea.validate()?;

        let history = self.load().await?;
        if history.iter().any(|i| i.date == idea.date) {
            return Err(StoreError::DuplicateDate(idea.date));
        }
        if history.iter().any(|i| i.slug == idea.slug) {
            return Err(StoreError::DuplicateSlug(idea.slug.clone()));
        }

        fs::create_dir_all(&self.dir).await?;
        let month = idea.month();

        let jsonl_path = self.jsonl_path(&month);
        // A partition cut off mid-write must not swallow the next record.
        let mut record = if lacks_final_newline(&jsonl_path).await? {
            String::from("\n")
        } else {
            String::new()
        };
        record.push_str(&serde_json::to_string(idea)?);
        record.push('\n');
        append_bytes(&jsonl_path, record.as_bytes()).await?;

        let markdown_path = self.markdown_path(&month);
        let ledger = if fs::try_exists(&markdown_path).await? {
            format!("\n{}", render_entry(idea))
        } else {
            format!("{}{}", render_header(&month), render_entry(idea))
        };
        append_bytes(&markdown_path, ledger.as_bytes()).await?;

        debug!("appended {} to {}", idea.date, self.jsonl_path(&month).display());
        Ok(())
    }

    /// Take the exclusive store lock. Released when the guard drops.
    pub async fn lock(&self) -> Result<StoreLock, StoreError> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(LOCK_FILE);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => StoreLock::stamp(path, &mut file).await,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StoreError::Locked(path)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Guard for the store lock file.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    /// Guard `path`, then record this process id in the freshly created lock file.
    async fn stamp<W>(path: PathBuf, file: &mut W) -> Result<Self, StoreError>
    where
        W: AsyncWrite + Unpin,
    {
        let lock = StoreLock { path };
        file.write_all(std::process::id().to_string().as_bytes())
            .await?;
        Ok(lock)
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("failed to release {}: {e}", self.path.display());
        }
    }
}

async fn lacks_final_newline(path: &Path) -> Result<bool, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(bytes.last().is_some_and(|b| *b != b'\n')),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn append_bytes(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

fn render_header(month: &str) -> String {
    format!("# Idea Log — {month}\n\nDaily repository ideas (generated automatically).\n\n")
}

/// The Markdown ledger entry for one idea.
pub fn render_entry(idea: &Idea) -> String {
    let mut lines = vec![
        format!("### {} — {}", idea.date, idea.concept),
        format!("Theme: `{}`", idea.theme),
        format!("Repo: `{}`", idea.repo_name),
    ];
    if !idea.tags.is_empty() {
        let tags: Vec<String> = idea.tags.iter().map(|t| format!("`{t}`")).collect();
        lines.push(format!("Tags: {}", tags.join(", ")));
    }
    lines.push(format!("Summary: {}", idea.summary));
    let mut entry = lines.join("\n");
    entry.push('\n');
    entry
}
