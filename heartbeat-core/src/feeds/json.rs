//! Plain JSON snapshots of the history.

use super::{newest_first, FeedBuilder, FeedError, Site};
use crate::idea::Idea;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Entries in `recent.json`.
pub const RECENT_LIMIT: usize = 10;

fn to_pretty<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, FeedError> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}

/// The single newest idea.
pub struct LatestJson;

impl FeedBuilder for LatestJson {
    fn name(&self) -> &'static str {
        "latest"
    }

    fn file_name(&self) -> &'static str {
        "latest.json"
    }

    fn render(&self, ideas: &[Idea], _site: &Site) -> Result<Option<String>, FeedError> {
        match newest_first(ideas).first() {
            Some(idea) => to_pretty(idea).map(Some),
            None => Ok(None),
        }
    }
}

/// Read back a published `latest.json` and check it is a well-formed idea.
///
/// A missing file is "no data", not an error.
pub async fn read_latest(docs_dir: &Path) -> Result<Option<Idea>, FeedError> {
    let path = docs_dir.join(LatestJson.file_name());
    let text = match fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let idea: Idea = serde_json::from_str(&text)?;
    idea.validate()?;
    Ok(Some(idea))
}

/// The newest `limit` ideas.
pub struct RecentJson {
    pub limit: usize,
}

impl Default for RecentJson {
    fn default() -> Self {
        Self {
            limit: RECENT_LIMIT,
        }
    }
}

impl FeedBuilder for RecentJson {
    fn name(&self) -> &'static str {
        "recent"
    }

    fn file_name(&self) -> &'static str {
        "recent.json"
    }

    fn render(&self, ideas: &[Idea], _site: &Site) -> Result<Option<String>, FeedError> {
        let recent: Vec<&Idea> = newest_first(ideas).into_iter().take(self.limit).collect();
        to_pretty(&recent).map(Some)
    }
}

/// Every idea, newest first.
pub struct ArchiveJson;

impl FeedBuilder for ArchiveJson {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn file_name(&self) -> &'static str {
        "archive.json"
    }

    fn render(&self, ideas: &[Idea], _site: &Site) -> Result<Option<String>, FeedError> {
        to_pretty(&newest_first(ideas)).map(Some)
    }
}
