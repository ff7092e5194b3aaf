//! JSON Feed 1.1.

use super::{newest_first, rss::FEED_LIMIT, FeedBuilder, FeedError, Site};
use crate::idea::Idea;
use serde::Serialize;

pub const VERSION: &str = "https://jsonfeed.org/version/1.1";

pub struct JsonFeed {
    pub limit: usize,
}

impl Default for JsonFeed {
    fn default() -> Self {
        Self { limit: FEED_LIMIT }
    }
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    version: &'static str,
    title: &'a str,
    home_page_url: &'a str,
    feed_url: String,
    description: &'a str,
    items: Vec<Item<'a>>,
}

#[derive(Debug, Serialize)]
struct Item<'a> {
    id: &'a str,
    url: String,
    title: &'a str,
    content_text: &'a str,
    date_published: String,
    #[serde(skip_serializing_if = "no_tags")]
    tags: &'a [String],
}

fn no_tags(tags: &&[String]) -> bool {
    tags.is_empty()
}

impl FeedBuilder for JsonFeed {
    fn name(&self) -> &'static str {
        "jsonfeed"
    }

    fn file_name(&self) -> &'static str {
        "feed.json"
    }

    fn render(&self, ideas: &[Idea], site: &Site) -> Result<Option<String>, FeedError> {
        let items: Vec<Item> = newest_first(ideas)
            .into_iter()
            .take(self.limit)
            .map(|idea| Item {
                id: &idea.repo_name,
                url: site.ledger_url(&idea.month()),
                title: &idea.concept,
                content_text: &idea.summary,
                date_published: format!("{}T00:00:00Z", idea.date.format("%Y-%m-%d")),
                tags: &idea.tags,
            })
            .collect();
        if items.is_empty() {
            return Ok(None);
        }

        let document = Document {
            version: VERSION,
            title: &site.title,
            home_page_url: &site.home_url,
            feed_url: site.page_url(self.file_name()),
            description: &site.description,
            items,
        };
        let mut out = serde_json::to_string_pretty(&document)?;
        out.push('\n');
        Ok(Some(out))
    }
}
