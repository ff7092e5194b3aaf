//! RSS 2.0 feed.

use super::{escape_xml, newest_first, FeedBuilder, FeedError, Site};
use crate::idea::Idea;
use chrono::{NaiveDate, TimeZone, Utc};
use std::fmt::Write;

/// Items in `feed.xml`.
pub const FEED_LIMIT: usize = 20;

pub struct RssFeed {
    pub limit: usize,
}

impl Default for RssFeed {
    fn default() -> Self {
        Self { limit: FEED_LIMIT }
    }
}

/// RFC 2822 timestamp for midnight UTC on `date`.
pub fn pub_date(date: NaiveDate) -> Result<String, FeedError> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| FeedError::Render(format!("no midnight for {date}")))?;
    Ok(Utc.from_utc_datetime(&midnight).to_rfc2822())
}

impl FeedBuilder for RssFeed {
    fn name(&self) -> &'static str {
        "rss"
    }

    fn file_name(&self) -> &'static str {
        "feed.xml"
    }

    fn render(&self, ideas: &[Idea], site: &Site) -> Result<Option<String>, FeedError> {
        let items: Vec<&Idea> = newest_first(ideas).into_iter().take(self.limit).collect();
        let Some(newest) = items.first() else {
            return Ok(None);
        };

        let mut xml = String::new();
        let fmt_err = |e: std::fmt::Error| FeedError::Render(e.to_string());

        writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#).map_err(fmt_err)?;
        writeln!(xml, r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">"#)
            .map_err(fmt_err)?;
        writeln!(xml, "<channel>").map_err(fmt_err)?;
        writeln!(xml, "<title>{}</title>", escape_xml(&site.title)).map_err(fmt_err)?;
        writeln!(xml, "<link>{}</link>", escape_xml(&site.repo_url())).map_err(fmt_err)?;
        writeln!(xml, "<description>{}</description>", escape_xml(&site.description))
            .map_err(fmt_err)?;
        writeln!(xml, "<lastBuildDate>{}</lastBuildDate>", pub_date(newest.date)?)
            .map_err(fmt_err)?;
        writeln!(
            xml,
            r#"<atom:link href="{}" rel="self" type="application/rss+xml" />"#,
            escape_xml(&site.page_url(self.file_name()))
        )
        .map_err(fmt_err)?;

        for idea in &items {
            writeln!(xml, "<item>").map_err(fmt_err)?;
            writeln!(xml, "<title>{}</title>", escape_xml(&idea.concept)).map_err(fmt_err)?;
            writeln!(xml, "<link>{}</link>", escape_xml(&site.ledger_url(&idea.month())))
                .map_err(fmt_err)?;
            writeln!(
                xml,
                r#"<guid isPermaLink="false">{}</guid>"#,
                escape_xml(&idea.repo_name)
            )
            .map_err(fmt_err)?;
            writeln!(xml, "<pubDate>{}</pubDate>", pub_date(idea.date)?).map_err(fmt_err)?;
            writeln!(xml, "<description>{}</description>", escape_xml(&idea.summary))
                .map_err(fmt_err)?;
            for tag in &idea.tags {
                writeln!(xml, "<category>{}</category>", escape_xml(tag)).map_err(fmt_err)?;
            }
            writeln!(xml, "</item>").map_err(fmt_err)?;
        }

        writeln!(xml, "</channel>").map_err(fmt_err)?;
        writeln!(xml, "</rss>").map_err(fmt_err)?;
        Ok(Some(xml))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_ideas;

    #[test]
    fn test_pub_date() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 10).unwrap();
        assert_eq!(pub_date(date).unwrap(), "Sun, 10 Aug 2025 00:00:00 +0000");
    }

    #[test]
    fn test_empty_store_has_no_feed() {
        let site = Site::from_repo_slug("someone/heartbeat");
        assert!(RssFeed::default().render(&[], &site).unwrap().is_none());
    }

    #[test]
    fn test_items_are_capped_and_newest_first() {
        let site = Site::from_repo_slug("someone/heartbeat");
        let ideas = sample_ideas(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(), 25);
        let xml = RssFeed::default().render(&ideas, &site).unwrap().unwrap();

        assert_eq!(xml.matches("<item>").count(), FEED_LIMIT);
        let newest = pub_date(ideas[24].date).unwrap();
        assert!(xml.contains(&format!("<lastBuildDate>{newest}</lastBuildDate>")));

        let first_guid = xml.find(&ideas[24].repo_name).unwrap();
        let second_guid = xml.find(&ideas[23].repo_name).unwrap();
        assert!(first_guid < second_guid);
        assert!(!xml.contains(&ideas[0].repo_name));
        assert!(xml.contains("<category>sample</category>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let site = Site::from_repo_slug("someone/heartbeat");
        let mut ideas = sample_ideas(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(), 1);
        ideas[0].summary = "Fast <diffs> & merges.".into();
        let xml = RssFeed::default().render(&ideas, &site).unwrap().unwrap();
        assert!(xml.contains("Fast &lt;diffs&gt; &amp; merges."));
    }
}
