//! Crawler-facing files.

use super::{escape_xml, newest_first, FeedBuilder, FeedError, Site};
use crate::idea::Idea;
use std::fmt::Write;

/// Published pages listed in the sitemap, relative to the site root.
const PAGES: &[&str] = &[
    "",
    "archive.html",
    "latest.json",
    "recent.json",
    "archive.json",
    "feed.xml",
    "feed.json",
];

pub struct Sitemap;

impl FeedBuilder for Sitemap {
    fn name(&self) -> &'static str {
        "sitemap"
    }

    fn file_name(&self) -> &'static str {
        "sitemap.xml"
    }

    fn render(&self, ideas: &[Idea], site: &Site) -> Result<Option<String>, FeedError> {
        let fmt_err = |e: std::fmt::Error| FeedError::Render(e.to_string());
        let lastmod = newest_first(ideas).first().map(|idea| idea.date);

        let mut xml = String::new();
        writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#).map_err(fmt_err)?;
        writeln!(xml, r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#)
            .map_err(fmt_err)?;
        for page in PAGES {
            writeln!(xml, "  <url>").map_err(fmt_err)?;
            writeln!(xml, "    <loc>{}</loc>", escape_xml(&site.page_url(page))).map_err(fmt_err)?;
            if let Some(date) = lastmod {
                writeln!(xml, "    <lastmod>{date}</lastmod>").map_err(fmt_err)?;
            }
            writeln!(xml, "  </url>").map_err(fmt_err)?;
        }
        writeln!(xml, "</urlset>").map_err(fmt_err)?;
        Ok(Some(xml))
    }
}

pub struct Robots;

impl FeedBuilder for Robots {
    fn name(&self) -> &'static str {
        "robots"
    }

    fn file_name(&self) -> &'static str {
        "robots.txt"
    }

    fn render(&self, _ideas: &[Idea], site: &Site) -> Result<Option<String>, FeedError> {
        Ok(Some(format!(
            "User-agent: *\nAllow: /\n\nSitemap: {}\n",
            site.page_url(Sitemap.file_name())
        )))
    }
}
