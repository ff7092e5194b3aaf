//! Static HTML archive, one section per month.

use super::{escape_xml, newest_first, FeedBuilder, FeedError, Site};
use crate::idea::Idea;
use std::fmt::Write;

pub struct ArchiveHtml;

const HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>Heartbeat • Archive</title>
  <style>
    :root { color-scheme: light dark; --bg:#f6f8fa; --card:#fff; --text:#111827; --muted:#6b7280; --border:#e5e7eb; }
    @media (prefers-color-scheme: dark) { :root { --bg:#0b0c0e; --card:#111316; --text:#e5e7eb; --muted:#9ca3af; --border:#1f2937; } }
    body { margin:0; font-family:Segoe UI,system-ui,-apple-system,Roboto,Arial; background:var(--bg); color:var(--text); padding:24px; display:grid; place-items:center; }
    .shell { width:100%; max-width:980px; }
    header { text-align:center; margin-bottom:16px; }
    .muted { color:var(--muted); }
    .card { background:var(--card); border:1px solid var(--border); border-radius:14px; padding:16px 20px; margin-bottom:16px; }
    li { margin:6px 0; }
    code { font-size:.9em; }
    a { color:#0969da; text-decoration:none; }
    a:hover { text-decoration:underline; }
    .actions { text-align:center; }
  </style>
</head>
<body>
  <div class="shell">
    <header>
      <h1>Archive</h1>
      <div class="muted">Monthly idea logs with quick links</div>
    </header>
"#;

const FOOT: &str = r#"    <div class="actions">
      <a href="./index.html">Home</a> ·
      <a href="./latest.json">Latest JSON</a> ·
      <a href="./recent.json">Recent JSON</a> ·
      <a href="./feed.xml">RSS</a> ·
      <a href="./feed.json">JSON Feed</a>
    </div>
  </div>
</body>
</html>
"#;

impl FeedBuilder for ArchiveHtml {
    fn name(&self) -> &'static str {
        "archive-html"
    }

    fn file_name(&self) -> &'static str {
        "archive.html"
    }

    fn render(&self, ideas: &[Idea], site: &Site) -> Result<Option<String>, FeedError> {
        let fmt_err = |e: std::fmt::Error| FeedError::Render(e.to_string());
        let mut html = String::from(HEAD);

        // Newest-first order keeps each month contiguous.
        let mut months: Vec<(String, Vec<&Idea>)> = Vec::new();
        for idea in newest_first(ideas) {
            let month = idea.month();
            match months.last_mut() {
                Some((current, entries)) if *current == month => entries.push(idea),
                _ => months.push((month, vec![idea])),
            }
        }

        if months.is_empty() {
            html.push_str("    <section class=\"card muted\">No data yet.</section>\n");
        }

        for (month, entries) in &months {
            writeln!(html, "    <section class=\"card\">").map_err(fmt_err)?;
            writeln!(
                html,
                "      <h2>{} <span class=\"muted\">({} {})</span></h2>",
                escape_xml(month),
                entries.len(),
                if entries.len() == 1 { "entry" } else { "entries" }
            )
            .map_err(fmt_err)?;
            writeln!(
                html,
                "      <p><a href=\"{}\">Markdown</a> &middot; <a href=\"{}\">JSONL</a></p>",
                escape_xml(&site.ledger_url(month)),
                escape_xml(&site.partition_url(month))
            )
            .map_err(fmt_err)?;
            writeln!(html, "      <ul>").map_err(fmt_err)?;
            for idea in entries {
                writeln!(
                    html,
                    "        <li><strong>{}</strong> {} <code>{}</code><br /><span class=\"muted\">{}</span></li>",
                    idea.date,
                    escape_xml(&idea.concept),
                    escape_xml(&idea.repo_name),
                    escape_xml(&idea.summary)
                )
                .map_err(fmt_err)?;
            }
            writeln!(html, "      </ul>").map_err(fmt_err)?;
            writeln!(html, "    </section>").map_err(fmt_err)?;
        }

        html.push_str(FOOT);
        Ok(Some(html))
    }
}
