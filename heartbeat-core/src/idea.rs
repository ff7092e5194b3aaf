//! The daily idea record.
//!
//! Every idea passes through the same normalization before it can be stored:
//! word limits on concept and summary, kebab-case tags, a canonical slug and a
//! theme that is a pure function of the date.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

pub const MAX_CONCEPT_WORDS: usize = 8;
pub const MAX_SUMMARY_WORDS: usize = 35;
pub const MAX_TAGS: usize = 5;

lazy_static::lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9\-]+").unwrap();
    static ref DASH_RUNS: Regex = Regex::new(r"-+").unwrap();
    static ref KEBAB: Regex = Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();
}

/// Shape violations that keep a candidate out of the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("concept is empty")]
    EmptyConcept,

    #[error("concept has {0} words (max {MAX_CONCEPT_WORDS})")]
    ConceptTooLong(usize),

    #[error("summary is empty")]
    EmptySummary,

    #[error("summary has {0} words (max {MAX_SUMMARY_WORDS})")]
    SummaryTooLong(usize),

    #[error("{0} tags (max {MAX_TAGS})")]
    TooManyTags(usize),

    #[error("tag `{0}` is not kebab-case")]
    InvalidTag(String),

    #[error("tag `{0}` appears more than once")]
    DuplicateTag(String),

    #[error("slug `{0}` is not a canonical slug")]
    InvalidSlug(String),

    #[error("repo name `{found}` does not match `{expected}`")]
    RepoNameMismatch { expected: String, found: String },

    #[error("theme `{found}` does not match the rotation for this date (`{expected}`)")]
    ThemeMismatch { expected: Theme, found: Theme },
}

/// The fixed theme rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Security,
    Data,
    Devtools,
    Automation,
    Observability,
    Productivity,
    Ml,
}

impl Theme {
    /// Rotation order; day 1 of every year starts at `Security`.
    pub const ALL: [Theme; 7] = [
        Theme::Security,
        Theme::Data,
        Theme::Devtools,
        Theme::Automation,
        Theme::Observability,
        Theme::Productivity,
        Theme::Ml,
    ];

    /// Theme for a date, by day-of-year.
    pub fn for_date(date: NaiveDate) -> Theme {
        Self::ALL[date.ordinal0() as usize % Self::ALL.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Security => "security",
            Theme::Data => "data",
            Theme::Devtools => "devtools",
            Theme::Automation => "automation",
            Theme::Observability => "observability",
            Theme::Productivity => "productivity",
            Theme::Ml => "ml",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend produced an idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Primary remote backend (Azure OpenAI deployment).
    Azure,
    /// Secondary remote backend (OpenAI API).
    #[serde(rename = "openai")]
    OpenAi,
    /// Deterministic offline generator.
    Offline,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Azure => "azure",
            Source::OpenAi => "openai",
            Source::Offline => "offline",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw backend output, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
}

impl Draft {
    pub fn new(title: impl Into<String>, summary: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            tags,
        }
    }

    /// Normalize into a complete idea for `date`.
    pub fn into_idea(self, date: NaiveDate, source: Source) -> Result<Idea, ShapeError> {
        let concept = limit_words(&self.title, MAX_CONCEPT_WORDS);
        let summary = limit_words(&self.summary, MAX_SUMMARY_WORDS);
        let tags = clean_tags(&self.tags, MAX_TAGS);
        let slug = slugify(&concept);
        if concept.is_empty() {
            return Err(ShapeError::EmptyConcept);
        }
        if slug.is_empty() {
            return Err(ShapeError::InvalidSlug(concept));
        }

        let idea = Idea {
            date,
            repo_name: repo_name(&slug, date),
            concept,
            summary,
            tags,
            theme: Theme::for_date(date),
            slug,
            source,
        };
        idea.validate()?;
        Ok(idea)
    }
}

/// One stored idea. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub date: NaiveDate,
    pub concept: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub theme: Theme,
    pub slug: String,
    pub repo_name: String,
    pub source: Source,
}

impl Idea {
    /// Replace the slug, keeping `repo_name` in step.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self.repo_name = repo_name(&self.slug, self.date);
        self
    }

    /// `YYYY-MM` partition key.
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }

    /// Check every shape constraint.
    pub fn validate(&self) -> Result<(), ShapeError> {
        let concept_words = word_count(&self.concept);
        if concept_words == 0 {
            return Err(ShapeError::EmptyConcept);
        }
        if concept_words > MAX_CONCEPT_WORDS {
            return Err(ShapeError::ConceptTooLong(concept_words));
        }

        let summary_words = word_count(&self.summary);
        if summary_words == 0 {
            return Err(ShapeError::EmptySummary);
        }
        if summary_words > MAX_SUMMARY_WORDS {
            return Err(ShapeError::SummaryTooLong(summary_words));
        }

        if self.tags.len() > MAX_TAGS {
            return Err(ShapeError::TooManyTags(self.tags.len()));
        }
        let mut seen = HashSet::new();
        for tag in &self.tags {
            if !is_kebab(tag) {
                return Err(ShapeError::InvalidTag(tag.clone()));
            }
            if !seen.insert(tag.as_str()) {
                return Err(ShapeError::DuplicateTag(tag.clone()));
            }
        }

        if !is_kebab(&self.slug) {
            return Err(ShapeError::InvalidSlug(self.slug.clone()));
        }
        let expected = repo_name(&self.slug, self.date);
        if self.repo_name != expected {
            return Err(ShapeError::RepoNameMismatch {
                expected,
                found: self.repo_name.clone(),
            });
        }

        let theme = Theme::for_date(self.date);
        if self.theme != theme {
            return Err(ShapeError::ThemeMismatch {
                expected: theme,
                found: self.theme,
            });
        }
        Ok(())
    }
}

/// Canonical slug: lowercase, runs of other characters become a single `-`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = NON_SLUG_CHARS.replace_all(&lowered, "-");
    DASH_RUNS
        .replace_all(&replaced, "-")
        .trim_matches('-')
        .to_string()
}

pub fn repo_name(slug: &str, date: NaiveDate) -> String {
    format!("{slug}-{date}")
}

/// Keep at most `max_words` words; a cut sentence loses its trailing punctuation.
pub fn limit_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    words[..max_words]
        .join(" ")
        .trim_end_matches([',', '.', ';', ':', '!', '?'])
        .to_string()
}

/// Lowercase kebab-case tags, deduplicated in first-seen order, capped at `max_tags`.
pub fn clean_tags(tags: &[String], max_tags: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        if out.len() >= max_tags {
            break;
        }
        let cleaned = slugify(tag);
        if !cleaned.is_empty() && !out.contains(&cleaned) {
            out.push(cleaned);
        }
    }
    out
}

pub fn is_kebab(token: &str) -> bool {
    KEBAB.is_match(token)
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Minimal Notes CLI"), "minimal-notes-cli");
        assert_eq!(slugify("  Zero-Trust -- Webhooks!! (v2) "), "zero-trust-webhooks-v2");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_limit_words() {
        assert_eq!(limit_words("  a   b c ", 8), "a b c");
        assert_eq!(limit_words("one, two, three, four.", 2), "one, two");
        let long = "w ".repeat(50);
        assert_eq!(word_count(&limit_words(&long, MAX_SUMMARY_WORDS)), 35);
    }

    #[test]
    fn test_clean_tags() {
        let tags: Vec<String> = ["Rust", "#CLI", "rust", "Edge Computing", "--", "a", "b", "c"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            clean_tags(&tags, MAX_TAGS),
            vec!["rust", "cli", "edge-computing", "a", "b"]
        );
    }

    #[test]
    fn test_theme_rotation() {
        assert_eq!(Theme::for_date(date("2025-01-01")), Theme::Security);
        assert_eq!(Theme::for_date(date("2025-01-07")), Theme::Ml);
        assert_eq!(Theme::for_date(date("2025-01-08")), Theme::Security);
        // Same date, same theme.
        let d = date("2026-10-18");
        assert_eq!(Theme::for_date(d), Theme::for_date(d));
        assert_eq!(Theme::for_date(d), Theme::ALL[(d.ordinal() as usize - 1) % 7]);
    }

    #[test]
    fn test_draft_into_idea() {
        let draft = Draft::new(
            "A very long concept title that keeps going and going",
            "Short summary.",
            vec!["Security".into(), "CLI Tools".into()],
        );
        let idea = draft.into_idea(date("2025-08-10"), Source::Offline).unwrap();
        assert_eq!(idea.concept, "A very long concept title that keeps going");
        assert_eq!(idea.slug, "a-very-long-concept-title-that-keeps-going");
        assert_eq!(idea.repo_name, format!("{}-2025-08-10", idea.slug));
        assert_eq!(idea.tags, vec!["security", "cli-tools"]);
        assert_eq!(idea.month(), "2025-08");
        assert!(idea.validate().is_ok());
    }

    #[test]
    fn test_draft_shape_failures() {
        let d = date("2025-08-10");
        assert_eq!(
            Draft::new("  ", "x", vec![]).into_idea(d, Source::Offline),
            Err(ShapeError::EmptyConcept)
        );
        assert_eq!(
            Draft::new("Fine", "", vec![]).into_idea(d, Source::Offline),
            Err(ShapeError::EmptySummary)
        );
        assert!(matches!(
            Draft::new("!!!", "x", vec![]).into_idea(d, Source::Offline),
            Err(ShapeError::InvalidSlug(_))
        ));
    }

    #[test]
    fn test_validate_catches_tampering() {
        let idea = Draft::new("Edge notes cli", "Notes at the edge.", vec![])
            .into_idea(date("2025-08-10"), Source::Azure)
            .unwrap();

        let mut bad = idea.clone();
        bad.tags = vec!["Not Kebab".into()];
        assert!(matches!(bad.validate(), Err(ShapeError::InvalidTag(_))));

        let mut bad = idea.clone();
        bad.repo_name = "other".into();
        assert!(matches!(bad.validate(), Err(ShapeError::RepoNameMismatch { .. })));

        let renamed = idea.with_slug("edge-notes-cli-1a2b3c");
        assert_eq!(renamed.repo_name, "edge-notes-cli-1a2b3c-2025-08-10");
        assert!(renamed.validate().is_ok());
    }

    #[test]
    fn test_json_field_order() {
        let idea = Draft::new("Edge notes cli", "Notes at the edge.", vec!["edge".into()])
            .into_idea(date("2025-08-10"), Source::OpenAi)
            .unwrap();
        let json = serde_json::to_string(&idea).unwrap();
        assert_eq!(
            json,
            r#"{"date":"2025-08-10","concept":"Edge notes cli","summary":"Notes at the edge.","tags":["edge"],"theme":"observability","slug":"edge-notes-cli","repo_name":"edge-notes-cli-2025-08-10","source":"openai"}"#
        );
    }
}
