//! Remote chat-completion backends (Azure OpenAI and OpenAI).

use super::{BackendError, IdeaBackend};
use crate::config::{AzureConfig, OpenAiConfig};
use crate::idea::{Draft, Source, Theme};
use async_trait::async_trait;
use chrono::NaiveDate;
use openai::{Client, Message, Request};
use regex::Regex;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "Be practical and inventive.";
const MAX_TOKENS: usize = 180;
const TEMPERATURE: f32 = 0.8;

lazy_static::lazy_static! {
    static ref TITLE_LINE: Regex = Regex::new(r"(?i)(?:title|concept)\s*[:\-]\s*(.+)").unwrap();
    static ref SUMMARY_LINE: Regex = Regex::new(r"(?i)summary\s*[:\-]\s*(.+)").unwrap();
    static ref TAGS_LINE: Regex = Regex::new(r"(?i)tags\s*[:\-]\s*(.+)").unwrap();
    static ref TAG_SEPARATOR: Regex = Regex::new(r"[,|]").unwrap();
}

/// A backend backed by one chat completions endpoint.
pub struct ChatBackend {
    client: Client,
    source: Source,
    json_mode: bool,
}

impl ChatBackend {
    /// Primary backend: an Azure OpenAI deployment.
    pub fn azure(config: &AzureConfig, timeout: Duration) -> Result<Self, openai::Error> {
        let client = Client::azure(
            &config.endpoint,
            &config.deployment,
            &config.api_version,
            &config.api_key,
        )?
        .with_timeout(timeout)?;
        Ok(Self {
            client,
            source: Source::Azure,
            json_mode: false,
        })
    }

    /// Secondary backend: the OpenAI API.
    pub fn openai(config: &OpenAiConfig, timeout: Duration) -> Result<Self, openai::Error> {
        let client = Client::openai(&config.api_key)?
            .with_model(&config.model)
            .with_timeout(timeout)?;
        Ok(Self {
            client,
            source: Source::OpenAi,
            json_mode: true,
        })
    }

    fn build_request(&self, date: NaiveDate, theme: Theme, attempt: u32) -> Request {
        let request = Request::new(vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(prompt(date, theme, attempt)),
        ])
        .with_max_tokens(MAX_TOKENS)
        .with_temperature(TEMPERATURE);

        if self.json_mode {
            request.with_json_object()
        } else {
            request
        }
    }
}

#[async_trait]
impl IdeaBackend for ChatBackend {
    fn source(&self) -> Source {
        self.source
    }

    async fn generate(
        &self,
        date: NaiveDate,
        theme: Theme,
        attempt: u32,
    ) -> Result<Draft, BackendError> {
        let response = self
            .client
            .complete(self.build_request(date, theme, attempt))
            .await?;
        parse_content(response.text())
    }
}

/// User prompt for one generation request.
pub fn prompt(date: NaiveDate, theme: Theme, attempt: u32) -> String {
    let mut text = format!(
        "Date: {date}. Theme: {theme}. You are an expert product ideation assistant. \
         Generate one concise, original open-source repository idea related to the theme \
         that likely does not already exist. Respond with a JSON object with keys \
         \"title\" (<= 8 words), \"summary\" (<= 35 words) and \"tags\" (3-5 short \
         kebab-case strings). Avoid controversial topics."
    );
    if attempt > 0 {
        text.push_str(&format!(
            " This is retry {attempt}: earlier ideas were already taken, so choose a clearly different concept."
        ));
    }
    text
}

/// Parse a model reply into a draft.
///
/// Accepts a JSON object (optionally inside a code fence) or labelled
/// `Title:` / `Summary:` / `Tags:` lines.
pub fn parse_content(content: &str) -> Result<Draft, BackendError> {
    let content = strip_code_fences(content);
    if content.is_empty() {
        return Err(BackendError::Malformed("empty reply".to_string()));
    }

    if let Some(draft) = parse_json_object(content) {
        return Ok(draft);
    }
    parse_labelled_lines(content)
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = match trimmed.strip_prefix("```") {
        Some(rest) => rest
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .trim_start(),
        None => trimmed,
    };
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

fn parse_json_object(content: &str) -> Option<Draft> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(&content[start..=end]).ok()?;
    let object = value.as_object()?;

    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| object.get(*k).and_then(|v| v.as_str()))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let tags = match object.get("tags") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().trim_start_matches('#').to_string())
            .collect(),
        Some(serde_json::Value::String(s)) => split_tags(s),
        _ => Vec::new(),
    };

    Some(Draft::new(
        text(&["title", "concept", "name"]),
        text(&["summary", "description"]),
        tags,
    ))
}

fn parse_labelled_lines(content: &str) -> Result<Draft, BackendError> {
    // Markdown emphasis around labels ("**Title:**") would hide them from the patterns.
    let plain = content.replace('*', "");

    let capture = |re: &Regex| {
        re.captures(&plain)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().trim_matches('"').to_string())
    };

    let title = match capture(&TITLE_LINE) {
        Some(title) => title,
        None => plain
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(|l| l.chars().take(60).collect::<String>())
            .ok_or_else(|| BackendError::Malformed("no title found".to_string()))?,
    };
    let summary = capture(&SUMMARY_LINE).unwrap_or_default();
    let tags = capture(&TAGS_LINE)
        .map(|line| split_tags(&line))
        .unwrap_or_default();

    Ok(Draft::new(title, summary, tags))
}

fn split_tags(line: &str) -> Vec<String> {
    TAG_SEPARATOR
        .split(line)
        .map(|t| t.trim().trim_start_matches('#').trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
