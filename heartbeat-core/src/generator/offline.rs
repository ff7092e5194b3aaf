//! Deterministic offline backend.
//!
//! Draws words from fixed lists with an RNG seeded from the date and the
//! attempt number, so the same inputs always give the same draft.

use super::{BackendError, IdeaBackend};
use crate::idea::{Draft, Source, Theme};
use async_trait::async_trait;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

const ADJECTIVES: &[&str] = &[
    "quantum",
    "minimal",
    "serverless",
    "edge",
    "ambient",
    "streaming",
    "fuzzy",
    "semantic",
    "temporal",
    "realtime",
    "zero-trust",
    "privacy-first",
    "offline-first",
    "federated",
];

const DOMAINS: &[&str] = &[
    "notes",
    "search",
    "scheduler",
    "webhooks",
    "etl",
    "dashboard",
    "observability",
    "vector-store",
    "recommendations",
    "graphql-gateway",
    "audio-transcribe",
    "image-annotator",
    "feature-flags",
    "secrets-rotator",
];

const MODALITIES: &[&str] = &["cli", "webapp", "service", "sdk", "agent", "daemon", "extension"];

const VERBS: &[&str] = &[
    "generate",
    "synchronize",
    "monitor",
    "summarize",
    "classify",
    "transcode",
    "index",
    "simulate",
    "scrape",
    "normalize",
    "visualize",
];

const TARGETS: &[&str] = &[
    "github issues",
    "rss feeds",
    "email",
    "log files",
    "browser history",
    "api responses",
    "pdfs",
    "screenshots",
    "terminal sessions",
    "config files",
];

/// Always-available backend with no external dependency.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBackend;

impl OfflineBackend {
    pub fn new() -> Self {
        Self
    }

    /// The draft for a date and attempt. Pure.
    pub fn draft(date: NaiveDate, theme: Theme, attempt: u32) -> Draft {
        let mut rng = StdRng::seed_from_u64(seed(&format!("{date}-{attempt}")));
        let pick = |rng: &mut StdRng, words: &[&'static str]| -> &'static str {
            words.choose(rng).copied().unwrap_or_default()
        };

        let adjective = pick(&mut rng, ADJECTIVES);
        let domain = pick(&mut rng, DOMAINS);
        let modality = pick(&mut rng, MODALITIES);
        let verb = pick(&mut rng, VERBS);
        let target = pick(&mut rng, TARGETS);

        // Sorted word tags, then the theme.
        let words: BTreeSet<&str> = [adjective, domain, modality].into_iter().collect();
        let mut tags: Vec<String> = words.into_iter().map(str::to_string).collect();
        tags.push(theme.as_str().to_string());

        Draft::new(
            format!("{adjective} {domain} {modality}"),
            format!(
                "A {modality} that can {verb} and manage {target} with a focus on {adjective} {domain}."
            ),
            tags,
        )
    }
}

fn seed(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[async_trait]
impl IdeaBackend for OfflineBackend {
    fn source(&self) -> Source {
        Source::Offline
    }

    async fn generate(
        &self,
        date: NaiveDate,
        theme: Theme,
        attempt: u32,
    ) -> Result<Draft, BackendError> {
        Ok(Self::draft(date, theme, attempt))
    }
}
