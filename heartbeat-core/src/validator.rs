//! Slug de-duplication.
//!
//! A candidate is accepted once its slug is absent from history and, when a
//! namespace search is attached, absent from that namespace too. After
//! [`MAX_ATTEMPTS`] colliding candidates the last one is forced unique with a
//! short hash suffix.

use crate::generator::{GenerateError, Generator};
use crate::idea::Idea;
use crate::namespace::NamespaceSearch;
use chrono::NaiveDate;
use log::{info, warn};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Candidates requested before falling back to a suffix.
pub const MAX_ATTEMPTS: u32 = 6;

const SUFFIX_LEN: usize = 6;

pub struct Validator<'a> {
    history: &'a HashSet<String>,
    namespace: Option<&'a dyn NamespaceSearch>,
}

impl<'a> Validator<'a> {
    pub fn new(history: &'a HashSet<String>) -> Self {
        Self {
            history,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: &'a dyn NamespaceSearch) -> Self {
        self.namespace = Some(namespace);
        self
    }

    /// Slug is free in history and, if checked, in the external namespace.
    ///
    /// A failing namespace query counts as "no collision".
    pub async fn is_unique(&self, slug: &str) -> bool {
        if self.history.contains(slug) {
            return false;
        }
        let Some(namespace) = self.namespace else {
            return true;
        };
        match namespace.exists(slug).await {
            Ok(taken) => !taken,
            Err(e) => {
                warn!("{} search failed for `{slug}`, assuming free: {e}", namespace.name());
                true
            }
        }
    }

    /// Generate candidates for `date` until one has a unique slug.
    ///
    /// Only generator failures are returned as errors.
    pub async fn validate(&self, generator: &Generator, date: NaiveDate) -> Result<Idea, GenerateError> {
        let mut attempt = 0;
        let mut candidate = generator.generate(date, attempt).await?;

        loop {
            if self.is_unique(&candidate.slug).await {
                return Ok(candidate);
            }
            attempt += 1;
            info!(
                "slug `{}` is taken ({attempt}/{MAX_ATTEMPTS})",
                candidate.slug
            );
            if attempt >= MAX_ATTEMPTS {
                break;
            }
            candidate = generator.generate(date, attempt).await?;
        }

        let slug = self.disambiguate(&candidate.slug, date);
        info!("using disambiguated slug `{slug}`");
        Ok(candidate.with_slug(slug))
    }

    /// `{slug}-{hash}`, with a counter appended while that is still in history.
    pub fn disambiguate(&self, slug: &str, date: NaiveDate) -> String {
        let digest = format!("{:x}", Sha256::digest(format!("{date}:{slug}").as_bytes()));
        let base = format!("{slug}-{}", &digest[..SUFFIX_LEN]);

        let mut unique = base.clone();
        let mut counter = 2;
        while self.history.contains(&unique) {
            unique = format!("{base}-{counter}");
            counter += 1;
        }
        unique
    }
}
