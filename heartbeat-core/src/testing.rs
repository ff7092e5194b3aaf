//! Testing utilities.
//!
//! This module provides doubles for the external collaborators:
//! - `MockBackend` for scripted generation without API calls
//! - `MockNamespace` for scripted namespace collisions
//! - `sample_ideas` for building a populated history

use crate::generator::{BackendError, IdeaBackend};
use crate::idea::{Draft, Idea, Source, Theme};
use crate::namespace::{NamespaceError, NamespaceSearch};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted backend reply.
pub type MockResponse = Result<Draft, String>;

/// A backend that returns scripted drafts.
///
/// Clones share their script position and call counter.
#[derive(Clone)]
pub struct MockBackend {
    source: Source,
    ready: bool,
    state: Arc<MockState>,
}

struct MockState {
    responses: Vec<MockResponse>,
    /// Replay the last response forever once the script runs out.
    repeat_last: bool,
    calls: AtomicUsize,
}

impl MockBackend {
    /// Return `responses` in order, then fail.
    pub fn scripted(source: Source, responses: Vec<MockResponse>) -> Self {
        Self::build(source, responses, false)
    }

    /// Return the same draft on every call.
    pub fn always(source: Source, draft: Draft) -> Self {
        Self::build(source, vec![Ok(draft)], true)
    }

    /// Fail on every call.
    pub fn failing(source: Source, reason: impl Into<String>) -> Self {
        Self::build(source, vec![Err(reason.into())], true)
    }

    fn build(source: Source, responses: Vec<MockResponse>, repeat_last: bool) -> Self {
        Self {
            source,
            ready: true,
            state: Arc::new(MockState {
                responses,
                repeat_last,
                calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Report the backend as unconfigured.
    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdeaBackend for MockBackend {
    fn source(&self) -> Source {
        self.source
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn generate(
        &self,
        _date: NaiveDate,
        _theme: Theme,
        _attempt: u32,
    ) -> Result<Draft, BackendError> {
        let index = self.state.calls.fetch_add(1, Ordering::SeqCst);
        let responses = &self.state.responses;
        let response = match responses.get(index) {
            Some(r) => Some(r),
            None if self.state.repeat_last => responses.last(),
            None => None,
        };
        match response {
            Some(Ok(draft)) => Ok(draft.clone()),
            Some(Err(reason)) => Err(BackendError::Failed(reason.clone())),
            None => Err(BackendError::Failed(
                "no more scripted responses".to_string(),
            )),
        }
    }
}

/// A namespace with a fixed set of taken names.
pub struct MockNamespace {
    taken: HashSet<String>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl MockNamespace {
    pub fn taken(names: &[&str]) -> Self {
        Self {
            taken: names.iter().map(|s| s.to_string()).collect(),
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every query errors.
    pub fn failing() -> Self {
        Self {
            taken: HashSet::new(),
            fail: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Slugs queried so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NamespaceSearch for MockNamespace {
    fn name(&self) -> &str {
        "mock"
    }

    async fn exists(&self, slug: &str) -> Result<bool, NamespaceError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(slug.to_string());
        }
        if self.fail {
            return Err(NamespaceError::Network("connection refused".to_string()));
        }
        Ok(self.taken.contains(slug))
    }
}

/// `count` valid ideas on consecutive days starting at `start`, oldest first.
pub fn sample_ideas(start: NaiveDate, count: usize) -> Vec<Idea> {
    (0..count)
        .filter_map(|i| {
            let date = start + chrono::Duration::days(i as i64);
            Draft::new(
                format!("Sample idea number {i}"),
                format!("Summary for sample idea {i}."),
                vec!["sample".to_string(), format!("n{i}")],
            )
            .into_idea(date, Source::Offline)
            .ok()
        })
        .collect()
}
