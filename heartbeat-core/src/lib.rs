//! Daily repository idea log.
//!
//! This crate provides:
//! - A fallback chain of idea backends ending in a deterministic offline generator
//! - Slug de-duplication against history and an optional namespace search
//! - A month-partitioned, append-only JSONL + Markdown log
//! - Feed builders that regenerate every published artifact from the log
//!
//! # Quick Start
//!
//! ```ignore
//! use heartbeat_core::{Config, Pipeline};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let pipeline = Pipeline::from_config(".", &config);
//!
//!     let today = chrono::Utc::now().date_naive();
//!     let report = pipeline.run(today).await?;
//!     if let Some(idea) = report.appended() {
//!         println!("{}: {}", idea.repo_name, idea.concept);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod feeds;
pub mod generator;
pub mod idea;
pub mod namespace;
pub mod pipeline;
pub mod store;
pub mod testing;
pub mod validator;

// Primary public API
pub use config::{AzureConfig, Config, OpenAiConfig};
pub use feeds::{rebuild_all, FeedBuilder, FeedError, FeedReport, Site};
pub use generator::{BackendError, GenerateError, Generator, IdeaBackend};
pub use idea::{Draft, Idea, ShapeError, Source, Theme};
pub use namespace::{GithubSearch, NamespaceError, NamespaceSearch};
pub use pipeline::{BackfillReport, Outcome, Pipeline, PipelineError, RunReport};
pub use store::{Store, StoreError, StoreLock};
pub use testing::{MockBackend, MockNamespace};
pub use validator::Validator;
