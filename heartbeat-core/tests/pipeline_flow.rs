//! End-to-end runs against a scratch repository directory.
//!
//! Every test here is offline: remote backends are scripted with `MockBackend`
//! and namespace collisions with `MockNamespace`.

use chrono::NaiveDate;
use heartbeat_core::feeds::{self, RecentJson};
use heartbeat_core::idea::{Draft, Idea, Source};
use heartbeat_core::testing::{sample_ideas, MockBackend, MockNamespace};
use heartbeat_core::{Generator, Outcome, Pipeline, Site, Store, StoreError};
use std::fs;
use tempfile::TempDir;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn site() -> Site {
    Site::from_repo_slug("someone/heartbeat")
}

async fn seed(store: &Store, ideas: &[Idea]) {
    for idea in ideas {
        store.append(idea).await.expect("seed append");
    }
}

// =============================================================================
// Generation fallback
// =============================================================================

#[tokio::test]
async fn test_remote_failures_fall_back_to_offline() {
    let temp = TempDir::new().unwrap();
    let azure = MockBackend::failing(Source::Azure, "503 service unavailable");
    let openai = MockBackend::failing(Source::OpenAi, "timeout");
    let generator = Generator::new(vec![Box::new(azure.clone()), Box::new(openai.clone())]);
    let pipeline = Pipeline::new(temp.path(), generator, site());

    let report = pipeline.run(date("2025-08-12")).await.unwrap();
    let idea = report.appended().expect("an idea is appended");

    assert_eq!(idea.source, Source::Offline);
    assert_eq!(azure.calls(), 1);
    assert_eq!(openai.calls(), 1);

    let jsonl = fs::read_to_string(temp.path().join("ideas/2025-08.jsonl")).unwrap();
    assert!(jsonl.contains(r#""source":"offline""#));
}

#[tokio::test]
async fn test_primary_success_is_recorded_with_its_source() {
    let temp = TempDir::new().unwrap();
    let azure = MockBackend::always(
        Source::Azure,
        Draft::new(
            "Trace Lens",
            "Browse distributed traces from the terminal.",
            vec!["Observability".into(), "tui".into()],
        ),
    );
    let pipeline = Pipeline::new(temp.path(), Generator::new(vec![Box::new(azure)]), site());

    let report = pipeline.run(date("2025-08-10")).await.unwrap();
    let idea = report.appended().unwrap();
    assert_eq!(idea.source, Source::Azure);
    assert_eq!(idea.slug, "trace-lens");
    assert_eq!(idea.repo_name, "trace-lens-2025-08-10");
    assert_eq!(idea.tags, vec!["observability", "tui"]);
}

// =============================================================================
// Slug collisions
// =============================================================================

#[tokio::test]
async fn test_history_collision_produces_new_slug() {
    let temp = TempDir::new().unwrap();
    let store = Store::new(temp.path());
    let earlier = Draft::new("Minimal Notes CLI", "Plain-text notes.", vec![])
        .into_idea(date("2025-08-01"), Source::Azure)
        .unwrap();
    seed(&store, &[earlier]).await;

    let backend = MockBackend::always(
        Source::Azure,
        Draft::new("Minimal Notes CLI", "Plain-text notes, again.", vec![]),
    );
    let pipeline = Pipeline::new(temp.path(), Generator::new(vec![Box::new(backend)]), site());

    let report = pipeline.run(date("2025-08-11")).await.unwrap();
    let idea = report.appended().unwrap();
    assert_ne!(idea.slug, "minimal-notes-cli");
    assert!(idea.slug.starts_with("minimal-notes-cli-"));

    let slugs: Vec<String> = store.load().await.unwrap().into_iter().map(|i| i.slug).collect();
    assert_eq!(slugs.len(), 2);
    assert_ne!(slugs[0], slugs[1]);
}

#[tokio::test]
async fn test_unreachable_namespace_does_not_block() {
    let temp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(temp.path(), Generator::offline(), site())
        .with_namespace(Box::new(MockNamespace::failing()));

    let report = pipeline.run(date("2025-08-10")).await.unwrap();
    assert!(matches!(report.outcome, Outcome::Appended(_)));
}

// =============================================================================
// Store
// =============================================================================

#[tokio::test]
async fn test_duplicate_date_is_rejected() {
    let temp = TempDir::new().unwrap();
    let store = Store::new(temp.path());
    let ideas = sample_ideas(date("2025-08-01"), 1);
    seed(&store, &ideas).await;

    let other = Draft::new("Another Thing", "Different idea, same day.", vec![])
        .into_idea(date("2025-08-01"), Source::Offline)
        .unwrap();
    assert!(matches!(
        store.append(&other).await,
        Err(StoreError::DuplicateDate(_))
    ));
    assert_eq!(store.load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_markdown_ledger_header_written_once() {
    let temp = TempDir::new().unwrap();
    let store = Store::new(temp.path());
    seed(&store, &sample_ideas(date("2025-08-01"), 3)).await;

    let ledger = fs::read_to_string(temp.path().join("ideas/2025-08.md")).unwrap();
    assert!(ledger.starts_with("# Idea Log — 2025-08\n"));
    assert_eq!(ledger.matches("# Idea Log").count(), 1);
    assert_eq!(ledger.matches("\n### 2025-08-").count(), 3);
}

#[tokio::test]
async fn test_malformed_lines_are_skipped() {
    let temp = TempDir::new().unwrap();
    let store = Store::new(temp.path());
    seed(&store, &sample_ideas(date("2025-08-01"), 2)).await;

    let path = temp.path().join("ideas/2025-08.jsonl");
    let mut content = fs::read_to_string(&path).unwrap();
    content.push_str("{not json\n\n");
    fs::write(&path, content).unwrap();

    assert_eq!(store.load().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_append_after_truncated_final_line() {
    let temp = TempDir::new().unwrap();
    let store = Store::new(temp.path());
    let ideas = sample_ideas(date("2025-08-01"), 2);
    seed(&store, &ideas[..1]).await;

    let path = temp.path().join("ideas/2025-08.jsonl");
    let content = fs::read_to_string(&path).unwrap();
    fs::write(&path, content.trim_end_matches('\n')).unwrap();

    store.append(&ideas[1]).await.unwrap();

    let jsonl = fs::read_to_string(&path).unwrap();
    assert_eq!(jsonl.lines().count(), 2);
    assert!(jsonl.ends_with('\n'));
    let loaded = store.load().await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(matches!(
        store.append(&ideas[0]).await,
        Err(StoreError::DuplicateDate(_))
    ));
}

#[tokio::test]
async fn test_partitions_follow_month() {
    let temp = TempDir::new().unwrap();
    let store = Store::new(temp.path());
    seed(&store, &sample_ideas(date("2025-07-30"), 4)).await;

    assert!(temp.path().join("ideas/2025-07.jsonl").exists());
    assert!(temp.path().join("ideas/2025-08.jsonl").exists());
    let loaded = store.load().await.unwrap();
    assert_eq!(loaded.first().unwrap().date, date("2025-07-30"));
    assert_eq!(loaded.last().unwrap().date, date("2025-08-02"));
}

// =============================================================================
// Feeds
// =============================================================================

#[tokio::test]
async fn test_recent_holds_ten_newest() {
    let temp = TempDir::new().unwrap();
    let store = Store::new(temp.path());
    let ideas = sample_ideas(date("2025-07-01"), 25);
    seed(&store, &ideas).await;

    let pipeline = Pipeline::new(temp.path(), Generator::offline(), site());
    let report = pipeline.rebuild_feeds().await.unwrap();
    assert!(report.is_success());

    let recent = fs::read_to_string(temp.path().join("docs/recent.json")).unwrap();
    let recent: Vec<Idea> = serde_json::from_str(&recent).unwrap();
    assert_eq!(recent.len(), RecentJson::default().limit);
    let dates: Vec<NaiveDate> = recent.iter().map(|i| i.date).collect();
    let expected: Vec<NaiveDate> = ideas.iter().rev().take(10).map(|i| i.date).collect();
    assert_eq!(dates, expected);
}

#[tokio::test]
async fn test_empty_store_writes_no_latest() {
    let temp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(temp.path(), Generator::offline(), site());

    let report = pipeline.rebuild_feeds().await.unwrap();
    assert!(report.is_success());
    assert!(report.skipped.contains(&"latest"));
    assert!(!temp.path().join("docs/latest.json").exists());
    assert!(!temp.path().join("docs/feed.xml").exists());
    assert!(temp.path().join("docs/robots.txt").exists());
    assert_eq!(pipeline.check_latest().await.unwrap(), None);
}

#[tokio::test]
async fn test_rebuild_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let store = Store::new(temp.path());
    seed(&store, &sample_ideas(date("2025-07-20"), 30)).await;
    let pipeline = Pipeline::new(temp.path(), Generator::offline(), site());

    let first = pipeline.rebuild_feeds().await.unwrap();
    let snapshot: Vec<(std::path::PathBuf, Vec<u8>)> = first
        .written
        .iter()
        .map(|p| (p.clone(), fs::read(p).unwrap()))
        .collect();
    assert_eq!(snapshot.len(), feeds::builders().len());

    pipeline.rebuild_feeds().await.unwrap();
    for (path, bytes) in snapshot {
        assert_eq!(fs::read(&path).unwrap(), bytes, "{} changed", path.display());
    }
}

#[tokio::test]
async fn test_rss_is_newest_first_and_capped() {
    let temp = TempDir::new().unwrap();
    let store = Store::new(temp.path());
    seed(&store, &sample_ideas(date("2025-06-01"), 40)).await;
    let pipeline = Pipeline::new(temp.path(), Generator::offline(), site());
    pipeline.rebuild_feeds().await.unwrap();

    let xml = fs::read_to_string(temp.path().join("docs/feed.xml")).unwrap();
    let dates: Vec<chrono::DateTime<chrono::FixedOffset>> = xml
        .lines()
        .filter_map(|l| l.strip_prefix("<pubDate>")?.strip_suffix("</pubDate>"))
        .map(|d| chrono::DateTime::parse_from_rfc2822(d).unwrap())
        .collect();

    assert_eq!(dates.len(), 20);
    assert!(dates.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_run_after_lock_release_rebuilds_feeds() {
    let temp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(temp.path(), Generator::offline(), site());

    {
        let _held = pipeline.store().lock().await.unwrap();
        assert!(pipeline.run(date("2025-08-10")).await.is_err());
    }
    let report = pipeline.run(date("2025-08-10")).await.unwrap();
    assert!(report.feeds.is_success());
    assert!(temp.path().join("docs/latest.json").exists());
}

// =============================================================================
// Backfill
// =============================================================================

#[tokio::test]
async fn test_backfill_one_entry_per_date() {
    let temp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(temp.path(), Generator::offline(), site());
    pipeline.run(date("2025-08-03")).await.unwrap();

    let report = pipeline
        .backfill(date("2025-08-01"), date("2025-08-05"))
        .await
        .unwrap();
    assert!(report.is_success());
    assert_eq!(report.appended.len(), 4);
    assert_eq!(report.already_recorded, vec![date("2025-08-03")]);

    let stored = pipeline.store().load().await.unwrap();
    let dates: Vec<NaiveDate> = stored.iter().map(|i| i.date).collect();
    assert_eq!(
        dates,
        vec![
            date("2025-08-01"),
            date("2025-08-02"),
            date("2025-08-03"),
            date("2025-08-04"),
            date("2025-08-05"),
        ]
    );
    let slugs: std::collections::HashSet<&str> = stored.iter().map(|i| i.slug.as_str()).collect();
    assert_eq!(slugs.len(), stored.len());
}

#[tokio::test]
async fn test_backfill_reports_failed_dates() {
    let temp = TempDir::new().unwrap();
    let backend = MockBackend::scripted(
        Source::Offline,
        vec![
            Ok(Draft::new("First Idea", "One.", vec![])),
            Err("backend down".into()),
            Ok(Draft::new("Third Idea", "Three.", vec![])),
        ],
    );
    let pipeline = Pipeline::new(temp.path(), Generator::new(vec![Box::new(backend)]), site());

    let report = pipeline
        .backfill(date("2025-08-01"), date("2025-08-03"))
        .await
        .unwrap();
    assert!(!report.is_success());
    assert_eq!(report.appended.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].date, date("2025-08-02"));
    assert!(temp.path().join("docs/latest.json").exists());
}
