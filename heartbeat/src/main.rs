//! Daily idea log command-line tool.
//!
//! Backends and namespace search are configured from the environment;
//! `local.env` and `.env` in the working directory are loaded first.
//!
//! ```bash
//! heartbeat run                      # today's idea, then rebuild docs/
//! heartbeat run --date 2025-08-10
//! heartbeat backfill 2025-08-01 2025-08-07
//! heartbeat feeds
//! heartbeat check-latest
//! ```

mod cli;

use anyhow::Context;
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use heartbeat_core::{Config, FeedReport, Outcome, Pipeline, PipelineError};
use log::{error, info, warn};
use std::process::ExitCode;

use cli::{Cli, Command};

const USAGE_ERROR: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Existing variables win over both files.
    dotenvy::from_filename("local.env").ok();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let _logger = match init_logging() {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Human-readable log lines on stderr; level from RUST_LOG, default info.
fn init_logging() -> anyhow::Result<LoggerHandle> {
    Logger::try_with_env_or_str("info")
        .context("invalid RUST_LOG")?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .context("failed to start logger")
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::from_env();

    match cli.command {
        Command::Run {
            date,
            no_namespace_check,
        } => {
            let config = if no_namespace_check {
                config.without_namespace_check()
            } else {
                config
            };
            let date = date.unwrap_or_else(|| chrono::Utc::now().date_naive());
            let pipeline = Pipeline::from_config(&cli.root, &config);

            let report = pipeline
                .run(date)
                .await
                .with_context(|| format!("no idea recorded for {date}"))?;
            match &report.outcome {
                Outcome::Appended(idea) => println!(
                    "{}: {} ({}, {})",
                    idea.date, idea.concept, idea.repo_name, idea.source
                ),
                Outcome::AlreadyRecorded => println!("{date}: already recorded"),
            }
            Ok(feeds_exit_code(&report.feeds))
        }

        Command::Backfill {
            start,
            end,
            no_namespace_check,
        } => {
            let config = if no_namespace_check {
                config.without_namespace_check()
            } else {
                config
            };
            let pipeline = Pipeline::from_config(&cli.root, &config);

            let report = match pipeline.backfill(start, end).await {
                Ok(report) => report,
                Err(e @ PipelineError::InvalidRange { .. }) => {
                    eprintln!("Error: {e}");
                    return Ok(ExitCode::from(USAGE_ERROR));
                }
                Err(e) => return Err(e).context("backfill aborted"),
            };

            for idea in &report.appended {
                println!("{}: {} ({})", idea.date, idea.concept, idea.source);
            }
            for failure in &report.failed {
                warn!("{}: {}", failure.date, failure.error);
            }
            if report.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }

        Command::Feeds => {
            let pipeline = Pipeline::from_config(&cli.root, &config);
            let report = pipeline
                .rebuild_feeds()
                .await
                .context("feed rebuild aborted")?;
            Ok(feeds_exit_code(&report))
        }

        Command::CheckLatest => {
            let pipeline = Pipeline::from_config(&cli.root, &config.without_namespace_check());
            match pipeline.check_latest().await? {
                Some(idea) => println!("latest.json is valid ({})", idea.date),
                None => info!("latest.json not found; nothing to check"),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn feeds_exit_code(report: &FeedReport) -> ExitCode {
    if report.is_success() {
        return ExitCode::SUCCESS;
    }
    for failure in &report.failed {
        error!("{} not rebuilt: {}", failure.name, failure.error);
    }
    ExitCode::FAILURE
}
