//! Command-line definitions.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "heartbeat",
    version = env!("CARGO_PKG_VERSION"),
    about = "Append one generated repository idea per day and rebuild the published feeds."
)]
pub struct Cli {
    /// Repository root holding `ideas/` and `docs/`.
    #[clap(long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record today's idea (or --date) and rebuild feeds
    Run {
        /// Target date, YYYY-MM-DD. Defaults to today (UTC).
        #[clap(long, env = "FORCE_DATE")]
        date: Option<NaiveDate>,
        /// Skip the repository name search
        #[clap(long)]
        no_namespace_check: bool,
    },
    /// Record every date from START to END inclusive, then rebuild feeds
    Backfill {
        start: NaiveDate,
        end: NaiveDate,
        /// Skip the repository name search
        #[clap(long)]
        no_namespace_check: bool,
    },
    /// Rebuild derived artifacts from the log
    Feeds,
    /// Check docs/latest.json against the idea shape
    CheckLatest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_date() {
        let cli = Cli::try_parse_from(["heartbeat", "run", "--date", "2025-08-10"]).unwrap();
        match cli.command {
            Command::Run {
                date,
                no_namespace_check,
            } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 8, 10));
                assert!(!no_namespace_check);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.root, PathBuf::from("."));
    }

    #[test]
    fn test_parse_backfill_and_root() {
        let cli = Cli::try_parse_from([
            "heartbeat",
            "backfill",
            "2025-08-01",
            "2025-08-07",
            "--no-namespace-check",
            "--root",
            "/tmp/site",
        ])
        .unwrap();
        assert_eq!(cli.root, PathBuf::from("/tmp/site"));
        assert!(matches!(
            cli.command,
            Command::Backfill {
                no_namespace_check: true,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_date_is_usage_error() {
        let err = Cli::try_parse_from(["heartbeat", "backfill", "2025-13-01", "2025-08-07"])
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_check_latest_subcommand_name() {
        let cli = Cli::try_parse_from(["heartbeat", "check-latest"]).unwrap();
        assert!(matches!(cli.command, Command::CheckLatest));
    }
}
