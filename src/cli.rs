//! Command-line interface for starboard.
//!
//! - `starboard show` launches the TUI dashboard
//! - `starboard ingest export.json` appends fetcher output to the store

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// A terminal dashboard for open-source contribution program
/// leaderboards: daily gainers, composite rankings, and per-repository
/// trends over ingested GitHub metric snapshots.
#[derive(Parser, Debug)]
#[command(name = "starboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the TUI dashboard
    Show {
        /// Restrict the dashboard to a comma-separated repository list
        /// (default: the full cohort)
        #[arg(long)]
        repos: Option<String>,

        /// How many rows the composite leaderboard shows
        #[arg(short = 'n', long, default_value = "10")]
        top_n: usize,

        /// Cohort reload interval in seconds (bounded staleness)
        #[arg(short, long, default_value = "60")]
        interval: u64,

        /// Path to the snapshot database
        /// Defaults to ~/.local/share/starboard/starboard.db
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Append snapshot documents from a JSON export into the store
    Ingest {
        /// JSON file: an array of snapshot documents, or one document
        /// per line
        input: PathBuf,

        /// Path to the snapshot database
        #[arg(long)]
        db_path: Option<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Resolve the snapshot database location: explicit flag, then the
/// STARBOARD_DB environment variable, then the platform data directory.
pub fn resolve_db_path(flag: Option<String>) -> PathBuf {
    flag.map(PathBuf::from)
        .or_else(|| std::env::var("STARBOARD_DB").ok().map(PathBuf::from))
        .unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("starboard")
                .join("starboard.db")
        })
}

/// Configuration for the dashboard, derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Repositories to restrict the cohort to; empty means everything
    pub repos: Vec<String>,
    pub top_n: usize,
    pub refresh_interval_secs: u64,
    pub db_path: PathBuf,
}

impl AppConfig {
    pub fn from_show_command(
        repos: Option<String>,
        top_n: usize,
        interval: u64,
        db_path: Option<String>,
    ) -> Self {
        let repos = repos
            .map(|list| {
                list.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        AppConfig {
            repos,
            top_n,
            refresh_interval_secs: interval,
            db_path: resolve_db_path(db_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::from_show_command(None, 10, 60, None);
        assert!(config.repos.is_empty());
        assert_eq!(config.top_n, 10);
        assert_eq!(config.refresh_interval_secs, 60);
    }

    #[test]
    fn test_repo_list_parsing() {
        let config = AppConfig::from_show_command(
            Some("owner/one, owner/two,,owner/three".to_string()),
            5,
            60,
            None,
        );
        assert_eq!(config.repos, vec!["owner/one", "owner/two", "owner/three"]);
    }

    #[test]
    fn test_explicit_db_path_wins() {
        let config = AppConfig::from_show_command(None, 10, 60, Some("/tmp/x.db".to_string()));
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
    }
}
