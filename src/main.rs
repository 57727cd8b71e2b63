//! starboard: a terminal dashboard for open-source contribution
//! program leaderboards.
//!
//! Daily snapshots of repository metrics (stars, forks, contributors,
//! issue and PR counts) are ingested into a local store; the dashboard
//! ranks gainers, composite scores, and trends over them.

mod app;
mod cli;
mod core;
mod data;
mod ui;

use anyhow::Result;
use cli::{resolve_db_path, AppConfig, Cli, Commands};
use data::Storage;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Show {
            repos,
            top_n,
            interval,
            db_path,
        } => {
            let config = AppConfig::from_show_command(repos, top_n, interval, db_path);
            app::run(config)?;
        }
        Commands::Ingest { input, db_path } => {
            let storage = Storage::open(&resolve_db_path(db_path))?;
            let report = data::ingest_file(&storage, &input)?;
            println!(
                "Ingested {} snapshot(s), skipped {} document(s)",
                report.appended, report.skipped
            );
        }
    }

    Ok(())
}
