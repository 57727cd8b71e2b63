//! SQLite storage layer for the snapshot store.
//!
//! Schema:
//! - `snapshots` table: one row per repository per fetch, with a unique
//!   index on (repo_name, day) so a re-fetch of the same calendar day
//!   replaces the earlier row (most recently fetched wins).
//!
//! Metric columns are nullable: a NULL means the fetcher could not
//! produce that value, and it stays absent through the whole pipeline.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use thiserror::Error;

use super::models::{MetricKind, MetricValues, Snapshot};

/// Errors from the snapshot store. Store unavailability is the only
/// condition the rest of the application treats as fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open snapshot store at {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to create store directory for {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot store query failed")]
    Query(#[from] rusqlite::Error),
    #[error("invalid timestamp in store: {0}")]
    BadTimestamp(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS snapshots (
    id            INTEGER PRIMARY KEY,
    repo_name     TEXT NOT NULL,
    project_name  TEXT NOT NULL DEFAULT '',
    date_fetched  TEXT NOT NULL,
    day           TEXT NOT NULL,
    stars         INTEGER,
    forks         INTEGER,
    watchers      INTEGER,
    contributors  INTEGER,
    size          INTEGER,
    open_issues   INTEGER,
    closed_issues INTEGER,
    open_prs      INTEGER,
    closed_prs    INTEGER,
    UNIQUE (repo_name, day)
);
CREATE INDEX IF NOT EXISTS idx_snapshots_repo_date
    ON snapshots (repo_name, date_fetched);
";

/// Parse a stored RFC3339 timestamp
fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::BadTimestamp(raw.to_string()))
}

/// Read one snapshot row (column order per `SELECT_COLUMNS`)
fn snapshot_from_row(row: &Row) -> rusqlite::Result<(String, String, String, MetricValues)> {
    let repo_name: String = row.get(0)?;
    let project_name: String = row.get(1)?;
    let date_fetched: String = row.get(2)?;

    let mut values = MetricValues::default();
    for (i, kind) in MetricKind::ALL.into_iter().enumerate() {
        let raw: Option<i64> = row.get(3 + i)?;
        values.set(kind, raw.and_then(|v| u64::try_from(v).ok()));
    }
    Ok((repo_name, project_name, date_fetched, values))
}

const SELECT_COLUMNS: &str = "repo_name, project_name, date_fetched, \
     stars, forks, watchers, contributors, size, \
     open_issues, closed_issues, open_prs, closed_prs";

/// Handle to the snapshot store. Constructed once by the calling process
/// and passed to whatever needs it; no global connections.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (creating if necessary) the store at `path` and ensure the
    /// schema exists.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.execute_batch(SCHEMA)?;
        Ok(Storage { conn })
    }

    /// In-memory store, used by tests
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Storage { conn })
    }

    /// Append a batch of snapshots. A snapshot for a (repo, day) pair
    /// that already exists replaces the stored row only when it was
    /// fetched at the same time or later. Returns the number of rows
    /// written.
    pub fn append_snapshots(&self, snapshots: &[Snapshot]) -> StoreResult<usize> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO snapshots (repo_name, project_name, date_fetched, day, \
                 stars, forks, watchers, contributors, size, \
                 open_issues, closed_issues, open_prs, closed_prs) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
             ON CONFLICT (repo_name, day) DO UPDATE SET \
                 project_name = excluded.project_name, \
                 date_fetched = excluded.date_fetched, \
                 stars = excluded.stars, \
                 forks = excluded.forks, \
                 watchers = excluded.watchers, \
                 contributors = excluded.contributors, \
                 size = excluded.size, \
                 open_issues = excluded.open_issues, \
                 closed_issues = excluded.closed_issues, \
                 open_prs = excluded.open_prs, \
                 closed_prs = excluded.closed_prs \
             WHERE excluded.date_fetched >= snapshots.date_fetched",
        )?;

        let mut written = 0;
        for snap in snapshots {
            let v = &snap.values;
            written += stmt.execute(params![
                snap.repo_name,
                snap.project_name,
                snap.date_fetched.to_rfc3339(),
                snap.day().to_string(),
                v.stars.map(|n| n as i64),
                v.forks.map(|n| n as i64),
                v.watchers.map(|n| n as i64),
                v.contributors.map(|n| n as i64),
                v.size.map(|n| n as i64),
                v.open_issues.map(|n| n as i64),
                v.closed_issues.map(|n| n as i64),
                v.open_prs.map(|n| n as i64),
                v.closed_prs.map(|n| n as i64),
            ])?;
        }
        Ok(written)
    }

    /// Load the full cohort, ordered by fetch time
    pub fn load_cohort(&self) -> StoreResult<Vec<Snapshot>> {
        let sql =
            format!("SELECT {SELECT_COLUMNS} FROM snapshots ORDER BY date_fetched, repo_name");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], snapshot_from_row)?;

        let mut snapshots = Vec::new();
        for row in rows {
            let (repo_name, project_name, raw_date, values) = row?;
            snapshots.push(Snapshot {
                repo_name,
                project_name,
                date_fetched: parse_timestamp(&raw_date)?,
                values,
            });
        }
        Ok(snapshots)
    }

    /// Load the cohort filtered to a set of repositories. Repositories
    /// with no stored snapshots simply contribute nothing.
    pub fn load_cohort_for(&self, repos: &[String]) -> StoreResult<Vec<Snapshot>> {
        if repos.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; repos.len()].join(", ");
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM snapshots \
             WHERE repo_name IN ({placeholders}) \
             ORDER BY date_fetched, repo_name"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(repos.iter()), snapshot_from_row)?;

        let mut snapshots = Vec::new();
        for row in rows {
            let (repo_name, project_name, raw_date, values) = row?;
            snapshots.push(Snapshot {
                repo_name,
                project_name,
                date_fetched: parse_timestamp(&raw_date)?,
                values,
            });
        }
        Ok(snapshots)
    }

    /// Distinct repository names, sorted
    pub fn list_repos(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT repo_name FROM snapshots ORDER BY repo_name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Timestamp of the most recent fetch across the whole store
    pub fn latest_fetch_date(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT MAX(date_fetched) FROM snapshots", [], |row| {
                row.get(0)
            })?;
        match raw {
            Some(raw) => parse_timestamp(&raw).map(Some),
            None => Ok(None),
        }
    }
}
