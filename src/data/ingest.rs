//! Batch ingestion of snapshot documents into the store.
//!
//! The external fetcher emits one JSON document per repository per run,
//! with the fields of [`Snapshot`]. This module accepts either a JSON
//! array of such documents or newline-delimited documents, skipping
//! whatever cannot be attributed to a repository.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::models::{MetricValues, Snapshot};
use super::storage::Storage;

/// Outcome of one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents written to the store
    pub appended: usize,
    /// Documents dropped (unparseable, or missing `repo_name`)
    pub skipped: usize,
}

/// Raw document shape as written by the fetcher. Everything except the
/// repository name is optional.
#[derive(Debug, Deserialize)]
struct SnapshotDoc {
    repo_name: Option<String>,
    #[serde(default)]
    project_name: String,
    date_fetched: Option<String>,
    #[serde(flatten)]
    values: MetricValues,
}

impl SnapshotDoc {
    fn into_snapshot(self, default_date: DateTime<Utc>) -> Option<Snapshot> {
        let repo_name = self.repo_name.filter(|name| !name.is_empty())?;
        let date_fetched = self
            .date_fetched
            .as_deref()
            .and_then(parse_document_date)
            .unwrap_or(default_date);
        Some(Snapshot {
            repo_name,
            project_name: self.project_name,
            date_fetched,
            values: self.values,
        })
    }
}

/// Parse a document timestamp, tolerating the naive UTC format the
/// fetcher historically wrote alongside RFC3339.
fn parse_document_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Parse a batch of documents. Returns the usable snapshots and the
/// count of documents that were dropped.
pub fn parse_documents(input: &str, default_date: DateTime<Utc>) -> (Vec<Snapshot>, usize) {
    let docs: Vec<serde_json::Value> = match serde_json::from_str(input) {
        // A single top-level array of documents
        Ok(serde_json::Value::Array(items)) => items,
        // A single document
        Ok(value @ serde_json::Value::Object(_)) => vec![value],
        // Fall back to newline-delimited documents
        _ => input
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).unwrap_or(serde_json::Value::Null))
            .collect(),
    };

    let mut snapshots = Vec::new();
    let mut skipped = 0;
    for doc in docs {
        let parsed = serde_json::from_value::<SnapshotDoc>(doc)
            .ok()
            .and_then(|doc| doc.into_snapshot(default_date));
        match parsed {
            Some(snapshot) => snapshots.push(snapshot),
            None => skipped += 1,
        }
    }
    (snapshots, skipped)
}

/// Read a JSON export and append its documents to the store.
pub fn ingest_file(storage: &Storage, path: &Path) -> Result<IngestReport> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read ingest file: {path:?}"))?;
    let (snapshots, skipped) = parse_documents(&input, Utc::now());
    let appended = storage
        .append_snapshots(&snapshots)
        .context("failed to write snapshots to the store")?;
    Ok(IngestReport { appended, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn default_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 7, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_array_of_documents() {
        let input = r#"[
            {"repo_name": "a/one", "project_name": "One", "stars": 10,
             "forks": 2, "date_fetched": "2024-10-07T06:00:00Z"},
            {"repo_name": "b/two", "stars": 5}
        ]"#;
        let (snaps, skipped) = parse_documents(input, default_date());
        assert_eq!(snaps.len(), 2);
        assert_eq!(skipped, 0);
        assert_eq!(snaps[0].repo_name, "a/one");
        assert_eq!(snaps[0].values.forks, Some(2));
        // Missing date falls back to the ingestion time
        assert_eq!(snaps[1].date_fetched, default_date());
        assert_eq!(snaps[1].project_name, "");
    }

    #[test]
    fn test_parse_newline_delimited_documents() {
        let input = "{\"repo_name\": \"a/one\", \"stars\": 1}\n\
                     {\"repo_name\": \"b/two\", \"stars\": 2}\n";
        let (snaps, skipped) = parse_documents(input, default_date());
        assert_eq!(snaps.len(), 2);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_documents_without_repo_name_are_skipped_and_counted() {
        let input = r#"[
            {"repo_name": "a/one", "stars": 1},
            {"project_name": "orphan", "stars": 2},
            {"repo_name": "", "stars": 3},
            "not an object"
        ]"#;
        let (snaps, skipped) = parse_documents(input, default_date());
        assert_eq!(snaps.len(), 1);
        assert_eq!(skipped, 3);
    }

    #[test]
    fn test_naive_timestamp_is_accepted() {
        let input = r#"{"repo_name": "a/one", "date_fetched": "2024-10-08T06:30:00.123456"}"#;
        let (snaps, _) = parse_documents(input, default_date());
        assert_eq!(snaps.len(), 1);
        assert_eq!(
            snaps[0].day(),
            chrono::NaiveDate::from_ymd_opt(2024, 10, 8).unwrap()
        );
    }

    #[test]
    fn test_ingest_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("export.json");
        std::fs::write(
            &input_path,
            r#"[{"repo_name": "a/one", "stars": 10}, {"stars": 3}]"#,
        )
        .unwrap();

        let storage = Storage::open_in_memory().unwrap();
        let report = ingest_file(&storage, &input_path).unwrap();
        assert_eq!(report, IngestReport { appended: 1, skipped: 1 });
        assert_eq!(storage.list_repos().unwrap(), vec!["a/one"]);
    }
}
