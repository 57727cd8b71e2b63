//! Data models for repository metric snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of metrics tracked for every repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Stars,
    Forks,
    Watchers,
    Contributors,
    Size,
    OpenIssues,
    ClosedIssues,
    OpenPrs,
    ClosedPrs,
}

impl MetricKind {
    /// Canonical ordering used for iteration everywhere. Keeping a single
    /// order makes composite scores reproducible across runs.
    pub const ALL: [MetricKind; 9] = [
        MetricKind::Stars,
        MetricKind::Forks,
        MetricKind::Watchers,
        MetricKind::Contributors,
        MetricKind::Size,
        MetricKind::OpenIssues,
        MetricKind::ClosedIssues,
        MetricKind::OpenPrs,
        MetricKind::ClosedPrs,
    ];

    /// Column/field name, matching the ingest document schema
    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Stars => "stars",
            MetricKind::Forks => "forks",
            MetricKind::Watchers => "watchers",
            MetricKind::Contributors => "contributors",
            MetricKind::Size => "size",
            MetricKind::OpenIssues => "open_issues",
            MetricKind::ClosedIssues => "closed_issues",
            MetricKind::OpenPrs => "open_prs",
            MetricKind::ClosedPrs => "closed_prs",
        }
    }

    /// Human-readable name for titles and table headers
    pub fn display_name(self) -> &'static str {
        match self {
            MetricKind::Stars => "Stars",
            MetricKind::Forks => "Forks",
            MetricKind::Watchers => "Watchers",
            MetricKind::Contributors => "Contributors",
            MetricKind::Size => "Size",
            MetricKind::OpenIssues => "Open issues",
            MetricKind::ClosedIssues => "Closed issues",
            MetricKind::OpenPrs => "Open PRs",
            MetricKind::ClosedPrs => "Closed PRs",
        }
    }

    /// Position in [`MetricKind::ALL`]
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&m| m == self).unwrap_or(0)
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One value slot per tracked metric. `None` means the fetcher could not
/// produce the value; metrics are never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricValues {
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub watchers: Option<u64>,
    pub contributors: Option<u64>,
    pub size: Option<u64>,
    pub open_issues: Option<u64>,
    pub closed_issues: Option<u64>,
    pub open_prs: Option<u64>,
    pub closed_prs: Option<u64>,
}

impl MetricValues {
    pub fn get(&self, kind: MetricKind) -> Option<u64> {
        match kind {
            MetricKind::Stars => self.stars,
            MetricKind::Forks => self.forks,
            MetricKind::Watchers => self.watchers,
            MetricKind::Contributors => self.contributors,
            MetricKind::Size => self.size,
            MetricKind::OpenIssues => self.open_issues,
            MetricKind::ClosedIssues => self.closed_issues,
            MetricKind::OpenPrs => self.open_prs,
            MetricKind::ClosedPrs => self.closed_prs,
        }
    }

    pub fn set(&mut self, kind: MetricKind, value: Option<u64>) {
        let slot = match kind {
            MetricKind::Stars => &mut self.stars,
            MetricKind::Forks => &mut self.forks,
            MetricKind::Watchers => &mut self.watchers,
            MetricKind::Contributors => &mut self.contributors,
            MetricKind::Size => &mut self.size,
            MetricKind::OpenIssues => &mut self.open_issues,
            MetricKind::ClosedIssues => &mut self.closed_issues,
            MetricKind::OpenPrs => &mut self.open_prs,
            MetricKind::ClosedPrs => &mut self.closed_prs,
        };
        *slot = value;
    }
}

/// One fetch event for one repository on one day.
///
/// Snapshots are immutable once recorded: the ingestion collaborator
/// appends one per repository per scheduled run, and everything else
/// derives from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stable identifier, "owner/repo"
    pub repo_name: String,
    pub project_name: String,
    pub date_fetched: DateTime<Utc>,
    #[serde(flatten)]
    pub values: MetricValues,
}

impl Snapshot {
    /// Calendar day of the fetch; at most one snapshot per (repo, day)
    /// is meaningful for gain computation.
    pub fn day(&self) -> NaiveDate {
        self.date_fetched.date_naive()
    }
}
