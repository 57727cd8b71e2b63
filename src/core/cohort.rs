//! In-memory cohort of snapshots, organized per repository.
//!
//! The cohort is loaded once per render cycle and every ranking view is
//! derived from it; it never mutates after construction.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::data::Snapshot;

/// All snapshots under consideration, deduplicated to one per
/// (repository, calendar day) and ordered by fetch time per repository.
///
/// Repositories iterate in name order, which keeps every derived
/// computation deterministic for a fixed snapshot set.
#[derive(Debug, Default)]
pub struct Cohort {
    series: BTreeMap<String, Vec<Snapshot>>,
}

impl Cohort {
    /// Build a cohort from raw store output. Duplicate snapshots for the
    /// same (repo, day) collapse to the most recently fetched one.
    pub fn from_snapshots(snapshots: Vec<Snapshot>) -> Self {
        let mut by_day: BTreeMap<String, BTreeMap<NaiveDate, Snapshot>> = BTreeMap::new();
        for snap in snapshots {
            let per_day = by_day.entry(snap.repo_name.clone()).or_default();
            match per_day.entry(snap.day()) {
                Entry::Vacant(slot) => {
                    slot.insert(snap);
                }
                Entry::Occupied(mut slot) => {
                    if snap.date_fetched >= slot.get().date_fetched {
                        slot.insert(snap);
                    }
                }
            }
        }

        let series = by_day
            .into_iter()
            .map(|(repo, per_day)| (repo, per_day.into_values().collect()))
            .collect();
        Cohort { series }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn repo_count(&self) -> usize {
        self.series.len()
    }

    /// Repository names in sorted order
    pub fn repo_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// A repository's snapshots, ordered by fetch time ascending
    pub fn series(&self, repo: &str) -> Option<&[Snapshot]> {
        self.series.get(repo).map(Vec::as_slice)
    }

    /// A repository's most recent snapshot
    pub fn latest(&self, repo: &str) -> Option<&Snapshot> {
        self.series.get(repo).and_then(|s| s.last())
    }

    /// Latest snapshot of every repository, in repository-name order
    pub fn latest_snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.series.values().filter_map(|s| s.last())
    }

    /// Number of fetch cycles recorded for the longest-tracked repository
    pub fn max_cycles(&self) -> usize {
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{TimeZone, Utc};

    use crate::data::{MetricKind, MetricValues, Snapshot};

    use super::Cohort;

    /// Snapshot with only `stars` set, on day `d` of October 2024
    pub fn star_snap(repo: &str, d: u32, stars: u64) -> Snapshot {
        let mut values = MetricValues::default();
        values.set(MetricKind::Stars, Some(stars));
        Snapshot {
            repo_name: repo.to_string(),
            project_name: repo.to_string(),
            date_fetched: Utc.with_ymd_and_hms(2024, 10, d, 6, 0, 0).unwrap(),
            values,
        }
    }

    /// Cohort with one repo per entry, each carrying a `stars` series
    /// over consecutive days starting 2024-10-01
    pub fn star_cohort(repos: &[(&str, &[u64])]) -> Cohort {
        let mut snapshots = Vec::new();
        for (repo, series) in repos {
            for (i, &stars) in series.iter().enumerate() {
                snapshots.push(star_snap(repo, i as u32 + 1, stars));
            }
        }
        Cohort::from_snapshots(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::test_support::{star_cohort, star_snap};
    use super::*;

    #[test]
    fn test_series_ordered_by_date() {
        let cohort = Cohort::from_snapshots(vec![
            star_snap("a/one", 3, 30),
            star_snap("a/one", 1, 10),
            star_snap("a/one", 2, 20),
        ]);
        let series = cohort.series("a/one").unwrap();
        let stars: Vec<_> = series.iter().map(|s| s.values.stars).collect();
        assert_eq!(stars, vec![Some(10), Some(20), Some(30)]);
        assert_eq!(cohort.latest("a/one").unwrap().values.stars, Some(30));
    }

    #[test]
    fn test_same_day_duplicates_keep_most_recent_fetch() {
        let mut early = star_snap("a/one", 1, 10);
        early.date_fetched = Utc.with_ymd_and_hms(2024, 10, 1, 6, 0, 0).unwrap();
        let mut late = star_snap("a/one", 1, 12);
        late.date_fetched = Utc.with_ymd_and_hms(2024, 10, 1, 18, 0, 0).unwrap();

        // Insertion order must not matter
        let cohort = Cohort::from_snapshots(vec![late.clone(), early.clone()]);
        assert_eq!(cohort.series("a/one").unwrap().len(), 1);
        assert_eq!(cohort.latest("a/one").unwrap().values.stars, Some(12));

        let cohort = Cohort::from_snapshots(vec![early, late]);
        assert_eq!(cohort.latest("a/one").unwrap().values.stars, Some(12));
    }

    #[test]
    fn test_repo_names_sorted() {
        let cohort = star_cohort(&[("b/two", &[1]), ("a/one", &[2]), ("c/three", &[3])]);
        let names: Vec<_> = cohort.repo_names().collect();
        assert_eq!(names, vec!["a/one", "b/two", "c/three"]);
        assert_eq!(cohort.repo_count(), 3);
    }

    #[test]
    fn test_empty_cohort() {
        let cohort = Cohort::from_snapshots(Vec::new());
        assert!(cohort.is_empty());
        assert_eq!(cohort.max_cycles(), 0);
        assert!(cohort.series("a/one").is_none());
        assert!(cohort.latest_snapshots().next().is_none());
    }

    #[test]
    fn test_max_cycles() {
        let cohort = star_cohort(&[("a/one", &[1, 2, 3]), ("b/two", &[1])]);
        assert_eq!(cohort.max_cycles(), 3);
    }
}
