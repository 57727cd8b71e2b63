//! Timeline and comparison projections for chart rendering.

use chrono::{DateTime, Utc};

use crate::core::cohort::Cohort;
use crate::data::{MetricKind, MetricValues};

/// One repository's metric history, one series per metric, ordered by
/// fetch date ascending. Ready for direct line-chart rendering; a
/// single-snapshot repository yields single-point series.
#[derive(Debug, Clone)]
pub struct Timeline {
    pub repo_name: String,
    /// Aligned with [`MetricKind::ALL`]; days where a metric was absent
    /// are simply not in its series.
    pub series: Vec<(MetricKind, Vec<(DateTime<Utc>, u64)>)>,
}

/// Project one repository's history, or `None` if the cohort has never
/// seen the repository.
pub fn timeline(cohort: &Cohort, repo: &str) -> Option<Timeline> {
    let snapshots = cohort.series(repo)?;
    let series = MetricKind::ALL
        .into_iter()
        .map(|metric| {
            let points = snapshots
                .iter()
                .filter_map(|s| s.values.get(metric).map(|v| (s.date_fetched, v)))
                .collect();
            (metric, points)
        })
        .collect();
    Some(Timeline {
        repo_name: repo.to_string(),
        series,
    })
}

/// One repository's latest metric vector, normalized for spoke/bar
/// rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub repo_name: String,
    pub raw: MetricValues,
    /// Latest value divided by the cohort maximum per metric, aligned
    /// with [`MetricKind::ALL`]. Absent values and all-zero metrics
    /// resolve to 0.0.
    pub normalized: [f64; 9],
}

/// Latest metric vectors for a requested repository set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    pub rows: Vec<ComparisonRow>,
    /// Requested repositories that do not exist in the cohort
    pub skipped: usize,
}

/// Juxtapose the latest snapshots of the requested repositories,
/// normalized to the cohort-wide maximum of each metric. Unknown
/// repositories are skipped and counted, never a failure.
pub fn comparison(cohort: &Cohort, repos: &[String]) -> Comparison {
    // Cohort-wide maxima give every requested repo the same scale
    let mut maxima = [0u64; 9];
    for snap in cohort.latest_snapshots() {
        for (slot, metric) in maxima.iter_mut().zip(MetricKind::ALL) {
            if let Some(v) = snap.values.get(metric) {
                *slot = (*slot).max(v);
            }
        }
    }

    let mut result = Comparison::default();
    for repo in repos {
        let Some(snap) = cohort.latest(repo) else {
            result.skipped += 1;
            continue;
        };
        let mut normalized = [0.0; 9];
        for (i, metric) in MetricKind::ALL.into_iter().enumerate() {
            let max = maxima[i];
            if max > 0 {
                if let Some(v) = snap.values.get(metric) {
                    normalized[i] = v as f64 / max as f64;
                }
            }
        }
        result.rows.push(ComparisonRow {
            repo_name: repo.clone(),
            raw: snap.values,
            normalized,
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cohort::test_support::{star_cohort, star_snap};

    #[test]
    fn test_timeline_orders_points_by_date() {
        let cohort = star_cohort(&[("a", &[10, 15, 20])]);
        let tl = timeline(&cohort, "a").unwrap();
        let stars = &tl.series[MetricKind::Stars.index()].1;
        let values: Vec<u64> = stars.iter().map(|&(_, v)| v).collect();
        assert_eq!(values, vec![10, 15, 20]);
        assert!(stars.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_timeline_single_snapshot_is_single_point() {
        let cohort = star_cohort(&[("c", &[42])]);
        let tl = timeline(&cohort, "c").unwrap();
        let stars = &tl.series[MetricKind::Stars.index()].1;
        assert_eq!(stars.len(), 1);
        assert_eq!(stars[0].1, 42);
        // Metrics never reported have empty series, not errors
        assert!(tl.series[MetricKind::Forks.index()].1.is_empty());
    }

    #[test]
    fn test_timeline_unknown_repo_is_none() {
        let cohort = star_cohort(&[("a", &[1])]);
        assert!(timeline(&cohort, "z/missing").is_none());
    }

    #[test]
    fn test_comparison_skips_missing_repos() {
        let cohort = star_cohort(&[("a", &[10]), ("b", &[20])]);
        let requested = vec!["a".to_string(), "b".to_string(), "z".to_string()];
        let cmp = comparison(&cohort, &requested);
        assert_eq!(cmp.rows.len(), 2);
        assert_eq!(cmp.skipped, 1);
        let names: Vec<_> = cmp.rows.iter().map(|r| r.repo_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_comparison_normalizes_to_cohort_maximum() {
        let cohort = star_cohort(&[("a", &[10]), ("b", &[40])]);
        let cmp = comparison(&cohort, &["a".to_string(), "b".to_string()]);
        let star_idx = MetricKind::Stars.index();
        assert_eq!(cmp.rows[0].normalized[star_idx], 0.25);
        assert_eq!(cmp.rows[1].normalized[star_idx], 1.0);
        // Metrics absent everywhere normalize to the 0.0 sentinel
        assert_eq!(cmp.rows[0].normalized[MetricKind::Forks.index()], 0.0);
    }

    #[test]
    fn test_comparison_zero_maximum_is_sentinel_zero() {
        let cohort = Cohort::from_snapshots(vec![star_snap("a", 1, 0), star_snap("b", 1, 0)]);
        let cmp = comparison(&cohort, &["a".to_string()]);
        assert_eq!(cmp.rows[0].normalized[MetricKind::Stars.index()], 0.0);
    }

    #[test]
    fn test_comparison_empty_request() {
        let cohort = star_cohort(&[("a", &[1])]);
        let cmp = comparison(&cohort, &[]);
        assert!(cmp.rows.is_empty());
        assert_eq!(cmp.skipped, 0);
    }
}
