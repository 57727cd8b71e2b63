//! Percentile ranking and weighted composite scoring.
//!
//! Percentiles use fractional (average) ranks: tied values share the
//! mean of their 1-based ranks, normalized by the number of ranked
//! repositories, so the maximum value always lands at 1.0.

use crate::core::cohort::Cohort;
use crate::data::MetricKind;

/// Combined weight of the high-importance (contribution-depth) group
pub const HIGH_GROUP_WEIGHT: f64 = 0.7;
/// Combined weight of the low-importance (popularity) group
pub const LOW_GROUP_WEIGHT: f64 = 0.3;

/// Metric grouping for the composite score. The 0.7/0.3 split between
/// the groups is fixed; the weight inside each group divides evenly
/// among its metrics. Views may carry their own groupings, but every
/// profile keeps that contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightProfile {
    pub high: Vec<MetricKind>,
    pub low: Vec<MetricKind>,
}

impl Default for WeightProfile {
    fn default() -> Self {
        WeightProfile {
            high: vec![
                MetricKind::Forks,
                MetricKind::Contributors,
                MetricKind::ClosedPrs,
            ],
            low: vec![
                MetricKind::Stars,
                MetricKind::Watchers,
                MetricKind::Size,
                MetricKind::OpenIssues,
                MetricKind::ClosedIssues,
            ],
        }
    }
}

/// Composite score for one repository, in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeRow {
    pub repo_name: String,
    pub score: f64,
}

/// Fractional average-rank percentiles for a slice of values, aligned
/// by index with the input. Empty input yields an empty vec.
pub fn percentile_ranks(values: &[u64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| values[i]);

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        // Find the tie group [i, j] of equal values
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Mean of the 1-based ranks i+1 ..= j+1, normalized by n
        let mean_rank = (i + j + 2) as f64 / 2.0;
        let pct = mean_rank / n as f64;
        for k in i..=j {
            ranks[order[k]] = pct;
        }
        i = j + 1;
    }
    ranks
}

/// Per-repository percentile for one metric over the cohort's latest
/// snapshots, in repository-name order. Repositories missing the metric
/// get `None` and do not dilute the ranking of the rest.
fn metric_percentiles(cohort: &Cohort, metric: MetricKind) -> Vec<Option<f64>> {
    let latest: Vec<Option<u64>> = cohort
        .latest_snapshots()
        .map(|s| s.values.get(metric))
        .collect();

    let present: Vec<u64> = latest.iter().filter_map(|v| *v).collect();
    let ranks = percentile_ranks(&present);

    let mut rank_iter = ranks.into_iter();
    latest
        .into_iter()
        .map(|v| v.map(|_| rank_iter.next().unwrap_or(0.0)))
        .collect()
}

/// Sum one weight group's contribution into `scores`. Metrics that no
/// repository reports are dropped before the even sub-division so they
/// do not silently deflate everyone's score.
fn apply_group(cohort: &Cohort, metrics: &[MetricKind], group_weight: f64, scores: &mut [f64]) {
    let per_metric: Vec<(MetricKind, Vec<Option<f64>>)> = metrics
        .iter()
        .map(|&m| (m, metric_percentiles(cohort, m)))
        .filter(|(_, pcts)| pcts.iter().any(Option::is_some))
        .collect();

    if per_metric.is_empty() {
        return;
    }
    let weight = group_weight / per_metric.len() as f64;

    for (_, pcts) in &per_metric {
        for (score, pct) in scores.iter_mut().zip(pcts.iter().copied()) {
            // A repo missing this particular metric contributes zero
            *score += weight * pct.unwrap_or(0.0);
        }
    }
}

/// Composite scores over the cohort's latest snapshots, one row per
/// repository in name order. Deterministic for a fixed cohort: metric
/// and repository iteration orders are fixed, accumulation is
/// left-to-right.
pub fn composite_scores(cohort: &Cohort, profile: &WeightProfile) -> Vec<CompositeRow> {
    let mut scores = vec![0.0; cohort.repo_count()];
    apply_group(cohort, &profile.high, HIGH_GROUP_WEIGHT, &mut scores);
    apply_group(cohort, &profile.low, LOW_GROUP_WEIGHT, &mut scores);

    cohort
        .repo_names()
        .zip(scores)
        .map(|(repo, score)| CompositeRow {
            repo_name: repo.to_string(),
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cohort::test_support::star_snap;
    use crate::data::{MetricValues, Snapshot};
    use chrono::{TimeZone, Utc};

    const EPS: f64 = 1e-12;

    /// Snapshot with every metric set to `base`
    fn full_snap(repo: &str, base: u64) -> Snapshot {
        let mut values = MetricValues::default();
        for kind in MetricKind::ALL {
            values.set(kind, Some(base));
        }
        Snapshot {
            repo_name: repo.to_string(),
            project_name: repo.to_string(),
            date_fetched: Utc.with_ymd_and_hms(2024, 10, 7, 6, 0, 0).unwrap(),
            values,
        }
    }

    #[test]
    fn test_percentile_max_is_one() {
        let ranks = percentile_ranks(&[10, 30, 20]);
        assert!((ranks[1] - 1.0).abs() < EPS);
        assert!((ranks[0] - 1.0 / 3.0).abs() < EPS);
        assert!((ranks[2] - 2.0 / 3.0).abs() < EPS);
        assert!(ranks.iter().all(|&r| r > 0.0 && r <= 1.0));
    }

    #[test]
    fn test_percentile_ties_share_average_rank() {
        // Ranks 1..4; the two 20s occupy ranks 2 and 3 -> mean 2.5
        let ranks = percentile_ranks(&[10, 20, 20, 40]);
        assert!((ranks[1] - 2.5 / 4.0).abs() < EPS);
        assert!((ranks[2] - 2.5 / 4.0).abs() < EPS);
        assert!((ranks[0] - 1.0 / 4.0).abs() < EPS);
        assert!((ranks[3] - 1.0).abs() < EPS);
    }

    #[test]
    fn test_percentile_single_value_is_one() {
        assert_eq!(percentile_ranks(&[7]), vec![1.0]);
        assert!(percentile_ranks(&[]).is_empty());
    }

    #[test]
    fn test_composite_single_repo_scores_one() {
        let cohort = Cohort::from_snapshots(vec![full_snap("a/one", 5)]);
        let rows = composite_scores(&cohort, &WeightProfile::default());
        assert_eq!(rows.len(), 1);
        assert!((rows[0].score - 1.0).abs() < EPS);
    }

    #[test]
    fn test_composite_scores_in_unit_interval_and_ordered_sensibly() {
        let cohort = Cohort::from_snapshots(vec![
            full_snap("a/small", 1),
            full_snap("b/mid", 10),
            full_snap("c/big", 100),
        ]);
        let rows = composite_scores(&cohort, &WeightProfile::default());
        assert!(rows.iter().all(|r| r.score > 0.0 && r.score <= 1.0 + EPS));

        // Dominating on every metric means dominating the composite
        let by_name = |name: &str| rows.iter().find(|r| r.repo_name == name).unwrap().score;
        assert!(by_name("c/big") > by_name("b/mid"));
        assert!(by_name("b/mid") > by_name("a/small"));
        assert!((by_name("c/big") - 1.0).abs() < EPS);
    }

    #[test]
    fn test_composite_deterministic_under_input_shuffle() {
        let snaps = vec![
            full_snap("a/one", 3),
            full_snap("b/two", 9),
            full_snap("c/three", 6),
        ];
        let mut shuffled = snaps.clone();
        shuffled.reverse();
        shuffled.swap(0, 1);

        let a = composite_scores(&Cohort::from_snapshots(snaps), &WeightProfile::default());
        let b = composite_scores(&Cohort::from_snapshots(shuffled), &WeightProfile::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_metric_absent_everywhere_is_dropped_from_group() {
        // Only stars are reported; all other low-group metrics drop out,
        // so the single repo still reaches the full 0.3 low weight. The
        // high group vanishes entirely.
        let cohort = Cohort::from_snapshots(vec![star_snap("a/one", 1, 50)]);
        let rows = composite_scores(&cohort, &WeightProfile::default());
        assert!((rows[0].score - LOW_GROUP_WEIGHT).abs() < EPS);
    }

    #[test]
    fn test_repo_missing_metric_contributes_zero_for_it() {
        let mut partial = full_snap("a/partial", 50);
        partial.values.forks = None;
        let cohort = Cohort::from_snapshots(vec![partial, full_snap("b/full", 50)]);
        let rows = composite_scores(&cohort, &WeightProfile::default());

        let a = rows.iter().find(|r| r.repo_name == "a/partial").unwrap();
        let b = rows.iter().find(|r| r.repo_name == "b/full").unwrap();
        // b/full ranks alone on forks (percentile 1.0) while a/partial
        // contributes zero there; everything else ties.
        assert!(b.score > a.score);
        let forks_weight = HIGH_GROUP_WEIGHT / 3.0;
        assert!((b.score - a.score - forks_weight).abs() < EPS);
    }
}
