//! Leaderboard construction: top-N selection over a ranking key.

use std::cmp::Ordering;

use crate::core::cohort::Cohort;
use crate::core::gain::{compute_gains, synthetic_scores, GainPeriod, GainStatus};
use crate::core::score::{composite_scores, WeightProfile};
use crate::data::MetricKind;

/// What the leaderboard ranks on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankKey {
    /// Raw metric value at the latest snapshot
    Metric(MetricKind),
    /// Gain of a metric over a period
    Gain(MetricKind, GainPeriod),
    /// Weighted composite of percentile ranks
    Composite(WeightProfile),
}

/// One ranked row
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    /// 1-based rank
    pub rank: usize,
    pub repo_name: String,
    /// Value of the ranking key
    pub value: f64,
    /// Latest raw metric value, where the key has one
    pub latest: Option<u64>,
    /// Reference value backing a gain key
    pub reference: Option<u64>,
    /// Min-max normalized gain, for gain keys
    pub synthetic: Option<f64>,
    pub status: GainStatus,
}

/// Ordered top-N result. Repositories that could not be ranked are
/// counted, not dropped silently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    /// Repositories excluded for insufficient data
    pub skipped: usize,
}

/// Build the top-N leaderboard for a ranking key. Ordering is
/// descending by key value with ties broken by repository name, so a
/// fixed cohort always produces identical output. An empty cohort
/// yields an empty result; a cohort smaller than N yields everything
/// with no padding.
pub fn build_leaderboard(cohort: &Cohort, key: &RankKey, top_n: usize) -> Leaderboard {
    let mut board = Leaderboard::default();

    match key {
        RankKey::Metric(metric) => {
            for snap in cohort.latest_snapshots() {
                match snap.values.get(*metric) {
                    Some(value) => board.entries.push(LeaderboardEntry {
                        rank: 0,
                        repo_name: snap.repo_name.clone(),
                        value: value as f64,
                        latest: Some(value),
                        reference: None,
                        synthetic: None,
                        status: GainStatus::Ok,
                    }),
                    None => board.skipped += 1,
                }
            }
        }
        RankKey::Gain(metric, period) => {
            let rows = compute_gains(cohort, *metric, *period);
            let synthetic = synthetic_scores(&rows);
            for (row, synth) in rows.into_iter().zip(synthetic) {
                match row.gain {
                    Some(gain) => board.entries.push(LeaderboardEntry {
                        rank: 0,
                        repo_name: row.repo_name,
                        value: gain as f64,
                        latest: row.latest,
                        reference: row.reference,
                        synthetic: synth,
                        status: row.status,
                    }),
                    None => board.skipped += 1,
                }
            }
        }
        RankKey::Composite(profile) => {
            for row in composite_scores(cohort, profile) {
                let latest = cohort.latest(&row.repo_name).and_then(|s| s.values.stars);
                board.entries.push(LeaderboardEntry {
                    rank: 0,
                    repo_name: row.repo_name,
                    value: row.score,
                    latest,
                    reference: None,
                    synthetic: None,
                    status: GainStatus::Ok,
                });
            }
        }
    }

    board.entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.repo_name.cmp(&b.repo_name))
    });
    board.entries.truncate(top_n);
    for (i, entry) in board.entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cohort::test_support::star_cohort;

    fn daily_stars() -> RankKey {
        RankKey::Gain(MetricKind::Stars, GainPeriod::Daily)
    }

    #[test]
    fn test_top_one_daily_gainer() {
        // A gains 5 today, B gains 25 -> top-1 daily gainer is B
        let cohort = star_cohort(&[("a", &[10, 15, 20]), ("b", &[5, 5, 30])]);
        let board = build_leaderboard(&cohort, &daily_stars(), 1);
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].repo_name, "b");
        assert_eq!(board.entries[0].value, 25.0);
        assert_eq!(board.entries[0].rank, 1);
        assert_eq!(board.skipped, 0);
    }

    #[test]
    fn test_output_never_exceeds_n_and_no_padding() {
        let cohort = star_cohort(&[("a", &[1, 2]), ("b", &[1, 3]), ("c", &[1, 4])]);
        assert_eq!(build_leaderboard(&cohort, &daily_stars(), 2).entries.len(), 2);
        // Cohort smaller than N: everything, no padding
        assert_eq!(build_leaderboard(&cohort, &daily_stars(), 10).entries.len(), 3);
    }

    #[test]
    fn test_empty_cohort_yields_empty_result() {
        let cohort = star_cohort(&[]);
        let board = build_leaderboard(&cohort, &daily_stars(), 5);
        assert!(board.entries.is_empty());
        assert_eq!(board.skipped, 0);

        let board = build_leaderboard(
            &cohort,
            &RankKey::Composite(WeightProfile::default()),
            5,
        );
        assert!(board.entries.is_empty());
    }

    #[test]
    fn test_ties_break_by_repo_name() {
        let cohort = star_cohort(&[("b", &[1, 6]), ("a", &[1, 6]), ("c", &[1, 2])]);
        let board = build_leaderboard(&cohort, &daily_stars(), 3);
        let names: Vec<_> = board.entries.iter().map(|e| e.repo_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(board.entries[0].rank, 1);
        assert_eq!(board.entries[2].rank, 3);
    }

    #[test]
    fn test_insufficient_repos_are_skipped_and_counted() {
        let cohort = star_cohort(&[("a", &[10, 15]), ("c", &[42])]);
        let board = build_leaderboard(&cohort, &daily_stars(), 5);
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].repo_name, "a");
        assert_eq!(board.skipped, 1);
    }

    #[test]
    fn test_idempotent_on_unchanged_cohort() {
        let cohort = star_cohort(&[("a", &[3, 9]), ("b", &[1, 2]), ("c", &[5, 5])]);
        let first = build_leaderboard(&cohort, &daily_stars(), 5);
        let second = build_leaderboard(&cohort, &daily_stars(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_raw_metric_key_ranks_latest_values() {
        let cohort = star_cohort(&[("a", &[10, 15]), ("b", &[5, 40])]);
        let board = build_leaderboard(&cohort, &RankKey::Metric(MetricKind::Stars), 5);
        assert_eq!(board.entries[0].repo_name, "b");
        assert_eq!(board.entries[0].latest, Some(40));
        // Forks were never reported: everyone is skipped
        let board = build_leaderboard(&cohort, &RankKey::Metric(MetricKind::Forks), 5);
        assert!(board.entries.is_empty());
        assert_eq!(board.skipped, 2);
    }

    #[test]
    fn test_composite_key_orders_by_score() {
        let cohort = star_cohort(&[("a", &[10, 15]), ("b", &[5, 40])]);
        let board = build_leaderboard(
            &cohort,
            &RankKey::Composite(WeightProfile::default()),
            5,
        );
        assert_eq!(board.entries.len(), 2);
        assert_eq!(board.entries[0].repo_name, "b");
        assert!(board.entries[0].value >= board.entries[1].value);
    }
}
