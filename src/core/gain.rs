//! Gain computation: metric deltas between the latest snapshot and a
//! period-dependent reference snapshot.
//!
//! Periods are measured in fetch cycles, not wall-clock days, so a
//! missed fetch shifts the windows rather than producing holes.

use crate::core::cohort::Cohort;
use crate::data::MetricKind;

/// Number of fetch cycles in the weekly window
pub const WEEKLY_WINDOW: usize = 7;

/// Which reference snapshot a gain is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GainPeriod {
    /// One fetch cycle before the latest
    Daily,
    /// Earliest snapshot in the trailing window of [`WEEKLY_WINDOW`]
    /// fetch cycles ending at the latest
    Weekly,
    /// Earliest snapshot in the repository's history (program baseline)
    Overall,
}

impl GainPeriod {
    pub fn label(self) -> &'static str {
        match self {
            GainPeriod::Daily => "today",
            GainPeriod::Weekly => "this week",
            GainPeriod::Overall => "overall",
        }
    }
}

/// Data-quality annotation carried on every gain row. Problems stay
/// local annotations; they never become errors crossing into the
/// presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainStatus {
    Ok,
    /// Weekly gain computed from fewer cycles than the full window
    PartialWindow,
    /// Fewer than two snapshots, or the metric absent at an endpoint
    Insufficient,
}

/// Gain of one metric for one repository
#[derive(Debug, Clone, PartialEq)]
pub struct GainRow {
    pub repo_name: String,
    /// Metric value at the latest snapshot
    pub latest: Option<u64>,
    /// Metric value at the reference snapshot
    pub reference: Option<u64>,
    /// `latest - reference`; negative on regression. `None` when the
    /// gain is undefined, never zero-substituted.
    pub gain: Option<i64>,
    pub status: GainStatus,
}

/// Index of the reference snapshot for a series of `len` snapshots, or
/// `None` when no meaningful reference exists.
fn reference_index(len: usize, period: GainPeriod) -> Option<usize> {
    if len < 2 {
        return None;
    }
    match period {
        GainPeriod::Daily => Some(len - 2),
        GainPeriod::Weekly => Some(len.saturating_sub(WEEKLY_WINDOW)),
        GainPeriod::Overall => Some(0),
    }
}

/// Compute one metric's gain for every repository in the cohort, in
/// repository-name order. Every repository gets a row; ones that cannot
/// be computed come back flagged rather than omitted or NaN-filled.
pub fn compute_gains(cohort: &Cohort, metric: MetricKind, period: GainPeriod) -> Vec<GainRow> {
    let mut rows = Vec::with_capacity(cohort.repo_count());
    for repo in cohort.repo_names() {
        let series = cohort.series(repo).unwrap_or(&[]);
        let latest = series.last().and_then(|s| s.values.get(metric));

        let (reference, gain, status) = match reference_index(series.len(), period) {
            Some(ref_idx) => {
                let reference = series[ref_idx].values.get(metric);
                match (latest, reference) {
                    (Some(now), Some(then)) => {
                        let status = if period == GainPeriod::Weekly
                            && series.len() < WEEKLY_WINDOW
                        {
                            GainStatus::PartialWindow
                        } else {
                            GainStatus::Ok
                        };
                        (reference, Some(now as i64 - then as i64), status)
                    }
                    _ => (reference, None, GainStatus::Insufficient),
                }
            }
            None => (None, None, GainStatus::Insufficient),
        };

        rows.push(GainRow {
            repo_name: repo.to_string(),
            latest,
            reference,
            gain,
            status,
        });
    }
    rows
}

/// Min-max normalize the defined gains into [0, 1] (the "synthetic
/// score" column). Rows with an undefined gain get `None`; a zero range
/// resolves to the 0.0 sentinel instead of dividing by zero.
pub fn synthetic_scores(rows: &[GainRow]) -> Vec<Option<f64>> {
    let defined: Vec<i64> = rows.iter().filter_map(|r| r.gain).collect();
    let min = defined.iter().copied().min();
    let max = defined.iter().copied().max();

    rows.iter()
        .map(|row| {
            let gain = row.gain?;
            match (min, max) {
                (Some(min), Some(max)) if max > min => {
                    Some((gain - min) as f64 / (max - min) as f64)
                }
                _ => Some(0.0),
            }
        })
        .collect()
}
