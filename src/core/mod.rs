//! Aggregation and ranking core.
//!
//! Pure transformations over an in-memory [`Cohort`]: gains, percentile
//! and composite scoring, leaderboards, and chart projections. No I/O
//! happens here; the store loads snapshots, the UI renders results.

mod cohort;
mod gain;
mod leaderboard;
mod score;
mod views;

pub use cohort::Cohort;
pub use gain::{GainPeriod, GainStatus};
pub use leaderboard::{build_leaderboard, Leaderboard, LeaderboardEntry, RankKey};
pub use score::WeightProfile;
pub use views::{comparison, timeline, Comparison, Timeline};
