//! # Atlas Heat
//!
//! Hot-zone scoring: turns noisy per-file commit-history signals into a
//! stable heat value in `[0, 1]`.
//!
//! The scorer is a pure function of a single node's aggregates - no state
//! across nodes, no cross-node normalization - so scores are comparable
//! across ingestion runs as long as the saturation ceilings stay fixed.

mod aggregate;
mod error;
mod scorer;

pub use aggregate::{aggregate_history, RECENT_WINDOW_DAYS};
pub use error::{HeatError, Result};
pub use scorer::{detect_bug_fix, HeatScorer, HotZoneMetrics};
