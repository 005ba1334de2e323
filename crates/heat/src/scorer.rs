use atlas_protocol::CommitAggregates;
use serde::{Deserialize, Serialize};

/// Saturation ceilings. Each raw count is clipped here before weighting
/// so a single outlier file (say, 500 commits) cannot dominate the scale.
const COMMIT_SATURATION: f64 = 100.0;
const BUG_FIX_SATURATION: f64 = 20.0;
const RECENT_SATURATION: f64 = 10.0;
const CONTRIBUTOR_SATURATION: f64 = 10.0;

/// Fixed convex combination over the clipped sub-scores. Policy
/// constants; they sum to 1.
const COMMIT_WEIGHT: f64 = 0.3;
const BUG_FIX_WEIGHT: f64 = 0.4;
const RECENCY_WEIGHT: f64 = 0.2;
const CHURN_WEIGHT: f64 = 0.1;

/// Keywords that classify a commit message as a bug fix.
const BUG_FIX_KEYWORDS: &[&str] = &["fix", "bug", "patch", "hotfix", "resolve", "issue"];

/// Intermediate clipped sub-scores, each in `[0, 1]`.
///
/// Ephemeral: consumed by the weighting step and exposed for diagnostics,
/// never persisted on the node beyond the final heat score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotZoneMetrics {
    pub commit_frequency: f64,
    pub bug_density: f64,
    pub recency_score: f64,
    pub churn_rate: f64,
}

/// Stateless heat scorer.
///
/// `score` is monotonically non-decreasing in each raw metric and always
/// lands in `[0, 1]`, including for inputs far beyond the ceilings.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeatScorer;

impl HeatScorer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Clip each raw aggregate against its saturation ceiling.
    #[must_use]
    pub fn metrics(&self, aggregates: &CommitAggregates) -> HotZoneMetrics {
        HotZoneMetrics {
            commit_frequency: saturate(aggregates.commit_count, COMMIT_SATURATION),
            bug_density: saturate(aggregates.bug_fix_count, BUG_FIX_SATURATION),
            recency_score: saturate(aggregates.recent_commits, RECENT_SATURATION),
            churn_rate: saturate(aggregates.contributor_count, CONTRIBUTOR_SATURATION),
        }
    }

    /// Weighted heat score in `[0, 1]`.
    #[must_use]
    pub fn score(&self, aggregates: &CommitAggregates) -> f64 {
        let metrics = self.metrics(aggregates);
        COMMIT_WEIGHT * metrics.commit_frequency
            + BUG_FIX_WEIGHT * metrics.bug_density
            + RECENCY_WEIGHT * metrics.recency_score
            + CHURN_WEIGHT * metrics.churn_rate
    }
}

#[allow(clippy::cast_precision_loss)]
fn saturate(count: u64, ceiling: f64) -> f64 {
    (count as f64 / ceiling).min(1.0)
}

/// Heuristic bug-fix classifier: case-insensitive substring match against
/// a fixed keyword set. Known to produce false positives ("prefix"
/// contains "fix") - acceptable for a weighting signal, not for audit-grade
/// classification.
#[must_use]
pub fn detect_bug_fix(message: &str) -> bool {
    let lowered = message.to_lowercase();
    BUG_FIX_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregates(commits: u64, bug_fixes: u64, recent: u64, contributors: u64) -> CommitAggregates {
        CommitAggregates {
            commit_count: commits,
            bug_fix_count: bug_fixes,
            recent_commits: recent,
            contributor_count: contributors,
        }
    }

    #[test]
    fn worked_example_saturated_commits() {
        // 200 commits saturates at 1.0 -> 0.3; one contributor adds
        // 1/10 * 0.1 = 0.01.
        let score = HeatScorer::new().score(&aggregates(200, 0, 0, 1));
        assert!((score - 0.31).abs() < 1e-12);
    }

    #[test]
    fn score_is_pure() {
        let scorer = HeatScorer::new();
        let input = aggregates(42, 3, 5, 4);
        assert_eq!(scorer.score(&input), scorer.score(&input));
    }

    #[test]
    fn score_stays_in_unit_interval_under_extreme_inputs() {
        let scorer = HeatScorer::new();
        assert_eq!(scorer.score(&CommitAggregates::default()), 0.0);

        let extreme = aggregates(u64::MAX, u64::MAX, u64::MAX, u64::MAX);
        let score = scorer.score(&extreme);
        assert!((0.0..=1.0).contains(&score));
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn score_is_monotone_in_each_metric() {
        let scorer = HeatScorer::new();
        let base = aggregates(50, 5, 3, 2);
        let base_score = scorer.score(&base);

        assert!(scorer.score(&aggregates(51, 5, 3, 2)) >= base_score);
        assert!(scorer.score(&aggregates(50, 6, 3, 2)) >= base_score);
        assert!(scorer.score(&aggregates(50, 5, 4, 2)) >= base_score);
        assert!(scorer.score(&aggregates(50, 5, 3, 3)) >= base_score);
    }

    #[test]
    fn metrics_clip_at_ceilings() {
        let metrics = HeatScorer::new().metrics(&aggregates(1000, 100, 50, 50));
        assert_eq!(metrics.commit_frequency, 1.0);
        assert_eq!(metrics.bug_density, 1.0);
        assert_eq!(metrics.recency_score, 1.0);
        assert_eq!(metrics.churn_rate, 1.0);

        let partial = HeatScorer::new().metrics(&aggregates(50, 10, 5, 5));
        assert_eq!(partial.commit_frequency, 0.5);
        assert_eq!(partial.bug_density, 0.5);
        assert_eq!(partial.recency_score, 0.5);
        assert_eq!(partial.churn_rate, 0.5);
    }

    #[test]
    fn bug_fix_keywords_match_case_insensitively() {
        assert!(detect_bug_fix("Fix crash on startup"));
        assert!(detect_bug_fix("HOTFIX: rollback bad deploy"));
        assert!(detect_bug_fix("resolve issue #42"));
        assert!(detect_bug_fix("Patch security hole"));
        assert!(!detect_bug_fix("Add dark mode"));
        assert!(!detect_bug_fix("Refactor layout engine"));
    }

    #[test]
    fn bug_fix_detection_has_known_false_positives() {
        // Substring matching, not word matching: "prefix" contains "fix".
        assert!(detect_bug_fix("Add prefix support to resolver"));
    }
}
