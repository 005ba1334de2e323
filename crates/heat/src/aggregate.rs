use crate::error::{HeatError, Result};
use crate::scorer::detect_bug_fix;
use atlas_protocol::{CommitAggregates, CommitRecord};
use std::collections::BTreeSet;

/// Window for the `recent_commits` aggregate.
pub const RECENT_WINDOW_DAYS: u64 = 30;

const SECONDS_PER_DAY: i64 = 86_400;

/// Fold raw commit records into the aggregates the scorer consumes.
///
/// `now` is the reference timestamp (unix seconds) for the recency
/// window. Records are validated, not repaired: a negative timestamp or
/// an empty message/author fails with [`HeatError::InvalidMetrics`]. An
/// empty record list is valid and yields zero aggregates (heat 0).
pub fn aggregate_history(
    records: &[CommitRecord],
    now: i64,
    recent_window_days: u64,
) -> Result<CommitAggregates> {
    let window_seconds = i64::try_from(recent_window_days)
        .map_err(|_| HeatError::invalid(format!("recency window {recent_window_days} overflows")))?
        .saturating_mul(SECONDS_PER_DAY);

    let mut aggregates = CommitAggregates::default();
    let mut authors: BTreeSet<&str> = BTreeSet::new();

    for record in records {
        if record.timestamp < 0 {
            return Err(HeatError::invalid(format!(
                "negative commit timestamp {}",
                record.timestamp
            )));
        }
        if record.message.trim().is_empty() {
            return Err(HeatError::invalid("commit message is empty"));
        }
        if record.author.trim().is_empty() {
            return Err(HeatError::invalid("commit author is empty"));
        }

        aggregates.commit_count += 1;
        if detect_bug_fix(&record.message) {
            aggregates.bug_fix_count += 1;
        }
        if now.saturating_sub(record.timestamp) <= window_seconds {
            aggregates.recent_commits += 1;
        }
        authors.insert(record.author.as_str());
    }

    aggregates.contributor_count = authors.len() as u64;
    Ok(aggregates)
}
