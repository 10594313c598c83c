//! Duplicate-observation suppression.
//!
//! The profile site exposes no match identifier, so a fresh observation is
//! compared with the last persisted one for the same account: identical
//! content inside the polling window means the same match seen again.

use crate::models::LiveMatch;

/// Whether `candidate` re-observes `last` within `interval_minutes`.
///
/// Elapsed time is truncated to whole minutes before the comparison, so an
/// observation at 13 minutes 59 seconds still falls inside a 14 minute
/// window. Any differing content field makes the candidate a new match
/// regardless of elapsed time.
pub fn is_duplicate(
    candidate: &LiveMatch,
    last: Option<&LiveMatch>,
    interval_minutes: i64,
) -> bool {
    let Some(last) = last else {
        return false;
    };

    let elapsed_minutes = candidate
        .observed_at
        .signed_duration_since(last.observed_at)
        .num_minutes();

    elapsed_minutes < interval_minutes && candidate.same_content(last)
}
