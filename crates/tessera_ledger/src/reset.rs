//! Allowance window boundary.

use chrono::{DateTime, TimeDelta, Utc};

/// Minimum wall-clock hours between two allowance resets.
pub const RESET_INTERVAL_HOURS: i64 = 24;

/// Whether a new allowance window should start.
///
/// True only once at least [`RESET_INTERVAL_HOURS`] have elapsed since
/// `last_reset`. A `now` earlier than `last_reset` never resets, so a skewed
/// clock cannot move the boundary backwards.
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use tessera_ledger::should_reset;
///
/// let last = Utc::now();
/// assert!(!should_reset(last + TimeDelta::hours(23), last));
/// assert!(should_reset(last + TimeDelta::hours(24), last));
/// assert!(!should_reset(last - TimeDelta::hours(48), last));
/// ```
pub fn should_reset(now: DateTime<Utc>, last_reset: DateTime<Utc>) -> bool {
    now.signed_duration_since(last_reset) >= TimeDelta::hours(RESET_INTERVAL_HOURS)
}
