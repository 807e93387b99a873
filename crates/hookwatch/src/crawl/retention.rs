use chrono::{DateTime, Duration, Utc};

use crate::github::PullRequest;

/// How long after closing a pull request is still indexed.
pub const CLOSED_RETENTION_HOURS: i64 = 48;

/// Whether a polled pull request should become an event.
///
/// Open pull requests always qualify. Closed ones qualify only while their
/// `closed_at` is at most [`CLOSED_RETENTION_HOURS`] old; a closed pull
/// request without `closed_at` does not.
pub fn should_emit(pull_request: &PullRequest, now: DateTime<Utc>) -> bool {
    if !pull_request.is_closed() {
        return true;
    }
    pull_request
        .closed_at
        .is_some_and(|closed_at| now - closed_at <= Duration::hours(CLOSED_RETENTION_HOURS))
}

/// Whether `created_at` lies within the retention window before `now`.
pub fn is_recent(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    created_at.is_some_and(|t| now - t < Duration::hours(CLOSED_RETENTION_HOURS))
}
