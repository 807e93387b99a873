//! Latest observed API quota.
//!
//! GitHub reports its quota on every response through `X-RateLimit-*`
//! headers. The tracker keeps only the most recent snapshot; the crawler
//! reads `remaining` to decide whether a tick may spend requests, and the
//! metrics endpoint renders the snapshot as gauges.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::http::{HttpHeaders, header_get};

/// Below this many remaining requests the crawler pauses.
pub const LOW_QUOTA_THRESHOLD: i64 = 2000;

pub const HEADER_USED: &str = "x-ratelimit-used";
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// Quota counters from a single response.
///
/// Each field is `None` when the header was missing or not an integer.
/// `None` means "unknown", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub used: Option<i64>,
    pub remaining: Option<i64>,
    pub total: Option<i64>,
    /// Unix seconds at which the window resets.
    pub reset: Option<i64>,
}

impl RateLimitSnapshot {
    /// Extract counters from response headers.
    pub fn from_headers(headers: &HttpHeaders) -> Self {
        Self {
            used: parse_header_int(headers, HEADER_USED),
            remaining: parse_header_int(headers, HEADER_REMAINING),
            total: parse_header_int(headers, HEADER_LIMIT),
            reset: parse_header_int(headers, HEADER_RESET),
        }
    }

    /// Whether any rate-limit header was present and parseable.
    pub fn is_empty(&self) -> bool {
        self.used.is_none()
            && self.remaining.is_none()
            && self.total.is_none()
            && self.reset.is_none()
    }

    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.reset.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Seconds from `now` until the window resets; negative once passed.
    pub fn seconds_until_reset(&self, now: DateTime<Utc>) -> Option<i64> {
        self.reset.map(|secs| secs - now.timestamp())
    }

    /// Remaining quota as of `now`.
    ///
    /// Once the reset time has passed the window has refilled, so the
    /// recorded count no longer applies and the result is `None`.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<i64> {
        match self.reset {
            Some(reset) if reset <= now.timestamp() => None,
            _ => self.remaining,
        }
    }
}

/// Parse an integer header value; absent or malformed yields `None`.
pub fn parse_header_int(headers: &HttpHeaders, name: &str) -> Option<i64> {
    header_get(headers, name).and_then(|v| v.trim().parse::<i64>().ok())
}

/// Shared holder of the latest [`RateLimitSnapshot`].
///
/// Cloning is cheap; every clone observes the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct RateLimitTracker {
    latest: Arc<RwLock<RateLimitSnapshot>>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the counters carried by a response.
    ///
    /// Responses without any rate-limit header leave the previous snapshot
    /// in place.
    pub fn observe(&self, headers: &HttpHeaders) {
        let snapshot = RateLimitSnapshot::from_headers(headers);
        if snapshot.is_empty() {
            return;
        }
        self.set(snapshot);
    }

    pub fn set(&self, snapshot: RateLimitSnapshot) {
        let mut latest = self.latest.write().unwrap_or_else(|e| e.into_inner());
        *latest = snapshot;
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        *self.latest.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn remaining(&self) -> Option<i64> {
        self.snapshot().remaining
    }

    /// See [`RateLimitSnapshot::remaining_at`].
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<i64> {
        self.snapshot().remaining_at(now)
    }

    /// Whether the remaining quota as of `now` is under
    /// [`LOW_QUOTA_THRESHOLD`].
    ///
    /// An unknown or expired quota is not low.
    pub fn is_low(&self, now: DateTime<Utc>) -> bool {
        self.remaining_at(now)
            .is_some_and(|remaining| remaining < LOW_QUOTA_THRESHOLD)
    }
}
