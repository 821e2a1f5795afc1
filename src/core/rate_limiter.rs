//! Fixed-window rate limiting
//!
//! Counters live inside each user's [`Session`](crate::session::Session) and
//! are keyed by policy name, so they persist across restarts when the Redis
//! backend is active. A window opens on the first attempt and expires
//! `decay_secs` later; expiry resets the counter.
//!
//! `check` never increments. The calling flow checks first, refuses when the
//! limit is hit, and increments only when the attempt actually proceeds.
//! Back-to-back windows allow up to 2x `max_attempts` across a boundary;
//! acceptable for abuse throttling, not billing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named rate-limit policy
///
/// Declared as `const` in [`crate::core::config::rate_limit`].
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Session-local counter key, unique per policy
    pub key: &'static str,
    /// Attempts allowed per window
    pub max_attempts: u32,
    /// Window length in seconds
    pub decay_secs: i64,
    /// Shown to the user when the limit is hit
    pub message: &'static str,
}

/// One counter window, stored in the session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub attempts: u32,
    pub reset_at: DateTime<Utc>,
}

/// Snapshot of a counter against its policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub attempts: u32,
    pub remaining: u32,
    pub exceeds: bool,
    pub reset_at: DateTime<Utc>,
}

/// Counter map as stored in the session
pub type RateLimits = HashMap<String, RateLimitEntry>;

/// Inspects a counter without consuming an attempt.
///
/// An expired window is pruned and reads as empty.
pub fn check(limits: &mut RateLimits, config: &RateLimitConfig) -> RateLimitInfo {
    check_at(limits, config, Utc::now())
}

/// [`check`] with an injectable clock.
pub fn check_at(limits: &mut RateLimits, config: &RateLimitConfig, now: DateTime<Utc>) -> RateLimitInfo {
    prune(limits, config.key, now);
    match limits.get(config.key) {
        Some(entry) => RateLimitInfo {
            attempts: entry.attempts,
            remaining: config.max_attempts.saturating_sub(entry.attempts),
            exceeds: entry.attempts >= config.max_attempts,
            reset_at: entry.reset_at,
        },
        None => RateLimitInfo {
            attempts: 0,
            remaining: config.max_attempts,
            exceeds: false,
            reset_at: now + Duration::seconds(config.decay_secs),
        },
    }
}

/// Records one attempt and returns the updated snapshot.
///
/// Opens a fresh window when none is active. The counter keeps incrementing
/// past `max_attempts`; `exceeds` stays true until the window expires.
pub fn increment(limits: &mut RateLimits, config: &RateLimitConfig) -> RateLimitInfo {
    increment_at(limits, config, Utc::now())
}

/// [`increment`] with an injectable clock.
pub fn increment_at(limits: &mut RateLimits, config: &RateLimitConfig, now: DateTime<Utc>) -> RateLimitInfo {
    prune(limits, config.key, now);
    let entry = limits.entry(config.key.to_string()).or_insert_with(|| RateLimitEntry {
        attempts: 0,
        reset_at: now + Duration::seconds(config.decay_secs),
    });
    entry.attempts += 1;
    RateLimitInfo {
        attempts: entry.attempts,
        remaining: config.max_attempts.saturating_sub(entry.attempts),
        exceeds: entry.attempts >= config.max_attempts,
        reset_at: entry.reset_at,
    }
}

/// Whether the policy's limit is currently hit.
pub fn is_limited(limits: &mut RateLimits, config: &RateLimitConfig) -> bool {
    check(limits, config).exceeds
}

/// Seconds until the window resets, clamped at zero.
pub fn time_remaining(limits: &RateLimits, config: &RateLimitConfig) -> i64 {
    time_remaining_at(limits, config, Utc::now())
}

/// [`time_remaining`] with an injectable clock.
pub fn time_remaining_at(limits: &RateLimits, config: &RateLimitConfig, now: DateTime<Utc>) -> i64 {
    limits
        .get(config.key)
        .map(|entry| (entry.reset_at - now).num_seconds().max(0))
        .unwrap_or(0)
}

/// Drops one policy's counter.
pub fn clear(limits: &mut RateLimits, config: &RateLimitConfig) {
    limits.remove(config.key);
}

/// Drops every counter (used on logout).
pub fn clear_all(limits: &mut RateLimits) {
    limits.clear();
}

fn prune(limits: &mut RateLimits, key: &str, now: DateTime<Utc>) {
    if let Some(entry) = limits.get(key) {
        if entry.reset_at <= now {
            limits.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TEST_LIMIT: RateLimitConfig = RateLimitConfig {
        key: "test_action",
        max_attempts: 3,
        decay_secs: 60,
        message: "Too many attempts.",
    };

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_fresh_counter_is_not_limited() {
        let mut limits = RateLimits::new();
        let info = check_at(&mut limits, &TEST_LIMIT, t0());
        assert_eq!(info.attempts, 0);
        assert_eq!(info.remaining, 3);
        assert!(!info.exceeds);
    }

    #[test]
    fn test_check_never_consumes_attempts() {
        let mut limits = RateLimits::new();
        for _ in 0..10 {
            check_at(&mut limits, &TEST_LIMIT, t0());
        }
        let info = check_at(&mut limits, &TEST_LIMIT, t0());
        assert_eq!(info.attempts, 0);
        assert!(!info.exceeds);
    }

    #[test]
    fn test_limit_reached_after_max_attempts() {
        let mut limits = RateLimits::new();
        for i in 1..=3 {
            let info = increment_at(&mut limits, &TEST_LIMIT, t0());
            assert_eq!(info.attempts, i);
        }
        let info = check_at(&mut limits, &TEST_LIMIT, t0());
        assert!(info.exceeds);
        assert_eq!(info.remaining, 0);
    }

    #[test]
    fn test_remaining_never_goes_negative() {
        let mut limits = RateLimits::new();
        for _ in 0..5 {
            increment_at(&mut limits, &TEST_LIMIT, t0());
        }
        let info = check_at(&mut limits, &TEST_LIMIT, t0());
        assert_eq!(info.attempts, 5);
        assert_eq!(info.remaining, 0);
        assert!(info.exceeds);
    }

    #[test]
    fn test_window_expiry_resets_counter() {
        let mut limits = RateLimits::new();
        for _ in 0..3 {
            increment_at(&mut limits, &TEST_LIMIT, t0());
        }
        assert!(check_at(&mut limits, &TEST_LIMIT, t0()).exceeds);

        let later = t0() + Duration::seconds(61);
        let info = check_at(&mut limits, &TEST_LIMIT, later);
        assert_eq!(info.attempts, 0);
        assert!(!info.exceeds);

        // A new attempt opens a fresh window anchored at the new clock
        let info = increment_at(&mut limits, &TEST_LIMIT, later);
        assert_eq!(info.attempts, 1);
        assert_eq!(info.reset_at, later + Duration::seconds(60));
    }

    #[test]
    fn test_window_anchored_at_first_attempt() {
        let mut limits = RateLimits::new();
        let first = increment_at(&mut limits, &TEST_LIMIT, t0());
        let second = increment_at(&mut limits, &TEST_LIMIT, t0() + Duration::seconds(30));
        assert_eq!(first.reset_at, second.reset_at);
    }

    #[test]
    fn test_time_remaining_clamps_at_zero() {
        let mut limits = RateLimits::new();
        increment_at(&mut limits, &TEST_LIMIT, t0());
        assert_eq!(time_remaining_at(&limits, &TEST_LIMIT, t0()), 60);
        assert_eq!(time_remaining_at(&limits, &TEST_LIMIT, t0() + Duration::seconds(45)), 15);
        assert_eq!(time_remaining_at(&limits, &TEST_LIMIT, t0() + Duration::seconds(500)), 0);
        assert_eq!(time_remaining_at(&RateLimits::new(), &TEST_LIMIT, t0()), 0);
    }

    #[test]
    fn test_policies_are_independent() {
        const OTHER: RateLimitConfig = RateLimitConfig {
            key: "other_action",
            max_attempts: 1,
            decay_secs: 60,
            message: "Too many attempts.",
        };
        let mut limits = RateLimits::new();
        increment_at(&mut limits, &OTHER, t0());
        assert!(check_at(&mut limits, &OTHER, t0()).exceeds);
        assert!(!check_at(&mut limits, &TEST_LIMIT, t0()).exceeds);
    }

    #[test]
    fn test_clear_and_clear_all() {
        let mut limits = RateLimits::new();
        for _ in 0..3 {
            increment_at(&mut limits, &TEST_LIMIT, t0());
        }
        clear(&mut limits, &TEST_LIMIT);
        assert!(!check_at(&mut limits, &TEST_LIMIT, t0()).exceeds);

        increment_at(&mut limits, &TEST_LIMIT, t0());
        clear_all(&mut limits);
        assert!(limits.is_empty());
    }
}
