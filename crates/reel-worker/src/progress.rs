//! Progress estimation for in-flight operations.
//!
//! One consolidated policy: provider-reported progress wins when present,
//! otherwise the estimate grows from a fixed increment, elapsed wall-clock
//! time, and the attempt count. Everything in flight is capped below 100 -
//! the 90-100 band is reserved for finalization so the UI never shows a
//! finished bar before the result URL exists. Callers write the estimate
//! through `VideoTask::record_progress`, which keeps it monotonic.

use chrono::{DateTime, Utc};

use crate::config::WorkerConfig;

/// Ceiling for any estimate while the operation is still running.
pub const IN_FLIGHT_CAP: u8 = 90;

/// Minimum growth per poll when the provider reports nothing.
pub const FALLBACK_INCREMENT: u8 = 5;

/// Estimate progress for a task that is not done yet.
///
/// `previous` is the stored value, `reported` the provider's percentage if
/// it gave one, `attempt` the zero-based poll attempt.
pub fn estimate(
    previous: u8,
    reported: Option<u8>,
    created_at: DateTime<Utc>,
    attempt: u32,
    config: &WorkerConfig,
) -> u8 {
    if let Some(reported) = reported {
        return reported.min(IN_FLIGHT_CAP);
    }

    let incremental = previous.saturating_add(FALLBACK_INCREMENT);
    let by_time = time_estimate(created_at, config);
    let by_attempt = attempt_estimate(attempt, config);

    incremental.max(by_time).max(by_attempt).min(IN_FLIGHT_CAP)
}

/// Fraction of the expected generation time that has elapsed, scaled onto
/// the in-flight band.
fn time_estimate(created_at: DateTime<Utc>, config: &WorkerConfig) -> u8 {
    let expected = config.expected_generation_time.as_secs().max(1);
    let elapsed = (Utc::now() - created_at).num_seconds().max(0) as u64;

    ((elapsed * IN_FLIGHT_CAP as u64) / expected).min(IN_FLIGHT_CAP as u64) as u8
}

/// Fraction of the attempt budget that has been spent, scaled onto the
/// in-flight band.
fn attempt_estimate(attempt: u32, config: &WorkerConfig) -> u8 {
    let budget = config.max_poll_attempts.max(1);
    let spent = (attempt + 1).min(budget);

    ((spent as u64 * IN_FLIGHT_CAP as u64) / budget as u64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn config() -> WorkerConfig {
        WorkerConfig::default()
    }

    #[test]
    fn test_reported_progress_wins_but_is_capped() {
        let now = Utc::now();
        assert_eq!(estimate(10, Some(40), now, 0, &config()), 40);
        assert_eq!(estimate(10, Some(97), now, 0, &config()), IN_FLIGHT_CAP);
    }

    #[test]
    fn test_fallback_grows_by_increment() {
        // Fresh task, first attempt: the fixed increment dominates
        let now = Utc::now();
        let value = estimate(20, None, now, 0, &config());
        assert!(value >= 20 + FALLBACK_INCREMENT);
        assert!(value <= IN_FLIGHT_CAP);
    }

    #[test]
    fn test_fallback_never_exceeds_cap() {
        let now = Utc::now();
        assert_eq!(estimate(88, None, now, 0, &config()), IN_FLIGHT_CAP);
        assert_eq!(estimate(90, None, now, 39, &config()), IN_FLIGHT_CAP);
    }

    #[test]
    fn test_elapsed_time_drives_estimate() {
        let old = Utc::now() - Duration::seconds(150);
        // Half the expected time elapsed: roughly half the band
        let value = estimate(0, None, old, 0, &config());
        assert!(value >= 40, "estimate {} too low", value);
        assert!(value <= IN_FLIGHT_CAP);

        let ancient = Utc::now() - Duration::seconds(100_000);
        assert_eq!(estimate(0, None, ancient, 0, &config()), IN_FLIGHT_CAP);
    }

    #[test]
    fn test_attempt_count_drives_estimate() {
        let now = Utc::now();
        let late = estimate(0, None, now, 30, &config());
        let early = estimate(0, None, now, 1, &config());
        assert!(late > early);
    }
}
