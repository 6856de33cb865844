//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// Delay between poll attempts (tuned for responsive UI feedback)
    pub poll_delay: Duration,
    /// Delay before the first poll, giving the provider time to register
    /// the operation
    pub initial_poll_delay: Duration,
    /// Poll attempts before the task is failed as timed out
    pub max_poll_attempts: u32,
    /// Age of the last update after which a processing task counts as stuck
    pub stuck_threshold: Duration,
    /// Progress written when a task enters processing, so the UI never
    /// shows 0% once work has begun
    pub initial_progress: u8,
    /// Typical provider generation time, drives the elapsed-time progress
    /// estimate
    pub expected_generation_time: Duration,
    /// How often the worker promotes due delayed jobs onto the stream
    pub promote_interval: Duration,
    /// How often the worker scans for orphaned pending deliveries
    pub claim_interval: Duration,
    /// Minimum idle time before a pending delivery can be claimed
    pub claim_min_idle: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            poll_delay: Duration::from_secs(8),
            initial_poll_delay: Duration::from_secs(5),
            max_poll_attempts: 40,
            stuck_threshold: Duration::from_secs(300), // 5 minutes
            initial_progress: 5,
            expected_generation_time: Duration::from_secs(300),
            promote_interval: Duration::from_secs(1),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(300),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: env_parse("WORKER_MAX_JOBS", defaults.max_concurrent_jobs),
            poll_delay: env_secs("WORKER_POLL_DELAY_SECS", defaults.poll_delay),
            initial_poll_delay: env_secs(
                "WORKER_INITIAL_POLL_DELAY_SECS",
                defaults.initial_poll_delay,
            ),
            max_poll_attempts: env_parse("WORKER_MAX_POLL_ATTEMPTS", defaults.max_poll_attempts),
            stuck_threshold: env_secs("WORKER_STUCK_THRESHOLD_SECS", defaults.stuck_threshold),
            initial_progress: env_parse("WORKER_INITIAL_PROGRESS", defaults.initial_progress),
            expected_generation_time: env_secs(
                "WORKER_EXPECTED_GENERATION_SECS",
                defaults.expected_generation_time,
            ),
            promote_interval: env_secs("WORKER_PROMOTE_INTERVAL_SECS", defaults.promote_interval),
            claim_interval: env_secs("WORKER_CLAIM_INTERVAL_SECS", defaults.claim_interval),
            claim_min_idle: env_secs("WORKER_CLAIM_MIN_IDLE_SECS", defaults.claim_min_idle),
            shutdown_timeout: env_secs("WORKER_SHUTDOWN_TIMEOUT", defaults.shutdown_timeout),
        }
    }

    /// Stuck threshold in whole seconds, as the record's staleness check
    /// expects it.
    pub fn stuck_threshold_secs(&self) -> i64 {
        self.stuck_threshold.as_secs() as i64
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
