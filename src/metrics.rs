// Performance metrics module
//
// Provides lightweight metrics tracking for fetches, state updates and main context traffic

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide counters
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Counters are bumped from tokio workers and the main context alike and can be
/// logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Fetches handed to the loader
    pub fetches_started: AtomicU64,

    /// Fetches that ended with a decoded payload
    pub fetches_succeeded: AtomicU64,

    /// Fetches that ended with a failure reason
    pub fetches_failed: AtomicU64,

    /// Total time spent inside the loader in milliseconds
    pub total_fetch_time_ms: AtomicU64,

    /// Number of state updates performed
    pub state_updates: AtomicU64,

    /// Number of change events broadcast
    pub state_broadcasts: AtomicU64,

    /// Change events sent while nobody was subscribed
    pub state_broadcast_unobserved: AtomicU64,

    /// Jobs executed on the main context
    pub main_jobs_run: AtomicU64,

    /// Jobs rejected because the main context had shut down
    pub main_jobs_rejected: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            fetches_started: AtomicU64::new(0),
            fetches_succeeded: AtomicU64::new(0),
            fetches_failed: AtomicU64::new(0),
            total_fetch_time_ms: AtomicU64::new(0),
            state_updates: AtomicU64::new(0),
            state_broadcasts: AtomicU64::new(0),
            state_broadcast_unobserved: AtomicU64::new(0),
            main_jobs_run: AtomicU64::new(0),
            main_jobs_rejected: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_fetch_started(&self) {
        self.fetches_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished fetch and how long it took
    pub fn record_fetch_finished(&self, succeeded: bool, duration: Duration) {
        if succeeded {
            self.fetches_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.fetches_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_fetch_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_state_update(&self) {
        self.state_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_broadcast(&self) {
        self.state_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_broadcast_unobserved(&self) {
        self.state_broadcast_unobserved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_main_job(&self) {
        self.main_jobs_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_main_job_rejected(&self) {
        self.main_jobs_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average loader time per finished fetch in milliseconds
    pub fn avg_fetch_time_ms(&self) -> f64 {
        let total = self.total_fetch_time_ms.load(Ordering::Relaxed);
        let count = self.fetches_succeeded.load(Ordering::Relaxed)
            + self.fetches_failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Fetches: {} started, {} succeeded, {} failed (avg {:.2}ms)",
            self.fetches_started.load(Ordering::Relaxed),
            self.fetches_succeeded.load(Ordering::Relaxed),
            self.fetches_failed.load(Ordering::Relaxed),
            self.avg_fetch_time_ms()
        );
        tracing::info!(
            "State updates: {}, broadcasts: {}, unobserved: {}",
            self.state_updates.load(Ordering::Relaxed),
            self.state_broadcasts.load(Ordering::Relaxed),
            self.state_broadcast_unobserved.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Main context jobs: {} run, {} rejected",
            self.main_jobs_run.load(Ordering::Relaxed),
            self.main_jobs_rejected.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
