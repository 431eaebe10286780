//! Process-wide pipeline counters.
//!
//! Counters are bumped at the call site and read back on demand. [`Metrics::flush`]
//! writes all of them as one `info!` event, typically after a run.

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    pipeline_runs: AtomicU64,
    completion_calls: AtomicU64,
    validation_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            pipeline_runs: AtomicU64::new(0),
            completion_calls: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
        }
    }

    /// Counted once a run has passed its ordering check.
    pub fn inc_pipeline_runs(&self) {
        self.pipeline_runs.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "pipeline_runs", "counter incremented");
    }

    /// Counted per request sent, whether or not it succeeds.
    pub fn inc_completion_calls(&self) {
        self.completion_calls.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "completion_calls", "counter incremented");
    }

    pub fn inc_validation_failures(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "validation_failures", "counter incremented");
    }

    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            pipeline_runs = self.pipeline_runs(),
            completion_calls = self.completion_calls(),
            validation_failures = self.validation_failures(),
        );
    }

    pub fn pipeline_runs(&self) -> u64 {
        self.pipeline_runs.load(Ordering::Relaxed)
    }

    pub fn completion_calls(&self) -> u64 {
        self.completion_calls.load(Ordering::Relaxed)
    }

    pub fn validation_failures(&self) -> u64 {
        self.validation_failures.load(Ordering::Relaxed)
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.pipeline_runs.store(0, Ordering::Relaxed);
        self.completion_calls.store(0, Ordering::Relaxed);
        self.validation_failures.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_calls_and_failures() {
        let m = Metrics::new();
        m.inc_pipeline_runs();
        m.inc_completion_calls();
        m.inc_completion_calls();
        m.inc_completion_calls();
        m.inc_validation_failures();

        assert_eq!(m.pipeline_runs(), 1);
        assert_eq!(m.completion_calls(), 3);
        assert_eq!(m.validation_failures(), 1);

        m.reset();
        assert_eq!(m.completion_calls(), 0);
        assert_eq!(m.validation_failures(), 0);
    }
}
