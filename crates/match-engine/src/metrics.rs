//! Metrics for the Match Engine
//!
//! Lock-free counters updated on the hot path. Exporting them (Prometheus
//! or otherwise) is the surrounding service's job; see [`MetricsSnapshot`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Monotonic atomic counter
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Count/sum/min/max of recorded durations, in microseconds
#[derive(Debug)]
pub struct Histogram {
    count: AtomicU64,
    sum: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            min: AtomicU64::new(u64::MAX),
            max: AtomicU64::new(0),
        }
    }

    pub fn record(&self, duration: Duration) {
        let us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(us, Ordering::Relaxed);
        self.min.fetch_min(us, Ordering::Relaxed);
        self.max.fetch_max(us, Ordering::Relaxed);
    }

    pub fn stats(&self) -> HistogramStats {
        let count = self.count.load(Ordering::Relaxed);
        let sum = self.sum.load(Ordering::Relaxed);

        HistogramStats {
            count,
            avg_us: if count > 0 { sum / count } else { 0 },
            min_us: if count > 0 { self.min.load(Ordering::Relaxed) } else { 0 },
            max_us: self.max.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.sum.store(0, Ordering::Relaxed);
        self.min.store(u64::MAX, Ordering::Relaxed);
        self.max.store(0, Ordering::Relaxed);
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistogramStats {
    pub count: u64,
    pub avg_us: u64,
    pub min_us: u64,
    pub max_us: u64,
}

/// Counters for the match engine
#[derive(Debug, Default)]
pub struct MatchEngineMetrics {
    pub enqueued: Counter,
    pub enqueue_rejected: Counter,
    pub match_attempts: Counter,
    pub pairs_formed: Counter,
    pub relaxed_pairs: Counter,
    pub match_misses: Counter,
    pub sessions_ended: Counter,
    pub disconnects: Counter,
    pub sweeps: Counter,
    pub sweep_latency: Histogram,
}

impl MatchEngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pair(&self, relaxed: bool) {
        self.pairs_formed.increment();
        if relaxed {
            self.relaxed_pairs.increment();
        }
    }

    pub fn record_sweep(&self, duration: Duration) {
        self.sweeps.increment();
        self.sweep_latency.record(duration);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.get(),
            enqueue_rejected: self.enqueue_rejected.get(),
            match_attempts: self.match_attempts.get(),
            pairs_formed: self.pairs_formed.get(),
            relaxed_pairs: self.relaxed_pairs.get(),
            match_misses: self.match_misses.get(),
            sessions_ended: self.sessions_ended.get(),
            disconnects: self.disconnects.get(),
            sweeps: self.sweeps.get(),
            sweep_latency: self.sweep_latency.stats(),
        }
    }

    pub fn reset(&self) {
        self.enqueued.reset();
        self.enqueue_rejected.reset();
        self.match_attempts.reset();
        self.pairs_formed.reset();
        self.relaxed_pairs.reset();
        self.match_misses.reset();
        self.sessions_ended.reset();
        self.disconnects.reset();
        self.sweeps.reset();
        self.sweep_latency.reset();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub enqueued: u64,
    pub enqueue_rejected: u64,
    pub match_attempts: u64,
    pub pairs_formed: u64,
    pub relaxed_pairs: u64,
    pub match_misses: u64,
    pub sessions_ended: u64,
    pub disconnects: u64,
    pub sweeps: u64,
    pub sweep_latency: HistogramStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_stats() {
        let h = Histogram::new();
        assert_eq!(h.stats(), HistogramStats::default());

        h.record(Duration::from_micros(10));
        h.record(Duration::from_micros(30));

        let stats = h.stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.avg_us, 20);
        assert_eq!(stats.min_us, 10);
        assert_eq!(stats.max_us, 30);
    }

    #[test]
    fn test_record_pair_tracks_relaxed() {
        let m = MatchEngineMetrics::new();
        m.record_pair(true);
        m.record_pair(false);

        let snap = m.snapshot();
        assert_eq!(snap.pairs_formed, 2);
        assert_eq!(snap.relaxed_pairs, 1);

        m.reset();
        assert_eq!(m.snapshot(), MetricsSnapshot::default());
    }
}
