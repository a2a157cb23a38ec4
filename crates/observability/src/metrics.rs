//! Prometheus metrics infrastructure
//!
//! The match engine keeps its own atomic counters; this module mirrors them
//! into the `metrics` facade so the Prometheus exporter can serve them.

use match_engine::{MatchStats, MetricsSnapshot};
use metrics::{counter, gauge, Counter, Gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus metrics exporter
///
/// This starts an HTTP listener on the specified port that exposes metrics
/// at the `/metrics` endpoint. Must be called from within a tokio runtime.
///
/// # Example
///
/// ```ignore
/// observability::metrics::init_metrics(9464)?;
/// // Metrics available at http://localhost:9464/metrics
/// ```
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Engine gauges and counters
///
/// # Metrics
///
/// * `duet_waiting_connections` - Connections in the waiting pool
/// * `duet_active_sessions` - Sessions currently active
/// * `duet_pairs_formed_total` - Pairs formed since start (label `mode`)
/// * `duet_match_attempts_total` - Match attempts, hits and misses
/// * `duet_sessions_ended_total` - Sessions torn down
/// * `duet_sweep_latency_avg_us` - Average sweep duration
#[derive(Clone)]
pub struct EngineGauges {
    waiting: Gauge,
    active_sessions: Gauge,
    pairs_strict: Counter,
    pairs_relaxed: Counter,
    match_attempts: Counter,
    match_misses: Counter,
    enqueue_rejected: Counter,
    sessions_ended: Counter,
    sweeps: Counter,
    sweep_latency_avg: Gauge,
}

impl EngineGauges {
    /// Register the engine metrics, labelled with the service name
    pub fn new(service_name: &str) -> Self {
        let service = service_name.to_string();

        Self {
            waiting: gauge!("duet_waiting_connections", "service" => service.clone()),
            active_sessions: gauge!("duet_active_sessions", "service" => service.clone()),
            pairs_strict: counter!("duet_pairs_formed_total", "service" => service.clone(), "mode" => "strict"),
            pairs_relaxed: counter!("duet_pairs_formed_total", "service" => service.clone(), "mode" => "relaxed"),
            match_attempts: counter!("duet_match_attempts_total", "service" => service.clone()),
            match_misses: counter!("duet_match_misses_total", "service" => service.clone()),
            enqueue_rejected: counter!("duet_enqueue_rejected_total", "service" => service.clone()),
            sessions_ended: counter!("duet_sessions_ended_total", "service" => service.clone()),
            sweeps: counter!("duet_sweeps_total", "service" => service.clone()),
            sweep_latency_avg: gauge!("duet_sweep_latency_avg_us", "service" => service),
        }
    }

    /// Mirror one engine sample into the exporter
    pub fn publish(&self, snapshot: &MetricsSnapshot, stats: &MatchStats) {
        self.waiting.set(stats.waiting_count as f64);
        self.active_sessions.set(stats.active_session_count as f64);

        self.pairs_strict
            .absolute(snapshot.pairs_formed.saturating_sub(snapshot.relaxed_pairs));
        self.pairs_relaxed.absolute(snapshot.relaxed_pairs);
        self.match_attempts.absolute(snapshot.match_attempts);
        self.match_misses.absolute(snapshot.match_misses);
        self.enqueue_rejected.absolute(snapshot.enqueue_rejected);
        self.sessions_ended.absolute(snapshot.sessions_ended);
        self.sweeps.absolute(snapshot.sweeps);
        self.sweep_latency_avg.set(snapshot.sweep_latency.avg_us as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_recorder() {
        // No recorder installed: handles are no-ops and must not panic
        let gauges = EngineGauges::new("test");
        gauges.publish(&MetricsSnapshot::default(), &MatchStats::default());
    }
}
