//! Periodic retry sweeper
//!
//! A cancellable background task owned by the surrounding service. The
//! engine itself only exposes the one-shot [`SharedMatchEngine::sweep`].

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::result::SweepReport;
use crate::shared::SharedMatchEngine;

/// Default gap between two sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(2);

/// Background task that retries waiting connections on a fixed interval
pub struct RetrySweeper {
    engine: SharedMatchEngine,
    interval: Duration,
}

impl RetrySweeper {
    pub fn new(engine: SharedMatchEngine, interval: Duration) -> Self {
        Self { engine, interval }
    }

    pub fn from_config(engine: SharedMatchEngine, cfg: &config::SweeperConfig) -> Self {
        Self::new(engine, Duration::from_millis(cfg.interval_ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one sweep now
    pub fn run_once(&self) -> SweepReport {
        let report = self.engine.sweep();
        debug!(
            attempted = report.attempted,
            matched = report.matched_count(),
            failed = report.failed,
            "Sweep complete"
        );
        report
    }

    /// Sweep on every tick until `shutdown` is cancelled
    ///
    /// The first sweep runs immediately.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "Retry sweeper started");

        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.run_once();
                }
                _ = shutdown.cancelled() => {
                    info!("Retry sweeper shutting down");
                    return;
                }
            }
        }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, MatchProfile, Preferences};
    use crate::engine::{MatchEngine, MatchPolicy};
    use crate::event::PairingEvent;
    use crate::result::MatchOutcome;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn strict_shared() -> SharedMatchEngine {
        SharedMatchEngine::new(MatchEngine::with_policy(MatchPolicy {
            always_relaxed: false,
            ..MatchPolicy::default()
        }))
    }

    fn picky_male() -> MatchProfile {
        MatchProfile::new("male", "US").with_preferences(Preferences::parse("female", "ANY"))
    }

    #[tokio::test]
    async fn test_sweeper_pairs_long_waiting_connections() {
        let engine = strict_shared();
        let mut rx = engine.subscribe();

        let long_ago = Utc::now() - chrono::Duration::seconds(10);
        for name in ["a", "b"] {
            let outcome = engine
                .enqueue_and_match_at(ConnectionId::from(name), picky_male(), long_ago)
                .unwrap();
            assert_eq!(outcome, MatchOutcome::Waiting);
        }

        let shutdown = CancellationToken::new();
        let handle = RetrySweeper::new(engine.clone(), Duration::from_millis(10))
            .spawn(shutdown.clone());

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("sweeper should pair within the timeout")
            .unwrap();
        assert_matches!(event, PairingEvent::Matched { relaxed: true, .. });
        assert_eq!(engine.stats().active_session_count, 1);

        shutdown.cancel();
        handle.await.unwrap();
        assert!(engine.metrics_snapshot().sweeps >= 1);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_cancel() {
        let shutdown = CancellationToken::new();
        let handle = RetrySweeper::new(strict_shared(), DEFAULT_SWEEP_INTERVAL).spawn(shutdown.clone());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should exit promptly")
            .unwrap();
    }

    #[test]
    fn test_from_config() {
        let cfg = config::SweeperConfig {
            enabled: true,
            interval_ms: 500,
        };
        let sweeper = RetrySweeper::from_config(strict_shared(), &cfg);
        assert_eq!(sweeper.interval(), Duration::from_millis(500));
        assert_eq!(sweeper.run_once().matched_count(), 0);
    }
}
