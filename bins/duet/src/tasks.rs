//! Background tasks run next to the retry sweeper

use match_engine::{PairingEvent, SharedMatchEngine};
use observability::EngineGauges;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Log every pairing event as JSON until cancelled
///
/// Stands in for client notification: the payload is what each recipient
/// would be sent.
pub fn spawn_event_logger(engine: &SharedMatchEngine, shutdown: CancellationToken) -> JoinHandle<()> {
    let mut events = engine.subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(event) => log_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event logger fell behind, events dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Pairing event channel closed");
                        return;
                    }
                },
                _ = shutdown.cancelled() => {
                    debug!("Event logger shutting down");
                    return;
                }
            }
        }
    })
}

fn log_event(event: &PairingEvent) {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Failed to serialize pairing event");
            return;
        }
    };

    for recipient in event.recipients() {
        info!(
            session_id = %event.session_id(),
            recipient = %recipient,
            %payload,
            "Notify connection"
        );
    }
}

/// Mirror engine counters into the Prometheus exporter on a fixed interval
pub fn spawn_metrics_publisher(
    engine: SharedMatchEngine,
    gauges: EngineGauges,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    gauges.publish(&engine.metrics_snapshot(), &engine.stats());
                }
                _ = shutdown.cancelled() => {
                    // Final sample so the last scrape sees the shutdown state
                    gauges.publish(&engine.metrics_snapshot(), &engine.stats());
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as TimeDelta, Utc};
    use match_engine::{ConnectionId, MatchEngine, MatchProfile, Preferences};

    fn profile() -> MatchProfile {
        MatchProfile::new("female", "DE").with_preferences(Preferences::any())
    }

    #[tokio::test]
    async fn test_event_logger_stops_on_cancel() {
        let engine = SharedMatchEngine::new(MatchEngine::new());
        let token = CancellationToken::new();
        let handle = spawn_event_logger(&engine, token.clone());

        let now = Utc::now();
        engine
            .enqueue_and_match_at(ConnectionId::from("a"), profile(), now)
            .unwrap();
        engine
            .enqueue_and_match_at(ConnectionId::from("b"), profile(), now + TimeDelta::milliseconds(5))
            .unwrap();

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_metrics_publisher_stops_on_cancel() {
        let engine = SharedMatchEngine::new(MatchEngine::new());
        let token = CancellationToken::new();
        let handle = spawn_metrics_publisher(
            engine,
            EngineGauges::new("test"),
            Duration::from_millis(10),
            token.clone(),
        );

        tokio::time::sleep(Duration::from_millis(25)).await;
        token.cancel();
        handle.await.unwrap();
    }
}
