//! Thread-safe engine handle
//!
//! Every mutating call runs inside one write-lock critical section, so no
//! observer ever sees a half-applied pairing. Read-only calls share the
//! read lock. Events are sent before the write guard is dropped, so
//! subscribers see them in commit order.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::{ConnectionId, EndedSession, MatchProfile};
use crate::engine::MatchEngine;
use crate::event::PairingEvent;
use crate::metrics::{MatchEngineMetrics, MetricsSnapshot};
use crate::result::{MatchOutcome, MatchStats, SweepReport};
use crate::Result;

/// Default capacity of the pairing event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Cloneable handle to a single authoritative [`MatchEngine`]
#[derive(Clone)]
pub struct SharedMatchEngine {
    inner: Arc<RwLock<MatchEngine>>,
    events: broadcast::Sender<PairingEvent>,
    metrics: Arc<MatchEngineMetrics>,
}

impl SharedMatchEngine {
    pub fn new(engine: MatchEngine) -> Self {
        Self::with_event_capacity(engine, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(engine: MatchEngine, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        let metrics = engine.metrics();
        Self {
            inner: Arc::new(RwLock::new(engine)),
            events,
            metrics,
        }
    }

    /// Receive pairing events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PairingEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: PairingEvent) {
        if self.events.send(event).is_err() {
            trace!("No pairing event subscribers");
        }
    }

    pub fn enqueue_and_match(&self, id: ConnectionId, profile: MatchProfile) -> Result<MatchOutcome> {
        self.enqueue_and_match_at(id, profile, Utc::now())
    }

    pub fn enqueue_and_match_at(
        &self,
        id: ConnectionId,
        profile: MatchProfile,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome> {
        let mut engine = self.inner.write();
        let outcome = engine.enqueue_and_match(id, profile, now)?;
        if let Some(pair) = outcome.pair() {
            self.publish(PairingEvent::from(pair));
        }
        Ok(outcome)
    }

    pub fn try_match(&self, id: &ConnectionId, aggressive: bool) -> Result<MatchOutcome> {
        let mut engine = self.inner.write();
        let outcome = engine.try_match(id, aggressive, Utc::now())?;
        if let Some(pair) = outcome.pair() {
            self.publish(PairingEvent::from(pair));
        }
        Ok(outcome)
    }

    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let mut engine = self.inner.write();
        let report = engine.sweep(now);
        for pair in &report.pairs {
            self.publish(PairingEvent::from(pair));
        }
        report
    }

    pub fn disconnect(&self, id: &ConnectionId) -> Option<EndedSession> {
        self.disconnect_at(id, Utc::now())
    }

    pub fn disconnect_at(&self, id: &ConnectionId, now: DateTime<Utc>) -> Option<EndedSession> {
        let mut engine = self.inner.write();
        let ended = engine.disconnect(id, now);
        if let Some(ended) = &ended {
            self.publish(PairingEvent::from(ended));
        }
        ended
    }

    pub fn end_session(&self, id: &ConnectionId) -> Option<EndedSession> {
        let mut engine = self.inner.write();
        let ended = engine.end_session(id, Utc::now());
        if let Some(ended) = &ended {
            self.publish(PairingEvent::from(ended));
        }
        ended
    }

    pub fn leave_queue(&self, id: &ConnectionId) -> bool {
        self.inner.write().leave_queue(id)
    }

    pub fn partner_of(&self, id: &ConnectionId) -> Option<ConnectionId> {
        self.inner.read().partner_of(id).cloned()
    }

    pub fn is_waiting(&self, id: &ConnectionId) -> bool {
        self.inner.read().is_waiting(id)
    }

    pub fn is_active(&self, id: &ConnectionId) -> bool {
        self.inner.read().is_active(id)
    }

    pub fn stats(&self) -> MatchStats {
        self.inner.read().stats()
    }

    /// Counters are atomics; reading them does not take the engine lock
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
