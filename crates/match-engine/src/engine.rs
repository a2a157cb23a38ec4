//! Core Match Engine
//!
//! This module owns the waiting pool and the active session table and is the
//! only place either of them is mutated.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::{ConnectionId, EndedSession, MatchProfile};
use crate::error::MatchError;
use crate::metrics::{MatchEngineMetrics, MetricsSnapshot};
use crate::pool::WaitingPool;
use crate::result::{MatchOutcome, MatchStats, MatchedPair, SweepReport};
use crate::scorer::{self, ScoreWeights};
use crate::sessions::{ActiveSessionTable, SessionLink};
use crate::Result;

/// Tunables for the pairing algorithm
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPolicy {
    /// Wait after which preference filters are dropped
    pub relax_after: Duration,
    /// Minimum gap between two attempts for the same entry during a sweep
    pub retry_cooldown: Duration,
    /// Arrival and sweep attempts always score in relaxed mode
    ///
    /// When `false`, both start strict and an entry is only relaxed once it
    /// has waited longer than `relax_after`.
    pub always_relaxed: bool,
    pub weights: ScoreWeights,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            relax_after: Duration::milliseconds(3000),
            retry_cooldown: Duration::milliseconds(1000),
            always_relaxed: true,
            weights: ScoreWeights::default(),
        }
    }
}

impl From<&config::MatchingConfig> for MatchPolicy {
    fn from(cfg: &config::MatchingConfig) -> Self {
        Self {
            relax_after: millis(cfg.relax_after_ms),
            retry_cooldown: millis(cfg.retry_cooldown_ms),
            always_relaxed: cfg.always_relaxed,
            weights: ScoreWeights::from(&cfg.weights),
        }
    }
}

/// Milliseconds beyond what `Duration` can hold saturate at `Duration::MAX`
fn millis(ms: u64) -> Duration {
    i64::try_from(ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .unwrap_or(Duration::MAX)
}

/// Match Engine - pairs waiting connections
///
/// INVARIANTS:
/// 1. An id is never both waiting and in a session
/// 2. Sessions are symmetric (`partner_of(partner_of(a)) == a`)
/// 3. A connection is never paired with itself
/// 4. Candidates are scanned in pool insertion order; on equal scores the
///    earlier one wins
pub struct MatchEngine {
    pool: WaitingPool,
    sessions: ActiveSessionTable,
    policy: MatchPolicy,
    metrics: Arc<MatchEngineMetrics>,
}

impl MatchEngine {
    /// Create an engine with the default policy
    pub fn new() -> Self {
        Self::with_policy(MatchPolicy::default())
    }

    pub fn with_policy(policy: MatchPolicy) -> Self {
        Self {
            pool: WaitingPool::new(),
            sessions: ActiveSessionTable::new(),
            policy,
            metrics: Arc::new(MatchEngineMetrics::new()),
        }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Shared handle to the engine counters
    pub fn metrics(&self) -> Arc<MatchEngineMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Add a connection to the pool and try to pair it straight away
    pub fn enqueue_and_match(
        &mut self,
        id: ConnectionId,
        profile: MatchProfile,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome> {
        if self.sessions.contains(&id) {
            warn!(connection = %id, "Enqueue rejected: already in a session");
            self.metrics.enqueue_rejected.increment();
            return Err(MatchError::AlreadyActive(id));
        }
        if !self.pool.enqueue(id.clone(), profile, now) {
            warn!(connection = %id, "Enqueue rejected: already waiting");
            self.metrics.enqueue_rejected.increment();
            return Err(MatchError::AlreadyWaiting(id));
        }

        self.metrics.enqueued.increment();
        debug!(connection = %id, waiting = self.pool.len(), "Connection added to pool");

        self.try_match(&id, self.policy.always_relaxed, now)
    }

    /// Look for the best partner for a waiting connection
    ///
    /// 1. Decide relaxed vs strict from `aggressive` and the entry's wait
    /// 2. Score every other waiting entry (insertion order)
    /// 3. Commit the best compatible one, or record the failed attempt
    pub fn try_match(
        &mut self,
        id: &ConnectionId,
        aggressive: bool,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome> {
        let entry = self
            .pool
            .get(id)
            .ok_or_else(|| MatchError::NotWaiting(id.clone()))?;

        self.metrics.match_attempts.increment();

        let waited = entry.waited(now);
        let relaxed = aggressive || waited > self.policy.relax_after;

        let mut best: Option<(&ConnectionId, f64)> = None;
        for other in self.pool.iter() {
            if &other.connection_id == id || self.sessions.contains(&other.connection_id) {
                continue;
            }

            let result = scorer::score(entry, other, relaxed, now, &self.policy.weights);
            if !result.compatible {
                continue;
            }

            // Strictly greater: an earlier candidate keeps an equal score
            match best {
                Some((_, best_score)) if result.score <= best_score => {}
                _ => best = Some((&other.connection_id, result.score)),
            }
        }

        let Some((partner, score)) = best.map(|(p, s)| (p.clone(), s)) else {
            self.pool.touch(id, now);
            self.metrics.match_misses.increment();
            debug!(
                connection = %id,
                relaxed,
                wait_ms = waited.num_milliseconds(),
                "No partner available"
            );
            return Ok(MatchOutcome::Waiting);
        };

        let session_id = self.sessions.pair(id, &partner, now)?;
        self.pool.remove(id);
        self.pool.remove(&partner);
        self.metrics.record_pair(relaxed);

        info!(
            connection = %id,
            partner = %partner,
            %session_id,
            score,
            relaxed,
            wait_ms = waited.num_milliseconds(),
            "Match found"
        );

        Ok(MatchOutcome::Matched(MatchedPair {
            initiator: id.clone(),
            partner,
            session_id,
            score,
            relaxed,
        }))
    }

    /// Retry every entry whose last attempt is at least `retry_cooldown` old
    ///
    /// Entries paired earlier in the same sweep are skipped.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> SweepReport {
        let started = Instant::now();
        let mut report = SweepReport::default();

        for id in self.pool.snapshot() {
            let due = match self.pool.get(&id) {
                Some(entry) => entry.since_last_attempt(now) >= self.policy.retry_cooldown,
                None => continue,
            };
            if !due {
                continue;
            }

            report.attempted += 1;
            match self.try_match(&id, self.policy.always_relaxed, now) {
                Ok(MatchOutcome::Matched(pair)) => report.pairs.push(pair),
                Ok(MatchOutcome::Waiting) => {}
                Err(e) => {
                    warn!(connection = %id, error = %e, "Sweep attempt failed");
                    report.failed += 1;
                }
            }
        }

        self.metrics.record_sweep(started.elapsed());
        if report.matched_count() > 0 {
            info!(
                pairs = report.matched_count(),
                attempted = report.attempted,
                still_waiting = self.pool.len(),
                "Retry sweep matched waiting connections"
            );
        }

        report
    }

    /// Remove a connection from whichever structure holds it
    ///
    /// Returns the ended session if the connection was paired, so the
    /// caller can notify the former partner. Idempotent.
    pub fn disconnect(&mut self, id: &ConnectionId, now: DateTime<Utc>) -> Option<EndedSession> {
        let was_waiting = self.pool.remove(id).is_some();
        let ended = self.end_session(id, now);

        if was_waiting || ended.is_some() {
            self.metrics.disconnects.increment();
            debug!(connection = %id, was_waiting, "Connection cleaned up");
        }
        ended
    }

    /// End the session `id` is in, leaving both sides idle
    pub fn end_session(&mut self, id: &ConnectionId, now: DateTime<Utc>) -> Option<EndedSession> {
        let ended = self.sessions.unpair(id, now)?;
        self.metrics.sessions_ended.increment();

        info!(
            connection = %id,
            partner = %ended.partner_id,
            session_id = %ended.session_id,
            duration_ms = ended.duration().num_milliseconds(),
            "Session ended"
        );
        Some(ended)
    }

    /// Take a connection out of the pool without touching sessions
    pub fn leave_queue(&mut self, id: &ConnectionId) -> bool {
        let removed = self.pool.remove(id).is_some();
        if removed {
            debug!(connection = %id, "Connection left the pool");
        }
        removed
    }

    pub fn partner_of(&self, id: &ConnectionId) -> Option<&ConnectionId> {
        self.sessions.partner_of(id)
    }

    /// Like [`MatchEngine::partner_of`], but an unknown id is an error
    pub fn require_partner(&self, id: &ConnectionId) -> Result<&ConnectionId> {
        self.sessions
            .partner_of(id)
            .ok_or_else(|| MatchError::NotFound(id.clone()))
    }

    pub fn session_of(&self, id: &ConnectionId) -> Option<&SessionLink> {
        self.sessions.session_of(id)
    }

    pub fn is_waiting(&self, id: &ConnectionId) -> bool {
        self.pool.contains(id)
    }

    pub fn is_active(&self, id: &ConnectionId) -> bool {
        self.sessions.contains(id)
    }

    pub fn stats(&self) -> MatchStats {
        MatchStats {
            waiting_count: self.pool.len(),
            active_session_count: self.sessions.session_count(),
            total_connections: self.pool.len() + self.sessions.len(),
        }
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
