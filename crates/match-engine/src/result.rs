//! Result types for pairing operations

use serde::Serialize;
use uuid::Uuid;

use crate::domain::ConnectionId;

/// A pairing committed by the engine
///
/// The engine never retracts a pairing; the caller must notify both sides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedPair {
    /// The connection whose attempt produced the match
    pub initiator: ConnectionId,
    /// The best-scoring candidate it was paired with
    pub partner: ConnectionId,
    pub session_id: Uuid,
    pub score: f64,
    /// Whether preference filters were skipped
    pub relaxed: bool,
}

impl MatchedPair {
    /// Whether `id` is one of the two sides
    pub fn involves(&self, id: &ConnectionId) -> bool {
        &self.initiator == id || &self.partner == id
    }
}

/// Result of a match attempt
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// A partner was found and the session is active
    Matched(MatchedPair),
    /// No compatible candidate yet; the entry stays in the pool
    Waiting,
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }

    /// The pair, if one was formed
    pub fn pair(&self) -> Option<&MatchedPair> {
        match self {
            MatchOutcome::Matched(pair) => Some(pair),
            MatchOutcome::Waiting => None,
        }
    }
}

/// Result of one retry sweep
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Pairs formed during the sweep, in the order they were made
    pub pairs: Vec<MatchedPair>,
    /// Entries that were due and got a match attempt
    pub attempted: usize,
    /// Attempts that found a partner but could not commit the pair
    pub failed: usize,
}

impl SweepReport {
    pub fn matched_count(&self) -> usize {
        self.pairs.len()
    }
}

/// Pool and table sizes at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub waiting_count: usize,
    pub active_session_count: usize,
    /// Waiting connections plus connections in a session
    pub total_connections: usize,
}
