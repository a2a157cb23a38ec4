//! Match engine error types

use thiserror::Error;

use crate::domain::ConnectionId;

/// Errors that can occur while queueing or pairing connections
///
/// Every variant describes a structural problem (the connection is in the
/// wrong state for the call). None of them are fatal to the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Enqueue attempted for a connection that already holds a session
    #[error("Connection already in an active session: {0}")]
    AlreadyActive(ConnectionId),

    /// Enqueue attempted for a connection that is already waiting
    #[error("Connection already waiting: {0}")]
    AlreadyWaiting(ConnectionId),

    /// Match attempted for a connection with no waiting entry
    #[error("Connection not waiting: {0}")]
    NotWaiting(ConnectionId),

    /// Lookup for a connection the engine does not know about
    #[error("Connection not found: {0}")]
    NotFound(ConnectionId),

    /// A connection cannot be paired with itself
    #[error("Connection cannot be paired with itself: {0}")]
    SelfPair(ConnectionId),
}
