//! Active session table
//!
//! A symmetric relation: whenever `a -> b` is present, `b -> a` is present
//! too, and both directions share the same session id.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{ConnectionId, EndedSession};
use crate::error::MatchError;
use crate::Result;

/// One direction of an active pairing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLink {
    pub partner: ConnectionId,
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
}

/// Connections currently paired with each other
#[derive(Debug, Default)]
pub struct ActiveSessionTable {
    links: HashMap<ConnectionId, SessionLink>,
}

impl ActiveSessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair `a` with `b`, inserting both directions
    ///
    /// Fails without modifying the table if either side is already paired.
    pub fn pair(&mut self, a: &ConnectionId, b: &ConnectionId, now: DateTime<Utc>) -> Result<Uuid> {
        if a == b {
            return Err(MatchError::SelfPair(a.clone()));
        }
        if self.links.contains_key(a) {
            return Err(MatchError::AlreadyActive(a.clone()));
        }
        if self.links.contains_key(b) {
            return Err(MatchError::AlreadyActive(b.clone()));
        }

        let session_id = Uuid::new_v4();
        self.links.insert(
            a.clone(),
            SessionLink {
                partner: b.clone(),
                session_id,
                started_at: now,
            },
        );
        self.links.insert(
            b.clone(),
            SessionLink {
                partner: a.clone(),
                session_id,
                started_at: now,
            },
        );
        Ok(session_id)
    }

    /// Remove the pairing that `id` belongs to, both directions
    pub fn unpair(&mut self, id: &ConnectionId, now: DateTime<Utc>) -> Option<EndedSession> {
        let link = self.links.remove(id)?;
        self.links.remove(&link.partner);

        Some(EndedSession {
            connection_id: id.clone(),
            partner_id: link.partner,
            session_id: link.session_id,
            started_at: link.started_at,
            ended_at: now,
        })
    }

    pub fn partner_of(&self, id: &ConnectionId) -> Option<&ConnectionId> {
        self.links.get(id).map(|link| &link.partner)
    }

    pub fn session_of(&self, id: &ConnectionId) -> Option<&SessionLink> {
        self.links.get(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.links.contains_key(id)
    }

    /// Number of directed entries (two per session)
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of sessions
    pub fn session_count(&self) -> usize {
        self.links.len() / 2
    }
}
