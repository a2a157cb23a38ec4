//! Pairing events
//!
//! Published after every committed pairing and every ended session so the
//! transport layer can notify the affected connections.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ConnectionId, EndedSession};
use crate::result::MatchedPair;

/// Something the transport layer has to tell a client about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PairingEvent {
    /// Two connections were paired
    Matched {
        session_id: Uuid,
        /// The connection whose attempt formed the pair
        first: ConnectionId,
        second: ConnectionId,
        score: f64,
        relaxed: bool,
    },

    /// A session was torn down by one side
    SessionEnded {
        session_id: Uuid,
        /// The side that left
        connection_id: ConnectionId,
        /// The side that has to be told
        partner_id: ConnectionId,
        duration_ms: i64,
    },
}

impl PairingEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            PairingEvent::Matched { session_id, .. } => *session_id,
            PairingEvent::SessionEnded { session_id, .. } => *session_id,
        }
    }

    /// Connections that must receive this event
    pub fn recipients(&self) -> Vec<&ConnectionId> {
        match self {
            PairingEvent::Matched { first, second, .. } => vec![first, second],
            PairingEvent::SessionEnded { partner_id, .. } => vec![partner_id],
        }
    }
}

impl From<&MatchedPair> for PairingEvent {
    fn from(pair: &MatchedPair) -> Self {
        PairingEvent::Matched {
            session_id: pair.session_id,
            first: pair.initiator.clone(),
            second: pair.partner.clone(),
            score: pair.score,
            relaxed: pair.relaxed,
        }
    }
}

impl From<&EndedSession> for PairingEvent {
    fn from(ended: &EndedSession) -> Self {
        PairingEvent::SessionEnded {
            session_id: ended.session_id,
            connection_id: ended.connection_id.clone(),
            partner_id: ended.partner_id.clone(),
            duration_ms: ended.duration().num_milliseconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ended_wire_format() {
        let event = PairingEvent::SessionEnded {
            session_id: Uuid::nil(),
            connection_id: "a".into(),
            partner_id: "b".into(),
            duration_ms: 1200,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "session_ended");
        assert_eq!(json["partner_id"], "b");
        assert_eq!(json["duration_ms"], 1200);
        assert_eq!(event.recipients(), vec![&ConnectionId::from("b")]);
    }

    #[test]
    fn test_matched_notifies_both_sides() {
        let pair = MatchedPair {
            initiator: "a".into(),
            partner: "b".into(),
            session_id: Uuid::new_v4(),
            score: 11.0,
            relaxed: true,
        };
        let event = PairingEvent::from(&pair);

        assert_eq!(event.session_id(), pair.session_id);
        assert_eq!(event.recipients().len(), 2);
        assert_eq!(serde_json::to_value(&event).unwrap()["type"], "matched");
    }
}
