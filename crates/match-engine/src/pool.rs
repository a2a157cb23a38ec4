//! Waiting pool
//!
//! Connections seeking a partner, keyed by connection id and enumerated in
//! insertion order. The order index is what makes tie-breaks deterministic.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::domain::{ConnectionId, MatchProfile, WaitingEntry};

/// Connections waiting for a partner
#[derive(Debug, Default)]
pub struct WaitingPool {
    /// Entries by connection id
    entries: HashMap<ConnectionId, WaitingEntry>,
    /// Insertion sequence -> connection id
    order: BTreeMap<u64, ConnectionId>,
    /// Next insertion sequence
    next_sequence: u64,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry with `joined_at = last_match_attempt = now`
    ///
    /// Returns `false` without touching the pool if the id is already
    /// waiting. Whether the id may wait at all (it must not hold a session)
    /// is decided by the engine, which owns both structures.
    pub fn enqueue(&mut self, id: ConnectionId, profile: MatchProfile, now: DateTime<Utc>) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.order.insert(sequence, id.clone());
        self.entries
            .insert(id.clone(), WaitingEntry::new(id, profile, now, sequence));
        true
    }

    /// Remove an entry. No-op if absent.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<WaitingEntry> {
        let entry = self.entries.remove(id)?;
        self.order.remove(&entry.sequence);
        Some(entry)
    }

    /// Record a failed match attempt
    pub fn touch(&mut self, id: &ConnectionId, now: DateTime<Utc>) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.last_match_attempt = now;
                true
            }
            None => false,
        }
    }

    /// Ids currently waiting, in insertion order
    ///
    /// The snapshot is detached from the pool: callers that mutate the pool
    /// while walking it must re-check [`WaitingPool::contains`] before
    /// visiting each id.
    pub fn snapshot(&self) -> Vec<ConnectionId> {
        self.order.values().cloned().collect()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &WaitingEntry> + '_ {
        self.order.values().filter_map(move |id| self.entries.get(id))
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&WaitingEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn id(s: &str) -> ConnectionId {
        ConnectionId::from(s)
    }

    #[test]
    fn test_enqueue_sets_timestamps() {
        let mut pool = WaitingPool::new();
        let now = Utc::now();

        assert!(pool.enqueue(id("a"), MatchProfile::default(), now));

        let entry = pool.get(&id("a")).unwrap();
        assert_eq!(entry.joined_at, now);
        assert_eq!(entry.last_match_attempt, now);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_duplicate_enqueue_keeps_original_entry() {
        let mut pool = WaitingPool::new();
        let now = Utc::now();

        pool.enqueue(id("a"), MatchProfile::new("male", "US"), now);
        let later = now + Duration::seconds(10);
        assert!(!pool.enqueue(id("a"), MatchProfile::new("female", "IN"), later));

        let entry = pool.get(&id("a")).unwrap();
        assert_eq!(entry.joined_at, now);
        assert_eq!(entry.profile.gender, "male");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let mut pool = WaitingPool::new();
        let now = Utc::now();

        for name in ["c", "a", "b"] {
            pool.enqueue(id(name), MatchProfile::default(), now);
        }
        pool.remove(&id("a"));
        pool.enqueue(id("a"), MatchProfile::default(), now);

        let order: Vec<_> = pool.iter().map(|e| e.connection_id.as_str().to_string()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
        assert_eq!(pool.snapshot(), vec![id("c"), id("b"), id("a")]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut pool = WaitingPool::new();
        pool.enqueue(id("a"), MatchProfile::default(), Utc::now());

        assert!(pool.remove(&id("a")).is_some());
        assert!(pool.remove(&id("a")).is_none());
        assert!(pool.is_empty());
        assert!(pool.snapshot().is_empty());
    }

    #[test]
    fn test_touch_updates_last_attempt_only() {
        let mut pool = WaitingPool::new();
        let now = Utc::now();
        pool.enqueue(id("a"), MatchProfile::default(), now);

        let later = now + Duration::milliseconds(1200);
        assert!(pool.touch(&id("a"), later));
        assert!(!pool.touch(&id("missing"), later));

        let entry = pool.get(&id("a")).unwrap();
        assert_eq!(entry.joined_at, now);
        assert_eq!(entry.last_match_attempt, later);
    }
}
