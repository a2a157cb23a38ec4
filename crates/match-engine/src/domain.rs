//! Domain types for the Match Engine
//!
//! This module defines the connection, profile and waiting-entry types that
//! the pool, the session table and the scorer share.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Sentinel meaning "any gender" in a gender preference
pub const ANY_GENDER: &str = "any";

/// Sentinel meaning "any country" in a country preference
pub const ANY_COUNTRY: &str = "ANY";

// ============================================================================
// Connection Id
// ============================================================================

/// Opaque, caller-supplied identifier of one live connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a connection id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// Preferences
// ============================================================================

/// A desired partner attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Preference {
    /// No constraint
    #[default]
    Any,
    /// Partner attribute must equal this value
    Only(String),
}

impl Preference {
    /// Parse a raw preference, mapping `sentinel` to [`Preference::Any`]
    ///
    /// The comparison is exact: gender uses `any`, country uses `ANY`.
    pub fn parse(raw: &str, sentinel: &str) -> Self {
        if raw == sentinel {
            Preference::Any
        } else {
            Preference::Only(raw.to_string())
        }
    }

    /// Whether a partner with attribute `value` satisfies this preference
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Preference::Any => true,
            Preference::Only(wanted) => wanted == value,
        }
    }

    /// Render back to the wire form, using `sentinel` for [`Preference::Any`]
    pub fn as_str<'a>(&'a self, sentinel: &'a str) -> &'a str {
        match self {
            Preference::Any => sentinel,
            Preference::Only(value) => value,
        }
    }
}

macro_rules! preference_serde {
    ($module:ident, $sentinel:expr) => {
        mod $module {
            use super::Preference;
            use serde::{Deserialize, Deserializer, Serializer};

            pub fn serialize<S: Serializer>(pref: &Preference, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(pref.as_str($sentinel))
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Preference, D::Error> {
                let raw = String::deserialize(d)?;
                Ok(Preference::parse(&raw, $sentinel))
            }
        }
    };
}

preference_serde!(gender_preference, super::ANY_GENDER);
preference_serde!(country_preference, super::ANY_COUNTRY);

/// What a connection is looking for in a partner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Desired partner gender (`any` for no constraint)
    #[serde(default, with = "gender_preference")]
    pub gender: Preference,
    /// Desired partner country (`ANY` for no constraint)
    #[serde(default, with = "country_preference")]
    pub country: Preference,
}

impl Preferences {
    /// No constraints at all
    pub fn any() -> Self {
        Self::default()
    }

    /// Parse raw gender/country preference strings
    pub fn parse(gender: &str, country: &str) -> Self {
        Self {
            gender: Preference::parse(gender, ANY_GENDER),
            country: Preference::parse(country, ANY_COUNTRY),
        }
    }
}

// ============================================================================
// Match Profile
// ============================================================================

/// Attributes a connection supplies on arrival
///
/// `gender` and `country` describe the connection itself and are what the
/// other side's preferences are checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchProfile {
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub interests: BTreeSet<String>,
    /// Absent preferences mean no constraint, so such a profile passes
    /// strict filters
    #[serde(default)]
    pub preferences: Preferences,
}

impl MatchProfile {
    /// Create a profile with no preferences and no interests
    pub fn new(gender: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            gender: gender.into(),
            country: country.into(),
            interests: BTreeSet::new(),
            preferences: Preferences::any(),
        }
    }

    /// Set the partner preferences
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Add interest tags
    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests.extend(interests.into_iter().map(Into::into));
        self
    }

    /// Number of interest tags shared with `other`
    pub fn shared_interests(&self, other: &MatchProfile) -> usize {
        self.interests.intersection(&other.interests).count()
    }
}

// ============================================================================
// Waiting Entry
// ============================================================================

/// A connection currently unpaired and seeking a partner
#[derive(Debug, Clone, Serialize)]
pub struct WaitingEntry {
    pub connection_id: ConnectionId,
    pub profile: MatchProfile,
    /// Set once, on enqueue
    pub joined_at: DateTime<Utc>,
    /// Updated on every failed match attempt
    pub last_match_attempt: DateTime<Utc>,
    /// Insertion order within the pool
    pub sequence: u64,
}

impl WaitingEntry {
    pub fn new(
        connection_id: ConnectionId,
        profile: MatchProfile,
        now: DateTime<Utc>,
        sequence: u64,
    ) -> Self {
        Self {
            connection_id,
            profile,
            joined_at: now,
            last_match_attempt: now,
            sequence,
        }
    }

    /// Time spent in the pool so far, never negative
    pub fn waited(&self, now: DateTime<Utc>) -> Duration {
        (now - self.joined_at).max(Duration::zero())
    }

    /// Time since the last failed attempt, never negative
    pub fn since_last_attempt(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_match_attempt).max(Duration::zero())
    }
}

// ============================================================================
// Ended Session
// ============================================================================

/// Record of a session that was just torn down
///
/// `partner_id` is the side the caller still has to notify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndedSession {
    pub connection_id: ConnectionId,
    pub partner_id: ConnectionId,
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl EndedSession {
    /// How long the session lasted
    pub fn duration(&self) -> Duration {
        (self.ended_at - self.started_at).max(Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_sentinels_are_exact() {
        assert_eq!(Preference::parse("any", ANY_GENDER), Preference::Any);
        assert_eq!(Preference::parse("ANY", ANY_COUNTRY), Preference::Any);
        // The gender sentinel is lowercase only
        assert_eq!(
            Preference::parse("ANY", ANY_GENDER),
            Preference::Only("ANY".to_string())
        );
    }

    #[test]
    fn test_preference_accepts() {
        let pref = Preference::Only("female".to_string());
        assert!(pref.accepts("female"));
        assert!(!pref.accepts("male"));
        assert!(Preference::Any.accepts("anything"));
    }

    #[test]
    fn test_profile_deserializes_sentinels() {
        let json = r#"{
            "gender": "male",
            "country": "US",
            "interests": ["Music", "Gaming", "Music"],
            "preferences": { "gender": "any", "country": "IN" }
        }"#;
        let profile: MatchProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.interests.len(), 2);
        assert_eq!(profile.preferences.gender, Preference::Any);
        assert_eq!(profile.preferences.country, Preference::Only("IN".to_string()));

        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back["preferences"]["gender"], "any");
        assert_eq!(back["preferences"]["country"], "IN");
    }

    #[test]
    fn test_missing_preferences_default_to_any() {
        let profile: MatchProfile = serde_json::from_str(r#"{"gender": "female"}"#).unwrap();
        assert_eq!(profile.preferences, Preferences::any());
        assert!(profile.interests.is_empty());

        let partial: MatchProfile =
            serde_json::from_str(r#"{"gender": "male", "preferences": {"gender": "female"}}"#).unwrap();
        assert_eq!(partial.preferences.country, Preference::Any);
    }

    #[test]
    fn test_missing_preferences_pass_strict_filters() {
        let now = Utc::now();
        let bare: MatchProfile = serde_json::from_str(r#"{"gender": "female", "country": "DE"}"#).unwrap();
        let picky = MatchProfile::new("male", "US").with_preferences(Preferences::parse("female", "ANY"));

        let a = WaitingEntry::new("a".into(), bare, now, 0);
        let b = WaitingEntry::new("b".into(), picky, now, 1);
        assert!(crate::scorer::passes_filters(&a, &b));
        assert!(crate::scorer::passes_filters(&b, &a));
    }

    #[test]
    fn test_shared_interests() {
        let a = MatchProfile::new("male", "US").with_interests(["Music", "Art", "Books"]);
        let b = MatchProfile::new("female", "IN").with_interests(["Books", "Music", "Yoga"]);
        assert_eq!(a.shared_interests(&b), 2);
        assert_eq!(b.shared_interests(&a), 2);
    }

    #[test]
    fn test_waited_never_negative() {
        let now = Utc::now();
        let entry = WaitingEntry::new("a".into(), MatchProfile::default(), now, 0);
        assert_eq!(entry.waited(now - Duration::seconds(5)), Duration::zero());
        assert_eq!(entry.waited(now + Duration::milliseconds(1500)).num_milliseconds(), 1500);
    }
}
