//! Compatibility scoring
//!
//! A pure function of two waiting entries, the relaxed flag and the current
//! time. Strict mode enforces both sides' gender and country preferences;
//! relaxed mode treats them as advisory and only scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::WaitingEntry;

/// Weights applied by [`score`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Base score when both sides pass the strict filters
    pub strict_base: f64,
    /// Base score in relaxed mode
    pub relaxed_base: f64,
    /// Added per shared interest
    pub per_shared_interest: f64,
    /// Cap on the fairness bonus (one point per second waited)
    pub max_wait_bonus: f64,
    /// Added to every compatible pairing
    pub flat_bonus: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            strict_base: 50.0,
            relaxed_base: 10.0,
            per_shared_interest: 10.0,
            max_wait_bonus: 20.0,
            flat_bonus: 1.0,
        }
    }
}

impl From<&config::ScoreWeightsConfig> for ScoreWeights {
    fn from(cfg: &config::ScoreWeightsConfig) -> Self {
        Self {
            strict_base: cfg.strict_base,
            relaxed_base: cfg.relaxed_base,
            per_shared_interest: cfg.per_shared_interest,
            max_wait_bonus: cfg.max_wait_bonus,
            flat_bonus: cfg.flat_bonus,
        }
    }
}

/// Outcome of scoring one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compatibility {
    pub compatible: bool,
    pub score: f64,
}

impl Compatibility {
    pub fn incompatible() -> Self {
        Self {
            compatible: false,
            score: 0.0,
        }
    }
}

/// Both sides accept each other's gender and country
pub fn passes_filters(me: &WaitingEntry, other: &WaitingEntry) -> bool {
    let mine = &me.profile;
    let theirs = &other.profile;

    mine.preferences.gender.accepts(&theirs.gender)
        && theirs.preferences.gender.accepts(&mine.gender)
        && mine.preferences.country.accepts(&theirs.country)
        && theirs.preferences.country.accepts(&mine.country)
}

/// Score `other` as a partner for `me`
///
/// The fairness term rewards `other` for its own wait time, so among equal
/// candidates the one that has waited longest wins.
pub fn score(
    me: &WaitingEntry,
    other: &WaitingEntry,
    relaxed: bool,
    now: DateTime<Utc>,
    weights: &ScoreWeights,
) -> Compatibility {
    let mut total = if relaxed {
        weights.relaxed_base
    } else {
        if !passes_filters(me, other) {
            return Compatibility::incompatible();
        }
        weights.strict_base
    };

    total += weights.per_shared_interest * me.profile.shared_interests(&other.profile) as f64;

    let waited_secs = other.waited(now).num_milliseconds() as f64 / 1000.0;
    total += waited_secs.min(weights.max_wait_bonus);

    total += weights.flat_bonus;

    Compatibility {
        compatible: true,
        score: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MatchProfile, Preferences};
    use chrono::Duration;

    fn entry(profile: MatchProfile, joined_at: DateTime<Utc>) -> WaitingEntry {
        WaitingEntry::new("x".into(), profile, joined_at, 0)
    }

    #[test]
    fn test_strict_requires_mutual_gender() {
        let now = Utc::now();
        let w = ScoreWeights::default();
        let a = entry(
            MatchProfile::new("male", "US").with_preferences(Preferences::parse("female", "ANY")),
            now,
        );
        let b = entry(
            MatchProfile::new("female", "US").with_preferences(Preferences::parse("female", "ANY")),
            now,
        );

        // a wants female and gets one, but b wants female and a is male
        assert!(!score(&a, &b, false, now, &w).compatible);
        assert_eq!(score(&a, &b, false, now, &w).score, 0.0);
        assert!(!score(&b, &a, false, now, &w).compatible);
    }

    #[test]
    fn test_strict_requires_mutual_country() {
        let now = Utc::now();
        let w = ScoreWeights::default();
        let a = entry(
            MatchProfile::new("male", "US").with_preferences(Preferences::parse("any", "IN")),
            now,
        );
        let b_in = entry(MatchProfile::new("female", "IN"), now);
        let b_us = entry(MatchProfile::new("female", "US"), now);

        assert!(score(&a, &b_in, false, now, &w).compatible);
        assert!(!score(&a, &b_us, false, now, &w).compatible);
    }

    #[test]
    fn test_strict_perfect_match_score() {
        let now = Utc::now();
        let w = ScoreWeights::default();
        let a = entry(MatchProfile::new("male", "US"), now);
        let b = entry(MatchProfile::new("female", "US"), now);

        let result = score(&a, &b, false, now, &w);
        assert!(result.compatible);
        assert_eq!(result.score, 51.0);
    }

    #[test]
    fn test_relaxed_ignores_filters() {
        let now = Utc::now();
        let w = ScoreWeights::default();
        let a = entry(
            MatchProfile::new("male", "US").with_preferences(Preferences::parse("female", "JP")),
            now,
        );
        let b = entry(
            MatchProfile::new("male", "BR").with_preferences(Preferences::parse("female", "KR")),
            now,
        );

        let result = score(&a, &b, true, now, &w);
        assert!(result.compatible);
        assert_eq!(result.score, 11.0);
    }

    #[test]
    fn test_each_shared_interest_adds_ten() {
        let now = Utc::now();
        let w = ScoreWeights::default();
        let a = entry(MatchProfile::new("male", "US").with_interests(["Music", "Art", "Books"]), now);
        let one = entry(MatchProfile::new("female", "US").with_interests(["Music"]), now);
        let two = entry(MatchProfile::new("female", "US").with_interests(["Music", "Art"]), now);

        let s1 = score(&a, &one, true, now, &w).score;
        let s2 = score(&a, &two, true, now, &w).score;
        assert_eq!(s2 - s1, 10.0);
    }

    #[test]
    fn test_wait_bonus_uses_candidate_wait_and_caps() {
        let now = Utc::now();
        let w = ScoreWeights::default();
        let me = entry(MatchProfile::default(), now - Duration::seconds(100));

        let waited_5s = entry(MatchProfile::default(), now - Duration::milliseconds(5500));
        assert_eq!(score(&me, &waited_5s, true, now, &w).score, 10.0 + 5.5 + 1.0);

        let waited_long = entry(MatchProfile::default(), now - Duration::minutes(5));
        assert_eq!(score(&me, &waited_long, true, now, &w).score, 10.0 + 20.0 + 1.0);
    }

    #[test]
    fn test_clock_skew_gives_no_negative_bonus() {
        let now = Utc::now();
        let w = ScoreWeights::default();
        let me = entry(MatchProfile::default(), now);
        let future = entry(MatchProfile::default(), now + Duration::seconds(3));

        assert_eq!(score(&me, &future, true, now, &w).score, 11.0);
    }
}
