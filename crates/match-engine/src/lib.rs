//! Pairing engine for Duet
//!
//! Pairs anonymous connections one-to-one based on soft preferences
//! (gender, country, shared interests) and how long they have waited.
//!
//! # Components
//!
//! - [`WaitingPool`] - connections seeking a partner, in arrival order
//! - [`ActiveSessionTable`] - symmetric map of paired connections
//! - [`scorer`] - compatibility check and desirability score
//! - [`MatchEngine`] - the only code that mutates the pool and the table
//! - [`RetrySweeper`] - periodic retry of connections still waiting
//!
//! [`SharedMatchEngine`] wraps the engine for use from many tasks and
//! publishes a [`PairingEvent`] for every pairing and ended session.

pub mod domain;
pub mod engine;
pub mod error;
pub mod event;
pub mod metrics;
pub mod pool;
pub mod result;
pub mod scorer;
pub mod sessions;
pub mod shared;
pub mod sweeper;

pub use domain::{ConnectionId, EndedSession, MatchProfile, Preference, Preferences, WaitingEntry};
pub use engine::{MatchEngine, MatchPolicy};
pub use error::MatchError;
pub use event::PairingEvent;
pub use metrics::{MatchEngineMetrics, MetricsSnapshot};
pub use pool::WaitingPool;
pub use result::{MatchOutcome, MatchStats, MatchedPair, SweepReport};
pub use scorer::{Compatibility, ScoreWeights};
pub use sessions::{ActiveSessionTable, SessionLink};
pub use shared::SharedMatchEngine;
pub use sweeper::RetrySweeper;

/// Result type for pairing operations
pub type Result<T> = std::result::Result<T, MatchError>;
