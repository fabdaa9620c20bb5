//! Crate error type.

use thiserror::Error;

/// Errors raised while building a trace, configuring a solver or checking
/// state invariants.
///
/// Contract violations inside the hot path (re-adding a key to an
/// [`IndexedRandomSet`](crate::collections::IndexedRandomSet), folding a diff
/// with unaccounted children, reading a stale state handle) panic instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("duplicate route `{0}`")]
    DuplicateRoute(String),

    #[error("duplicate candidate `{0}`")]
    DuplicateCandidate(String),

    #[error("candidate `{candidate}` lists route `{route}` more than once")]
    DuplicateCandidateRoute { candidate: String, route: String },

    #[error("candidate `{candidate}` references unknown route `{route}`")]
    UnknownRoute { candidate: String, route: String },

    #[error("score of candidate `{candidate}` on route `{route}` must be finite, got {score}")]
    InvalidScore {
        candidate: String,
        route: String,
        score: f64,
    },

    #[error("temperature schedule is empty")]
    EmptySchedule,

    #[error("temperature at epoch {epoch} must be finite and positive, got {value}")]
    InvalidTemperature { epoch: usize, value: f64 },

    #[error("unknown strategy `{0}`")]
    UnknownStrategy(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("state invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
