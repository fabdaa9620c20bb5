//! Solver configuration and strategy selection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::anneal::{validate_temperatures, TemperatureSchedule};
use crate::error::{Error, Result};

/// Beam width used when a strategy name carries no size.
pub const DEFAULT_BEAM_SIZE: usize = 2;

fn default_beam_size() -> usize {
    DEFAULT_BEAM_SIZE
}

/// Search loop driving a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Single-chain simulated annealing.
    #[default]
    Anneal,

    /// Annealing over a beam of `size` states.
    BeamSearch {
        #[serde(default = "default_beam_size")]
        size: usize,
    },
}

impl FromStr for Strategy {
    type Err = Error;

    /// Accepts `anneal`, `beam_search` and `beamsearch` in any case.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anneal" => Ok(Self::Anneal),
            "beam_search" | "beamsearch" => Ok(Self::BeamSearch {
                size: DEFAULT_BEAM_SIZE,
            }),
            _ => Err(Error::UnknownStrategy(s.to_owned())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anneal => f.write_str("anneal"),
            Self::BeamSearch { size } => write!(f, "beam_search({size})"),
        }
    }
}

/// Configuration for [`AnnealSolver`](super::AnnealSolver).
///
/// Every field has a default, so a TOML file only needs the ones it changes.
///
/// # Examples
///
/// ```
/// use u_assign::anneal::TemperatureSchedule;
/// use u_assign::solver::{SolverConfig, Strategy};
///
/// let config = SolverConfig::default()
///     .with_epochs(500)
///     .with_temperature(TemperatureSchedule::exponential(50.0, 1.01))
///     .with_strategy(Strategy::BeamSearch { size: 4 })
///     .with_seed(42);
/// assert!(config.validate().is_ok());
///
/// let parsed = SolverConfig::from_toml_str(
///     r#"
///     epochs = 500
///     seed = 42
///
///     [temperature]
///     kind = "exponential"
///     initial = 50.0
///     coefficient = 1.01
///
///     [strategy]
///     kind = "beam_search"
///     size = 4
///     "#,
/// )
/// .unwrap();
/// assert_eq!(parsed, config);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Number of epochs; one temperature per epoch.
    pub epochs: usize,

    /// Independent solves per task, each with its own seed.
    pub retries: usize,

    /// Base random seed. Retry `i` uses `seed + i`. Drawn at random when
    /// unset.
    pub seed: Option<u64>,

    /// Recheck every final state from scratch after a solve.
    pub validate_states: bool,

    pub temperature: TemperatureSchedule,

    pub strategy: Strategy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            epochs: 1000,
            retries: 1,
            seed: None,
            validate_states: false,
            temperature: TemperatureSchedule::default(),
            strategy: Strategy::default(),
        }
    }
}

impl SolverConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_validate_states(mut self, validate: bool) -> Self {
        self.validate_states = validate;
        self
    }

    pub fn with_temperature(mut self, temperature: TemperatureSchedule) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Validates the configuration, including every temperature the
    /// schedule yields over `epochs`.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::Invalid("epochs must be at least 1".into()));
        }
        if self.retries == 0 {
            return Err(Error::Invalid("retries must be at least 1".into()));
        }
        if let Strategy::BeamSearch { size: 0 } = self.strategy {
            return Err(Error::Invalid("beam size must be at least 1".into()));
        }
        self.temperature.validate()?;
        validate_temperatures(&self.temperature.temperatures(self.epochs))
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
