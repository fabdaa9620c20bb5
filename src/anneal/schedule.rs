//! Temperature schedules.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn default_floor() -> f64 {
    1e-9
}

/// Per-epoch temperature sequence.
///
/// # Examples
///
/// ```
/// use u_assign::anneal::TemperatureSchedule;
///
/// let linear = TemperatureSchedule::linear(10.0);
/// assert_eq!(linear.temperatures(3), vec![10.0, 5.0, 1e-9]);
///
/// let schedule: TemperatureSchedule =
///     toml::from_str("kind = \"exponential\"\ninitial = 8.0\ncoefficient = 2.0").unwrap();
/// assert_eq!(schedule.temperatures(3), vec![8.0, 4.0, 2.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemperatureSchedule {
    /// Evenly spaced from `initial` down to zero, with the final zero
    /// replaced by `floor`.
    Linear {
        initial: f64,
        #[serde(default = "default_floor")]
        floor: f64,
    },

    /// `initial * coefficient^-k` for epoch `k`.
    Exponential { initial: f64, coefficient: f64 },
}

impl Default for TemperatureSchedule {
    fn default() -> Self {
        Self::linear(100.0)
    }
}

impl TemperatureSchedule {
    /// Linear schedule with the default floor.
    pub fn linear(initial: f64) -> Self {
        Self::Linear {
            initial,
            floor: default_floor(),
        }
    }

    pub fn exponential(initial: f64, coefficient: f64) -> Self {
        Self::Exponential {
            initial,
            coefficient,
        }
    }

    /// Checks each parameter is positive and finite.
    ///
    /// A long exponential schedule can still underflow to zero or overflow;
    /// run [`validate_temperatures`] on the materialized list for that.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::Invalid(format!(
                    "temperature {name} must be positive and finite, got {value}"
                )))
            }
        };
        match *self {
            Self::Linear { initial, floor } => {
                positive("initial", initial)?;
                positive("floor", floor)
            }
            Self::Exponential {
                initial,
                coefficient,
            } => {
                positive("initial", initial)?;
                positive("coefficient", coefficient)
            }
        }
    }

    /// Temperatures for `epochs` epochs.
    pub fn temperatures(&self, epochs: usize) -> Vec<f64> {
        match *self {
            Self::Linear { initial, floor } => {
                let mut values: Vec<f64> = match epochs {
                    0 => Vec::new(),
                    1 => vec![initial],
                    _ => {
                        let last = (epochs - 1) as f64;
                        (0..epochs)
                            .map(|k| initial * (1.0 - k as f64 / last))
                            .collect()
                    }
                };
                if let Some(last) = values.last_mut() {
                    *last = floor;
                }
                values
            }
            Self::Exponential {
                initial,
                coefficient,
            } => (0..epochs)
                .map(|k| initial * coefficient.powf(-(k as f64)))
                .collect(),
        }
    }
}

/// Rejects empty schedules and any entry that is not a positive finite
/// number.
pub fn validate_temperatures(temperatures: &[f64]) -> Result<()> {
    if temperatures.is_empty() {
        return Err(Error::EmptySchedule);
    }
    match temperatures
        .iter()
        .position(|t| !(t.is_finite() && *t > 0.0))
    {
        Some(epoch) => Err(Error::InvalidTemperature {
            epoch,
            value: temperatures[epoch],
        }),
        None => Ok(()),
    }
}
