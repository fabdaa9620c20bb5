//! Simulated annealing and its beam-search variant.
//!
//! Both loops minimize a [`Metric`] over the states of a [`StateSpace`],
//! using a [`Neighbor`] to propose moves and the Metropolis rule
//! ([`evaluate_probability`]) to accept them. One temperature is consumed
//! per epoch; the run length is the length of the temperature list.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Cerny (1985), "Thermodynamical Approach to the Travelling Salesman Problem"

mod runner;
mod schedule;
mod types;

pub use runner::{evaluate_probability, keep_best, AnnealResult, AnnealRunner, BeamResult};
pub use schedule::{validate_temperatures, TemperatureSchedule};
pub use types::{Metric, Neighbor, StateSpace};
