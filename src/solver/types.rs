//! Tasks and their solve records.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::trace::{Trace, TraceData};

/// Record of one solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSolution {
    /// Seed the solve ran with.
    pub seed: u64,

    /// Score after every epoch, starting with the empty assignment. For beam
    /// search, the best score in the beam.
    pub score_history: Vec<f64>,

    /// Every score in the beam after every epoch. Single-chain runs record
    /// one score per epoch.
    pub score_history_all: Vec<Vec<f64>>,

    /// Highest score in `score_history`.
    pub best_score: f64,

    /// Score of `assignment`. Can fall below `best_score` when the run
    /// moved away from its best state and never returned.
    pub final_score: f64,

    /// `(candidate, route)` names of the state the run ended on, sorted by
    /// candidate id.
    pub assignment: Vec<(String, String)>,

    pub accepted_moves: usize,
}

/// One problem instance and every solve run on it.
#[derive(Debug, Clone)]
pub struct Task {
    pub trace: Arc<Trace>,
    pub solutions: Vec<TaskSolution>,
}

impl Task {
    pub fn new(trace: Arc<Trace>) -> Self {
        Self {
            trace,
            solutions: Vec::new(),
        }
    }

    /// Builds a task from its serialized trace.
    pub fn from_data(data: TraceData) -> Result<Self> {
        Ok(Self::new(Arc::new(Trace::try_from(data)?)))
    }

    /// Solve with the highest best score, if any ran.
    pub fn best(&self) -> Option<&TaskSolution> {
        self.solutions
            .iter()
            .max_by(|a, b| a.best_score.total_cmp(&b.best_score))
    }
}
