//! The annealing solver facade.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use super::config::{SolverConfig, Strategy};
use super::types::{Task, TaskSolution};
use crate::anneal::{validate_temperatures, AnnealRunner};
use crate::error::Result;
use crate::mutation::{Mutation, MutationNeighbor, NegatedScore};
use crate::state::{StateArena, StateId};
use crate::trace::Trace;

/// Maximizes assignment score with a fixed operator and configuration.
///
/// Each solve starts from the empty assignment, proposes moves by applying
/// the operator to a fresh diff, and minimizes the negated score.
pub struct AnnealSolver<M> {
    neighbor: MutationNeighbor<M>,
    config: SolverConfig,
    temperatures: Vec<f64>,
}

impl<M: Mutation> AnnealSolver<M> {
    /// # Errors
    ///
    /// Whatever [`SolverConfig::validate`] rejects, including schedules
    /// that underflow or overflow before the last epoch.
    pub fn new(mutation: M, config: SolverConfig) -> Result<Self> {
        config.validate()?;
        let temperatures = config.temperature.temperatures(config.epochs);
        validate_temperatures(&temperatures)?;
        Ok(Self {
            neighbor: MutationNeighbor::new(mutation),
            config,
            temperatures,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Runs one solve on `trace` with `seed`.
    pub fn solve(&self, trace: &Arc<Trace>, seed: u64) -> Result<TaskSolution> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut arena = StateArena::new(Arc::clone(trace));
        let root = arena.empty_solution();

        info!(
            event = "solve_start",
            strategy = %self.config.strategy,
            mutation = self.neighbor.mutation().name(),
            epochs = self.config.epochs,
            candidates = trace.candidate_count(),
            routes = trace.route_count(),
            seed,
        );

        let mut solution = TaskSolution {
            seed,
            ..TaskSolution::default()
        };

        let frontier: Vec<StateId> = match self.config.strategy {
            Strategy::Anneal => {
                let result = AnnealRunner::run(
                    &mut arena,
                    root,
                    &self.temperatures,
                    &NegatedScore,
                    &self.neighbor,
                    &mut rng,
                )?;
                for &(_, metric) in &result.history {
                    solution.score_history.push(-metric);
                    solution.score_history_all.push(vec![-metric]);
                }
                solution.accepted_moves = result.accepted_moves;
                vec![result.final_state().0]
            }
            Strategy::BeamSearch { size } => {
                let result = AnnealRunner::run_beam(
                    &mut arena,
                    root,
                    &self.temperatures,
                    &NegatedScore,
                    &self.neighbor,
                    size,
                    &mut rng,
                )?;
                for beam in &result.history {
                    let scores: Vec<f64> = beam.iter().map(|&(_, metric)| -metric).collect();
                    solution
                        .score_history
                        .push(scores.iter().copied().fold(f64::NEG_INFINITY, f64::max));
                    solution.score_history_all.push(scores);
                }
                solution.accepted_moves = result.accepted_moves;
                result.final_beam().iter().map(|&(state, _)| state).collect()
            }
        };

        if self.config.validate_states {
            for &state in &frontier {
                arena.state(state).validate()?;
            }
        }

        // Beams are sorted best first.
        let last = arena.state(frontier[0]);
        solution.final_score = last.score();
        solution.assignment = last
            .assignment()
            .into_iter()
            .map(|(candidate, route)| {
                (
                    trace.candidate_name(candidate).to_owned(),
                    trace.route_name(route).to_owned(),
                )
            })
            .collect();
        solution.best_score = solution
            .score_history
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        info!(
            event = "solve_end",
            best_score = solution.best_score,
            final_score = solution.final_score,
            baseline = trace.baseline_score(),
            accepted = solution.accepted_moves,
        );
        Ok(solution)
    }

    /// Runs `retries` solves on `task`, appending one record each.
    ///
    /// Retry `i` is seeded with `seed + i`; without a configured seed the
    /// base is drawn at random.
    pub fn solve_task(&self, task: &mut Task) -> Result<()> {
        let base = self.config.seed.unwrap_or_else(rand::random);
        for retry in 0..self.config.retries {
            let seed = base.wrapping_add(retry as u64);
            debug!(event = "retry", retry, of = self.config.retries, seed);
            let solution = self.solve(&task.trace, seed)?;
            task.solutions.push(solution);
        }
        Ok(())
    }

    /// Solves every task. Tasks run in parallel with the `parallel`
    /// feature.
    pub fn solve_all(&self, tasks: &mut [Task]) -> Result<()> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            tasks.par_iter_mut().try_for_each(|task| self.solve_task(task))
        }

        #[cfg(not(feature = "parallel"))]
        {
            tasks.iter_mut().try_for_each(|task| self.solve_task(task))
        }
    }
}
