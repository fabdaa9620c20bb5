//! Annealing and beam-search loops.

use std::collections::HashSet;
use std::hash::Hash;

use rand::Rng;
use tracing::debug;

use super::schedule::validate_temperatures;
use super::types::{Metric, Neighbor, StateSpace};
use crate::error::{Error, Result};

/// Probability of moving from a state with metric `f_curr` to one with
/// `f_next`: `exp(min(0, -(f_next - f_curr) / temperature))`.
///
/// # Panics
///
/// If `temperature` is not positive.
pub fn evaluate_probability(f_curr: f64, f_next: f64, temperature: f64) -> f64 {
    assert!(
        temperature > 0.0,
        "temperature must be positive, got {temperature}"
    );
    (-(f_next - f_curr) / temperature).min(0.0).exp()
}

/// Keeps the `n` lowest-metric entries, dropping repeated handles.
///
/// Ties keep their input order.
pub fn keep_best<T: Copy + Eq + Hash>(mut entries: Vec<(T, f64)>, n: usize) -> Vec<(T, f64)> {
    entries.sort_by(|a, b| a.1.total_cmp(&b.1));
    let mut seen = HashSet::with_capacity(n);
    let mut kept = Vec::with_capacity(n);
    for (state, metric) in entries {
        if kept.len() == n {
            break;
        }
        if seen.insert(state) {
            kept.push((state, metric));
        }
    }
    kept
}

/// Result of a single-chain run.
#[derive(Debug, Clone)]
pub struct AnnealResult<T> {
    /// `(state, metric)` after every epoch, starting with the initial state.
    ///
    /// Only the last handle is guaranteed to still be live.
    pub history: Vec<(T, f64)>,

    /// Number of proposals taken.
    pub accepted_moves: usize,

    /// Number of proposals with a strictly lower metric.
    pub improving_moves: usize,
}

impl<T: Copy> AnnealResult<T> {
    /// The state the chain ended on.
    pub fn final_state(&self) -> (T, f64) {
        self.history[self.history.len() - 1]
    }

    /// Lowest metric seen over the run.
    pub fn best_metric(&self) -> f64 {
        self.history
            .iter()
            .map(|&(_, metric)| metric)
            .fold(f64::INFINITY, f64::min)
    }
}

/// Result of a beam-search run.
#[derive(Debug, Clone)]
pub struct BeamResult<T> {
    /// The beam after every epoch, each sorted by ascending metric.
    ///
    /// Only the last beam's handles are guaranteed to still be live.
    pub history: Vec<Vec<(T, f64)>>,

    pub accepted_moves: usize,

    pub improving_moves: usize,
}

impl<T: Copy> BeamResult<T> {
    /// The beam the run ended with.
    pub fn final_beam(&self) -> &[(T, f64)] {
        &self.history[self.history.len() - 1]
    }

    /// Best entry of the final beam.
    pub fn best(&self) -> (T, f64) {
        self.final_beam()[0]
    }

    pub fn best_metric(&self) -> f64 {
        self.history
            .iter()
            .flatten()
            .map(|&(_, metric)| metric)
            .fold(f64::INFINITY, f64::min)
    }
}

#[derive(Debug, Default)]
struct Moves {
    accepted: usize,
    improving: usize,
}

/// Executes annealing over a [`StateSpace`].
pub struct AnnealRunner;

impl AnnealRunner {
    /// Single-chain annealing.
    ///
    /// Each epoch proposes one neighbor of the current state, takes it with
    /// [`evaluate_probability`], then compacts the space down to the chosen
    /// state. The metric is re-read after compaction.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySchedule`] or [`Error::InvalidTemperature`] if
    /// `temperatures` cannot drive a run. Nothing runs in that case.
    pub fn run<S, M, N, R>(
        space: &mut S,
        init: S::State,
        temperatures: &[f64],
        metric: &M,
        neighbor: &N,
        rng: &mut R,
    ) -> Result<AnnealResult<S::State>>
    where
        S: StateSpace,
        M: Metric<S>,
        N: Neighbor<S>,
        R: Rng + ?Sized,
    {
        validate_temperatures(temperatures)?;

        let mut moves = Moves::default();
        let mut current = (init, metric.evaluate(space, init));
        let mut history = Vec::with_capacity(temperatures.len() + 1);
        history.push(current);
        let cadence = progress_cadence(temperatures.len());

        for (epoch, &temperature) in temperatures.iter().enumerate() {
            let (state, _) = step(
                space,
                current,
                temperature,
                epoch,
                metric,
                neighbor,
                rng,
                &mut moves,
            );
            let compacted = space.compact(&[state]);
            let state = compacted[0];
            current = (state, metric.evaluate(space, state));
            history.push(current);

            if (epoch + 1) % cadence == 0 {
                debug!(
                    event = "progress",
                    epoch = epoch + 1,
                    temperature,
                    metric = current.1,
                    accepted = moves.accepted,
                );
            }
        }

        Ok(AnnealResult {
            history,
            accepted_moves: moves.accepted,
            improving_moves: moves.improving,
        })
    }

    /// Beam-search annealing.
    ///
    /// The beam starts as `size` copies of `init`. Each epoch every entry
    /// proposes `size` neighbors, each accepted or not as in
    /// [`run`](Self::run); the best `size` distinct outcomes form the next
    /// beam, which is compacted, re-measured and sorted best first.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run), plus [`Error::Invalid`] when `size` is zero.
    #[allow(clippy::too_many_arguments)]
    pub fn run_beam<S, M, N, R>(
        space: &mut S,
        init: S::State,
        temperatures: &[f64],
        metric: &M,
        neighbor: &N,
        size: usize,
        rng: &mut R,
    ) -> Result<BeamResult<S::State>>
    where
        S: StateSpace,
        M: Metric<S>,
        N: Neighbor<S>,
        R: Rng + ?Sized,
    {
        validate_temperatures(temperatures)?;
        if size == 0 {
            return Err(Error::Invalid("beam size must be at least 1".into()));
        }

        let mut moves = Moves::default();
        let mut beam = vec![(init, metric.evaluate(space, init)); size];
        let mut history = Vec::with_capacity(temperatures.len() + 1);
        history.push(beam.clone());
        let cadence = progress_cadence(temperatures.len());

        for (epoch, &temperature) in temperatures.iter().enumerate() {
            let mut proposals = Vec::with_capacity(size * size);
            for &entry in &beam {
                for _ in 0..size {
                    proposals.push(step(
                        space,
                        entry,
                        temperature,
                        epoch,
                        metric,
                        neighbor,
                        rng,
                        &mut moves,
                    ));
                }
            }

            let kept = keep_best(proposals, size);
            let frontier: Vec<S::State> = kept.iter().map(|&(state, _)| state).collect();
            let compacted = space.compact(&frontier);
            beam = compacted
                .into_iter()
                .map(|state| (state, metric.evaluate(space, state)))
                .collect();
            beam.sort_by(|a, b| a.1.total_cmp(&b.1));
            history.push(beam.clone());

            if (epoch + 1) % cadence == 0 {
                debug!(
                    event = "progress",
                    epoch = epoch + 1,
                    temperature,
                    best = beam[0].1,
                    beam = beam.len(),
                    accepted = moves.accepted,
                );
            }
        }

        Ok(BeamResult {
            history,
            accepted_moves: moves.accepted,
            improving_moves: moves.improving,
        })
    }
}

/// One propose / accept round starting from `(state, f_curr)`.
#[allow(clippy::too_many_arguments)]
fn step<S, M, N, R>(
    space: &mut S,
    (state, f_curr): (S::State, f64),
    temperature: f64,
    epoch: usize,
    metric: &M,
    neighbor: &N,
    rng: &mut R,
    moves: &mut Moves,
) -> (S::State, f64)
where
    S: StateSpace,
    M: Metric<S>,
    N: Neighbor<S>,
    R: Rng + ?Sized,
{
    let next = neighbor.propose(space, state, epoch, rng);
    let f_next = metric.evaluate(space, next);
    let probability = evaluate_probability(f_curr, f_next, temperature);
    if rng.random_range(0.0..1.0) < probability {
        moves.accepted += 1;
        if f_next < f_curr {
            moves.improving += 1;
        }
        (next, f_next)
    } else {
        (state, f_curr)
    }
}

/// Roughly ten progress events per run.
fn progress_cadence(epochs: usize) -> usize {
    (epochs / 10).max(1)
}
