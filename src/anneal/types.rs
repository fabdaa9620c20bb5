//! Seams between the annealing loops and the states they explore.

use std::fmt::Debug;
use std::hash::Hash;

use rand::Rng;

/// Owner of the states a search explores.
///
/// States are addressed by small handles. Two handles are "the same state"
/// exactly when they compare equal, which is what beam deduplication relies
/// on.
pub trait StateSpace {
    type State: Copy + Eq + Hash + Debug;

    /// Called once per epoch with the states being kept.
    ///
    /// Returns one handle per `frontier` entry, in order, holding the same
    /// state. Implementations may discard anything the frontier does not
    /// depend on and may invalidate handles that are not returned.
    fn compact(&mut self, frontier: &[Self::State]) -> Vec<Self::State>;
}

/// Objective to minimize.
///
/// Implemented for any `Fn(&S, S::State) -> f64`.
pub trait Metric<S: StateSpace + ?Sized> {
    fn evaluate(&self, space: &S, state: S::State) -> f64;
}

impl<S, F> Metric<S> for F
where
    S: StateSpace + ?Sized,
    F: Fn(&S, S::State) -> f64,
{
    fn evaluate(&self, space: &S, state: S::State) -> f64 {
        self(space, state)
    }
}

/// Move generator.
///
/// Must leave `state` itself untouched: the proposal is a new state, and the
/// loop may keep either one.
pub trait Neighbor<S: StateSpace + ?Sized> {
    fn propose<R: Rng + ?Sized>(
        &self,
        space: &mut S,
        state: S::State,
        epoch: usize,
        rng: &mut R,
    ) -> S::State;
}
