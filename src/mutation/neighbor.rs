//! Glue between operators and the annealing loops.

use rand::Rng;

use super::types::Mutation;
use crate::anneal::{Metric, Neighbor};
use crate::state::{StateArena, StateId};

/// Proposes a neighbor by opening a diff on the state and mutating it.
///
/// The proposal is returned even when the operator reports that it did
/// nothing; the acceptance rule then sees an unchanged score.
#[derive(Debug, Clone)]
pub struct MutationNeighbor<M> {
    mutation: M,
}

impl<M: Mutation> MutationNeighbor<M> {
    pub fn new(mutation: M) -> Self {
        Self { mutation }
    }

    pub fn mutation(&self) -> &M {
        &self.mutation
    }
}

impl<M: Mutation> Neighbor<StateArena> for MutationNeighbor<M> {
    fn propose<R: Rng + ?Sized>(
        &self,
        space: &mut StateArena,
        state: StateId,
        epoch: usize,
        rng: &mut R,
    ) -> StateId {
        let child = space.diff(state);
        let mut rng = rng;
        self.mutation.mutate(&mut space.state_mut(child), epoch, &mut rng);
        child
    }
}

/// Minimizes the negated assignment score.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegatedScore;

impl Metric<StateArena> for NegatedScore {
    fn evaluate(&self, space: &StateArena, state: StateId) -> f64 {
        -space.state(state).score()
    }
}
