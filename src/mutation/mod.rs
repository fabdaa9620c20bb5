//! Mutation operators over assignment states.
//!
//! A [`Mutation`] edits a [`StateMut`](crate::state::StateMut) in place,
//! keeping busy routes customer-disjoint. The elementary operators range
//! from single random moves ([`AssignRandomRoute`], [`RecallRandom`]) to
//! large neighbourhood moves ([`Flip`], [`EjectionChain`]); the combinators
//! ([`Conditional`], [`Concat`], [`Randomize`]) compose them.
//!
//! [`MutationNeighbor`] turns any operator into an annealing
//! [`Neighbor`](crate::anneal::Neighbor): each proposal is a fresh diff on
//! top of the current state, so the loop can discard it for free.
//!
//! ```
//! use std::sync::Arc;
//! use rand::{rngs::StdRng, SeedableRng};
//! use u_assign::anneal::Neighbor;
//! use u_assign::mutation::{FillGreedy, MutationNeighbor};
//! use u_assign::state::StateArena;
//! use u_assign::trace::Trace;
//!
//! let trace = Trace::builder()
//!     .route("r1", ["A"])
//!     .candidate("sam", [("r1", 100.0)])
//!     .build()
//!     .unwrap();
//! let mut arena = StateArena::new(Arc::new(trace));
//! let root = arena.empty_solution();
//!
//! let neighbor = MutationNeighbor::new(FillGreedy);
//! let child = neighbor.propose(&mut arena, root, 0, &mut StdRng::seed_from_u64(0));
//! assert_eq!(arena.state(child).score(), 100.0);
//! assert_eq!(arena.state(root).score(), 0.0);
//! ```

mod combine;
mod neighbor;
mod pure;
mod types;
pub mod util;

pub use combine::{Concat, Conditional, Fallback, Randomize, SuccessPolicy};
pub use neighbor::{MutationNeighbor, NegatedScore};
pub use pure::{
    AssignAnyGreedy, AssignAnyRandomRoute, AssignGreedyRoute, AssignRandomRoute,
    AssignWeightedRoute, EjectionChain, FillGreedy, FillRandom, Flip, MakeRoom, RecallRandom,
};
pub use types::{FnMutation, Mutation};
