//! Conflict-free candidate-to-route assignment search.
//!
//! Every candidate either stays idle or takes one of its routes, each route
//! consumes a set of customers, and no customer may be served twice. The
//! goal is the highest total score.
//!
//! - **Trace**: the immutable problem instance, interned into dense ids.
//! - **Collections**: a set with O(1) uniform sampling, composable
//!   read-only sequence views and cheap pseudo-random enumeration.
//! - **State**: a root solution plus copy-on-write diff layers
//!   held in an arena, with folding and diff-tree collapsing.
//! - **Anneal**: the Metropolis acceptance rule, single-chain simulated
//!   annealing and beam search, generic over a state space.
//! - **Mutation**: neighbour operators and combinators over states.
//! - **Solver**: configuration, strategy dispatch and per-task records.
//!
//! # Architecture
//!
//! Search states are never cloned. Each proposal is an overlay on top of
//! the state it came from; after every epoch the tree of overlays is
//! collapsed so that only the kept states remain, each as short a chain as
//! possible.

pub mod anneal;
pub mod collections;
pub mod error;
pub mod mutation;
pub mod solver;
pub mod state;
pub mod trace;

pub use error::{Error, Result};
