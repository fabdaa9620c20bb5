//! Copy-on-write assignment states.
//!
//! A search keeps one [`StateArena`]. Its roots are fully materialized
//! solutions; every other state is a diff layer that records only what
//! changed relative to its parent and reads everything else through it.
//!
//! ```
//! use std::sync::Arc;
//! use u_assign::state::StateArena;
//! use u_assign::trace::Trace;
//!
//! let trace = Trace::builder()
//!     .route("r1", ["A"])
//!     .route("r2", ["A", "B"])
//!     .candidate("sam", [("r1", 100.0), ("r2", 200.0)])
//!     .build()
//!     .unwrap();
//! let sam = trace.candidate_id("sam").unwrap();
//! let r2 = trace.route_id("r2").unwrap();
//!
//! let mut arena = StateArena::new(Arc::new(trace));
//! let root = arena.empty_solution();
//! let step = arena.diff(root);
//! arena.state_mut(step).make_busy(sam, r2);
//!
//! assert_eq!(arena.state(step).score(), 200.0);
//! assert_eq!(arena.state(root).score(), 0.0);
//!
//! arena.apply(step);
//! assert_eq!(arena.state(root).score(), 200.0);
//! ```

mod access;
mod arena;
mod collapse;
mod diff;
mod names;
mod solution;

pub use access::{CandidateFilter, CandidateIter, CandidateView, Entry, StateMut, StateRef};
pub use arena::{StateArena, StateId};
pub use collapse::{collapse, optimize_tree, DiffTree};
pub use names::{alphabetic_label, DebugNames};
