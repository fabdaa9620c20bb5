//! Solving tasks end to end.
//!
//! [`AnnealSolver`] ties a [`Mutation`](crate::mutation::Mutation) and a
//! [`SolverConfig`] to the annealing loops, and records each run as a
//! [`TaskSolution`] on its [`Task`].
//!
//! ```
//! use std::sync::Arc;
//! use u_assign::mutation::FillGreedy;
//! use u_assign::solver::{AnnealSolver, SolverConfig, Task};
//! use u_assign::trace::Trace;
//!
//! let trace = Trace::builder()
//!     .route("r1", ["A"])
//!     .route("r2", ["A", "B"])
//!     .candidate("sam", [("r1", 100.0), ("r2", 200.0)])
//!     .build()
//!     .unwrap();
//!
//! let solver = AnnealSolver::new(
//!     FillGreedy,
//!     SolverConfig::default().with_epochs(10).with_seed(1),
//! )
//! .unwrap();
//! let mut task = Task::new(Arc::new(trace));
//! solver.solve_task(&mut task).unwrap();
//!
//! let record = task.best().unwrap();
//! assert_eq!(record.best_score, 200.0);
//! assert_eq!(record.assignment, [("sam".to_string(), "r2".to_string())]);
//! ```

mod config;
mod runner;
mod types;

pub use config::{SolverConfig, Strategy, DEFAULT_BEAM_SIZE};
pub use runner::AnnealSolver;
pub use types::{Task, TaskSolution};
