//! Immutable problem instance.
//!
//! A [`Trace`] holds everything the search reads but never writes: which
//! routes each candidate may take and at what score, and which customers each
//! route consumes. String keys are interned into dense ids at build time so
//! the state layers can work on plain integers.
//!
//! ```
//! use u_assign::trace::Trace;
//!
//! let trace = Trace::builder()
//!     .route("r1", ["A"])
//!     .route("r2", ["A", "B"])
//!     .candidate("sam", [("r1", 100.0), ("r2", 200.0)])
//!     .build()
//!     .unwrap();
//!
//! let sam = trace.candidate_id("sam").unwrap();
//! let best = trace.ranked_routes(sam)[0].0;
//! assert_eq!(trace.route_name(best), "r2");
//! ```

mod builder;

pub use builder::{TraceBuilder, TraceData};

use std::collections::HashMap;
use std::fmt;

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a dense index.
            ///
            /// # Panics
            ///
            /// If `index` does not fit in a `u32`.
            pub fn new(index: usize) -> Self {
                match u32::try_from(index) {
                    Ok(index) => Self(index),
                    Err(_) => panic!(concat!($prefix, " index {} overflows u32"), index),
                }
            }

            /// Returns the dense index.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

dense_id!(
    /// Dense id of an assignable candidate.
    CandidateId,
    "candidate"
);
dense_id!(
    /// Dense id of a route.
    RouteId,
    "route"
);
dense_id!(
    /// Dense id of an exclusive customer resource.
    CustomerId,
    "customer"
);

/// Interned string keys of one id space.
#[derive(Debug, Clone, Default)]
pub(crate) struct NameTable {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl NameTable {
    /// Interns `name`, returning its index and whether it was new.
    pub(crate) fn intern(&mut self, name: &str) -> (usize, bool) {
        if let Some(&index) = self.lookup.get(name) {
            return (index, false);
        }
        let index = self.names.len();
        self.names.push(name.to_owned());
        self.lookup.insert(name.to_owned(), index);
        (index, true)
    }

    pub(crate) fn get(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    pub(crate) fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

/// The read-only problem instance shared by every state layer.
///
/// Per candidate, routes are kept twice: as a map for O(1) score lookup and
/// as a list ranked by descending score (ties keep insertion order) together
/// with the parallel score sequence, so greedy and score-weighted picks never
/// re-sort.
#[derive(Debug, Clone)]
pub struct Trace {
    candidates: NameTable,
    routes: NameTable,
    customers: NameTable,
    scores: Vec<HashMap<RouteId, f64>>,
    ranked_routes: Vec<Vec<(RouteId, f64)>>,
    ranked_scores: Vec<Vec<f64>>,
    customers_by_route: Vec<Vec<CustomerId>>,
    baseline_score: f64,
}

impl Trace {
    /// Starts building a trace.
    pub fn builder() -> TraceBuilder {
        TraceBuilder::default()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    /// All candidate ids in dense order.
    pub fn candidates(&self) -> impl ExactSizeIterator<Item = CandidateId> {
        (0..self.candidate_count()).map(CandidateId::new)
    }

    /// All customer ids in dense order.
    pub fn customers(&self) -> impl ExactSizeIterator<Item = CustomerId> {
        (0..self.customer_count()).map(CustomerId::new)
    }

    /// Score of `candidate` on `route`, or `None` if the candidate cannot
    /// take that route.
    pub fn score(&self, candidate: CandidateId, route: RouteId) -> Option<f64> {
        self.scores[candidate.index()].get(&route).copied()
    }

    /// Routes available to `candidate`, best first.
    pub fn ranked_routes(&self, candidate: CandidateId) -> &[(RouteId, f64)] {
        &self.ranked_routes[candidate.index()]
    }

    /// Scores parallel to [`ranked_routes`](Self::ranked_routes).
    pub fn ranked_scores(&self, candidate: CandidateId) -> &[f64] {
        &self.ranked_scores[candidate.index()]
    }

    /// Customers consumed by `route`, deduplicated.
    pub fn route_customers(&self, route: RouteId) -> &[CustomerId] {
        &self.customers_by_route[route.index()]
    }

    /// Score of the reference assignment the upstream source reported.
    pub fn baseline_score(&self) -> f64 {
        self.baseline_score
    }

    pub fn candidate_id(&self, name: &str) -> Option<CandidateId> {
        self.candidates.get(name).map(CandidateId::new)
    }

    pub fn route_id(&self, name: &str) -> Option<RouteId> {
        self.routes.get(name).map(RouteId::new)
    }

    pub fn customer_id(&self, name: &str) -> Option<CustomerId> {
        self.customers.get(name).map(CustomerId::new)
    }

    pub fn candidate_name(&self, id: CandidateId) -> &str {
        self.candidates.name(id.index())
    }

    pub fn route_name(&self, id: RouteId) -> &str {
        self.routes.name(id.index())
    }

    pub fn customer_name(&self, id: CustomerId) -> &str {
        self.customers.name(id.index())
    }
}
