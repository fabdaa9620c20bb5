//! Copy-on-write overlay layer.
//!
//! A [`SolutionDiff`] records only what changed relative to its parent.
//! Everything it does not override is read through the parent chain by
//! [`StateRef`](super::StateRef).
//!
//! Overrides that would reproduce the parent's own answer are dropped rather
//! than stored: making a locally idled candidate busy again on the route the
//! parent already has it on simply removes the idle override. Folding a diff
//! back into its parent therefore replays exactly the net change.

use std::collections::{HashMap, HashSet};

use super::solution::route_score;
use crate::collections::IndexedRandomSet;
use crate::trace::{CandidateId, CustomerId, RouteId, Trace};

/// How a layer answers "what is this candidate doing?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Override {
    Idle,
    Busy(RouteId),
    Inherit,
}

/// How a layer answers "who holds this customer?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CustomerOverride {
    Held(CandidateId),
    Freed,
    Inherit,
}

#[derive(Debug, Clone)]
pub(crate) struct SolutionDiff {
    idle: IndexedRandomSet<CandidateId, ()>,
    busy: IndexedRandomSet<CandidateId, RouteId>,
    busy_count: usize,
    used_customers: HashMap<CustomerId, CandidateId>,
    unused_customers: HashSet<CustomerId>,
    score: f64,
}

impl SolutionDiff {
    /// An empty overlay over a parent with the given totals.
    pub(crate) fn on_top_of(busy_count: usize, score: f64) -> Self {
        Self {
            idle: IndexedRandomSet::new(),
            busy: IndexedRandomSet::new(),
            busy_count,
            used_customers: HashMap::new(),
            unused_customers: HashSet::new(),
            score,
        }
    }

    pub(crate) fn lookup(&self, candidate: CandidateId) -> Override {
        if self.idle.contains(&candidate) {
            Override::Idle
        } else if let Some(&route) = self.busy.get(&candidate) {
            Override::Busy(route)
        } else {
            Override::Inherit
        }
    }

    pub(crate) fn overrides(&self, candidate: CandidateId) -> bool {
        self.idle.contains(&candidate) || self.busy.contains(&candidate)
    }

    pub(crate) fn is_locally_idle(&self, candidate: CandidateId) -> bool {
        self.idle.contains(&candidate)
    }

    pub(crate) fn is_locally_busy(&self, candidate: CandidateId) -> bool {
        self.busy.contains(&candidate)
    }

    /// Local used customers shadow the parent; locally freed ones hide it.
    pub(crate) fn customer(&self, customer: CustomerId) -> CustomerOverride {
        if let Some(&owner) = self.used_customers.get(&customer) {
            CustomerOverride::Held(owner)
        } else if self.unused_customers.contains(&customer) {
            CustomerOverride::Freed
        } else {
            CustomerOverride::Inherit
        }
    }

    /// `parent_route` is what the parent reports for `candidate`; it is only
    /// consulted when the candidate is locally idle.
    pub(crate) fn make_busy(
        &mut self,
        trace: &Trace,
        candidate: CandidateId,
        route: RouteId,
        parent_route: Option<RouteId>,
    ) {
        self.busy_count += 1;

        if self.idle.contains(&candidate) {
            self.idle.remove(&candidate);
            if parent_route != Some(route) {
                self.busy.add(candidate, route);
            }
        } else {
            self.busy.add(candidate, route);
        }

        for &customer in trace.route_customers(route) {
            self.used_customers.insert(customer, candidate);
            self.unused_customers.remove(&customer);
        }
        self.score += route_score(trace, candidate, route);
    }

    /// `parent_busy` tells whether the parent has `candidate` busy;
    /// `freed_in_parent` are the route's customers the parent reports used.
    pub(crate) fn make_idle(
        &mut self,
        trace: &Trace,
        candidate: CandidateId,
        route: RouteId,
        parent_busy: bool,
        freed_in_parent: impl IntoIterator<Item = CustomerId>,
    ) {
        self.busy_count -= 1;

        if self.busy.contains(&candidate) {
            self.busy.remove(&candidate);
            if parent_busy {
                self.idle.add(candidate, ());
            }
        } else {
            self.idle.add(candidate, ());
        }

        self.unused_customers.extend(freed_in_parent);
        for customer in trace.route_customers(route) {
            self.used_customers.remove(customer);
        }
        self.score -= route_score(trace, candidate, route);
    }

    pub(crate) fn idle(&self) -> &IndexedRandomSet<CandidateId, ()> {
        &self.idle
    }

    pub(crate) fn busy(&self) -> &IndexedRandomSet<CandidateId, RouteId> {
        &self.busy
    }

    pub(crate) fn busy_count(&self) -> usize {
        self.busy_count
    }

    pub(crate) fn score(&self) -> f64 {
        self.score
    }

    /// Consumes the layer into the transitions a fold must replay:
    /// candidates to idle, then `(candidate, route)` pairs to make busy.
    pub(crate) fn into_transitions(self) -> (Vec<CandidateId>, Vec<(CandidateId, RouteId)>) {
        let idle = self.idle.iter().map(|(&c, _)| c).collect();
        let busy = self.busy.iter().map(|(&c, &r)| (c, r)).collect();
        (idle, busy)
    }
}
