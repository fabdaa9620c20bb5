//! Root layer: a fully materialized assignment.

use std::collections::HashMap;

use crate::collections::IndexedRandomSet;
use crate::trace::{CandidateId, CustomerId, RouteId, Trace};

/// Score of `candidate` on `route`.
///
/// # Panics
///
/// If the trace does not offer `route` to `candidate`.
pub(crate) fn route_score(trace: &Trace, candidate: CandidateId, route: RouteId) -> f64 {
    trace
        .score(candidate, route)
        .unwrap_or_else(|| panic!("{candidate} cannot take {route}"))
}

/// Every candidate sits in exactly one of `idle` / `busy`; `used_customers`
/// maps each claimed customer to the busy candidate whose route claims it.
#[derive(Debug, Clone)]
pub(crate) struct Solution {
    idle: IndexedRandomSet<CandidateId, ()>,
    busy: IndexedRandomSet<CandidateId, RouteId>,
    used_customers: HashMap<CustomerId, CandidateId>,
    score: f64,
}

impl Solution {
    /// All candidates idle, score zero.
    pub(crate) fn empty(trace: &Trace) -> Self {
        Self {
            idle: IndexedRandomSet::from_keys(trace.candidates()),
            busy: IndexedRandomSet::new(),
            used_customers: HashMap::new(),
            score: 0.0,
        }
    }

    /// Caller guarantees the route's customers are free.
    pub(crate) fn make_busy(&mut self, trace: &Trace, candidate: CandidateId, route: RouteId) {
        self.idle.remove(&candidate);
        self.busy.add(candidate, route);
        for &customer in trace.route_customers(route) {
            self.used_customers.insert(customer, candidate);
        }
        self.score += route_score(trace, candidate, route);
    }

    pub(crate) fn make_idle(&mut self, trace: &Trace, candidate: CandidateId) {
        let route = self.busy.remove(&candidate);
        self.idle.add(candidate, ());
        for customer in trace.route_customers(route) {
            self.used_customers.remove(customer);
        }
        self.score -= route_score(trace, candidate, route);
    }

    pub(crate) fn route(&self, candidate: CandidateId) -> Option<RouteId> {
        self.busy.get(&candidate).copied()
    }

    pub(crate) fn customer_owner(&self, customer: CustomerId) -> Option<CandidateId> {
        self.used_customers.get(&customer).copied()
    }

    pub(crate) fn idle(&self) -> &IndexedRandomSet<CandidateId, ()> {
        &self.idle
    }

    pub(crate) fn busy(&self) -> &IndexedRandomSet<CandidateId, RouteId> {
        &self.busy
    }

    pub(crate) fn score(&self) -> f64 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::tests::porter_trace;

    #[test]
    fn test_busy_idle_roundtrip() {
        let trace = porter_trace();
        let sam = trace.candidate_id("sam").unwrap();
        let r2 = trace.route_id("r2").unwrap();
        let a = trace.customer_id("A").unwrap();

        let mut solution = Solution::empty(&trace);
        assert_eq!(solution.idle().len(), 2);

        solution.make_busy(&trace, sam, r2);
        assert_eq!(solution.route(sam), Some(r2));
        assert_eq!(solution.customer_owner(a), Some(sam));
        assert_eq!(solution.score(), 200.0);

        solution.make_idle(&trace, sam);
        assert_eq!(solution.route(sam), None);
        assert_eq!(solution.customer_owner(a), None);
        assert_eq!(solution.score(), 0.0);
        assert_eq!(solution.busy().len(), 0);
    }

    #[test]
    #[should_panic(expected = "not present")]
    fn test_double_busy_panics() {
        let trace = porter_trace();
        let sam = trace.candidate_id("sam").unwrap();
        let r1 = trace.route_id("r1").unwrap();
        let mut solution = Solution::empty(&trace);
        solution.make_busy(&trace, sam, r1);
        solution.make_busy(&trace, sam, r1);
    }
}
