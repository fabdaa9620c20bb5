//! Building blocks shared by the operators.

use rand::Rng;

use crate::state::{StateMut, StateRef};
use crate::trace::{CandidateId, CustomerId, RouteId};

/// Commits `candidate` to `route` if none of its customers are taken.
pub fn try_make_busy(state: &mut StateMut<'_>, candidate: CandidateId, route: RouteId) -> bool {
    let trace = state.trace();
    if state.view().overlaps(trace.route_customers(route)) {
        return false;
    }
    state.make_busy(candidate, route);
    true
}

/// Highest-scoring route of `candidate` whose customers are all free.
pub fn first_free_route(view: &StateRef<'_>, candidate: CandidateId) -> Option<RouteId> {
    let trace = view.trace();
    trace
        .ranked_routes(candidate)
        .iter()
        .map(|&(route, _)| route)
        .find(|&route| !view.overlaps(trace.route_customers(route)))
}

/// Commits `candidate` to its best free route, if it has one.
pub fn try_make_busy_greedy(state: &mut StateMut<'_>, candidate: CandidateId) -> bool {
    let route = first_free_route(&state.view(), candidate);
    match route {
        Some(route) => {
            state.make_busy(candidate, route);
            true
        }
        None => false,
    }
}

/// Every customer any route of `candidate` could claim.
pub fn reachable_customers(view: &StateRef<'_>, candidate: CandidateId) -> Vec<CustomerId> {
    let trace = view.trace();
    let mut customers: Vec<CustomerId> = trace
        .ranked_routes(candidate)
        .iter()
        .flat_map(|&(route, _)| trace.route_customers(route).iter().copied())
        .collect();
    customers.sort_unstable();
    customers.dedup();
    customers
}

/// Select an index using roulette wheel selection on non-negative weights.
///
/// Falls back to a uniform pick when the weights sum to zero.
pub fn roulette_select<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if !(total > 0.0) {
        return rng.random_range(0..weights.len());
    }

    let mut roll = rng.random_range(0.0..total);
    for (i, &weight) in weights.iter().enumerate() {
        roll -= weight.max(0.0);
        if roll < 0.0 {
            return i;
        }
    }
    weights.len() - 1
}

/// `exp((x - max) / temperature)` per entry, unnormalized.
///
/// High temperatures flatten the weights toward uniform; low ones
/// concentrate them on the maximum.
pub fn softmax_weights(values: &[f64], temperature: f64) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .map(|&x| ((x - max) / temperature).exp())
        .collect()
}
