//! Elementary operators.

use std::collections::HashSet;

use rand::{Rng, RngCore};

use super::types::Mutation;
use super::util::{
    first_free_route, reachable_customers, roulette_select, softmax_weights, try_make_busy,
    try_make_busy_greedy,
};
use crate::error::{Error, Result};
use crate::state::{CandidateFilter, StateMut};
use crate::trace::{CandidateId, CustomerId, RouteId, Trace};

/// Puts a random idle candidate on a uniformly chosen route of theirs, if
/// that route is free.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignRandomRoute;

impl Mutation for AssignRandomRoute {
    fn name(&self) -> &str {
        "assign_random_route"
    }

    fn mutate(&self, state: &mut StateMut<'_>, _epoch: usize, rng: &mut dyn RngCore) -> bool {
        let Some(candidate) = state.view().random_idle_candidate(rng) else {
            return false;
        };
        let trace = state.trace();
        let routes = trace.ranked_routes(candidate);
        if routes.is_empty() {
            return false;
        }
        let (route, _) = routes[rng.random_range(0..routes.len())];
        try_make_busy(state, candidate, route)
    }
}

/// Puts a random idle candidate on a route drawn with probability
/// proportional to its score, if that route is free.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignWeightedRoute;

impl Mutation for AssignWeightedRoute {
    fn name(&self) -> &str {
        "assign_weighted_route"
    }

    fn mutate(&self, state: &mut StateMut<'_>, _epoch: usize, rng: &mut dyn RngCore) -> bool {
        let Some(candidate) = state.view().random_idle_candidate(rng) else {
            return false;
        };
        let trace = state.trace();
        let scores = trace.ranked_scores(candidate);
        if scores.is_empty() {
            return false;
        }
        let (route, _) = trace.ranked_routes(candidate)[roulette_select(scores, rng)];
        try_make_busy(state, candidate, route)
    }
}

/// Puts a random idle candidate on their best free route.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignGreedyRoute;

impl Mutation for AssignGreedyRoute {
    fn name(&self) -> &str {
        "assign_greedy_route"
    }

    fn mutate(&self, state: &mut StateMut<'_>, _epoch: usize, rng: &mut dyn RngCore) -> bool {
        match state.view().random_idle_candidate(rng) {
            Some(candidate) => try_make_busy_greedy(state, candidate),
            None => false,
        }
    }
}

/// Makes a random busy candidate idle.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecallRandom;

impl Mutation for RecallRandom {
    fn name(&self) -> &str {
        "recall_random"
    }

    fn mutate(&self, state: &mut StateMut<'_>, _epoch: usize, rng: &mut dyn RngCore) -> bool {
        match state.view().random_busy_candidate(rng) {
            Some((candidate, _)) => {
                state.make_idle(candidate);
                true
            }
            None => false,
        }
    }
}

/// Walks idle candidates in shuffled order and assigns the first one whose
/// uniformly drawn route is free.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignAnyRandomRoute;

impl Mutation for AssignAnyRandomRoute {
    fn name(&self) -> &str {
        "assign_any_random_route"
    }

    fn mutate(&self, state: &mut StateMut<'_>, _epoch: usize, rng: &mut dyn RngCore) -> bool {
        let pick = {
            let view = state.view();
            let trace = view.trace();
            let mut pick = None;
            for (candidate, _) in view.iter_candidates_shuffled(CandidateFilter::Idle, rng) {
                let routes = trace.ranked_routes(candidate);
                if routes.is_empty() {
                    continue;
                }
                let (route, _) = routes[rng.random_range(0..routes.len())];
                if !view.overlaps(trace.route_customers(route)) {
                    pick = Some((candidate, route));
                    break;
                }
            }
            pick
        };
        match pick {
            Some((candidate, route)) => {
                state.make_busy(candidate, route);
                true
            }
            None => false,
        }
    }
}

/// Repeats [`AssignAnyRandomRoute`] until it fails. Always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillRandom;

impl Mutation for FillRandom {
    fn name(&self) -> &str {
        "fill_random"
    }

    fn mutate(&self, state: &mut StateMut<'_>, epoch: usize, rng: &mut dyn RngCore) -> bool {
        while AssignAnyRandomRoute.mutate(state, epoch, rng) {}
        true
    }
}

/// Walks idle candidates in shuffled order and puts the first one that has
/// a free route on their best such route.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignAnyGreedy;

impl Mutation for AssignAnyGreedy {
    fn name(&self) -> &str {
        "assign_any_greedy"
    }

    fn mutate(&self, state: &mut StateMut<'_>, _epoch: usize, rng: &mut dyn RngCore) -> bool {
        let pick = {
            let view = state.view();
            view.iter_candidates_shuffled(CandidateFilter::Idle, rng)
                .find_map(|(candidate, _)| {
                    first_free_route(&view, candidate).map(|route| (candidate, route))
                })
        };
        match pick {
            Some((candidate, route)) => {
                state.make_busy(candidate, route);
                true
            }
            None => false,
        }
    }
}

/// Gives every idle candidate, in shuffled order, their best free route.
/// Always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillGreedy;

impl Mutation for FillGreedy {
    fn name(&self) -> &str {
        "fill_greedy"
    }

    fn mutate(&self, state: &mut StateMut<'_>, _epoch: usize, rng: &mut dyn RngCore) -> bool {
        let idle: Vec<CandidateId> = state
            .view()
            .iter_candidates_shuffled(CandidateFilter::Idle, rng)
            .map(|(candidate, _)| candidate)
            .collect();
        for candidate in idle {
            try_make_busy_greedy(state, candidate);
        }
        true
    }
}

/// Picks a random candidate and idles every busy candidate holding any
/// customer that candidate could ever claim.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRoom;

impl Mutation for MakeRoom {
    fn name(&self) -> &str {
        "make_room"
    }

    fn mutate(&self, state: &mut StateMut<'_>, _epoch: usize, rng: &mut dyn RngCore) -> bool {
        let evicted = {
            let view = state.view();
            let Some((candidate, _)) = view.random_candidate(rng) else {
                return false;
            };
            let room = reachable_customers(&view, candidate);
            sorted(view.candidates_on_customers(room))
        };
        for candidate in evicted {
            state.make_idle(candidate);
        }
        true
    }
}

/// Softmax-weighted route draw with a greedy fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RoutePicker {
    temperature: f64,
    random_pick_retries: usize,
}

impl RoutePicker {
    fn new(temperature: f64, random_pick_retries: usize) -> Result<Self> {
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(Error::Invalid(format!(
                "route pick temperature must be positive and finite, got {temperature}"
            )));
        }
        Ok(Self {
            temperature,
            random_pick_retries,
        })
    }

    /// Tries `random_pick_retries` softmax draws over the candidate's
    /// scores, then falls back to the best route `blocked` lets through.
    fn pick<R, B>(
        &self,
        trace: &Trace,
        candidate: CandidateId,
        blocked: B,
        rng: &mut R,
    ) -> Option<RouteId>
    where
        R: Rng + ?Sized,
        B: Fn(RouteId) -> bool,
    {
        let ranked = trace.ranked_routes(candidate);
        if ranked.is_empty() {
            return None;
        }
        if self.random_pick_retries > 0 {
            let weights = softmax_weights(trace.ranked_scores(candidate), self.temperature);
            for _ in 0..self.random_pick_retries {
                let (route, _) = ranked[roulette_select(&weights, rng)];
                if !blocked(route) {
                    return Some(route);
                }
            }
        }
        ranked
            .iter()
            .map(|&(route, _)| route)
            .find(|&route| !blocked(route))
    }
}

impl Default for RoutePicker {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            random_pick_retries: 5,
        }
    }
}

/// Moves a random busy candidate to a different free route, drawn by
/// softmax over their scores.
///
/// Customers held by the moving candidate count as free.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Flip {
    picker: RoutePicker,
}

impl Flip {
    /// `temperature` shapes the softmax; `random_pick_retries` bounds the
    /// random draws before falling back to the best free route.
    pub fn new(temperature: f64, random_pick_retries: usize) -> Result<Self> {
        Ok(Self {
            picker: RoutePicker::new(temperature, random_pick_retries)?,
        })
    }
}

impl Mutation for Flip {
    fn name(&self) -> &str {
        "flip"
    }

    fn mutate(&self, state: &mut StateMut<'_>, _epoch: usize, rng: &mut dyn RngCore) -> bool {
        let Some((candidate, current)) = state.view().random_busy_candidate(rng) else {
            return false;
        };
        let trace = state.trace();
        let route = {
            let view = state.view();
            let blocked = |route: RouteId| {
                route == current
                    || trace.route_customers(route).iter().any(|&customer| {
                        view.customer_owner(customer)
                            .is_some_and(|owner| owner != candidate)
                    })
            };
            self.picker.pick(&trace, candidate, blocked, rng)
        };
        let Some(route) = route else {
            return false;
        };
        state.make_idle(candidate);
        state.make_busy(candidate, route);
        true
    }
}

/// Ejection chain.
///
/// Idles a random candidate and re-places them on a softmax-drawn route,
/// evicting whoever holds that route's customers. Evicted candidates are
/// queued and re-placed the same way, never onto customers already fixed by
/// an earlier link. Stops after `limit` links or when nobody is left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EjectionChain {
    limit: usize,
    picker: RoutePicker,
}

impl EjectionChain {
    pub fn new(limit: usize, temperature: f64, random_pick_retries: usize) -> Result<Self> {
        Ok(Self {
            limit,
            picker: RoutePicker::new(temperature, random_pick_retries)?,
        })
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            picker: RoutePicker::default(),
        }
    }
}

impl Mutation for EjectionChain {
    fn name(&self) -> &str {
        "ejection_chain"
    }

    fn mutate(&self, state: &mut StateMut<'_>, _epoch: usize, rng: &mut dyn RngCore) -> bool {
        let Some((start, current)) = state.view().random_candidate(rng) else {
            return false;
        };
        if current.is_some() {
            state.make_idle(start);
        }

        let trace = state.trace();
        let mut fixed: HashSet<CustomerId> = HashSet::new();
        let mut queue = vec![start];
        let mut placed = 0usize;

        let mut next = 0;
        while next < queue.len() && next < self.limit {
            let candidate = queue[next];
            next += 1;

            let blocked = |route: RouteId| {
                trace
                    .route_customers(route)
                    .iter()
                    .any(|customer| fixed.contains(customer))
            };
            let Some(route) = self.picker.pick(&trace, candidate, blocked, rng) else {
                continue;
            };

            let customers = trace.route_customers(route);
            let evicted = sorted(state.view().candidates_on_customers(customers.iter().copied()));
            for other in evicted {
                state.make_idle(other);
                queue.push(other);
            }
            state.make_busy(candidate, route);
            fixed.extend(customers.iter().copied());
            placed += 1;
        }
        placed > 0
    }
}

/// Deterministic order for sets produced by state queries.
fn sorted(set: HashSet<CandidateId>) -> Vec<CandidateId> {
    let mut items: Vec<CandidateId> = set.into_iter().collect();
    items.sort_unstable();
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{StateArena, StateId};
    use crate::trace::tests::{porter_trace, random_trace};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn arena(trace: Trace) -> (StateArena, StateId) {
        let mut arena = StateArena::new(Arc::new(trace));
        let root = arena.empty_solution();
        (arena, root)
    }

    /// Runs `mutation` many times on a diff chain, checking every state.
    fn hammer<M: Mutation>(mutation: &M, seed: u64) -> StateArena {
        let mut rng = StdRng::seed_from_u64(seed);
        let (mut arena, root) = arena(random_trace(seed, 40, 60, 30));
        let mut tip = root;
        for epoch in 0..200 {
            let next = arena.diff(tip);
            mutation.mutate(&mut arena.state_mut(next), epoch, &mut rng);
            arena.state(next).validate().unwrap();
            tip = next;
            if epoch % 3 == 0 {
                // Alternate the base operator so idle and busy both exist.
                RecallRandom.mutate(&mut arena.state_mut(tip), epoch, &mut rng);
                AssignGreedyRoute.mutate(&mut arena.state_mut(tip), epoch, &mut rng);
            }
        }
        arena
    }

    #[test]
    fn test_operators_keep_states_valid() {
        let operators: Vec<Box<dyn Mutation>> = vec![
            Box::new(AssignRandomRoute),
            Box::new(AssignWeightedRoute),
            Box::new(AssignGreedyRoute),
            Box::new(RecallRandom),
            Box::new(AssignAnyRandomRoute),
            Box::new(FillRandom),
            Box::new(AssignAnyGreedy),
            Box::new(FillGreedy),
            Box::new(MakeRoom),
            Box::new(Flip::default()),
            Box::new(EjectionChain::with_limit(6)),
        ];
        for (seed, operator) in operators.iter().enumerate() {
            let arena = hammer(operator, seed as u64);
            for id in arena.live_states().collect::<Vec<_>>() {
                arena.state(id).validate().unwrap();
            }
        }
    }

    #[test]
    fn test_fill_greedy_reaches_best_porter_assignment() {
        let (mut arena, root) = arena(porter_trace());
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = arena.state_mut(root);
        assert!(FillGreedy.mutate(&mut state, 0, &mut rng));
        // Either order ends with every customer-disjoint greedy choice made.
        let score = state.view().score();
        assert!(score == 1100.0 || score == 400.0, "score {score}");
        assert_eq!(state.view().idle_count(), 0);
        state.view().validate().unwrap();
    }

    #[test]
    fn test_recall_on_empty_fails() {
        let (mut arena, root) = arena(porter_trace());
        let mut rng = StdRng::seed_from_u64(0);
        assert!(!RecallRandom.mutate(&mut arena.state_mut(root), 0, &mut rng));
        assert!(!Flip::default().mutate(&mut arena.state_mut(root), 0, &mut rng));
    }

    #[test]
    fn test_make_room_frees_reachable_customers() {
        let trace = porter_trace();
        let sam = trace.candidate_id("sam").unwrap();
        let veteran = trace.candidate_id("veteran").unwrap();
        let r2 = trace.route_id("r2").unwrap();
        let r5 = trace.route_id("r5").unwrap();
        let (mut arena, root) = arena(trace);
        {
            let mut state = arena.state_mut(root);
            state.make_busy(sam, r2);
            state.make_busy(veteran, r5);
        }
        // Both candidates can reach B, and veteran reaches everything busy,
        // so whichever is drawn ends up evicting at least sam's route.
        let mut rng = StdRng::seed_from_u64(4);
        assert!(MakeRoom.mutate(&mut arena.state_mut(root), 0, &mut rng));
        let view = arena.state(root);
        assert_eq!(view.get_route(sam), None);
        view.validate().unwrap();
    }

    #[test]
    fn test_flip_moves_to_another_route() {
        let trace = porter_trace();
        let veteran = trace.candidate_id("veteran").unwrap();
        let r3 = trace.route_id("r3").unwrap();
        let (mut arena, root) = arena(trace);
        arena.state_mut(root).make_busy(veteran, r3);

        let flip = Flip::new(100.0, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..20 {
            let before = arena.state(root).get_route(veteran);
            assert!(flip.mutate(&mut arena.state_mut(root), 0, &mut rng));
            let after = arena.state(root).get_route(veteran);
            assert!(after.is_some());
            assert_ne!(before, after);
        }
        arena.state(root).validate().unwrap();
    }

    #[test]
    fn test_flip_rejects_bad_temperature() {
        assert!(Flip::new(0.0, 1).is_err());
        assert!(EjectionChain::new(3, f64::NAN, 1).is_err());
    }

    #[test]
    fn test_ejection_chain_evicts_and_replaces() {
        let trace = porter_trace();
        let sam = trace.candidate_id("sam").unwrap();
        let veteran = trace.candidate_id("veteran").unwrap();
        let r2 = trace.route_id("r2").unwrap();
        let r5 = trace.route_id("r5").unwrap();
        let (mut arena, root) = arena(trace);
        {
            let mut state = arena.state_mut(root);
            state.make_busy(sam, r2);
            state.make_busy(veteran, r5);
        }

        // Cold softmax: every link takes the candidate's best unfixed route.
        let chain = EjectionChain::new(4, 1e-6, 2).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10 {
            chain.mutate(&mut arena.state_mut(root), 0, &mut rng);
            arena.state(root).validate().unwrap();
        }
        // Any chain that starts at veteran puts them on r3 and pushes sam to
        // r1; any chain that starts at sam keeps the pair disjoint.
        assert_eq!(arena.state(root).busy_count(), 2);
    }
}
