//! Read and write access to a state, resolved through its parent chain.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::Rng;

use super::arena::{Layer, StateArena, StateId};
use super::diff::{CustomerOverride, Override};
use crate::collections::{shuffled_range, FnView, SequenceView, ShuffledRange, StackedView};
use crate::error::{Error, Result};
use crate::trace::{CandidateId, CustomerId, RouteId, Trace};

/// A candidate and the route it is busy on, if any.
pub type Entry = (CandidateId, Option<RouteId>);

/// Which candidates a traversal covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateFilter {
    #[default]
    All,
    Idle,
    Busy,
}

/// Index view over a state's candidates.
///
/// Slots of a parent layer that a diff overrides read as `None`; the number
/// of `Some` slots always equals the number of matching candidates.
pub type CandidateView<'a> = StackedView<'a, Option<Entry>>;

/// Shared read access to one state of a [`StateArena`].
#[derive(Clone, Copy)]
pub struct StateRef<'a> {
    arena: &'a StateArena,
    id: StateId,
}

impl<'a> StateRef<'a> {
    pub(crate) fn new(arena: &'a StateArena, id: StateId) -> Self {
        Self { arena, id }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn trace(&self) -> &'a Trace {
        self.arena.trace()
    }

    pub fn parent(&self) -> Option<StateRef<'a>> {
        self.arena
            .parent(self.id)
            .map(|parent| StateRef::new(self.arena, parent))
    }

    pub fn is_root(&self) -> bool {
        self.arena.is_root(self.id)
    }

    /// Sum of the scores of all busy assignments.
    pub fn score(&self) -> f64 {
        match self.arena.layer(self.id) {
            Layer::Root(solution) => solution.score(),
            Layer::Diff(diff) => diff.score(),
        }
    }

    pub fn busy_count(&self) -> usize {
        match self.arena.layer(self.id) {
            Layer::Root(solution) => solution.busy().len(),
            Layer::Diff(diff) => diff.busy_count(),
        }
    }

    pub fn idle_count(&self) -> usize {
        self.trace().candidate_count() - self.busy_count()
    }

    /// Route `candidate` is busy on, or `None` if idle.
    pub fn get_route(&self, candidate: CandidateId) -> Option<RouteId> {
        let mut id = self.id;
        loop {
            match self.arena.layer(id) {
                Layer::Root(solution) => return solution.route(candidate),
                Layer::Diff(diff) => match diff.lookup(candidate) {
                    Override::Idle => return None,
                    Override::Busy(route) => return Some(route),
                    Override::Inherit => id = self.diff_parent(id),
                },
            }
        }
    }

    /// Busy candidate whose route claims `customer`, if any.
    pub fn customer_owner(&self, customer: CustomerId) -> Option<CandidateId> {
        let mut id = self.id;
        loop {
            match self.arena.layer(id) {
                Layer::Root(solution) => return solution.customer_owner(customer),
                Layer::Diff(diff) => match diff.customer(customer) {
                    CustomerOverride::Held(owner) => return Some(owner),
                    CustomerOverride::Freed => return None,
                    CustomerOverride::Inherit => id = self.diff_parent(id),
                },
            }
        }
    }

    /// The subset of `customers` already claimed by a busy route.
    pub fn customer_overlap<I>(&self, customers: I) -> HashSet<CustomerId>
    where
        I: IntoIterator<Item = CustomerId>,
    {
        customers
            .into_iter()
            .filter(|&customer| self.customer_owner(customer).is_some())
            .collect()
    }

    /// Whether any of `customers` is already claimed.
    pub fn overlaps(&self, customers: &[CustomerId]) -> bool {
        customers
            .iter()
            .any(|&customer| self.customer_owner(customer).is_some())
    }

    /// Busy candidates whose routes claim any of `customers`.
    pub fn candidates_on_customers<I>(&self, customers: I) -> HashSet<CandidateId>
    where
        I: IntoIterator<Item = CustomerId>,
    {
        customers
            .into_iter()
            .filter_map(|customer| self.customer_owner(customer))
            .collect()
    }

    /// Uniformly samples an idle candidate.
    pub fn random_idle_candidate<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<CandidateId> {
        if self.idle_count() == 0 {
            return None;
        }
        match self.arena.layer(self.id) {
            Layer::Root(solution) => solution.idle().get_random_item(rng).map(|(&c, _)| c),
            Layer::Diff(_) => {
                let (candidate, _) = self.sample_view(CandidateFilter::Idle, rng);
                Some(candidate)
            }
        }
    }

    /// Uniformly samples a busy candidate with its route.
    pub fn random_busy_candidate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Option<(CandidateId, RouteId)> {
        if self.busy_count() == 0 {
            return None;
        }
        match self.arena.layer(self.id) {
            Layer::Root(solution) => solution.busy().get_random_item(rng).map(|(&c, &r)| (c, r)),
            Layer::Diff(_) => match self.sample_view(CandidateFilter::Busy, rng) {
                (candidate, Some(route)) => Some((candidate, route)),
                (candidate, None) => unreachable!("{candidate} sampled from a busy view"),
            },
        }
    }

    /// Uniformly samples any candidate.
    ///
    /// Picks the idle or busy group with probability proportional to its
    /// size, then samples within it, which keeps the overall draw uniform.
    pub fn random_candidate<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Entry> {
        let idle = self.idle_count();
        let total = idle + self.busy_count();
        if total == 0 {
            return None;
        }
        if rng.random_range(0..total) < idle {
            self.random_idle_candidate(rng).map(|c| (c, None))
        } else {
            self.random_busy_candidate(rng).map(|(c, r)| (c, Some(r)))
        }
    }

    /// Zero-copy view over the candidates matching `filter`.
    ///
    /// Roots list busy then idle candidates. A diff stacks its parent's view
    /// (with overridden candidates masked out) on top of its own idle and
    /// busy overrides.
    pub fn candidates_view(&self, filter: CandidateFilter) -> CandidateView<'a> {
        match self.arena.layer(self.id) {
            Layer::Root(solution) => {
                let busy = solution.busy().as_slice();
                let idle = solution.idle().as_slice();
                let busy_view = FnView::new(busy.len(), move |i: usize| {
                    let (candidate, route) = busy[i];
                    Some((candidate, Some(route)))
                });
                let idle_view = FnView::new(idle.len(), move |i: usize| Some((idle[i].0, None)));
                match filter {
                    CandidateFilter::All => StackedView::new().with(busy_view).with(idle_view),
                    CandidateFilter::Idle => StackedView::new().with(idle_view),
                    CandidateFilter::Busy => StackedView::new().with(busy_view),
                }
            }
            Layer::Diff(diff) => {
                let parent = StateRef::new(self.arena, self.diff_parent(self.id));
                let inherited = parent.candidates_view(filter);
                let masked = FnView::new(inherited.len(), move |i: usize| {
                    inherited
                        .get(i)
                        .filter(|&(candidate, _)| !diff.overrides(candidate))
                });

                let busy = diff.busy().as_slice();
                let idle = diff.idle().as_slice();
                let busy_view = FnView::new(busy.len(), move |i: usize| {
                    let (candidate, route) = busy[i];
                    Some((candidate, Some(route)))
                });
                let idle_view = FnView::new(idle.len(), move |i: usize| Some((idle[i].0, None)));

                match filter {
                    CandidateFilter::All => StackedView::new()
                        .with(masked)
                        .with(idle_view)
                        .with(busy_view),
                    CandidateFilter::Idle => StackedView::new().with(masked).with(idle_view),
                    CandidateFilter::Busy => StackedView::new().with(masked).with(busy_view),
                }
            }
        }
    }

    /// Iterates the candidates matching `filter`.
    pub fn iter_candidates(&self, filter: CandidateFilter) -> CandidateIter<'a> {
        let view = self.candidates_view(filter);
        let order = ShuffledRange::identity(view.len());
        CandidateIter { view, order }
    }

    /// Iterates the candidates matching `filter` in a random-looking order.
    pub fn iter_candidates_shuffled<R: Rng + ?Sized>(
        &self,
        filter: CandidateFilter,
        rng: &mut R,
    ) -> CandidateIter<'a> {
        let view = self.candidates_view(filter);
        let order = shuffled_range(view.len(), rng);
        CandidateIter { view, order }
    }

    /// Busy `(candidate, route)` pairs sorted by candidate.
    pub fn assignment(&self) -> Vec<(CandidateId, RouteId)> {
        let mut pairs: Vec<(CandidateId, RouteId)> = self
            .iter_candidates(CandidateFilter::Busy)
            .filter_map(|(candidate, route)| route.map(|r| (candidate, r)))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Recomputes every invariant from scratch.
    ///
    /// Checks that each candidate appears exactly once, that busy routes are
    /// pairwise customer-disjoint, and that the incrementally maintained
    /// score, busy count and customer ownership match the recomputation.
    pub fn validate(&self) -> Result<()> {
        let trace = self.trace();
        let mut seen = HashSet::with_capacity(trace.candidate_count());
        let mut owners: HashMap<CustomerId, CandidateId> = HashMap::new();
        let mut score = 0.0;
        let mut busy = 0usize;

        for (candidate, route) in self.iter_candidates(CandidateFilter::All) {
            if !seen.insert(candidate) {
                return Err(Error::Invariant(format!("{candidate} listed twice")));
            }
            let Some(route) = route else {
                continue;
            };
            busy += 1;
            score += trace.score(candidate, route).ok_or_else(|| {
                Error::Invariant(format!("{candidate} is busy on {route} it cannot take"))
            })?;
            for &customer in trace.route_customers(route) {
                if let Some(other) = owners.insert(customer, candidate) {
                    return Err(Error::Invariant(format!(
                        "{customer} claimed by both {other} and {candidate}"
                    )));
                }
            }
        }

        if seen.len() != trace.candidate_count() {
            return Err(Error::Invariant(format!(
                "{} of {} candidates listed",
                seen.len(),
                trace.candidate_count()
            )));
        }
        if busy != self.busy_count() {
            return Err(Error::Invariant(format!(
                "busy count {} but {busy} busy candidates",
                self.busy_count()
            )));
        }
        if (score - self.score()).abs() > 1e-6 * (1.0 + score.abs()) {
            return Err(Error::Invariant(format!(
                "score {} but assignments sum to {score}",
                self.score()
            )));
        }
        for customer in trace.customers() {
            let expected = owners.get(&customer).copied();
            let actual = self.customer_owner(customer);
            if expected != actual {
                return Err(Error::Invariant(format!(
                    "{customer} resolves to {actual:?}, expected {expected:?}"
                )));
            }
        }
        Ok(())
    }

    fn diff_parent(&self, id: StateId) -> StateId {
        self.arena
            .parent(id)
            .unwrap_or_else(|| unreachable!("diff layers always have a parent"))
    }

    /// Rejection-samples a `Some` slot; callers check the count first.
    fn sample_view<R: Rng + ?Sized>(&self, filter: CandidateFilter, rng: &mut R) -> Entry {
        let view = self.candidates_view(filter);
        loop {
            if let Some(entry) = view.get(rng.random_range(0..view.len())) {
                return entry;
            }
        }
    }
}

impl std::fmt::Debug for StateRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRef")
            .field("id", &self.id)
            .field("score", &self.score())
            .field("busy", &self.busy_count())
            .finish()
    }
}

/// Iterator over the candidates of a state; see
/// [`StateRef::iter_candidates`].
pub struct CandidateIter<'a> {
    view: CandidateView<'a>,
    order: ShuffledRange,
}

impl Iterator for CandidateIter<'_> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            let index = self.order.next()?;
            if let Some(entry) = self.view.get(index) {
                return Some(entry);
            }
        }
    }
}

/// Exclusive write access to one state of a [`StateArena`].
///
/// Customer exclusivity is the caller's job: check
/// [`StateRef::overlaps`] / [`StateRef::customer_overlap`] before
/// [`make_busy`](Self::make_busy).
pub struct StateMut<'a> {
    arena: &'a mut StateArena,
    id: StateId,
}

impl<'a> StateMut<'a> {
    pub(crate) fn new(arena: &'a mut StateArena, id: StateId) -> Self {
        Self { arena, id }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    /// A handle on the shared trace that does not borrow the state.
    pub fn trace(&self) -> Arc<Trace> {
        Arc::clone(self.arena.trace())
    }

    /// Read access to the same state.
    pub fn view(&self) -> StateRef<'_> {
        StateRef::new(self.arena, self.id)
    }

    /// Commits `candidate` to `route`.
    ///
    /// # Panics
    ///
    /// If `candidate` is already busy or cannot take `route`.
    pub fn make_busy(&mut self, candidate: CandidateId, route: RouteId) {
        self.arena.make_busy(self.id, candidate, route);
    }

    /// Releases `candidate` and the customers of its route.
    ///
    /// # Panics
    ///
    /// If `candidate` is idle.
    pub fn make_idle(&mut self, candidate: CandidateId) {
        self.arena.make_idle(self.id, candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::tests::porter_trace;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    struct Ids {
        sam: CandidateId,
        veteran: CandidateId,
        r: [RouteId; 5],
        a: CustomerId,
        b: CustomerId,
        c: CustomerId,
    }

    fn ids(trace: &Trace) -> Ids {
        let route = |name: &str| trace.route_id(name).unwrap();
        Ids {
            sam: trace.candidate_id("sam").unwrap(),
            veteran: trace.candidate_id("veteran").unwrap(),
            r: [route("r1"), route("r2"), route("r3"), route("r4"), route("r5")],
            a: trace.customer_id("A").unwrap(),
            b: trace.customer_id("B").unwrap(),
            c: trace.customer_id("C").unwrap(),
        }
    }

    fn setup() -> (StateArena, StateId, Ids) {
        let trace = Arc::new(porter_trace());
        let ids = ids(&trace);
        let mut arena = StateArena::new(trace);
        let root = arena.empty_solution();
        (arena, root, ids)
    }

    fn entries(view: StateRef<'_>, filter: CandidateFilter) -> BTreeSet<Entry> {
        view.iter_candidates(filter).collect()
    }

    fn samples(view: StateRef<'_>, rng: &mut StdRng) -> BTreeSet<Entry> {
        (0..200).filter_map(|_| view.random_candidate(rng)).collect()
    }

    /// Everything observable about a state.
    fn assert_equivalent(a: StateRef<'_>, b: StateRef<'_>, ids: &Ids) {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(a.score(), b.score());
        assert_eq!(a.busy_count(), b.busy_count());
        assert_eq!(a.idle_count(), b.idle_count());
        for candidate in [ids.sam, ids.veteran] {
            assert_eq!(a.get_route(candidate), b.get_route(candidate));
        }
        let all = [ids.a, ids.b, ids.c];
        assert_eq!(a.customer_overlap(all), b.customer_overlap(all));
        assert_eq!(a.candidates_on_customers(all), b.candidates_on_customers(all));
        for filter in [CandidateFilter::All, CandidateFilter::Idle, CandidateFilter::Busy] {
            assert_eq!(entries(a, filter), entries(b, filter));
        }
        assert_eq!(samples(a, &mut rng), samples(b, &mut rng));
        a.validate().unwrap();
        b.validate().unwrap();
    }

    fn valid_straight(state: &mut StateMut<'_>, ids: &Ids) {
        state.make_busy(ids.sam, ids.r[0]);
        state.make_busy(ids.veteran, ids.r[3]);
    }

    fn valid_unsure(state: &mut StateMut<'_>, ids: &Ids) {
        state.make_busy(ids.sam, ids.r[1]);
        state.make_idle(ids.sam);
        state.make_busy(ids.sam, ids.r[0]);
        state.make_busy(ids.veteran, ids.r[3]);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let (mut arena, root, ids) = setup();
        let mut state = arena.state_mut(root);
        state.make_busy(ids.sam, ids.r[1]);
        state.make_busy(ids.veteran, ids.r[4]);

        let view = state.view();
        assert_eq!(view.score(), 400.0);
        assert_eq!(
            view.customer_overlap([ids.a, ids.b, ids.c]),
            HashSet::from([ids.a, ids.b, ids.c])
        );
        // Moving sam to r1 without freeing it first is flagged up front.
        assert!(!view.customer_overlap([ids.a]).is_empty());
        view.validate().unwrap();
    }

    #[test]
    fn test_candidates_on_customers() {
        let (mut arena, root, ids) = setup();
        let mut state = arena.state_mut(root);
        state.make_busy(ids.sam, ids.r[0]);
        assert_eq!(state.view().candidates_on_customers([ids.a]), HashSet::from([ids.sam]));
        state.make_idle(ids.sam);
        state.make_busy(ids.sam, ids.r[1]);
        assert_eq!(state.view().candidates_on_customers([ids.a, ids.b]), HashSet::from([ids.sam]));
        state.make_busy(ids.veteran, ids.r[4]);
        assert_eq!(
            state.view().candidates_on_customers([ids.a, ids.c]),
            HashSet::from([ids.sam, ids.veteran])
        );

        let diff = arena.diff(root);
        let mut state = arena.state_mut(diff);
        assert_eq!(
            state.view().candidates_on_customers([ids.a, ids.b, ids.c]),
            HashSet::from([ids.sam, ids.veteran])
        );
        state.make_idle(ids.sam);
        assert_eq!(state.view().candidates_on_customers([ids.a, ids.b]), HashSet::new());
        assert_eq!(state.view().candidates_on_customers([ids.c]), HashSet::from([ids.veteran]));
        state.make_busy(ids.sam, ids.r[0]);
        assert_eq!(
            state.view().candidates_on_customers([ids.a, ids.c]),
            HashSet::from([ids.sam, ids.veteran])
        );
    }

    #[test]
    fn test_root_and_diff_chains_agree() {
        let scenarios: [fn(&mut StateMut<'_>, &Ids); 3] =
            [|_, _| {}, valid_straight, valid_unsure];
        for scenario in scenarios {
            let (mut arena, root, ids) = setup();
            let other_root = arena.empty_solution();
            let one = arena.diff(other_root);
            let third_root = arena.empty_solution();
            let mid = arena.diff(third_root);
            let two = arena.diff(mid);

            for id in [root, one, two] {
                scenario(&mut arena.state_mut(id), &ids);
            }
            assert_equivalent(arena.state(root), arena.state(one), &ids);
            assert_equivalent(arena.state(root), arena.state(two), &ids);

            let folded = arena.apply(two);
            assert_eq!(folded, mid);
            assert_equivalent(arena.state(root), arena.state(mid), &ids);
            let folded = arena.apply(mid);
            assert_eq!(folded, third_root);
            assert_equivalent(arena.state(root), arena.state(third_root), &ids);
        }
    }

    #[test]
    fn test_history_of_nested_diffs() {
        let (mut arena, _, ids) = setup();
        let mutations: [fn(&mut StateMut<'_>, &Ids); 3] = [
            |s, ids| {
                s.make_busy(ids.sam, ids.r[0]);
                s.make_busy(ids.veteran, ids.r[3]);
            },
            |s, ids| {
                s.make_idle(ids.veteran);
                s.make_busy(ids.veteran, ids.r[4]);
                s.make_idle(ids.sam);
                s.make_busy(ids.sam, ids.r[1]);
            },
            |s, ids| s.make_idle(ids.sam),
        ];

        // Each step of `plain` is an independent root replaying the prefix.
        let mut chain = vec![arena.empty_solution()];
        let mut plain = vec![arena.empty_solution()];
        for (step, mutate) in mutations.iter().enumerate() {
            let next = arena.diff(*chain.last().unwrap());
            mutate(&mut arena.state_mut(next), &ids);
            chain.push(next);

            let replay = arena.empty_solution();
            for m in &mutations[..=step] {
                m(&mut arena.state_mut(replay), &ids);
            }
            plain.push(replay);

            for (&a, &b) in plain.iter().zip(&chain) {
                assert_equivalent(arena.state(a), arena.state(b), &ids);
            }
        }
    }

    #[test]
    fn test_random_sampling_respects_groups() {
        let (mut arena, root, ids) = setup();
        arena.state_mut(root).make_busy(ids.sam, ids.r[0]);
        let diff = arena.diff(root);
        {
            let mut state = arena.state_mut(diff);
            state.make_idle(ids.sam);
            state.make_busy(ids.veteran, ids.r[2]);
        }

        let mut rng = StdRng::seed_from_u64(9);
        let view = arena.state(diff);
        for _ in 0..100 {
            assert_eq!(view.random_idle_candidate(&mut rng), Some(ids.sam));
            assert_eq!(view.random_busy_candidate(&mut rng), Some((ids.veteran, ids.r[2])));
        }
        let root_view = arena.state(root);
        assert_eq!(root_view.random_busy_candidate(&mut rng), Some((ids.sam, ids.r[0])));
        assert_eq!(root_view.random_idle_candidate(&mut rng), Some(ids.veteran));
    }

    #[test]
    fn test_empty_groups_sample_none() {
        let (arena, root, _) = setup();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(arena.state(root).random_busy_candidate(&mut rng), None);
    }

    #[test]
    fn test_shuffled_iteration_covers_all() {
        let (mut arena, root, ids) = setup();
        arena.state_mut(root).make_busy(ids.sam, ids.r[1]);
        let diff = arena.diff(root);
        arena.state_mut(diff).make_busy(ids.veteran, ids.r[4]);

        let mut rng = StdRng::seed_from_u64(2);
        let view = arena.state(diff);
        let shuffled: BTreeSet<Entry> = view
            .iter_candidates_shuffled(CandidateFilter::All, &mut rng)
            .collect();
        assert_eq!(shuffled, entries(view, CandidateFilter::All));
        assert_eq!(
            view.assignment(),
            vec![(ids.sam, ids.r[1]), (ids.veteran, ids.r[4])]
        );
    }

    #[test]
    fn test_validate_detects_overlap() {
        let (mut arena, root, ids) = setup();
        let mut state = arena.state_mut(root);
        state.make_busy(ids.sam, ids.r[1]);
        // Caller contract broken on purpose: r3 also claims B.
        state.make_busy(ids.veteran, ids.r[2]);
        assert!(matches!(state.view().validate(), Err(Error::Invariant(_))));
    }

    #[test]
    #[should_panic(expected = "is not busy")]
    fn test_make_idle_on_idle_panics() {
        let (mut arena, root, ids) = setup();
        let diff = arena.diff(root);
        arena.state_mut(diff).make_idle(ids.sam);
    }

    #[test]
    #[should_panic(expected = "already busy")]
    fn test_make_busy_on_busy_diff_panics() {
        let (mut arena, root, ids) = setup();
        arena.state_mut(root).make_busy(ids.sam, ids.r[0]);
        let diff = arena.diff(root);
        arena.state_mut(diff).make_busy(ids.sam, ids.r[1]);
    }

    /// One legal operation against the porter trace.
    #[derive(Debug, Clone, Copy)]
    enum Op {
        Busy(usize, usize),
        Idle(usize),
        Nest,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..2, 0usize..3).prop_map(|(c, r)| Op::Busy(c, r)),
            (0usize..2).prop_map(Op::Idle),
            Just(Op::Nest),
        ]
    }

    /// Applies `op` if it is legal in `state`; returns whether it was.
    fn apply_op(arena: &mut StateArena, id: StateId, op: Op, ids: &Ids) -> bool {
        let candidates = [ids.sam, ids.veteran];
        let options = [&ids.r[..2], &ids.r[2..]];
        match op {
            Op::Busy(c, r) => {
                let candidate = candidates[c];
                let route = options[c][r % options[c].len()];
                let view = arena.state(id);
                let customers = view.trace().route_customers(route).to_vec();
                if view.get_route(candidate).is_some() || view.overlaps(&customers) {
                    return false;
                }
                arena.state_mut(id).make_busy(candidate, route);
                true
            }
            Op::Idle(c) => {
                if arena.state(id).get_route(candidates[c]).is_none() {
                    return false;
                }
                arena.state_mut(id).make_idle(candidates[c]);
                true
            }
            Op::Nest => false,
        }
    }

    proptest! {
        #[test]
        fn prop_diff_chain_matches_root(ops in proptest::collection::vec(op_strategy(), 0..40)) {
            let (mut arena, root, ids) = setup();
            let base = arena.empty_solution();
            let mut tip = arena.diff(base);

            for op in ops {
                if let Op::Nest = op {
                    tip = arena.diff(tip);
                    continue;
                }
                if apply_op(&mut arena, root, op, &ids) {
                    prop_assert!(apply_op(&mut arena, tip, op, &ids));
                }
                arena.state(root).validate().unwrap();
                arena.state(tip).validate().unwrap();
                prop_assert_eq!(arena.state(root).assignment(), arena.state(tip).assignment());
                prop_assert!((arena.state(root).score() - arena.state(tip).score()).abs() < 1e-9);
            }

            // Fold the whole chain back into `base`.
            while tip != base {
                tip = arena.apply(tip);
            }
            arena.state(base).validate().unwrap();
            prop_assert_eq!(arena.state(root).assignment(), arena.state(base).assignment());
            prop_assert!((arena.state(root).score() - arena.state(base).score()).abs() < 1e-9);
        }
    }
}
