//! Arena of state layers addressed by stable handles.
//!
//! Every [`Solution`] and [`SolutionDiff`] lives in one slot of a
//! [`StateArena`]. A slot records its parent handle and how many live
//! children point at it; "the same state" means "the same slot with the same
//! generation". Releasing or folding a slot bumps its generation, so stale
//! handles are caught instead of silently reading a reused slot.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::access::{StateMut, StateRef};
use super::diff::SolutionDiff;
use super::solution::Solution;
use crate::trace::{CandidateId, RouteId, Trace};

/// Opaque, generation-checked handle to a state layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId {
    index: u32,
    generation: u32,
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Layer {
    Root(Solution),
    Diff(SolutionDiff),
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    layer: Option<Layer>,
    parent: Option<StateId>,
    children: usize,
}

/// Owner of every state layer of one search.
///
/// The trace is shared by `Arc`; layers only store deltas and handles.
#[derive(Debug, Clone)]
pub struct StateArena {
    trace: Arc<Trace>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl StateArena {
    pub fn new(trace: Arc<Trace>) -> Self {
        Self {
            trace,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn trace(&self) -> &Arc<Trace> {
        &self.trace
    }

    /// Number of live states.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Creates a root state: every candidate idle, score zero.
    pub fn empty_solution(&mut self) -> StateId {
        let root = Solution::empty(&self.trace);
        self.insert(Layer::Root(root), None)
    }

    /// Creates an empty overlay on top of `parent`.
    pub fn diff(&mut self, parent: StateId) -> StateId {
        let (busy_count, score) = {
            let view = self.state(parent);
            (view.busy_count(), view.score())
        };
        self.slot_mut(parent).children += 1;
        self.insert(
            Layer::Diff(SolutionDiff::on_top_of(busy_count, score)),
            Some(parent),
        )
    }

    /// Whether `id` still refers to a live state.
    pub fn contains(&self, id: StateId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.generation == id.generation && slot.layer.is_some())
    }

    pub fn parent(&self, id: StateId) -> Option<StateId> {
        self.slot(id).parent
    }

    /// Number of live states whose parent is `id`.
    pub fn children_count(&self, id: StateId) -> usize {
        self.slot(id).children
    }

    pub fn is_root(&self, id: StateId) -> bool {
        matches!(self.layer(id), Layer::Root(_))
    }

    /// Handles of all live states, in slot order.
    pub fn live_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.layer.as_ref().map(|_| StateId {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    /// Read access to a state.
    ///
    /// # Panics
    ///
    /// If `id` was released or folded.
    pub fn state(&self, id: StateId) -> StateRef<'_> {
        self.slot(id);
        StateRef::new(self, id)
    }

    /// Write access to a state.
    ///
    /// Writing to a state that has children changes what those children
    /// read through it; only mutate frontier leaves.
    pub fn state_mut(&mut self, id: StateId) -> StateMut<'_> {
        self.slot(id);
        StateMut::new(self, id)
    }

    /// Discards a state that nothing depends on.
    ///
    /// # Panics
    ///
    /// If `id` still has children.
    pub fn release(&mut self, id: StateId) {
        let slot = self.slot(id);
        assert_eq!(slot.children, 0, "cannot release {id}: it still has children");
        if let Some(parent) = slot.parent {
            self.slot_mut(parent).children -= 1;
        }
        self.vacate(id);
    }

    /// Folds a childless diff into its parent and returns the parent.
    ///
    /// `id` is invalid afterwards.
    ///
    /// # Panics
    ///
    /// If `id` is a root, has children, or its parent has other children.
    pub fn apply(&mut self, id: StateId) -> StateId {
        self.fold(id, &[])
    }

    /// Folds `id` into its parent and re-parents `children` (which must be
    /// all of `id`'s children) onto that parent.
    pub(crate) fn fold(&mut self, id: StateId, children: &[StateId]) -> StateId {
        let parent = self
            .parent(id)
            .unwrap_or_else(|| panic!("cannot apply {id}: it is a root"));
        assert_eq!(
            self.slot(id).children,
            children.len(),
            "cannot apply {id}: it has children that were not accounted for"
        );
        for &child in children {
            assert_eq!(self.parent(child), Some(id), "{child} is not a child of {id}");
        }
        assert_eq!(
            self.slot(parent).children,
            1,
            "cannot apply {id}: its parent {parent} has other children"
        );

        let Layer::Diff(diff) = self.vacate(id) else {
            unreachable!("layers with a parent are diffs")
        };
        let expected_score = diff.score();
        let (idle, busy) = diff.into_transitions();

        for candidate in idle {
            self.make_idle(parent, candidate);
        }
        for &(candidate, _) in &busy {
            if self.state(parent).get_route(candidate).is_some() {
                self.make_idle(parent, candidate);
            }
        }
        for (candidate, route) in busy {
            self.make_busy(parent, candidate, route);
        }

        debug_assert!(
            (self.state(parent).score() - expected_score).abs()
                <= 1e-6 * (1.0 + expected_score.abs()),
            "score not conserved while folding {id} into {parent}"
        );

        self.slot_mut(parent).children = children.len();
        for &child in children {
            self.slot_mut(child).parent = Some(parent);
        }
        parent
    }

    /// Releases every live state not in `keep`. Returns how many went.
    ///
    /// `keep` must be closed under parents.
    pub(crate) fn retain(&mut self, keep: &HashSet<StateId>) -> usize {
        let doomed: Vec<StateId> = self.live_states().filter(|id| !keep.contains(id)).collect();
        for &id in &doomed {
            if let Some(parent) = self.parent(id) {
                if keep.contains(&parent) {
                    self.slot_mut(parent).children -= 1;
                }
            }
        }
        for &id in &doomed {
            self.vacate(id);
        }
        debug_assert!(keep
            .iter()
            .all(|&id| self.parent(id).is_none_or(|p| keep.contains(&p))));
        doomed.len()
    }

    pub(crate) fn make_busy(&mut self, id: StateId, candidate: CandidateId, route: RouteId) {
        let (current, parent_route) = {
            let view = self.state(id);
            let parent_route = match (self.layer(id), view.parent()) {
                (Layer::Diff(diff), Some(parent)) if diff.is_locally_idle(candidate) => {
                    parent.get_route(candidate)
                }
                _ => None,
            };
            (view.get_route(candidate), parent_route)
        };
        if let Some(current) = current {
            panic!("{candidate} is already busy on {current} in {id}");
        }

        let (trace, layer) = self.layer_mut(id);
        match layer {
            Layer::Root(solution) => solution.make_busy(trace, candidate, route),
            Layer::Diff(diff) => diff.make_busy(trace, candidate, route, parent_route),
        }
    }

    pub(crate) fn make_idle(&mut self, id: StateId, candidate: CandidateId) {
        let view = self.state(id);
        let route = view
            .get_route(candidate)
            .unwrap_or_else(|| panic!("{candidate} is not busy in {id}"));
        let parent_reads = match (self.layer(id), view.parent()) {
            (Layer::Diff(diff), Some(parent)) => {
                let parent_busy =
                    diff.is_locally_busy(candidate) && parent.get_route(candidate).is_some();
                let freed = parent.customer_overlap(self.trace.route_customers(route).iter().copied());
                Some((parent_busy, freed))
            }
            _ => None,
        };

        let (trace, layer) = self.layer_mut(id);
        match (layer, parent_reads) {
            (Layer::Root(solution), _) => solution.make_idle(trace, candidate),
            (Layer::Diff(diff), Some((parent_busy, freed))) => {
                diff.make_idle(trace, candidate, route, parent_busy, freed)
            }
            (Layer::Diff(_), None) => unreachable!("diff layers always have a parent"),
        }
    }

    pub(crate) fn layer(&self, id: StateId) -> &Layer {
        self.slot(id)
            .layer
            .as_ref()
            .unwrap_or_else(|| unreachable!("slot() checks liveness"))
    }

    fn layer_mut(&mut self, id: StateId) -> (&Trace, &mut Layer) {
        self.slot(id);
        let Self { trace, slots, .. } = self;
        let layer = slots[id.index as usize]
            .layer
            .as_mut()
            .unwrap_or_else(|| unreachable!("slot() checks liveness"));
        (&**trace, layer)
    }

    fn slot(&self, id: StateId) -> &Slot {
        match self.slots.get(id.index as usize) {
            Some(slot) if slot.generation == id.generation && slot.layer.is_some() => slot,
            _ => panic!("{id} was applied or released and must not be used"),
        }
    }

    fn slot_mut(&mut self, id: StateId) -> &mut Slot {
        self.slot(id);
        &mut self.slots[id.index as usize]
    }

    fn insert(&mut self, layer: Layer, parent: Option<StateId>) -> StateId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.layer = Some(layer);
            slot.parent = parent;
            slot.children = 0;
            return StateId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len())
            .unwrap_or_else(|_| panic!("state arena exceeds {} slots", u32::MAX));
        self.slots.push(Slot {
            generation: 0,
            layer: Some(layer),
            parent,
            children: 0,
        });
        StateId {
            index,
            generation: 0,
        }
    }

    fn vacate(&mut self, id: StateId) -> Layer {
        let slot = &mut self.slots[id.index as usize];
        let layer = slot
            .layer
            .take()
            .unwrap_or_else(|| panic!("{id} was applied or released and must not be used"));
        slot.generation = slot.generation.wrapping_add(1);
        slot.parent = None;
        slot.children = 0;
        self.free.push(id.index);
        self.live -= 1;
        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::tests::porter_trace;

    fn arena() -> StateArena {
        StateArena::new(Arc::new(porter_trace()))
    }

    #[test]
    fn test_diff_tracks_children() {
        let mut arena = arena();
        let root = arena.empty_solution();
        let a = arena.diff(root);
        let b = arena.diff(root);
        assert_eq!(arena.children_count(root), 2);
        assert_eq!(arena.parent(a), Some(root));
        assert!(arena.is_root(root));
        assert!(!arena.is_root(b));
        assert_eq!(arena.len(), 3);

        arena.release(b);
        assert_eq!(arena.children_count(root), 1);
        assert!(!arena.contains(b));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut arena = arena();
        let root = arena.empty_solution();
        let a = arena.diff(root);
        arena.release(a);
        let b = arena.diff(root);
        assert_ne!(a, b);
        assert!(!arena.contains(a));
        assert!(arena.contains(b));
    }

    #[test]
    #[should_panic(expected = "must not be used")]
    fn test_stale_handle_panics() {
        let mut arena = arena();
        let root = arena.empty_solution();
        let a = arena.diff(root);
        arena.apply(a);
        arena.state(a).score();
    }

    #[test]
    #[should_panic(expected = "not accounted for")]
    fn test_apply_with_children_panics() {
        let mut arena = arena();
        let root = arena.empty_solution();
        let a = arena.diff(root);
        let _b = arena.diff(a);
        arena.apply(a);
    }

    #[test]
    #[should_panic(expected = "other children")]
    fn test_apply_with_siblings_panics() {
        let mut arena = arena();
        let root = arena.empty_solution();
        let a = arena.diff(root);
        let _b = arena.diff(root);
        arena.apply(a);
    }

    #[test]
    #[should_panic(expected = "it is a root")]
    fn test_apply_root_panics() {
        let mut arena = arena();
        let root = arena.empty_solution();
        arena.apply(root);
    }

    #[test]
    #[should_panic(expected = "still has children")]
    fn test_release_with_children_panics() {
        let mut arena = arena();
        let root = arena.empty_solution();
        let _a = arena.diff(root);
        arena.release(root);
    }

    #[test]
    fn test_retain_drops_unreachable() {
        let mut arena = arena();
        let root = arena.empty_solution();
        let keep = arena.diff(root);
        let drop_a = arena.diff(root);
        let drop_b = arena.diff(drop_a);

        let released = arena.retain(&[root, keep].into_iter().collect());
        assert_eq!(released, 2);
        assert!(!arena.contains(drop_a));
        assert!(!arena.contains(drop_b));
        assert_eq!(arena.children_count(root), 1);
    }
}
