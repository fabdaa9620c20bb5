//! Diff-tree collapsing.
//!
//! Every exploration step stacks a new diff on the state it started from, so
//! a long search leaves behind deep chains of layers. [`collapse`] rewrites
//! the ancestry of a frontier into its minimal form:
//!
//! ```text
//!           +->F                      +->F
//!           |                         |
//!     A->B->C->D->E      becomes    ABC->DE
//!
//!     A->B->C->D->E      becomes    ABCDE
//! ```
//!
//! Single-child links are folded away; branch points survive because their
//! children still read through them. States nothing in the frontier descends
//! from are released first.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::trace;

use super::arena::{StateArena, StateId};
use super::names::DebugNames;
use crate::anneal::StateSpace;

/// Ancestry tree of a frontier.
#[derive(Debug, Clone)]
pub struct DiffTree {
    root: StateId,
    children: HashMap<StateId, Vec<StateId>>,
}

impl DiffTree {
    /// Walks parents from every frontier state up to the root.
    ///
    /// # Panics
    ///
    /// If `frontier` is empty or its states do not share one root.
    pub fn build(arena: &StateArena, frontier: &[StateId]) -> Self {
        let mut children: HashMap<StateId, Vec<StateId>> = HashMap::new();
        let mut visited = HashSet::new();
        let mut root: Option<StateId> = None;
        let mut queue = frontier.to_vec();

        while let Some(id) = queue.pop() {
            if !visited.insert(id) {
                continue;
            }
            children.entry(id).or_default();
            match arena.parent(id) {
                Some(parent) => {
                    children.entry(parent).or_default().push(id);
                    queue.push(parent);
                }
                None => match root {
                    Some(other) if other != id => {
                        panic!("found multiple roots: {other} and {id}")
                    }
                    _ => root = Some(id),
                },
            }
        }

        let root = root.unwrap_or_else(|| panic!("cannot build a tree from an empty frontier"));
        Self { root, children }
    }

    pub fn root(&self) -> StateId {
        self.root
    }

    /// Children of `id`; empty for leaves and unknown handles.
    pub fn children(&self, id: StateId) -> &[StateId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn nodes(&self) -> impl Iterator<Item = StateId> + '_ {
        self.children.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Renders the tree as `label -> sorted child labels`, labelling nodes
    /// breadth-first from the root.
    pub fn describe(&self, names: &mut DebugNames) -> BTreeMap<String, Vec<String>> {
        let mut rendered = BTreeMap::new();
        let mut layer = vec![self.root];
        while !layer.is_empty() {
            let mut next = Vec::new();
            for node in layer {
                let label = names.label(node);
                let mut labels: Vec<String> = self
                    .children(node)
                    .iter()
                    .map(|&child| names.label(child))
                    .collect();
                labels.sort();
                rendered.insert(label, labels);
                next.extend_from_slice(self.children(node));
            }
            layer = next;
        }
        rendered
    }
}

/// Folds every single-child link of `tree` away, top down.
///
/// Frontier states are pinned: they keep an addressable handle and never
/// absorb a child, since that would change what they read. When a pinned
/// child is folded into an unpinned parent, the parent inherits the pin and
/// stands in for it.
///
/// Returns `frontier` with each handle replaced by the one now holding its
/// state. `tree` is left describing the collapsed shape.
///
/// `tree` must mirror the arena exactly: every live descendant of the root
/// is a node of the tree.
pub fn optimize_tree(
    arena: &mut StateArena,
    tree: &mut DiffTree,
    frontier: &[StateId],
) -> Vec<StateId> {
    let mut pinned: HashSet<StateId> = frontier.iter().copied().collect();
    let mut moved: HashMap<StateId, StateId> = HashMap::new();
    let mut layer = vec![tree.root];

    while !layer.is_empty() {
        let mut next = Vec::new();
        for node in layer {
            let children = tree.children.remove(&node).unwrap_or_default();
            match children.len() {
                0 => {
                    tree.children.insert(node, children);
                }
                1 if !pinned.contains(&node) => {
                    let child = children[0];
                    let grandchildren = tree.children.remove(&child).unwrap_or_default();
                    let folded_into = arena.fold(child, &grandchildren);
                    debug_assert_eq!(folded_into, node);
                    if pinned.remove(&child) {
                        pinned.insert(node);
                        moved.insert(child, node);
                    }
                    tree.children.insert(node, grandchildren);
                    next.push(node);
                }
                _ => {
                    next.extend_from_slice(&children);
                    tree.children.insert(node, children);
                }
            }
        }
        layer = next;
    }

    frontier
        .iter()
        .map(|&id| {
            let mut id = id;
            while let Some(&to) = moved.get(&id) {
                id = to;
            }
            id
        })
        .collect()
}

/// Releases everything the frontier does not descend from, then folds the
/// rest down to its minimal form. Routes of frontier states are unchanged
/// and their scores are conserved up to floating-point rounding, since
/// folding re-adds route scores in a different order. Use the returned
/// handles from now on.
pub fn collapse(arena: &mut StateArena, frontier: &[StateId]) -> Vec<StateId> {
    let mut tree = DiffTree::build(arena, frontier);
    let nodes = tree.len();
    let keep: HashSet<StateId> = tree.nodes().collect();
    let released = arena.retain(&keep);
    let survivors = optimize_tree(arena, &mut tree, frontier);
    trace!(
        event = "collapse",
        nodes,
        released,
        folded = nodes - tree.len(),
        live = arena.len(),
    );
    survivors
}

impl StateSpace for StateArena {
    type State = StateId;

    fn compact(&mut self, frontier: &[StateId]) -> Vec<StateId> {
        collapse(self, frontier)
    }
}
