//! Category hierarchy traversal.
//!
//! Categories form a DAG through [`Relation::Subcategory`] edges. The BFS
//! helpers here tolerate diamonds (a category reachable through two parents)
//! and terminate even on a hand-edited snapshot containing a cycle.

use std::collections::{HashSet, VecDeque};

use super::{GraphState, NodeId, Relation};

/// The category and every category reachable below it.
pub fn subtree(state: &GraphState, root: NodeId) -> HashSet<NodeId> {
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    visited.insert(root);
    queue.push_back(root);

    while let Some(node) = queue.pop_front() {
        for (child, relation) in state.outgoing(node) {
            if relation == Relation::Subcategory && visited.insert(child) {
                queue.push_back(child);
            }
        }
    }
    visited
}

/// Content items that are members of `root` or of any category below it.
pub fn subtree_members(state: &GraphState, root: NodeId) -> HashSet<NodeId> {
    subtree(state, root)
        .into_iter()
        .flat_map(|cat| state.outgoing(cat))
        .filter(|(_, relation)| relation.is_member())
        .map(|(item, _)| item)
        .collect()
}

/// Whether adding `parent → child` would close a cycle.
pub fn would_cycle(state: &GraphState, parent: NodeId, child: NodeId) -> bool {
    parent == child || subtree(state, child).contains(&parent)
}

/// Direct parents of a category.
pub fn parents(state: &GraphState, category: NodeId) -> Vec<NodeId> {
    state
        .incoming(category)
        .into_iter()
        .filter(|(_, r)| *r == Relation::Subcategory)
        .map(|(p, _)| p)
        .collect()
}
