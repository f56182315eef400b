//! Category positioning engine and category hierarchy management.
//!
//! Membership edges carry a sparse `i64` position. New items take a value
//! strictly between their neighbours; only when two neighbours are adjacent
//! integers (or arithmetic would overflow) is the whole category renumbered
//! to `step, 2*step, ...`, inside the same transaction as the insertion.
//!
//! Every positioning call is one [`ContentGraph::transact`], so concurrent
//! callers placing into the same category are serialized by the graph lock.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{CategoryError, GraphError};
use crate::graph::traverse::{self, would_cycle};
use crate::graph::{Category, ContentGraph, GraphState, GraphTxn, Node, NodeId, Relation};

/// Result type for category operations.
pub type CategoryResult<T> = std::result::Result<T, CategoryError>;

/// A member with its ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionedItem {
    pub item: NodeId,
    pub position: i64,
}

/// Category identity for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    pub id: NodeId,
    pub name: String,
}

/// One line of a category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub id: NodeId,
    pub name: String,
    pub remarks: Option<String>,
    pub pinned: bool,
    pub members: usize,
    pub subcategories: usize,
}

/// Where relocated items land in the target category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    End,
    /// After this member of the target; later items follow earlier ones.
    After(NodeId),
}

/// Outcome of a batch relocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocateReport {
    pub moved: usize,
    pub failed: Vec<(NodeId, String)>,
}

/// Target slot in the order of the other members.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Top,
    Bottom,
    After(NodeId),
    AfterNth(usize),
}

/// Positioning and hierarchy operations over a content graph.
#[derive(Debug, Clone, Copy)]
pub struct CategoryStore<'g> {
    graph: &'g ContentGraph,
    step: i64,
}

impl<'g> CategoryStore<'g> {
    pub fn new(graph: &'g ContentGraph, step: i64) -> Self {
        Self { graph, step }
    }

    // -----------------------------------------------------------------------
    // Positioning
    // -----------------------------------------------------------------------

    /// Place `item` before every other member.
    pub fn add_at_beginning(&self, category: NodeId, item: NodeId) -> CategoryResult<i64> {
        self.graph
            .transact(|txn| place(txn, "add_at_beginning", category, item, Slot::Top, self.step))
    }

    /// Place `item` after every other member.
    pub fn add_at_end(&self, category: NodeId, item: NodeId) -> CategoryResult<i64> {
        self.graph
            .transact(|txn| place(txn, "add_at_end", category, item, Slot::Bottom, self.step))
    }

    /// Place `item` directly after the member `after_item`.
    pub fn add_after(&self, category: NodeId, item: NodeId, after_item: NodeId) -> CategoryResult<i64> {
        self.graph.transact(|txn| {
            place(
                txn,
                "add_after",
                category,
                item,
                Slot::After(after_item),
                self.step,
            )
        })
    }

    /// Exchange the positions of two members.
    pub fn swap(&self, category: NodeId, a: NodeId, b: NodeId) -> CategoryResult<()> {
        const OP: &str = "swap";
        self.graph.transact(|txn| {
            require_category(txn, OP, category)?;
            let pa = member_position(txn, OP, category, a)?;
            let pb = member_position(txn, OP, category, b)?;
            if a == b {
                return Ok(());
            }
            txn.set_edge(OP, category, a, Relation::Member { position: pb })?;
            txn.set_edge(OP, category, b, Relation::Member { position: pa })?;
            tracing::debug!(%category, %a, %b, "swapped members");
            Ok(())
        })
    }

    /// Move a member to just after the `n`-th other member; `0` is the top
    /// and anything past the end is the bottom.
    pub fn reposition_after_nth(&self, category: NodeId, item: NodeId, n: usize) -> CategoryResult<i64> {
        const OP: &str = "reposition_after_nth";
        self.graph.transact(|txn| {
            require_category(txn, OP, category)?;
            member_position(txn, OP, category, item)?;
            place(txn, OP, category, item, Slot::AfterNth(n), self.step)
        })
    }

    /// Move members of `from` into `to`, one transaction per item. Failures
    /// are reported per item and do not stop the batch.
    pub fn relocate_across_categories(
        &self,
        items: &[NodeId],
        from: NodeId,
        to: NodeId,
        placement: Placement,
    ) -> CategoryResult<RelocateReport> {
        const OP: &str = "relocate_across_categories";
        self.graph.read(|state| -> CategoryResult<()> {
            require_category(state, OP, from)?;
            require_category(state, OP, to)?;
            Ok(())
        })?;

        let mut report = RelocateReport::default();
        let mut anchor = match placement {
            Placement::End => None,
            Placement::After(id) => Some(id),
        };
        for &item in items {
            let slot = anchor.map_or(Slot::Bottom, Slot::After);
            let result = self.graph.transact(|txn| {
                member_position(txn, OP, from, item)?;
                txn.remove_edge(from, item);
                place(txn, OP, to, item, slot, self.step)
            });
            match result {
                Ok(_) => {
                    report.moved += 1;
                    if anchor.is_some() {
                        anchor = Some(item);
                    }
                }
                Err(e) => {
                    tracing::warn!(%item, %from, %to, error = %e, "relocation failed");
                    report.failed.push((item, e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Members in order.
    pub fn ordered_members(&self, category: NodeId) -> CategoryResult<Vec<PositionedItem>> {
        self.graph.read(|state| {
            require_category(state, "ordered_members", category)?;
            ordered(state, category)
        })
    }

    // -----------------------------------------------------------------------
    // Hierarchy
    // -----------------------------------------------------------------------

    pub fn create_category(&self, name: &str, remarks: Option<String>) -> CategoryResult<NodeId> {
        let id = self.graph.transact(|txn| {
            txn.add_node(Node::Category(Category {
                name: name.to_string(),
                remarks,
                pinned: false,
            }))
        })?;
        tracing::debug!(%id, name, "created category");
        Ok(id)
    }

    /// Delete a category with its memberships and subcategory links. Member
    /// content and child categories stay.
    pub fn delete_category(&self, category: NodeId) -> CategoryResult<Category> {
        const OP: &str = "delete_category";
        self.graph.transact(|txn| {
            require_category(txn, OP, category)?;
            match txn.remove_node(OP, category)? {
                Node::Category(c) => Ok(c),
                other => Err(GraphError::WrongKind {
                    operation: OP,
                    id: category.get(),
                    expected: "category",
                    actual: other.kind(),
                }
                .into()),
            }
        })
    }

    pub fn set_pinned(&self, category: NodeId, pinned: bool) -> CategoryResult<()> {
        const OP: &str = "set_pinned";
        self.graph.transact(|txn| {
            let mut updated = require_category(txn, OP, category)?.clone();
            updated.pinned = pinned;
            txn.replace_node(OP, category, Node::Category(updated))?;
            Ok(())
        })
    }

    /// Nest `child` under `parent`. Rejects links that would close a cycle.
    pub fn link_subcategory(&self, parent: NodeId, child: NodeId) -> CategoryResult<()> {
        const OP: &str = "link_subcategory";
        self.graph.transact(|txn| {
            require_category(txn, OP, parent)?;
            require_category(txn, OP, child)?;
            if parent == child {
                return Err(CategoryError::SelfLink { id: parent.get() });
            }
            if txn.relation(parent, child) == Some(Relation::Subcategory) {
                return Ok(());
            }
            if would_cycle(txn, parent, child) {
                return Err(CategoryError::Cycle {
                    parent: parent.get(),
                    child: child.get(),
                });
            }
            txn.set_edge(OP, parent, child, Relation::Subcategory)?;
            Ok(())
        })
    }

    /// Remove a nesting link. Returns whether one existed.
    pub fn unlink_subcategory(&self, parent: NodeId, child: NodeId) -> CategoryResult<bool> {
        const OP: &str = "unlink_subcategory";
        self.graph.transact(|txn| {
            require_category(txn, OP, parent)?;
            require_category(txn, OP, child)?;
            if txn.relation(parent, child) != Some(Relation::Subcategory) {
                return Ok(false);
            }
            txn.remove_edge(parent, child);
            Ok(true)
        })
    }

    /// The category and every category below it, sorted by id.
    pub fn subtree(&self, category: NodeId) -> CategoryResult<Vec<NodeId>> {
        self.graph.read(|state| {
            require_category(state, "subtree", category)?;
            let mut ids: Vec<NodeId> = traverse::subtree(state, category).into_iter().collect();
            ids.sort();
            Ok(ids)
        })
    }

    /// Direct parents of a category.
    pub fn parents(&self, category: NodeId) -> CategoryResult<Vec<CategoryRef>> {
        self.graph.read(|state| {
            require_category(state, "parents", category)?;
            let ids: HashSet<NodeId> = traverse::parents(state, category).into_iter().collect();
            Ok(refs(state, ids))
        })
    }

    /// Categories that directly contain `item`.
    pub fn categories_of(&self, item: NodeId) -> CategoryResult<Vec<CategoryRef>> {
        self.graph.read(|state| {
            require_item(state, "categories_of", item)?;
            Ok(direct_categories(state, item))
        })
    }

    /// Every category with its counts, sorted by name then id.
    pub fn list(&self) -> Vec<CategorySummary> {
        self.graph.read(|state| {
            let mut all: Vec<CategorySummary> = state
                .categories()
                .into_iter()
                .map(|(id, c)| {
                    let out = state.outgoing(id);
                    CategorySummary {
                        id,
                        name: c.name.clone(),
                        remarks: c.remarks.clone(),
                        pinned: c.pinned,
                        members: out.iter().filter(|(_, r)| r.is_member()).count(),
                        subcategories: out
                            .iter()
                            .filter(|(_, r)| *r == Relation::Subcategory)
                            .count(),
                    }
                })
                .collect();
            all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            all
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers shared with search and the engine
// ---------------------------------------------------------------------------

/// Categories holding a direct membership of `item`, sorted by name.
pub(crate) fn direct_categories(state: &GraphState, item: NodeId) -> Vec<CategoryRef> {
    let ids: HashSet<NodeId> = state
        .incoming(item)
        .into_iter()
        .filter(|(_, r)| r.is_member())
        .map(|(c, _)| c)
        .collect();
    refs(state, ids)
}

fn refs(state: &GraphState, ids: HashSet<NodeId>) -> Vec<CategoryRef> {
    let mut out: Vec<CategoryRef> = ids
        .into_iter()
        .filter_map(|id| match state.node(id) {
            Some(Node::Category(c)) => Some(CategoryRef {
                id,
                name: c.name.clone(),
            }),
            _ => None,
        })
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    out
}

fn require_category<'s>(
    state: &'s GraphState,
    operation: &'static str,
    id: NodeId,
) -> CategoryResult<&'s Category> {
    state.category(operation, id).map_err(|e| match e {
        GraphError::NodeNotFound { .. } => CategoryError::NotFound {
            operation,
            id: id.get(),
        },
        other => other.into(),
    })
}

fn require_item(state: &GraphState, operation: &'static str, id: NodeId) -> CategoryResult<()> {
    state.content(operation, id).map(|_| ()).map_err(|e| match e {
        GraphError::NodeNotFound { .. } => CategoryError::ItemNotFound {
            operation,
            id: id.get(),
        },
        other => other.into(),
    })
}

fn member_position(
    state: &GraphState,
    operation: &'static str,
    category: NodeId,
    item: NodeId,
) -> CategoryResult<i64> {
    match state.relation(category, item) {
        Some(Relation::Member { position }) => Ok(position),
        _ => Err(CategoryError::NotMember {
            operation,
            category: category.get(),
            item: item.get(),
        }),
    }
}

/// Members sorted by position. A repeated position is a corrupted state.
fn ordered(state: &GraphState, category: NodeId) -> CategoryResult<Vec<PositionedItem>> {
    let mut members: Vec<PositionedItem> = state
        .outgoing(category)
        .into_iter()
        .filter_map(|(item, r)| match r {
            Relation::Member { position } => Some(PositionedItem { item, position }),
            _ => None,
        })
        .collect();
    members.sort_by_key(|m| (m.position, m.item));
    if let Some(pair) = members.windows(2).find(|w| w[0].position == w[1].position) {
        return Err(CategoryError::PositionConflict {
            category: category.get(),
            position: pair[0].position,
        });
    }
    Ok(members)
}

/// Insert or move `item` into `slot` of the category order.
fn place(
    txn: &mut GraphTxn<'_>,
    operation: &'static str,
    category: NodeId,
    item: NodeId,
    slot: Slot,
    step: i64,
) -> CategoryResult<i64> {
    require_category(txn, operation, category)?;
    require_item(txn, operation, item)?;

    let others: Vec<PositionedItem> = ordered(txn, category)?
        .into_iter()
        .filter(|m| m.item != item)
        .collect();

    let index = match slot {
        Slot::Top => 0,
        Slot::Bottom => others.len(),
        Slot::AfterNth(n) => n.min(others.len()),
        Slot::After(anchor) => {
            if anchor == item {
                return Err(CategoryError::SelfPlacement {
                    operation,
                    item: item.get(),
                });
            }
            let at = others.iter().position(|m| m.item == anchor).ok_or(
                CategoryError::NotMember {
                    operation,
                    category: category.get(),
                    item: anchor.get(),
                },
            )?;
            at + 1
        }
    };

    let before = index.checked_sub(1).and_then(|i| others.get(i)).map(|m| m.position);
    let after = others.get(index).map(|m| m.position);

    let position = match gap_position(before, after, step) {
        Some(position) => position,
        None => return renumber(txn, operation, category, item, &others, index, step),
    };
    txn.set_edge(operation, category, item, Relation::Member { position })?;
    Ok(position)
}

/// A free position between two neighbours, if one exists without renumbering.
fn gap_position(before: Option<i64>, after: Option<i64>, step: i64) -> Option<i64> {
    match (before, after) {
        (None, None) => Some(step),
        (None, Some(q)) => q.checked_sub(step),
        (Some(p), None) => p.checked_add(step),
        (Some(p), Some(q)) => {
            let gap = q.checked_sub(p)?;
            (gap >= 2).then(|| p + gap / 2)
        }
    }
}

/// Respace the whole category to multiples of `step`, with `item` at `index`.
fn renumber(
    txn: &mut GraphTxn<'_>,
    operation: &'static str,
    category: NodeId,
    item: NodeId,
    others: &[PositionedItem],
    index: usize,
    step: i64,
) -> CategoryResult<i64> {
    tracing::debug!(%category, members = others.len() + 1, "renumbering category positions");
    let overflow = || CategoryError::PositionOverflow {
        operation,
        category: category.get(),
    };

    let mut sequence: Vec<NodeId> = others.iter().map(|m| m.item).collect();
    sequence.insert(index, item);

    let mut placed = None;
    for (i, id) in sequence.into_iter().enumerate() {
        let rank = i64::try_from(i + 1).map_err(|_| overflow())?;
        let position = rank.checked_mul(step).ok_or_else(overflow)?;
        txn.set_edge(operation, category, id, Relation::Member { position })?;
        if id == item {
            placed = Some(position);
        }
    }
    placed.ok_or_else(overflow)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;
    use crate::graph::ContentNode;

    fn content(g: &ContentGraph, uri: &str) -> NodeId {
        g.transact(|txn| {
            txn.add_node(Node::Content(ContentNode {
                uri: uri.into(),
                class: "Document".into(),
                properties: BTreeMap::new(),
                created_at: 0,
                updated_at: 0,
            }))
        })
        .unwrap()
    }

    fn items(store: &CategoryStore<'_>, cat: NodeId) -> Vec<NodeId> {
        store
            .ordered_members(cat)
            .unwrap()
            .into_iter()
            .map(|m| m.item)
            .collect()
    }

    #[test]
    fn first_member_gets_step() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Travel", None).unwrap();
        let d1 = content(&g, "doc:1");
        assert_eq!(store.add_at_end(cat, d1).unwrap(), 10);
    }

    #[test]
    fn beginning_end_and_after() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Travel", None).unwrap();
        let [a, b, c, d] = ["a", "b", "c", "d"].map(|u| content(&g, u));

        assert_eq!(store.add_at_end(cat, a).unwrap(), 10);
        assert_eq!(store.add_at_end(cat, b).unwrap(), 20);
        assert_eq!(store.add_at_beginning(cat, c).unwrap(), 0);
        assert_eq!(store.add_after(cat, d, a).unwrap(), 15);
        assert_eq!(items(&store, cat), vec![c, a, d, b]);
    }

    #[test]
    fn concurrent_inserts_after_one_anchor_get_distinct_positions() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 4);
        let cat = store.create_category("Busy", None).unwrap();
        let head = content(&g, "doc:head");
        let tail = content(&g, "doc:tail");
        store.add_at_end(cat, head).unwrap();
        store.add_at_end(cat, tail).unwrap();

        let batches: Vec<Vec<NodeId>> = (0..4)
            .map(|t| (0..10).map(|i| content(&g, &format!("doc:{t}-{i}"))).collect())
            .collect();
        std::thread::scope(|s| {
            for batch in &batches {
                let store = &store;
                s.spawn(move || {
                    for &item in batch {
                        store.add_after(cat, item, head).unwrap();
                    }
                });
            }
        });

        let members = store.ordered_members(cat).unwrap();
        assert_eq!(members.len(), 42);
        assert!(members.windows(2).all(|w| w[0].position < w[1].position));
        assert_eq!(members[0].item, head);
        assert_eq!(members[41].item, tail);
        let placed: HashSet<NodeId> = members.iter().map(|m| m.item).collect();
        assert!(batches.iter().flatten().all(|item| placed.contains(item)));
    }

    #[test]
    fn add_after_last_appends_step() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Travel", None).unwrap();
        let d1 = content(&g, "doc:1");
        let d2 = content(&g, "doc:2");
        store.add_at_end(cat, d1).unwrap();
        assert_eq!(store.add_after(cat, d2, d1).unwrap(), 20);
    }

    #[test]
    fn re_adding_moves_instead_of_duplicating() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Travel", None).unwrap();
        let a = content(&g, "a");
        let b = content(&g, "b");
        store.add_at_end(cat, a).unwrap();
        store.add_at_end(cat, b).unwrap();
        store.add_at_end(cat, a).unwrap();
        assert_eq!(items(&store, cat), vec![b, a]);
    }

    #[test]
    fn gap_exhaustion_renumbers() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Dense", None).unwrap();
        let first = content(&g, "first");
        let last = content(&g, "last");
        store.add_at_end(cat, first).unwrap();
        store.add_at_end(cat, last).unwrap();

        // Always insert directly after `first`; the gap halves each time.
        let mut expected = vec![first];
        for i in 0..40 {
            let item = content(&g, &format!("mid:{i}"));
            store.add_after(cat, item, first).unwrap();
            expected.insert(1, item);
        }
        expected.push(last);

        let members = store.ordered_members(cat).unwrap();
        assert_eq!(members.iter().map(|m| m.item).collect::<Vec<_>>(), expected);
        assert!(members.windows(2).all(|w| w[0].position < w[1].position));
    }

    #[test]
    fn adjacent_positions_trigger_full_respacing() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Tight", None).unwrap();
        let [a, b, c] = ["a", "b", "c"].map(|u| content(&g, u));
        g.transact(|txn| -> Result<(), GraphError> {
            txn.set_edge("test", cat, a, Relation::Member { position: 5 })?;
            txn.set_edge("test", cat, b, Relation::Member { position: 6 })?;
            Ok(())
        })
        .unwrap();

        assert_eq!(store.add_after(cat, c, a).unwrap(), 20);
        let positions: Vec<_> = store
            .ordered_members(cat)
            .unwrap()
            .into_iter()
            .map(|m| (m.item, m.position))
            .collect();
        assert_eq!(positions, vec![(a, 10), (c, 20), (b, 30)]);
    }

    #[test]
    fn top_insert_near_minimum_renumbers() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Edge", None).unwrap();
        let a = content(&g, "a");
        let b = content(&g, "b");
        g.transact(|txn| txn.set_edge("test", cat, a, Relation::Member { position: i64::MIN + 3 }))
            .unwrap();
        assert_eq!(store.add_at_beginning(cat, b).unwrap(), 10);
        assert_eq!(items(&store, cat), vec![b, a]);
    }

    #[test]
    fn swap_exchanges_positions() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Travel", None).unwrap();
        let [a, b, c] = ["a", "b", "c"].map(|u| content(&g, u));
        for id in [a, b, c] {
            store.add_at_end(cat, id).unwrap();
        }
        store.swap(cat, a, c).unwrap();
        assert_eq!(items(&store, cat), vec![c, b, a]);
    }

    #[test]
    fn swap_with_non_member_fails_and_changes_nothing() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Travel", None).unwrap();
        let a = content(&g, "a");
        let outsider = content(&g, "outsider");
        store.add_at_end(cat, a).unwrap();
        assert!(matches!(
            store.swap(cat, a, outsider),
            Err(CategoryError::NotMember { operation: "swap", .. })
        ));
        assert_eq!(store.ordered_members(cat).unwrap()[0].position, 10);
    }

    #[test]
    fn reposition_after_nth_counts_without_the_item() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Travel", None).unwrap();
        let [a, b, c, d] = ["a", "b", "c", "d"].map(|u| content(&g, u));
        for id in [a, b, c, d] {
            store.add_at_end(cat, id).unwrap();
        }
        store.reposition_after_nth(cat, a, 2).unwrap();
        assert_eq!(items(&store, cat), vec![b, c, a, d]);
        store.reposition_after_nth(cat, d, 0).unwrap();
        assert_eq!(items(&store, cat), vec![d, b, c, a]);
        store.reposition_after_nth(cat, d, 99).unwrap();
        assert_eq!(items(&store, cat), vec![b, c, a, d]);
    }

    #[test]
    fn reposition_requires_membership() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Travel", None).unwrap();
        let a = content(&g, "a");
        assert!(matches!(
            store.reposition_after_nth(cat, a, 0),
            Err(CategoryError::NotMember { .. })
        ));
    }

    #[test]
    fn add_after_self_or_stranger_fails() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Travel", None).unwrap();
        let a = content(&g, "a");
        let b = content(&g, "b");
        store.add_at_end(cat, a).unwrap();
        assert!(matches!(
            store.add_after(cat, a, a),
            Err(CategoryError::SelfPlacement { .. })
        ));
        let stranger = content(&g, "stranger");
        assert!(matches!(
            store.add_after(cat, b, stranger),
            Err(CategoryError::NotMember { .. })
        ));
        // The failed call left no membership behind.
        assert_eq!(items(&store, cat), vec![a]);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Travel", None).unwrap();
        let a = content(&g, "a");
        let ghost = NodeId::new(4242).unwrap();
        assert!(matches!(
            store.add_at_end(ghost, a),
            Err(CategoryError::NotFound { id: 4242, .. })
        ));
        assert!(matches!(
            store.add_at_end(cat, ghost),
            Err(CategoryError::ItemNotFound { id: 4242, .. })
        ));
        // A category id used as an item is the wrong kind.
        assert!(matches!(
            store.add_at_end(cat, cat),
            Err(CategoryError::Graph(GraphError::WrongKind { .. }))
        ));
    }

    #[test]
    fn relocate_reports_partial_success() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let from = store.create_category("Inbox", None).unwrap();
        let to = store.create_category("Archive", None).unwrap();
        let [a, b, c, x] = ["a", "b", "c", "x"].map(|u| content(&g, u));
        for id in [a, b, c] {
            store.add_at_end(from, id).unwrap();
        }
        store.add_at_end(to, x).unwrap();

        let report = store
            .relocate_across_categories(&[a, x, c], from, to, Placement::End)
            .unwrap();
        assert_eq!(report.moved, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, x);
        assert_eq!(items(&store, from), vec![b]);
        assert_eq!(items(&store, to), vec![x, a, c]);
    }

    #[test]
    fn relocate_after_anchor_keeps_batch_order() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let from = store.create_category("Inbox", None).unwrap();
        let to = store.create_category("Archive", None).unwrap();
        let [a, b, x, y] = ["a", "b", "x", "y"].map(|u| content(&g, u));
        store.add_at_end(from, a).unwrap();
        store.add_at_end(from, b).unwrap();
        store.add_at_end(to, x).unwrap();
        store.add_at_end(to, y).unwrap();

        let report = store
            .relocate_across_categories(&[a, b], from, to, Placement::After(x))
            .unwrap();
        assert_eq!(report.moved, 2);
        assert_eq!(items(&store, to), vec![x, a, b, y]);
    }

    #[test]
    fn relocate_with_missing_category_is_an_error() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let from = store.create_category("Inbox", None).unwrap();
        let ghost = NodeId::new(777).unwrap();
        assert!(matches!(
            store.relocate_across_categories(&[], from, ghost, Placement::End),
            Err(CategoryError::NotFound { .. })
        ));
    }

    #[test]
    fn subcategory_cycles_are_rejected() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let [a, b, c] = ["A", "B", "C"].map(|n| store.create_category(n, None).unwrap());
        store.link_subcategory(a, b).unwrap();
        store.link_subcategory(b, c).unwrap();
        // Linking twice is harmless.
        store.link_subcategory(a, b).unwrap();

        assert!(matches!(
            store.link_subcategory(c, a),
            Err(CategoryError::Cycle { .. })
        ));
        assert!(matches!(
            store.link_subcategory(b, b),
            Err(CategoryError::SelfLink { .. })
        ));
        // Diamonds are fine.
        store.link_subcategory(a, c).unwrap();
        assert_eq!(store.subtree(a).unwrap(), vec![a, b, c]);
        assert_eq!(store.parents(c).unwrap().len(), 2);

        assert!(store.unlink_subcategory(b, c).unwrap());
        assert!(!store.unlink_subcategory(b, c).unwrap());
    }

    #[test]
    fn delete_category_keeps_content() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let cat = store.create_category("Travel", None).unwrap();
        let a = content(&g, "a");
        store.add_at_end(cat, a).unwrap();
        assert_eq!(store.categories_of(a).unwrap().len(), 1);

        let removed = store.delete_category(cat).unwrap();
        assert_eq!(removed.name, "Travel");
        assert!(g.read(|s| s.is_content(a)));
        assert!(store.categories_of(a).unwrap().is_empty());
    }

    #[test]
    fn list_counts_members() {
        let g = ContentGraph::new();
        let store = CategoryStore::new(&g, 10);
        let travel = store.create_category("Travel", Some("trips".into())).unwrap();
        let work = store.create_category("Work", None).unwrap();
        store.link_subcategory(travel, work).unwrap();
        store.set_pinned(work, true).unwrap();
        let a = content(&g, "a");
        store.add_at_end(travel, a).unwrap();

        let listing = store.list();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "Travel");
        assert_eq!(listing[0].members, 1);
        assert_eq!(listing[0].subcategories, 1);
        assert!(listing[1].pinned);
    }

    #[derive(Debug, Clone)]
    enum Op {
        End(usize),
        Begin(usize),
        After(usize, usize),
        Swap(usize, usize),
        Nth(usize, usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..8usize).prop_map(Op::End),
            (0..8usize).prop_map(Op::Begin),
            (0..8usize, 0..8usize).prop_map(|(a, b)| Op::After(a, b)),
            (0..8usize, 0..8usize).prop_map(|(a, b)| Op::Swap(a, b)),
            (0..8usize, 0..10usize).prop_map(|(a, n)| Op::Nth(a, n)),
        ]
    }

    proptest! {
        #[test]
        fn order_matches_model(ops in prop::collection::vec(op(), 1..60), step in 2i64..12) {
            let g = ContentGraph::new();
            let store = CategoryStore::new(&g, step);
            let cat = store.create_category("Model", None).unwrap();
            let pool: Vec<NodeId> = (0..8).map(|i| content(&g, &format!("item:{i}"))).collect();
            let mut model: Vec<NodeId> = Vec::new();

            for op in ops {
                match op {
                    Op::End(i) => {
                        store.add_at_end(cat, pool[i]).unwrap();
                        model.retain(|x| *x != pool[i]);
                        model.push(pool[i]);
                    }
                    Op::Begin(i) => {
                        store.add_at_beginning(cat, pool[i]).unwrap();
                        model.retain(|x| *x != pool[i]);
                        model.insert(0, pool[i]);
                    }
                    Op::After(i, j) => {
                        let (item, anchor) = (pool[i], pool[j]);
                        let ok = store.add_after(cat, item, anchor).is_ok();
                        let valid = item != anchor && model.contains(&anchor);
                        prop_assert_eq!(ok, valid);
                        if valid {
                            model.retain(|x| *x != item);
                            let at = model.iter().position(|x| *x == anchor).unwrap();
                            model.insert(at + 1, item);
                        }
                    }
                    Op::Swap(i, j) => {
                        let ok = store.swap(cat, pool[i], pool[j]).is_ok();
                        let pi = model.iter().position(|x| *x == pool[i]);
                        let pj = model.iter().position(|x| *x == pool[j]);
                        prop_assert_eq!(ok, pi.is_some() && pj.is_some());
                        if let (Some(pi), Some(pj)) = (pi, pj) {
                            model.swap(pi, pj);
                        }
                    }
                    Op::Nth(i, n) => {
                        let item = pool[i];
                        let ok = store.reposition_after_nth(cat, item, n).is_ok();
                        prop_assert_eq!(ok, model.contains(&item));
                        if ok {
                            model.retain(|x| *x != item);
                            let at = n.min(model.len());
                            model.insert(at, item);
                        }
                    }
                }

                let members = store.ordered_members(cat).unwrap();
                prop_assert!(members.windows(2).all(|w| w[0].position < w[1].position));
                let order: Vec<NodeId> = members.iter().map(|m| m.item).collect();
                prop_assert_eq!(&order, &model);
            }
        }
    }
}
