//! Graph-backed inverted index.
//!
//! Each indexed word is an [`IndexWord`] node; a content item is linked to
//! every word of its current text by a [`Relation::IndexedBy`] edge. The set
//! of words reachable from a content node always equals the last word set
//! written for it: updates apply the symmetric difference inside one graph
//! transaction.
//!
//! Policy for repeated or empty operations is tolerant: `new_indexing` on an
//! already indexed node behaves as `update_indexing`, and `remove_indexing`
//! on a node without entries reports zero removed edges.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::error::{GraphError, IndexError};
use crate::graph::traverse::subtree_members;
use crate::graph::{ContentGraph, GraphState, GraphTxn, IndexWord, Node, NodeId, Relation};

/// Result type for index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// Size of the change applied by an indexing write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexingOutcome {
    /// Edges created for newly present words.
    pub added: usize,
    /// Edges deleted for words no longer present.
    pub removed: usize,
    /// Words present before and after.
    pub kept: usize,
}

/// Index operations over a content graph.
#[derive(Debug, Clone, Copy)]
pub struct IndexStore<'g> {
    graph: &'g ContentGraph,
    collect_orphans: bool,
}

impl<'g> IndexStore<'g> {
    pub fn new(graph: &'g ContentGraph, collect_orphans: bool) -> Self {
        Self {
            graph,
            collect_orphans,
        }
    }

    /// Index a content node for the first time. Already indexed nodes are
    /// updated instead.
    pub fn new_indexing(&self, content: NodeId, words: &BTreeSet<String>) -> IndexResult<IndexingOutcome> {
        self.graph.transact(|txn| {
            require_content(txn, "new_indexing", content)?;
            if has_index(txn, content) {
                tracing::debug!(%content, "new_indexing on indexed content, updating instead");
            }
            apply_words(txn, "new_indexing", content, words, self.collect_orphans)
        })
    }

    /// Replace the node's indexed words with `words`.
    pub fn update_indexing(&self, content: NodeId, words: &BTreeSet<String>) -> IndexResult<IndexingOutcome> {
        self.graph.transact(|txn| {
            require_content(txn, "update_indexing", content)?;
            apply_words(txn, "update_indexing", content, words, self.collect_orphans)
        })
    }

    /// Delete every index edge of the node. Returns how many were removed.
    pub fn remove_indexing(&self, content: NodeId) -> IndexResult<usize> {
        self.graph.transact(|txn| {
            require_content(txn, "remove_indexing", content)?;
            clear_words(txn, "remove_indexing", content, self.collect_orphans)
        })
    }

    /// The words currently indexing the node.
    pub fn indexed_words(&self, content: NodeId) -> IndexResult<BTreeSet<String>> {
        self.graph.read(|state| {
            require_content(state, "indexed_words", content)?;
            Ok(current_words(state, content).into_keys().collect())
        })
    }

    /// Content nodes indexed by a word containing `word` as a substring.
    ///
    /// `restrict_to` limits the candidates (progressive AND-filtering);
    /// `category_scope` limits results to members of that category's subtree.
    pub fn search_word(
        &self,
        word: &str,
        restrict_to: Option<&HashSet<NodeId>>,
        category_scope: Option<NodeId>,
    ) -> IndexResult<HashSet<NodeId>> {
        self.graph.read(|state| {
            let scope = match category_scope {
                Some(cat) => Some(resolve_scope(state, "search_word", cat)?),
                None => None,
            };
            Ok(word_hits(state, word, restrict_to, scope.as_ref())
                .into_keys()
                .collect())
        })
    }
}

pub(crate) fn require_content(state: &GraphState, operation: &'static str, id: NodeId) -> IndexResult<()> {
    match state.content(operation, id) {
        Ok(_) => Ok(()),
        Err(GraphError::NodeNotFound { .. }) => Err(IndexError::ContentNotFound {
            operation,
            id: id.get(),
        }),
        Err(e) => Err(e.into()),
    }
}

fn has_index(state: &GraphState, content: NodeId) -> bool {
    state
        .outgoing(content)
        .iter()
        .any(|(_, r)| *r == Relation::IndexedBy)
}

/// Indexed words of a node, mapped to their word node ids.
fn current_words(state: &GraphState, content: NodeId) -> HashMap<String, NodeId> {
    state
        .outgoing(content)
        .into_iter()
        .filter(|(_, r)| *r == Relation::IndexedBy)
        .filter_map(|(w, _)| state.words().word(w).map(|s| (s.to_string(), w)))
        .collect()
}

fn normalize(word: &str) -> Option<String> {
    let w = word.trim().to_lowercase();
    (!w.is_empty()).then_some(w)
}

/// Make the node's word edges match `words` exactly.
pub(crate) fn apply_words(
    txn: &mut GraphTxn<'_>,
    operation: &'static str,
    content: NodeId,
    words: &BTreeSet<String>,
    collect_orphans: bool,
) -> IndexResult<IndexingOutcome> {
    let target: BTreeSet<String> = words.iter().filter_map(|w| normalize(w)).collect();
    let current = current_words(txn, content);

    let mut outcome = IndexingOutcome::default();

    for (word, word_id) in &current {
        if target.contains(word) {
            outcome.kept += 1;
            continue;
        }
        txn.remove_edge(content, *word_id);
        outcome.removed += 1;
        if collect_orphans && txn.incoming(*word_id).is_empty() {
            txn.remove_node(operation, *word_id)?;
        }
    }

    for word in target.iter().filter(|w| !current.contains_key(*w)) {
        let word_id = match txn.words().get(word) {
            Some(id) => id,
            None => txn.add_node(Node::Word(IndexWord { word: word.clone() }))?,
        };
        txn.set_edge(operation, content, word_id, Relation::IndexedBy)?;
        outcome.added += 1;
    }

    tracing::debug!(
        %content,
        added = outcome.added,
        removed = outcome.removed,
        kept = outcome.kept,
        "index updated"
    );
    Ok(outcome)
}

/// Drop all word edges of a node inside an open transaction.
pub(crate) fn clear_words(
    txn: &mut GraphTxn<'_>,
    operation: &'static str,
    content: NodeId,
    collect_orphans: bool,
) -> IndexResult<usize> {
    let removed = apply_words(txn, operation, content, &BTreeSet::new(), collect_orphans)?.removed;
    if removed == 0 {
        tracing::debug!(%content, "no index entries to remove");
    }
    Ok(removed)
}

/// Members of a category subtree, failing if the category does not exist.
pub(crate) fn resolve_scope(
    state: &GraphState,
    operation: &'static str,
    category: NodeId,
) -> IndexResult<HashSet<NodeId>> {
    match state.category(operation, category) {
        Ok(_) => Ok(subtree_members(state, category)),
        Err(GraphError::NodeNotFound { .. }) => Err(IndexError::CategoryNotFound {
            operation,
            id: category.get(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Content nodes matched by `fragment`, with the number of distinct index
/// words that matched for each.
pub(crate) fn word_hits(
    state: &GraphState,
    fragment: &str,
    restrict_to: Option<&HashSet<NodeId>>,
    scope: Option<&HashSet<NodeId>>,
) -> HashMap<NodeId, usize> {
    let mut hits: HashMap<NodeId, usize> = HashMap::new();
    let Some(fragment) = normalize(fragment) else {
        return hits;
    };
    for word_id in state.words().containing(&fragment) {
        for (content, relation) in state.incoming(word_id) {
            if relation != Relation::IndexedBy {
                continue;
            }
            if restrict_to.is_some_and(|r| !r.contains(&content)) {
                continue;
            }
            if scope.is_some_and(|s| !s.contains(&content)) {
                continue;
            }
            *hits.entry(content).or_insert(0) += 1;
        }
    }
    hits
}
