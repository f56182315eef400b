//! In-memory content graph with transactional mutation.
//!
//! Uses `petgraph` for the edge structure; node payloads, the uri index and
//! the word table live beside it under the same lock. Every mutation runs in
//! [`ContentGraph::transact`], which holds the write lock for the whole
//! read-compute-write and records an undo log: if the closure returns `Err`,
//! every applied step is reverted before the lock is released.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::error::GraphError;

use super::words::WordTable;
use super::{Category, ContentNode, Edge, GraphSnapshot, Node, NodeId, Relation};

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// The lock-protected graph contents. Read access is handed out through
/// [`ContentGraph::read`] and, inside transactions, through `Deref`.
#[derive(Debug, Default)]
pub struct GraphState {
    graph: StableDiGraph<NodeId, Relation>,
    nodes: HashMap<NodeId, (NodeIndex, Node)>,
    uris: HashMap<String, NodeId>,
    words: WordTable,
}

impl GraphState {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id).map(|(_, n)| n)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Look up a node, failing with `NodeNotFound`.
    pub fn require(&self, operation: &'static str, id: NodeId) -> GraphResult<&Node> {
        self.node(id).ok_or(GraphError::NodeNotFound {
            operation,
            id: id.get(),
        })
    }

    pub fn content(&self, operation: &'static str, id: NodeId) -> GraphResult<&ContentNode> {
        match self.require(operation, id)? {
            Node::Content(c) => Ok(c),
            other => Err(wrong_kind(operation, id, "content", other)),
        }
    }

    pub fn category(&self, operation: &'static str, id: NodeId) -> GraphResult<&Category> {
        match self.require(operation, id)? {
            Node::Category(c) => Ok(c),
            other => Err(wrong_kind(operation, id, "category", other)),
        }
    }

    pub fn is_content(&self, id: NodeId) -> bool {
        matches!(self.node(id), Some(Node::Content(_)))
    }

    pub fn is_category(&self, id: NodeId) -> bool {
        matches!(self.node(id), Some(Node::Category(_)))
    }

    pub fn content_by_uri(&self, uri: &str) -> Option<NodeId> {
        self.uris.get(uri).copied()
    }

    pub fn words(&self) -> &WordTable {
        &self.words
    }

    /// Outgoing edges of `id` as `(target, relation)`.
    pub fn outgoing(&self, id: NodeId) -> Vec<(NodeId, Relation)> {
        self.edges(id, Direction::Outgoing)
    }

    /// Incoming edges of `id` as `(source, relation)`.
    pub fn incoming(&self, id: NodeId) -> Vec<(NodeId, Relation)> {
        self.edges(id, Direction::Incoming)
    }

    fn edges(&self, id: NodeId, direction: Direction) -> Vec<(NodeId, Relation)> {
        let Some((idx, _)) = self.nodes.get(&id) else {
            return vec![];
        };
        self.graph
            .edges_directed(*idx, direction)
            .filter_map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                self.graph.node_weight(other).map(|n| (*n, *e.weight()))
            })
            .collect()
    }

    /// The relation on the edge `from → to`, if any.
    pub fn relation(&self, from: NodeId, to: NodeId) -> Option<Relation> {
        let (a, _) = self.nodes.get(&from)?;
        let (b, _) = self.nodes.get(&to)?;
        let edge = self.graph.find_edge(*a, *b)?;
        self.graph.edge_weight(edge).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All nodes, in identifier order.
    pub fn nodes(&self) -> Vec<(NodeId, &Node)> {
        let mut all: Vec<_> = self.nodes.iter().map(|(id, (_, n))| (*id, n)).collect();
        all.sort_by_key(|(id, _)| *id);
        all
    }

    pub fn categories(&self) -> Vec<(NodeId, &Category)> {
        self.nodes()
            .into_iter()
            .filter_map(|(id, n)| match n {
                Node::Category(c) => Some((id, c)),
                _ => None,
            })
            .collect()
    }

    pub fn content_items(&self) -> Vec<(NodeId, &ContentNode)> {
        self.nodes()
            .into_iter()
            .filter_map(|(id, n)| match n {
                Node::Content(c) => Some((id, c)),
                _ => None,
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Raw mutators: no undo logging. Used by transactions and rollback.
    // -----------------------------------------------------------------------

    fn raw_insert_node(&mut self, id: NodeId, node: Node) -> GraphResult<()> {
        match &node {
            Node::Content(c) => {
                if self.uris.contains_key(&c.uri) {
                    return Err(GraphError::DuplicateUri { uri: c.uri.clone() });
                }
                self.uris.insert(c.uri.clone(), id);
            }
            Node::Word(w) => {
                if !self.words.insert(&w.word, id) {
                    return Err(GraphError::DuplicateWord {
                        word: w.word.clone(),
                    });
                }
            }
            Node::Category(_) => {}
        }
        let idx = self.graph.add_node(id);
        self.nodes.insert(id, (idx, node));
        Ok(())
    }

    fn raw_remove_node(&mut self, id: NodeId) -> Option<Node> {
        let (idx, node) = self.nodes.remove(&id)?;
        self.graph.remove_node(idx);
        match &node {
            Node::Content(c) => {
                self.uris.remove(&c.uri);
            }
            Node::Word(w) => {
                self.words.remove(&w.word);
            }
            Node::Category(_) => {}
        }
        Some(node)
    }

    fn raw_replace_node(&mut self, id: NodeId, node: Node) -> Option<Node> {
        let slot = self.nodes.get_mut(&id)?;
        let old = std::mem::replace(&mut slot.1, node);
        let new_uri = match &slot.1 {
            Node::Content(c) => Some(c.uri.clone()),
            _ => None,
        };
        if let (Node::Content(before), Some(uri)) = (&old, new_uri) {
            if before.uri != uri {
                self.uris.remove(&before.uri);
                self.uris.insert(uri, id);
            }
        }
        Some(old)
    }

    fn raw_set_edge(&mut self, from: NodeId, to: NodeId, relation: Relation) -> Option<Relation> {
        let (a, b) = match (self.nodes.get(&from), self.nodes.get(&to)) {
            (Some((a, _)), Some((b, _))) => (*a, *b),
            _ => return None,
        };
        match self.graph.find_edge(a, b) {
            Some(edge) => self
                .graph
                .edge_weight_mut(edge)
                .map(|w| std::mem::replace(w, relation)),
            None => {
                self.graph.add_edge(a, b, relation);
                None
            }
        }
    }

    fn raw_remove_edge(&mut self, from: NodeId, to: NodeId) -> Option<Relation> {
        let (a, _) = self.nodes.get(&from)?;
        let (b, _) = self.nodes.get(&to)?;
        let edge = self.graph.find_edge(*a, *b)?;
        self.graph.remove_edge(edge)
    }
}

fn wrong_kind(operation: &'static str, id: NodeId, expected: &'static str, actual: &Node) -> GraphError {
    GraphError::WrongKind {
        operation,
        id: id.get(),
        expected,
        actual: actual.kind(),
    }
}

/// One reversible step recorded by a transaction.
#[derive(Debug)]
enum Undo {
    Inserted(NodeId),
    Removed(NodeId, Node),
    Replaced(NodeId, Node),
    EdgeSet {
        from: NodeId,
        to: NodeId,
        previous: Option<Relation>,
    },
    EdgeRemoved {
        from: NodeId,
        to: NodeId,
        relation: Relation,
    },
}

/// A write transaction over the graph. Reads see the transaction's own writes.
pub struct GraphTxn<'a> {
    state: &'a mut GraphState,
    next_id: &'a AtomicU64,
    undo: Vec<Undo>,
}

impl std::ops::Deref for GraphTxn<'_> {
    type Target = GraphState;

    fn deref(&self) -> &GraphState {
        self.state
    }
}

impl GraphTxn<'_> {
    /// Insert a new node, allocating its identifier.
    pub fn add_node(&mut self, node: Node) -> GraphResult<NodeId> {
        let id = allocate(self.next_id)?;
        self.state.raw_insert_node(id, node)?;
        self.undo.push(Undo::Inserted(id));
        Ok(id)
    }

    /// Replace a node payload, returning the previous one.
    pub fn replace_node(&mut self, operation: &'static str, id: NodeId, node: Node) -> GraphResult<Node> {
        let old = self
            .state
            .raw_replace_node(id, node)
            .ok_or(GraphError::NodeNotFound {
                operation,
                id: id.get(),
            })?;
        self.undo.push(Undo::Replaced(id, old.clone()));
        Ok(old)
    }

    /// Remove a node together with every incident edge.
    pub fn remove_node(&mut self, operation: &'static str, id: NodeId) -> GraphResult<Node> {
        self.require(operation, id)?;
        for (to, _) in self.outgoing(id) {
            self.remove_edge(id, to);
        }
        for (from, _) in self.incoming(id) {
            self.remove_edge(from, id);
        }
        let node = self
            .state
            .raw_remove_node(id)
            .ok_or(GraphError::NodeNotFound {
                operation,
                id: id.get(),
            })?;
        self.undo.push(Undo::Removed(id, node.clone()));
        Ok(node)
    }

    /// Create or overwrite the edge `from → to`. Returns the previous relation.
    pub fn set_edge(
        &mut self,
        operation: &'static str,
        from: NodeId,
        to: NodeId,
        relation: Relation,
    ) -> GraphResult<Option<Relation>> {
        self.require(operation, from)?;
        self.require(operation, to)?;
        let previous = self.state.raw_set_edge(from, to, relation);
        self.undo.push(Undo::EdgeSet { from, to, previous });
        Ok(previous)
    }

    /// Delete the edge `from → to`, returning its relation if it existed.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> Option<Relation> {
        let relation = self.state.raw_remove_edge(from, to)?;
        self.undo.push(Undo::EdgeRemoved { from, to, relation });
        Some(relation)
    }

    /// Remove every edge of the given kind leaving `from`. Returns the targets.
    pub fn remove_outgoing(&mut self, from: NodeId, kind: Relation) -> Vec<NodeId> {
        let targets: Vec<NodeId> = self
            .outgoing(from)
            .into_iter()
            .filter(|(_, r)| r.same_kind(&kind))
            .map(|(to, _)| to)
            .collect();
        for to in &targets {
            self.remove_edge(from, *to);
        }
        targets
    }

    fn rollback(self) {
        let GraphTxn { state, undo, .. } = self;
        for step in undo.into_iter().rev() {
            match step {
                Undo::Inserted(id) => {
                    state.raw_remove_node(id);
                }
                Undo::Removed(id, node) => {
                    if let Err(e) = state.raw_insert_node(id, node) {
                        tracing::error!(%id, error = %e, "rollback could not restore node");
                    }
                }
                Undo::Replaced(id, node) => {
                    state.raw_replace_node(id, node);
                }
                Undo::EdgeSet { from, to, previous } => match previous {
                    Some(r) => {
                        state.raw_set_edge(from, to, r);
                    }
                    None => {
                        state.raw_remove_edge(from, to);
                    }
                },
                Undo::EdgeRemoved { from, to, relation } => {
                    state.raw_set_edge(from, to, relation);
                }
            }
        }
    }
}

fn allocate(next_id: &AtomicU64) -> GraphResult<NodeId> {
    let raw = next_id
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1))
        .map_err(|_| GraphError::IdsExhausted)?;
    NodeId::new(raw).ok_or(GraphError::IdsExhausted)
}

/// Thread-safe content graph.
pub struct ContentGraph {
    state: RwLock<GraphState>,
    next_id: AtomicU64,
}

impl ContentGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Rebuild a graph from a persisted snapshot.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> GraphResult<Self> {
        let mut state = GraphState::default();
        let mut max_id = 0u64;
        for (id, node) in snapshot.nodes {
            max_id = max_id.max(id.get());
            state.raw_insert_node(id, node)?;
        }
        for edge in snapshot.edges {
            if !state.contains(edge.from) || !state.contains(edge.to) {
                return Err(GraphError::CorruptSnapshot {
                    message: format!("edge {} -> {} has a missing endpoint", edge.from, edge.to),
                });
            }
            state.raw_set_edge(edge.from, edge.to, edge.relation);
        }
        let next = snapshot.next_id.max(max_id.saturating_add(1)).max(1);
        Ok(Self {
            state: RwLock::new(state),
            next_id: AtomicU64::new(next),
        })
    }

    /// Copy the full graph for persistence.
    pub fn snapshot(&self) -> GraphSnapshot {
        let state = self.state.read().expect("graph lock poisoned");
        let nodes = state
            .nodes()
            .into_iter()
            .map(|(id, n)| (id, n.clone()))
            .collect();
        let edges = state
            .graph
            .edge_references()
            .filter_map(|e| {
                let from = *state.graph.node_weight(e.source())?;
                let to = *state.graph.node_weight(e.target())?;
                Some(Edge {
                    from,
                    to,
                    relation: *e.weight(),
                })
            })
            .collect();
        GraphSnapshot {
            next_id: self.next_id.load(Ordering::SeqCst),
            nodes,
            edges,
        }
    }

    /// Run a read-only closure against a consistent view.
    pub fn read<T>(&self, f: impl FnOnce(&GraphState) -> T) -> T {
        let state = self.state.read().expect("graph lock poisoned");
        f(&state)
    }

    /// Run a closure as one atomic unit. On `Err` all of its writes are undone.
    pub fn transact<T, E>(&self, f: impl FnOnce(&mut GraphTxn<'_>) -> Result<T, E>) -> Result<T, E> {
        let mut state = self.state.write().expect("graph lock poisoned");
        let mut txn = GraphTxn {
            state: &mut *state,
            next_id: &self.next_id,
            undo: Vec::new(),
        };
        match f(&mut txn) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::debug!(steps = txn.undo.len(), "rolling back graph transaction");
                txn.rollback();
                Err(e)
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.read(|s| s.node_count())
    }

    pub fn edge_count(&self) -> usize {
        self.read(|s| s.edge_count())
    }
}

impl Default for ContentGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContentGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
