//! Content graph: the property graph every other subsystem is stored in.
//!
//! Three node kinds share one identifier space:
//!
//! - [`ContentNode`]: an addressable item (document, note, image, record)
//! - [`IndexWord`]: one normalized word form of the inverted index
//! - [`Category`]: a named, ordered collection of content items
//!
//! Edges carry a [`Relation`]. The in-memory structure lives in
//! [`index::ContentGraph`]; all mutation goes through its transactions.

pub mod index;
pub mod traverse;
pub mod words;

use std::collections::BTreeMap;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

pub use index::{ContentGraph, GraphState, GraphTxn};

/// Unique, niche-optimized identifier for a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(NonZeroU64);

impl NodeId {
    /// Create a `NodeId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(NodeId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One addressable content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Globally unique, immutable identifier.
    pub uri: String,
    /// Class tag (`Document`, `Note`, `Image`, `Record`, ...).
    pub class: String,
    /// Type-specific properties (e.g. `basename`, `suffix`, `title`).
    pub properties: BTreeMap<String, serde_json::Value>,
    /// Seconds since UNIX epoch.
    pub created_at: u64,
    /// Seconds since UNIX epoch.
    pub updated_at: u64,
}

/// A normalized word in the inverted index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexWord {
    pub word: String,
}

/// A named collection of content items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub remarks: Option<String>,
    pub pinned: bool,
}

/// Payload of a graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Content(ContentNode),
    Word(IndexWord),
    Category(Category),
}

impl Node {
    /// Short kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Content(_) => "content",
            Self::Word(_) => "word",
            Self::Category(_) => "category",
        }
    }
}

/// Relationship carried on an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// ContentNode → IndexWord.
    IndexedBy,
    /// Category → ContentNode, with a sparse ordering key.
    Member { position: i64 },
    /// Parent Category → child Category.
    Subcategory,
}

impl Relation {
    pub fn is_member(&self) -> bool {
        matches!(self, Self::Member { .. })
    }

    /// Kind filter key; positions are ignored.
    fn same_kind(&self, other: &Relation) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A directed edge as stored in snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub relation: Relation,
}

/// Full serializable copy of the graph.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    /// Next identifier the allocator would hand out.
    pub next_id: u64,
    pub nodes: Vec<(NodeId, Node)>,
    pub edges: Vec<Edge>,
}

/// Current time in seconds since UNIX epoch.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
