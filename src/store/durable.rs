//! ACID-durable graph snapshots backed by redb.
//!
//! A snapshot is written in a single write transaction: the node, edge and
//! meta tables are cleared and refilled, then committed together, so a crash
//! mid-persist leaves the previous snapshot intact.
//!
//! Nodes are encoded as JSON because content properties are free-form
//! `serde_json::Value`s; edges are plain data and use bincode.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition, TableError};

use crate::error::StoreError;
use crate::graph::{Edge, GraphSnapshot, Node, NodeId};
use crate::store::StoreResult;

/// Node id → JSON-encoded [`Node`].
const NODES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("nodes");
/// Sequence number → bincode-encoded [`Edge`].
const EDGES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("edges");
/// Scalar metadata such as the allocator high-water mark.
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ID_KEY: &str = "next_id";

/// File name of the database inside the data directory.
pub const DB_FILE: &str = "archivum.redb";

/// ACID-durable snapshot store using redb.
pub struct DurableStore {
    db: Arc<Database>,
}

fn redb_err(context: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Redb {
        message: format!("{context}: {e}"),
    }
}

impl DurableStore {
    /// Open or create a durable store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join(DB_FILE);
        let db = Database::create(&db_path)
            .map_err(|e| redb_err(&format!("failed to open redb at {}", db_path.display()), e))?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Replace the stored snapshot with `snapshot`.
    pub fn save_snapshot(&self, snapshot: &GraphSnapshot) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| redb_err("begin_write failed", e))?;
        {
            txn.delete_table(NODES_TABLE)
                .map_err(|e| redb_err("delete nodes table failed", e))?;
            txn.delete_table(EDGES_TABLE)
                .map_err(|e| redb_err("delete edges table failed", e))?;

            let mut nodes = txn
                .open_table(NODES_TABLE)
                .map_err(|e| redb_err("open nodes table failed", e))?;
            for (id, node) in &snapshot.nodes {
                let bytes = serde_json::to_vec(node).map_err(|e| StoreError::Serialization {
                    message: format!("encode node {id}: {e}"),
                })?;
                nodes
                    .insert(id.get(), bytes.as_slice())
                    .map_err(|e| redb_err("insert node failed", e))?;
            }

            let mut edges = txn
                .open_table(EDGES_TABLE)
                .map_err(|e| redb_err("open edges table failed", e))?;
            for (seq, edge) in snapshot.edges.iter().enumerate() {
                let bytes = bincode::serialize(edge).map_err(|e| StoreError::Serialization {
                    message: format!("encode edge {} -> {}: {e}", edge.from, edge.to),
                })?;
                edges
                    .insert(seq as u64, bytes.as_slice())
                    .map_err(|e| redb_err("insert edge failed", e))?;
            }

            let mut meta = txn
                .open_table(META_TABLE)
                .map_err(|e| redb_err("open meta table failed", e))?;
            meta.insert(NEXT_ID_KEY, snapshot.next_id)
                .map_err(|e| redb_err("insert meta failed", e))?;
        }
        txn.commit().map_err(|e| redb_err("commit failed", e))?;
        tracing::debug!(
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "snapshot written"
        );
        Ok(())
    }

    /// Load the stored snapshot. A fresh database yields an empty snapshot.
    pub fn load_snapshot(&self) -> StoreResult<GraphSnapshot> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| redb_err("begin_read failed", e))?;

        let mut snapshot = GraphSnapshot::default();

        match txn.open_table(META_TABLE) {
            Ok(meta) => {
                if let Some(v) = meta
                    .get(NEXT_ID_KEY)
                    .map_err(|e| redb_err("read meta failed", e))?
                {
                    snapshot.next_id = v.value();
                }
            }
            Err(TableError::TableDoesNotExist(_)) => return Ok(snapshot),
            Err(e) => return Err(redb_err("open meta table failed", e)),
        }

        match txn.open_table(NODES_TABLE) {
            Ok(nodes) => {
                for entry in nodes.iter().map_err(|e| redb_err("scan nodes failed", e))? {
                    let (key, value) = entry.map_err(|e| redb_err("read node failed", e))?;
                    let raw = key.value();
                    let id = NodeId::new(raw).ok_or_else(|| StoreError::Serialization {
                        message: "node stored under id 0".into(),
                    })?;
                    let node: Node = serde_json::from_slice(value.value()).map_err(|e| {
                        StoreError::Serialization {
                            message: format!("decode node {raw}: {e}"),
                        }
                    })?;
                    snapshot.nodes.push((id, node));
                }
            }
            Err(TableError::TableDoesNotExist(_)) => {}
            Err(e) => return Err(redb_err("open nodes table failed", e)),
        }

        match txn.open_table(EDGES_TABLE) {
            Ok(edges) => {
                for entry in edges.iter().map_err(|e| redb_err("scan edges failed", e))? {
                    let (key, value) = entry.map_err(|e| redb_err("read edge failed", e))?;
                    let edge: Edge = bincode::deserialize(value.value()).map_err(|e| {
                        StoreError::Serialization {
                            message: format!("decode edge #{}: {e}", key.value()),
                        }
                    })?;
                    snapshot.edges.push(edge);
                }
            }
            Err(TableError::TableDoesNotExist(_)) => {}
            Err(e) => return Err(redb_err("open edges table failed", e)),
        }

        Ok(snapshot)
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore").finish()
    }
}
