//! Engine facade: top-level API for the archivum backend.
//!
//! The `Engine` owns the content graph, its durable store, the shared word
//! filter, the content-class registry and the search ranker, and exposes
//! content CRUD, indexing, search and category positioning as plain
//! serializable data.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::category::{
    CategoryRef, CategoryStore, CategorySummary, Placement, PositionedItem, RelocateReport,
};
use crate::config::EngineConfig;
use crate::error::{ArchivumResult, EngineError, IndexError};
use crate::graph::{Category, ContentGraph, ContentNode, Node, NodeId, now_secs};
use crate::index::IndexStore;
use crate::ingest::{ClassRegistry, ContentClass, IndexOutcome, IndexingEngine};
use crate::search::{HitCountRanker, Ranker, SearchEngine, SearchResults};
use crate::store::DurableStore;
use crate::text::{ContentSource, WordFilter};

/// Request to create a content item.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub class: String,
    /// Generated as `{class}:{uuid}` when absent.
    pub uri: Option<String>,
    pub properties: BTreeMap<String, serde_json::Value>,
    pub source: Option<ContentSource>,
}

impl NewContent {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            uri: None,
            properties: BTreeMap::new(),
            source: None,
        }
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn source(mut self, source: ContentSource) -> Self {
        self.source = Some(source);
        self
    }
}

/// A freshly created content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedContent {
    pub id: NodeId,
    pub uri: String,
    pub indexing: IndexOutcome,
}

/// The archivum knowledge-base engine.
pub struct Engine {
    config: EngineConfig,
    graph: ContentGraph,
    store: Option<DurableStore>,
    filter: WordFilter,
    classes: ClassRegistry,
    ranker: Box<dyn Ranker>,
}

impl Engine {
    /// Create an engine, reloading the persisted graph when `data_dir` is set.
    pub fn new(config: EngineConfig) -> ArchivumResult<Self> {
        config.validate()?;

        let (graph, store) = match config.data_dir {
            Some(ref dir) => {
                std::fs::create_dir_all(dir).map_err(|_| EngineError::DataDir {
                    path: dir.display().to_string(),
                })?;
                let store = DurableStore::open(dir)?;
                let graph = ContentGraph::from_snapshot(store.load_snapshot()?)?;
                (graph, Some(store))
            }
            None => (ContentGraph::new(), None),
        };

        tracing::info!(
            data_dir = ?config.data_dir,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            position_step = config.position_step,
            "initializing archivum engine"
        );

        Ok(Self {
            filter: WordFilter::new(&config.filter),
            config,
            graph,
            store,
            classes: ClassRegistry::with_builtins(),
            ranker: Box::new(HitCountRanker),
        })
    }

    /// Replace the search ranker.
    pub fn with_ranker(mut self, ranker: Box<dyn Ranker>) -> Self {
        self.ranker = ranker;
        self
    }

    /// Add or replace a content class handler.
    pub fn register_class(&mut self, class: Box<dyn ContentClass>) {
        self.classes.register(class);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &ContentGraph {
        &self.graph
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn filter(&self) -> &WordFilter {
        &self.filter
    }

    pub fn index(&self) -> IndexStore<'_> {
        IndexStore::new(&self.graph, self.config.collect_orphan_words)
    }

    pub fn indexer(&self) -> IndexingEngine<'_> {
        IndexingEngine::new(&self.graph, &self.filter, self.config.collect_orphan_words)
    }

    pub fn categories(&self) -> CategoryStore<'_> {
        CategoryStore::new(&self.graph, self.config.position_step)
    }

    fn searcher(&self) -> SearchEngine<'_> {
        SearchEngine::new(&self.graph, &self.filter, self.ranker.as_ref())
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    /// Create a content item. Text is extracted first; the node and its
    /// index entries are then written in one transaction, so a failed create
    /// leaves nothing behind.
    pub fn create_content(&self, new: NewContent) -> ArchivumResult<CreatedContent> {
        const OP: &str = "create_content";
        let handler = self.classes.get(&new.class);
        let indexer = self.indexer();
        let now = now_secs();
        let uri = new
            .uri
            .unwrap_or_else(|| format!("{}:{}", new.class, Uuid::new_v4()));
        let mut node = ContentNode {
            uri,
            class: new.class,
            properties: new.properties,
            created_at: now,
            updated_at: now,
        };
        handler.before_update(&mut node, new.source.as_ref());
        let uri = node.uri.clone();

        let plan = handler.on_create(&indexer, new.source.as_ref())?;
        let (id, indexing) = self.graph.transact(|txn| -> ArchivumResult<_> {
            let id = txn.add_node(Node::Content(node))?;
            let indexing = indexer.apply(txn, OP, id, plan)?;
            Ok((id, indexing))
        })?;

        tracing::info!(%id, %uri, "created content");
        Ok(CreatedContent { id, uri, indexing })
    }

    /// Merge `properties` into the item (a `null` value removes the key) and,
    /// when `source` is given, reindex it. The merge and the index write
    /// commit together.
    pub fn update_content(
        &self,
        id: NodeId,
        properties: BTreeMap<String, serde_json::Value>,
        source: Option<ContentSource>,
    ) -> ArchivumResult<IndexOutcome> {
        const OP: &str = "update_content";
        let class = self.content(id)?.class;
        let handler = self.classes.get(&class);
        let indexer = self.indexer();
        let plan = handler.on_update(&indexer, source.as_ref())?;

        self.graph.transact(|txn| -> ArchivumResult<IndexOutcome> {
            let mut node = txn.content(OP, id)?.clone();
            for (key, value) in properties {
                if value.is_null() {
                    node.properties.remove(&key);
                } else {
                    node.properties.insert(key, value);
                }
            }
            handler.before_update(&mut node, source.as_ref());
            node.updated_at = now_secs();
            txn.replace_node(OP, id, Node::Content(node))?;
            Ok(indexer.apply(txn, OP, id, plan)?)
        })
    }

    /// Index (or reindex) an item from `source` using `class_name`'s hooks.
    pub fn index_content(
        &self,
        id: NodeId,
        class_name: &str,
        source: &ContentSource,
    ) -> ArchivumResult<IndexOutcome> {
        const OP: &str = "index_content";
        self.graph
            .read(|state| crate::index::require_content(state, OP, id))?;
        let indexer = self.indexer();
        let plan = self.classes.get(class_name).on_update(&indexer, Some(source))?;
        Ok(self.graph.transact(|txn| indexer.apply(txn, OP, id, plan))?)
    }

    /// Delete an item. Its index entries, the node and its memberships are
    /// removed in one transaction.
    pub fn delete_content(&self, id: NodeId) -> ArchivumResult<ContentNode> {
        const OP: &str = "delete_content";
        let class = self.content(id)?.class;
        let handler = self.classes.get(&class);
        let indexer = self.indexer();

        let (node, dropped) = self.graph.transact(|txn| -> ArchivumResult<_> {
            let node = txn.content(OP, id)?.clone();
            let dropped = handler.on_delete(&indexer, txn, id)?;
            txn.remove_node(OP, id)?;
            Ok((node, dropped))
        })?;
        tracing::info!(%id, index_entries = dropped, "deleted content");
        Ok(node)
    }

    /// A copy of the content node.
    pub fn content(&self, id: NodeId) -> ArchivumResult<ContentNode> {
        self.graph.read(|state| match state.content("content", id) {
            Ok(c) => Ok(c.clone()),
            Err(crate::error::GraphError::NodeNotFound { .. }) => Err(IndexError::ContentNotFound {
                operation: "content",
                id: id.get(),
            }
            .into()),
            Err(e) => Err(e.into()),
        })
    }

    /// Identifier of the item with `uri`.
    pub fn content_id(&self, uri: &str) -> ArchivumResult<NodeId> {
        self.graph
            .read(|state| state.content_by_uri(uri))
            .ok_or_else(|| EngineError::UnknownContent { uri: uri.to_string() }.into())
    }

    /// Every content item as `(id, uri, class)`, in id order.
    pub fn list_content(&self) -> Vec<(NodeId, String, String)> {
        self.graph.read(|state| {
            state
                .content_items()
                .into_iter()
                .map(|(id, c)| (id, c.uri.clone(), c.class.clone()))
                .collect()
        })
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    pub fn search(&self, query: &str, category_scope: Option<NodeId>) -> ArchivumResult<SearchResults> {
        Ok(self.searcher().search(query, category_scope)?)
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    /// Resolve a category by numeric id or by (case-insensitive) name.
    pub fn resolve_category(&self, name_or_id: &str) -> ArchivumResult<NodeId> {
        self.graph.read(|state| {
            if let Some(id) = name_or_id.parse::<u64>().ok().and_then(NodeId::new) {
                if state.is_category(id) {
                    return Ok(id);
                }
            }
            let matches: Vec<NodeId> = state
                .categories()
                .into_iter()
                .filter(|(_, c)| c.name.eq_ignore_ascii_case(name_or_id))
                .map(|(id, _)| id)
                .collect();
            match matches.as_slice() {
                [id] => Ok(*id),
                [] => Err(EngineError::UnknownCategory {
                    name: name_or_id.to_string(),
                }
                .into()),
                many => Err(EngineError::AmbiguousCategory {
                    name: name_or_id.to_string(),
                    count: many.len(),
                }
                .into()),
            }
        })
    }

    pub fn create_category(&self, name: &str, remarks: Option<String>) -> ArchivumResult<NodeId> {
        Ok(self.categories().create_category(name, remarks)?)
    }

    pub fn delete_category(&self, category: NodeId) -> ArchivumResult<Category> {
        Ok(self.categories().delete_category(category)?)
    }

    pub fn set_pinned(&self, category: NodeId, pinned: bool) -> ArchivumResult<()> {
        Ok(self.categories().set_pinned(category, pinned)?)
    }

    pub fn link_subcategory(&self, parent: NodeId, child: NodeId) -> ArchivumResult<()> {
        Ok(self.categories().link_subcategory(parent, child)?)
    }

    pub fn unlink_subcategory(&self, parent: NodeId, child: NodeId) -> ArchivumResult<bool> {
        Ok(self.categories().unlink_subcategory(parent, child)?)
    }

    pub fn categories_of(&self, item: NodeId) -> ArchivumResult<Vec<CategoryRef>> {
        Ok(self.categories().categories_of(item)?)
    }

    pub fn list_categories(&self) -> Vec<CategorySummary> {
        self.categories().list()
    }

    pub fn ordered_members(&self, category: NodeId) -> ArchivumResult<Vec<PositionedItem>> {
        Ok(self.categories().ordered_members(category)?)
    }

    pub fn add_at_beginning(&self, category: NodeId, item: NodeId) -> ArchivumResult<i64> {
        Ok(self.categories().add_at_beginning(category, item)?)
    }

    pub fn add_at_end(&self, category: NodeId, item: NodeId) -> ArchivumResult<i64> {
        Ok(self.categories().add_at_end(category, item)?)
    }

    pub fn add_after(&self, category: NodeId, item: NodeId, after_item: NodeId) -> ArchivumResult<i64> {
        Ok(self.categories().add_after(category, item, after_item)?)
    }

    pub fn swap(&self, category: NodeId, a: NodeId, b: NodeId) -> ArchivumResult<()> {
        Ok(self.categories().swap(category, a, b)?)
    }

    pub fn reposition_after_nth(&self, category: NodeId, item: NodeId, n: usize) -> ArchivumResult<i64> {
        Ok(self.categories().reposition_after_nth(category, item, n)?)
    }

    pub fn relocate_across_categories(
        &self,
        items: &[NodeId],
        from: NodeId,
        to: NodeId,
        placement: Placement,
    ) -> ArchivumResult<RelocateReport> {
        Ok(self
            .categories()
            .relocate_across_categories(items, from, to, placement)?)
    }

    // -----------------------------------------------------------------------
    // Persistence and info
    // -----------------------------------------------------------------------

    /// Write the graph to the durable store. No-op in memory-only mode.
    pub fn persist(&self) -> ArchivumResult<()> {
        if let Some(ref store) = self.store {
            let snapshot = self.graph.snapshot();
            store.save_snapshot(&snapshot)?;
            tracing::info!(
                nodes = snapshot.nodes.len(),
                edges = snapshot.edges.len(),
                "persisted content graph"
            );
        }
        Ok(())
    }

    pub fn info(&self) -> EngineInfo {
        self.graph.read(|state| EngineInfo {
            content_count: state.content_items().len(),
            word_count: state.words().len(),
            category_count: state.categories().len(),
            edge_count: state.edge_count(),
            classes: self
                .classes
                .folders()
                .into_iter()
                .map(|(name, folder)| ClassInfo {
                    name: name.to_string(),
                    folder: folder.to_string(),
                })
                .collect(),
            persistent: self.store.is_some(),
        })
    }
}

/// Summary statistics about the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineInfo {
    pub content_count: usize,
    pub word_count: usize,
    pub category_count: usize,
    pub edge_count: usize,
    pub classes: Vec<ClassInfo>,
    pub persistent: bool,
}

/// A registered content class and the media folder its files live in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    pub folder: String,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "archivum engine info")?;
        writeln!(f, "  content:      {}", self.content_count)?;
        writeln!(f, "  index words:  {}", self.word_count)?;
        writeln!(f, "  categories:   {}", self.category_count)?;
        writeln!(f, "  edges:        {}", self.edge_count)?;
        let classes: Vec<String> = self
            .classes
            .iter()
            .map(|c| format!("{} ({}/)", c.name, c.folder))
            .collect();
        writeln!(f, "  classes:      {}", classes.join(", "))?;
        writeln!(f, "  persistent:   {}", self.persistent)?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("graph", &self.graph)
            .field("classes", &self.classes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::error::{ArchivumError, CategoryError, GraphError};
    use crate::graph::GraphTxn;
    use crate::index::IndexResult;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    fn note(engine: &Engine, uri: &str, text: &str) -> NodeId {
        engine
            .create_content(
                NewContent::new("Note")
                    .uri(uri)
                    .source(ContentSource::Text(text.into())),
            )
            .unwrap()
            .id
    }

    #[test]
    fn invalid_config_rejected() {
        let result = Engine::new(EngineConfig {
            position_step: 0,
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(ArchivumError::Engine(EngineError::InvalidConfig { .. }))
        ));
    }

    #[test]
    fn generated_uri_uses_class_prefix() {
        let engine = engine();
        let created = engine.create_content(NewContent::new("Record")).unwrap();
        assert!(created.uri.starts_with("Record:"));
        assert_eq!(created.uri.len(), "Record:".len() + 36);
        assert!(!created.indexing.is_indexed());
        assert_eq!(engine.content_id(&created.uri).unwrap(), created.id);
    }

    #[test]
    fn duplicate_uri_rejected() {
        let engine = engine();
        note(&engine, "note:trip", "paris");
        let err = engine
            .create_content(NewContent::new("Note").uri("note:trip"))
            .unwrap_err();
        assert!(matches!(
            err,
            ArchivumError::Graph(GraphError::DuplicateUri { .. })
        ));
    }

    #[test]
    fn failed_extraction_creates_nothing() {
        let engine = engine();
        let err = engine
            .create_content(
                NewContent::new("Document")
                    .uri("doc:missing")
                    .source(ContentSource::File("/nonexistent/missing.txt".into())),
            )
            .unwrap_err();
        assert!(matches!(err, ArchivumError::Extract(_)));
        assert!(engine.content_id("doc:missing").is_err());
        assert_eq!(engine.info().content_count, 0);
    }

    #[test]
    fn created_note_is_searchable() {
        let engine = engine();
        note(&engine, "note:tahiti", "Tahiti vacation photos");
        let results = engine.search("vacation", None).unwrap();
        assert_eq!(results.uris(), vec!["note:tahiti"]);
        assert_eq!(results.records[0].properties["title"], "Tahiti vacation photos");
    }

    #[test]
    fn update_merges_properties_and_reindexes() {
        let engine = engine();
        let id = note(&engine, "note:1", "paris trip");
        let mut patch = BTreeMap::new();
        patch.insert("title".to_string(), serde_json::Value::Null);
        patch.insert("rating".to_string(), serde_json::json!(5));
        engine
            .update_content(id, patch, Some(ContentSource::Text("rome trip".into())))
            .unwrap();

        let node = engine.content(id).unwrap();
        assert_eq!(node.properties["rating"], 5);
        // The removed title is derived again from the new body.
        assert_eq!(node.properties["title"], "rome trip");
        assert!(engine.search("paris", None).unwrap().is_empty());
        assert_eq!(engine.search("rome", None).unwrap().len(), 1);
    }

    #[test]
    fn failed_reindex_leaves_item_unchanged() {
        let engine = engine();
        let id = engine
            .create_content(
                NewContent::new("Document")
                    .uri("doc:paris")
                    .source(ContentSource::Text("paris trip".into())),
            )
            .unwrap()
            .id;
        let before = engine.content(id).unwrap();

        let mut patch = BTreeMap::new();
        patch.insert("rating".to_string(), serde_json::json!(5));
        let err = engine
            .update_content(
                id,
                patch,
                Some(ContentSource::File("/nonexistent/rome.txt".into())),
            )
            .unwrap_err();
        assert!(matches!(err, ArchivumError::Extract(_)));

        let after = engine.content(id).unwrap();
        assert_eq!(after.properties, before.properties);
        assert_eq!(after.updated_at, before.updated_at);
        assert_eq!(
            engine.index().indexed_words(id).unwrap(),
            BTreeSet::from(["paris".to_string(), "trip".to_string()])
        );
    }

    #[test]
    fn concurrent_updates_keep_every_property() {
        let engine = engine();
        let id = engine
            .create_content(NewContent::new("Record").uri("rec:shared"))
            .unwrap()
            .id;
        std::thread::scope(|s| {
            for t in 0..4 {
                let engine = &engine;
                s.spawn(move || {
                    for i in 0..50 {
                        let mut patch = BTreeMap::new();
                        patch.insert(format!("t{t}_{i}"), serde_json::json!(i));
                        engine.update_content(id, patch, None).unwrap();
                    }
                });
            }
        });
        assert_eq!(engine.content(id).unwrap().properties.len(), 200);
    }

    /// Drops its index and then refuses the delete.
    struct Undeletable;

    impl ContentClass for Undeletable {
        fn name(&self) -> &'static str {
            "Undeletable"
        }

        fn default_folder(&self) -> &'static str {
            "undeletable"
        }

        fn on_delete(
            &self,
            indexer: &IndexingEngine<'_>,
            txn: &mut GraphTxn<'_>,
            id: NodeId,
        ) -> IndexResult<usize> {
            indexer.clear(txn, "delete_content", id)?;
            Err(IndexError::ContentNotFound {
                operation: "delete_content",
                id: id.get(),
            })
        }
    }

    #[test]
    fn failed_delete_hook_keeps_node_and_index() {
        let mut engine = engine();
        engine.register_class(Box::new(Undeletable));
        let id = engine
            .create_content(
                NewContent::new("Undeletable")
                    .uri("x:1")
                    .source(ContentSource::Text("granite".into())),
            )
            .unwrap()
            .id;

        assert!(engine.delete_content(id).is_err());
        assert_eq!(engine.content_id("x:1").unwrap(), id);
        assert_eq!(engine.search("granite", None).unwrap().uris(), vec!["x:1"]);
        assert_eq!(engine.info().word_count, 1);
    }

    #[test]
    fn pinning_is_reflected_in_listing() {
        let engine = engine();
        let cat = engine.create_category("Inbox", None).unwrap();
        engine.set_pinned(cat, true).unwrap();
        assert!(engine.list_categories()[0].pinned);
        engine.set_pinned(cat, false).unwrap();
        assert!(!engine.list_categories()[0].pinned);
    }

    #[test]
    fn delete_cascades_to_index_and_memberships() {
        let engine = engine();
        let id = note(&engine, "note:1", "unique zeppelin");
        let keep = note(&engine, "note:2", "zeppelin");
        let cat = engine.create_category("Air", None).unwrap();
        engine.add_at_end(cat, id).unwrap();
        engine.add_at_end(cat, keep).unwrap();

        let removed = engine.delete_content(id).unwrap();
        assert_eq!(removed.uri, "note:1");
        assert!(engine.search("unique", None).unwrap().is_empty());
        assert_eq!(engine.search("zeppelin", None).unwrap().uris(), vec!["note:2"]);
        assert_eq!(
            engine
                .ordered_members(cat)
                .unwrap()
                .into_iter()
                .map(|m| m.item)
                .collect::<Vec<_>>(),
            vec![keep]
        );
        // The orphaned word node was collected.
        assert!(engine.graph().read(|s| s.words().get("unique").is_none()));
    }

    #[test]
    fn index_content_with_unknown_class_skips() {
        let engine = engine();
        let id = engine
            .create_content(NewContent::new("Note").uri("note:x"))
            .unwrap()
            .id;
        let outcome = engine
            .index_content(id, "Hologram", &ContentSource::Text("laser".into()))
            .unwrap();
        assert!(!outcome.is_indexed());
        let outcome = engine
            .index_content(id, "Note", &ContentSource::Text("laser".into()))
            .unwrap();
        assert!(outcome.is_indexed());
    }

    #[test]
    fn resolve_category_by_name_or_id() {
        let engine = engine();
        let travel = engine.create_category("Travel", None).unwrap();
        assert_eq!(engine.resolve_category("travel").unwrap(), travel);
        assert_eq!(engine.resolve_category(&travel.to_string()).unwrap(), travel);
        assert!(matches!(
            engine.resolve_category("Work"),
            Err(ArchivumError::Engine(EngineError::UnknownCategory { .. }))
        ));
        engine.create_category("TRAVEL", None).unwrap();
        assert!(matches!(
            engine.resolve_category("Travel"),
            Err(ArchivumError::Engine(EngineError::AmbiguousCategory { count: 2, .. }))
        ));
    }

    #[test]
    fn positioning_errors_surface_as_category_errors() {
        let engine = engine();
        let cat = engine.create_category("Travel", None).unwrap();
        let a = note(&engine, "note:a", "alpha");
        let b = note(&engine, "note:b", "beta");
        engine.add_at_end(cat, a).unwrap();
        assert!(matches!(
            engine.swap(cat, a, b),
            Err(ArchivumError::Category(CategoryError::NotMember { .. }))
        ));
    }

    #[test]
    fn info_counts() {
        let engine = engine();
        note(&engine, "note:1", "alpha beta");
        engine.create_category("Travel", None).unwrap();
        let info = engine.info();
        assert_eq!(info.content_count, 1);
        assert_eq!(info.word_count, 2);
        assert_eq!(info.category_count, 1);
        assert!(!info.persistent);
        assert!(info.to_string().contains("index words:  2"));
        assert_eq!(
            info.classes[0],
            ClassInfo {
                name: "Document".into(),
                folder: "documents".into(),
            }
        );
        assert!(info.to_string().contains("Note (notes/)"));
    }

    #[test]
    fn persist_and_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = EngineConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let (id, cat) = {
            let engine = Engine::new(config.clone()).unwrap();
            let id = note(&engine, "note:1", "tahiti vacation");
            let cat = engine.create_category("Travel", None).unwrap();
            engine.add_at_end(cat, id).unwrap();
            engine.persist().unwrap();
            (id, cat)
        };

        let engine = Engine::new(config).unwrap();
        assert!(engine.info().persistent);
        assert_eq!(engine.content_id("note:1").unwrap(), id);
        assert_eq!(engine.search("vacation", Some(cat)).unwrap().len(), 1);
        // New ids continue after the persisted ones.
        let next = note(&engine, "note:2", "fresh");
        assert!(next.get() > cat.get());
    }
}
