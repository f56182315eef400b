//! Content classes and their lifecycle hooks.
//!
//! A [`ContentClass`] decides how an item of its class is prepared, indexed
//! and cleaned up. Classes are registered once in a [`ClassRegistry`] when
//! the engine is built and looked up by their class tag afterwards.
//!
//! `on_create` and `on_update` run before the graph lock is taken and return
//! an [`IndexPlan`]; the engine writes it in the same transaction as the
//! node. `on_delete` runs inside the deleting transaction.

use std::collections::HashMap;

use crate::error::ArchivumResult;
use crate::graph::{ContentNode, GraphTxn, NodeId};
use crate::index::IndexResult;
use crate::text::extract::{ContentSource, detect_format};

use super::{IndexPlan, IndexingEngine};

/// Lifecycle hooks of one content class.
pub trait ContentClass: Send + Sync {
    /// Class tag stored on content nodes.
    fn name(&self) -> &'static str;

    /// Folder, relative to the media root, where files of this class live.
    fn default_folder(&self) -> &'static str;

    /// Adjust properties before a create or update is written.
    fn before_update(&self, _node: &mut ContentNode, _source: Option<&ContentSource>) {}

    /// Index plan for a new item.
    fn on_create(
        &self,
        indexer: &IndexingEngine<'_>,
        source: Option<&ContentSource>,
    ) -> ArchivumResult<IndexPlan> {
        plan_if_present(indexer, source)
    }

    /// Index plan for an item whose source or properties changed.
    fn on_update(
        &self,
        indexer: &IndexingEngine<'_>,
        source: Option<&ContentSource>,
    ) -> ArchivumResult<IndexPlan> {
        plan_if_present(indexer, source)
    }

    /// Called in the deleting transaction before the node is removed.
    /// Returns the number of index entries dropped.
    fn on_delete(
        &self,
        indexer: &IndexingEngine<'_>,
        txn: &mut GraphTxn<'_>,
        id: NodeId,
    ) -> IndexResult<usize> {
        indexer.clear(txn, "delete_content", id)
    }
}

fn plan_if_present(
    indexer: &IndexingEngine<'_>,
    source: Option<&ContentSource>,
) -> ArchivumResult<IndexPlan> {
    match source {
        Some(source) => indexer.prepare(source),
        None => Ok(IndexPlan::skip("no text source given")),
    }
}

/// Record `basename` and `suffix` of a file-backed source.
fn set_file_properties(node: &mut ContentNode, source: Option<&ContentSource>) {
    let Some(ContentSource::File(path)) = source else {
        return;
    };
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        node.properties
            .insert("basename".into(), serde_json::Value::from(name));
    }
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        node.properties
            .insert("suffix".into(), serde_json::Value::from(ext.to_lowercase()));
    }
}

/// File-backed documents: PDF, EPUB, HTML, text files.
#[derive(Debug, Default)]
pub struct Document;

impl ContentClass for Document {
    fn name(&self) -> &'static str {
        "Document"
    }

    fn default_folder(&self) -> &'static str {
        "documents"
    }

    fn before_update(&self, node: &mut ContentNode, source: Option<&ContentSource>) {
        set_file_properties(node, source);
        if let Some(ContentSource::File(path)) = source {
            if let Some(format) = detect_format(path) {
                node.properties
                    .insert("format".into(), serde_json::Value::from(format.as_str()));
            }
        }
    }
}

/// Free-form notes; the title defaults to the first line of the body.
#[derive(Debug, Default)]
pub struct Note;

const TITLE_MAX_CHARS: usize = 80;

impl ContentClass for Note {
    fn name(&self) -> &'static str {
        "Note"
    }

    fn default_folder(&self) -> &'static str {
        "notes"
    }

    fn before_update(&self, node: &mut ContentNode, source: Option<&ContentSource>) {
        if node.properties.contains_key("title") {
            return;
        }
        let body = match source {
            Some(ContentSource::Text(text)) => text.as_str(),
            _ => return,
        };
        if let Some(line) = body.lines().map(str::trim).find(|l| !l.is_empty()) {
            let title: String = line.chars().take(TITLE_MAX_CHARS).collect();
            node.properties
                .insert("title".into(), serde_json::Value::from(title));
        }
    }
}

/// Images carry no searchable text.
#[derive(Debug, Default)]
pub struct Image;

impl ContentClass for Image {
    fn name(&self) -> &'static str {
        "Image"
    }

    fn default_folder(&self) -> &'static str {
        "images"
    }

    fn before_update(&self, node: &mut ContentNode, source: Option<&ContentSource>) {
        set_file_properties(node, source);
    }

    fn on_create(
        &self,
        _indexer: &IndexingEngine<'_>,
        _source: Option<&ContentSource>,
    ) -> ArchivumResult<IndexPlan> {
        Ok(IndexPlan::skip("images are not indexed"))
    }

    fn on_update(
        &self,
        _indexer: &IndexingEngine<'_>,
        _source: Option<&ContentSource>,
    ) -> ArchivumResult<IndexPlan> {
        Ok(IndexPlan::skip("images are not indexed"))
    }
}

/// Structured records with properties only. Also the fallback class.
#[derive(Debug, Default)]
pub struct Record;

impl ContentClass for Record {
    fn name(&self) -> &'static str {
        "Record"
    }

    fn default_folder(&self) -> &'static str {
        "records"
    }

    fn on_create(
        &self,
        _indexer: &IndexingEngine<'_>,
        _source: Option<&ContentSource>,
    ) -> ArchivumResult<IndexPlan> {
        Ok(IndexPlan::skip("records are not indexed"))
    }

    fn on_update(
        &self,
        _indexer: &IndexingEngine<'_>,
        _source: Option<&ContentSource>,
    ) -> ArchivumResult<IndexPlan> {
        Ok(IndexPlan::skip("records are not indexed"))
    }
}

/// Class tag → handler, resolved once at startup.
pub struct ClassRegistry {
    classes: HashMap<String, Box<dyn ContentClass>>,
    fallback: Record,
}

impl ClassRegistry {
    /// An empty registry; every lookup falls back to [`Record`].
    pub fn new() -> Self {
        Self {
            classes: HashMap::new(),
            fallback: Record,
        }
    }

    /// A registry with the built-in classes.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Document));
        registry.register(Box::new(Note));
        registry.register(Box::new(Image));
        registry.register(Box::new(Record));
        registry
    }

    /// Add or replace a class handler.
    pub fn register(&mut self, class: Box<dyn ContentClass>) {
        self.classes.insert(class.name().to_lowercase(), class);
    }

    /// Look up a class tag (case-insensitive). Unknown tags get record
    /// semantics.
    pub fn get(&self, name: &str) -> &dyn ContentClass {
        match self.classes.get(&name.to_lowercase()) {
            Some(class) => class.as_ref(),
            None => {
                tracing::warn!(class = name, "unknown content class, treating as record");
                &self.fallback
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(&name.to_lowercase())
    }

    /// Registered class tags, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.classes.values().map(|c| c.name()).collect();
        names.sort_unstable();
        names
    }

    /// `(name, default_folder)` of every registered class, sorted by name.
    pub fn folders(&self) -> Vec<(&'static str, &'static str)> {
        let mut out: Vec<_> = self
            .classes
            .values()
            .map(|c| (c.name(), c.default_folder()))
            .collect();
        out.sort_unstable();
        out
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.names())
            .finish()
    }
}
