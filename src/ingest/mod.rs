//! Indexing engine: content source → unique word set → index update.
//!
//! Indexing runs in two phases. [`IndexingEngine::prepare`] extracts and
//! filters text without holding the graph lock and yields an [`IndexPlan`];
//! [`IndexingEngine::apply`] writes a plan inside an open graph transaction,
//! so callers can commit the index together with other node changes.
//! Paginated formats are filtered page by page in parallel and the per-page
//! sets are unioned, so page boundaries never become words.

pub mod classes;

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::ArchivumResult;
use crate::graph::{ContentGraph, GraphTxn, NodeId};
use crate::index::{self, IndexResult, IndexStore, IndexingOutcome};
use crate::text::extract::{self, ContentFormat, ContentSource, ExtractedText};
use crate::text::{Tokenizer, WordFilter};

pub use classes::{ClassRegistry, ContentClass, Document, Image, Note, Record};

/// What `index_content` did with a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexOutcome {
    Indexed {
        format: ContentFormat,
        /// Size of the new word set.
        words: usize,
        changes: IndexingOutcome,
    },
    Skipped {
        reason: String,
    },
}

impl IndexOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed { .. })
    }
}

/// Words extracted from a source, not yet written to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexPlan {
    Words {
        format: ContentFormat,
        words: BTreeSet<String>,
    },
    Skip {
        reason: String,
    },
}

impl IndexPlan {
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip {
            reason: reason.into(),
        }
    }
}

/// Turns content sources into index entries.
#[derive(Debug, Clone, Copy)]
pub struct IndexingEngine<'g> {
    graph: &'g ContentGraph,
    index: IndexStore<'g>,
    filter: &'g WordFilter,
    collect_orphans: bool,
}

impl<'g> IndexingEngine<'g> {
    pub fn new(graph: &'g ContentGraph, filter: &'g WordFilter, collect_orphans: bool) -> Self {
        Self {
            graph,
            index: IndexStore::new(graph, collect_orphans),
            filter,
            collect_orphans,
        }
    }

    /// Replace the index entries of `content` with the words of `source`.
    /// Sources without a text strategy are skipped with a warning.
    pub fn index_source(&self, content: NodeId, source: &ContentSource) -> ArchivumResult<IndexOutcome> {
        const OP: &str = "index_content";
        self.graph.read(|s| index::require_content(s, OP, content))?;
        let plan = self.prepare(source)?;
        Ok(self.graph.transact(|txn| self.apply(txn, OP, content, plan))?)
    }

    /// Extract and filter the words of `source`. Takes no graph lock.
    pub fn prepare(&self, source: &ContentSource) -> ArchivumResult<IndexPlan> {
        let Some(text) = extract::extract(source)? else {
            let reason = format!("no text extraction strategy for {}", describe(source));
            tracing::warn!(%reason, "skipping indexing");
            return Ok(IndexPlan::Skip { reason });
        };
        let words = self.words_of(&text);
        tracing::debug!(
            format = %text.format,
            pages = text.pages.len(),
            words = words.len(),
            "extracted words"
        );
        Ok(IndexPlan::Words {
            format: text.format,
            words,
        })
    }

    /// Write a prepared plan for `content` inside an open transaction.
    pub fn apply(
        &self,
        txn: &mut GraphTxn<'_>,
        operation: &'static str,
        content: NodeId,
        plan: IndexPlan,
    ) -> IndexResult<IndexOutcome> {
        index::require_content(txn, operation, content)?;
        match plan {
            IndexPlan::Skip { reason } => Ok(IndexOutcome::Skipped { reason }),
            IndexPlan::Words { format, words } => {
                let changes =
                    index::apply_words(txn, operation, content, &words, self.collect_orphans)?;
                tracing::info!(%content, %format, words = words.len(), "indexed content");
                Ok(IndexOutcome::Indexed {
                    format,
                    words: words.len(),
                    changes,
                })
            }
        }
    }

    /// Drop every index entry of `content` inside an open transaction.
    /// Returns the number removed.
    pub fn clear(
        &self,
        txn: &mut GraphTxn<'_>,
        operation: &'static str,
        content: NodeId,
    ) -> IndexResult<usize> {
        index::require_content(txn, operation, content)?;
        index::clear_words(txn, operation, content, self.collect_orphans)
    }

    /// Union of the filtered words of every page.
    pub fn words_of(&self, text: &ExtractedText) -> BTreeSet<String> {
        let tokenizer = Tokenizer::new(text.format.tokenizer_options());
        text.pages
            .par_iter()
            .map(|page| self.filter.good_words(&tokenizer.tokens(page)))
            .reduce(BTreeSet::new, |mut acc, page| {
                acc.extend(page);
                acc
            })
    }

    pub fn index(&self) -> &IndexStore<'g> {
        &self.index
    }
}

fn describe(source: &ContentSource) -> String {
    match source {
        ContentSource::Text(_) => "text".into(),
        ContentSource::Html(_) => "html".into(),
        ContentSource::Bytes { data, .. } => format!("{} bytes of unknown format", data.len()),
        ContentSource::File(path) => path.display().to_string(),
    }
}
