// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # archivum
//!
//! Content-management backend for a personal knowledge base: content items
//! live as nodes in a property graph, are organized into ordered, nested
//! categories, and are searchable through a graph-backed inverted index.
//!
//! ## Architecture
//!
//! - **Content graph** (`graph`): petgraph-backed nodes and relations with
//!   undo-logged transactions and a trigram word table
//! - **Text pipeline** (`text`): extraction (text, HTML, PDF, EPUB),
//!   tokenizer and word filter
//! - **Inverted index** (`index`, `ingest`): word edges kept in sync with each
//!   item's current text
//! - **Search** (`search`): iterative AND over substring word matches with an
//!   optional category scope
//! - **Categories** (`category`): sparse positions with renumbering on gap
//!   exhaustion, acyclic nesting
//! - **Storage** (`store`): redb snapshots of the graph
//!
//! ## Library usage
//!
//! ```no_run
//! use archivum::config::EngineConfig;
//! use archivum::engine::{Engine, NewContent};
//! use archivum::text::ContentSource;
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let travel = engine.create_category("Travel", None).unwrap();
//! let d1 = engine
//!     .create_content(
//!         NewContent::new("Note").source(ContentSource::Text("Tahiti vacation photos".into())),
//!     )
//!     .unwrap();
//! engine.add_at_end(travel, d1.id).unwrap();
//! let results = engine.search("vacation", Some(travel)).unwrap();
//! println!("{}", results.caption);
//! ```

pub mod category;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod index;
pub mod ingest;
pub mod paths;
pub mod search;
pub mod store;
pub mod text;
