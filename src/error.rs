//! Rich diagnostic error types for the archivum backend.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Messages always name the operation and
//! the identifier involved so operators can trace a failure from a log line.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the archivum backend.
#[derive(Debug, Error, Diagnostic)]
pub enum ArchivumError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Category(#[from] CategoryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Paths(#[from] crate::paths::PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("{operation}: node {id} not found")]
    #[diagnostic(
        code(archivum::graph::node_not_found),
        help("The identifier does not refer to any node in the content graph.")
    )]
    NodeNotFound { operation: &'static str, id: u64 },

    #[error("{operation}: node {id} is a {actual}, expected a {expected}")]
    #[diagnostic(
        code(archivum::graph::wrong_kind),
        help(
            "Content, category and word nodes share one identifier space. \
             Check that the identifier was taken from the right listing."
        )
    )]
    WrongKind {
        operation: &'static str,
        id: u64,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("duplicate content uri: \"{uri}\"")]
    #[diagnostic(
        code(archivum::graph::duplicate_uri),
        help("Content uris are globally unique. Omit the uri to have one generated.")
    )]
    DuplicateUri { uri: String },

    #[error("duplicate index word: \"{word}\"")]
    #[diagnostic(
        code(archivum::graph::duplicate_word),
        help("Index words are unique. This indicates a bug in the indexing code.")
    )]
    DuplicateWord { word: String },

    #[error("corrupt graph snapshot: {message}")]
    #[diagnostic(
        code(archivum::graph::corrupt_snapshot),
        help(
            "The persisted snapshot references nodes that do not exist. \
             Restore the data directory from a backup or start a fresh one."
        )
    )]
    CorruptSnapshot { message: String },

    #[error("node id space exhausted")]
    #[diagnostic(
        code(archivum::graph::ids_exhausted),
        help("The allocator reached u64::MAX. This should never happen in practice.")
    )]
    IdsExhausted,
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(archivum::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(archivum::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             This may indicate corruption; try running with a fresh data directory."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(archivum::store::serde),
        help(
            "Failed to serialize or deserialize stored data. \
             This usually means the snapshot format changed between versions."
        )
    )]
    Serialization { message: String },
}

// ---------------------------------------------------------------------------
// Index errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IndexError {
    #[error("{operation}: content {id} not found")]
    #[diagnostic(
        code(archivum::index::content_not_found),
        help("Create the content item before indexing or searching it.")
    )]
    ContentNotFound { operation: &'static str, id: u64 },

    #[error("{operation}: category {id} not found")]
    #[diagnostic(
        code(archivum::index::category_not_found),
        help("The search scope must name an existing category.")
    )]
    CategoryNotFound { operation: &'static str, id: u64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

// ---------------------------------------------------------------------------
// Category errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CategoryError {
    #[error("{operation}: category {id} not found")]
    #[diagnostic(
        code(archivum::category::not_found),
        help("List categories with `archivum category list`.")
    )]
    NotFound { operation: &'static str, id: u64 },

    #[error("{operation}: content {id} not found")]
    #[diagnostic(
        code(archivum::category::item_not_found),
        help("Only existing content items can be placed in a category.")
    )]
    ItemNotFound { operation: &'static str, id: u64 },

    #[error("{operation}: content {item} is not a member of category {category}")]
    #[diagnostic(
        code(archivum::category::not_member),
        help("Add the item to the category first, or check the category identifier.")
    )]
    NotMember {
        operation: &'static str,
        category: u64,
        item: u64,
    },

    #[error("{operation}: content {item} cannot be placed relative to itself")]
    #[diagnostic(
        code(archivum::category::self_placement),
        help("Choose a different anchor item.")
    )]
    SelfPlacement { operation: &'static str, item: u64 },

    #[error("linking category {child} under {parent} would create a cycle")]
    #[diagnostic(
        code(archivum::category::cycle),
        help(
            "Category nesting must stay acyclic. Category {parent} is already \
             reachable from {child}."
        )
    )]
    Cycle { parent: u64, child: u64 },

    #[error("category {id} cannot be its own subcategory")]
    #[diagnostic(code(archivum::category::self_link))]
    SelfLink { id: u64 },

    #[error("category {category} has two members at position {position}")]
    #[diagnostic(
        code(archivum::category::position_conflict),
        help(
            "Positions within a category must be unique. This indicates a bug \
             or a hand-edited snapshot; please file a report."
        )
    )]
    PositionConflict { category: u64, position: i64 },

    #[error("{operation}: position arithmetic overflowed in category {category}")]
    #[diagnostic(
        code(archivum::category::position_overflow),
        help("Positions reached the i64 range limit even after renumbering.")
    )]
    PositionOverflow { operation: &'static str, category: u64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

// ---------------------------------------------------------------------------
// Text extraction errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExtractError {
    #[error("parse error in {format} document: {message}")]
    #[diagnostic(
        code(archivum::extract::parse),
        help("Verify the file is a valid {format} document and is not corrupted.")
    )]
    Parse { format: String, message: String },

    #[error("failed to read {path}: {source}")]
    #[diagnostic(
        code(archivum::extract::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(archivum::engine::invalid_config),
        help("Check the values in archivum.toml or the command-line flags.")
    )]
    InvalidConfig { message: String },

    #[error("cannot create data directory: {path}")]
    #[diagnostic(
        code(archivum::engine::data_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    DataDir { path: String },

    #[error("no content with uri \"{uri}\"")]
    #[diagnostic(
        code(archivum::engine::unknown_content),
        help("List content uris with `archivum list` or check for typos.")
    )]
    UnknownContent { uri: String },

    #[error("no category named \"{name}\"")]
    #[diagnostic(
        code(archivum::engine::unknown_category),
        help("List categories with `archivum category list`.")
    )]
    UnknownCategory { name: String },

    #[error("{count} categories are named \"{name}\"")]
    #[diagnostic(
        code(archivum::engine::ambiguous_category),
        help("Refer to the category by its numeric id instead of its name.")
    )]
    AmbiguousCategory { name: String, count: usize },
}

/// Convenience alias for archivum results.
pub type ArchivumResult<T> = std::result::Result<T, ArchivumError>;
