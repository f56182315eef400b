//! Text pipeline shared by indexing and search.
//!
//! Content source → [`extract`] (per-page text) → [`tokenizer`] → [`filter`]
//! → unique word set.

pub mod extract;
pub mod filter;
pub mod tokenizer;

pub use extract::{ContentFormat, ContentSource, ExtractedText};
pub use filter::WordFilter;
pub use tokenizer::{TokenStream, Tokenizer, TokenizerOptions};
