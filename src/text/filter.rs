//! Word filter: decides which tokens are worth indexing.
//!
//! The same [`WordFilter`] instance normalizes document text at indexing time
//! and query text at search time; any divergence between the two would turn
//! into silent false negatives.

use std::collections::{BTreeSet, HashSet};

use crate::config::FilterConfig;

use super::tokenizer::{TokenStream, Tokenizer};

/// Built-in English stop words.
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "and", "any", "are", "aren",
    "because", "been", "before", "being", "below", "between", "both", "but", "can", "cannot",
    "could", "did", "does", "doing", "don", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "into", "its", "itself", "just", "more", "most", "must", "myself",
    "nor", "not", "now", "off", "once", "only", "other", "ought", "our", "ours", "ourselves",
    "out", "over", "own", "same", "shall", "she", "should", "some", "such", "than", "that",
    "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this",
    "those", "through", "too", "under", "until", "very", "was", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Index-worthiness rules applied to tokenizer output.
#[derive(Debug, Clone)]
pub struct WordFilter {
    min_len: usize,
    keep: HashSet<String>,
    stop: HashSet<String>,
}

impl WordFilter {
    pub fn new(config: &FilterConfig) -> Self {
        let stop = STOP_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(config.extra_stop_words.iter().map(|w| w.to_lowercase()))
            .collect();
        Self {
            min_len: config.min_word_len,
            keep: config.keep_words.iter().map(|w| w.to_lowercase()).collect(),
            stop,
        }
    }

    /// Whether a single (already lower-cased) token survives the filter.
    pub fn is_good(&self, token: &str) -> bool {
        if token.chars().count() < self.min_len && !self.keep.contains(token) {
            return false;
        }
        if token.chars().all(char::is_numeric) {
            return false;
        }
        !self.stop.contains(token)
    }

    /// Unique index-worthy words of plain `text`.
    pub fn extract_unique_good_words(&self, text: &str) -> BTreeSet<String> {
        self.good_words(&Tokenizer::default().tokens(text))
    }

    /// Unique index-worthy words of an already prepared token stream.
    pub fn good_words(&self, stream: &TokenStream) -> BTreeSet<String> {
        stream
            .iter()
            .filter(|t| self.is_good(t))
            .map(String::from)
            .collect()
    }

    /// Query words in first-seen order, normalized exactly like indexed text.
    pub fn query_words(&self, query: &str) -> Vec<String> {
        let stream = Tokenizer::default().tokens(query);
        let mut seen = HashSet::new();
        stream
            .iter()
            .filter(|t| self.is_good(t))
            .filter(|t| seen.insert(t.to_string()))
            .map(String::from)
            .collect()
    }
}

impl Default for WordFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}
