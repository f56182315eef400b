//! Substring-capable lookup table over index words.
//!
//! Every word is broken into character trigrams; a substring query of three
//! or more characters intersects the posting sets of its own trigrams and
//! verifies the survivors. Shorter queries fall back to a scan, which is
//! cheap because the word filter keeps very few short words.

use std::collections::{HashMap, HashSet};

use super::NodeId;

/// Minimum query length served by the trigram postings.
const GRAM: usize = 3;

/// Word string ↔ node id mapping with a trigram substring index.
#[derive(Debug, Default, Clone)]
pub struct WordTable {
    by_word: HashMap<String, NodeId>,
    by_id: HashMap<NodeId, String>,
    grams: HashMap<String, HashSet<NodeId>>,
}

impl WordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact lookup.
    pub fn get(&self, word: &str) -> Option<NodeId> {
        self.by_word.get(word).copied()
    }

    pub fn word(&self, id: NodeId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_word.is_empty()
    }

    /// Register a word. Returns `false` if the word was already present.
    pub fn insert(&mut self, word: &str, id: NodeId) -> bool {
        if self.by_word.contains_key(word) {
            return false;
        }
        for gram in trigrams(word) {
            self.grams.entry(gram).or_default().insert(id);
        }
        self.by_word.insert(word.to_string(), id);
        self.by_id.insert(id, word.to_string());
        true
    }

    /// Unregister a word, returning its node id.
    pub fn remove(&mut self, word: &str) -> Option<NodeId> {
        let id = self.by_word.remove(word)?;
        self.by_id.remove(&id);
        for gram in trigrams(word) {
            if let Some(posting) = self.grams.get_mut(&gram) {
                posting.remove(&id);
                if posting.is_empty() {
                    self.grams.remove(&gram);
                }
            }
        }
        Some(id)
    }

    /// All words containing `fragment` (case-insensitive).
    pub fn containing(&self, fragment: &str) -> Vec<NodeId> {
        let needle = fragment.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        if needle.chars().count() < GRAM {
            return self
                .by_word
                .iter()
                .filter(|(w, _)| w.contains(&needle))
                .map(|(_, id)| *id)
                .collect();
        }

        let mut postings: Vec<&HashSet<NodeId>> = Vec::new();
        for gram in trigrams(&needle) {
            match self.grams.get(&gram) {
                Some(p) => postings.push(p),
                None => return Vec::new(),
            }
        }
        postings.sort_by_key(|p| p.len());
        let Some((smallest, rest)) = postings.split_first() else {
            return Vec::new();
        };

        smallest
            .iter()
            .filter(|id| rest.iter().all(|p| p.contains(id)))
            .filter(|id| self.by_id.get(id).is_some_and(|w| w.contains(&needle)))
            .copied()
            .collect()
    }
}

/// Distinct character trigrams of `word`.
fn trigrams(word: &str) -> HashSet<String> {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() < GRAM {
        return HashSet::new();
    }
    chars.windows(GRAM).map(|w| w.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> NodeId {
        NodeId::new(n).unwrap()
    }

    fn table(words: &[&str]) -> WordTable {
        let mut t = WordTable::new();
        for (i, w) in words.iter().enumerate() {
            assert!(t.insert(w, id(i as u64 + 1)));
        }
        t
    }

    #[test]
    fn substring_matches_inside_words() {
        let t = table(&["planet", "planetarium", "airplane", "paris"]);
        let mut hits = t.containing("plane");
        hits.sort();
        assert_eq!(hits, vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn query_is_case_insensitive() {
        let t = table(&["vacation"]);
        assert_eq!(t.containing("VACA"), vec![id(1)]);
    }

    #[test]
    fn short_fragment_scans() {
        let t = table(&["ai", "rain", "tahiti"]);
        let mut hits = t.containing("ai");
        hits.sort();
        assert_eq!(hits, vec![id(1), id(2)]);
    }

    #[test]
    fn trigrams_present_but_not_contiguous_are_rejected() {
        // "abcxbcd" has both "abc" and "bcd" but not "abcd".
        let t = table(&["abcxbcd"]);
        assert!(t.containing("abcd").is_empty());
    }

    #[test]
    fn remove_clears_postings() {
        let mut t = table(&["photos", "photon"]);
        assert_eq!(t.remove("photos"), Some(id(1)));
        assert_eq!(t.containing("phot"), vec![id(2)]);
        assert!(t.get("photos").is_none());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn duplicate_insert_is_refused() {
        let mut t = table(&["trip"]);
        assert!(!t.insert("trip", id(9)));
        assert_eq!(t.get("trip"), Some(id(1)));
    }

    #[test]
    fn empty_fragment_matches_nothing() {
        let t = table(&["trip"]);
        assert!(t.containing("").is_empty());
    }
}
