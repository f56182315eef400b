//! Search engine: query text → ordered content records with a caption.
//!
//! Query text goes through the same [`WordFilter`] as indexed text. Each
//! query word is matched as a substring of index words; multi-word queries
//! narrow the candidate set word by word and stop as soon as it is empty.
//! The whole search runs under one read lock, so it sees a single
//! consistent version of the graph.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::category::{CategoryRef, direct_categories};
use crate::graph::{ContentGraph, GraphState, Node, NodeId};
use crate::index::{IndexResult, resolve_scope, word_hits};
use crate::text::WordFilter;

/// Caption for queries that filter down to nothing.
pub const EMPTY_QUERY_CAPTION: &str = "No searchable words in query";

/// One search hit, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRecord {
    pub id: NodeId,
    pub uri: String,
    pub class: String,
    pub properties: BTreeMap<String, serde_json::Value>,
    /// Direct memberships, for display.
    pub categories: Vec<CategoryRef>,
    /// Index words matched across all query words.
    pub matched_words: usize,
}

/// Records plus a human-readable summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub records: Vec<ContentRecord>,
    pub caption: String,
    /// The normalized query words that were searched.
    pub words: Vec<String>,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn uris(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.uri.as_str()).collect()
    }
}

/// Orders search hits. Implementations must be deterministic.
pub trait Ranker: Send + Sync {
    fn rank(&self, records: &mut [ContentRecord]);
}

/// Most matched index words first, ties by uri.
#[derive(Debug, Default, Clone, Copy)]
pub struct HitCountRanker;

impl Ranker for HitCountRanker {
    fn rank(&self, records: &mut [ContentRecord]) {
        records.sort_by(|a, b| {
            b.matched_words
                .cmp(&a.matched_words)
                .then_with(|| a.uri.cmp(&b.uri))
        });
    }
}

/// Query evaluation over a content graph.
#[derive(Clone, Copy)]
pub struct SearchEngine<'g> {
    graph: &'g ContentGraph,
    filter: &'g WordFilter,
    ranker: &'g dyn Ranker,
}

impl<'g> SearchEngine<'g> {
    pub fn new(graph: &'g ContentGraph, filter: &'g WordFilter, ranker: &'g dyn Ranker) -> Self {
        Self {
            graph,
            filter,
            ranker,
        }
    }

    /// Content matching every word of `query`, optionally limited to the
    /// subtree of `category_scope`.
    pub fn search(&self, query: &str, category_scope: Option<NodeId>) -> IndexResult<SearchResults> {
        let words = self.filter.query_words(query);
        if words.is_empty() {
            return Ok(SearchResults {
                records: Vec::new(),
                caption: EMPTY_QUERY_CAPTION.to_string(),
                words,
            });
        }

        let (mut records, scope_name) = self.graph.read(|state| -> IndexResult<_> {
            let (scope, scope_name) = match category_scope {
                Some(cat) => {
                    let members = resolve_scope(state, "search", cat)?;
                    let name = state.category("search", cat)?.name.clone();
                    (Some(members), Some(name))
                }
                None => (None, None),
            };
            let hits = narrow(state, &words, scope.as_ref());
            Ok((records_for(state, hits), scope_name))
        })?;

        self.ranker.rank(&mut records);
        let caption = caption(records.len(), query, scope_name.as_deref());
        tracing::debug!(query, words = words.len(), results = records.len(), "search finished");
        Ok(SearchResults {
            records,
            caption,
            words,
        })
    }
}

impl std::fmt::Debug for SearchEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("graph", self.graph)
            .finish_non_exhaustive()
    }
}

/// Iterative AND: each word restricts the candidates left by the previous one.
fn narrow(
    state: &GraphState,
    words: &[String],
    scope: Option<&HashSet<NodeId>>,
) -> HashMap<NodeId, usize> {
    let mut candidates: Option<HashSet<NodeId>> = None;
    let mut matched: HashMap<NodeId, usize> = HashMap::new();

    for word in words {
        let hits = word_hits(state, word, candidates.as_ref(), scope);
        for (id, count) in &hits {
            *matched.entry(*id).or_insert(0) += count;
        }
        let next: HashSet<NodeId> = hits.into_keys().collect();
        let done = next.is_empty();
        candidates = Some(next);
        if done {
            break;
        }
    }

    let survivors = candidates.unwrap_or_default();
    matched.retain(|id, _| survivors.contains(id));
    matched
}

fn records_for(state: &GraphState, hits: HashMap<NodeId, usize>) -> Vec<ContentRecord> {
    hits.into_iter()
        .filter_map(|(id, matched_words)| match state.node(id) {
            Some(Node::Content(c)) => Some(ContentRecord {
                id,
                uri: c.uri.clone(),
                class: c.class.clone(),
                properties: c.properties.clone(),
                categories: direct_categories(state, id),
                matched_words,
            }),
            _ => None,
        })
        .collect()
}

fn caption(count: usize, query: &str, scope_name: Option<&str>) -> String {
    let mut caption = format!("{count} result(s) for \"{}\"", query.trim());
    if let Some(name) = scope_name {
        caption.push_str(&format!(" in category \"{name}\""));
    }
    caption
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::category::CategoryStore;
    use crate::error::IndexError;
    use crate::graph::ContentNode;
    use crate::index::IndexStore;

    struct Fixture {
        graph: ContentGraph,
        filter: WordFilter,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                graph: ContentGraph::new(),
                filter: WordFilter::default(),
            }
        }

        fn add(&self, uri: &str, words: &[&str]) -> NodeId {
            let id = self
                .graph
                .transact(|txn| {
                    txn.add_node(Node::Content(ContentNode {
                        uri: uri.into(),
                        class: "Note".into(),
                        properties: BTreeMap::new(),
                        created_at: 0,
                        updated_at: 0,
                    }))
                })
                .unwrap();
            let set: BTreeSet<String> = words.iter().map(|w| w.to_string()).collect();
            IndexStore::new(&self.graph, true).new_indexing(id, &set).unwrap();
            id
        }

        fn search(&self, query: &str, scope: Option<NodeId>) -> IndexResult<SearchResults> {
            SearchEngine::new(&self.graph, &self.filter, &HitCountRanker).search(query, scope)
        }
    }

    #[test]
    fn multi_word_query_intersects() {
        let fx = Fixture::new();
        fx.add("c1", &["alpha", "beta"]);
        fx.add("c2", &["alpha"]);
        let results = fx.search("alpha beta", None).unwrap();
        assert_eq!(results.uris(), vec!["c1"]);
        assert_eq!(results.caption, "1 result(s) for \"alpha beta\"");
        assert_eq!(results.words, vec!["alpha", "beta"]);
    }

    #[test]
    fn early_exit_on_empty_candidates() {
        let fx = Fixture::new();
        fx.add("c1", &["alpha"]);
        let results = fx.search("missing alpha", None).unwrap();
        assert!(results.is_empty());
        assert_eq!(results.caption, "0 result(s) for \"missing alpha\"");
    }

    #[test]
    fn empty_query_does_no_work() {
        let fx = Fixture::new();
        fx.add("c1", &["alpha"]);
        let results = fx.search("the of 42", Some(NodeId::new(999).unwrap())).unwrap();
        assert!(results.is_empty());
        assert_eq!(results.caption, EMPTY_QUERY_CAPTION);
    }

    #[test]
    fn ranks_by_matched_words_then_uri() {
        let fx = Fixture::new();
        fx.add("b", &["planet"]);
        fx.add("a", &["planet"]);
        fx.add("c", &["planet", "airplane"]);
        let results = fx.search("plane", None).unwrap();
        assert_eq!(results.uris(), vec!["c", "a", "b"]);
        assert_eq!(results.records[0].matched_words, 2);
    }

    #[test]
    fn scoped_search_uses_subtree_and_names_category() {
        let fx = Fixture::new();
        let d1 = fx.add("d1", &["vacation"]);
        fx.add("d2", &["vacation"]);
        let categories = CategoryStore::new(&fx.graph, 10);
        let travel = categories.create_category("Travel", None).unwrap();
        let islands = categories.create_category("Islands", None).unwrap();
        categories.link_subcategory(travel, islands).unwrap();
        categories.add_at_end(islands, d1).unwrap();

        let results = fx.search("Vacation", Some(travel)).unwrap();
        assert_eq!(results.uris(), vec!["d1"]);
        assert_eq!(
            results.caption,
            "1 result(s) for \"Vacation\" in category \"Travel\""
        );
        assert_eq!(results.records[0].categories[0].name, "Islands");
    }

    #[test]
    fn unknown_scope_is_an_error() {
        let fx = Fixture::new();
        fx.add("c1", &["alpha"]);
        assert!(matches!(
            fx.search("alpha", Some(NodeId::new(999).unwrap())),
            Err(IndexError::CategoryNotFound { .. })
        ));
    }

    #[test]
    fn custom_ranker_is_used() {
        struct ReverseUri;
        impl Ranker for ReverseUri {
            fn rank(&self, records: &mut [ContentRecord]) {
                records.sort_by(|a, b| b.uri.cmp(&a.uri));
            }
        }
        let fx = Fixture::new();
        fx.add("a", &["alpha"]);
        fx.add("b", &["alpha"]);
        let results = SearchEngine::new(&fx.graph, &fx.filter, &ReverseUri)
            .search("alpha", None)
            .unwrap();
        assert_eq!(results.uris(), vec!["b", "a"]);
    }
}
