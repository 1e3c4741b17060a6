//! Named query compilation and caching.
//!
//! S-expression queries are bundled at build time, one set per grammar, and
//! compiled lazily on first use. Capture names follow a dotted convention
//! (`alias.name`, `member.privacy`) which analyzers dispatch on.

use std::sync::Arc;

use dashmap::DashMap;
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator};

use cem_core::{CemError, Result};

use crate::grammar::Grammar;

macro_rules! bundled {
    ($dir:literal, $name:literal) => {
        ($name, include_str!(concat!("../queries/", $dir, "/", $name, ".scm")))
    };
}

static TYPESCRIPT_QUERIES: &[(&str, &str)] = &[
    bundled!("typescript", "classes"),
    bundled!("typescript", "classMembers"),
    bundled!("typescript", "decorators"),
    bundled!("typescript", "typeAliases"),
    bundled!("typescript", "imports"),
    bundled!("typescript", "exports"),
    bundled!("typescript", "taggedTemplates"),
    bundled!("typescript", "jsdoc"),
    bundled!("typescript", "defineCalls"),
];

static JAVASCRIPT_QUERIES: &[(&str, &str)] = &[
    bundled!("javascript", "classes"),
    bundled!("javascript", "classMembers"),
    bundled!("javascript", "decorators"),
    bundled!("javascript", "typeAliases"),
    bundled!("javascript", "imports"),
    bundled!("javascript", "exports"),
    bundled!("javascript", "taggedTemplates"),
    bundled!("javascript", "jsdoc"),
    bundled!("javascript", "defineCalls"),
];

static HTML_QUERIES: &[(&str, &str)] = &[
    bundled!("html", "customElements"),
    bundled!("html", "microdata"),
];

static CSS_QUERIES: &[(&str, &str)] = &[bundled!("css", "customProperties")];

fn bundled_set(grammar: Grammar) -> &'static [(&'static str, &'static str)] {
    match grammar.query_source() {
        Grammar::TypeScript | Grammar::Tsx => TYPESCRIPT_QUERIES,
        Grammar::Javascript => JAVASCRIPT_QUERIES,
        Grammar::Html => HTML_QUERIES,
        Grammar::Css => CSS_QUERIES,
    }
}

/// Compiles and caches named queries per grammar.
///
/// Bundled queries are a build-time contract: a malformed one panics with
/// the grammar and name. Runtime-constructed queries go through
/// [`QueryManager::compile_adhoc`] and report the offending text instead.
#[derive(Default)]
pub struct QueryManager {
    cache: DashMap<(Grammar, &'static str), Arc<Query>>,
}

impl QueryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled bundled query `name` for `grammar`, compiling
    /// and caching it on first use.
    ///
    /// # Panics
    ///
    /// Panics when `name` is not bundled for the grammar or when the
    /// bundled source fails to compile; both are programmer errors.
    pub fn get(&self, grammar: Grammar, name: &str) -> Arc<Query> {
        let &(key_name, source) = bundled_set(grammar)
            .iter()
            .find(|(n, _)| *n == name)
            .unwrap_or_else(|| panic!("no bundled query '{name}' for grammar {}", grammar.name()));

        if let Some(query) = self.cache.get(&(grammar, key_name)) {
            return Arc::clone(&query);
        }

        let query = Query::new(&grammar.language(), source).unwrap_or_else(|e| {
            panic!(
                "bundled query '{name}' failed to compile for {}: {e}",
                grammar.name()
            )
        });
        tracing::debug!(grammar = grammar.name(), name, "query compiled");
        let query = Arc::new(query);
        self.cache.insert((grammar, key_name), Arc::clone(&query));
        query
    }

    /// Compiles a caller-supplied query; failures carry the query text.
    pub fn compile_adhoc(&self, grammar: Grammar, name: &str, text: &str) -> Result<Query> {
        Query::new(&grammar.language(), text).map_err(|e| CemError::Query {
            name: name.to_string(),
            message: e.to_string(),
            text: text.to_string(),
        })
    }

    /// Drops every compiled query.
    pub fn close(&self) {
        self.cache.clear();
    }

    pub fn compiled_count(&self) -> usize {
        self.cache.len()
    }
}

/// One query match with its captured sub-nodes keyed by capture name.
pub struct QueryHit<'tree> {
    pub pattern: usize,
    captures: Vec<(String, Node<'tree>)>,
}

impl<'tree> QueryHit<'tree> {
    /// First capture with the given name.
    pub fn node(&self, name: &str) -> Option<Node<'tree>> {
        self.captures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| *node)
    }

    /// Every capture with the given name, in match order.
    pub fn nodes(&self, name: &str) -> impl Iterator<Item = Node<'tree>> + '_ {
        let name = name.to_string();
        self.captures
            .iter()
            .filter(move |(n, _)| *n == name)
            .map(|(_, node)| *node)
    }

    /// Source text of the first capture with the given name.
    pub fn text<'s>(&self, name: &str, source: &'s [u8]) -> Option<&'s str> {
        self.node(name).and_then(|n| n.utf8_text(source).ok())
    }
}

/// Runs `query` against `node` and collects every match.
///
/// Nodes are `Copy` handles into the tree, so collecting them out of the
/// streaming iterator is cheap; the hits stay valid as long as the tree.
pub fn run_query<'tree>(query: &Query, node: Node<'tree>, source: &[u8]) -> Vec<QueryHit<'tree>> {
    let names = query.capture_names();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, node, source);

    let mut hits = Vec::new();
    while let Some(m) = matches.next() {
        let captures = m
            .captures
            .iter()
            .map(|c| (names[c.index as usize].to_string(), c.node))
            .collect();
        hits.push(QueryHit {
            pattern: m.pattern_index,
            captures,
        });
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ParserPool;

    #[test]
    fn every_bundled_query_compiles() {
        let manager = QueryManager::new();
        for grammar in [
            Grammar::TypeScript,
            Grammar::Tsx,
            Grammar::Javascript,
            Grammar::Html,
            Grammar::Css,
        ] {
            for (name, _) in bundled_set(grammar) {
                let _ = manager.get(grammar, name);
            }
        }
        assert!(manager.compiled_count() > 0);
    }

    #[test]
    fn compiled_queries_are_cached() {
        let manager = QueryManager::new();
        let a = manager.get(Grammar::TypeScript, "classes");
        let b = manager.get(Grammar::TypeScript, "classes");
        assert!(Arc::ptr_eq(&a, &b));
        manager.close();
        assert_eq!(manager.compiled_count(), 0);
    }

    #[test]
    #[should_panic(expected = "no bundled query")]
    fn unknown_bundled_name_panics() {
        QueryManager::new().get(Grammar::Css, "nope");
    }

    #[test]
    fn adhoc_compile_reports_text() {
        let manager = QueryManager::new();
        let err = manager
            .compile_adhoc(Grammar::TypeScript, "broken", "(not_a_node_kind) @x")
            .unwrap_err();
        match err {
            CemError::Query { name, text, .. } => {
                assert_eq!(name, "broken");
                assert!(text.contains("not_a_node_kind"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn class_query_matches() {
        let pool = ParserPool::new();
        let source = b"export class MyButton extends LitElement {}";
        let tree = pool.parse(Grammar::TypeScript, source).unwrap();
        let manager = QueryManager::new();
        let query = manager.get(Grammar::TypeScript, "classes");

        let hits = run_query(&query, tree.root_node(), source);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text("class.name", source), Some("MyButton"));
        assert!(hits[0].node("class.definition").is_some());
    }

    #[test]
    fn tagged_template_query_matches() {
        let pool = ParserPool::new();
        let source = b"const tpl = html`<my-button></my-button>`;";
        let tree = pool.parse(Grammar::TypeScript, source).unwrap();
        let manager = QueryManager::new();
        let query = manager.get(Grammar::TypeScript, "taggedTemplates");

        let hits = run_query(&query, tree.root_node(), source);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text("template.tag", source), Some("html"));
    }

    #[test]
    fn html_tag_query_matches() {
        let pool = ParserPool::new();
        let source = b"<my-card><span>hi</span></my-card>";
        let tree = pool.parse(Grammar::Html, source).unwrap();
        let manager = QueryManager::new();
        let query = manager.get(Grammar::Html, "customElements");

        let hits = run_query(&query, tree.root_node(), source);
        let names: Vec<_> = hits
            .iter()
            .filter_map(|h| h.text("tag.name", source))
            .collect();
        assert!(names.contains(&"my-card"));
        assert!(names.contains(&"span"));
    }
}
