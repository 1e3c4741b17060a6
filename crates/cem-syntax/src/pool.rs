//! Parser pooling.
//!
//! Constructing a tree-sitter parser and binding a language is cheap but not
//! free; reusing one across parses is an order-of-magnitude win on short
//! files. The pool hands out parsers keyed by grammar through a guard that
//! returns them on drop, so every exit path releases.
//!
//! Individual parsers are stateful and not concurrency-safe; the guard must
//! stay on the thread that checked it out and must not be held across
//! suspension points.

use std::sync::Arc;

use dashmap::DashMap;
use tree_sitter::{Parser, Tree};

use crate::grammar::Grammar;

/// Idle parsers retained per grammar; returns beyond this are dropped.
const MAX_IDLE_PER_GRAMMAR: usize = 8;

#[derive(Default)]
struct PoolInner {
    free: DashMap<Grammar, Vec<Parser>>,
}

/// A pool of reusable tree-sitter parsers, keyed by grammar.
///
/// The pool itself is concurrency-safe and unbounded: `checkout` always
/// succeeds, constructing a fresh parser when no idle one is available.
#[derive(Clone, Default)]
pub struct ParserPool {
    inner: Arc<PoolInner>,
}

impl ParserPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows a parser for `grammar`. The returned guard gives mutable
    /// access to the parser and returns it to the pool when dropped.
    pub fn checkout(&self, grammar: Grammar) -> PooledParser {
        let parser = self
            .inner
            .free
            .get_mut(&grammar)
            .and_then(|mut list| list.pop())
            .unwrap_or_else(|| {
                let mut parser = Parser::new();
                parser
                    .set_language(&grammar.language())
                    .expect("bundled grammar must be ABI-compatible");
                parser
            });

        PooledParser {
            parser: Some(parser),
            grammar,
            pool: Arc::clone(&self.inner),
        }
    }

    /// Convenience: parse `source` with a pooled parser for `grammar`.
    ///
    /// Returns `None` when tree-sitter produces no tree (cancelled parse or
    /// pathological input); callers surface that as a parse error.
    pub fn parse(&self, grammar: Grammar, source: &[u8]) -> Option<Tree> {
        let mut parser = self.checkout(grammar);
        parser.parse(source, None)
    }

    /// Number of idle parsers currently retained for `grammar`.
    pub fn idle_count(&self, grammar: Grammar) -> usize {
        self.inner.free.get(&grammar).map_or(0, |list| list.len())
    }

    /// Releases every idle parser.
    pub fn clear(&self) {
        self.inner.free.clear();
    }
}

/// Borrow guard for a pooled parser.
///
/// Dereferences to [`tree_sitter::Parser`]; dropping it returns the parser
/// to the pool (or discards it past the idle cap).
pub struct PooledParser {
    parser: Option<Parser>,
    grammar: Grammar,
    pool: Arc<PoolInner>,
}

impl std::ops::Deref for PooledParser {
    type Target = Parser;

    fn deref(&self) -> &Parser {
        self.parser.as_ref().expect("parser present until drop")
    }
}

impl std::ops::DerefMut for PooledParser {
    fn deref_mut(&mut self) -> &mut Parser {
        self.parser.as_mut().expect("parser present until drop")
    }
}

impl Drop for PooledParser {
    fn drop(&mut self) {
        if let Some(mut parser) = self.parser.take() {
            parser.reset();
            let mut list = self.pool.free.entry(self.grammar).or_default();
            if list.len() < MAX_IDLE_PER_GRAMMAR {
                list.push(parser);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_and_return() {
        let pool = ParserPool::new();
        assert_eq!(pool.idle_count(Grammar::TypeScript), 0);
        {
            let _parser = pool.checkout(Grammar::TypeScript);
            assert_eq!(pool.idle_count(Grammar::TypeScript), 0);
        }
        assert_eq!(pool.idle_count(Grammar::TypeScript), 1);
    }

    #[test]
    fn reuses_idle_parser() {
        let pool = ParserPool::new();
        drop(pool.checkout(Grammar::Html));
        assert_eq!(pool.idle_count(Grammar::Html), 1);
        let _parser = pool.checkout(Grammar::Html);
        assert_eq!(pool.idle_count(Grammar::Html), 0);
    }

    #[test]
    fn idle_cap_bounds_retention() {
        let pool = ParserPool::new();
        let guards: Vec<_> = (0..MAX_IDLE_PER_GRAMMAR + 4)
            .map(|_| pool.checkout(Grammar::Css))
            .collect();
        drop(guards);
        assert_eq!(pool.idle_count(Grammar::Css), MAX_IDLE_PER_GRAMMAR);
    }

    #[test]
    fn parses_source() {
        let pool = ParserPool::new();
        let tree = pool
            .parse(Grammar::TypeScript, b"class A extends HTMLElement {}")
            .unwrap();
        assert_eq!(tree.root_node().kind(), "program");
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn grammars_are_isolated() {
        let pool = ParserPool::new();
        drop(pool.checkout(Grammar::Html));
        drop(pool.checkout(Grammar::Css));
        assert_eq!(pool.idle_count(Grammar::Html), 1);
        assert_eq!(pool.idle_count(Grammar::Css), 1);
        pool.clear();
        assert_eq!(pool.idle_count(Grammar::Html), 0);
    }
}
