//! Tree-sitter plumbing for cem.
//!
//! Owns the two resources every analysis pass leans on:
//!
//! - **Parser pool**: reusable parsers keyed by grammar, borrowed through a
//!   guard that returns them on every exit path
//! - **Query manager**: bundled S-expression queries compiled once per
//!   grammar and name, with dotted capture names for analyzer dispatch

pub mod grammar;
pub mod pool;
pub mod queries;

pub use grammar::Grammar;
pub use pool::{ParserPool, PooledParser};
pub use queries::{run_query, QueryHit, QueryManager};
