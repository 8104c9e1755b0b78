//! # rdf-trie: In-memory RDF store with streaming SPARQL operators
//!
//! Triples are dictionary-encoded and stored as paths in a three-level
//! bitmap trie (after the HDT-MR model). Basic graph patterns are evaluated
//! by a tree of operators that exchange bindings over async streams.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `Graph` is the contract between operators and storage
//! 2. **Plain data**: `Term`, `Triple`, `BindingsGroup` cross all boundaries
//! 3. **Streams everywhere**: every producer is a task writing into a bounded
//!    channel; dropping a stream cancels its producer
//! 4. **No query text**: plans are built by composing operators directly
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rdf_trie::{Graph, HdtGraph, QueryOperator, Term, Triple, TripleNode};
//!
//! # async fn example() -> rdf_trie::Result<()> {
//! let graph = Arc::new(HdtGraph::new());
//! let ex = |l: &str| Term::resource(format!("http://example.org/{l}"));
//!
//! graph.add(Triple::new(ex("alice"), ex("knows"), ex("bob"))).await?;
//!
//! let pattern = Triple::new(ex("alice"), ex("knows"), Term::var("friend"));
//! let node = TripleNode::new(pattern, graph.clone());
//! for group in node.execute().try_collect().await? {
//!     println!("{group}");
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod stream;
pub mod storage;
pub mod execution;
pub mod parser;
pub mod export;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{BindingsGroup, Literal, Term, Triple};

pub use stream::{BindingsStream, ResultStream, TripleStream};

pub use storage::{Graph, GraphConfig, HdtGraph};

pub use execution::{
    collect, JoinNode, QueryOperator, QueryResult, TripleNode, UnionNode,
};

pub use parser::{load_ntriples, NTriplesReader};

pub use export::export_ntriples;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("N-Triples syntax error at line {line}, column {column}: {message}")]
    Syntax { line: usize, column: usize, message: String },

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Invalid triple: {0}")]
    InvalidTriple(String),

    #[error("Store corrupted: {0}")]
    Corrupted(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
