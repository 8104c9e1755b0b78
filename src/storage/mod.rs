//! # Graph Storage
//!
//! [`Graph`] is the contract between the query operators and any triple
//! store. Operators never see the index; they only call `filter` and
//! `filter_subset`.
//!
//! ## Implementations
//!
//! | Graph | Module | Description |
//! |-------|--------|-------------|
//! | `HdtGraph` | `hdt` | Dictionary + bitmap trie, concurrent traversal |

pub mod dictionary;
pub mod trie;
pub mod task_group;
pub mod hdt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Term, Triple};
use crate::stream::{ResultStream, TripleStream};
use crate::{Error, Result};

pub use dictionary::{Dictionary, TermId};
pub use hdt::HdtGraph;
pub use task_group::{TaskGroup, WorkUnit};
pub use trie::{PatternSlot, Trie};

// ============================================================================
// Configuration
// ============================================================================

/// Capacity of result channels when nothing else is configured.
pub const DEFAULT_BUFFER_SIZE: usize = 64;

/// Graph configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Capacity of every result channel opened by the graph and by the
    /// operators reading from it.
    pub buffer_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { buffer_size: DEFAULT_BUFFER_SIZE }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::Config("buffer_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GraphConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Graph Trait
// ============================================================================

/// The triple store contract.
///
/// Streams returned by `filter` yield every match and then close. Dropping a
/// stream early cancels the traversal behind it.
#[async_trait]
pub trait Graph: Send + Sync + 'static {
    /// Add a triple. Re-adding an existing triple is a no-op.
    ///
    /// Variables are not valid data and are rejected.
    async fn add(&self, triple: Triple) -> Result<()>;

    /// Delete the triples matching a pattern, returning how many were removed.
    ///
    /// A blank node at some position removes everything below the prefix
    /// matched so far, whatever the remaining positions hold. A variable
    /// matches any term at its position. Matching nothing is not an error.
    async fn delete(&self, subject: &Term, predicate: &Term, object: &Term) -> Result<usize>;

    /// Stream every stored triple matching a pattern. Variables and blank
    /// nodes match any term.
    async fn filter(&self, subject: &Term, predicate: &Term, object: &Term) -> TripleStream;

    /// Like [`filter`](Self::filter), restricted to `limit` results (all if
    /// `None`) after skipping `offset`, in emission order.
    ///
    /// Emission order depends on scheduling, so the window is not stable
    /// across calls.
    async fn filter_subset(
        &self,
        subject: &Term,
        predicate: &Term,
        object: &Term,
        limit: Option<usize>,
        offset: usize,
    ) -> TripleStream {
        if limit == Some(0) {
            return ResultStream::empty();
        }
        let mut inner = self.filter(subject, predicate, object).await;
        let (tx, out) = ResultStream::channel(self.buffer_size());
        tokio::spawn(async move {
            let mut skipped = 0;
            let mut sent = 0;
            while let Some(item) = inner.next().await {
                match item {
                    Ok(_) if skipped < offset => skipped += 1,
                    Ok(triple) => {
                        if tx.send(Ok(triple)).await.is_err() {
                            break;
                        }
                        sent += 1;
                        if limit.is_some_and(|l| sent >= l) {
                            break;
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(Err(err)).await;
                        break;
                    }
                }
            }
            // `inner` is dropped here, which cancels any remaining traversal.
        });
        out
    }

    /// Stream every stored triple. This is the read access serializers use.
    async fn triples(&self) -> TripleStream {
        self.filter(&Term::var("s"), &Term::var("p"), &Term::var("o")).await
    }

    /// Number of stored triples.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Add several triples, returning how many were handed in.
    ///
    /// Default falls back to sequential `add` calls.
    async fn add_all(&self, triples: Vec<Triple>) -> Result<usize> {
        let count = triples.len();
        for triple in triples {
            self.add(triple).await?;
        }
        Ok(count)
    }

    /// Channel capacity operators should use when reading from this graph.
    fn buffer_size(&self) -> usize {
        DEFAULT_BUFFER_SIZE
    }
}
