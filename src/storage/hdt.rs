//! HDT graph: dictionary + bitmap trie, after the HDT-MR model.
//!
//! Every term is registered in a [`Dictionary`] and each triple becomes a
//! root → s → p → o path of ids in a [`Trie`]. Pattern matching descends the
//! trie and spawns one task per child wherever the pattern has a wildcard.
//!
//! ## Locking
//!
//! Dictionary and trie sit behind one readers-writer lock:
//!
//! - `add` / `delete` take it exclusively.
//! - `filter` takes a shared guard when called and moves it into the
//!   traversal; it is released when the last traversal task finishes. A
//!   mutation issued after `filter` returns waits for that traversal.
//! - Independent `filter` calls run in parallel. The lock is fair, so a
//!   queued writer is not starved by later readers.

use std::sync::Arc;

use async_trait::async_trait;
use smallvec::SmallVec;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};
use tracing::{debug, error, trace, warn};

use crate::model::{Term, Triple};
use crate::stream::{ResultSender, ResultStream, TripleStream};
use crate::{Error, Result};
use super::dictionary::{Dictionary, TermId};
use super::task_group::TaskGroup;
use super::trie::{NodeIndex, PatternSlot, Trie, DEPTH, ROOT};
use super::{Graph, GraphConfig};

// ============================================================================
// HdtGraph
// ============================================================================

/// In-memory RDF graph indexed by a dictionary-encoded trie.
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct HdtGraph {
    inner: Arc<RwLock<HdtInner>>,
    config: GraphConfig,
}

#[derive(Debug, Default)]
struct HdtInner {
    dictionary: Dictionary,
    trie: Trie,
    /// Next id to hand out. Ids are never reused.
    next_id: TermId,
}

impl HdtInner {
    /// Id of `term`, registering it first if needed.
    fn register(&mut self, term: Term) -> TermId {
        if let Some(id) = self.dictionary.locate(&term) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.dictionary.push(id, term);
        id
    }
}

impl Default for HdtGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl HdtGraph {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HdtInner::default())),
            config: GraphConfig::default(),
        }
    }

    /// Create a graph with a validated configuration.
    pub fn with_config(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, ..Self::new() })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Number of terms ever registered and still mapped.
    pub async fn dictionary_len(&self) -> usize {
        self.inner.read().await.dictionary.len()
    }

    /// Dictionary id of a term, if registered.
    pub async fn term_id(&self, term: &Term) -> Option<TermId> {
        self.inner.read().await.dictionary.locate(term)
    }

    #[cfg(test)]
    async fn corrupt_dictionary(&self, term: &Term) {
        let mut inner = self.inner.write().await;
        if let Some(id) = inner.dictionary.locate(term) {
            // Re-point the id at a placeholder, then move the placeholder to an
            // unused id: the trie keeps referencing an id that is now unmapped.
            inner.dictionary.push(id, Term::blank("__corrupt__"));
            let dangling = inner.next_id + 1_000;
            inner.dictionary.push(dangling, Term::blank("__corrupt__"));
        }
    }
}

// ============================================================================
// Pattern resolution
// ============================================================================

/// Slots for a delete pattern, or `None` if a bound term that matters is
/// unknown (nothing can match).
fn delete_slots(dictionary: &Dictionary, pattern: [&Term; DEPTH]) -> Option<[PatternSlot; DEPTH]> {
    let mut slots = [PatternSlot::Any; DEPTH];
    for (level, term) in pattern.into_iter().enumerate() {
        match term {
            Term::BlankNode(_) => {
                // Everything below is removed whatever the remaining terms are.
                slots[level] = PatternSlot::Collapse;
                break;
            }
            Term::Variable(_) => {}
            bound => slots[level] = PatternSlot::Bound(dictionary.locate(bound)?),
        }
    }
    Some(slots)
}

/// Slots for a query pattern, or `None` if a bound term is unknown.
fn query_slots(dictionary: &Dictionary, pattern: [&Term; DEPTH]) -> Option<[PatternSlot; DEPTH]> {
    let mut slots = [PatternSlot::Any; DEPTH];
    for (level, term) in pattern.into_iter().enumerate() {
        if !term.is_wildcard() {
            slots[level] = PatternSlot::Bound(dictionary.locate(term)?);
        }
    }
    Some(slots)
}

// ============================================================================
// Traversal
// ============================================================================

/// Shared state of one `filter` call.
///
/// Owns the read guard and the only sender of the result channel, so both
/// the lock and the stream are released when the last task drops its handle.
struct Traversal {
    store: OwnedRwLockReadGuard<HdtInner>,
    slots: [PatternSlot; DEPTH],
    out: ResultSender<Triple>,
    group: Arc<TaskGroup>,
}

type Path = SmallVec<[TermId; DEPTH]>;

impl Traversal {
    /// Schedule a descent from `node`, counted before it is spawned.
    fn spawn_descent(self: &Arc<Self>, node: NodeIndex, path: Path) {
        let unit = self.group.unit();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _unit = unit;
            this.descend(node, path).await;
        });
    }

    /// Walk down through bound levels in this task; fan out at the first
    /// wildcard level.
    async fn descend(self: &Arc<Self>, mut node: NodeIndex, mut path: Path) {
        while !self.group.is_stopped() {
            let depth = path.len();
            if depth == DEPTH {
                self.emit(&path).await;
                return;
            }
            match self.slots[depth] {
                PatternSlot::Bound(id) => match self.store.trie.child(node, id) {
                    Some(next) => {
                        path.push(id);
                        node = next;
                    }
                    None => return,
                },
                PatternSlot::Any | PatternSlot::Collapse => {
                    trace!(depth, node, "fan out");
                    for (id, child) in self.store.trie.children(node) {
                        let mut next = path.clone();
                        next.push(id);
                        self.spawn_descent(child, next);
                    }
                    return;
                }
            }
        }
    }

    async fn emit(&self, path: &[TermId]) {
        match self.resolve(path) {
            Ok(triple) => {
                if self.out.send(Ok(triple)).await.is_err() {
                    if !self.group.is_stopped() {
                        warn!("filter stream dropped before completion, cancelling traversal");
                    }
                    self.group.cancel();
                }
            }
            Err(err) => {
                error!(%err, "aborting traversal");
                self.group.fail(err);
            }
        }
    }

    fn resolve(&self, path: &[TermId]) -> Result<Triple> {
        let term = |id: TermId| {
            self.store.dictionary.extract(id).cloned().ok_or_else(|| {
                Error::Corrupted(format!("trie references term id {id} missing from the dictionary"))
            })
        };
        Ok(Triple::new(term(path[0])?, term(path[1])?, term(path[2])?))
    }
}

// ============================================================================
// Graph impl
// ============================================================================

#[async_trait]
impl Graph for HdtGraph {
    async fn add(&self, triple: Triple) -> Result<()> {
        if triple.is_pattern() {
            return Err(Error::InvalidTriple(format!("variables cannot be stored: {triple}")));
        }
        let mut inner = self.inner.write().await;
        let [s, p, o] = triple.into_terms();
        let path = [inner.register(s), inner.register(p), inner.register(o)];
        let created = inner.trie.insert(path);
        debug!(?path, created, "add");
        Ok(())
    }

    async fn delete(&self, subject: &Term, predicate: &Term, object: &Term) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let Some(slots) = delete_slots(&inner.dictionary, [subject, predicate, object]) else {
            debug!(%subject, %predicate, %object, "delete matched nothing");
            return Ok(0);
        };
        let removed = inner.trie.remove(&slots);
        debug!(?slots, removed, "delete");
        Ok(removed)
    }

    async fn filter(&self, subject: &Term, predicate: &Term, object: &Term) -> TripleStream {
        let store = Arc::clone(&self.inner).read_owned().await;
        let (out, stream) = ResultStream::channel(self.config.buffer_size);
        let Some(slots) = query_slots(&store.dictionary, [subject, predicate, object]) else {
            debug!(%subject, %predicate, %object, "filter: unknown bound term");
            return stream;
        };
        debug!(%subject, %predicate, %object, "filter");

        let group = Arc::new(TaskGroup::new());
        let traversal = Arc::new(Traversal { store, slots, out, group: Arc::clone(&group) });
        traversal.spawn_descent(ROOT, Path::new());

        // Closer: deliver a recorded failure, then release the guard and the
        // sender by dropping the last handle.
        tokio::spawn(async move {
            group.wait().await;
            if let Some(err) = group.take_error() {
                let _ = traversal.out.send(Err(err)).await;
            }
            trace!("filter complete");
        });
        stream
    }

    async fn len(&self) -> usize {
        self.inner.read().await.trie.len()
    }

    fn buffer_size(&self) -> usize {
        self.config.buffer_size
    }
}

// ============================================================================
// Tests
// ============================================================================
