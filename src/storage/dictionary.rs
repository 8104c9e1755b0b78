//! Term dictionary: a bijection between compact ids and RDF terms.
//!
//! The dictionary does no locking of its own; the owning graph guards it.

use hashbrown::HashMap;

use crate::model::Term;

/// Compact term identifier, assigned by the graph in insertion order.
pub type TermId = u64;

/// Bidirectional id ↔ term map.
#[derive(Debug, Default)]
pub struct Dictionary {
    id_to_term: HashMap<TermId, Term>,
    term_to_id: HashMap<Term, TermId>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `id ↔ term`.
    ///
    /// If either side already took part in a relation, that relation is
    /// dropped first, so the map stays a bijection.
    pub fn push(&mut self, id: TermId, term: Term) {
        if let Some(stale_term) = self.id_to_term.remove(&id) {
            self.term_to_id.remove(&stale_term);
        }
        if let Some(stale_id) = self.term_to_id.remove(&term) {
            self.id_to_term.remove(&stale_id);
        }
        self.id_to_term.insert(id, term.clone());
        self.term_to_id.insert(term, id);
    }

    /// Reverse lookup.
    pub fn locate(&self, term: &Term) -> Option<TermId> {
        self.term_to_id.get(term).copied()
    }

    /// Forward lookup.
    pub fn extract(&self, id: TermId) -> Option<&Term> {
        self.id_to_term.get(&id)
    }

    pub fn len(&self) -> usize {
        self.id_to_term.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_term.is_empty()
    }
}
