//! BindingsGroup: one (partial) solution of a graph pattern.

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::Term;

/// Variable name → bound term.
///
/// `Clone` is a deep copy: operators clone a group before extending it so
/// that sibling branches never observe each other's bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingsGroup {
    bindings: HashMap<String, Term>,
}

impl BindingsGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, term: Term) -> Self {
        self.insert(name, term);
        self
    }

    /// Bind `name`, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, term: Term) -> Option<Term> {
        self.bindings.insert(name.into(), term)
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Bound variable names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.keys().cloned().collect();
        names.sort();
        names
    }
}

impl<K: Into<String>> FromIterator<(K, Term)> for BindingsGroup {
    fn from_iter<I: IntoIterator<Item = (K, Term)>>(iter: I) -> Self {
        Self { bindings: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

impl fmt::Display for BindingsGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, name) in self.names().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if let Some(term) = self.bindings.get(name) {
                write!(f, "?{name} -> {term}")?;
            }
        }
        write!(f, "}}")
    }
}
