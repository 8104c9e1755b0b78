//! RDF triple, also used as a triple pattern when it holds variables.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Term;
use crate::Result;

/// (subject, predicate, object).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self { subject, predicate, object }
    }

    /// Componentwise checked equality, stopping at the first component that
    /// differs or cannot be compared.
    pub fn equals(&self, other: &Triple) -> Result<bool> {
        for (a, b) in self.terms().into_iter().zip(other.terms()) {
            if !a.equals(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn terms(&self) -> [&Term; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    pub fn into_terms(self) -> [Term; 3] {
        [self.subject, self.predicate, self.object]
    }

    /// True if any position holds a variable.
    pub fn is_pattern(&self) -> bool {
        self.terms().iter().any(|t| t.is_variable())
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(local: &str) -> Term {
        Term::resource(format!("http://example.org/{local}"))
    }

    #[test]
    fn test_equals() {
        let a = Triple::new(ex("s"), ex("p"), ex("o"));
        assert!(a.equals(&a.clone()).unwrap());
        assert!(!a.equals(&Triple::new(ex("s"), ex("p"), ex("other"))).unwrap());
    }

    #[test]
    fn test_equals_short_circuits_on_first_difference() {
        // The subject differs, so the incomparable object is never examined.
        let a = Triple::new(ex("s1"), ex("p"), ex("o"));
        let b = Triple::new(ex("s2"), ex("p"), Term::var("o"));
        assert!(!a.equals(&b).unwrap());
    }

    #[test]
    fn test_equals_incomparable_component() {
        let a = Triple::new(ex("s"), ex("p"), ex("o"));
        let b = Triple::new(ex("s"), ex("p"), Term::var("o"));
        assert!(a.equals(&b).is_err());
    }

    #[test]
    fn test_is_pattern() {
        assert!(Triple::new(Term::var("s"), ex("p"), ex("o")).is_pattern());
        assert!(!Triple::new(ex("s"), ex("p"), Term::blank("b")).is_pattern());
    }
}
