//! RDF terms: resources, literals, blank nodes and query variables.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An RDF literal with an optional datatype IRI or language tag.
///
/// A literal never carries both: a language-tagged string is implicitly
/// `rdf:langString`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Literal {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), datatype: None, language: None }
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self { value: value.into(), datatype: Some(datatype.into()), language: None }
    }

    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self { value: value.into(), datatype: None, language: Some(language.into()) }
    }
}

/// A node of an RDF graph or of a triple pattern.
///
/// `Hash`/`Eq` are structural so terms can key the dictionary. For the
/// checked comparison that rejects mismatched kinds, see [`Term::equals`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Term {
    /// An IRI.
    Resource(String),
    Literal(Literal),
    /// A blank node, identified by its label.
    BlankNode(String),
    /// A query variable, identified by its name without the leading `?`.
    Variable(String),
}

impl Term {
    pub fn resource(iri: impl Into<String>) -> Self {
        Term::Resource(iri.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal::new(value))
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Literal::typed(value, datatype))
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal(Literal::lang(value, language))
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Term::BlankNode(label.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Term::Resource(_) => "RESOURCE",
            Term::Literal(_) => "LITERAL",
            Term::BlankNode(_) => "BLANK_NODE",
            Term::Variable(_) => "VARIABLE",
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    /// Variables and blank nodes both match any term in a pattern.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Term::Variable(_) | Term::BlankNode(_))
    }

    /// The variable name, if this term is a variable.
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Term::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// Checked equality.
    ///
    /// Terms of different kinds are not comparable: the result is
    /// `Error::TypeError`, never a silent `false`.
    pub fn equals(&self, other: &Term) -> Result<bool> {
        match (self, other) {
            (Term::Resource(a), Term::Resource(b)) => Ok(a == b),
            (Term::Literal(a), Term::Literal(b)) => Ok(a == b),
            (Term::BlankNode(a), Term::BlankNode(b)) => Ok(a == b),
            (Term::Variable(a), Term::Variable(b)) => Ok(a == b),
            _ => Err(Error::TypeError {
                expected: self.kind_name().into(),
                got: other.kind_name().into(),
            }),
        }
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

/// Escape an IRI for N-Triples. Characters that cannot appear between
/// `<` and `>` are written as `\uXXXX`.
pub(crate) fn escape_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len());
    for c in iri.chars() {
        match c {
            c if c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | '"' | '\\') => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

/// Escape a lexical form for an N-Triples string literal.
pub(crate) fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// N-Triples syntax; variables render as `?name`.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Resource(iri) => write!(f, "<{}>", escape_iri(iri)),
            Term::BlankNode(label) => write!(f, "_:{label}"),
            Term::Variable(name) => write!(f, "?{name}"),
            Term::Literal(lit) => {
                write!(f, "\"{}\"", escape_literal(&lit.value))?;
                if let Some(lang) = &lit.language {
                    write!(f, "@{lang}")
                } else if let Some(dt) = &lit.datatype {
                    write!(f, "^^<{}>", escape_iri(dt))
                } else {
                    Ok(())
                }
            }
        }
    }
}
