//! Query execution: operator trees over a [`Graph`](crate::Graph).
//!
//! Each plan node implements [`QueryOperator`]. Leaves ([`TripleNode`]) read
//! from the graph; inner nodes ([`UnionNode`], [`JoinNode`]) combine the
//! streams of their children. Plans are composed by the caller; there is no
//! query parser.

pub mod triple_node;
pub mod union;
pub mod join;

use std::fmt;

use serde_json::{json, Map, Value as JsonValue};

use crate::model::{BindingsGroup, Term};
use crate::storage::DEFAULT_BUFFER_SIZE;
use crate::stream::{BindingsStream, ResultSender};
use crate::Result;

pub use join::JoinNode;
pub use triple_node::TripleNode;
pub use union::UnionNode;

/// A node of a query execution plan.
///
/// Streams returned by `execute` and `execute_with` are fed by background
/// tasks, so both must be called from within a Tokio runtime.
pub trait QueryOperator: Send + Sync + fmt::Display {
    /// Produce this operator's bindings with no outside constraint.
    fn execute(&self) -> BindingsStream;

    /// Produce bindings compatible with `group`. Every emitted group is a
    /// clone of `group` extended with this operator's own bindings.
    fn execute_with(&self, group: BindingsGroup) -> BindingsStream;

    /// Sorted, deduplicated names of the variables this operator binds.
    fn binding_names(&self) -> Vec<String>;

    /// Capacity of the channel behind this operator's output streams.
    fn buffer_size(&self) -> usize {
        DEFAULT_BUFFER_SIZE
    }
}

/// Sorted union of two name lists.
pub(crate) fn merge_names(mut left: Vec<String>, right: Vec<String>) -> Vec<String> {
    left.extend(right);
    left.sort();
    left.dedup();
    left
}

/// Forward every item of `stream` into `tx`.
///
/// Returns `false` once the receiving side has gone away.
pub(crate) async fn forward(mut stream: BindingsStream, tx: &ResultSender<BindingsGroup>) -> bool {
    while let Some(item) = stream.next().await {
        if tx.send(item).await.is_err() {
            return false;
        }
    }
    true
}

// ============================================================================
// Query results
// ============================================================================

/// Fully drained output of an operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<BindingsGroup>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values bound to `column`, one per row that binds it.
    pub fn column(&self, column: &str) -> Vec<&Term> {
        self.rows.iter().filter_map(|row| row.get(column)).collect()
    }

    /// Render as the W3C SPARQL 1.1 Query Results JSON format.
    pub fn to_sparql_json(&self) -> JsonValue {
        let bindings: Vec<JsonValue> = self
            .rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for column in &self.columns {
                    if let Some(value) = row.get(column).and_then(term_to_json) {
                        obj.insert(column.clone(), value);
                    }
                }
                JsonValue::Object(obj)
            })
            .collect();
        json!({
            "head": { "vars": self.columns },
            "results": { "bindings": bindings },
        })
    }

    pub fn to_sparql_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_sparql_json())?)
    }
}

fn term_to_json(term: &Term) -> Option<JsonValue> {
    match term {
        Term::Resource(iri) => Some(json!({ "type": "uri", "value": iri })),
        Term::BlankNode(label) => Some(json!({ "type": "bnode", "value": label })),
        Term::Literal(lit) => {
            let mut obj = Map::new();
            obj.insert("type".into(), json!("literal"));
            obj.insert("value".into(), json!(lit.value));
            if let Some(lang) = &lit.language {
                obj.insert("xml:lang".into(), json!(lang));
            } else if let Some(dt) = &lit.datatype {
                obj.insert("datatype".into(), json!(dt));
            }
            Some(JsonValue::Object(obj))
        }
        Term::Variable(_) => None,
    }
}

/// Run `op` to completion and gather its bindings.
pub async fn collect(op: &dyn QueryOperator) -> Result<QueryResult> {
    let columns = op.binding_names();
    let rows = op.execute().try_collect().await?;
    tracing::debug!(plan = %op, rows = rows.len(), "query complete");
    Ok(QueryResult { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_names() {
        let merged = merge_names(
            vec!["s".into(), "x".into()],
            vec!["a".into(), "x".into()],
        );
        assert_eq!(merged, vec!["a", "s", "x"]);
    }

    #[test]
    fn test_sparql_json() {
        let result = QueryResult {
            columns: vec!["name".into(), "who".into()],
            rows: vec![
                BindingsGroup::new()
                    .with("who", Term::resource("http://ex.org/alice"))
                    .with("name", Term::lang_literal("Alice", "en")),
                BindingsGroup::new().with("who", Term::blank("b0")),
            ],
        };
        let json = result.to_sparql_json();
        assert_eq!(json["head"]["vars"], json!(["name", "who"]));
        assert_eq!(
            json["results"]["bindings"][0],
            json!({
                "name": { "type": "literal", "value": "Alice", "xml:lang": "en" },
                "who": { "type": "uri", "value": "http://ex.org/alice" },
            })
        );
        assert_eq!(
            json["results"]["bindings"][1],
            json!({ "who": { "type": "bnode", "value": "b0" } })
        );
        assert!(result.to_sparql_json_string().unwrap().contains("\"bindings\""));
    }
}
