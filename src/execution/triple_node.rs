//! Leaf operator: one triple pattern evaluated against a graph.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::model::{BindingsGroup, Term, Triple};
use crate::storage::Graph;
use crate::stream::{BindingsStream, ResultStream};
use super::QueryOperator;

/// `(position in the triple, variable name)` for each unbound variable.
type FreeVars = SmallVec<[(usize, String); 3]>;

/// Evaluates a triple pattern, turning each matching triple into bindings
/// for the pattern's variables.
pub struct TripleNode {
    pattern: Triple,
    graph: Arc<dyn Graph>,
    limit: Option<usize>,
    offset: usize,
}

impl TripleNode {
    pub fn new(pattern: Triple, graph: Arc<dyn Graph>) -> Self {
        Self { pattern, graph, limit: None, offset: 0 }
    }

    /// Only return `limit` matches (all if `None`) after skipping `offset`.
    pub fn with_window(mut self, limit: Option<usize>, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn pattern(&self) -> &Triple {
        &self.pattern
    }

    /// Query `pattern` and bind its variables on top of `base`.
    fn run(&self, base: BindingsGroup, pattern: Triple) -> BindingsStream {
        let free: FreeVars = pattern
            .terms()
            .iter()
            .enumerate()
            .filter_map(|(pos, term)| term.as_variable().map(|name| (pos, name.to_owned())))
            .collect();
        let (tx, out) = ResultStream::channel(self.graph.buffer_size());
        let graph = Arc::clone(&self.graph);
        let (limit, offset) = (self.limit, self.offset);

        tokio::spawn(async move {
            let [s, p, o] = pattern.terms();
            let mut triples = graph.filter_subset(s, p, o, limit, offset).await;
            while let Some(item) = triples.next().await {
                let group = match item {
                    Ok(triple) => match bind(&base, &free, &triple) {
                        Some(group) => group,
                        None => continue,
                    },
                    Err(err) => {
                        let _ = tx.send(Err(err)).await;
                        return;
                    }
                };
                if tx.send(Ok(group)).await.is_err() {
                    return;
                }
            }
        });
        out
    }
}

/// Clone `base` and bind each free variable to the matching position of
/// `triple`. `None` if a repeated variable would take two different values.
fn bind(base: &BindingsGroup, free: &FreeVars, triple: &Triple) -> Option<BindingsGroup> {
    let terms = triple.terms();
    let mut group = base.clone();
    for (pos, name) in free {
        let term = terms[*pos];
        match group.get(name) {
            Some(bound) if bound != term => return None,
            Some(_) => {}
            None => {
                group.insert(name.clone(), term.clone());
            }
        }
    }
    Some(group)
}

impl QueryOperator for TripleNode {
    fn execute(&self) -> BindingsStream {
        self.run(BindingsGroup::new(), self.pattern.clone())
    }

    fn execute_with(&self, group: BindingsGroup) -> BindingsStream {
        // Narrow the pattern with the values `group` already provides. A blank
        // node would act as a wildcard in the store, so those positions stay
        // variables and `bind` checks them against the group instead.
        let substitute = |term: &Term| match term.as_variable().and_then(|name| group.get(name)) {
            Some(bound) if !bound.is_blank() => bound.clone(),
            _ => term.clone(),
        };
        let narrowed = Triple::new(
            substitute(&self.pattern.subject),
            substitute(&self.pattern.predicate),
            substitute(&self.pattern.object),
        );
        self.run(group, narrowed)
    }

    fn binding_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .pattern
            .terms()
            .iter()
            .filter_map(|t| t.as_variable().map(str::to_owned))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn buffer_size(&self) -> usize {
        self.graph.buffer_size()
    }
}

/// Two leaves are equal when their patterns are.
impl PartialEq for TripleNode {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.equals(&other.pattern).unwrap_or(false)
    }
}

impl fmt::Display for TripleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Triple({})", self.pattern)
    }
}
