//! Union operator: the bindings of two sub-plans, merged concurrently.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::model::BindingsGroup;
use crate::storage::TaskGroup;
use crate::stream::{BindingsStream, ResultStream};
use super::{forward, merge_names, QueryOperator};

/// Runs both children in parallel and forwards everything either emits.
///
/// No ordering is kept between the two sides.
pub struct UnionNode {
    inner: Arc<dyn QueryOperator>,
    outer: Arc<dyn QueryOperator>,
    buffer_size: usize,
}

impl UnionNode {
    /// The output channel takes the larger buffer size of the two children.
    pub fn new(inner: Arc<dyn QueryOperator>, outer: Arc<dyn QueryOperator>) -> Self {
        let buffer_size = inner.buffer_size().max(outer.buffer_size());
        Self { inner, outer, buffer_size }
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}

impl QueryOperator for UnionNode {
    fn execute(&self) -> BindingsStream {
        let (tx, out) = ResultStream::channel(self.buffer_size);
        let group = Arc::new(TaskGroup::new());

        for child in [&self.inner, &self.outer] {
            let stream = child.execute();
            let unit = group.unit();
            let tx = tx.clone();
            tokio::spawn(async move {
                let _unit = unit;
                forward(stream, &tx).await;
            });
        }

        // The output closes once both sides are done, however much each sent.
        tokio::spawn(async move {
            group.wait().await;
            if let Some(err) = group.take_error() {
                let _ = tx.send(Err(err)).await;
            }
            trace!("union complete");
        });
        out
    }

    /// Same as [`execute`](QueryOperator::execute): the incoming group is not
    /// pushed into either side and is not merged into the results.
    fn execute_with(&self, _group: BindingsGroup) -> BindingsStream {
        self.execute()
    }

    fn binding_names(&self) -> Vec<String> {
        merge_names(self.inner.binding_names(), self.outer.binding_names())
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl fmt::Display for UnionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Union({}, {})", self.inner, self.outer)
    }
}
