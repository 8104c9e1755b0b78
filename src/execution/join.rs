//! Join operator: nested-loop bind join of two sub-plans.
//!
//! Every group produced by the inner side is handed to the outer side's
//! `execute_with`, and the outer probes run concurrently.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::model::BindingsGroup;
use crate::storage::TaskGroup;
use crate::stream::{BindingsStream, ResultStream};
use super::{forward, merge_names, QueryOperator};

pub struct JoinNode {
    inner: Arc<dyn QueryOperator>,
    outer: Arc<dyn QueryOperator>,
    buffer_size: usize,
}

impl JoinNode {
    /// The output channel takes the larger buffer size of the two children.
    pub fn new(inner: Arc<dyn QueryOperator>, outer: Arc<dyn QueryOperator>) -> Self {
        let buffer_size = inner.buffer_size().max(outer.buffer_size());
        Self { inner, outer, buffer_size }
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    fn probe(&self, mut left: BindingsStream) -> BindingsStream {
        let (tx, out) = ResultStream::channel(self.buffer_size);
        let group = Arc::new(TaskGroup::new());
        let outer = Arc::clone(&self.outer);

        let driver = group.unit();
        let probes = Arc::clone(&group);
        let driver_tx = tx.clone();
        tokio::spawn(async move {
            let _unit = driver;
            while let Some(item) = left.next().await {
                match item {
                    Ok(binding) => {
                        let right = outer.execute_with(binding);
                        let unit = probes.unit();
                        let tx = driver_tx.clone();
                        tokio::spawn(async move {
                            let _unit = unit;
                            forward(right, &tx).await;
                        });
                    }
                    Err(err) => {
                        let _ = driver_tx.send(Err(err)).await;
                        return;
                    }
                }
                if driver_tx.is_closed() {
                    return;
                }
            }
        });

        tokio::spawn(async move {
            group.wait().await;
            if let Some(err) = group.take_error() {
                let _ = tx.send(Err(err)).await;
            }
            trace!("join complete");
        });
        out
    }
}

impl QueryOperator for JoinNode {
    fn execute(&self) -> BindingsStream {
        self.probe(self.inner.execute())
    }

    fn execute_with(&self, group: BindingsGroup) -> BindingsStream {
        self.probe(self.inner.execute_with(group))
    }

    fn binding_names(&self) -> Vec<String> {
        merge_names(self.inner.binding_names(), self.outer.binding_names())
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl fmt::Display for JoinNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Join({}, {})", self.inner, self.outer)
    }
}
