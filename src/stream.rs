//! Result streams shared by the store and the query operators.
//!
//! Every producer writes into a bounded channel and the consumer reads it
//! through a [`ResultStream`]. The stream ends when every sender has been
//! dropped. Dropping the stream before it ends cancels the producers: their
//! next send fails and they stop.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::model::{BindingsGroup, Triple};
use crate::Result;

/// Stream of matching triples produced by a graph traversal.
pub type TripleStream = ResultStream<Triple>;

/// Stream of solutions produced by a query operator.
pub type BindingsStream = ResultStream<BindingsGroup>;

/// Producer half of a [`ResultStream`].
pub type ResultSender<T> = mpsc::Sender<Result<T>>;

/// A bounded stream of `Result<T>` items.
#[derive(Debug)]
pub struct ResultStream<T> {
    rx: mpsc::Receiver<Result<T>>,
}

impl<T> ResultStream<T> {
    /// Create a connected sender/stream pair with the given capacity.
    pub fn channel(capacity: usize) -> (ResultSender<T>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }

    /// A stream that is already closed.
    pub fn empty() -> Self {
        let (_, stream) = Self::channel(1);
        stream
    }

    /// Receive the next item, or `None` once the stream is closed.
    pub async fn next(&mut self) -> Option<Result<T>> {
        self.rx.recv().await
    }

    /// Drain the stream, stopping at the first error.
    pub async fn try_collect(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.rx.recv().await {
            items.push(item?);
        }
        Ok(items)
    }
}

impl<T> Stream for ResultStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_stream_closes_when_senders_drop() {
        let (tx, stream) = ResultStream::<u32>::channel(4);
        let tx2 = tx.clone();
        tokio::spawn(async move {
            tx.send(Ok(1)).await.unwrap();
            tx2.send(Ok(2)).await.unwrap();
        });
        let mut items = stream.try_collect().await.unwrap();
        items.sort();
        assert_eq!(items, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_try_collect_surfaces_error() {
        let (tx, stream) = ResultStream::<u32>::channel(4);
        tx.send(Ok(1)).await.unwrap();
        tx.send(Err(Error::Corrupted("boom".into()))).await.unwrap();
        drop(tx);
        assert!(matches!(stream.try_collect().await, Err(Error::Corrupted(_))));
    }

    #[tokio::test]
    async fn test_futures_stream_impl() {
        let (tx, stream) = ResultStream::<u32>::channel(4);
        tx.send(Ok(7)).await.unwrap();
        drop(tx);
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
        assert!(ResultStream::<u32>::empty().next().await.is_none());
    }
}
