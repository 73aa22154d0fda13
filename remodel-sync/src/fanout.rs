//! Fan-out scheduler.
//!
//! Runs a batch of independent async operations concurrently on the calling
//! task and waits until every one has settled. A failure never cancels its
//! siblings. Results come back in the order they settle, which is not the
//! order they were submitted.
//!
//! Operations are polled together from the caller's task; no threads are
//! spawned, so a batch only makes progress while the caller awaits it.

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use tracing::debug;

/// One settled operation.
#[derive(Debug)]
pub struct Settled<K, T, E> {
    /// Correlation key given at submission.
    pub key: K,
    pub result: Result<T, E>,
}

/// A batch of in-flight operations.
pub struct FanOut<'a, K, T, E> {
    pending: FuturesUnordered<BoxFuture<'a, Settled<K, T, E>>>,
    submitted: usize,
}

impl<'a, K, T, E> Default for FanOut<'a, K, T, E>
where
    K: Send + 'a,
    T: Send + 'a,
    E: Send + 'a,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, T, E> FanOut<'a, K, T, E>
where
    K: Send + 'a,
    T: Send + 'a,
    E: Send + 'a,
{
    pub fn new() -> Self {
        Self {
            pending: FuturesUnordered::new(),
            submitted: 0,
        }
    }

    /// Adds an operation to the batch. It starts when the batch is first awaited.
    pub fn submit<F>(&mut self, key: K, operation: F)
    where
        F: Future<Output = Result<T, E>> + Send + 'a,
    {
        self.submitted += 1;
        self.pending.push(
            async move {
                Settled {
                    key,
                    result: operation.await,
                }
            }
            .boxed(),
        );
    }

    /// Operations submitted so far.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Operations not yet settled.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Waits for the next operation to settle. `None` once all have.
    pub async fn next_settled(&mut self) -> Option<Settled<K, T, E>> {
        self.pending.next().await
    }

    /// Waits for every operation to settle.
    pub async fn settle(mut self) -> SettledBatch<K, T, E> {
        let mut settled = Vec::with_capacity(self.pending.len());
        while let Some(next) = self.pending.next().await {
            settled.push(next);
        }
        let batch = SettledBatch { settled };
        debug!(
            submitted = self.submitted,
            failed = batch.failure_count(),
            "Fan-out batch settled"
        );
        batch
    }
}

/// Runs every operation concurrently and waits for all of them to settle.
pub async fn run<'a, K, T, E, F, I>(operations: I) -> SettledBatch<K, T, E>
where
    I: IntoIterator<Item = (K, F)>,
    F: Future<Output = Result<T, E>> + Send + 'a,
    K: Send + 'a,
    T: Send + 'a,
    E: Send + 'a,
{
    let mut fan_out = FanOut::new();
    for (key, operation) in operations {
        fan_out.submit(key, operation);
    }
    fan_out.settle().await
}

/// Every result of a batch, in settle order.
#[derive(Debug)]
pub struct SettledBatch<K, T, E> {
    settled: Vec<Settled<K, T, E>>,
}

impl<K, T, E> SettledBatch<K, T, E> {
    pub fn len(&self) -> usize {
        self.settled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Settled<K, T, E>> {
        self.settled.iter()
    }

    pub fn success_count(&self) -> usize {
        self.settled.iter().filter(|s| s.result.is_ok()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.settled.len() - self.success_count()
    }

    pub fn into_vec(self) -> Vec<Settled<K, T, E>> {
        self.settled
    }

    /// Results keyed by correlation key. A repeated key keeps the result
    /// that settled last.
    pub fn into_map(self) -> HashMap<K, Result<T, E>>
    where
        K: Eq + Hash,
    {
        self.settled
            .into_iter()
            .map(|Settled { key, result }| (key, result))
            .collect()
    }
}

impl<K, T, E> IntoIterator for SettledBatch<K, T, E> {
    type Item = Settled<K, T, E>;
    type IntoIter = std::vec::IntoIter<Settled<K, T, E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.settled.into_iter()
    }
}
