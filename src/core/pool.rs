use crate::domain::ports::StageProgress;
use crate::utils::error::{CensusError, Result};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 5;

/// Runs one async action per item with at most `limit` in flight.
///
/// Actions return a tagged `Result`; the pool never inspects it. Outcomes are
/// handed to a single `merge` callback, one at a time and in completion
/// order, so the caller owns all shared state without a lock. Progress
/// advances once per item after its outcome has been merged.
#[derive(Debug, Clone, Copy)]
pub struct BoundedPool {
    limit: usize,
}

impl BoundedPool {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn run<I, T, A, Fut, M>(
        &self,
        items: I,
        progress: &dyn StageProgress,
        action: A,
        mut merge: M,
    ) where
        I: IntoIterator,
        I::Item: Clone,
        A: Fn(I::Item) -> Fut,
        Fut: Future<Output = Result<T>>,
        M: FnMut(I::Item, Result<T>),
    {
        // `map` is lazy: an action future is only created once
        // `buffer_unordered` has a free slot for it.
        let mut outcomes = stream::iter(items.into_iter().map(|item| {
            let pending = action(item.clone());
            async move { (item, pending.await) }
        }))
        .buffer_unordered(self.limit);

        while let Some((item, outcome)) = outcomes.next().await {
            merge(item, outcome);
            progress.advance();
        }
    }
}

impl Default for BoundedPool {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

/// Bounds one outbound call. An elapsed deadline becomes
/// [`CensusError::TimeoutError`], which stages treat like any other per-item
/// failure.
pub async fn with_deadline<T, F>(operation: &str, deadline: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(CensusError::TimeoutError {
            operation: operation.to_string(),
            seconds: deadline.as_secs(),
        }),
    }
}
