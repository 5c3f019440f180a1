//! Parallel task execution
//!
//! A small structured-concurrency group: spawn units of work, join them all,
//! get results back in submission order. Unjoined work is aborted on drop.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

/// Group of spawned tasks joined in submission order
pub struct TaskGroup<T> {
    handles: Vec<JoinHandle<T>>,
    limit: Option<Arc<Semaphore>>,
}

impl<T: Send + 'static> TaskGroup<T> {
    /// Every spawned unit starts immediately
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            limit: None,
        }
    }

    /// At most `max_concurrent` units run at once
    pub fn bounded(max_concurrent: usize) -> Self {
        Self {
            handles: Vec::new(),
            limit: Some(Arc::new(Semaphore::new(max_concurrent.max(1)))),
        }
    }

    pub fn with_limit(max_concurrent: Option<usize>) -> Self {
        match max_concurrent {
            Some(max) => Self::bounded(max),
            None => Self::new(),
        }
    }

    pub fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let limit = self.limit.clone();
        let index = self.handles.len();

        self.handles.push(tokio::spawn(async move {
            // The semaphore is never closed, so acquiring only waits.
            let _permit = match limit {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            debug!("Task group unit {} started", index);
            work.await
        }));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every unit; slot `i` holds the outcome of the `i`th spawn
    pub async fn join_all(mut self) -> Vec<Result<T, JoinError>> {
        let handles = std::mem::take(&mut self.handles);
        join_all(handles).await
    }
}

impl<T: Send + 'static> Default for TaskGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for TaskGroup<T> {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
