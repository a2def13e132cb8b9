//! Fail-fast worker pool
//!
//! Runs one task per unit of work and joins them at a single point. The
//! first error wins: the pool returns it immediately and aborts the tasks
//! still in flight. Work already handed to the blocking thread pool runs to
//! completion and its result is dropped.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A task that panicked or was cancelled
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task '{key}' did not complete: {error}")]
pub struct TaskFailure {
    /// Key of the failed unit
    pub key: String,
    /// Panic or cancellation message
    pub error: String,
}

/// Bounded or unbounded fan-out/fan-in pool
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    limit: Option<usize>,
}

impl WorkerPool {
    /// One concurrent task per unit
    pub fn unbounded() -> Self {
        Self { limit: None }
    }

    /// At most `limit` tasks running at once (`None` means unbounded)
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit: limit.map(|n| n.max(1)),
        }
    }

    /// Run every unit and collect its output, or return the first error
    ///
    /// Results come back in completion order. Each unit is keyed for
    /// diagnostics when it panics.
    pub async fn run<T, E, Fut>(&self, units: Vec<(String, Fut)>) -> Result<Vec<T>, E>
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<TaskFailure> + Send + 'static,
    {
        let total = units.len();
        let semaphore = self.limit.map(|n| Arc::new(Semaphore::new(n)));
        let mut set = JoinSet::new();

        for (key, unit) in units {
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let _permit = match semaphore {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                match AssertUnwindSafe(unit).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => Err(E::from(TaskFailure {
                        key,
                        error: panic_message(panic.as_ref()),
                    })),
                }
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            let outcome = joined.map_err(|e| {
                E::from(TaskFailure {
                    key: String::from("<unknown>"),
                    error: e.to_string(),
                })
            })?;

            match outcome {
                Ok(value) => results.push(value),
                Err(e) => {
                    tracing::debug!(
                        "Aborting {} in-flight task(s) after first failure",
                        set.len()
                    );
                    set.abort_all();
                    return Err(e);
                }
            }
        }

        Ok(results)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}
