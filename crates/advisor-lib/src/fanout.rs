//! Bounded concurrent fan-out with a shared deadline
//!
//! Every item runs as its own task, at most `max_workers` at a time. Results
//! are collected behind a single join barrier; when the deadline passes the
//! remaining tasks are aborted and only finished results are returned.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Results of a fan-out, keyed by input index
#[derive(Debug)]
pub struct FanOutResult<T> {
    pub completed: Vec<(usize, T)>,
    pub total: usize,
    pub deadline_exceeded: bool,
}

/// Run `task` for every item with at most `max_workers` in flight.
///
/// Completed results are sorted by input index. Tasks that panic are
/// logged and left out.
pub async fn run_bounded<I, T, F, Fut>(
    items: Vec<I>,
    max_workers: usize,
    deadline: Option<Instant>,
    task: F,
) -> FanOutResult<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let total = items.len();
    let permits = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut set = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let permits = Arc::clone(&permits);
        let work = task(item);
        set.spawn(async move {
            // The semaphore is never closed, so acquisition only fails on shutdown
            let _permit = permits.acquire_owned().await.ok();
            (index, work.await)
        });
    }

    let mut completed = Vec::with_capacity(total);
    let mut deadline_exceeded = false;

    loop {
        let next = match deadline {
            Some(deadline) => match timeout_at(deadline, set.join_next()).await {
                Ok(next) => next,
                Err(_) => {
                    deadline_exceeded = true;
                    break;
                }
            },
            None => set.join_next().await,
        };

        match next {
            Some(Ok(result)) => completed.push(result),
            Some(Err(e)) => warn!(error = %e, "Fan-out task did not complete"),
            None => break,
        }
    }

    if deadline_exceeded {
        let outstanding = set.len();
        set.abort_all();
        debug!(
            completed = completed.len(),
            aborted = outstanding,
            "Fan-out deadline reached"
        );
    }

    completed.sort_by_key(|(index, _)| *index);
    FanOutResult {
        completed,
        total,
        deadline_exceeded,
    }
}
