//! Workers draining the update queue.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use courier_framework::{Dispatcher, panic_message};

use crate::queue::UpdateQueue;

/// A fixed set of workers, each taking one update at a time from the queue
/// and dispatching it.
///
/// Workers share nothing but the queue and the dispatcher, so a slow, failing
/// or panicking dispatch holds up only its own worker.
pub struct WorkerPool {
    tasks: JoinSet<()>,
    size: usize,
}

impl WorkerPool {
    /// Starts `size` workers on the current Tokio runtime.
    ///
    /// Once `cancel` fires, each worker finishes its current dispatch and
    /// exits; workers also exit when the queue is closed and drained.
    pub fn spawn(
        size: usize,
        queue: UpdateQueue,
        dispatcher: Dispatcher,
        cancel: CancellationToken,
    ) -> Self {
        let mut tasks = JoinSet::new();
        for worker in 0..size {
            let span = info_span!("worker", worker);
            tasks.spawn(
                worker_loop(queue.clone(), dispatcher.clone(), cancel.clone()).instrument(span),
            );
        }
        debug!(workers = size, "Worker pool started");

        Self { tasks, size }
    }

    /// Number of workers started.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Waits up to `grace` for the workers to exit, then aborts the rest.
    ///
    /// The workers must already have been told to stop (cancellation or a
    /// closed queue). Returns how many workers had to be aborted.
    pub async fn shutdown(mut self, grace: Duration) -> usize {
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = self.tasks.join_next().await {
                if let Err(err) = joined
                    && err.is_panic()
                {
                    error!(error = %err, "Worker task panicked");
                }
            }
        })
        .await;

        if drained.is_ok() {
            return 0;
        }

        let aborted = self.tasks.len();
        warn!(
            aborted,
            grace_ms = grace.as_millis() as u64,
            "Workers still busy after grace period, aborting"
        );
        self.tasks.shutdown().await;
        aborted
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("running", &self.tasks.len())
            .finish()
    }
}

async fn worker_loop(queue: UpdateQueue, dispatcher: Dispatcher, cancel: CancellationToken) {
    loop {
        let update = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            update = queue.take() => match update {
                Some(update) => update,
                None => break,
            },
        };

        let update_id = update.id();
        let outcome = AssertUnwindSafe(dispatcher.handle_update(update))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(report)) => debug!(
                update_id,
                kind = report.kind.key(),
                invoked = report.invoked,
                failed = report.failed,
                "Update dispatched"
            ),
            Ok(Err(err)) => warn!(update_id, error = %err, "Update not dispatched"),
            Err(panic) => error!(
                update_id,
                panic = panic_message(panic.as_ref()),
                "Dispatch panicked"
            ),
        }
    }

    info!("Worker stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use courier_core::model::Message;
    use courier_core::{HandlerKind, Update};
    use courier_framework::{BotApi, HandlerRegistry};
    use courier_transport::MockApiCaller;
    use serde_json::json;
    use tokio::sync::Notify;

    fn text_update(id: i64, text: &str) -> Update {
        Update::from_value(json!({
            "update_id": id,
            "message": {
                "message_id": id,
                "date": 0,
                "chat": { "id": 5, "type": "private" },
                "text": text
            }
        }))
        .unwrap()
    }

    fn dispatcher(registry: HandlerRegistry) -> Dispatcher {
        Dispatcher::new(
            Arc::new(registry),
            BotApi::new(Arc::new(MockApiCaller::new())),
        )
    }

    async fn wait_for(counter: &AtomicUsize, value: usize) {
        while counter.load(Ordering::SeqCst) < value {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_worker_does_not_block_others() {
        let handled = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(HandlerKind::Message, {
            let handled = handled.clone();
            move |message: Message| {
                let handled = handled.clone();
                async move {
                    if message.text.as_deref() == Some("block") {
                        std::future::pending::<()>().await;
                    }
                    handled.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        let queue = UpdateQueue::new();
        let cancel = CancellationToken::new();
        let pool = WorkerPool::spawn(2, queue.clone(), dispatcher(registry), cancel.clone());

        queue.put(text_update(1, "block")).unwrap();
        for id in 2..=5 {
            queue.put(text_update(id, "ok")).unwrap();
        }
        wait_for(&handled, 4).await;
        assert!(queue.is_empty());

        cancel.cancel();
        assert_eq!(pool.shutdown(Duration::from_secs(1)).await, 1);
    }

    #[tokio::test]
    async fn test_dispatch_errors_keep_worker_running() {
        let handled = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(HandlerKind::Message, {
            let handled = handled.clone();
            move |message: Message| {
                let handled = handled.clone();
                async move {
                    handled.fetch_add(1, Ordering::SeqCst);
                    if message.text.as_deref() == Some("fail") {
                        anyhow::bail!("handler failed");
                    }
                    Ok(())
                }
            }
        });

        let queue = UpdateQueue::new();
        let cancel = CancellationToken::new();
        let pool = WorkerPool::spawn(1, queue.clone(), dispatcher(registry), cancel.clone());

        queue
            .put(Update::from_value(json!({ "update_id": 1, "unknown_thing": {} })).unwrap())
            .unwrap();
        queue
            .put(Update::from_value(json!({ "update_id": 2, "message": { "message_id": 2 } })).unwrap())
            .unwrap();
        queue.put(text_update(3, "fail")).unwrap();
        queue.put(text_update(4, "ok")).unwrap();

        wait_for(&handled, 2).await;
        cancel.cancel();
        assert_eq!(pool.shutdown(Duration::from_secs(5)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_dispatch_finishes_on_shutdown() {
        let started = Arc::new(Notify::new());
        let finished = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(HandlerKind::Message, {
            let started = started.clone();
            let finished = finished.clone();
            move || {
                let started = started.clone();
                let finished = finished.clone();
                async move {
                    started.notify_one();
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        let queue = UpdateQueue::new();
        let cancel = CancellationToken::new();
        let pool = WorkerPool::spawn(1, queue.clone(), dispatcher(registry), cancel.clone());

        queue.put(text_update(1, "slow")).unwrap();
        queue.put(text_update(2, "never taken")).unwrap();
        started.notified().await;
        cancel.cancel();

        assert_eq!(pool.shutdown(Duration::from_secs(5)).await, 0);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_workers_exit_when_queue_closes() {
        let queue = UpdateQueue::new();
        let pool = WorkerPool::spawn(
            3,
            queue.clone(),
            dispatcher(HandlerRegistry::new()),
            CancellationToken::new(),
        );
        assert_eq!(pool.size(), 3);

        queue.close();
        assert_eq!(pool.shutdown(Duration::from_secs(5)).await, 0);
    }
}
