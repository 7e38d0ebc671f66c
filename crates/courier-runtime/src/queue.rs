//! The hand-off buffer between the poller and the workers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

use courier_core::Update;

use crate::error::QueueClosed;

/// Unbounded FIFO queue of raw updates.
///
/// Cloning yields another handle to the same queue; any number of handles
/// may put and take concurrently. Each update is handed to exactly one
/// taker, in insertion order. `put` never waits, so memory grows if the
/// takers fall behind.
#[derive(Clone, Default)]
pub struct UpdateQueue {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    items: Mutex<VecDeque<Update>>,
    closed: AtomicBool,
    notify: Notify,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an update. Fails only once the queue is closed.
    pub fn put(&self, update: Update) -> Result<(), QueueClosed> {
        if self.is_closed() {
            return Err(QueueClosed(update));
        }
        self.inner.items.lock().push_back(update);
        self.inner.notify.notify_one();
        Ok(())
    }

    /// Removes the oldest update, waiting for one if the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn take(&self) -> Option<Update> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Registered before checking, so a close in between is not missed.
            notified.as_mut().enable();

            if let Some(update) = self.try_take() {
                return Some(update);
            }
            if self.is_closed() {
                return None;
            }
            notified.await;
        }
    }

    /// Removes the oldest update without waiting.
    pub fn try_take(&self) -> Option<Update> {
        self.inner.items.lock().pop_front()
    }

    /// Rejects further puts and wakes every waiting taker.
    ///
    /// Updates already queued can still be taken.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for UpdateQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
