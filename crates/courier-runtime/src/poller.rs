//! Long-polling update fetcher.
//!
//! The poller keeps a cursor (`offset`) and repeatedly asks `getUpdates` for
//! everything at or after it. After each update the cursor moves to
//! `update_id + 1`, which confirms the update to the server: it is never
//! returned again, so every update is published at most once.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, trace, warn};

use courier_core::{ApiResult, Update};
use courier_framework::{BotApi, GetUpdates};

use crate::config::{BotConfig, FetchRetryConfig};
use crate::error::QueueClosed;
use crate::queue::UpdateQueue;

/// Fetches updates and publishes them on an [`UpdateQueue`].
pub struct Poller {
    api: BotApi,
    queue: UpdateQueue,
    offset: Option<i64>,
    timeout_secs: u64,
    limit: Option<u8>,
    allowed_updates: Vec<String>,
    retry: FetchRetryConfig,
    /// Set until the backlog present at startup has been dropped.
    skip_pending: bool,
}

impl Poller {
    pub fn new(api: BotApi, queue: UpdateQueue, config: &BotConfig) -> Self {
        Self {
            api,
            queue,
            offset: None,
            timeout_secs: config.poll_timeout_secs,
            limit: config.poll_limit,
            allowed_updates: config.allowed_updates.clone(),
            retry: config.fetch_retry.clone(),
            skip_pending: config.skip_updates,
        }
    }

    /// The next `update_id` expected, `None` before the first update.
    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Polls until `cancel` fires.
    ///
    /// Failed fetches are retried with the same offset after an exponential
    /// back-off that resets on the next success.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let span = info_span!("poller");
        async {
            info!(
                timeout_secs = self.timeout_secs,
                skip_updates = self.skip_pending,
                "Poller started"
            );

            let mut failures: u32 = 0;
            loop {
                let fetched = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    fetched = self.poll_once() => fetched,
                };

                match fetched {
                    Ok(_) => failures = 0,
                    Err(err) => {
                        let delay = self.retry.delay_for_attempt(failures);
                        failures = failures.saturating_add(1);
                        warn!(
                            error = %err,
                            offset = ?self.offset,
                            attempt = failures,
                            delay_ms = delay.as_millis() as u64,
                            "Failed to fetch updates, backing off"
                        );
                        if !sleep_or_cancel(delay, &cancel).await {
                            break;
                        }
                    }
                }
            }

            info!(offset = ?self.offset, "Poller stopped");
        }
        .instrument(span)
        .await
    }

    /// Performs one `getUpdates` round and publishes the result.
    ///
    /// Returns how many updates were put on the queue. The first round of a
    /// poller created with `skip_updates` does not hold the connection open
    /// and publishes nothing; it only moves the cursor past the backlog.
    pub async fn poll_once(&mut self) -> ApiResult<usize> {
        let skipping = self.skip_pending;
        let request = GetUpdates {
            offset: self.offset,
            timeout: Some(if skipping { 0 } else { self.timeout_secs }),
            limit: self.limit,
            allowed_updates: self.allowed_updates.clone(),
        };

        trace!(offset = ?self.offset, "Fetching updates");
        let batch = self.api.get_updates(&request).await?;
        self.skip_pending = false;

        let received = batch.len();
        let mut published = 0;
        for raw in batch {
            let update = match Update::from_value(raw) {
                Ok(update) => update,
                Err(err) => {
                    warn!(error = %err, "Dropping malformed update");
                    continue;
                }
            };

            self.advance(update.id());
            if skipping {
                continue;
            }

            match self.queue.put(update) {
                Ok(()) => published += 1,
                Err(QueueClosed(update)) => {
                    warn!(
                        update_id = update.id(),
                        offset = ?self.offset,
                        "Queue closed, confirmed update dropped"
                    );
                }
            }
        }

        if skipping {
            info!(skipped = received, offset = ?self.offset, "Skipped pending updates");
        } else if received > 0 {
            debug!(received, published, offset = ?self.offset, "Fetched updates");
        }

        Ok(published)
    }

    fn advance(&mut self, update_id: i64) {
        let next = update_id.saturating_add(1);
        self.offset = Some(self.offset.map_or(next, |offset| offset.max(next)));
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("offset", &self.offset)
            .field("timeout_secs", &self.timeout_secs)
            .field("skip_pending", &self.skip_pending)
            .finish_non_exhaustive()
    }
}

/// Returns `false` if cancelled before `delay` elapsed.
async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use courier_core::{ApiError, TransportError};
    use courier_transport::MockApiCaller;
    use serde_json::{Value, json};

    fn message(id: i64) -> Value {
        json!({
            "update_id": id,
            "message": {
                "message_id": id,
                "date": 0,
                "chat": { "id": 5, "type": "private" },
                "text": "hi"
            }
        })
    }

    fn poller(mock: &Arc<MockApiCaller>, queue: &UpdateQueue, config: &BotConfig) -> Poller {
        Poller::new(BotApi::new(mock.clone()), queue.clone(), config)
    }

    fn offsets(mock: &MockApiCaller) -> Vec<Option<i64>> {
        mock.calls_to("getUpdates")
            .iter()
            .map(|call| call.payload.get("offset").and_then(|v| v.as_i64()))
            .collect()
    }

    fn drain(queue: &UpdateQueue) -> Vec<i64> {
        std::iter::from_fn(|| queue.try_take().map(|u| u.id())).collect()
    }

    fn transport_error() -> ApiError {
        ApiError::Transport(TransportError::Timeout {
            method: "getUpdates".into(),
        })
    }

    #[tokio::test]
    async fn test_cursor_advances_past_each_batch() {
        let mock = Arc::new(
            MockApiCaller::new()
                .respond("getUpdates", json!([message(10), message(11)]))
                .respond("getUpdates", json!([message(12)]))
                .respond("getUpdates", json!([])),
        );
        let queue = UpdateQueue::new();
        let mut poller = poller(&mock, &queue, &BotConfig::default());

        for _ in 0..3 {
            poller.poll_once().await.unwrap();
        }

        assert_eq!(offsets(&mock), vec![None, Some(12), Some(13)]);
        assert_eq!(poller.offset(), Some(13));
        assert_eq!(drain(&queue), vec![10, 11, 12]);
    }

    #[tokio::test]
    async fn test_cursor_never_decreases() {
        let mock = Arc::new(
            MockApiCaller::new()
                .respond("getUpdates", json!([message(5), message(3)]))
                .respond("getUpdates", json!([message(4)])),
        );
        let queue = UpdateQueue::new();
        let mut poller = poller(&mock, &queue, &BotConfig::default());

        poller.poll_once().await.unwrap();
        assert_eq!(poller.offset(), Some(6));
        poller.poll_once().await.unwrap();
        assert_eq!(poller.offset(), Some(6));
    }

    #[tokio::test]
    async fn test_long_poll_parameters() {
        let mock = Arc::new(MockApiCaller::new().respond("getUpdates", json!([])));
        let config = BotConfig {
            poll_timeout_secs: 25,
            poll_limit: Some(50),
            allowed_updates: vec!["message".into()],
            ..BotConfig::default()
        };
        let mut poller = poller(&mock, &UpdateQueue::new(), &config);

        poller.poll_once().await.unwrap();

        let call = &mock.calls_to("getUpdates")[0];
        assert_eq!(call.payload.get("timeout"), Some(json!(25)));
        assert_eq!(call.payload.get("limit"), Some(json!(50)));
        assert_eq!(call.payload.get("allowed_updates"), Some(json!(["message"])));
        assert_eq!(call.payload.get("offset"), None);
    }

    #[tokio::test]
    async fn test_skip_updates_discards_backlog() {
        let mock = Arc::new(
            MockApiCaller::new()
                .respond("getUpdates", json!([message(1), message(2), message(3)]))
                .respond("getUpdates", json!([message(4)])),
        );
        let queue = UpdateQueue::new();
        let config = BotConfig {
            skip_updates: true,
            ..BotConfig::default()
        };
        let mut poller = poller(&mock, &queue, &config);

        assert_eq!(poller.poll_once().await.unwrap(), 0);
        assert!(queue.is_empty());
        assert_eq!(poller.poll_once().await.unwrap(), 1);
        assert_eq!(drain(&queue), vec![4]);

        let calls = mock.calls_to("getUpdates");
        assert_eq!(calls[0].payload.get("timeout"), Some(json!(0)));
        assert_eq!(calls[1].payload.get("timeout"), Some(json!(30)));
        assert_eq!(calls[1].payload.get("offset"), Some(json!(4)));
    }

    #[tokio::test]
    async fn test_closed_queue_still_advances_cursor() {
        let mock = Arc::new(
            MockApiCaller::new().respond("getUpdates", json!([message(20), message(21)])),
        );
        let queue = UpdateQueue::new();
        queue.close();
        let mut poller = poller(&mock, &queue, &BotConfig::default());

        assert_eq!(poller.poll_once().await.unwrap(), 0);
        assert_eq!(poller.offset(), Some(22));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_entry_is_dropped() {
        let mock = Arc::new(MockApiCaller::new().respond(
            "getUpdates",
            json!([{ "message": { "message_id": 1 } }, message(8)]),
        ));
        let queue = UpdateQueue::new();
        let mut poller = poller(&mock, &queue, &BotConfig::default());

        assert_eq!(poller.poll_once().await.unwrap(), 1);
        assert_eq!(drain(&queue), vec![8]);
        assert_eq!(poller.offset(), Some(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_back_off_and_keep_offset() {
        let mock = Arc::new(
            MockApiCaller::new()
                .respond("getUpdates", json!([message(7)]))
                .fail("getUpdates", transport_error())
                .fail("getUpdates", transport_error())
                .respond("getUpdates", json!([message(8)]))
                .fail("getUpdates", transport_error())
                .hold_when_exhausted(),
        );
        let queue = UpdateQueue::new();
        let mut poller = poller(&mock, &queue, &BotConfig::default());
        let cancel = CancellationToken::new();

        let start = tokio::time::Instant::now();
        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                poller.run(cancel).await;
                poller
            }
        });

        mock.wait_for_calls("getUpdates", 3).await;
        // 500 ms after the first failure.
        assert!(start.elapsed() >= Duration::from_millis(500));
        mock.wait_for_calls("getUpdates", 4).await;
        // Then 1000 ms after the second.
        assert!(start.elapsed() >= Duration::from_millis(1500));
        mock.wait_for_calls("getUpdates", 6).await;
        // Back to 500 ms after a success.
        assert!(start.elapsed() >= Duration::from_millis(2000));
        assert!(start.elapsed() < Duration::from_millis(3000));

        cancel.cancel();
        let poller = task.await.unwrap();

        assert_eq!(
            offsets(&mock),
            vec![None, Some(8), Some(8), Some(8), Some(9), Some(9)]
        );
        assert_eq!(poller.offset(), Some(9));
        assert_eq!(drain(&queue), vec![7, 8]);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let mock = Arc::new(MockApiCaller::new().hold_when_exhausted());
        let mut poller = poller(&mock, &UpdateQueue::new(), &BotConfig::default());
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move { poller.run(cancel).await }
        });
        mock.wait_for_calls("getUpdates", 1).await;

        cancel.cancel();
        task.await.unwrap();
    }
}
