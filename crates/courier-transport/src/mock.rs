//! A scripted [`ApiCaller`] for tests.
//!
//! ```rust,ignore
//! let api = MockApiCaller::new()
//!     .respond("getUpdates", json!([{ "update_id": 1, "message": { ... } }]))
//!     .with_default("sendMessage", json!({ ... }))
//!     .hold_when_exhausted();
//!
//! // ... run the code under test ...
//!
//! api.wait_for_calls("sendMessage", 1).await;
//! assert_eq!(api.calls_to("getUpdates").len(), 2);
//! ```

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use courier_core::{ApiCaller, ApiError, ApiResult, Payload};

/// One call observed by a [`MockApiCaller`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub payload: Payload,
}

/// Replays scripted responses per method and records every call.
///
/// For each call the first scripted response of the method is consumed; when
/// none is left the method's default is returned. Without a default the call
/// either fails with a 404 [`ApiError::Api`] or, after
/// [`hold_when_exhausted`](Self::hold_when_exhausted), never completes (like
/// an idle long poll).
#[derive(Debug, Default)]
pub struct MockApiCaller {
    scripted: Mutex<HashMap<String, VecDeque<ApiResult<Value>>>>,
    defaults: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<RecordedCall>>,
    hold: bool,
    notify: Notify,
}

impl MockApiCaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful result for `method`.
    pub fn respond(self, method: &str, result: Value) -> Self {
        self.push(method, Ok(result));
        self
    }

    /// Queues an error for `method`.
    pub fn fail(self, method: &str, error: ApiError) -> Self {
        self.push(method, Err(error));
        self
    }

    /// Result returned for `method` once its queue is empty.
    pub fn with_default(self, method: &str, result: Value) -> Self {
        self.defaults.lock().insert(method.to_string(), result);
        self
    }

    /// Makes unscripted calls suspend forever instead of failing.
    pub fn hold_when_exhausted(mut self) -> Self {
        self.hold = true;
        self
    }

    /// Queues a response after construction.
    pub fn push(&self, method: &str, result: ApiResult<Value>) {
        self.scripted
            .lock()
            .entry(method.to_string())
            .or_default()
            .push_back(result);
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Calls to `method` so far, in order.
    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    /// Waits until `method` has been called at least `count` times.
    pub async fn wait_for_calls(&self, method: &str, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.calls_to(method).len() >= count {
                return;
            }
            notified.await;
        }
    }

    fn next_response(&self, method: &str) -> Option<ApiResult<Value>> {
        let scripted = self
            .scripted
            .lock()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        scripted.or_else(|| self.defaults.lock().get(method).cloned().map(Ok))
    }
}

#[async_trait]
impl ApiCaller for MockApiCaller {
    async fn call(&self, method: &str, payload: &Payload) -> ApiResult<Value> {
        self.calls.lock().push(RecordedCall {
            method: method.to_string(),
            payload: payload.clone(),
        });
        self.notify.notify_waiters();

        let response = self.next_response(method);
        match response {
            Some(result) => result,
            None if self.hold => std::future::pending().await,
            None => Err(ApiError::Api {
                code: 404,
                description: format!("no scripted response for '{method}'"),
            }),
        }
    }
}
