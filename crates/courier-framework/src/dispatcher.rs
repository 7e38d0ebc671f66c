//! Update dispatcher for the Courier framework.
//!
//! The [`Dispatcher`] routes one update to the handlers registered for it:
//!
//! 1. `Raw` handlers, for every update
//! 2. handlers of the detected category, if the payload decodes
//! 3. `AnyMessage` handlers, if the category is in the message family
//!
//! All selected handlers run concurrently, each as its own task, and the
//! dispatch completes once every one of them has finished. A handler that
//! fails or panics is logged and counted; its siblings are unaffected.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(Arc::new(registry), api);
//! match dispatcher.handle_update(update).await {
//!     Ok(report) => debug!(invoked = report.invoked, "done"),
//!     Err(err) => warn!(error = %err, "not routed"),
//! }
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, debug_span, error};

use courier_core::{HandlerKind, Update, UpdateKind};

use crate::api::BotApi;
use crate::context::UpdateContext;
use crate::error::{DispatchError, DispatchResult};
use crate::handler::BoxedHandler;
use crate::registry::HandlerRegistry;

/// Outcome of a successfully routed update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub update_id: i64,
    pub kind: UpdateKind,
    /// Handlers started for this update, raw ones included.
    pub invoked: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

/// Routes updates to the handlers of a frozen registry.
///
/// Cheap to clone; every worker holds its own clone.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    api: BotApi,
}

impl Dispatcher {
    pub fn new(registry: Arc<HandlerRegistry>, api: BotApi) -> Self {
        Self { registry, api }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn api(&self) -> &BotApi {
        &self.api
    }

    /// Dispatches one update and waits for all of its handlers.
    ///
    /// Raw handlers always run. An unknown category or a payload that does
    /// not decode is reported as a [`DispatchError`] after they finished.
    pub async fn handle_update(&self, update: Update) -> DispatchResult<DispatchReport> {
        let span = debug_span!(
            "dispatch",
            update_id = update.id(),
            kind = update.kind().map_or("unknown", UpdateKind::key),
        );
        self.route(update).instrument(span).await
    }

    async fn route(&self, update: Update) -> DispatchResult<DispatchReport> {
        let update_id = update.id();
        let kind = update.kind();

        let (event, failure) = match update.decode() {
            None => (None, None),
            Some(Ok(event)) => (Some(event), None),
            Some(Err(err)) => (None, Some(err)),
        };

        let mut handlers: Vec<BoxedHandler> = self.registry.handlers(HandlerKind::Raw).to_vec();
        if let (Some(kind), Some(_)) = (kind, &event) {
            handlers.extend_from_slice(self.registry.handlers(kind.into()));
            if kind.is_message() {
                handlers.extend_from_slice(self.registry.handlers(HandlerKind::AnyMessage));
            }
        }

        let keys: Vec<String> = if kind.is_none() {
            update.keys().into_iter().map(str::to_string).collect()
        } else {
            Vec::new()
        };

        let ctx = Arc::new(UpdateContext::new(update, event, self.api.clone()));
        let (invoked, failed) = run_handlers(update_id, handlers, ctx).await;
        debug!(invoked, failed, "Handlers finished");

        match (kind, failure) {
            (None, _) => Err(DispatchError::UnknownKind { update_id, keys }),
            (Some(kind), Some(source)) => Err(DispatchError::Decode {
                update_id,
                kind,
                source,
            }),
            (Some(kind), None) => Ok(DispatchReport {
                update_id,
                kind,
                invoked,
                failed,
            }),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler_count", &self.registry.len())
            .finish()
    }
}

/// Runs every handler as its own task and waits for all of them.
///
/// Returns `(invoked, failed)`. Dropping the returned future drops the
/// `JoinSet`, which aborts the handlers still running.
async fn run_handlers(
    update_id: i64,
    handlers: Vec<BoxedHandler>,
    ctx: Arc<UpdateContext>,
) -> (usize, usize) {
    let mut tasks = JoinSet::new();
    for handler in handlers {
        let ctx = Arc::clone(&ctx);
        tasks.spawn(
            async move {
                let name = handler.name();
                let outcome = AssertUnwindSafe(handler.call(ctx)).catch_unwind().await;
                (name, outcome)
            }
            .in_current_span(),
        );
    }

    let invoked = tasks.len();
    let mut failed = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(Ok(())))) => {}
            Ok((name, Ok(Err(err)))) => {
                failed += 1;
                error!(update_id, handler = name, error = ?err, "Handler failed");
            }
            Ok((name, Err(panic))) => {
                failed += 1;
                error!(
                    update_id,
                    handler = name,
                    panic = panic_message(panic.as_ref()),
                    "Handler panicked"
                );
            }
            Err(err) => {
                failed += 1;
                error!(update_id, error = %err, "Handler task did not complete");
            }
        }
    }

    (invoked, failed)
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
