//! # Courier Framework
//!
//! The handler-facing layer of Courier.
//!
//! This layer provides:
//! - the [`Handler`] trait, implemented for async functions whose parameters
//!   are [`FromContext`] extractors (Axum-style)
//! - [`HandlerRegistry`] and [`Module`] for registering handlers per
//!   [`HandlerKind`](courier_core::HandlerKind)
//! - the [`Dispatcher`], which routes one update to its handlers with
//!   per-handler failure isolation
//! - [`BotApi`], typed Bot API methods with rate-limit compliance
//!
//! The pipeline that feeds the dispatcher (poller, queue, workers) lives in
//! `courier-runtime`.

pub mod api;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod module;
pub mod registry;

pub use api::{
    BotApi, ChatId, DEFAULT_RETRY_MARGIN, GetUpdates, InputFile, MessageTarget, ParseMode,
    SendOptions,
};
pub use context::UpdateContext;
pub use dispatcher::{DispatchReport, Dispatcher, panic_message};
pub use error::{
    DispatchError, DispatchResult, ExtractError, ExtractResult, HandlerError, HandlerResult,
};
pub use extractor::{Command, FromContext};
pub use handler::{
    BoxFuture, BoxedHandler, ErasedHandler, Handler, HandlerFn, IntoHandlerResult, into_handler,
};
pub use module::{HandlerSet, Module, on};
pub use registry::HandlerRegistry;
