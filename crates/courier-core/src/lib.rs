//! # Courier Core
//!
//! Foundation types for the Courier Telegram bot framework.
//!
//! This crate knows nothing about HTTP, tasks or handlers. It provides:
//!
//! - **Updates**: [`Update`] wraps one raw `getUpdates` entry and detects its
//!   [`UpdateKind`]; handlers are registered against a [`HandlerKind`].
//! - **Typed records**: the [`model`] module, decoded on demand into a
//!   [`TypedEvent`].
//! - **API seam**: the response envelope ([`ApiResponse`]), request bodies
//!   ([`Payload`]) and the [`ApiCaller`] trait transports implement.
//! - **Errors**: [`TransportError`], [`ApiError`] and [`DecodeError`].
//!
//! ```text
//! getUpdates ──▶ Value ──▶ Update { id, kind, raw } ──▶ TypedEvent
//!                                                       (per dispatch)
//! ```

pub mod api;
pub mod error;
pub mod event;
pub mod model;
pub mod update;

pub use api::{ApiCaller, ApiResponse, FilePart, MultipartPayload, Payload, ResponseParameters};
pub use error::{
    ApiError, ApiResult, DecodeError, DecodeResult, TransportError, TransportResult,
};
pub use event::TypedEvent;
pub use update::{HandlerKind, Update, UpdateKind};
