//! Runtime error types.

use thiserror::Error;

use courier_core::TransportError;

use crate::config::ConfigError;

/// Errors that can occur while building or running a bot.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be created.
    #[error("Failed to create API client: {0}")]
    Transport(#[from] TransportError),

    /// The async runtime could not be started.
    #[error("Failed to start async runtime: {0}")]
    Io(#[from] std::io::Error),

    /// `Bot::start` was called outside a Tokio runtime.
    #[error("No Tokio runtime available; call from within a runtime or use `Bot::activate`")]
    NoRuntime,

    /// No API client was configured and the `http-client` feature is off.
    #[error("No API client available; enable the `http-client` feature or supply a caller")]
    NoApiCaller,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Returned by [`UpdateQueue::put`](crate::queue::UpdateQueue::put) once the
/// queue is closed; carries the rejected update.
#[derive(Error, Debug)]
#[error("update queue is closed")]
pub struct QueueClosed(pub courier_core::Update);
