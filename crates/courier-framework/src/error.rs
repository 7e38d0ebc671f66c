//! Error types for the Courier framework.

use thiserror::Error;

use courier_core::{DecodeError, UpdateKind};

/// Error returned by a handler.
///
/// Handlers may fail with any error convertible into [`anyhow::Error`]; the
/// dispatcher logs the whole chain.
pub type HandlerError = anyhow::Error;

/// Result type returned by handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Errors that can occur during context extraction.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The update does not carry the requested record.
    #[error("update {update_id} ({kind}) has no '{expected}'")]
    Missing {
        /// Requested type name.
        expected: &'static str,
        /// Category of the update, `"unknown"` if none was detected.
        kind: &'static str,
        /// The update being dispatched.
        update_id: i64,
    },

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Why an update could not be routed to category handlers.
///
/// Raw handlers have already run when either variant is returned.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// None of the known category keys is present.
    #[error("update {update_id} has no known category (keys: {keys:?})")]
    UnknownKind {
        update_id: i64,
        /// Top-level keys found, `update_id` excluded.
        keys: Vec<String>,
    },

    /// The payload did not match the record of its category.
    #[error("update {update_id} could not be decoded as '{kind}': {source}")]
    Decode {
        update_id: i64,
        kind: UpdateKind,
        #[source]
        source: DecodeError,
    },
}

impl DispatchError {
    /// The update the error is about.
    pub fn update_id(&self) -> i64 {
        match self {
            Self::UnknownKind { update_id, .. } | Self::Decode { update_id, .. } => *update_id,
        }
    }
}

/// Result type for dispatching one update.
pub type DispatchResult<T> = Result<T, DispatchError>;
