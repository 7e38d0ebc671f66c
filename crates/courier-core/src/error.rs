//! Unified error types for the Courier core.
//!
//! This module provides the error types shared by every layer that talks to
//! the Bot API or decodes what it returns. Framework-level errors (extraction,
//! dispatch) are defined in `courier-framework`.

use std::time::Duration;

use thiserror::Error;

use crate::update::UpdateKind;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised below the Bot API envelope, i.e. before a response could be
/// interpreted.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The HTTP request could not be sent or the connection dropped.
    #[error("request to '{method}' failed: {reason}")]
    RequestFailed {
        /// The Bot API method being called.
        method: String,
        /// Reason for failure.
        reason: String,
    },

    /// The request did not complete in time.
    #[error("request to '{method}' timed out")]
    Timeout {
        /// The Bot API method being called.
        method: String,
    },

    /// The server answered with something that is not a Bot API envelope.
    #[error("malformed response from '{method}' (HTTP {status}): {reason}")]
    MalformedResponse {
        /// The Bot API method being called.
        method: String,
        /// HTTP status code.
        status: u16,
        /// Parser diagnostics.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for Bot API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server asked us to slow down.
    ///
    /// Carries the `parameters.retry_after` value of the response envelope.
    #[error("rate limited, retry after {secs}s")]
    RetryAfter {
        /// Seconds to wait before repeating the call.
        secs: u64,
    },

    /// The API answered `ok: false`.
    #[error("API error ({code}): {description}")]
    Api {
        /// `error_code` from the envelope (0 if absent).
        code: i64,
        /// `description` from the envelope.
        description: String,
    },

    /// Failed to serialize a request or deserialize a result.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    /// Returns the wait requested by a rate-limit response, if this is one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RetryAfter { secs } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Whether the error originated below the API envelope.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Decode Errors
// =============================================================================

/// Errors raised while turning a raw update into a typed record.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The update has no integer `update_id`.
    #[error("update has no integer 'update_id'")]
    MissingUpdateId,

    /// The update is not a JSON object.
    #[error("update is not a JSON object")]
    NotAnObject,

    /// The payload under the category key does not match the typed record.
    #[error("failed to decode '{}' payload: {source}", kind.key())]
    Payload {
        /// Category whose payload failed to decode.
        kind: UpdateKind,
        /// Underlying serde error (names the missing or mistyped field).
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;
