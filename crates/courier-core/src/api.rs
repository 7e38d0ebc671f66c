//! The Bot API envelope and the caller seam.
//!
//! Every Bot API response has the same shape:
//!
//! ```text
//! { "ok": true,  "result": <T> }
//! { "ok": false, "error_code": 429, "description": "...",
//!   "parameters": { "retry_after": 3 } }
//! ```
//!
//! [`ApiResponse::into_result`] maps that envelope onto [`ApiResult`], and
//! [`ApiCaller`] is the trait every transport implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

// =============================================================================
// Envelope
// =============================================================================

/// Extra information attached to a failed response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before repeating a rate-limited request.
    #[serde(default)]
    pub retry_after: Option<u64>,
    /// The group was migrated to a supergroup with this identifier.
    #[serde(default)]
    pub migrate_to_chat_id: Option<i64>,
}

/// A raw Bot API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

impl ApiResponse {
    /// Unwraps the envelope.
    ///
    /// A failed response carrying `parameters.retry_after` becomes
    /// [`ApiError::RetryAfter`]; any other failure becomes [`ApiError::Api`].
    /// A successful response without `result` yields `Value::Null`.
    pub fn into_result(self) -> ApiResult<Value> {
        if self.ok {
            return Ok(self.result.unwrap_or(Value::Null));
        }

        if let Some(secs) = self.parameters.as_ref().and_then(|p| p.retry_after) {
            return Err(ApiError::RetryAfter { secs });
        }

        Err(ApiError::Api {
            code: self.error_code.unwrap_or(0),
            description: self
                .description
                .unwrap_or_else(|| "no description".to_string()),
        })
    }
}

// =============================================================================
// Payload
// =============================================================================

/// One file of a multipart request.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    /// Form field name, e.g. `"document"`.
    pub field: String,
    /// File name reported to the server.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// A multipart form: text fields plus file parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartPayload {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartPayload {
    /// Builds the text fields of a form from a JSON object.
    ///
    /// Strings are sent as-is, `null` is skipped and everything else is sent
    /// as its JSON text (the Bot API expects e.g. `reply_markup` that way).
    pub fn from_json(params: Map<String, Value>) -> Self {
        let fields = params
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect();

        Self {
            fields,
            files: Vec::new(),
        }
    }

    /// Adds a file part.
    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.files.push(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
        });
        self
    }
}

/// The body of a Bot API request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Map<String, Value>),
    Multipart(MultipartPayload),
}

impl Payload {
    /// An empty JSON body.
    pub fn empty() -> Self {
        Self::Json(Map::new())
    }

    /// Serializes `params` into a JSON body.
    ///
    /// Fails unless `params` serializes to an object.
    pub fn json<T: Serialize>(params: &T) -> ApiResult<Self> {
        match serde_json::to_value(params)? {
            Value::Object(map) => Ok(Self::Json(map)),
            Value::Null => Ok(Self::empty()),
            other => Err(ApiError::Serialization(format!(
                "request parameters must be an object, got {other}"
            ))),
        }
    }

    /// Looks a parameter up, in either representation.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Self::Json(map) => map.get(key).cloned(),
            Self::Multipart(form) => form
                .fields
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| Value::String(value.clone())),
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self::Json(map)
    }
}

// =============================================================================
// ApiCaller
// =============================================================================

/// Performs one Bot API call.
///
/// Implementations send `payload` to `method` and unwrap the envelope with
/// [`ApiResponse::into_result`]. They do not retry; rate limits surface as
/// [`ApiError::RetryAfter`].
#[async_trait]
pub trait ApiCaller: Send + Sync {
    async fn call(&self, method: &str, payload: &Payload) -> ApiResult<Value>;
}
