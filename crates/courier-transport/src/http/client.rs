//! HTTP implementation of [`ApiCaller`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde_json::Value;
use tracing::{debug, trace};

use courier_core::{
    ApiCaller, ApiResponse, ApiResult, MultipartPayload, Payload, TransportError, TransportResult,
};

/// Longest response excerpt kept in a [`TransportError::MalformedResponse`].
const BODY_EXCERPT_LEN: usize = 256;

/// Calls the Bot API over HTTPS with a shared `reqwest` client.
///
/// Every method is a `POST {api_url}/bot{token}/{method}`. The envelope is
/// parsed whatever the HTTP status, since the Bot API reports errors
/// (including rate limits) in the body of 4xx responses.
#[derive(Clone)]
pub struct HttpApiCaller {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpApiCaller {
    /// Creates a caller with its own connection pool.
    pub fn new(
        api_url: &str,
        token: &str,
        request_timeout: Duration,
    ) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

        Ok(Self::with_client(client, api_url, token, request_timeout))
    }

    /// Creates a caller on top of an existing client.
    pub fn with_client(
        client: Client,
        api_url: &str,
        token: &str,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            request_timeout,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Time allowed for one request.
    ///
    /// A long poll is held open by the server for its `timeout` parameter,
    /// so that hold is added on top of the regular request timeout.
    fn timeout_for(&self, method: &str, payload: &Payload) -> Duration {
        let hold = if method.eq_ignore_ascii_case("getUpdates") {
            payload
                .get("timeout")
                .and_then(|v| v.as_u64())
                .unwrap_or(0)
        } else {
            0
        };
        self.request_timeout + Duration::from_secs(hold)
    }

    fn build_request(&self, method: &str, payload: &Payload) -> RequestBuilder {
        let request = self
            .client
            .post(self.endpoint(method))
            .timeout(self.timeout_for(method, payload));

        match payload {
            Payload::Json(params) => request.json(params),
            Payload::Multipart(form) => request.multipart(build_form(form)),
        }
    }
}

// The multipart body is consumed by sending, so it is rebuilt per attempt.
fn build_form(payload: &MultipartPayload) -> Form {
    let form = payload
        .fields
        .iter()
        .fold(Form::new(), |form, (name, value)| {
            form.text(name.clone(), value.clone())
        });

    payload.files.iter().fold(form, |form, file| {
        let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        form.part(file.field.clone(), part)
    })
}

fn map_send_error(method: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            method: method.to_string(),
        }
    } else {
        TransportError::RequestFailed {
            method: method.to_string(),
            reason: err.without_url().to_string(),
        }
    }
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.into_owned(),
    }
}

impl fmt::Debug for HttpApiCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = match self.base_url.rfind("/bot") {
            Some(idx) => format!("{}/bot<redacted>", &self.base_url[..idx]),
            None => "<redacted>".to_string(),
        };
        f.debug_struct("HttpApiCaller")
            .field("base_url", &redacted)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[async_trait]
impl ApiCaller for HttpApiCaller {
    async fn call(&self, method: &str, payload: &Payload) -> ApiResult<Value> {
        debug!(method, "Calling Bot API");

        let response = self
            .build_request(method, payload)
            .send()
            .await
            .map_err(|e| map_send_error(method, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_send_error(method, e))?;
        trace!(method, status = status.as_u16(), len = body.len(), "Bot API responded");

        let envelope: ApiResponse =
            serde_json::from_slice(&body).map_err(|e| TransportError::MalformedResponse {
                method: method.to_string(),
                status: status.as_u16(),
                reason: format!("{e}; body: {}", excerpt(&body)),
            })?;

        envelope.into_result()
    }
}
