//! Typed Bot API methods.
//!
//! [`BotApi`] wraps any [`ApiCaller`] and adds two things on top of it:
//! typed request/response methods, and compliance with rate limits. When the
//! server answers with `retry_after`, the same call is repeated after waiting
//! that many seconds plus a safety margin, for as long as the server keeps
//! asking.
//!
//! ```rust,ignore
//! let api = BotApi::new(Arc::new(HttpApiCaller::new(url, token, timeout)?));
//! let me = api.get_me().await?;
//! api.send_message(5, "hello", SendOptions::default().parse_mode(ParseMode::Html)).await?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use courier_core::model::{Chat, ChatMember, InlineKeyboardMarkup, Message, User};
use courier_core::{ApiCaller, ApiError, ApiResult, MultipartPayload, Payload};

/// Extra wait added on top of a server-requested `retry_after`.
pub const DEFAULT_RETRY_MARGIN: Duration = Duration::from_millis(500);

// =============================================================================
// Request types
// =============================================================================

/// Target chat: a numeric identifier or a `@channelusername`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(username: &str) -> Self {
        Self::Username(username.to_string())
    }
}

impl From<String> for ChatId {
    fn from(username: String) -> Self {
        Self::Username(username)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Username(name) => f.write_str(name),
        }
    }
}

/// Parameters of `getUpdates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetUpdates {
    /// First update to return; omitted to get the oldest unconfirmed one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Long-poll hold in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Maximum batch size (1..=100).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u8>,
    /// Update categories to receive; empty keeps the server-side setting.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_updates: Vec<String>,
}

/// Text formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
    Markdown,
    MarkdownV2,
}

/// Optional parameters shared by the sending and editing methods.
///
/// Entries of `extra` are merged last and override the typed fields, so any
/// Bot API parameter without a dedicated field can still be passed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    pub parse_mode: Option<ParseMode>,
    pub reply_to_message_id: Option<i64>,
    pub reply_markup: Option<Value>,
    pub disable_notification: bool,
    pub message_thread_id: Option<i64>,
    pub extra: Map<String, Value>,
}

impl SendOptions {
    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    /// Attaches an inline keyboard.
    pub fn keyboard(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = serde_json::to_value(markup).ok();
        self
    }

    pub fn silent(mut self) -> Self {
        self.disable_notification = true;
        self
    }

    pub fn thread(mut self, thread_id: i64) -> Self {
        self.message_thread_id = Some(thread_id);
        self
    }

    /// Adds a raw parameter.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn apply(self, params: &mut Map<String, Value>) {
        if let Some(mode) = self.parse_mode {
            params.insert("parse_mode".into(), json!(mode));
        }
        if let Some(id) = self.reply_to_message_id {
            params.insert("reply_to_message_id".into(), json!(id));
        }
        if let Some(markup) = self.reply_markup {
            params.insert("reply_markup".into(), markup);
        }
        if self.disable_notification {
            params.insert("disable_notification".into(), json!(true));
        }
        if let Some(id) = self.message_thread_id {
            params.insert("message_thread_id".into(), json!(id));
        }
        params.extend(self.extra);
    }
}

/// A file to send.
#[derive(Debug, Clone, PartialEq)]
pub enum InputFile {
    /// A file already stored on the Telegram servers.
    FileId(String),
    /// A file the server downloads itself.
    Url(String),
    /// A file uploaded with the request (multipart).
    Upload { file_name: String, bytes: Vec<u8> },
}

/// The message an edit applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageTarget {
    Chat { chat_id: ChatId, message_id: i64 },
    Inline(String),
}

impl MessageTarget {
    fn apply(self, params: &mut Map<String, Value>) {
        match self {
            Self::Chat {
                chat_id,
                message_id,
            } => {
                params.insert("chat_id".into(), json!(chat_id));
                params.insert("message_id".into(), json!(message_id));
            }
            Self::Inline(id) => {
                params.insert("inline_message_id".into(), json!(id));
            }
        }
    }
}

impl From<&Message> for MessageTarget {
    fn from(message: &Message) -> Self {
        Self::Chat {
            chat_id: ChatId::Id(message.chat.id),
            message_id: message.message_id,
        }
    }
}

// =============================================================================
// BotApi
// =============================================================================

/// Typed, rate-limit-aware access to the Bot API.
///
/// Cheap to clone; clones share the underlying caller.
#[derive(Clone)]
pub struct BotApi {
    caller: Arc<dyn ApiCaller>,
    retry_margin: Duration,
}

impl BotApi {
    pub fn new(caller: Arc<dyn ApiCaller>) -> Self {
        Self {
            caller,
            retry_margin: DEFAULT_RETRY_MARGIN,
        }
    }

    /// Sets the extra wait added to every `retry_after`.
    pub fn with_retry_margin(mut self, margin: Duration) -> Self {
        self.retry_margin = margin;
        self
    }

    pub fn retry_margin(&self) -> Duration {
        self.retry_margin
    }

    /// Calls `method`, waiting out rate limits.
    ///
    /// Returns the envelope's `result` or the first error that is not a
    /// rate limit.
    pub async fn call(&self, method: &str, payload: Payload) -> ApiResult<Value> {
        loop {
            match self.caller.call(method, &payload).await {
                Err(ApiError::RetryAfter { secs }) => {
                    let wait = Duration::from_secs(secs) + self.retry_margin;
                    warn!(method, retry_after = secs, wait_ms = wait.as_millis() as u64, "Rate limited");
                    tokio::time::sleep(wait).await;
                    debug!(method, "Repeating rate-limited call");
                }
                outcome => return outcome,
            }
        }
    }

    /// Calls `method` with serializable parameters and decodes the result.
    pub async fn call_as<T, P>(&self, method: &str, params: &P) -> ApiResult<T>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let result = self.call(method, Payload::json(params)?).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Fetches pending updates as raw JSON.
    pub async fn get_updates(&self, request: &GetUpdates) -> ApiResult<Vec<Value>> {
        self.call_as("getUpdates", request).await
    }

    /// Sends a text message.
    pub async fn send_message(
        &self,
        chat_id: impl Into<ChatId>,
        text: &str,
        options: SendOptions,
    ) -> ApiResult<Message> {
        let mut params = Map::new();
        params.insert("chat_id".into(), json!(chat_id.into()));
        params.insert("text".into(), json!(text));
        options.apply(&mut params);

        let result = self.call("sendMessage", Payload::Json(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Sends a general file.
    ///
    /// [`InputFile::Upload`] is sent as a multipart form, the other variants
    /// as JSON.
    pub async fn send_document(
        &self,
        chat_id: impl Into<ChatId>,
        document: InputFile,
        caption: Option<&str>,
        options: SendOptions,
    ) -> ApiResult<Message> {
        let mut params = Map::new();
        params.insert("chat_id".into(), json!(chat_id.into()));
        if let Some(caption) = caption {
            params.insert("caption".into(), json!(caption));
        }
        options.apply(&mut params);

        let payload = match document {
            InputFile::FileId(id) | InputFile::Url(id) => {
                params.insert("document".into(), json!(id));
                Payload::Json(params)
            }
            InputFile::Upload { file_name, bytes } => Payload::Multipart(
                MultipartPayload::from_json(params).file("document", file_name, bytes),
            ),
        };

        let result = self.call("sendDocument", payload).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Answers a callback query, optionally showing a notification or alert.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> ApiResult<bool> {
        let mut params = Map::new();
        params.insert("callback_query_id".into(), json!(callback_query_id));
        if let Some(text) = text {
            params.insert("text".into(), json!(text));
        }
        if show_alert {
            params.insert("show_alert".into(), json!(true));
        }

        let result = self.call("answerCallbackQuery", Payload::Json(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Edits the text of a message.
    ///
    /// Returns the edited [`Message`] as JSON, or `true` for inline messages.
    pub async fn edit_message_text(
        &self,
        target: MessageTarget,
        text: &str,
        options: SendOptions,
    ) -> ApiResult<Value> {
        let mut params = Map::new();
        target.apply(&mut params);
        params.insert("text".into(), json!(text));
        options.apply(&mut params);

        self.call("editMessageText", Payload::Json(params)).await
    }
}

macro_rules! impl_api {
    ($(#[$meta:meta])* $name:ident = $method:literal, ($($arg:ident: $typ:ty),*) -> $ret:ty $(,)?) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $typ),*) -> ApiResult<$ret> {
            self.call_as($method, &json!({ $(stringify!($arg): $arg),* })).await
        }
    };
}

impl BotApi {
    impl_api!(
        /// Returns the bot's own user.
        get_me = "getMe",
        () -> User
    );

    impl_api!(
        /// Deletes a message.
        delete_message = "deleteMessage",
        (chat_id: ChatId, message_id: i64) -> bool
    );

    impl_api!(get_chat = "getChat", (chat_id: ChatId) -> Chat);

    impl_api!(
        get_chat_member = "getChatMember",
        (chat_id: ChatId, user_id: i64) -> ChatMember
    );

    impl_api!(leave_chat = "leaveChat", (chat_id: ChatId) -> bool);

    impl_api!(
        approve_chat_join_request = "approveChatJoinRequest",
        (chat_id: ChatId, user_id: i64) -> bool
    );

    impl_api!(
        decline_chat_join_request = "declineChatJoinRequest",
        (chat_id: ChatId, user_id: i64) -> bool
    );
}

impl fmt::Debug for BotApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotApi")
            .field("retry_margin", &self.retry_margin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::model::InlineKeyboardButton;
    use courier_transport::MockApiCaller;

    fn message_json(chat_id: i64, text: &str) -> Value {
        json!({
            "message_id": 10,
            "date": 0,
            "chat": { "id": chat_id, "type": "private" },
            "text": text
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_is_honoured() {
        let mock = Arc::new(
            MockApiCaller::new()
                .fail("getMe", ApiError::RetryAfter { secs: 3 })
                .respond("getMe", json!({ "id": 1, "is_bot": true, "first_name": "bot" })),
        );
        let api = BotApi::new(mock.clone()).with_retry_margin(Duration::from_millis(500));

        let started = tokio::time::Instant::now();
        let call = tokio::spawn(async move { api.get_me().await });

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(mock.calls_to("getMe").len(), 1);

        let me = call.await.unwrap().unwrap();
        assert!(started.elapsed() >= Duration::from_millis(3500));
        assert_eq!(me.id, 1);
        assert_eq!(mock.calls_to("getMe").len(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let mock = Arc::new(MockApiCaller::new().fail(
            "getMe",
            ApiError::Api {
                code: 401,
                description: "Unauthorized".into(),
            },
        ));
        let api = BotApi::new(mock.clone());

        let err = api.get_me().await.unwrap_err();
        assert!(matches!(err, ApiError::Api { code: 401, .. }));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_send_message_parameters() {
        let mock = Arc::new(MockApiCaller::new().respond("sendMessage", message_json(5, "hi")));
        let api = BotApi::new(mock.clone());

        let options = SendOptions::default()
            .parse_mode(ParseMode::Html)
            .keyboard(
                InlineKeyboardMarkup::default()
                    .row(vec![InlineKeyboardButton::callback("ok", "ok")]),
            )
            .extra("protect_content", true)
            .extra("parse_mode", "MarkdownV2");
        let sent = api.send_message(5, "hi", options).await.unwrap();
        assert_eq!(sent.text.as_deref(), Some("hi"));

        let call = &mock.calls_to("sendMessage")[0];
        assert_eq!(call.payload.get("chat_id"), Some(json!(5)));
        assert_eq!(call.payload.get("text"), Some(json!("hi")));
        assert_eq!(call.payload.get("protect_content"), Some(json!(true)));
        // extra wins over typed fields
        assert_eq!(call.payload.get("parse_mode"), Some(json!("MarkdownV2")));
        assert!(call.payload.get("reply_markup").is_some());
        assert!(call.payload.get("disable_notification").is_none());
    }

    #[tokio::test]
    async fn test_send_document_upload_is_multipart() {
        let mock = Arc::new(MockApiCaller::new().respond("sendDocument", message_json(5, "")));
        let api = BotApi::new(mock.clone());

        let file = InputFile::Upload {
            file_name: "report.txt".into(),
            bytes: b"data".to_vec(),
        };
        api.send_document(5, file, Some("weekly"), SendOptions::default())
            .await
            .unwrap();

        let call = &mock.calls_to("sendDocument")[0];
        match &call.payload {
            Payload::Multipart(form) => {
                assert_eq!(form.files[0].field, "document");
                assert_eq!(form.files[0].file_name, "report.txt");
                assert!(form.fields.contains(&("caption".into(), "weekly".into())));
            }
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_document_by_id_is_json() {
        let mock = Arc::new(MockApiCaller::new().respond("sendDocument", message_json(5, "")));
        let api = BotApi::new(mock.clone());

        api.send_document(
            "@news",
            InputFile::FileId("BQAC".into()),
            None,
            SendOptions::default(),
        )
        .await
        .unwrap();

        let call = &mock.calls_to("sendDocument")[0];
        assert_eq!(call.payload.get("chat_id"), Some(json!("@news")));
        assert_eq!(call.payload.get("document"), Some(json!("BQAC")));
    }

    #[tokio::test]
    async fn test_edit_inline_message() {
        let mock = Arc::new(MockApiCaller::new().respond("editMessageText", json!(true)));
        let api = BotApi::new(mock.clone());

        let result = api
            .edit_message_text(MessageTarget::Inline("abc".into()), "new", SendOptions::default())
            .await
            .unwrap();
        assert_eq!(result, json!(true));

        let call = &mock.calls_to("editMessageText")[0];
        assert_eq!(call.payload.get("inline_message_id"), Some(json!("abc")));
        assert!(call.payload.get("chat_id").is_none());
    }

    #[tokio::test]
    async fn test_get_updates_omits_absent_offset() {
        let mock = Arc::new(MockApiCaller::new().respond("getUpdates", json!([])));
        let api = BotApi::new(mock.clone());

        let request = GetUpdates {
            timeout: Some(30),
            ..GetUpdates::default()
        };
        assert!(api.get_updates(&request).await.unwrap().is_empty());

        let call = &mock.calls_to("getUpdates")[0];
        assert!(call.payload.get("offset").is_none());
        assert!(call.payload.get("allowed_updates").is_none());
        assert_eq!(call.payload.get("timeout"), Some(json!(30)));
    }

    #[tokio::test]
    async fn test_answer_callback_query() {
        let mock = Arc::new(MockApiCaller::new().respond("answerCallbackQuery", json!(true)));
        let api = BotApi::new(mock.clone());

        assert!(api.answer_callback_query("42", Some("done"), false).await.unwrap());
        let call = &mock.calls_to("answerCallbackQuery")[0];
        assert_eq!(call.payload.get("text"), Some(json!("done")));
        assert!(call.payload.get("show_alert").is_none());
    }
}
