//! Raw updates and their category tags.
//!
//! An [`Update`] is one entry of a `getUpdates` batch: an integer
//! `update_id` plus exactly one category key carrying the payload. The
//! category is detected once, when the update is created, and exposed as an
//! [`UpdateKind`].
//!
//! Handlers are registered against a [`HandlerKind`], which is an
//! `UpdateKind` extended with two catch-alls:
//!
//! ```text
//! HandlerKind::Raw         ← every update, matched or not
//! HandlerKind::AnyMessage  ← message | edited_message | channel_post | edited_channel_post
//! HandlerKind::Message     ← message only
//! HandlerKind::CallbackQuery, …  ← one per UpdateKind
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{DecodeError, DecodeResult};

// ============================================================================
// UpdateKind
// ============================================================================

/// The category of an update, named after its top-level key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// `message`: a new incoming message.
    Message,
    /// `edited_message`: a known message was edited.
    EditedMessage,
    /// `channel_post`: a new channel post.
    ChannelPost,
    /// `edited_channel_post`: a known channel post was edited.
    EditedChannelPost,
    /// `inline_query`
    InlineQuery,
    /// `chosen_inline_result`
    ChosenInlineResult,
    /// `callback_query`
    CallbackQuery,
    /// `shipping_query`
    ShippingQuery,
    /// `pre_checkout_query`
    PreCheckoutQuery,
    /// `poll`: a poll changed state.
    Poll,
    /// `poll_answer`: a user changed their answer in a non-anonymous poll.
    PollAnswer,
    /// `my_chat_member`: the bot's own membership changed.
    MyChatMember,
    /// `chat_member`: another member's status changed.
    ChatMember,
    /// `chat_join_request`
    ChatJoinRequest,
}

impl UpdateKind {
    /// All kinds, in detection priority order.
    pub const ALL: [UpdateKind; 14] = [
        UpdateKind::Message,
        UpdateKind::EditedMessage,
        UpdateKind::ChannelPost,
        UpdateKind::EditedChannelPost,
        UpdateKind::InlineQuery,
        UpdateKind::ChosenInlineResult,
        UpdateKind::CallbackQuery,
        UpdateKind::ShippingQuery,
        UpdateKind::PreCheckoutQuery,
        UpdateKind::Poll,
        UpdateKind::PollAnswer,
        UpdateKind::MyChatMember,
        UpdateKind::ChatMember,
        UpdateKind::ChatJoinRequest,
    ];

    /// The top-level key carrying this kind's payload.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::EditedMessage => "edited_message",
            Self::ChannelPost => "channel_post",
            Self::EditedChannelPost => "edited_channel_post",
            Self::InlineQuery => "inline_query",
            Self::ChosenInlineResult => "chosen_inline_result",
            Self::CallbackQuery => "callback_query",
            Self::ShippingQuery => "shipping_query",
            Self::PreCheckoutQuery => "pre_checkout_query",
            Self::Poll => "poll",
            Self::PollAnswer => "poll_answer",
            Self::MyChatMember => "my_chat_member",
            Self::ChatMember => "chat_member",
            Self::ChatJoinRequest => "chat_join_request",
        }
    }

    /// Looks a kind up by its top-level key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Whether this kind belongs to the message family, i.e. also fires
    /// [`HandlerKind::AnyMessage`] handlers.
    pub const fn is_message(self) -> bool {
        matches!(
            self,
            Self::Message | Self::EditedMessage | Self::ChannelPost | Self::EditedChannelPost
        )
    }

    /// Detects the kind of a raw update object.
    ///
    /// Keys are checked in [`UpdateKind::ALL`] order and the first present one
    /// wins.
    pub fn detect(update: &serde_json::Map<String, Value>) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| update.contains_key(kind.key()))
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// HandlerKind
// ============================================================================

/// The category a handler is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Every update, whether or not its category is known.
    Raw,
    /// Every update of the message family.
    AnyMessage,
    /// New messages only.
    Message,
    /// Edited messages.
    EditedMessage,
    /// Channel posts.
    ChannelPost,
    /// Edited channel posts.
    EditedChannelPost,
    /// Inline queries.
    InlineQuery,
    /// Chosen inline results.
    ChosenInlineResult,
    /// Callback queries.
    CallbackQuery,
    /// Shipping queries.
    ShippingQuery,
    /// Pre-checkout queries.
    PreCheckoutQuery,
    /// Poll state changes.
    Poll,
    /// Poll answers.
    PollAnswer,
    /// Changes of the bot's own membership.
    MyChatMember,
    /// Changes of other members' status.
    ChatMember,
    /// Chat join requests.
    ChatJoinRequest,
}

impl HandlerKind {
    /// Returns the registration name (`"raw"`, `"any_message"`, or the
    /// update key).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::AnyMessage => "any_message",
            Self::Message => "message",
            Self::EditedMessage => "edited_message",
            Self::ChannelPost => "channel_post",
            Self::EditedChannelPost => "edited_channel_post",
            Self::InlineQuery => "inline_query",
            Self::ChosenInlineResult => "chosen_inline_result",
            Self::CallbackQuery => "callback_query",
            Self::ShippingQuery => "shipping_query",
            Self::PreCheckoutQuery => "pre_checkout_query",
            Self::Poll => "poll",
            Self::PollAnswer => "poll_answer",
            Self::MyChatMember => "my_chat_member",
            Self::ChatMember => "chat_member",
            Self::ChatJoinRequest => "chat_join_request",
        }
    }
}

impl From<UpdateKind> for HandlerKind {
    fn from(kind: UpdateKind) -> Self {
        match kind {
            UpdateKind::Message => Self::Message,
            UpdateKind::EditedMessage => Self::EditedMessage,
            UpdateKind::ChannelPost => Self::ChannelPost,
            UpdateKind::EditedChannelPost => Self::EditedChannelPost,
            UpdateKind::InlineQuery => Self::InlineQuery,
            UpdateKind::ChosenInlineResult => Self::ChosenInlineResult,
            UpdateKind::CallbackQuery => Self::CallbackQuery,
            UpdateKind::ShippingQuery => Self::ShippingQuery,
            UpdateKind::PreCheckoutQuery => Self::PreCheckoutQuery,
            UpdateKind::Poll => Self::Poll,
            UpdateKind::PollAnswer => Self::PollAnswer,
            UpdateKind::MyChatMember => Self::MyChatMember,
            UpdateKind::ChatMember => Self::ChatMember,
            UpdateKind::ChatJoinRequest => Self::ChatJoinRequest,
        }
    }
}

impl FromStr for HandlerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "any_message" => Ok(Self::AnyMessage),
            other => UpdateKind::from_key(other)
                .map(Self::from)
                .ok_or_else(|| format!("unknown handler kind '{s}'")),
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Update
// ============================================================================

/// One raw update as returned by `getUpdates`.
///
/// The JSON is kept untouched so that raw handlers see exactly what the
/// server sent; the category is detected at construction.
#[derive(Debug, Clone)]
pub struct Update {
    id: i64,
    kind: Option<UpdateKind>,
    raw: Value,
}

impl Update {
    /// Wraps a raw JSON update.
    ///
    /// Fails if the value is not an object or carries no integer `update_id`.
    pub fn from_value(raw: Value) -> DecodeResult<Self> {
        let object = raw.as_object().ok_or(DecodeError::NotAnObject)?;
        let id = object
            .get("update_id")
            .and_then(Value::as_i64)
            .ok_or(DecodeError::MissingUpdateId)?;
        let kind = UpdateKind::detect(object);

        Ok(Self { id, kind, raw })
    }

    /// The `update_id`.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// The detected category, `None` if no known key is present.
    pub fn kind(&self) -> Option<UpdateKind> {
        self.kind
    }

    /// The full raw JSON object.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The payload stored under the detected category key.
    pub fn payload(&self) -> Option<&Value> {
        self.kind.and_then(|kind| self.raw.get(kind.key()))
    }

    /// Top-level keys other than `update_id`, for diagnostics.
    pub fn keys(&self) -> Vec<&str> {
        self.raw
            .as_object()
            .map(|object| {
                object
                    .keys()
                    .map(String::as_str)
                    .filter(|key| *key != "update_id")
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Consumes the update and returns the raw JSON.
    pub fn into_raw(self) -> Value {
        self.raw
    }
}

impl TryFrom<Value> for Update {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detects_each_kind_by_key() {
        for kind in UpdateKind::ALL {
            let mut raw = serde_json::Map::new();
            raw.insert("update_id".into(), json!(1));
            raw.insert(kind.key().into(), json!({}));
            let update = Update::from_value(Value::Object(raw)).unwrap();
            assert_eq!(update.kind(), Some(kind));
        }
    }

    #[test]
    fn test_detection_follows_priority_order() {
        let update = Update::from_value(json!({
            "update_id": 7,
            "callback_query": {},
            "edited_message": {}
        }))
        .unwrap();
        assert_eq!(update.kind(), Some(UpdateKind::EditedMessage));
    }

    #[test]
    fn test_unknown_kind_keeps_raw() {
        let update = Update::from_value(json!({ "update_id": 3, "business_message": {} })).unwrap();
        assert_eq!(update.kind(), None);
        assert!(update.payload().is_none());
        assert_eq!(update.keys(), vec!["business_message"]);
    }

    #[test]
    fn test_missing_update_id_is_rejected() {
        let err = Update::from_value(json!({ "message": {} })).unwrap_err();
        assert!(matches!(err, DecodeError::MissingUpdateId));
        let err = Update::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject));
    }

    #[test]
    fn test_message_family() {
        let family: Vec<_> = UpdateKind::ALL
            .into_iter()
            .filter(|kind| kind.is_message())
            .collect();
        assert_eq!(
            family,
            vec![
                UpdateKind::Message,
                UpdateKind::EditedMessage,
                UpdateKind::ChannelPost,
                UpdateKind::EditedChannelPost
            ]
        );
    }

    #[test]
    fn test_handler_kind_from_str() {
        assert_eq!("raw".parse::<HandlerKind>(), Ok(HandlerKind::Raw));
        assert_eq!(
            "Any_Message".parse::<HandlerKind>(),
            Ok(HandlerKind::AnyMessage)
        );
        assert_eq!(
            "chat_join_request".parse::<HandlerKind>(),
            Ok(HandlerKind::ChatJoinRequest)
        );
        assert!("onMessage".parse::<HandlerKind>().is_err());
    }
}
