//! Typed view of an update.
//!
//! [`TypedEvent`] is the decoded form of an [`Update`]'s payload. Decoding is
//! done on demand, right before handlers run, and the result is owned by that
//! one dispatch.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DecodeError, DecodeResult};
use crate::model::{
    CallbackQuery, Chat, ChatJoinRequest, ChatMemberUpdated, ChosenInlineResult, InlineQuery,
    Message, Poll, PollAnswer, PreCheckoutQuery, ShippingQuery, User,
};
use crate::update::{Update, UpdateKind};

/// A decoded update payload, one variant per [`UpdateKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum TypedEvent {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    EditedChannelPost(Message),
    InlineQuery(InlineQuery),
    ChosenInlineResult(ChosenInlineResult),
    CallbackQuery(CallbackQuery),
    ShippingQuery(ShippingQuery),
    PreCheckoutQuery(PreCheckoutQuery),
    Poll(Poll),
    PollAnswer(PollAnswer),
    MyChatMember(ChatMemberUpdated),
    ChatMember(ChatMemberUpdated),
    ChatJoinRequest(ChatJoinRequest),
}

fn parse<T: DeserializeOwned>(kind: UpdateKind, payload: &Value) -> DecodeResult<T> {
    T::deserialize(payload).map_err(|source| DecodeError::Payload { kind, source })
}

impl TypedEvent {
    /// Decodes `payload` as the record belonging to `kind`.
    pub fn decode(kind: UpdateKind, payload: &Value) -> DecodeResult<Self> {
        Ok(match kind {
            UpdateKind::Message => Self::Message(parse(kind, payload)?),
            UpdateKind::EditedMessage => Self::EditedMessage(parse(kind, payload)?),
            UpdateKind::ChannelPost => Self::ChannelPost(parse(kind, payload)?),
            UpdateKind::EditedChannelPost => Self::EditedChannelPost(parse(kind, payload)?),
            UpdateKind::InlineQuery => Self::InlineQuery(parse(kind, payload)?),
            UpdateKind::ChosenInlineResult => Self::ChosenInlineResult(parse(kind, payload)?),
            UpdateKind::CallbackQuery => Self::CallbackQuery(parse(kind, payload)?),
            UpdateKind::ShippingQuery => Self::ShippingQuery(parse(kind, payload)?),
            UpdateKind::PreCheckoutQuery => Self::PreCheckoutQuery(parse(kind, payload)?),
            UpdateKind::Poll => Self::Poll(parse(kind, payload)?),
            UpdateKind::PollAnswer => Self::PollAnswer(parse(kind, payload)?),
            UpdateKind::MyChatMember => Self::MyChatMember(parse(kind, payload)?),
            UpdateKind::ChatMember => Self::ChatMember(parse(kind, payload)?),
            UpdateKind::ChatJoinRequest => Self::ChatJoinRequest(parse(kind, payload)?),
        })
    }

    /// The category this event was decoded from.
    pub fn kind(&self) -> UpdateKind {
        match self {
            Self::Message(_) => UpdateKind::Message,
            Self::EditedMessage(_) => UpdateKind::EditedMessage,
            Self::ChannelPost(_) => UpdateKind::ChannelPost,
            Self::EditedChannelPost(_) => UpdateKind::EditedChannelPost,
            Self::InlineQuery(_) => UpdateKind::InlineQuery,
            Self::ChosenInlineResult(_) => UpdateKind::ChosenInlineResult,
            Self::CallbackQuery(_) => UpdateKind::CallbackQuery,
            Self::ShippingQuery(_) => UpdateKind::ShippingQuery,
            Self::PreCheckoutQuery(_) => UpdateKind::PreCheckoutQuery,
            Self::Poll(_) => UpdateKind::Poll,
            Self::PollAnswer(_) => UpdateKind::PollAnswer,
            Self::MyChatMember(_) => UpdateKind::MyChatMember,
            Self::ChatMember(_) => UpdateKind::ChatMember,
            Self::ChatJoinRequest(_) => UpdateKind::ChatJoinRequest,
        }
    }

    /// The message, for any event of the message family.
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Message(m)
            | Self::EditedMessage(m)
            | Self::ChannelPost(m)
            | Self::EditedChannelPost(m) => Some(m),
            _ => None,
        }
    }

    /// The chat the event happened in, when it has one.
    pub fn chat(&self) -> Option<&Chat> {
        match self {
            Self::Message(m)
            | Self::EditedMessage(m)
            | Self::ChannelPost(m)
            | Self::EditedChannelPost(m) => Some(&m.chat),
            Self::CallbackQuery(q) => q.message.as_ref().map(|m| &m.chat),
            Self::PollAnswer(a) => a.voter_chat.as_ref(),
            Self::MyChatMember(u) | Self::ChatMember(u) => Some(&u.chat),
            Self::ChatJoinRequest(r) => Some(&r.chat),
            _ => None,
        }
    }

    /// The user that caused the event, when known.
    pub fn sender(&self) -> Option<&User> {
        match self {
            Self::Message(m)
            | Self::EditedMessage(m)
            | Self::ChannelPost(m)
            | Self::EditedChannelPost(m) => m.from.as_ref(),
            Self::InlineQuery(q) => Some(&q.from),
            Self::ChosenInlineResult(r) => Some(&r.from),
            Self::CallbackQuery(q) => Some(&q.from),
            Self::ShippingQuery(q) => Some(&q.from),
            Self::PreCheckoutQuery(q) => Some(&q.from),
            Self::Poll(_) => None,
            Self::PollAnswer(a) => a.user.as_ref(),
            Self::MyChatMember(u) | Self::ChatMember(u) => Some(&u.from),
            Self::ChatJoinRequest(r) => Some(&r.from),
        }
    }
}

impl Update {
    /// Decodes the payload of this update.
    ///
    /// Returns `None` when the category is unknown.
    pub fn decode(&self) -> Option<DecodeResult<TypedEvent>> {
        let kind = self.kind()?;
        let payload = self.payload()?;
        Some(TypedEvent::decode(kind, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_message() {
        let update = Update::from_value(json!({
            "update_id": 100,
            "message": {
                "message_id": 1,
                "date": 0,
                "chat": { "id": 5, "type": "private" },
                "from": { "id": 8, "first_name": "Ada" },
                "text": "hi"
            }
        }))
        .unwrap();

        let event = update.decode().unwrap().unwrap();
        assert_eq!(event.kind(), UpdateKind::Message);
        assert_eq!(event.message().and_then(|m| m.text.as_deref()), Some("hi"));
        assert_eq!(event.chat().map(|c| c.id), Some(5));
        assert_eq!(event.sender().map(|u| u.id), Some(8));
    }

    #[test]
    fn test_decode_failure_names_kind() {
        let update = Update::from_value(json!({
            "update_id": 1,
            "message": { "message_id": 1, "date": 0 }
        }))
        .unwrap();

        let err = update.decode().unwrap().unwrap_err();
        match err {
            DecodeError::Payload { kind, .. } => assert_eq!(kind, UpdateKind::Message),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_kind_has_nothing_to_decode() {
        let update = Update::from_value(json!({ "update_id": 1, "story": {} })).unwrap();
        assert!(update.decode().is_none());
    }

    #[test]
    fn test_callback_query_chat_comes_from_message() {
        let event = TypedEvent::decode(
            UpdateKind::CallbackQuery,
            &json!({
                "id": "1",
                "from": { "id": 2, "first_name": "Bo" },
                "chat_instance": "x",
                "message": {
                    "message_id": 3,
                    "date": 0,
                    "chat": { "id": -9, "type": "group" }
                }
            }),
        )
        .unwrap();
        assert!(event.message().is_none());
        assert_eq!(event.chat().map(|c| c.id), Some(-9));
    }
}
