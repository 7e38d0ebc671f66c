//! Extractor system for the Courier framework.
//!
//! This module provides the [`FromContext`] trait, which defines how types
//! can be extracted from an [`UpdateContext`] for use as handler parameters.
//!
//! Every typed record can be requested directly:
//!
//! ```rust,ignore
//! async fn on_message(message: Message, api: BotApi) -> anyhow::Result<()> {
//!     api.send_message(message.chat.id, "pong", SendOptions::default()).await?;
//!     Ok(())
//! }
//!
//! async fn on_query(query: CallbackQuery, sender: Option<User>) { /* ... */ }
//! ```

use std::sync::Arc;

use serde_json::Value;

use courier_core::model::{
    CallbackQuery, Chat, ChatJoinRequest, ChatMemberUpdated, ChosenInlineResult, InlineQuery,
    Message, Poll, PollAnswer, PreCheckoutQuery, ShippingQuery, User,
};
use courier_core::{TypedEvent, Update};

use crate::api::BotApi;
use crate::context::UpdateContext;
use crate::error::ExtractResult;

/// A trait for types that can be extracted from an [`UpdateContext`].
///
/// If extraction fails the handler is not called and the failure is reported
/// as a handler error for that update.
///
/// # Example
///
/// ```rust,ignore
/// struct ChatTitle(String);
///
/// impl FromContext for ChatTitle {
///     fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self> {
///         ctx.chat()
///             .and_then(|chat| chat.title.clone())
///             .map(ChatTitle)
///             .ok_or_else(|| ExtractError::custom("chat has no title"))
///     }
/// }
/// ```
pub trait FromContext: Sized {
    fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self>;
}

/// `Option<T>` never fails; it is `None` when `T` cannot be extracted.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}

impl FromContext for Arc<UpdateContext> {
    fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self> {
        Ok(Arc::clone(ctx))
    }
}

impl FromContext for BotApi {
    fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self> {
        Ok(ctx.api().clone())
    }
}

/// The raw update; available to every handler, including raw ones.
impl FromContext for Update {
    fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self> {
        Ok(ctx.update().clone())
    }
}

/// The raw update JSON.
impl FromContext for Value {
    fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self> {
        Ok(ctx.update().raw().clone())
    }
}

impl FromContext for TypedEvent {
    fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self> {
        ctx.event().cloned().ok_or_else(|| ctx.missing::<Self>())
    }
}

/// The user that caused the update.
impl FromContext for User {
    fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self> {
        ctx.sender().cloned().ok_or_else(|| ctx.missing::<Self>())
    }
}

/// The chat the update happened in.
impl FromContext for Chat {
    fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self> {
        ctx.chat().cloned().ok_or_else(|| ctx.missing::<Self>())
    }
}

macro_rules! impl_from_event {
    ($ty:ty => $($variant:ident)|+) => {
        impl FromContext for $ty {
            fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self> {
                match ctx.event() {
                    $(Some(TypedEvent::$variant(inner)) => Ok(inner.clone()),)+
                    _ => Err(ctx.missing::<Self>()),
                }
            }
        }
    };
}

// Any member of the message family.
impl_from_event!(Message => Message | EditedMessage | ChannelPost | EditedChannelPost);
impl_from_event!(InlineQuery => InlineQuery);
impl_from_event!(ChosenInlineResult => ChosenInlineResult);
impl_from_event!(CallbackQuery => CallbackQuery);
impl_from_event!(ShippingQuery => ShippingQuery);
impl_from_event!(PreCheckoutQuery => PreCheckoutQuery);
impl_from_event!(Poll => Poll);
impl_from_event!(PollAnswer => PollAnswer);
impl_from_event!(ChatMemberUpdated => MyChatMember | ChatMember);
impl_from_event!(ChatJoinRequest => ChatJoinRequest);

/// A `/command args` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name without the slash or `@botname` suffix.
    pub name: String,
    /// Everything after the command, leading whitespace trimmed.
    pub args: String,
}

impl FromContext for Command {
    fn from_context(ctx: &Arc<UpdateContext>) -> ExtractResult<Self> {
        ctx.message()
            .and_then(Message::command)
            .map(|(name, args)| Command {
                name: name.to_string(),
                args: args.to_string(),
            })
            .ok_or_else(|| ctx.missing::<Self>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::UpdateKind;
    use courier_transport::MockApiCaller;
    use serde_json::json;

    use crate::error::ExtractError;

    fn context(raw: Value) -> Arc<UpdateContext> {
        let update = Update::from_value(raw).unwrap();
        let event = update.decode().and_then(Result::ok);
        let api = BotApi::new(Arc::new(MockApiCaller::new()));
        Arc::new(UpdateContext::new(update, event, api))
    }

    fn edited(text: &str) -> Arc<UpdateContext> {
        context(json!({
            "update_id": 3,
            "edited_message": {
                "message_id": 1,
                "date": 0,
                "chat": { "id": 5, "type": "private" },
                "from": { "id": 7, "first_name": "Ada" },
                "text": text
            }
        }))
    }

    #[test]
    fn test_message_from_any_family_member() {
        let ctx = edited("/echo hi there");
        let message = Message::from_context(&ctx).unwrap();
        assert_eq!(message.chat.id, 5);
        assert_eq!(ctx.kind(), Some(UpdateKind::EditedMessage));
    }

    #[test]
    fn test_mismatched_record_fails() {
        let ctx = edited("hi");
        let err = CallbackQuery::from_context(&ctx).unwrap_err();
        match err {
            ExtractError::Missing { kind, update_id, .. } => {
                assert_eq!(kind, "edited_message");
                assert_eq!(update_id, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(Option::<CallbackQuery>::from_context(&ctx).unwrap().is_none());
    }

    #[test]
    fn test_command_extractor() {
        let command = Command::from_context(&edited("/echo hi there")).unwrap();
        assert_eq!(command.name, "echo");
        assert_eq!(command.args, "hi there");
        assert!(Command::from_context(&edited("plain")).is_err());
    }

    #[test]
    fn test_sender_and_raw() {
        let ctx = edited("hi");
        assert_eq!(User::from_context(&ctx).unwrap().id, 7);
        assert_eq!(Value::from_context(&ctx).unwrap()["update_id"], 3);
    }

    #[test]
    fn test_unknown_update_only_offers_raw() {
        let ctx = context(json!({ "update_id": 9, "business_connection": {} }));
        assert!(Update::from_context(&ctx).is_ok());
        assert!(TypedEvent::from_context(&ctx).is_err());
        assert!(Chat::from_context(&ctx).is_err());
    }
}
