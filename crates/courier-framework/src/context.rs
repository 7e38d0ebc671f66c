//! Per-update context handed to handlers.
//!
//! One [`UpdateContext`] is built for each dispatched update and shared, as an
//! `Arc`, by every handler invoked for it. It owns the raw update, the typed
//! event decoded from it (if any) and a handle to the Bot API.

use anyhow::anyhow;

use courier_core::model::{Chat, Message, User};
use courier_core::{TypedEvent, Update, UpdateKind};

use crate::api::{BotApi, SendOptions};
use crate::error::ExtractError;

/// Everything a handler can see about the update it was invoked for.
#[derive(Debug)]
pub struct UpdateContext {
    update: Update,
    event: Option<TypedEvent>,
    api: BotApi,
}

impl UpdateContext {
    pub fn new(update: Update, event: Option<TypedEvent>, api: BotApi) -> Self {
        Self { update, event, api }
    }

    /// The raw update, exactly as received.
    pub fn update(&self) -> &Update {
        &self.update
    }

    pub fn update_id(&self) -> i64 {
        self.update.id()
    }

    /// The detected category, `None` for unknown updates.
    pub fn kind(&self) -> Option<UpdateKind> {
        self.update.kind()
    }

    /// The decoded event; `None` when the category is unknown or decoding
    /// failed (only raw handlers run in those cases).
    pub fn event(&self) -> Option<&TypedEvent> {
        self.event.as_ref()
    }

    pub fn api(&self) -> &BotApi {
        &self.api
    }

    /// The message, for updates of the message family.
    pub fn message(&self) -> Option<&Message> {
        self.event.as_ref().and_then(TypedEvent::message)
    }

    pub fn chat(&self) -> Option<&Chat> {
        self.event.as_ref().and_then(TypedEvent::chat)
    }

    pub fn sender(&self) -> Option<&User> {
        self.event.as_ref().and_then(TypedEvent::sender)
    }

    /// Sends `text` to the chat this update happened in.
    pub async fn reply(&self, text: &str) -> anyhow::Result<Message> {
        let chat_id = self
            .chat()
            .map(|chat| chat.id)
            .ok_or_else(|| anyhow!("update {} has no chat to reply to", self.update_id()))?;

        Ok(self
            .api
            .send_message(chat_id, text, SendOptions::default())
            .await?)
    }

    pub(crate) fn missing<T>(&self) -> ExtractError {
        ExtractError::Missing {
            expected: std::any::type_name::<T>(),
            kind: self.kind().map_or("unknown", UpdateKind::key),
            update_id: self.update_id(),
        }
    }
}
