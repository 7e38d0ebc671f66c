//! Messages and the records they embed.

use serde::{Deserialize, Serialize};

use super::chat::Chat;
use super::user::User;

/// A message.
///
/// Used for new messages, edited messages and (edited) channel posts alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier, unique inside the chat.
    pub message_id: i64,
    /// Date the message was sent (Unix time).
    pub date: i64,
    /// Conversation the message belongs to.
    pub chat: Chat,
    /// Forum topic thread.
    #[serde(default)]
    pub message_thread_id: Option<i64>,
    /// Sender; absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,
    /// Sender when sent on behalf of a chat.
    #[serde(default)]
    pub sender_chat: Option<Chat>,
    /// Original sender of a forwarded message.
    #[serde(default)]
    pub forward_from: Option<User>,
    /// Original channel of a forwarded post.
    #[serde(default)]
    pub forward_from_chat: Option<Chat>,
    /// Original message ID in the source channel.
    #[serde(default)]
    pub forward_from_message_id: Option<i64>,
    /// The message this one replies to.
    #[serde(default)]
    pub reply_to_message: Option<Box<Message>>,
    /// Bot through which the message was sent.
    #[serde(default)]
    pub via_bot: Option<User>,
    /// Date of the last edit (Unix time).
    #[serde(default)]
    pub edit_date: Option<i64>,
    /// Text of a text message.
    #[serde(default)]
    pub text: Option<String>,
    /// Special entities in the text.
    #[serde(default)]
    pub entities: Option<Vec<MessageEntity>>,
    /// Caption of a media message.
    #[serde(default)]
    pub caption: Option<String>,
    /// Attached general file.
    #[serde(default)]
    pub document: Option<Document>,
    /// Inline keyboard attached to the message.
    #[serde(default)]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl Message {
    /// The text, or the caption of a media message.
    pub fn text_or_caption(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    /// Splits a `/command@bot args` text into `("command", "args")`.
    ///
    /// Returns `None` unless the text starts with `/`.
    pub fn command(&self) -> Option<(&str, &str)> {
        let text = self.text.as_deref()?.strip_prefix('/')?;
        let (head, args) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        let name = head.split_once('@').map_or(head, |(name, _)| name);
        if name.is_empty() {
            return None;
        }
        Some((name, args.trim_start()))
    }
}

/// A special entity in a text message (hashtag, URL, command, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntity {
    /// Entity type, e.g. `"bot_command"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Offset in UTF-16 code units.
    pub offset: i64,
    /// Length in UTF-16 code units.
    pub length: i64,
    /// URL opened on tap, for `text_link`.
    #[serde(default)]
    pub url: Option<String>,
    /// Mentioned user, for `text_mention`.
    #[serde(default)]
    pub user: Option<User>,
}

/// A general file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier usable to download or resend the file.
    pub file_id: String,
    /// Identifier stable across bots.
    pub file_unique_id: String,
    /// Original file name.
    #[serde(default)]
    pub file_name: Option<String>,
    /// MIME type.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub file_size: Option<i64>,
}

/// An inline keyboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    /// Rows of buttons.
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// Appends a row of buttons.
    pub fn row(mut self, buttons: Vec<InlineKeyboardButton>) -> Self {
        self.inline_keyboard.push(buttons);
        self
    }
}

/// One button of an inline keyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    /// Label.
    pub text: String,
    /// URL opened on tap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Data sent back in a callback query on tap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

impl InlineKeyboardButton {
    /// A button that sends `data` back as a callback query.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: None,
            callback_data: Some(data.into()),
        }
    }

    /// A button that opens `url`.
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: Some(url.into()),
            callback_data: None,
        }
    }
}
