//! Typed Bot API records.
//!
//! Every record derives `Deserialize`; optional fields are `Option<T>` and
//! decode to `None` when the key is absent. A missing required field (for
//! example `chat` in a [`Message`]) makes decoding fail with a serde error
//! naming the field.

pub mod chat;
pub mod message;
pub mod poll;
pub mod query;
pub mod user;

pub use chat::{
    Chat, ChatInviteLink, ChatJoinRequest, ChatMember, ChatMemberStatus, ChatMemberUpdated,
    ChatType,
};
pub use message::{Document, InlineKeyboardButton, InlineKeyboardMarkup, Message, MessageEntity};
pub use poll::{Poll, PollAnswer, PollOption};
pub use query::{
    CallbackQuery, ChosenInlineResult, InlineQuery, Location, OrderInfo, PreCheckoutQuery,
    ShippingAddress, ShippingQuery,
};
pub use user::User;
