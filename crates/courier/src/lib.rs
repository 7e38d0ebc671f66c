//! # Courier
//!
//! A typed, concurrent client framework for the Telegram Bot API.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐  getUpdates  ┌─────────────┐     ┌─────────────┐     ┌────────────┐
//! │ Poller │─────────────▶│ UpdateQueue │────▶│ WorkerPool  │────▶│ Dispatcher │──▶ handlers
//! └────────┘   (offset)   └─────────────┘     │ (N workers) │     └────────────┘
//!                                             └─────────────┘
//! ```
//!
//! - **Poller**: long-polls the Bot API, advancing the offset so each update
//!   is delivered once
//! - **UpdateQueue**: unbounded FIFO between fetching and handling
//! - **WorkerPool**: N workers, each dispatching one update at a time
//! - **Dispatcher**: runs every handler registered for the update's category
//!   concurrently, isolating failures
//! - **Handlers**: async functions whose parameters are extractors (Axum-style)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! async fn echo(message: Message, api: BotApi) -> anyhow::Result<()> {
//!     if let Some(text) = &message.text {
//!         api.send_message(message.chat.id, text, SendOptions::default()).await?;
//!     }
//!     Ok(())
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut bot = Bot::builder().build()?;
//!     bot.register(HandlerKind::Message, echo);
//!     bot.activate()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `http-client` *(default)*: `reqwest`-based API client
//! - `toml-config` *(default)*: `courier.toml` configuration files
//! - `yaml-config`: `courier.yaml` configuration files
//! - `json-log`: JSON log output

pub use courier_core as core;
pub use courier_framework as framework;
pub use courier_runtime as runtime;
pub use courier_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use courier_runtime::{Bot, BotConfig, CourierConfig, RunningBot};

    // Handlers and modules
    pub use courier_core::{HandlerKind, Update, UpdateKind};
    pub use courier_framework::{
        BoxedHandler, HandlerResult, HandlerSet, Module, UpdateContext, on,
    };

    // Extractors - for handler parameters
    pub use courier_framework::{Command, FromContext};
    pub use courier_core::TypedEvent;
    pub use courier_core::model::{
        CallbackQuery, Chat, ChatJoinRequest, ChatMemberUpdated, ChosenInlineResult,
        InlineKeyboardButton, InlineKeyboardMarkup, InlineQuery, Message, Poll, PollAnswer,
        PreCheckoutQuery, ShippingQuery, User,
    };

    // Outbound API
    pub use courier_framework::{BotApi, ChatId, InputFile, MessageTarget, ParseMode, SendOptions};

    // Logging macros
    pub use courier_runtime::prelude::*;
}
