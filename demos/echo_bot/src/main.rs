//! Echo Bot Example
//!
//! A small Telegram bot built on Courier with Axum-style handler functions.
//!
//! # Handler Categories
//!
//! Every handler is registered for one category:
//!
//! ```text
//! Raw            every update, including unknown ones
//! Message        new messages only
//! AnyMessage     new/edited messages and (edited) channel posts
//! CallbackQuery  inline keyboard presses
//! ```
//!
//! All handlers of an update run concurrently; one failing does not stop
//! the others.
//!
//! # Usage
//!
//! ```bash
//! COURIER_BOT__TOKEN=123456:ABC cargo run --package echo-bot
//! cargo run --package echo-bot -- --token 123456:ABC --workers 8 --skip-updates
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use courier::prelude::*;
use courier::runtime::ConfigLoader;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(about = "Echo bot for the Courier framework")]
struct Args {
    /// Configuration file (defaults to courier.toml in the current directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bot token; overrides the configuration.
    #[arg(short, long)]
    token: Option<String>,

    /// Number of workers; overrides the configuration.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Drop the updates sent while the bot was offline.
    #[arg(long)]
    skip_updates: bool,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Logs every update, whatever its category.
async fn logging_handler(update: Update) {
    info!(
        update_id = update.id(),
        kind = update.kind().map_or("unknown", UpdateKind::key),
        "Update received"
    );
}

/// Logs edits and channel posts as well as new messages.
async fn audit_handler(message: Message, update: Update) {
    let author = message
        .from
        .as_ref()
        .map_or_else(|| message.chat.id.to_string(), User::full_name);
    info!(
        kind = update.kind().map_or("unknown", UpdateKind::key),
        chat_id = message.chat.id,
        "{}: {}",
        author,
        message.text_or_caption().unwrap_or("<no text>")
    );
}

/// Dispatches the bot's commands.
async fn command_handler(command: Command, message: Message, api: BotApi) -> Result<()> {
    match command.name.as_str() {
        "echo" if !command.args.is_empty() => {
            api.send_message(
                message.chat.id,
                &command.args,
                SendOptions::default().reply_to(message.message_id),
            )
            .await?;
        }
        "ping" => {
            api.send_message(message.chat.id, "Pong! 🏓", SendOptions::default())
                .await?;
        }
        "help" => {
            let keyboard = InlineKeyboardMarkup::default()
                .row(vec![
                    InlineKeyboardButton::callback("Ping", "ping"),
                    InlineKeyboardButton::callback("Info", "info"),
                ])
                .row(vec![InlineKeyboardButton::url(
                    "Bot API",
                    "https://core.telegram.org/bots/api",
                )]);
            api.send_message(
                message.chat.id,
                "<b>Echo Bot</b>\n\
                 /echo &lt;text&gt; - Echo text\n\
                 /ping - Pong!\n\
                 /info - Message info\n\
                 /help - This help",
                SendOptions::default()
                    .parse_mode(ParseMode::Html)
                    .keyboard(keyboard),
            )
            .await?;
        }
        "info" => {
            api.send_message(message.chat.id, &info_text(&message), SendOptions::default())
                .await?;
        }
        _ => {}
    }
    Ok(())
}

/// Echoes plain (non-command) text back.
async fn echo_plain_handler(message: Message, ctx: std::sync::Arc<UpdateContext>) -> Result<()> {
    match message.text.as_deref() {
        Some(text) if !text.starts_with('/') => {
            ctx.reply(text).await?;
        }
        _ => {}
    }
    Ok(())
}

/// Answers presses on the /help keyboard.
async fn callback_handler(query: CallbackQuery, api: BotApi) -> Result<()> {
    let answer = match query.data.as_deref() {
        Some("ping") => "Pong! 🏓".to_string(),
        Some("info") => query
            .message
            .as_ref()
            .map_or_else(|| "Message no longer available".to_string(), info_text),
        _ => "Unknown button".to_string(),
    };

    if let Err(e) = api.answer_callback_query(&query.id, Some(&answer), false).await {
        error!("Failed to answer callback query: {:?}", e);
    }
    Ok(())
}

fn info_text(message: &Message) -> String {
    let from = message
        .from
        .as_ref()
        .map_or_else(|| "Unknown".to_string(), User::mention);
    format!(
        "📋 Message Info\n\
         • Chat: {} ({:?})\n\
         • From: {}\n\
         • Message ID: {}",
        message.chat.id, message.chat.kind, from, message.message_id
    )
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new().with_current_dir();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;

    // Command-line flags win over files and environment
    if let Some(token) = args.token {
        config.bot.token = token;
    }
    if let Some(workers) = args.workers {
        config.bot.workers = workers;
    }
    config.bot.skip_updates |= args.skip_updates;

    let mut bot = Bot::from_config(&config)?;

    bot.register(HandlerKind::Raw, logging_handler);
    bot.register(HandlerKind::AnyMessage, audit_handler);
    bot.load(
        &HandlerSet::new("commands")
            .on(HandlerKind::Message, command_handler)
            .on(HandlerKind::Message, echo_plain_handler)
            .on(HandlerKind::CallbackQuery, callback_handler),
    );

    info!(handlers = bot.registry().len(), "Starting echo bot");
    bot.activate()?;

    Ok(())
}
