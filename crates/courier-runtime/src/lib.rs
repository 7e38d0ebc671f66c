//! Courier Runtime - the update pipeline of the Courier framework.
//!
//! This crate provides:
//! - [`Bot`] / [`RunningBot`]: setup, start and graceful shutdown
//! - [`Poller`]: long-polling `getUpdates` with an exactly-once offset cursor
//! - [`UpdateQueue`]: the unbounded hand-off buffer between poller and workers
//! - [`WorkerPool`]: concurrent consumers feeding the dispatcher
//! - configuration loading ([`config`]) and logging setup ([`logging`])
//!
//! ```ignore
//! use courier_runtime::Bot;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bot = Bot::builder().build()?;
//!     bot.register(HandlerKind::Message, echo);
//!
//!     // Run until Ctrl+C
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod poller;
pub mod queue;
pub mod worker;

// Re-exports
pub use bot::{Bot, BotBuilder, RunningBot, ShutdownSummary, shutdown_signal};
pub use config::{BotConfig, ConfigError, ConfigLoader, ConfigResult, CourierConfig};
pub use error::{QueueClosed, RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use poller::Poller;
pub use queue::UpdateQueue;
pub use worker::WorkerPool;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
