//! The bot orchestrator.
//!
//! A [`Bot`] collects handlers; [`Bot::start`] freezes them and spawns the
//! pipeline (one poller feeding a queue drained by a worker pool), returning
//! a [`RunningBot`] handle.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use courier_runtime::Bot;
//!
//! // Loads courier.toml / COURIER_* variables and sets up logging
//! let mut bot = Bot::builder().build()?;
//! bot.register(HandlerKind::Message, echo);
//!
//! // Runs until Ctrl+C or SIGTERM
//! bot.run().await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{error, info, warn};

use courier_core::{ApiCaller, HandlerKind};
use courier_framework::{BotApi, Dispatcher, Handler, HandlerRegistry, Module};

use crate::config::{BotConfig, ConfigLoader, CourierConfig, validate_bot_config, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::poller::Poller;
use crate::queue::UpdateQueue;
use crate::worker::WorkerPool;

// =============================================================================
// Bot
// =============================================================================

/// A bot being set up: configuration, API client and handlers.
///
/// Handlers can only be registered here, through `&mut self`; once
/// [`start`](Self::start) has consumed the bot the registry is shared
/// read-only by every worker.
pub struct Bot {
    config: BotConfig,
    api: BotApi,
    registry: HandlerRegistry,
}

impl Bot {
    /// Creates a bot talking to the Bot API over HTTP.
    #[cfg(feature = "http-client")]
    pub fn new(config: BotConfig) -> RuntimeResult<Self> {
        validate_bot_config(&config)?;
        let caller = courier_transport::HttpApiCaller::new(
            &config.api_url,
            &config.token,
            config.request_timeout(),
        )?;
        Self::with_caller(config, Arc::new(caller))
    }

    /// Creates a bot talking to the Bot API over HTTP.
    #[cfg(not(feature = "http-client"))]
    pub fn new(_config: BotConfig) -> RuntimeResult<Self> {
        Err(RuntimeError::NoApiCaller)
    }

    /// Creates a bot with default settings for `token`.
    pub fn from_token(token: impl Into<String>) -> RuntimeResult<Self> {
        Self::new(BotConfig::with_token(token))
    }

    /// Creates a bot on top of a custom [`ApiCaller`].
    pub fn with_caller(config: BotConfig, caller: Arc<dyn ApiCaller>) -> RuntimeResult<Self> {
        validate_bot_config(&config)?;
        let api = BotApi::new(caller).with_retry_margin(config.retry_margin());

        Ok(Self {
            config,
            api,
            registry: HandlerRegistry::new(),
        })
    }

    /// Validates a full configuration, initializes logging from it and
    /// creates the bot.
    pub fn from_config(config: &CourierConfig) -> RuntimeResult<Self> {
        validate_config(config)?;
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            workers = config.bot.workers,
            "Bot initialized from configuration"
        );

        Self::new(config.bot.clone())
    }

    /// Creates a bot builder for configuration loading.
    pub fn builder() -> BotBuilder {
        BotBuilder::new()
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// The API client, for calls made outside handlers.
    pub fn api(&self) -> &BotApi {
        &self.api
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Registers `handler` for `kind` and returns it unchanged.
    pub fn register<H, T>(&mut self, kind: HandlerKind, handler: H) -> H
    where
        H: Handler<T>,
        T: 'static,
    {
        self.registry.register(kind, handler)
    }

    /// Registers every handler of a module. Returns how many were added.
    pub fn load<M: Module + ?Sized>(&mut self, module: &M) -> usize {
        self.registry.load(module)
    }

    /// Spawns the poller and the workers on the current Tokio runtime.
    ///
    /// Returns immediately; use the returned handle to stop the bot.
    pub fn start(self) -> RuntimeResult<RunningBot> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(RuntimeError::NoRuntime);
        }

        let Self {
            config,
            api,
            registry,
        } = self;

        if registry.is_empty() {
            warn!("Starting without any registered handler");
        }

        let cancel = CancellationToken::new();
        let queue = UpdateQueue::new();
        let dispatcher = Dispatcher::new(Arc::new(registry), api.clone());

        let workers = WorkerPool::spawn(config.workers, queue.clone(), dispatcher, cancel.clone());

        let mut poller = Poller::new(api.clone(), queue.clone(), &config);
        let poller = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                poller.run(cancel).await;
                poller
            }
        });

        info!(workers = config.workers, "Bot started");

        Ok(RunningBot {
            api,
            queue,
            poller,
            workers,
            shutdown_timeout: config.shutdown_timeout(),
            guard: cancel.clone().drop_guard(),
            cancel,
        })
    }

    /// Runs the bot until Ctrl+C or SIGTERM, then shuts it down.
    pub async fn run(self) -> RuntimeResult<()> {
        info!("Bot is running. Press Ctrl+C to stop.");
        self.run_until(shutdown_signal()).await
    }

    /// Runs the bot until `shutdown` completes, then shuts it down.
    pub async fn run_until<F>(self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let running = self.start()?;
        shutdown.await;
        running.shutdown().await;
        Ok(())
    }

    /// Builds a multi-threaded Tokio runtime and blocks the calling thread
    /// in [`run`](Self::run).
    pub fn activate(self) -> RuntimeResult<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run())
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RunningBot
// =============================================================================

/// What was left when a bot stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownSummary {
    /// The poller's final cursor.
    pub offset: Option<i64>,
    /// Updates fetched but never dispatched.
    pub unprocessed: usize,
    /// Workers aborted after the grace period.
    pub aborted_workers: usize,
}

/// Handle to a started bot.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) still
/// signals the tasks to stop, but does not wait for them.
pub struct RunningBot {
    api: BotApi,
    queue: UpdateQueue,
    poller: JoinHandle<Poller>,
    workers: WorkerPool,
    shutdown_timeout: Duration,
    cancel: CancellationToken,
    guard: DropGuard,
}

impl RunningBot {
    pub fn api(&self) -> &BotApi {
        &self.api
    }

    /// Updates waiting for a worker.
    pub fn pending_updates(&self) -> usize {
        self.queue.len()
    }

    /// Token cancelled when the bot shuts down.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the bot.
    ///
    /// The poller stops at once (an in-progress long poll is abandoned);
    /// workers finish their current dispatch, up to the configured shutdown
    /// timeout, after which they are aborted together with their handlers.
    /// Updates still queued are dropped.
    pub async fn shutdown(self) -> ShutdownSummary {
        let Self {
            queue,
            poller,
            workers,
            shutdown_timeout,
            cancel,
            guard,
            ..
        } = self;

        info!("Shutting down bot");
        cancel.cancel();
        drop(guard);

        let offset = match poller.await {
            Ok(poller) => poller.offset(),
            Err(err) => {
                error!(error = %err, "Poller task failed");
                None
            }
        };

        queue.close();
        let aborted_workers = workers.shutdown(shutdown_timeout).await;
        let unprocessed = queue.len();

        info!(offset = ?offset, unprocessed, aborted_workers, "Bot stopped");
        ShutdownSummary {
            offset,
            unprocessed,
            aborted_workers,
        }
    }
}

impl std::fmt::Debug for RunningBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningBot")
            .field("pending_updates", &self.queue.len())
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Signals
// =============================================================================

/// Completes on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal as unix_signal};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = signal::ctrl_c() => log_ctrl_c(result),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(err) => warn!(error = %err, "Failed to register SIGTERM handler"),
        }
    }

    log_ctrl_c(signal::ctrl_c().await);
}

fn log_ctrl_c(result: std::io::Result<()>) {
    match result {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(err) => error!(error = %err, "Failed to listen for Ctrl+C, shutting down"),
    }
}

// =============================================================================
// BotBuilder
// =============================================================================

/// Builder creating a [`Bot`] from loaded configuration.
///
/// # Example
///
/// ```rust,ignore
/// let bot = Bot::builder()
///     .config_file("config/courier.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct BotBuilder {
    config_loader: ConfigLoader,
    token: Option<String>,
    caller: Option<Arc<dyn ApiCaller>>,
}

impl BotBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            token: None,
            caller: None,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges a base configuration programmatically.
    pub fn merge(mut self, config: CourierConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Overrides the token from every configuration source.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Uses `caller` instead of the HTTP client.
    pub fn caller(mut self, caller: Arc<dyn ApiCaller>) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Loads the configuration, initializes logging and creates the bot.
    pub fn build(self) -> RuntimeResult<Bot> {
        let mut config = self.config_loader.load()?;
        if let Some(token) = self.token {
            config.bot.token = token;
        }

        match self.caller {
            Some(caller) => {
                validate_config(&config)?;
                logging::init_from_config(&config.logging);
                Bot::with_caller(config.bot, caller)
            }
            None => Bot::from_config(&config),
        }
    }
}

impl Default for BotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::model::Message;
    use courier_framework::SendOptions;
    use courier_transport::MockApiCaller;
    use parking_lot::Mutex;
    use serde_json::json;

    fn config() -> BotConfig {
        BotConfig::with_token("123:test")
    }

    fn sent_message() -> serde_json::Value {
        json!({
            "message_id": 1,
            "date": 0,
            "chat": { "id": 5, "type": "private" },
            "text": "hi"
        })
    }

    #[tokio::test]
    async fn test_end_to_end_echo() {
        let mock = Arc::new(
            MockApiCaller::new()
                .respond(
                    "getUpdates",
                    json!([{
                        "update_id": 100,
                        "message": {
                            "message_id": 1,
                            "date": 0,
                            "chat": { "id": 5, "type": "private" },
                            "text": "hi"
                        }
                    }]),
                )
                .with_default("sendMessage", sent_message())
                .hold_when_exhausted(),
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bot = Bot::with_caller(config(), mock.clone()).unwrap();
        bot.register(HandlerKind::Message, {
            let seen = seen.clone();
            move |message: Message, api: BotApi| {
                let seen = seen.clone();
                async move {
                    let text = message.text.clone().unwrap_or_default();
                    seen.lock().push((message.chat.id, text.clone()));
                    api.send_message(message.chat.id, &text, SendOptions::default())
                        .await?;
                    Ok::<_, anyhow::Error>(())
                }
            }
        });

        let running = bot.start().unwrap();
        mock.wait_for_calls("sendMessage", 1).await;
        mock.wait_for_calls("getUpdates", 2).await;

        assert_eq!(*seen.lock(), vec![(5, "hi".to_string())]);

        let send = &mock.calls_to("sendMessage")[0];
        assert_eq!(send.payload.get("chat_id"), Some(json!(5)));
        assert_eq!(send.payload.get("text"), Some(json!("hi")));

        let fetches = mock.calls_to("getUpdates");
        assert_eq!(fetches[0].payload.get("offset"), None);
        assert_eq!(fetches[1].payload.get("offset"), Some(json!(101)));

        let summary = running.shutdown().await;
        assert_eq!(summary.offset, Some(101));
        assert_eq!(summary.unprocessed, 0);
        assert_eq!(summary.aborted_workers, 0);
    }

    #[tokio::test]
    async fn test_run_until_stops_pipeline() {
        let mock = Arc::new(MockApiCaller::new().hold_when_exhausted());
        let bot = Bot::with_caller(config(), mock.clone()).unwrap();

        bot.run_until(mock.wait_for_calls("getUpdates", 1))
            .await
            .unwrap();
        assert_eq!(mock.calls_to("getUpdates").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_stuck_handlers() {
        let mock = Arc::new(
            MockApiCaller::new()
                .respond(
                    "getUpdates",
                    json!([{
                        "update_id": 1,
                        "message": { "message_id": 1, "date": 0, "chat": { "id": 5, "type": "private" } }
                    }]),
                )
                .hold_when_exhausted(),
        );
        let config = BotConfig {
            workers: 1,
            shutdown_timeout_secs: 2,
            ..config()
        };
        let mut bot = Bot::with_caller(config, mock.clone()).unwrap();
        let started = Arc::new(tokio::sync::Notify::new());
        bot.register(HandlerKind::AnyMessage, {
            let started = started.clone();
            move || {
                let started = started.clone();
                async move {
                    started.notify_one();
                    std::future::pending::<()>().await;
                }
            }
        });

        let running = bot.start().unwrap();
        started.notified().await;

        let summary = running.shutdown().await;
        assert_eq!(summary.aborted_workers, 1);
        assert_eq!(summary.offset, Some(2));
    }

    #[test]
    fn test_start_requires_runtime() {
        let bot = Bot::with_caller(config(), Arc::new(MockApiCaller::new())).unwrap();
        assert!(matches!(bot.start(), Err(RuntimeError::NoRuntime)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Bot::with_caller(BotConfig::default(), Arc::new(MockApiCaller::new()))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn test_registration_before_start() {
        async fn noop() {}

        let mut bot = Bot::with_caller(config(), Arc::new(MockApiCaller::new())).unwrap();
        bot.register(HandlerKind::Message, noop);
        bot.register(HandlerKind::Message, noop);
        bot.load(&courier_framework::HandlerSet::new("extra").on(HandlerKind::Raw, noop));

        assert_eq!(bot.registry().count(HandlerKind::Message), 2);
        assert_eq!(bot.registry().count(HandlerKind::Raw), 1);
        assert_eq!(bot.api().retry_margin(), Duration::from_millis(500));
    }

    #[test]
    fn test_builder_with_caller() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("COURIER_BOT__WORKERS", "2");
            let bot = Bot::builder()
                .search_path(jail.directory())
                .token("123:builder")
                .caller(Arc::new(MockApiCaller::new()))
                .build()
                .map_err(|e| e.to_string())?;

            assert_eq!(bot.config().token, "123:builder");
            assert_eq!(bot.config().workers, 2);
            Ok(())
        });
    }
}
