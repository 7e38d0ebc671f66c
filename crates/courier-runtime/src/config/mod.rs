//! Configuration for the Courier runtime.
//!
//! Settings are layered with figment from defaults, config files and
//! `COURIER_*` environment variables; see [`loader`] for the precedence.
//!
//! ```toml
//! [bot]
//! token = "123456:ABC-DEF"
//! workers = 8
//! skip_updates = true
//!
//! [logging]
//! level = "debug"
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, CourierConfig, FetchRetryConfig, LogFormat, LogLevel, LogOutput, LogRotation,
    LoggingConfig, SpanEventConfig,
};
pub use validation::{validate_bot_config, validate_config};
