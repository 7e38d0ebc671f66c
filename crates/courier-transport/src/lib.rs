//! # Courier Transport
//!
//! Implementations of the [`ApiCaller`](courier_core::ApiCaller) seam.
//!
//! ## Features
//!
//! - `http-client` (default): [`HttpApiCaller`], backed by `reqwest`
//!
//! The [`mock`] module is always available and is what the other Courier
//! crates use in their tests.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  courier-framework  │  (BotApi: typed methods, retry-after loop)
//! ├─────────────────────┤
//! │  courier-core       │  (ApiCaller trait, envelope)
//! ├─────────────────────┤
//! │  courier-transport  │  <- This crate (implementations)
//! ├─────────────────────┤
//! │  Network (HTTPS)    │
//! └─────────────────────┘
//! ```

#[cfg(feature = "http-client")]
pub mod http;

pub mod mock;

#[cfg(feature = "http-client")]
pub use http::HttpApiCaller;

pub use mock::{MockApiCaller, RecordedCall};
