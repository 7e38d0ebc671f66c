//! Handler modules.
//!
//! A [`Module`] is a bundle of handlers that can be loaded into a bot in one
//! call. Implement the trait on your own type, or build a [`HandlerSet`]:
//!
//! ```rust,ignore
//! struct Moderation { banned_words: Vec<String> }
//!
//! impl Module for Moderation {
//!     fn handlers(&self) -> Vec<(BoxedHandler, HandlerKind)> {
//!         let words = self.banned_words.clone();
//!         vec![on(HandlerKind::Message, move |message: Message| {
//!             let words = words.clone();
//!             async move { /* ... */ }
//!         })]
//!     }
//! }
//!
//! bot.load(&Moderation { banned_words });
//! bot.load(&HandlerSet::new("echo").on(HandlerKind::Message, echo));
//! ```

use courier_core::HandlerKind;

use crate::handler::{BoxedHandler, Handler, into_handler};

/// A bundle of handlers, each paired with the category it handles.
pub trait Module: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn handlers(&self) -> Vec<(BoxedHandler, HandlerKind)>;
}

/// Pairs a handler with its category, for [`Module::handlers`].
pub fn on<H, T>(kind: HandlerKind, handler: H) -> (BoxedHandler, HandlerKind)
where
    H: Handler<T>,
    T: 'static,
{
    (into_handler(handler), kind)
}

/// A named, ready-made [`Module`].
#[derive(Clone)]
pub struct HandlerSet {
    name: String,
    handlers: Vec<(BoxedHandler, HandlerKind)>,
}

impl HandlerSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
        }
    }

    pub fn on<H, T>(mut self, kind: HandlerKind, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.handlers.push(on(kind, handler));
        self
    }
}

impl Module for HandlerSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn handlers(&self) -> Vec<(BoxedHandler, HandlerKind)> {
        self.handlers.clone()
    }
}

impl std::fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSet")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
