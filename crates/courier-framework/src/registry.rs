//! Category → handlers table.

use std::collections::HashMap;
use std::fmt;

use courier_core::HandlerKind;

use crate::handler::{BoxedHandler, Handler, into_handler};
use crate::module::Module;

/// Handlers grouped by the category they were registered for.
///
/// Append-only: handlers are never removed or de-duplicated, and within one
/// category they keep their registration order. The registry is built
/// before the bot starts and shared read-only afterwards.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerKind, Vec<BoxedHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `kind` and hands it back unchanged.
    ///
    /// Registering the same handler twice makes it run twice per update.
    pub fn register<H, T>(&mut self, kind: HandlerKind, handler: H) -> H
    where
        H: Handler<T>,
        T: 'static,
    {
        self.register_boxed(kind, into_handler(handler.clone()));
        handler
    }

    /// Registers an already type-erased handler.
    pub fn register_boxed(&mut self, kind: HandlerKind, handler: BoxedHandler) {
        tracing::debug!(kind = %kind, handler = handler.name(), "Registered handler");
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Registers every handler a module exposes; returns how many.
    pub fn load<M: Module + ?Sized>(&mut self, module: &M) -> usize {
        let handlers = module.handlers();
        let count = handlers.len();
        for (handler, kind) in handlers {
            self.register_boxed(kind, handler);
        }
        tracing::info!(module = module.name(), handlers = count, "Loaded module");
        count
    }

    /// Handlers registered for `kind`, in registration order.
    pub fn handlers(&self, kind: HandlerKind) -> &[BoxedHandler] {
        self.handlers.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn count(&self, kind: HandlerKind) -> usize {
        self.handlers(kind).len()
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (kind, handlers) in &self.handlers {
            map.entry(&kind.as_str(), &handlers.len());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::HandlerSet;

    async fn noop() {}

    #[test]
    fn test_register_returns_handler_and_keeps_duplicates() {
        let mut registry = HandlerRegistry::new();
        let returned = registry.register(HandlerKind::Message, noop);
        registry.register(HandlerKind::Message, returned);

        assert_eq!(registry.count(HandlerKind::Message), 2);
        assert_eq!(registry.count(HandlerKind::CallbackQuery), 0);
        assert!(registry.handlers(HandlerKind::Raw).is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_load_module() {
        let module = HandlerSet::new("greetings")
            .on(HandlerKind::Message, noop)
            .on(HandlerKind::AnyMessage, noop)
            .on(HandlerKind::Raw, noop);

        let mut registry = HandlerRegistry::new();
        assert_eq!(registry.load(&module), 3);
        assert_eq!(registry.count(HandlerKind::AnyMessage), 1);
        assert_eq!(registry.count(HandlerKind::Raw), 1);
    }
}
