//! Handler system for the Courier framework.
//!
//! Handlers are plain async functions. The [`Handler`] trait is implemented
//! for every function whose parameters all implement
//! [`FromContext`], similar to Axum's handler system:
//!
//! ```rust,ignore
//! // No parameters
//! async fn tick() {}
//!
//! // Typed record, may fail
//! async fn echo(message: Message, api: BotApi) -> anyhow::Result<()> {
//!     if let Some(text) = &message.text {
//!         api.send_message(message.chat.id, text, SendOptions::default()).await?;
//!     }
//!     Ok(())
//! }
//!
//! // Raw handler
//! async fn audit(update: Update) {
//!     tracing::info!(update_id = update.id(), "seen");
//! }
//! ```
//!
//! A handler may return `()` or `Result<(), E>` for any `E` convertible into
//! [`anyhow::Error`].

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::UpdateContext;
use crate::error::{HandlerError, HandlerResult};
use crate::extractor::FromContext;

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ============================================================================
// Handler output
// ============================================================================

/// Return types accepted from handlers.
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<HandlerError>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for update handlers.
///
/// `T` is a marker for the parameter list and lets one function type
/// implement the trait exactly once.
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// The type of future calling this handler returns.
    type Future: Future<Output = HandlerResult> + Send + 'static;

    /// Calls the handler with the given context.
    fn call(self, ctx: Arc<UpdateContext>) -> Self::Future;
}

// ============================================================================
// Type erasure
// ============================================================================

/// A wrapper that stores a handler function behind [`ErasedHandler`].
pub struct HandlerFn<F, T> {
    f: F,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<F, T> HandlerFn<F, T> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            name: std::any::type_name::<F>(),
            _marker: PhantomData,
        }
    }
}

impl<F: Clone, T> Clone for HandlerFn<F, T> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            name: self.name,
            _marker: PhantomData,
        }
    }
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync>;

/// Type-erased handler trait for dynamic dispatch.
pub trait ErasedHandler: Send + Sync {
    /// Executes the handler with the given context.
    fn call(&self, ctx: Arc<UpdateContext>) -> BoxFuture<'static, HandlerResult>;

    /// Name used in logs (the function's type name).
    fn name(&self) -> &'static str;
}

impl<F, T> ErasedHandler for HandlerFn<F, T>
where
    F: Handler<T>,
    T: 'static,
{
    fn call(&self, ctx: Arc<UpdateContext>) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self.f.clone().call(ctx))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Converts a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T>,
    T: 'static,
{
    Arc::new(HandlerFn::new(f))
}

// ============================================================================
// Handler implementations for functions (Axum-style)
// ============================================================================

impl<F, Fut> Handler<()> for F
where
    F: FnOnce() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoHandlerResult,
{
    type Future = BoxFuture<'static, HandlerResult>;

    fn call(self, _ctx: Arc<UpdateContext>) -> Self::Future {
        Box::pin(async move { (self)().await.into_handler_result() })
    }
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case)]
        impl<F, Fut, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future + Send + 'static,
            Fut::Output: IntoHandlerResult,
            $( $ty: FromContext + Send + 'static, )*
        {
            type Future = BoxFuture<'static, HandlerResult>;

            fn call(self, ctx: Arc<UpdateContext>) -> Self::Future {
                Box::pin(async move {
                    $(
                        let $ty = $ty::from_context(&ctx)?;
                    )*

                    (self)($($ty,)*).await.into_handler_result()
                })
            }
        }
    };
}

impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
