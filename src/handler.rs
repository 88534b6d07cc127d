//! Handler type and type erasure.
//!
//! A handler borrows the request's [`Context`] mutably for as long as it
//! runs and reports success or an [`Error`]. The router has to hold handlers
//! of many concrete types, so each one is erased behind an `Arc<dyn Fn>` once,
//! at registration:
//!
//! ```text
//! fn get_item(ctx: &mut Context<S>) -> BoxFuture<'_, Result<(), Error>>
//!        ↓ app.handle(GET, "/items/:id", get_item)
//! Handler::new(get_item)          ← one Arc allocation
//!        ↓ middleware(handler)    ← at dispatch, one Arc per layer
//! handler.call(&mut ctx)          ← one virtual call per layer
//! ```
//!
//! Handlers are written as plain functions returning a boxed future, because
//! the future borrows the context:
//!
//! ```rust
//! use mortar::{BoxFuture, Context, Error};
//!
//! fn hello(ctx: &mut Context<()>) -> BoxFuture<'_, Result<(), Error>> {
//!     Box::pin(async move {
//!         ctx.respond("hello");
//!         Ok(())
//!     })
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::session::Session;

/// A heap-allocated, type-erased `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type HandlerFn<S> =
    dyn for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, Result<(), Error>> + Send + Sync;

/// A request handler, shared across concurrent requests.
///
/// Cloning is one atomic increment.
pub struct Handler<S: Session> {
    inner: Arc<HandlerFn<S>>,
}

impl<S: Session> Handler<S> {
    /// Erases `f` into a handler.
    ///
    /// Closures passed here get their higher-ranked signature inferred, which
    /// is how middleware builds the handler it returns:
    ///
    /// ```rust
    /// use mortar::{Handler, Session};
    ///
    /// fn passthrough<S: Session>(next: Handler<S>) -> Handler<S> {
    ///     Handler::new(move |ctx| {
    ///         let next = next.clone();
    ///         Box::pin(async move { next.call(ctx).await })
    ///     })
    /// }
    /// ```
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn call<'a>(&self, ctx: &'a mut Context<S>) -> BoxFuture<'a, Result<(), Error>> {
        (self.inner)(ctx)
    }
}

impl<S: Session> Clone for Handler<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}
