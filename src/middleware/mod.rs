//! Middleware layer.
//!
//! A middleware is a function from [`Handler`] to [`Handler`]: it receives the
//! next handler in the chain and returns a new one that runs its own code
//! around it. That is the right place for cross-cutting concerns such as
//! structured tracing or authentication checks.
//!
//! ```rust
//! use mortar::{Handler, Session, StatusCode};
//!
//! /// Rejects requests without an `authorization` header.
//! fn require_auth<S: Session>(next: Handler<S>) -> Handler<S> {
//!     Handler::new(move |ctx| {
//!         let next = next.clone();
//!         Box::pin(async move {
//!             if ctx.header("authorization").is_none() {
//!                 ctx.respond(StatusCode::UNAUTHORIZED);
//!                 return Ok(());
//!             }
//!             next.call(ctx).await
//!         })
//!     })
//! }
//! ```
//!
//! Middleware registered with [`App::with`](crate::App::with) nests in
//! registration order: the first one registered is the outermost.

use std::sync::Arc;

use crate::handler::Handler;

mod trace;

pub use trace::trace;

/// A shared handler decorator.
pub type Middleware<S> = Arc<dyn Fn(Handler<S>) -> Handler<S> + Send + Sync>;
