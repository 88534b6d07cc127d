//! # mortar
//!
//! A minimal HTTP application shell. It registers handlers against method +
//! path pairs, wraps each one in a chain of middleware, and gives every
//! request its own [`Context`]: a session from your store, the request, its
//! route parameters, and a freshly generated correlation ID.
//!
//! What mortar delegates:
//!
//! - **Routing** — radix-tree lookup via [`matchit`], behind [`RouteTable`]
//! - **Sessions** — whatever your [`SessionProvider`] hands out
//! - **HTTP** — hyper, HTTP/1.1 and HTTP/2
//!
//! What it guarantees:
//!
//! - Middleware nests in registration order: the first one registered runs
//!   first on the way in and last on the way out.
//! - Every routed request acquires exactly one session and releases it
//!   exactly once, whatever the handler does.
//! - Handler errors are turned into responses in exactly one place,
//!   [`Context::error`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mortar::{App, BoxFuture, Context, Error, Method, Server, middleware};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let mut app = App::new(|| Ok::<_, Error>(()));
//!     app.with(middleware::trace());
//!     app.handle(Method::GET, "/items/:id", get_item)?;
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! fn get_item(ctx: &mut Context<()>) -> BoxFuture<'_, Result<(), Error>> {
//!     Box::pin(async move {
//!         let id: u64 = ctx.param("id")
//!             .and_then(|id| id.parse().ok())
//!             .ok_or(Error::InvalidId)?;
//!         if id != 42 {
//!             return Err(Error::NotFound);
//!         }
//!         ctx.respond(format!("item {id}"));
//!         Ok(())
//!     })
//! }
//! ```

mod app;
mod config;
mod context;
mod error;
mod handler;
mod response;
mod router;
mod server;
mod session;

pub mod health;
pub mod middleware;

pub use app::App;
pub use config::Config;
pub use context::{Context, REQUEST_ID_HEADER};
pub use error::{BoxError, Error, Invalid};
pub use handler::{BoxFuture, Handler};
pub use middleware::Middleware;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{Params, RouteTable, TreeRouter};
pub use server::{Server, serve_listener};
pub use session::{Session, SessionProvider};

pub use http::{Method, StatusCode};
