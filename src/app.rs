//! The application: route registration, middleware composition and the
//! per-request dispatch adapter.

use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use tracing::{debug, error};

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxFuture, Handler};
use crate::middleware::Middleware;
use crate::response::Response;
use crate::router::{RouteTable, TreeRouter};
use crate::session::{Session, SessionProvider};

/// Routes, middleware and the session provider for one application.
///
/// Build it once at startup through `&mut self` methods, then hand it to
/// [`Server`](crate::Server). Once serving, the App is shared read-only
/// across every connection task.
///
/// ```rust
/// use mortar::{App, BoxFuture, Context, Error, Method, middleware};
///
/// fn get_item(ctx: &mut Context<()>) -> BoxFuture<'_, Result<(), Error>> {
///     Box::pin(async move {
///         let id: u64 = ctx.param("id").and_then(|id| id.parse().ok()).ok_or(Error::InvalidId)?;
///         ctx.respond(format!("item {id}"));
///         Ok(())
///     })
/// }
///
/// # fn main() -> Result<(), Error> {
/// let mut app = App::new(|| Ok::<_, Error>(()));
/// app.with(middleware::trace());
/// app.handle(Method::GET, "/items/:id", get_item)?;
/// # Ok(())
/// # }
/// ```
pub struct App<S: Session> {
    router: Box<dyn RouteTable<Handler<S>>>,
    sessions: Box<dyn SessionProvider<Session = S>>,
    middleware: Vec<Middleware<S>>,
}

impl<S: Session> App<S> {
    /// Creates an App backed by the default [`TreeRouter`].
    pub fn new(sessions: impl SessionProvider<Session = S>) -> Self {
        Self::with_router(sessions, TreeRouter::new())
    }

    /// Creates an App backed by any [`RouteTable`].
    pub fn with_router(
        sessions: impl SessionProvider<Session = S>,
        router: impl RouteTable<Handler<S>>,
    ) -> Self {
        Self {
            router: Box::new(router),
            sessions: Box::new(sessions),
            middleware: Vec::new(),
        }
    }

    /// Appends a middleware to the chain. Returns `self` for chaining.
    ///
    /// The chain is applied when a request is dispatched, so middleware added
    /// after a route was registered still wraps that route.
    pub fn with<M>(&mut self, mw: M) -> &mut Self
    where
        M: Fn(Handler<S>) -> Handler<S> + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(mw));
        self
    }

    /// Appends several middleware, in iteration order.
    pub fn with_all(&mut self, mws: impl IntoIterator<Item = Middleware<S>>) -> &mut Self {
        self.middleware.extend(mws);
        self
    }

    /// Registers `handler` for a method + path pair.
    ///
    /// Path parameters use `{name}` or `:name` syntax; `ctx.param("name")`
    /// retrieves them. Conflicts are reported by the router as
    /// [`Error::Route`].
    pub fn handle<F>(&mut self, method: Method, path: &str, handler: F) -> Result<&mut Self, Error>
    where
        F: for<'a> Fn(&'a mut Context<S>) -> BoxFuture<'a, Result<(), Error>>
            + Send
            + Sync
            + 'static,
    {
        self.router.insert(method.clone(), path, Handler::new(handler))?;
        debug!(%method, path, "route registered");
        Ok(self)
    }

    /// Nests `handler` in every registered middleware, first-registered
    /// outermost.
    pub(crate) fn wrap(&self, handler: Handler<S>) -> Handler<S> {
        self.middleware.iter().rev().fold(handler, |h, mw| mw(h))
    }

    /// Routes one request and produces its response.
    ///
    /// A matched request gets exactly one session and one [`Context`]; the
    /// session is released when the context is dropped, whether the handler
    /// succeeded, failed, panicked or was cancelled.
    ///
    /// `HEAD` falls back to the `GET` handler when no `HEAD` route matches;
    /// hyper strips the body.
    pub async fn dispatch(&self, request: http::Request<Bytes>) -> Response {
        let path = request.uri().path().to_owned();

        let found = match self.router.at(request.method(), &path) {
            None if request.method() == Method::HEAD => self.router.at(&Method::GET, &path),
            found => found,
        };
        let Some((handler, params)) = found else {
            return self.unrouted(&path);
        };
        let handler = handler.clone();

        let session = match self.sessions.acquire() {
            Ok(session) => session,
            Err(err) => {
                error!(method = %request.method(), path, error = ?err, "session acquisition failed");
                return err.to_response();
            }
        };

        let mut ctx = Context::new(session, request, params);
        if let Err(err) = self.wrap(handler).call(&mut ctx).await {
            ctx.error(err);
        }
        ctx.finish()
    }

    /// `405` with an `Allow` header when the path exists under other methods,
    /// `404` otherwise.
    fn unrouted(&self, path: &str) -> Response {
        let allowed = self.router.allowed(path);
        if allowed.is_empty() {
            return Response::status(StatusCode::NOT_FOUND);
        }
        let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
        Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header("allow", &allow)
            .no_body()
    }
}
