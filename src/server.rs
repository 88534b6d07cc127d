//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. stops `listener.accept()` immediately,
//! 2. tells every open connection to finish its in-flight request and close
//!    (idle keep-alive connections close at once),
//! 3. waits up to the configured grace period for them,
//! 4. aborts whatever is still running and returns.
//!
//! Aborting a connection drops its in-flight request futures, and with them
//! their [`Context`](crate::Context)s, so every acquired session is still
//! released.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::app::App;
use crate::config::Config;
use crate::error::Error;
use crate::response::Response;
use crate::session::Session;

/// The HTTP server.
#[derive(Clone, Debug)]
pub struct Server {
    addr: SocketAddr,
    grace: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use mortar::Server;
    /// let server = Server::bind("0.0.0.0:3000").unwrap();
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr: SocketAddr = addr.parse()?;
        Ok(Self { addr, grace: Config::default().shutdown_grace() })
    }

    pub fn from_config(config: &Config) -> Self {
        Self { addr: config.addr, grace: config.shutdown_grace() }
    }

    /// Serves `app` until SIGTERM or Ctrl-C, then shuts down gracefully.
    pub async fn serve<S: Session>(self, app: App<S>) -> Result<(), Error> {
        self.serve_with_shutdown(app, shutdown_signal()).await
    }

    /// Serves `app` until `signal` resolves, then shuts down gracefully.
    pub async fn serve_with_shutdown<S, F>(self, app: App<S>, signal: F) -> Result<(), Error>
    where
        S: Session,
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.addr).await?;
        serve_listener(listener, app, signal, self.grace).await
    }
}

/// Accepts connections on an already bound `listener` until `signal`
/// resolves.
pub async fn serve_listener<S, F>(
    listener: TcpListener,
    app: App<S>,
    signal: F,
    grace: Duration,
) -> Result<(), Error>
where
    S: Session,
    F: Future<Output = ()>,
{
    let app = Arc::new(app);
    info!(addr = %listener.local_addr()?, "mortar listening");

    let builder = ConnBuilder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();
    let mut tasks = JoinSet::new();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            // Shutdown first, so a signal stops accepting even with a backlog.
            biased;

            () = &mut signal => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let app = Arc::clone(&app);
                // Called once per request on the connection.
                let svc = service_fn(move |req| {
                    let app = Arc::clone(&app);
                    async move { handle(&app, req).await }
                });
                let conn = graceful.watch(
                    builder.serve_connection(TokioIo::new(stream), svc).into_owned(),
                );

                tasks.spawn(async move {
                    if let Err(e) = conn.await {
                        debug!(%peer, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks so the set does not grow
            // without bound.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);
    let drain = async {
        graceful.shutdown().await;
        while tasks.join_next().await.is_some() {}
    };
    if tokio::time::timeout(grace, drain).await.is_err() {
        warn!(aborted = tasks.len(), "grace period elapsed, aborting connections");
        tasks.shutdown().await;
    }

    info!("mortar stopped");
    Ok(())
}

/// Collects the body and hands the request to the app. All failures become
/// responses, so hyper never sees an error.
async fn handle<S: Session>(
    app: &App<S>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!("failed to read request body: {e}");
            return Ok(Response::status(http::StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let response = app.dispatch(http::Request::from_parts(parts, body)).await;
    Ok(response.into_inner())
}

/// Resolves on the first SIGTERM or Ctrl-C. On non-Unix platforms only
/// Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
