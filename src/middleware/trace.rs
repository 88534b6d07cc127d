//! Per-request tracing span with method, path, request ID, status and latency.

use std::time::Instant;

use http::StatusCode;
use tracing::{Instrument, info, info_span};

use crate::handler::Handler;
use crate::session::Session;

/// Wraps every request in an `http.request` span and logs one line when the
/// inner chain returns.
///
/// The status logged for a failed handler is the one its error translates to.
pub fn trace<S: Session>() -> impl Fn(Handler<S>) -> Handler<S> + Send + Sync + 'static {
    |next: Handler<S>| -> Handler<S> {
        Handler::new(move |ctx| {
            let next = next.clone();
            Box::pin(async move {
                let span = info_span!(
                    "http.request",
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    path = ctx.path(),
                );
                let start = Instant::now();

                let result = next.call(ctx).instrument(span.clone()).await;

                let status = match &result {
                    Ok(()) => ctx.response().map_or(StatusCode::OK, |r| r.code()),
                    Err(e) => e.status(),
                };
                span.in_scope(|| {
                    info!(
                        status = status.as_u16(),
                        latency_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
                        "request completed"
                    );
                });
                result
            })
        })
    }
}
