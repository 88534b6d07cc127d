//! Built-in Kubernetes health-check handlers.
//!
//! | Check | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! ```rust
//! use mortar::{App, Error, Method, health};
//!
//! # fn main() -> Result<(), Error> {
//! let mut app = App::new(|| Ok::<_, Error>(()));
//! app.handle(Method::GET, "/healthz", health::liveness)?
//!     .handle(Method::GET, "/readyz", health::readiness)?;
//! # Ok(())
//! # }
//! ```

use http::StatusCode;

use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::response::Response;
use crate::session::Session;

/// Liveness check. Always `200 OK` with body `"ok"`.
pub fn liveness<S: Session>(ctx: &mut Context<S>) -> BoxFuture<'_, Result<(), Error>> {
    Box::pin(async move {
        ctx.respond("ok");
        Ok(())
    })
}

/// Readiness check. `200 OK` with body `"ready"` when the request's session
/// reports [`Session::ready`], `503` with `"not ready"` otherwise.
///
/// A provider that cannot hand out a session at all already answers `503`
/// before this handler runs.
pub fn readiness<S: Session>(ctx: &mut Context<S>) -> BoxFuture<'_, Result<(), Error>> {
    Box::pin(async move {
        if ctx.session().ready() {
            ctx.respond("ready");
        } else {
            ctx.respond(
                Response::builder()
                    .status(StatusCode::SERVICE_UNAVAILABLE)
                    .text("not ready"),
            );
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    struct Draining;

    impl Session for Draining {
        fn close(&mut self) {}

        fn ready(&self) -> bool {
            false
        }
    }

    fn context<S: Session>(session: S) -> Context<S> {
        let request = http::Request::get("/readyz").body(Bytes::new()).unwrap();
        Context::new(session, request, Default::default())
    }

    #[tokio::test]
    async fn liveness_ignores_session_state() {
        let mut ctx = context(Draining);
        liveness(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().unwrap().code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_follows_session() {
        let mut ctx = context(());
        readiness(&mut ctx).await.unwrap();
        let resp = ctx.response().unwrap();
        assert_eq!(resp.code(), StatusCode::OK);
        assert_eq!(resp.body().as_ref(), b"ready");

        let mut ctx = context(Draining);
        readiness(&mut ctx).await.unwrap();
        let resp = ctx.response().unwrap();
        assert_eq!(resp.code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.body().as_ref(), b"not ready");
    }
}
