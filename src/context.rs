//! Per-request context.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{Error, Invalid};
use crate::response::{IntoResponse, Response};
use crate::router::Params;
use crate::session::{Session, SessionGuard};

/// Everything a handler gets to work with for one request.
///
/// One `Context` exists per inbound request. It owns the request's session
/// exclusively; the session is closed when the context is dropped, which the
/// dispatcher does as soon as the wrapped handler returns.
pub struct Context<S: Session> {
    session: SessionGuard<S>,
    request: http::Request<Bytes>,
    params: Params,
    request_id: Uuid,
    response: Option<Response>,
}

impl<S: Session> Context<S> {
    pub(crate) fn new(session: S, request: http::Request<Bytes>, params: Params) -> Self {
        Self {
            session: SessionGuard::new(session),
            request,
            params,
            request_id: Uuid::now_v7(),
            response: None,
        }
    }

    pub fn session(&self) -> &S { self.session.get() }
    pub fn session_mut(&mut self) -> &mut S { self.session.get_mut() }

    pub fn request(&self) -> &http::Request<Bytes> { &self.request }
    pub fn method(&self) -> &Method { self.request.method() }
    pub fn path(&self) -> &str { self.request.uri().path() }
    pub fn headers(&self) -> &HeaderMap { self.request.headers() }
    pub fn body(&self) -> &Bytes { self.request.body() }

    /// Case-insensitive header lookup; non-UTF-8 values read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/items/:id`, `ctx.param("id")` on `/items/42` returns `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &Params { &self.params }

    /// Correlation ID generated for this request. Echoed to the client in
    /// the `x-request-id` response header.
    pub fn request_id(&self) -> Uuid { self.request_id }

    /// Sets the response, replacing any set earlier.
    pub fn respond(&mut self, response: impl IntoResponse) {
        self.response = Some(response.into_response());
    }

    /// Serializes `value` as the JSON response body.
    pub fn respond_json<T: Serialize + ?Sized>(
        &mut self,
        status: StatusCode,
        value: &T,
    ) -> Result<(), Error> {
        let body = serde_json::to_vec(value).map_err(Error::internal)?;
        self.respond(Response::builder().status(status).json(body));
        Ok(())
    }

    /// Decodes the request body as JSON. Malformed bodies are reported as a
    /// validation failure on the `body` field.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(self.request.body())
            .map_err(|e| Error::Validation(vec![Invalid::new("body", e.to_string())]))
    }

    /// The response set so far, if any.
    pub fn response(&self) -> Option<&Response> { self.response.as_ref() }

    /// Translates a handler error into the response for this request.
    ///
    /// Client errors are logged at `info`, server errors at `error` with the
    /// full source chain. Any response the handler set before failing is
    /// replaced.
    pub fn error(&mut self, err: Error) {
        let status = err.status();
        if status.is_server_error() {
            error!(request_id = %self.request_id, status = status.as_u16(), error = ?err, "request failed");
        } else {
            info!(request_id = %self.request_id, status = status.as_u16(), error = %err, "request rejected");
        }
        self.response = Some(err.to_response());
    }

    /// Ends the request: releases the session and returns the response.
    pub(crate) fn finish(self) -> Response {
        let Self { session, response, request_id, .. } = self;
        drop(session);

        let mut response = response.unwrap_or_else(|| Response::status(StatusCode::OK));
        if let Ok(value) = HeaderValue::try_from(request_id.to_string()) {
            response.insert_header(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        response
    }
}

/// Response header carrying the correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    fn ctx(body: &'static str) -> Context<()> {
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/items/7?verbose=1")
            .header("X-Trace", "abc")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap();
        let params = Params::from([("id".to_owned(), "7".to_owned())]);
        Context::new((), request, params)
    }

    #[test]
    fn exposes_request_parts() {
        let ctx = ctx("");
        assert_eq!(*ctx.method(), Method::POST);
        assert_eq!(ctx.path(), "/items/7");
        assert_eq!(ctx.header("x-trace"), Some("abc"));
        assert_eq!(ctx.param("id"), Some("7"));
        assert_eq!(ctx.param("missing"), None);
    }

    #[test]
    fn finish_without_response_is_ok_with_request_id() {
        let ctx = ctx("");
        let id = ctx.request_id().to_string();
        let resp = ctx.finish();
        assert_eq!(resp.code(), StatusCode::OK);
        assert_eq!(resp.header(REQUEST_ID_HEADER), Some(id.as_str()));
    }

    #[test]
    fn error_replaces_earlier_response() {
        let mut ctx = ctx("");
        ctx.respond(Response::text("partial"));
        ctx.error(Error::NotFound);
        assert_eq!(ctx.response().map(Response::code), Some(StatusCode::NOT_FOUND));
    }

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Item {
        name: String,
    }

    #[test]
    fn decode_json_reads_body() {
        let item: Item = ctx(r#"{"name":"lamp"}"#).decode_json().unwrap();
        assert_eq!(item, Item { name: "lamp".into() });
    }

    #[test]
    fn malformed_body_is_a_validation_error() {
        let err = ctx("{not json").decode_json::<Item>().unwrap_err();
        match err {
            Error::Validation(fields) => assert_eq!(fields[0].field, "body"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn respond_json_sets_status_and_body() {
        let mut ctx = ctx("");
        ctx.respond_json(StatusCode::CREATED, &Item { name: "desk".into() }).unwrap();
        let resp = ctx.finish();
        assert_eq!(resp.code(), StatusCode::CREATED);
        assert_eq!(resp.body().as_ref(), br#"{"name":"desk"}"#);
    }
}
