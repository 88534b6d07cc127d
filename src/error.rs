//! Unified error type.
//!
//! Handlers return [`Error`] and the dispatcher hands it to
//! [`Context::error`](crate::Context::error), which is the only place an
//! error becomes an HTTP response. The three domain variants (`NotFound`,
//! `InvalidId`, `Validation`) are meant to be returned directly by handler
//! code; the rest surface infrastructure failures.

use http::StatusCode;
use serde::Serialize;

use crate::response::Response;

/// Boxed error used for opaque sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by handlers and by mortar's fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested record does not exist.
    #[error("no record(s) found")]
    NotFound,

    /// An identifier in the request is not in its proper form.
    #[error("ID is not in its proper form")]
    InvalidId,

    /// One or more fields failed validation.
    #[error("validation errors occurred")]
    Validation(Vec<Invalid>),

    /// The session provider could not hand out a session.
    #[error("session unavailable: {0}")]
    Session(#[source] BoxError),

    /// Anything else a handler wants to bail out with.
    #[error("internal error: {0}")]
    Internal(#[source] BoxError),

    #[error("invalid route `{path}`: {source}")]
    Route {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("invalid socket address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("config: {0}")]
    Config(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// A single failed field check, carried by [`Error::Validation`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Invalid {
    pub field: String,
    pub error: String,
}

impl Invalid {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self { field: field.into(), error: error.into() }
    }
}

impl Error {
    /// Wraps any error as [`Error::Internal`].
    pub fn internal(e: impl Into<BoxError>) -> Self {
        Self::Internal(e.into())
    }

    /// Wraps any error as [`Error::Session`].
    pub fn session(e: impl Into<BoxError>) -> Self {
        Self::Session(e.into())
    }

    /// The status code this error translates to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidId | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_)
            | Self::Route { .. }
            | Self::Addr(_)
            | Self::Config(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the JSON error response for this error.
    ///
    /// Server-side failures are reported with the generic reason phrase; their
    /// details only go to the log.
    pub(crate) fn to_response(&self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            status.canonical_reason().unwrap_or("error").to_owned()
        } else {
            self.to_string()
        };
        let fields = match self {
            Self::Validation(fields) => Some(fields.as_slice()),
            _ => None,
        };
        let body = ErrorBody { error: &message, fields };

        match serde_json::to_vec(&body) {
            Ok(bytes) => Response::builder().status(status).json(bytes),
            Err(_) => Response::status(status),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [Invalid]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_json(resp: &Response) -> serde_json::Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    #[test]
    fn domain_errors_map_to_client_statuses() {
        assert_eq!(Error::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::InvalidId.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::Validation(vec![]).status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::session("pool drained").status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn validation_body_lists_fields() {
        let err = Error::Validation(vec![Invalid::new("name", "required")]);
        let resp = err.to_response();
        assert_eq!(resp.code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&resp),
            serde_json::json!({
                "error": "validation errors occurred",
                "fields": [{ "field": "name", "error": "required" }],
            })
        );
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let resp = Error::internal("connection reset by peer").to_response();
        assert_eq!(resp.code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&resp), serde_json::json!({ "error": "Internal Server Error" }));
    }

    #[test]
    fn not_found_body_has_message_only() {
        let resp = Error::NotFound.to_response();
        assert_eq!(body_json(&resp), serde_json::json!({ "error": "no record(s) found" }));
    }
}
