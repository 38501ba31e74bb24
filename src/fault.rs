//! Request-scoped fault type.
//!
//! A `Fault` is how a handler or middleware says "this request is over,
//! and not with the response I was building". Faults travel up the chain as
//! ordinary `Err` values and are translated into client-facing responses by
//! the [`Recover`](crate::middleware::Recover) boundary. They never cross
//! into other requests or into the server lifecycle.

use std::fmt;

use http::StatusCode;

use crate::response::Response;

/// A failure raised inside the middleware chain or a route handler.
#[derive(Debug)]
pub enum Fault {
    /// A deliberate, structured fault. The boundary reports exactly this
    /// status and message to the client.
    Status {
        status: StatusCode,
        message: String,
    },
    /// Any other runtime failure. Logged server-side with full detail,
    /// reported to the client as a generic 500. The source never leaks
    /// into the response body.
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl Fault {
    /// A structured fault: `status` and `message` go to the client verbatim.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Wraps an arbitrary error as an unstructured fault.
    pub fn internal(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Internal(source.into())
    }

    /// The client-facing response for this fault.
    pub(crate) fn into_response(self) -> Response {
        match self {
            Self::Status { status, message } => error_response(status, &message),
            Self::Internal(_) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string().into_bytes();
    Response::json(status, body)
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, message } => write!(f, "{status}: {message}"),
            Self::Internal(source) => write!(f, "internal: {source}"),
        }
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Status { .. } => None,
            Self::Internal(source) => Some(source.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_fault_keeps_status_and_message() {
        let response = Fault::status(StatusCode::BAD_REQUEST, "bad input").into_response();
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body = std::str::from_utf8(&response.body).unwrap();
        assert_eq!(body, r#"{"error":"bad input"}"#);
    }

    #[test]
    fn internal_fault_never_leaks_its_source() {
        let response = Fault::internal("disk exploded").into_response();
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = std::str::from_utf8(&response.body).unwrap();
        assert!(body.contains("Internal Server Error"));
        assert!(!body.contains("disk exploded"));
    }
}
