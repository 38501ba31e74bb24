//! Per-request context.

use std::fmt;

use bytes::Bytes;
use http::StatusCode;
use http::request::Parts;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::fault::Fault;
use crate::response::Response;

/// Per-request facade over the inbound request and the outbound response.
///
/// A fresh `Context` is built for every dispatched request and handed to the
/// middleware chain by value; it is never reused. Reading is free-form
/// ([`query_param`](Context::query_param), [`header`](Context::header),
/// [`body`](Context::body)). Writing happens exactly once, through
/// [`json`](Context::json), which consumes the context: a handler cannot
/// respond twice, and cannot touch the request after responding. The
/// single-response rule is the signature, not a runtime check.
pub struct Context {
    parts: Parts,
    body: Bytes,
}

impl Context {
    pub(crate) fn new(parts: Parts, body: Bytes) -> Self {
        Self { parts, body }
    }

    /// Request method as its wire string, e.g. `"GET"`.
    pub fn method(&self) -> &str {
        self.parts.method.as_str()
    }

    /// Request path, query string excluded.
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Decoded value of the first query pair named `key`.
    ///
    /// Percent escapes and `+` are decoded. An absent key yields an empty
    /// string; absence is not an error.
    pub fn query_param(&self, key: &str) -> String {
        let query = self.parts.uri.query().unwrap_or("");
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default()
    }

    /// Inbound header passthrough. Empty string when the header is absent
    /// or its value is not valid UTF-8.
    pub fn header(&self, name: &str) -> &str {
        self.parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Parses the request body as JSON into `T`.
    ///
    /// The body was fully drained into memory before the chain ran; this
    /// only parses, so it can be called more than once. An empty body is a
    /// [`DecodeError`], never a defaulted `T`.
    pub fn body<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        serde_json::from_slice(&self.body).map_err(DecodeError)
    }

    /// Serializes `payload` and produces the terminal JSON response with
    /// the given status.
    ///
    /// Consumes the context. One call, one response, nothing after.
    pub fn json<T>(self, status: StatusCode, payload: &T) -> Result<Response, Fault>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(payload).map_err(Fault::internal)?;
        Ok(Response::json(status, body))
    }
}

// ── DecodeError ───────────────────────────────────────────────────────────────

/// The request body could not be parsed into the requested shape.
///
/// Surfaced to the handler as an ordinary `Err`; the handler decides the
/// client-facing answer. `?` takes the shortcut below.
#[derive(Debug)]
pub struct DecodeError(serde_json::Error);

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed request body: {}", self.0)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// `?` on a decode failure answers 400 with the parse message.
impl From<DecodeError> for Fault {
    fn from(e: DecodeError) -> Self {
        Fault::status(StatusCode::BAD_REQUEST, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Shape {
        name: String,
    }

    fn make_ctx(uri: &str, body: &[u8]) -> Context {
        let (parts, ()) = http::Request::builder()
            .method("GET")
            .uri(uri)
            .header("x-request-id", "abc-123")
            .body(())
            .unwrap()
            .into_parts();
        Context::new(parts, Bytes::copy_from_slice(body))
    }

    #[test]
    fn query_param_decodes_escapes() {
        let ctx = make_ctx("/search?q=a%20b&name=alice+smith", b"");
        assert_eq!(ctx.query_param("q"), "a b");
        assert_eq!(ctx.query_param("name"), "alice smith");
    }

    #[test]
    fn absent_query_param_is_empty_not_an_error() {
        let ctx = make_ctx("/search?q=1", b"");
        assert_eq!(ctx.query_param("missing"), "");

        let ctx = make_ctx("/no-query-at-all", b"");
        assert_eq!(ctx.query_param("q"), "");
    }

    #[test]
    fn header_passthrough() {
        let ctx = make_ctx("/", b"");
        assert_eq!(ctx.header("x-request-id"), "abc-123");
        assert_eq!(ctx.header("x-missing"), "");
    }

    #[test]
    fn body_parses_json() {
        let ctx = make_ctx("/", br#"{"name":"alice"}"#);
        let shape: Shape = ctx.body().unwrap();
        assert_eq!(shape.name, "alice");
    }

    #[test]
    fn empty_body_is_a_decode_error() {
        // Pinned: an empty body must fail, never produce a defaulted value.
        let ctx = make_ctx("/", b"");
        assert!(ctx.body::<serde_json::Value>().is_err());
    }

    #[test]
    fn decode_error_shortcuts_to_bad_request() {
        let ctx = make_ctx("/", b"{not json");
        let err = ctx.body::<Shape>().unwrap_err();
        match Fault::from(err) {
            Fault::Status { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(message.starts_with("malformed request body"));
            }
            Fault::Internal(_) => panic!("expected a structured fault"),
        }
    }

    #[test]
    fn json_consumes_the_context_and_sets_content_type() {
        let ctx = make_ctx("/", b"");
        let response = ctx
            .json(StatusCode::CREATED, &Shape { name: "alice".into() })
            .unwrap();
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(
            response.headers[0],
            ("content-type".to_owned(), "application/json".to_owned())
        );
        assert_eq!(response.body.as_ref(), br#"{"name":"alice"}"#);
    }
}
