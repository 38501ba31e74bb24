//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use tracing::error;

use crate::fault::Fault;

/// An outgoing HTTP response.
///
/// Handlers normally obtain one from [`Context::json`](crate::Context::json);
/// the constructors here cover the body-less cases and middleware that build
/// responses without a context.
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
}

impl Response {
    /// A JSON response. `content-type: application/json` is set
    /// unconditionally; the bytes come from your serializer.
    pub fn json(status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_owned(), "application/json".to_owned())],
            body: body.into(),
        }
    }

    /// A response with no body.
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Appends a header. Later calls do not replace earlier ones.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub(crate) fn into_hyper(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match builder.body(Full::new(self.body)) {
            Ok(response) => response,
            // Only reachable through a malformed header name or value from
            // Response::header. The request still deserves an answer.
            Err(e) => {
                error!("invalid response metadata: {e}");
                let mut response = http::Response::new(Full::new(Bytes::new()));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into the outcome of a route handler.
///
/// Implemented for [`Response`], for `Result<Response, Fault>`, and for a
/// bare [`StatusCode`], so a handler can return whichever shape reads best:
///
/// ```rust,no_run
/// use senda::{Context, StatusCode};
///
/// async fn delete_user(_ctx: Context) -> StatusCode {
///     StatusCode::NO_CONTENT
/// }
/// ```
pub trait IntoResponse {
    fn into_response(self) -> Result<Response, Fault>;
}

impl IntoResponse for Response {
    fn into_response(self) -> Result<Response, Fault> {
        Ok(self)
    }
}

impl IntoResponse for Result<Response, Fault> {
    fn into_response(self) -> Result<Response, Fault> {
        self
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Result<Response, Fault> {
        Ok(Response::status(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sets_content_type() {
        let hyper_response = Response::json(StatusCode::OK, b"{}".to_vec()).into_hyper();
        assert_eq!(hyper_response.status(), StatusCode::OK);
        assert_eq!(
            hyper_response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn status_has_no_body_and_no_headers() {
        let response = Response::status(StatusCode::NOT_FOUND);
        assert!(response.body.is_empty());
        assert!(response.headers.is_empty());
    }

    #[test]
    fn extra_headers_survive_conversion() {
        let hyper_response = Response::status(StatusCode::OK)
            .header("x-served-by", "senda")
            .into_hyper();
        assert_eq!(hyper_response.headers().get("x-served-by").unwrap(), "senda");
    }
}
