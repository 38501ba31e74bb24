//! The error boundary.

use tracing::{error, warn};

use crate::context::Context;
use crate::fault::Fault;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};

/// Converts a [`Fault`] raised anywhere further in into its client-facing
/// error response, so one bad request never takes the process down with it.
///
/// Structured faults ([`Fault::Status`]) are reported verbatim: that status,
/// that message. Anything else is logged with full detail and flattened to
/// `500` with a fixed `"Internal Server Error"` message; the source error
/// never reaches the client.
///
/// Installed as the innermost default middleware: inside [`Trace`](super::Trace),
/// outside every user middleware and the handler, so it catches faults from
/// all of them. The fault is always logged before translation.
pub struct Recover;

impl Middleware for Recover {
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture {
        Box::pin(async move {
            match next.run(ctx).await {
                Ok(response) => Ok(response),
                Err(fault) => {
                    match &fault {
                        Fault::Status { status, message } => {
                            warn!(status = status.as_u16(), %message, "request fault");
                        }
                        Fault::Internal(source) => {
                            error!(error = %source, "unhandled fault in request chain");
                        }
                    }
                    Ok(fault.into_response())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use crate::response::Response;
    use bytes::Bytes;
    use http::StatusCode;
    use std::sync::Arc;

    fn ctx() -> Context {
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("/faulty")
            .body(())
            .unwrap()
            .into_parts();
        Context::new(parts, Bytes::new())
    }

    async fn run(handler: impl Handler) -> Response {
        let stack: Arc<[Arc<dyn Middleware>]> = vec![Arc::new(Recover) as _].into();
        Next::new(stack, handler.into_boxed_handler())
            .run(ctx())
            .await
            .expect("the boundary converts every fault")
    }

    #[tokio::test]
    async fn structured_fault_is_reported_verbatim() {
        let response = run(|_ctx: Context| async {
            Err::<Response, _>(Fault::status(StatusCode::BAD_REQUEST, "bad input"))
        })
        .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body = std::str::from_utf8(&response.body).unwrap();
        assert!(body.contains("bad input"));
    }

    #[tokio::test]
    async fn unstructured_fault_becomes_a_generic_500() {
        let response = run(|_ctx: Context| async {
            Err::<Response, _>(Fault::internal("connection pool exhausted"))
        })
        .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = std::str::from_utf8(&response.body).unwrap();
        assert!(body.contains("Internal Server Error"));
        assert!(!body.contains("connection pool exhausted"));
    }

    #[tokio::test]
    async fn successful_responses_are_untouched() {
        let response = run(|_ctx: Context| async { Response::status(StatusCode::OK) }).await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }
}
