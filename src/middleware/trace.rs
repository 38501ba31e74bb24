//! Request logging middleware.

use std::time::Instant;

use tracing::info;

use crate::context::Context;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};

/// Logs one line when a request enters the chain and one when it leaves,
/// with the resulting status and the elapsed wall-clock time.
///
/// Installed outermost by default. Both lines fire no matter what happens
/// further in: the exit line covers responses, faults already converted by
/// [`Recover`](super::Recover), and faults that somehow escaped it.
pub struct Trace;

impl Middleware for Trace {
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture {
        let method = ctx.method().to_owned();
        let path = ctx.path().to_owned();
        Box::pin(async move {
            info!(%method, %path, "request received");
            let start = Instant::now();

            let out = next.run(ctx).await;

            let status = match &out {
                Ok(response) => response.status_code().as_u16(),
                Err(_) => 500,
            };
            info!(%method, %path, status, elapsed = ?start.elapsed(), "request completed");
            out
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::Fault;
    use crate::handler::Handler;
    use crate::response::Response;
    use bytes::Bytes;
    use http::StatusCode;
    use std::sync::Arc;

    fn ctx() -> Context {
        let (parts, ()) = http::Request::builder()
            .method("GET")
            .uri("/traced")
            .body(())
            .unwrap()
            .into_parts();
        Context::new(parts, Bytes::new())
    }

    #[tokio::test]
    async fn passes_responses_through_untouched() {
        let stack: Arc<[Arc<dyn Middleware>]> = vec![Arc::new(Trace) as _].into();
        let handler = |_ctx: Context| async { Response::status(StatusCode::ACCEPTED) };

        let out = Next::new(stack, handler.into_boxed_handler()).run(ctx()).await;
        assert_eq!(out.unwrap().status_code(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn does_not_swallow_faults() {
        // Trace logs; converting faults is Recover's job.
        let stack: Arc<[Arc<dyn Middleware>]> = vec![Arc::new(Trace) as _].into();
        let handler = |_ctx: Context| async {
            Err::<Response, _>(Fault::status(StatusCode::BAD_REQUEST, "bad input"))
        };

        let out = Next::new(stack, handler.into_boxed_handler()).run(ctx()).await;
        assert!(out.is_err());
    }
}
