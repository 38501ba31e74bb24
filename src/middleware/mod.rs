//! Middleware: ordered, composable wrappers around the route handler.
//!
//! Middlewares form an onion. The first one registered is outermost: its
//! pre-logic is the first thing to see a request and its post-logic is the
//! last thing to see the response. For a stack `[m0, m1]` and handler `H`
//! the observed order is always
//!
//! ```text
//! m0-pre → m1-pre → H → m1-post → m0-post
//! ```
//!
//! [`Next`] carries the rest of the chain; calling [`Next::run`] descends
//! one layer. A middleware that never calls it short-circuits the request.
//!
//! Two middlewares come installed by [`Router::new`](crate::Router::new):
//! [`Trace`] on the outside, [`Recover`] just inside it. Everything added
//! with [`Router::wrap`](crate::Router::wrap) sits inside both, so the
//! logger observes every request and the boundary catches every fault,
//! including faults from user middleware.

mod recover;
mod trace;

pub use recover::Recover;
pub use trace::Trace;

use std::future::Future;
use std::sync::Arc;

use crate::context::Context;
use crate::fault::Fault;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::response::Response;

/// One layer of the onion.
///
/// Implement it directly when the middleware carries configuration, or
/// register a closure; any `Fn(Context, Next) -> future` qualifies:
///
/// ```rust,no_run
/// use senda::{Context, Next, Router};
///
/// let app = Router::new().wrap(|ctx: Context, next: Next| async move {
///     // pre-logic
///     let out = next.run(ctx).await;
///     // post-logic
///     out
/// });
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Fault>> + Send + 'static,
{
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture {
        Box::pin(self(ctx, next))
    }
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// The remainder of the chain, ending at the route handler.
///
/// Composition order is fixed when the router is built; `Next` is just a
/// cursor over the shared stack, so evaluating the onion costs one Arc
/// clone per layer per request.
pub struct Next {
    stack: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    terminal: BoxedHandler,
}

impl Next {
    pub(crate) fn new(stack: Arc<[Arc<dyn Middleware>]>, terminal: BoxedHandler) -> Self {
        Self {
            stack,
            index: 0,
            terminal,
        }
    }

    /// Runs the rest of the chain and resolves to its outcome.
    pub async fn run(mut self, ctx: Context) -> Result<Response, Fault> {
        match self.stack.get(self.index).map(Arc::clone) {
            Some(layer) => {
                self.index += 1;
                layer.handle(ctx, self).await
            }
            None => self.terminal.call(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use bytes::Bytes;
    use http::StatusCode;
    use std::sync::Mutex;

    fn ctx() -> Context {
        let (parts, ()) = http::Request::builder()
            .method("GET")
            .uri("/probe")
            .body(())
            .unwrap()
            .into_parts();
        Context::new(parts, Bytes::new())
    }

    fn recorder(
        log: &Arc<Mutex<Vec<&'static str>>>,
        pre: &'static str,
        post: &'static str,
    ) -> Arc<dyn Middleware> {
        let log = Arc::clone(log);
        Arc::new(move |ctx: Context, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(pre);
                let out = next.run(ctx).await;
                log.lock().unwrap().push(post);
                out
            }
        })
    }

    #[tokio::test]
    async fn onion_order_matches_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stack: Arc<[Arc<dyn Middleware>]> = vec![
            recorder(&log, "m0-pre", "m0-post"),
            recorder(&log, "m1-pre", "m1-post"),
        ]
        .into();

        let handler_log = Arc::clone(&log);
        let handler = move |_ctx: Context| {
            let log = Arc::clone(&handler_log);
            async move {
                log.lock().unwrap().push("handler");
                Response::status(StatusCode::OK)
            }
        };

        let out = Next::new(stack, handler.into_boxed_handler()).run(ctx()).await;
        assert!(out.is_ok());
        assert_eq!(
            *log.lock().unwrap(),
            ["m0-pre", "m1-pre", "handler", "m1-post", "m0-post"]
        );
    }

    #[tokio::test]
    async fn empty_stack_runs_the_handler_directly() {
        let stack: Arc<[Arc<dyn Middleware>]> = Vec::new().into();
        let handler = |_ctx: Context| async { Response::status(StatusCode::NO_CONTENT) };

        let out = Next::new(stack, handler.into_boxed_handler()).run(ctx()).await;
        assert_eq!(out.unwrap().status_code(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn a_layer_can_short_circuit_by_not_calling_next() {
        let gate: Arc<dyn Middleware> = Arc::new(|_ctx: Context, _next: Next| async {
            Ok(Response::status(StatusCode::UNAUTHORIZED))
        });
        let stack: Arc<[Arc<dyn Middleware>]> = vec![gate].into();
        // Would answer 200 if the gate ever let the request through.
        let handler = |_ctx: Context| async { Response::status(StatusCode::OK) };

        let out = Next::new(stack, handler.into_boxed_handler()).run(ctx()).await;
        assert_eq!(out.unwrap().status_code(), StatusCode::UNAUTHORIZED);
    }
}
