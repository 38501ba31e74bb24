//! Exact-match request router.
//!
//! One handler per method + path pair. No patterns, no wildcards, no
//! trailing-slash normalization: the key you register is the key that
//! matches, byte for byte. Lookup is a single hash probe.

use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{Middleware, Recover, Trace};
use crate::response::Response;

/// Composite routing key. Both components match as exact, case-sensitive
/// strings; any method string is accepted.
#[derive(Debug, Eq, Hash, PartialEq)]
struct RouteKey {
    method: String,
    path: String,
}

/// The application router: the route table plus the middleware stack.
///
/// Build it with chained calls, then hand it to
/// [`Server::serve`](crate::Server::serve). `serve` takes the router by
/// value, so the table and the stack are frozen for the server's whole life;
/// there is no way to register anything once it is running, and dispatch
/// needs no locking.
///
/// Registering the same method + path twice keeps the later handler: last
/// registration wins, the earlier handler becomes unreachable. This mirrors
/// plain map-insert semantics and is intentional, documented behavior.
pub struct Router {
    routes: HashMap<RouteKey, BoxedHandler>,
    stack: Vec<Arc<dyn Middleware>>,
    fallback: BoxedHandler,
}

impl Router {
    /// An empty route table behind the two default middlewares:
    /// [`Trace`] outermost, [`Recover`] just inside it.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            stack: vec![Arc::new(Trace), Arc::new(Recover)],
            fallback: not_found.into_boxed_handler(),
        }
    }

    /// Registers `handler` under any method string and an exact path.
    /// Returns `self` so registrations chain.
    pub fn on(mut self, method: &str, path: &str, handler: impl Handler) -> Self {
        let key = RouteKey {
            method: method.to_owned(),
            path: path.to_owned(),
        };
        self.routes.insert(key, handler.into_boxed_handler());
        self
    }

    /// `GET` sugar over [`Router::on`].
    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on("GET", path, handler)
    }

    /// `POST` sugar over [`Router::on`].
    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on("POST", path, handler)
    }

    /// Appends a middleware. Position 0 is outermost; every `wrap` call adds
    /// one layer further in, after the default [`Trace`] and [`Recover`].
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        self.stack.push(Arc::new(middleware));
        self
    }

    /// Exact lookup. A miss resolves to the fallback 404 handler, which
    /// still runs inside the middleware chain so the logger observes it.
    pub(crate) fn lookup(&self, method: &str, path: &str) -> BoxedHandler {
        let key = RouteKey {
            method: method.to_owned(),
            path: path.to_owned(),
        };
        match self.routes.get(&key) {
            Some(handler) => Arc::clone(handler),
            None => Arc::clone(&self.fallback),
        }
    }

    pub(crate) fn stack(&self) -> Arc<[Arc<dyn Middleware>]> {
        Arc::from(self.stack.as_slice())
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Fallback for unmatched routes. A miss is a response, not a fault.
async fn not_found(_ctx: Context) -> Response {
    Response::status(StatusCode::NOT_FOUND)
}
