//! # senda
//!
//! A minimal HTTP framework: exact-match routing, an onion of middleware,
//! and a server that knows how to stop.
//!
//! ## The contract
//!
//! - **Exact-match routing**: one handler per method + path pair. No
//!   patterns, no wildcards, no normalization. The route you register is
//!   the route that matches, byte for byte.
//! - **Onion middleware**: first registered is outermost. Two defaults come
//!   installed, request logging on the outside and an error boundary just
//!   inside it, so a faulting handler costs one error response and a log
//!   line, never the process.
//! - **Graceful shutdown**: cancellation is supplied by the caller. On
//!   signal the listener closes, in-flight requests get a bounded grace
//!   period, stragglers are severed.
//!
//! JSON is the one payload format the [`Context`] helpers speak. Everything
//! else about a request is bytes senda does not touch.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use senda::{Context, Fault, Response, Router, Server, StatusCode, shutdown_signal};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Serialize)]
//! struct Greeting { name: String }
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .get("/hello", hello)
//!         .post("/greetings", create_greeting);
//!
//!     Server::bind("0.0.0.0:3000")
//!         .await
//!         .expect("bind failed")
//!         .serve(app, shutdown_signal())
//!         .await
//!         .expect("server error");
//! }
//!
//! async fn hello(ctx: Context) -> Result<Response, Fault> {
//!     let name = ctx.query_param("name");
//!     ctx.json(StatusCode::OK, &serde_json::json!({ "hello": name }))
//! }
//!
//! async fn create_greeting(ctx: Context) -> Result<Response, Fault> {
//!     let greeting: Greeting = ctx.body()?;
//!     ctx.json(StatusCode::CREATED, &greeting)
//! }
//! ```

mod context;
mod error;
mod fault;
mod handler;
mod response;
mod router;

pub mod middleware;
pub mod server;

pub use context::{Context, DecodeError};
pub use error::Error;
pub use fault::Fault;
pub use handler::{BoxFuture, Handler};
pub use middleware::{Middleware, Next};
pub use response::{IntoResponse, Response};
pub use router::Router;
pub use server::{Server, shutdown_signal};

/// Re-exported from the `http` crate: statuses appear in every handler
/// signature, so you should not need a direct `http` dependency for them.
pub use http::StatusCode;
