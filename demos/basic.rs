//! Minimal senda example: JSON endpoints, a custom middleware, and two
//! faulting routes to watch the error boundary at work.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl 'http://localhost:3000/users?id=42'
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl http://localhost:3000/teapot
//!   curl http://localhost:3000/boom

use senda::{Context, Fault, Next, Response, Router, Server, StatusCode, shutdown_signal};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
struct User {
    name: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .get("/users", get_user)
        .post("/users", create_user)
        .on("GET", "/teapot", teapot)
        .get("/boom", boom)
        .wrap(stamp);

    Server::bind("0.0.0.0:3000")
        .await
        .expect("bind failed")
        .serve(app, shutdown_signal())
        .await
        .expect("server error");
}

// GET /users?id=42
async fn get_user(ctx: Context) -> Result<Response, Fault> {
    let id = ctx.query_param("id");
    ctx.json(StatusCode::OK, &serde_json::json!({ "id": id, "name": "alice" }))
}

// POST /users. A malformed body turns into a 400 through the `?` on the
// decode error; match on it instead if you want a different answer.
async fn create_user(ctx: Context) -> Result<Response, Fault> {
    let user: User = ctx.body()?;
    ctx.json(StatusCode::CREATED, &user)
}

// Structured fault: the boundary reports it to the client as-is.
async fn teapot(_ctx: Context) -> Result<Response, Fault> {
    Err(Fault::status(StatusCode::IM_A_TEAPOT, "out of coffee"))
}

// Unstructured fault: the client gets a bare 500, the log gets the detail.
async fn boom(_ctx: Context) -> Result<Response, Fault> {
    Err(Fault::internal("simulated subsystem failure"))
}

// User middleware sits inside the defaults. This one stamps every response,
// 404s included.
async fn stamp(ctx: Context, next: Next) -> Result<Response, Fault> {
    let response = next.run(ctx).await?;
    Ok(response.header("x-served-by", "senda"))
}
