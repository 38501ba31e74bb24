//! HTTP server and graceful shutdown.
//!
//! # Lifecycle
//!
//! A server moves through four phases:
//!
//! 1. **Created**: [`Server::bind`] acquired the listener. Nothing is served
//!    yet. A bind failure surfaces here, immediately; it is not retried.
//! 2. **Running**: [`Server::serve`] accepts connections and serves each one
//!    on its own tokio task. The router is read-only from this point on.
//! 3. **Shutting down**: the caller's cancellation future resolved. The
//!    listener is dropped, so no new connection gets in; connections already
//!    dispatched are told to finish their in-flight request and get a grace
//!    period (default 5 seconds) to do so.
//! 4. **Stopped**: everything drained in time and `serve` returns `Ok`, or
//!    the deadline fired first, the stragglers were severed, and `serve`
//!    returns [`Error::ShutdownTimeout`].
//!
//! Where the cancellation comes from is the caller's business: a signal
//! handler, a test's oneshot channel, a timeout. [`shutdown_signal`] is the
//! conventional source for binaries (SIGTERM / Ctrl-C).

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::context::Context;
use crate::error::Error;
use crate::middleware::{Middleware, Next};
use crate::response::Response;
use crate::router::Router;

/// How long in-flight requests may keep running after cancellation.
const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
    addr: SocketAddr,
    grace: Duration,
}

impl Server {
    /// Binds the listener.
    ///
    /// Binding happens here, not in [`serve`](Server::serve): if the port is
    /// taken or privileged, the caller finds out before anything else runs.
    /// There is no retry. Bind to port 0 and read
    /// [`local_addr`](Server::local_addr) for an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # async fn bind() {
    /// use senda::Server;
    /// let server = Server::bind("0.0.0.0:3000").await.unwrap();
    /// # }
    /// ```
    pub async fn bind(addr: &str) -> Result<Self, Error> {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        Ok(Self {
            listener,
            addr,
            grace: GRACE_PERIOD,
        })
    }

    /// The bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Overrides the shutdown grace period (default 5 seconds).
    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Accepts connections and dispatches them through `router` until
    /// `shutdown` resolves, then drains.
    ///
    /// Blocks the calling task for the server's whole life. Returns `Ok`
    /// after a clean drain, [`Error::ShutdownTimeout`] if the grace period
    /// elapsed with requests still in flight.
    pub async fn serve(
        self,
        router: Router,
        shutdown: impl Future<Output = ()> + Send,
    ) -> Result<(), Error> {
        // Shared across connection tasks without copying the route table;
        // read-only from here on.
        let router = Arc::new(router);
        let stack = router.stack();

        // Every connection task watches this channel. The send below flips
        // each in-flight connection into hyper's graceful shutdown, which
        // finishes the active request and then closes.
        let (drain_tx, drain_rx) = watch::channel(());

        info!(addr = %self.addr, "senda listening");

        // JoinSet tracks every spawned connection task so the drain below
        // can wait for them all.
        let mut tasks = JoinSet::new();

        // Pin the shutdown future so we can poll it in a loop.
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` makes select! check arms top-to-bottom instead of
                // randomly. Cancellation is checked first so it beats a
                // ready accept: no new connection sneaks in after the signal.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "cancellation received, draining connections");
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let stack = Arc::clone(&stack);
                    let drain_rx = drain_rx.clone();
                    tasks.spawn(serve_connection(stream, remote_addr, router, stack, drain_rx));
                }

                // Reap finished connection tasks so the JoinSet does not
                // grow without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Stop accepting, then tell every live connection to wind down.
        drop(self.listener);
        let _ = drain_tx.send(());

        let drained = tokio::time::timeout(self.grace, drain(&mut tasks)).await;
        match drained {
            Ok(()) => {
                info!("senda stopped");
                Ok(())
            }
            Err(_) => {
                error!(in_flight = tasks.len(), "grace period elapsed, severing connections");
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                Err(Error::ShutdownTimeout)
            }
        }
    }
}

async fn drain(tasks: &mut JoinSet<()>) {
    while tasks.join_next().await.is_some() {}
}

// ── Connection handling ───────────────────────────────────────────────────────

/// Serves one accepted connection until it closes or shutdown drains it.
async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    router: Arc<Router>,
    stack: Arc<[Arc<dyn Middleware>]>,
    mut drain_rx: watch::Receiver<()>,
) {
    // `service_fn` turns the dispatch function into a hyper `Service`. The
    // closure runs once per request on the connection, not once per
    // connection.
    let svc = service_fn(move |req| {
        let router = Arc::clone(&router);
        let stack = Arc::clone(&stack);
        async move { dispatch(router, stack, req).await }
    });

    // `auto::Builder` transparently handles both HTTP/1.1 and HTTP/2,
    // whatever the client negotiates.
    let builder = ConnBuilder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(stream), svc);
    tokio::pin!(conn);

    tokio::select! {
        res = conn.as_mut() => {
            if let Err(e) = res {
                error!(peer = %remote_addr, "connection error: {e}");
            }
        }
        _ = drain_rx.changed() => {
            // Let hyper finish the in-flight request and close the stream.
            // The grace-period timeout in `serve` severs us if this stalls.
            conn.as_mut().graceful_shutdown();
            if let Err(e) = conn.as_mut().await {
                error!(peer = %remote_addr, "connection error during drain: {e}");
            }
        }
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Core hot path: one request in, one response out.
///
/// The error type is [`Infallible`](std::convert::Infallible): misses become
/// 404s and faults are converted inside the chain (or flattened here if one
/// somehow escapes it), so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    stack: Arc<[Arc<dyn Middleware>]>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();

    let handler = router.lookup(parts.method.as_str(), parts.uri.path());

    // The body is drained up front; the Context only ever parses bytes, and
    // dropping the Context releases them on every exit path.
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!("failed to read request body: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_hyper());
        }
    };

    let ctx = Context::new(parts, body);
    let response = match Next::new(stack, handler).run(ctx).await {
        Ok(response) => response,
        // Recover sits in the default stack, so a fault can only get here
        // from a layer outside it. That is a bug in the server, not in the
        // request; answer 500 and leave the detail in the log.
        Err(fault) => {
            error!(%fault, "fault escaped the middleware chain");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    Ok(response.into_hyper())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// The conventional cancellation source for [`Server::serve`] in a binary.
/// On Unix this listens for both **SIGTERM** (what orchestrators send) and
/// **SIGINT** (Ctrl-C, for local dev). On other platforms only Ctrl-C is
/// available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` is a future that never resolves; on non-Unix platforms
    // the SIGTERM arm is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = sigterm => {}
    }
}
