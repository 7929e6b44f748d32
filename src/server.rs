//! HTTP server and graceful shutdown.
//!
//! [`Server::serve`] blocks the calling task until the process receives
//! SIGTERM or Ctrl-C, then:
//! 1. stops `listener.accept()` so no new connections are made;
//! 2. closes idle keep-alive connections and lets requests in flight finish;
//! 3. returns, which lets `main` exit cleanly.
//!
//! Use [`Server::serve_with_shutdown`] to stop on any other signal.

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::context::Context;
use crate::error::Error;
use crate::request::Request;
use crate::response::{Response, ResponseBody};
use crate::route::Route;
use crate::router::Router;

/// The HTTP server: a listen address plus a validated route table.
pub struct Server {
    addr: String,
    router: Router,
}

impl Server {
    /// Builds the route table for `addr`.
    ///
    /// Route-table mistakes (missing handler, malformed key, conflicting
    /// paths) are reported here, before anything is bound.
    ///
    /// ```rust,no_run
    /// use apikit::{Request, Response, Route, Server};
    ///
    /// # async fn hello(_: Request) -> Response { Response::ok("hi") }
    /// # async fn run() -> Result<(), apikit::Error> {
    /// Server::new("0.0.0.0:3000", [Route::to("GET /hello", hello)])?
    ///     .serve()
    ///     .await
    /// # }
    /// ```
    pub fn new(addr: impl Into<String>, routes: impl IntoIterator<Item = Route>) -> Result<Self, Error> {
        Ok(Self { addr: addr.into(), router: Router::from_routes(routes)? })
    }

    /// Binds and serves until SIGTERM or Ctrl-C.
    ///
    /// Bind failures are returned to the caller; nothing is retried.
    pub async fn serve(self) -> Result<(), Error> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Binds and serves until `signal` resolves, then drains in-flight
    /// connections.
    ///
    /// On the signal, idle keep-alive connections are closed and busy ones
    /// finish their current request first. A listener fault other than a
    /// single failed handshake also stops the server; it drains the same way
    /// and the fault is returned.
    pub async fn serve_with_shutdown(self, signal: impl Future<Output = ()>) -> Result<(), Error> {
        // Passed through unmodified; tokio resolves `host:port`.
        let listener = TcpListener::bind(self.addr.as_str()).await?;
        let local = listener.local_addr()?;

        let router = Arc::new(self.router);
        let builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();

        info!(addr = %local, "apikit listening");

        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        let outcome = loop {
            tokio::select! {
                // Check shutdown first so a signal immediately stops
                // accepting new connections, even if more are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break Ok(());
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) if is_connection_error(&e) => {
                            warn!("accept error: {e}");
                            continue;
                        }
                        Err(e) => {
                            error!(in_flight = tasks.len(), "listener failed, draining connections: {e}");
                            break Err(Error::Io(e));
                        }
                    };

                    let router = Arc::clone(&router);
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        async move { dispatch(router, req, remote_addr).await }
                    });

                    let conn = builder.serve_connection(TokioIo::new(stream), svc);
                    let conn = graceful.watch(conn.into_owned());

                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        };

        drop(listener);
        graceful.shutdown().await;
        while tasks.join_next().await.is_some() {}

        info!("apikit stopped");
        outcome
    }
}

/// Accept failures that concern one peer rather than the listener.
fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Collects the body, routes one request and produces one response.
///
/// The error type is [`Infallible`]: every failure becomes a status code.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<ResponseBody>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(peer = %remote_addr, "failed to read request body: {e}");
            return Ok(Response::status(http::StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let req = Request {
        method: parts.method,
        path: parts.uri.path().to_owned(),
        headers: parts.headers,
        body,
        params: Default::default(),
        remote_addr: Some(remote_addr),
        context: Context::background(),
    };

    Ok(router.handle(req).await.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). On Windows only Ctrl-C
/// is available.
async fn shutdown_signal() {
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

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
