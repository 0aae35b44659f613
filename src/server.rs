//! The loopback server and its start/stop lifecycle.
//!
//! # Lifecycle
//!
//! ```text
//!   idle ──start()──▶ listening ──stop()──▶ idle ──start()──▶ …
//! ```
//!
//! `start()` on a listening server fails with [`Error::AlreadyListening`]
//! and leaves the socket alone. `stop()` on an idle server fails with
//! [`Error::NotListening`]. Neither call is synchronized against itself:
//! `&mut self` already makes concurrent calls on one instance impossible.
//!
//! # Stopping
//!
//! `stop()` closes the listening socket first, then asks every open
//! connection to finish its in-flight request and close. Connections still
//! busy after the configured shutdown timeout are aborted.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use http::StatusCode;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

use crate::callback::{CallbackHandler, ResponseMode};
use crate::config::ServerConfig;
use crate::error::Error;
use crate::folder::{self, FolderHandler};
use crate::guard::{self, PathGuard};
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::{Params, Query, Request};
use crate::response::{Response, ResponseBody};
use crate::router::{Lookup, Router};

/// An HTTP server bound to `127.0.0.1`.
///
/// ```rust,no_run
/// use localserve::{LocalhostServer, Method, ResponseMode, ServerConfig};
///
/// # async fn run() -> Result<(), localserve::Error> {
/// let mut server = LocalhostServer::new(ServerConfig::new(8080))?;
/// server
///     .serve_folder("/files", "/srv/data")?
///     .serve_custom_callback_route(
///         Method::Get,
///         "/users/{id}",
///         |params, _query| Ok::<_, String>(params.get("id").map(str::to_owned)),
///         ResponseMode::AutoDetect,
///     )?;
///
/// server.start().await?;
/// // …
/// server.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct LocalhostServer {
    config: ServerConfig,
    router: Arc<Router>,
    listening: Option<Listening>,
}

/// The parts of a running server that `stop()` needs.
struct Listening {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl LocalhostServer {
    /// Validates `config` and builds an idle server.
    ///
    /// With `cors_allow_all`, an `OPTIONS` route covering every path is
    /// registered up front.
    pub fn new(config: ServerConfig) -> Result<Self, Error> {
        config.validate()?;

        let mut router = Router::new(&config);
        if config.cors_allow_all {
            for pattern in ["/", "/{*any}"] {
                let preflight = |_req: Request| async { Response::cors_preflight() };
                router.insert(Method::Options, pattern, preflight.into_boxed_handler())?;
            }
        }

        Ok(Self { config, router: Arc::new(router), listening: None })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serves files under `dir` at `GET <route>/<relative path>`.
    ///
    /// `route` must be non-empty, not a bare `*`, and free of `\0`, `$`, `@`
    /// and `../`; a trailing `/*` is accepted. `dir` must be absolute.
    /// Every request path is confined to `dir` before anything is opened:
    /// escapes and a bare `<route>/` answer `403`, unreadable files answer
    /// `500`.
    pub fn serve_folder(
        &mut self,
        route: &str,
        dir: impl Into<PathBuf>,
    ) -> Result<&mut Self, Error> {
        if route.is_empty() || route == "*" || guard::has_forbidden_sequence(route) {
            return Err(Error::InvalidRoute(route.to_owned()));
        }
        let guard = PathGuard::new(dir)?;

        let prefix = route.strip_suffix("/*").unwrap_or(route).trim_end_matches('/');
        let handler: BoxedHandler = Arc::new(FolderHandler::new(guard));

        // A catch-all never matches an empty remainder: `<prefix>/` gets its
        // own route so the guard refuses it with a 403.
        self.register(Method::Get, &format!("{prefix}/"), Arc::clone(&handler))?;
        self.register(Method::Get, &format!("{prefix}/{{*{}}}", folder::WILDCARD), handler)
    }

    /// Registers a plain function whose return value becomes the response
    /// according to `mode`.
    ///
    /// The callback receives the decoded path parameters and the parsed query
    /// string. An `Err`, or a panic, inside it answers `500`.
    pub fn serve_custom_callback_route<F, T, E>(
        &mut self,
        method: Method,
        route: &str,
        callback: F,
        mode: ResponseMode,
    ) -> Result<&mut Self, Error>
    where
        F: Fn(&Params, &Query) -> Result<T, E> + Send + Sync + 'static,
        T: Serialize + 'static,
        E: std::fmt::Display + 'static,
    {
        self.register(method, route, Arc::new(CallbackHandler::new(callback, mode)))
    }

    /// Registers `handler` as-is: it receives the whole request and its
    /// response is sent unchanged.
    pub fn serve_raw_route(
        &mut self,
        method: Method,
        route: &str,
        handler: impl Handler,
    ) -> Result<&mut Self, Error> {
        self.register(method, route, handler.into_boxed_handler())
    }

    /// Routes registered while listening take effect on the next `start()`.
    fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: BoxedHandler,
    ) -> Result<&mut Self, Error> {
        Arc::make_mut(&mut self.router).insert(method, pattern, handler)?;
        Ok(self)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.is_some()
    }

    /// The bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listening.as_ref().map(|l| l.addr)
    }

    /// Binds `127.0.0.1:<port>` and starts accepting connections in the
    /// background. Resolves once the socket is listening.
    pub async fn start(&mut self) -> Result<SocketAddr, Error> {
        if self.listening.is_some() {
            return Err(Error::AlreadyListening);
        }

        let listener = TcpListener::bind(self.config.addr()).await?;
        let addr = listener.local_addr()?;
        let (shutdown, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&self.router),
            self.config.clone(),
            shutdown_rx,
        ));

        info!(%addr, "localserve listening");
        self.listening = Some(Listening { addr, shutdown, task });
        Ok(addr)
    }

    /// Stops accepting, drains open connections, releases the socket.
    pub async fn stop(&mut self) -> Result<(), Error> {
        let Listening { addr, shutdown, task } =
            self.listening.take().ok_or(Error::NotListening)?;

        // The loop may already be gone if it panicked; joining tells us.
        let _ = shutdown.send(());
        if let Err(e) = task.await {
            error!(%addr, "accept loop ended abnormally: {e}");
        }

        info!(%addr, "localserve stopped");
        Ok(())
    }
}

impl Drop for LocalhostServer {
    fn drop(&mut self) {
        if let Some(listening) = self.listening.take() {
            listening.task.abort();
        }
    }
}

// ── Accept loop ───────────────────────────────────────────────────────────────

async fn accept_loop(
    listener: TcpListener,
    router: Arc<Router>,
    config: ServerConfig,
    mut shutdown: oneshot::Receiver<()>,
) {
    // Flipped once to tell every connection task to wind down.
    let (draining_tx, draining_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            // Shutdown first: a pending stop() wins over queued connections.
            biased;

            _ = &mut shutdown => break,

            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let router = Arc::clone(&router);
                let debug = config.debug;
                let mut draining = draining_rx.clone();

                tasks.spawn(async move {
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        async move { Ok::<_, std::convert::Infallible>(dispatch(&router, req, debug).await) }
                    });

                    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), svc);
                    tokio::pin!(conn);

                    let res = tokio::select! {
                        res = conn.as_mut() => res,
                        _ = draining.changed() => {
                            conn.as_mut().graceful_shutdown();
                            conn.await
                        }
                    };
                    if let Err(e) = res {
                        error!(%peer, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks so the set stays small.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);
    let _ = draining_tx.send(true);

    let drained = tokio::time::timeout(config.shutdown_timeout, async {
        while tasks.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!(in_flight = tasks.len(), "shutdown timeout elapsed, aborting connections");
        tasks.shutdown().await;
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response. Every failure has already
/// been turned into a response by the time this returns.
async fn dispatch(
    router: &Router,
    req: hyper::Request<Incoming>,
    debug: bool,
) -> http::Response<ResponseBody> {
    let (parts, body) = req.into_parts();

    if debug {
        info!(method = %parts.method, path = %parts.uri, "request");
    }

    let Ok(method) = Method::try_from(&parts.method) else {
        return Response::error(StatusCode::NOT_FOUND).into_inner();
    };

    let response = match router.lookup(method, parts.uri.path()) {
        Lookup::Found(handler, params) => {
            handler.call(Request::new(method, parts, params, body)).await
        }
        Lookup::NotFound => Response::error(StatusCode::NOT_FOUND),
        Lookup::BadUrl => {
            warn!(path = %parts.uri, "malformed url");
            Response::error(StatusCode::FORBIDDEN)
        }
    };

    response.into_inner()
}
