//! # localserve
//!
//! A small HTTP server for the loopback interface. It binds `127.0.0.1`,
//! routes requests through a radix tree, and offers three kinds of route:
//!
//! - **Folder routes** — `GET /prefix/<path>` streams a file from a base
//!   directory, after the path has been confined to that directory.
//! - **Callback routes** — a plain function receives path and query
//!   parameters; its return value becomes a JSON response.
//! - **Raw routes** — an `async fn(Request) -> impl IntoResponse` with full
//!   control over the response.
//!
//! Unmatched routes answer `404`, malformed URLs and confinement failures
//! answer `403`, failures inside handlers answer `500`. All three carry the
//! same JSON body shape: `{"code":404,"message":"Not Found"}`.
//!
//! What this crate does not do: TLS, HTTP/2, authentication, request-body
//! parsing, rate limiting, binding anything but loopback.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use localserve::{LocalhostServer, Method, Request, Response, ResponseMode, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), localserve::Error> {
//!     let mut server = LocalhostServer::new(ServerConfig::new(3000).cors_allow_all(true))?;
//!
//!     server
//!         .serve_folder("/files", "/srv/data")?
//!         .serve_custom_callback_route(
//!             Method::Get,
//!             "/users/{id}",
//!             |params, query| {
//!                 Ok::<_, String>(serde_json::json!({
//!                     "id": params.get("id"),
//!                     "verbose": query.get("verbose").is_some(),
//!                 }))
//!             },
//!             ResponseMode::AutoDetect,
//!         )?
//!         .serve_raw_route(Method::Get, "/ping", ping)?;
//!
//!     server.start().await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await
//! }
//!
//! async fn ping(_req: Request) -> Response {
//!     Response::text("pong")
//! }
//! ```

mod callback;
mod config;
mod error;
mod folder;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod guard;

pub use callback::ResponseMode;
pub use config::ServerConfig;
pub use error::Error;
pub use handler::Handler;
pub use http::{HeaderMap, StatusCode, header};
pub use method::Method;
pub use request::{Params, Query, Request};
pub use response::{ContentType, IntoResponse, Response, ResponseBody, ResponseBuilder};
pub use server::LocalhostServer;
