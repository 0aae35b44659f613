//! Minimal localserve example: a static folder, a JSON callback and a raw route.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic -- /absolute/folder/to/serve
//!
//! Try:
//!   curl http://127.0.0.1:3000/files/some/file.txt
//!   curl 'http://127.0.0.1:3000/users/42?fields=name'
//!   curl -X DELETE http://127.0.0.1:3000/users/42
//!   curl http://127.0.0.1:3000/healthz
//!   curl -X OPTIONS -i http://127.0.0.1:3000/anything

use localserve::{LocalhostServer, Method, Request, Response, ResponseMode, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), localserve::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "localserve=debug".into()),
        )
        .init();

    let folder = std::env::args().nth(1).unwrap_or_else(|| "/tmp".to_owned());

    let mut server = LocalhostServer::new(
        ServerConfig::new(3000).debug(true).cors_allow_all(true),
    )?;

    server
        .serve_folder("/files", folder)?
        .serve_custom_callback_route(Method::Get, "/users/{id}", get_user, ResponseMode::AutoDetect)?
        .serve_custom_callback_route(
            Method::Delete,
            "/users/{id}",
            |_, _| Ok::<_, String>(()),
            ResponseMode::NoContent,
        )?
        .serve_raw_route(Method::Get, "/healthz", healthz)?;

    server.start().await?;
    tokio::signal::ctrl_c().await?;
    server.stop().await
}

// GET /users/{id} → 200 JSON, or 204 for id 0.
fn get_user(
    params: &localserve::Params,
    query: &localserve::Query,
) -> Result<Option<serde_json::Value>, String> {
    let id: u64 = params
        .get("id")
        .unwrap_or_default()
        .parse()
        .map_err(|e| format!("bad id: {e}"))?;
    if id == 0 {
        return Ok(None);
    }
    Ok(Some(serde_json::json!({
        "id": id,
        "name": "alice",
        "fields": query.get("fields"),
    })))
}

async fn healthz(_req: Request) -> Response {
    Response::text("ok")
}
