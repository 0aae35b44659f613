//! Folder routes: `GET <prefix>/{*path}` served from a base directory.

use http::StatusCode;
use tokio::fs::File;
use tracing::{error, warn};

use crate::guard::PathGuard;
use crate::handler::{BoxFuture, ErasedHandler};
use crate::request::Request;
use crate::response::Response;

/// Name of the wildcard parameter appended to every folder route.
pub(crate) const WILDCARD: &str = "path";

pub(crate) struct FolderHandler {
    guard: PathGuard,
}

impl FolderHandler {
    pub(crate) fn new(guard: PathGuard) -> Self {
        Self { guard }
    }
}

impl ErasedHandler for FolderHandler {
    fn call(&self, req: Request) -> BoxFuture {
        let resolved = self.guard.resolve(req.param(WILDCARD).unwrap_or_default());
        let path = match resolved {
            Ok(path) => path,
            Err(why) => {
                warn!(path = req.path(), "folder request rejected: {why}");
                return Box::pin(async { Response::error(StatusCode::FORBIDDEN) });
            }
        };

        Box::pin(async move {
            let file = match File::open(&path).await {
                Ok(f) => f,
                Err(e) => {
                    error!(file = %path.display(), "open failed: {e}");
                    return Response::error(StatusCode::INTERNAL_SERVER_ERROR);
                }
            };
            match file.metadata().await {
                Ok(meta) if meta.is_file() => Response::file(file, meta.len()),
                Ok(_) => {
                    error!(file = %path.display(), "not a regular file");
                    Response::error(StatusCode::INTERNAL_SERVER_ERROR)
                }
                Err(e) => {
                    error!(file = %path.display(), "stat failed: {e}");
                    Response::error(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }
        })
    }
}
