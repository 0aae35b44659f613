//! Unified error type.

use std::path::PathBuf;

/// The error type returned by localserve's fallible operations.
///
/// Request-level failures (403, 404, 500) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// setup mistakes (a bad port, a bad route or folder), misuse of the
/// start/stop lifecycle, and infrastructure failures such as binding the port.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid port: {0}")]
    InvalidPort(u16),

    /// Empty, forbidden characters, or a pattern the route tree cannot parse.
    #[error("invalid route path `{0}`")]
    InvalidRoute(String),

    #[error("invalid folder path `{}`: must be absolute", .0.display())]
    InvalidFolder(PathBuf),

    #[error("route `{route}` conflicts with an existing registration: {source}")]
    RouteConflict {
        route: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("already listening")]
    AlreadyListening,

    #[error("server is not listening")]
    NotListening,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
