//! Server construction parameters.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::Error;

const DEFAULT_MAX_PARAM_LENGTH: usize = 600;
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a [`LocalhostServer`](crate::LocalhostServer) needs to know up
/// front. Moved into the server on construction and never changed afterwards.
///
/// ```rust
/// use localserve::ServerConfig;
///
/// let config = ServerConfig::new(8080)
///     .case_sensitive(false)
///     .cors_allow_all(true);
/// assert_eq!(config.addr().to_string(), "127.0.0.1:8080");
/// ```
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub(crate) port: u16,
    pub(crate) max_param_length: usize,
    pub(crate) case_sensitive: bool,
    pub(crate) debug: bool,
    pub(crate) cors_allow_all: bool,
    pub(crate) shutdown_timeout: Duration,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            max_param_length: DEFAULT_MAX_PARAM_LENGTH,
            case_sensitive: true,
            debug: false,
            cors_allow_all: false,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Longest accepted path parameter, in bytes. A request whose parameter
    /// exceeds it does not match the route.
    pub fn max_param_length(mut self, len: usize) -> Self {
        self.max_param_length = len;
        self
    }

    pub fn case_sensitive(mut self, on: bool) -> Self {
        self.case_sensitive = on;
        self
    }

    /// Log every dispatched request at `info` level.
    pub fn debug(mut self, on: bool) -> Self {
        self.debug = on;
        self
    }

    /// Answer `OPTIONS` on every path with a permissive CORS preflight.
    pub fn cors_allow_all(mut self, on: bool) -> Self {
        self.cors_allow_all = on;
        self
    }

    /// How long [`stop`](crate::LocalhostServer::stop) waits for in-flight
    /// requests before aborting them.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The bind address. Always loopback.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.port == 0 {
            return Err(Error::InvalidPort(self.port));
        }
        Ok(())
    }
}
