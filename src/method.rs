//! HTTP method as a typed enum.
//!
//! Covers the RFC 9110 standard methods. Requests carrying any other method
//! never match a route and fall through to the `404` default handler.

use std::fmt;
use std::str::FromStr;

/// A routable HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }
}

/// Parses a method name in any letter case: `"get"`, `"Get"` and `"GET"` are
/// the same route method.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CONNECT" => Ok(Self::Connect),
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "TRACE"   => Ok(Self::Trace),
            _         => Err(()),
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = ();

    /// Wire methods are case-sensitive (RFC 9110 §9.1): `get` is not `GET`.
    fn try_from(m: &http::Method) -> Result<Self, Self::Error> {
        match *m {
            http::Method::CONNECT => Ok(Self::Connect),
            http::Method::DELETE  => Ok(Self::Delete),
            http::Method::GET     => Ok(Self::Get),
            http::Method::HEAD    => Ok(Self::Head),
            http::Method::OPTIONS => Ok(Self::Options),
            http::Method::PATCH   => Ok(Self::Patch),
            http::Method::POST    => Ok(Self::Post),
            http::Method::PUT     => Ok(Self::Put),
            http::Method::TRACE   => Ok(Self::Trace),
            _                     => Err(()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
