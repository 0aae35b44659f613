//! Incoming request types handed to route handlers.

use std::collections::HashMap;

use http::HeaderMap;
use hyper::body::Incoming;

use crate::method::Method;

/// Path parameters captured by the matched route, percent-decoded.
///
/// For a route `/users/{id}`, `params.get("id")` on `/users/42` returns
/// `Some("42")`. A trailing `{*rest}` segment is captured under `rest`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Query-string parameters in request order. Repeated keys are kept.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    /// Parses `application/x-www-form-urlencoded` text (`a=1&b=two+words`).
    pub fn parse(raw: &str) -> Self {
        Self(
            url::form_urlencoded::parse(raw.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An incoming HTTP request, as seen by a raw route handler.
///
/// The body is left untouched; raw handlers own it.
pub struct Request {
    method: Method,
    path: String,
    query: Query,
    headers: HeaderMap,
    params: Params,
    body: Incoming,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        parts: http::request::Parts,
        params: Params,
        body: Incoming,
    ) -> Self {
        let path = parts.uri.path().to_owned();
        let query = Query::parse(parts.uri.query().unwrap_or_default());
        Self { method, path, query, headers: parts.headers, params, body }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> &Query { &self.query }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn params(&self) -> &Params { &self.params }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    /// Takes the request body stream.
    pub fn into_body(self) -> Incoming {
        self.body
    }
}
