//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Patterns use `{name}` for
//! a single segment and `{*name}` for the remainder of the path.
//!
//! Lookup has three outcomes: a handler plus its decoded parameters, no
//! route (the caller answers 404), or a malformed URL whose parameters do
//! not percent-decode (the caller answers 403).

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::config::ServerConfig;
use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::method::Method;
use crate::request::Params;

pub(crate) enum Lookup {
    Found(BoxedHandler, Params),
    NotFound,
    BadUrl,
}

/// The route table. Built at setup time, read-only while serving.
#[derive(Clone)]
pub(crate) struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    case_sensitive: bool,
    max_param_length: usize,
}

impl Router {
    pub(crate) fn new(config: &ServerConfig) -> Self {
        Self {
            routes: HashMap::new(),
            case_sensitive: config.case_sensitive,
            max_param_length: config.max_param_length,
        }
    }

    pub(crate) fn insert(
        &mut self,
        method: Method,
        pattern: &str,
        handler: BoxedHandler,
    ) -> Result<(), Error> {
        if !pattern.starts_with('/') {
            return Err(Error::InvalidRoute(pattern.to_owned()));
        }
        let key = if self.case_sensitive {
            pattern.to_owned()
        } else {
            fold_static_case(pattern)
        };
        self.routes
            .entry(method)
            .or_default()
            .insert(key, handler)
            .map_err(|source| match source {
                matchit::InsertError::Conflict { .. } => {
                    Error::RouteConflict { route: pattern.to_owned(), source }
                }
                _ => Error::InvalidRoute(pattern.to_owned()),
            })
    }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> Lookup {
        let Some(decoded) = decode_path(path) else {
            return Lookup::BadUrl;
        };
        let Some(tree) = self.routes.get(&method) else {
            return Lookup::NotFound;
        };

        let folded;
        let key = if self.case_sensitive {
            decoded.as_str()
        } else {
            folded = decoded.to_ascii_lowercase();
            folded.as_str()
        };

        let Ok(matched) = tree.at(key) else {
            return Lookup::NotFound;
        };

        let mut params = HashMap::new();
        for (name, raw) in matched.params.iter() {
            if raw.len() > self.max_param_length {
                return Lookup::NotFound;
            }
            // ASCII folding keeps byte offsets, so the value is re-read from
            // the decoded path with its original case.
            let raw = original_slice(&decoded, key, raw);
            let Some(value) = decode_param(raw) else {
                return Lookup::BadUrl;
            };
            params.insert(name.to_owned(), value);
        }

        Lookup::Found(Arc::clone(matched.value), Params::new(params))
    }
}

/// Lowercases the static parts of a pattern, leaving `{param}` names alone.
fn fold_static_case(pattern: &str) -> String {
    let mut depth = 0usize;
    pattern
        .chars()
        .map(|c| {
            match c {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            if depth == 0 { c.to_ascii_lowercase() } else { c }
        })
        .collect()
}

/// Maps `part`, a slice of `searched`, onto the same byte range of `original`.
fn original_slice<'a>(original: &'a str, searched: &str, part: &'a str) -> &'a str {
    let offset = (part.as_ptr() as usize).wrapping_sub(searched.as_ptr() as usize);
    offset
        .checked_add(part.len())
        .and_then(|end| original.get(offset..end))
        .unwrap_or(part)
}

/// Escapes that stay encoded when the whole path is decoded, so they cannot
/// change how the path splits into segments. Parameters decode them later.
const KEPT_ESCAPES: [u8; 4] = [b'/', b'?', b'#', b'%'];

/// Strictly decodes a request path before matching. Every `%` must start a
/// two-hex-digit escape and the result must be UTF-8; `%2F`, `%3F`, `%23` and
/// `%25` are left as they are.
fn decode_path(path: &str) -> Option<String> {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3)?;
            let byte = hex_value(escape[0])? << 4 | hex_value(escape[1])?;
            if KEPT_ESCAPES.contains(&byte) {
                out.extend_from_slice(&bytes[i..i + 3]);
            } else {
                out.push(byte);
            }
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn hex_value(digit: u8) -> Option<u8> {
    char::from(digit).to_digit(16).map(|d| d as u8)
}

/// Decodes the escapes a parameter still carries after [`decode_path`].
fn decode_param(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3)?;
            if !escape.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    urlencoding::decode(raw).ok().map(|v| v.into_owned())
}
