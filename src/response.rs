//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Three shapes leave this server: buffered bodies (JSON, text, the
//! structured `{code, message}` errors), empty bodies (204, HEAD-like
//! answers), and files streamed from disk in fixed-size chunks. They all
//! share one boxed body type so handlers can return any of them.

use std::io;

use bytes::{Bytes, BytesMut};
use futures_util::stream;
use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Read size for streamed files. Peak memory per download stays at one chunk.
const FILE_CHUNK_SIZE: usize = 64 * 1024;

const CORS_MAX_AGE_SECS: &str = "86400";

/// The body every [`Response`] carries.
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values for use with [`ResponseBuilder::bytes`].
#[derive(Clone, Copy, Debug)]
pub enum ContentType {
    Json,        // application/json
    OctetStream, // application/octet-stream  (binary / file download)
    Text,        // text/plain; charset=utf-8
}

impl ContentType {
    fn header_value(self) -> HeaderValue {
        HeaderValue::from_static(match self {
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
        })
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts
///
/// ```rust
/// use localserve::{Response, StatusCode};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// Response::error(StatusCode::NOT_FOUND); // {"code":404,"message":"Not Found"}
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use localserve::{ContentType, Response, StatusCode};
/// use localserve::header::{HeaderValue, LOCATION};
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header(LOCATION, HeaderValue::from_static("/users/42"))
///     .json(br#"{"id":42}"#.to_vec());
/// ```
pub struct Response {
    inner: http::Response<ResponseBody>,
}

impl Response {
    /// `200 OK` with an `application/json` body.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` with a `text/plain; charset=utf-8` body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self::builder().status(code).no_body()
    }

    /// The structured error every failure path answers with:
    /// `{"code":<status>,"message":"<reason phrase>"}` as `application/json`.
    pub fn error(code: StatusCode) -> Self {
        let body = serde_json::json!({
            "code": code.as_u16(),
            "message": code.canonical_reason().unwrap_or_default(),
        });
        Self::builder().status(code).json(body.to_string())
    }

    /// `200 OK` streaming `file` as `application/octet-stream`.
    ///
    /// `len` becomes the `content-length`. A read error after the headers
    /// are out aborts the body; the client sees a truncated transfer.
    pub fn file(file: File, len: u64) -> Self {
        let chunks = stream::try_unfold(file, |mut file| async move {
            let mut buf = BytesMut::with_capacity(FILE_CHUNK_SIZE);
            if file.read_buf(&mut buf).await? == 0 {
                return Ok::<_, io::Error>(None);
            }
            Ok(Some((Frame::data(buf.freeze()), file)))
        });

        let mut res = http::Response::new(StreamBody::new(chunks).boxed_unsync());
        let headers = res.headers_mut();
        headers.insert(header::CONTENT_TYPE, ContentType::OctetStream.header_value());
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
        Self { inner: res }
    }

    /// `204 No Content` answer to a CORS preflight that allows every origin.
    pub fn cors_preflight() -> Self {
        Self::builder()
            .status(StatusCode::NO_CONTENT)
            .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"))
            .header(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, GET"))
            .header(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(CORS_MAX_AGE_SECS))
            .no_body()
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn into_inner(self) -> http::Response<ResponseBody> {
        self.inner
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.bytes(ContentType::Json, body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.bytes(ContentType::Text, body.into())
    }

    /// Terminate with a typed body.
    pub fn bytes(mut self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.headers.insert(header::CONTENT_TYPE, content_type.header_value());
        let body = Full::new(body.into()).map_err(|never| match never {});
        self.finish(body.boxed_unsync())
    }

    /// Terminate with no body (e.g. `204 No Content`).
    pub fn no_body(self) -> Response {
        let body = Empty::new().map_err(|never| match never {});
        self.finish(body.boxed_unsync())
    }

    fn finish(self, body: ResponseBody) -> Response {
        let mut res = http::Response::new(body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        Response { inner: res }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from raw handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a raw handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}
