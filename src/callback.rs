//! Callback routes: a plain function in, a JSON response out.
//!
//! The callback sees the decoded path parameters and the parsed query string
//! and returns `Result<T, E>`. Whatever goes wrong inside it (an `Err`, a
//! panic, a value that will not serialize) becomes a `500` with the
//! structured error body. The connection never sees it.

use std::fmt::Display;
use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::handler::{BoxFuture, ErasedHandler};
use crate::request::{Params, Query, Request};
use crate::response::Response;

/// How a callback's return value becomes the response.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ResponseMode {
    /// Truthy value → `200` with the value JSON-encoded. Falsy value
    /// (`null`, `false`, `0`, `""`, and so `None`) → `204`, no body.
    #[default]
    AutoDetect,
    /// Always `200`. A string is written as-is; anything else JSON-encoded.
    ReturnData,
    /// Run the callback for its side effects and answer `204`.
    NoContent,
}

pub(crate) struct CallbackHandler<F, T, E> {
    callback: F,
    mode: ResponseMode,
    _output: PhantomData<fn() -> (T, E)>,
}

impl<F, T, E> CallbackHandler<F, T, E> {
    pub(crate) fn new(callback: F, mode: ResponseMode) -> Self {
        Self { callback, mode, _output: PhantomData }
    }
}

impl<F, T, E> CallbackHandler<F, T, E>
where
    F: Fn(&Params, &Query) -> Result<T, E>,
    T: Serialize,
    E: Display,
{
    fn respond(&self, params: &Params, query: &Query) -> Response {
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.callback)(params, query)));
        match outcome {
            Ok(Ok(value)) => render(self.mode, &value),
            Ok(Err(e)) => {
                error!("callback failed: {e}");
                Response::error(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Err(_) => {
                error!("callback panicked");
                Response::error(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl<F, T, E> ErasedHandler for CallbackHandler<F, T, E>
where
    F: Fn(&Params, &Query) -> Result<T, E> + Send + Sync,
    T: Serialize,
    E: Display,
{
    fn call(&self, req: Request) -> BoxFuture {
        // Synchronous callback: run it now, hand back a ready future.
        let res = self.respond(req.params(), req.query());
        Box::pin(async move { res })
    }
}

fn render<T: Serialize>(mode: ResponseMode, value: &T) -> Response {
    if mode == ResponseMode::NoContent {
        return Response::status(StatusCode::NO_CONTENT);
    }

    let value = match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            error!("callback result not serializable: {e}");
            return Response::error(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    match (mode, value) {
        (ResponseMode::ReturnData, Value::String(s)) => Response::json(s),
        (ResponseMode::ReturnData, v) => Response::json(v.to_string()),
        (_, v) if is_truthy(&v) => Response::json(v.to_string()),
        _ => Response::status(StatusCode::NO_CONTENT),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
