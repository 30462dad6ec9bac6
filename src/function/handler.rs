//! Handler shapes and dispatch.
//!
//! A [`Handler`] is one of four shapes: synchronous or callback-based, each
//! with untyped JSON objects or typed serde payloads. [`Handler::apply`] is
//! the single dispatch operation the invocation loop uses. It always yields
//! exactly one outcome, catching handler errors, payload codec errors and
//! panics raised during the call.

use crate::error::{Error, HandlerError};
use crate::function::completion::{Completion, Pending};
use crate::function::context::Context;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// Untyped event and result payload.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

type JsonSyncFn = dyn Fn(JsonObject, &Context) -> Result<JsonObject, Error> + Send + Sync;
type JsonAsyncFn = dyn Fn(JsonObject, Context, Completion<JsonObject>) + Send + Sync;
type TypedSyncFn = dyn Fn(&[u8], &Context) -> Result<Bytes, HandlerError> + Send + Sync;
type TypedAsyncFn = dyn Fn(&[u8], Context) -> Result<Pending, HandlerError> + Send + Sync;

/// A registered lambda.
pub enum Handler {
    /// Returns a JSON object.
    JsonSync(Arc<JsonSyncFn>),
    /// Completes a JSON object through a callback.
    JsonAsync(Arc<JsonAsyncFn>),
    /// Returns a serde type. Decoding and encoding are erased at registration.
    TypedSync(Arc<TypedSyncFn>),
    /// Completes a serde type through a callback.
    TypedAsync(Arc<TypedAsyncFn>),
}

impl Handler {
    /// Wrap a synchronous JSON handler.
    pub fn json<F>(handler: F) -> Self
    where
        F: Fn(JsonObject, &Context) -> Result<JsonObject, Error> + Send + Sync + 'static,
    {
        Handler::JsonSync(Arc::new(handler))
    }

    /// Wrap a callback-based JSON handler.
    pub fn json_async<F>(handler: F) -> Self
    where
        F: Fn(JsonObject, Context, Completion<JsonObject>) + Send + Sync + 'static,
    {
        Handler::JsonAsync(Arc::new(handler))
    }

    /// Wrap a synchronous typed handler.
    pub fn typed<I, O, F>(handler: F) -> Self
    where
        I: DeserializeOwned + 'static,
        O: Serialize + 'static,
        F: Fn(I, &Context) -> Result<O, Error> + Send + Sync + 'static,
    {
        Handler::TypedSync(Arc::new(move |input: &[u8], context: &Context| {
            let event: I = decode(input)?;
            let output = handler(event, context).map_err(HandlerError::Failed)?;
            encode(&output)
        }))
    }

    /// Wrap a callback-based typed handler.
    pub fn typed_async<I, O, F>(handler: F) -> Self
    where
        I: DeserializeOwned + 'static,
        O: Serialize + Send + 'static,
        F: Fn(I, Context, Completion<O>) + Send + Sync + 'static,
    {
        Handler::TypedAsync(Arc::new(move |input: &[u8], context: Context| {
            let event: I = decode(input)?;
            let (completion, pending) = Completion::gate(|output: O| encode(&output));
            handler(event, context, completion);
            Ok(pending)
        }))
    }

    /// Whether the handler completes through a callback.
    pub fn is_async(&self) -> bool {
        matches!(self, Handler::JsonAsync(_) | Handler::TypedAsync(_))
    }

    /// Short name of the handler shape, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Handler::JsonSync(_) => "json-sync",
            Handler::JsonAsync(_) => "json-async",
            Handler::TypedSync(_) => "typed-sync",
            Handler::TypedAsync(_) => "typed-async",
        }
    }

    /// Run the handler against a raw event payload.
    ///
    /// Sync handlers run on the blocking thread pool, so they may block or
    /// drive a runtime of their own. Async handlers are awaited until their completion fires, or until
    /// `timeout` elapses when one is given.
    pub async fn apply(
        &self,
        input: &[u8],
        context: Context,
        timeout: Option<Duration>,
    ) -> Result<Bytes, HandlerError> {
        let pending = match self {
            Handler::JsonSync(handler) => {
                let event = decode_object(input)?;
                let handler = Arc::clone(handler);
                let output = blocking(move || handler(event, &context))
                    .await?
                    .map_err(HandlerError::Failed)?;
                return encode(&output);
            }
            Handler::TypedSync(handler) => {
                let handler = Arc::clone(handler);
                let input = Bytes::copy_from_slice(input);
                return blocking(move || handler(&input[..], &context)).await?;
            }
            Handler::JsonAsync(handler) => {
                let event = decode_object(input)?;
                let (completion, pending) =
                    Completion::gate(|output: JsonObject| encode(&output));
                guard(move || handler(event, context, completion))?;
                pending
            }
            Handler::TypedAsync(handler) => guard(move || handler(input, context))??,
        };

        wait(pending, timeout).await
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Handler").field(&self.kind()).finish()
    }
}

async fn wait(pending: Pending, timeout: Option<Duration>) -> Result<Bytes, HandlerError> {
    let received = match timeout {
        Some(limit) => tokio::time::timeout(limit, pending)
            .await
            .map_err(|_| HandlerError::TimedOut(limit))?,
        None => pending.await,
    };
    received.map_err(|_| HandlerError::Abandoned)?
}

/// Run `f` on the blocking pool under [`guard`].
async fn blocking<R, F>(f: F) -> Result<R, HandlerError>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    tokio::task::spawn_blocking(move || guard(f))
        .await
        .map_err(|error| HandlerError::Panicked(error.to_string()))?
}

/// Run `f`, turning a panic into a handler error.
fn guard<R>(f: impl FnOnce() -> R) -> Result<R, HandlerError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| HandlerError::Panicked(panic_message(payload)))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn decode<I: DeserializeOwned>(input: &[u8]) -> Result<I, HandlerError> {
    serde_json::from_slice(input).map_err(HandlerError::Decode)
}

fn decode_object(input: &[u8]) -> Result<JsonObject, HandlerError> {
    decode(input)
}

fn encode<O: Serialize + ?Sized>(output: &O) -> Result<Bytes, HandlerError> {
    serde_json::to_vec(output)
        .map(Bytes::from)
        .map_err(HandlerError::Encode)
}
