//! Hatch bootstrap - sample custom runtime executable.
//!
//! Registers one sample lambda of each shape. `_HANDLER` picks which one
//! serves invocations, e.g. `_HANDLER=bootstrap.hello`.

use hatch::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct EchoRequest {
    message: String,
    #[serde(default)]
    repeat: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EchoResponse {
    message: String,
    request_id: String,
}

#[derive(Debug, Deserialize)]
struct SleepRequest {
    millis: u64,
}

#[derive(Debug, Serialize)]
struct SleepResponse {
    slept_ms: u64,
    remaining_ms: Option<u64>,
}

/// Greets the `name` field of the event.
fn hello(event: JsonObject, ctx: &Context) -> Result<JsonObject, Error> {
    let name = event
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("World");

    let mut reply = JsonObject::new();
    reply.insert("message".into(), format!("Hello, {}!", name).into());
    reply.insert("function".into(), ctx.function_name.clone().into());
    reply.insert("request_id".into(), ctx.aws_request_id.clone().into());
    Ok(reply)
}

/// Echoes the message back, optionally repeated.
fn echo(request: EchoRequest, ctx: &Context) -> Result<EchoResponse, Error> {
    let repeat = request.repeat.unwrap_or(1);
    if repeat == 0 {
        return Err("repeat must be greater than 0".into());
    }
    Ok(EchoResponse {
        message: request.message.repeat(repeat),
        request_id: ctx.aws_request_id.clone(),
    })
}

/// Completes from a worker thread after the requested delay.
fn sleep(request: SleepRequest, ctx: Context, completion: Completion<SleepResponse>) {
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(request.millis));
        completion.succeed(SleepResponse {
            slept_ms: request.millis,
            remaining_ms: remaining_ms(&ctx),
        });
    });
}

/// Milliseconds left before the deadline, if one was sent.
fn remaining_ms(ctx: &Context) -> Option<u64> {
    ctx.remaining_time()
        .and_then(|left| u64::try_from(left.as_millis()).ok())
}

#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    // Lambda captures stderr into the function's log stream
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut runtime = Runtime::from_env()?;

    let warm = Arc::new(AtomicU64::new(0));
    runtime
        .register_json("hello", hello)
        .register_typed("echo", echo)
        .register_typed_async("sleep", sleep)
        .register_json_async("counter", move |_event, _ctx, completion| {
            let count = warm.fetch_add(1, Ordering::SeqCst) + 1;
            let mut reply = JsonObject::new();
            reply.insert("count".into(), count.into());
            tokio::spawn(async move {
                completion.succeed(reply);
            });
        });

    tracing::info!(
        "Registered handlers: {}",
        runtime.registry().names().join(", ")
    );

    runtime.start().await
}
