//! # Hatch - a custom Lambda runtime
//!
//! Hatch implements the Lambda Runtime API loop for Rust handlers. It
//! fetches the next invocation, dispatches it to the handler selected by
//! `_HANDLER`, and reports the result or the error back to the platform,
//! one invocation at a time, for the life of the process.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Lambda Runtime API                       │
//! └──────────────────────────────────────────────────────────────┘
//!        │ GET .../invocation/next        ▲ POST .../response
//!        ▼                                │ POST .../error
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Runtime loop                          │
//! │   fetch ──► resolve handler ──► build Context ──► apply      │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                   Handler Registry                     │  │
//! │  │  ┌───────────┐ ┌────────────┐ ┌───────────┐ ┌────────┐ │  │
//! │  │  │ json-sync │ │ json-async │ │typed-sync │ │typed-  │ │  │
//! │  │  │           │ │            │ │           │ │async   │ │  │
//! │  │  └───────────┘ └────────────┘ └───────────┘ └────────┘ │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hatch::prelude::*;
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RuntimeError> {
//!     let mut runtime = Runtime::from_env()?;
//!
//!     // _HANDLER=index.process selects this handler
//!     runtime.register_json("process", |mut event, ctx| {
//!         event.insert("requestId".into(), Value::String(ctx.aws_request_id.clone()));
//!         Ok(event)
//!     });
//!
//!     runtime.start().await
//! }
//! ```
//!
//! ## Failures
//!
//! Errors returned by a handler, panics during dispatch and payload codec
//! errors fail only the current invocation: they are reported as
//! `{"errorMessage": "..."}` and the loop carries on. Configuration errors,
//! an unknown entrypoint and Runtime API fetch failures end
//! [`Runtime::start`].

pub mod error;
pub mod function;
pub mod http;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::error::{Error, HandlerError, RuntimeError};
    pub use crate::function::{Completion, Context, Handler, HandlerRegistry, JsonObject};
    pub use crate::http::{HttpTransport, Invocation, InvocationError, Transport};
    pub use crate::runtime::{Environment, MemoryEnv, ProcessEnv, Runtime, RuntimeConfig};
    pub use async_trait::async_trait;
}

// Re-export for convenience
pub use error::{Error, HandlerError, RuntimeError};
pub use function::{Completion, Context, Handler, HandlerRegistry, JsonObject};
pub use runtime::{Runtime, RuntimeConfig};
