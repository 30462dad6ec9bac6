//! Handlers, their per-invocation context, and the registry they live in.

pub mod completion;
pub mod context;
pub mod handler;
pub mod registry;

pub use completion::Completion;
pub use context::Context;
pub use handler::{Handler, JsonObject};
pub use registry::HandlerRegistry;
