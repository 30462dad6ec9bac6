//! The runtime: configuration, environment access and the invocation loop.

mod config;
pub mod env;
mod invocation_loop;

pub use config::{RuntimeConfig, COMPLETION_TIMEOUT_VAR, HANDLER_VAR, RUNTIME_API_VAR};
pub use env::{Environment, MemoryEnv, ProcessEnv};
pub use invocation_loop::Runtime;
