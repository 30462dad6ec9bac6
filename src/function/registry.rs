//! Handler registry.

use crate::error::Error;
use crate::function::completion::Completion;
use crate::function::context::Context;
use crate::function::handler::{Handler, JsonObject};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Maps entrypoint names to handlers.
///
/// Filled before the invocation loop starts and only read afterwards, so
/// lookups need no locking.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A later registration under the same name wins.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) {
        let name = name.into();
        let kind = handler.kind();
        if self.handlers.insert(name.clone(), handler).is_some() {
            warn!("Replaced handler registered as '{}'", name);
        }
        debug!("Registered {} handler: {}", kind, name);
    }

    /// Register a synchronous JSON handler.
    pub fn register_json<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(JsonObject, &Context) -> Result<JsonObject, Error> + Send + Sync + 'static,
    {
        self.register(name, Handler::json(handler));
    }

    /// Register a callback-based JSON handler.
    pub fn register_json_async<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(JsonObject, Context, Completion<JsonObject>) + Send + Sync + 'static,
    {
        self.register(name, Handler::json_async(handler));
    }

    /// Register a synchronous typed handler.
    pub fn register_typed<I, O, F>(&mut self, name: impl Into<String>, handler: F)
    where
        I: DeserializeOwned + 'static,
        O: Serialize + 'static,
        F: Fn(I, &Context) -> Result<O, Error> + Send + Sync + 'static,
    {
        self.register(name, Handler::typed(handler));
    }

    /// Register a callback-based typed handler.
    pub fn register_typed_async<I, O, F>(&mut self, name: impl Into<String>, handler: F)
    where
        I: DeserializeOwned + 'static,
        O: Serialize + Send + 'static,
        F: Fn(I, Context, Completion<O>) + Send + Sync + 'static,
    {
        self.register(name, Handler::typed_async(handler));
    }

    /// Look up a handler by name.
    pub fn resolve(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
