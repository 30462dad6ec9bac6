//! The invocation loop.

use crate::error::{Error, HandlerError, RuntimeError};
use crate::function::{Completion, Context, Handler, HandlerRegistry, JsonObject};
use crate::http::invocation::REQUEST_ID_HEADER;
use crate::http::{HttpTransport, Invocation, InvocationError, Transport};
use crate::runtime::config::RuntimeConfig;
use crate::runtime::env::{Environment, ProcessEnv};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Custom runtime: fetches invocations, dispatches them to the configured
/// handler and reports the outcome.
pub struct Runtime {
    config: RuntimeConfig,
    registry: HandlerRegistry,
    transport: Arc<dyn Transport>,
    env: Arc<dyn Environment>,
    counter: u64,
}

impl Runtime {
    /// Create a runtime configured from the process environment, talking to
    /// the Runtime API over HTTP.
    pub fn from_env() -> Result<Self, RuntimeError> {
        let env: Arc<dyn Environment> = Arc::new(ProcessEnv);
        let config = RuntimeConfig::from_env(env.as_ref())?;
        let transport = Arc::new(HttpTransport::new(config.base_url()));
        Ok(Self::with_parts(config, transport, env))
    }

    /// Create a runtime from explicit parts.
    pub fn with_parts(
        config: RuntimeConfig,
        transport: Arc<dyn Transport>,
        env: Arc<dyn Environment>,
    ) -> Self {
        Self {
            config,
            registry: HandlerRegistry::new(),
            transport,
            env,
            counter: 0,
        }
    }

    /// Configuration the runtime was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Handlers registered so far.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Number of invocations fetched so far.
    pub fn invocation_count(&self) -> u64 {
        self.counter
    }

    /// Register a handler under a name.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) -> &mut Self {
        self.registry.register(name, handler);
        self
    }

    /// Register a synchronous handler over JSON objects.
    pub fn register_json<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(JsonObject, &Context) -> Result<JsonObject, Error> + Send + Sync + 'static,
    {
        self.register(name, Handler::json(handler))
    }

    /// Register a callback-based handler over JSON objects.
    pub fn register_json_async<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(JsonObject, Context, Completion<JsonObject>) + Send + Sync + 'static,
    {
        self.register(name, Handler::json_async(handler))
    }

    /// Register a synchronous handler over serde types.
    pub fn register_typed<I, O, F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        I: DeserializeOwned + 'static,
        O: Serialize + 'static,
        F: Fn(I, &Context) -> Result<O, Error> + Send + Sync + 'static,
    {
        self.register(name, Handler::typed(handler))
    }

    /// Register a callback-based handler over serde types.
    pub fn register_typed_async<I, O, F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        I: DeserializeOwned + 'static,
        O: Serialize + Send + 'static,
        F: Fn(I, Context, Completion<O>) + Send + Sync + 'static,
    {
        self.register(name, Handler::typed_async(handler))
    }

    /// Run the invocation loop.
    ///
    /// Only returns on a fatal error: a failed fetch, a missing request id,
    /// or no handler registered for the configured entrypoint.
    pub async fn start(&mut self) -> Result<(), RuntimeError> {
        info!(
            "Starting runtime for handler {} against {}",
            self.config.handler, self.config.runtime_api
        );

        loop {
            let invocation = self.transport.next_invocation().await?;
            self.counter += 1;
            info!("Invocation-Counter: {}", self.counter);

            self.process(invocation).await?;
        }
    }

    /// Dispatch one fetched invocation and report its outcome.
    async fn process(&self, invocation: Invocation) -> Result<(), RuntimeError> {
        let handler = self
            .registry
            .resolve(&self.config.entrypoint)
            .ok_or_else(|| RuntimeError::UnknownHandler(self.config.entrypoint.clone()))?;

        let request_id = invocation
            .request_id()
            .ok_or(RuntimeError::MissingHeader(REQUEST_ID_HEADER))?
            .to_string();

        let outcome = match Context::build(self.env.as_ref(), &invocation.headers) {
            Ok(context) => {
                debug!(
                    "Dispatching {} to {} handler '{}'",
                    request_id,
                    handler.kind(),
                    self.config.entrypoint
                );
                handler
                    .apply(&invocation.body, context, self.config.completion_timeout)
                    .await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(output) => self.report_success(&request_id, output).await,
            Err(e) => self.report_failure(&request_id, &e).await,
        }

        Ok(())
    }

    async fn report_success(&self, request_id: &str, output: Bytes) {
        if let Err(e) = self.transport.send_response(request_id, output).await {
            error!("Failed to report response for {}: {}", request_id, e);
        }
    }

    async fn report_failure(&self, request_id: &str, failure: &HandlerError) {
        error!("Invocation {} failed: {}", request_id, failure);
        let body = InvocationError::new(failure).to_json();
        if let Err(e) = self.transport.send_error(request_id, body).await {
            error!("Failed to report error for {}: {}", request_id, e);
        }
    }
}
