//! Runtime configuration.

use crate::error::ConfigError;
use crate::runtime::env::Environment;
use std::time::Duration;

/// Host and port of the Runtime API.
pub const RUNTIME_API_VAR: &str = "AWS_LAMBDA_RUNTIME_API";
/// Handler identifier, `<module>.<entrypoint>`.
pub const HANDLER_VAR: &str = "_HANDLER";
/// Optional bound on the async completion wait, in milliseconds.
pub const COMPLETION_TIMEOUT_VAR: &str = "HATCH_COMPLETION_TIMEOUT_MS";

/// Configuration for the invocation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Runtime API authority (host:port).
    pub runtime_api: String,
    /// Full handler identifier as configured.
    pub handler: String,
    /// Registry key selected by the handler identifier.
    pub entrypoint: String,
    /// Upper bound on waiting for an async handler. `None` waits forever.
    pub completion_timeout: Option<Duration>,
}

impl RuntimeConfig {
    /// Create a config from a Runtime API authority and a handler identifier.
    pub fn new(
        runtime_api: impl Into<String>,
        handler: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let handler = handler.into();
        let entrypoint = parse_entrypoint(&handler)?.to_string();
        Ok(Self {
            runtime_api: runtime_api.into(),
            handler,
            entrypoint,
            completion_timeout: None,
        })
    }

    /// Read the config from the environment.
    pub fn from_env(env: &dyn Environment) -> Result<Self, ConfigError> {
        let runtime_api = env
            .get(RUNTIME_API_VAR)
            .ok_or(ConfigError::MissingVariable(RUNTIME_API_VAR))?;
        let handler = env
            .get(HANDLER_VAR)
            .ok_or(ConfigError::MissingVariable(HANDLER_VAR))?;

        let mut config = Self::new(runtime_api, handler)?;

        if let Some(raw) = env.get(COMPLETION_TIMEOUT_VAR) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: COMPLETION_TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
            config.completion_timeout = Some(Duration::from_millis(millis));
        }

        Ok(config)
    }

    /// Set the completion timeout.
    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = Some(timeout);
        self
    }

    /// Base URL of the Runtime API.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.runtime_api)
    }
}

/// Everything after the first `.` of the handler identifier.
fn parse_entrypoint(handler: &str) -> Result<&str, ConfigError> {
    match handler.split_once('.') {
        Some((_, entrypoint)) if !entrypoint.is_empty() => Ok(entrypoint),
        _ => Err(ConfigError::InvalidHandlerName(handler.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::env::MemoryEnv;

    #[test]
    fn test_entrypoint_is_text_after_first_separator() {
        let config = RuntimeConfig::new("127.0.0.1:9001", "index.process").unwrap();
        assert_eq!(config.entrypoint, "process");
        assert_eq!(config.handler, "index.process");

        let nested = RuntimeConfig::new("127.0.0.1:9001", "pkg.module.run").unwrap();
        assert_eq!(nested.entrypoint, "module.run");
    }

    #[test]
    fn test_identifier_without_separator_is_rejected() {
        let result = RuntimeConfig::new("127.0.0.1:9001", "process");
        assert!(matches!(result, Err(ConfigError::InvalidHandlerName(_))));

        let result = RuntimeConfig::new("127.0.0.1:9001", "index.");
        assert!(matches!(result, Err(ConfigError::InvalidHandlerName(_))));
    }

    #[test]
    fn test_from_env_requires_both_variables() {
        let env = MemoryEnv::new().with(HANDLER_VAR, "index.process");
        let result = RuntimeConfig::from_env(&env);
        assert!(matches!(
            result,
            Err(ConfigError::MissingVariable(RUNTIME_API_VAR))
        ));

        let env = MemoryEnv::new().with(RUNTIME_API_VAR, "127.0.0.1:9001");
        let result = RuntimeConfig::from_env(&env);
        assert!(matches!(result, Err(ConfigError::MissingVariable(HANDLER_VAR))));
    }

    #[test]
    fn test_from_env_reads_completion_timeout() {
        let env = MemoryEnv::new()
            .with(RUNTIME_API_VAR, "127.0.0.1:9001")
            .with(HANDLER_VAR, "index.process")
            .with(COMPLETION_TIMEOUT_VAR, "2500");
        let config = RuntimeConfig::from_env(&env).unwrap();
        assert_eq!(config.completion_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.base_url(), "http://127.0.0.1:9001");

        env.set(COMPLETION_TIMEOUT_VAR, "soon");
        let result = RuntimeConfig::from_env(&env);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
