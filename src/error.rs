//! Error types for the runtime.
//!
//! Errors fall into two tiers. [`RuntimeError`] is fatal: it ends the
//! invocation loop and the process is expected to exit. [`HandlerError`]
//! belongs to a single invocation and is reported to the Runtime API before
//! the loop moves on.

use std::time::Duration;

/// Error type returned by user handler code.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Fatal runtime errors. Any of these ends [`Runtime::start`](crate::Runtime::start).
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no handler registered for entrypoint '{0}'")]
    UnknownHandler(String),

    #[error("next invocation is missing the {0} header")]
    MissingHeader(&'static str),

    #[error("failed to fetch next invocation: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration errors, detected once at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVariable(&'static str),

    #[error("invalid handler identifier '{0}', expected <module>.<entrypoint>")]
    InvalidHandlerName(String),

    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },
}

/// Failure of a single invocation, caught at the dispatch boundary.
///
/// The `Display` output becomes the `errorMessage` of the error report.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The handler itself returned an error.
    #[error("{0}")]
    Failed(Error),

    #[error("failed to decode event payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode handler output: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("handler dropped its completion without firing it")]
    Abandoned,

    #[error("handler did not complete within {0:?}")]
    TimedOut(Duration),

    #[error("next invocation is missing the {0} header")]
    MissingHeader(&'static str),
}

impl HandlerError {
    /// Wrap an arbitrary user error.
    pub fn failed(error: impl Into<Error>) -> Self {
        HandlerError::Failed(error.into())
    }
}

/// Errors talking to the Runtime API.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid runtime API endpoint: {0}")]
    Endpoint(#[from] http::Error),

    #[error("request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read response body: {0}")]
    Body(#[from] hyper::Error),

    #[error("{uri} returned {status}")]
    Status { uri: String, status: http::StatusCode },

    /// Used by non-HTTP transports (tests, local replays) to signal that no
    /// further invocations will arrive.
    #[error("transport closed: {0}")]
    Closed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_error_renders_user_message_verbatim() {
        let error = HandlerError::failed("boom");
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn test_decode_error_names_its_kind() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = HandlerError::Decode(source);
        assert!(error.to_string().starts_with("failed to decode event payload:"));
    }

    #[test]
    fn test_config_error_is_transparent_in_runtime_error() {
        let error: RuntimeError = ConfigError::MissingVariable("_HANDLER").into();
        assert_eq!(
            error.to_string(),
            "missing required environment variable _HANDLER"
        );
    }
}
