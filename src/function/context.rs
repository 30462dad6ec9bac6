//! Per-invocation context.

use crate::error::HandlerError;
use crate::http::invocation::{
    header_str, CLIENT_CONTEXT_HEADER, COGNITO_IDENTITY_HEADER, DEADLINE_HEADER,
    FUNCTION_ARN_HEADER, REQUEST_ID_HEADER, TRACE_ID_HEADER,
};
use crate::runtime::env::Environment;
use http::HeaderMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const FUNCTION_NAME_VAR: &str = "AWS_LAMBDA_FUNCTION_NAME";
pub const FUNCTION_VERSION_VAR: &str = "AWS_LAMBDA_FUNCTION_VERSION";
pub const LOG_GROUP_NAME_VAR: &str = "AWS_LAMBDA_LOG_GROUP_NAME";
pub const LOG_STREAM_NAME_VAR: &str = "AWS_LAMBDA_LOG_STREAM_NAME";
pub const MEMORY_SIZE_VAR: &str = "AWS_LAMBDA_FUNCTION_MEMORY_SIZE";
/// Written with the trace header of the most recent invocation.
pub const TRACE_ID_VAR: &str = "_X_AMZN_TRACE_ID";

/// Metadata for one invocation, handed to the handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub function_name: String,
    pub function_version: String,
    pub log_group_name: String,
    pub log_stream_name: String,
    pub memory_limit_mb: String,
    pub aws_request_id: String,
    pub invoked_function_arn: String,
    /// Invocation deadline in epoch milliseconds.
    pub deadline_ms: Option<u64>,
    pub trace_id: Option<String>,
    /// Raw client context JSON, mobile SDK invocations only.
    pub client_context: Option<String>,
    /// Raw Cognito identity JSON, mobile SDK invocations only.
    pub identity: Option<String>,
}

impl Context {
    /// Build a context from the environment and the fetch response headers.
    ///
    /// Environment fields default to empty strings. The request id and the
    /// invoked function ARN are required.
    pub fn from_parts(env: &dyn Environment, headers: &HeaderMap) -> Result<Self, HandlerError> {
        let aws_request_id = header_str(headers, REQUEST_ID_HEADER)
            .ok_or(HandlerError::MissingHeader(REQUEST_ID_HEADER))?
            .to_string();
        let invoked_function_arn = header_str(headers, FUNCTION_ARN_HEADER)
            .ok_or(HandlerError::MissingHeader(FUNCTION_ARN_HEADER))?
            .to_string();

        Ok(Self {
            function_name: env.get_or_empty(FUNCTION_NAME_VAR),
            function_version: env.get_or_empty(FUNCTION_VERSION_VAR),
            log_group_name: env.get_or_empty(LOG_GROUP_NAME_VAR),
            log_stream_name: env.get_or_empty(LOG_STREAM_NAME_VAR),
            memory_limit_mb: env.get_or_empty(MEMORY_SIZE_VAR),
            aws_request_id,
            invoked_function_arn,
            deadline_ms: header_str(headers, DEADLINE_HEADER)
                .and_then(|raw| raw.trim().parse().ok()),
            trace_id: header_str(headers, TRACE_ID_HEADER).map(str::to_string),
            client_context: header_str(headers, CLIENT_CONTEXT_HEADER).map(str::to_string),
            identity: header_str(headers, COGNITO_IDENTITY_HEADER).map(str::to_string),
        })
    }

    /// Build a context and publish its trace id to the environment.
    pub fn build(env: &dyn Environment, headers: &HeaderMap) -> Result<Self, HandlerError> {
        // The trace id is propagated even if the rest of the context is invalid.
        if let Some(trace_id) = header_str(headers, TRACE_ID_HEADER) {
            env.set(TRACE_ID_VAR, trace_id);
        }
        Self::from_parts(env, headers)
    }

    /// Deadline as a point in time.
    pub fn deadline(&self) -> Option<SystemTime> {
        self.deadline_ms
            .map(|ms| UNIX_EPOCH + Duration::from_millis(ms))
    }

    /// Time left before the platform deadline, zero once it has passed.
    pub fn remaining_time(&self) -> Option<Duration> {
        let deadline = self.deadline()?;
        Some(
            deadline
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
        )
    }
}
