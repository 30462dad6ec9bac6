//! Runtime API invocation types.

use bytes::Bytes;
use http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Runtime API version prefix.
pub const API_VERSION: &str = "2018-06-01";

pub const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";
pub const FUNCTION_ARN_HEADER: &str = "Lambda-Runtime-Invoked-Function-Arn";
pub const DEADLINE_HEADER: &str = "Lambda-Runtime-Deadline-Ms";
pub const TRACE_ID_HEADER: &str = "Lambda-Runtime-Trace-Id";
pub const CLIENT_CONTEXT_HEADER: &str = "Lambda-Runtime-Client-Context";
pub const COGNITO_IDENTITY_HEADER: &str = "Lambda-Runtime-Cognito-Identity";

/// Path of the "next invocation" endpoint.
pub fn next_path() -> String {
    format!("/{API_VERSION}/runtime/invocation/next")
}

/// Path of the success report endpoint for a request.
pub fn response_path(request_id: &str) -> String {
    format!("/{API_VERSION}/runtime/invocation/{request_id}/response")
}

/// Path of the error report endpoint for a request.
pub fn error_path(request_id: &str) -> String {
    format!("/{API_VERSION}/runtime/invocation/{request_id}/error")
}

/// One event delivered by the Runtime API.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Event payload.
    pub body: Bytes,
    /// Response headers of the fetch call.
    pub headers: HeaderMap,
}

impl Invocation {
    /// Create an invocation from a payload and headers.
    pub fn new(body: impl Into<Bytes>, headers: HeaderMap) -> Self {
        Self {
            body: body.into(),
            headers,
        }
    }

    /// Get a header as a string. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_str(&self.headers, name)
    }

    /// The request id, if the platform sent one.
    pub fn request_id(&self) -> Option<&str> {
        self.header(REQUEST_ID_HEADER)
    }
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Body of an error report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationError {
    pub error_message: String,
}

impl InvocationError {
    /// Create an error report from anything displayable.
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            error_message: error.to_string(),
        }
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Bytes {
        // A struct with a single string field cannot fail to serialize.
        serde_json::to_vec(self)
            .map(Bytes::from)
            .unwrap_or_else(|_| Bytes::from_static(br#"{"errorMessage":""}"#))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(next_path(), "/2018-06-01/runtime/invocation/next");
        assert_eq!(
            response_path("req-1"),
            "/2018-06-01/runtime/invocation/req-1/response"
        );
        assert_eq!(
            error_path("req-1"),
            "/2018-06-01/runtime/invocation/req-1/error"
        );
    }

    #[test]
    fn test_invocation_error_wire_format() {
        let body = InvocationError::new("boom").to_json();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::json!({ "errorMessage": "boom" }));
    }

    #[test]
    fn test_request_id_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "lambda-runtime-aws-request-id",
            HeaderValue::from_static("req-9"),
        );
        let invocation = Invocation::new("{}", headers);
        assert_eq!(invocation.request_id(), Some("req-9"));
    }
}
