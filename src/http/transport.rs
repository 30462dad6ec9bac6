//! Runtime API transport.

use crate::error::TransportError;
use crate::http::invocation::{self, Invocation};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

/// The three Runtime API calls the invocation loop makes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Wait for the next invocation.
    async fn next_invocation(&self) -> Result<Invocation, TransportError>;

    /// Report a successful result.
    async fn send_response(&self, request_id: &str, body: Bytes) -> Result<(), TransportError>;

    /// Report a failed invocation. `body` is an encoded
    /// [`InvocationError`](crate::http::InvocationError).
    async fn send_error(&self, request_id: &str, body: Bytes) -> Result<(), TransportError>;
}

/// HTTP transport backed by hyper's pooled client.
#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpTransport {
    /// Create a transport for a base URL such as `http://127.0.0.1:9001`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Response<Bytes>, TransportError> {
        let uri = format!("{}{}", self.base_url, path);

        let mut builder = Request::builder().method(method.clone()).uri(&uri);
        if let Some(content_type) = content_type {
            builder = builder.header(hyper::header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Full::new(body))?;

        debug!("{} {}", method, uri);
        let response = self.client.request(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { uri, status });
        }

        let (parts, incoming) = response.into_parts();
        let body = incoming.collect().await?.to_bytes();
        Ok(Response::from_parts(parts, body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn next_invocation(&self) -> Result<Invocation, TransportError> {
        let response = self
            .send(Method::GET, &invocation::next_path(), None, Bytes::new())
            .await?;
        let (parts, body) = response.into_parts();
        Ok(Invocation::new(body, parts.headers))
    }

    async fn send_response(&self, request_id: &str, body: Bytes) -> Result<(), TransportError> {
        self.send(
            Method::POST,
            &invocation::response_path(request_id),
            None,
            body,
        )
        .await
        .map(|_| ())
    }

    async fn send_error(&self, request_id: &str, body: Bytes) -> Result<(), TransportError> {
        self.send(
            Method::POST,
            &invocation::error_path(request_id),
            Some("application/json"),
            body,
        )
        .await
        .map(|_| ())
    }
}
