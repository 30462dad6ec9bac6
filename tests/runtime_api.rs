//! End-to-end tests against a fake Runtime API served by hyper.

use bytes::Bytes;
use hatch::error::TransportError;
use hatch::prelude::*;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const NEXT_PATH: &str = "/2018-06-01/runtime/invocation/next";

struct Event {
    request_id: &'static str,
    body: &'static str,
    trace_id: Option<&'static str>,
}

#[derive(Debug, Clone)]
struct Post {
    path: String,
    content_type: Option<String>,
    body: Value,
}

/// Serves queued events on `next` and records every POST. Once the queue is
/// empty `next` answers 500, which ends the runtime loop.
#[derive(Default)]
struct FakeApi {
    events: Mutex<VecDeque<Event>>,
    posts: Mutex<Vec<Post>>,
}

impl FakeApi {
    fn with_events(events: Vec<Event>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(events.into()),
            posts: Mutex::new(Vec::new()),
        })
    }

    fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }
}

async fn serve(api: Arc<FakeApi>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let io = TokioIo::new(stream);
            let api = api.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let api = api.clone();
                    async move { handle(req, api).await }
                });
                let _ = http1::Builder::new().serve_connection(io, service).await;
            });
        }
    });

    addr
}

async fn handle(
    req: Request<Incoming>,
    api: Arc<FakeApi>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if method == Method::GET && path == NEXT_PATH {
        let next = api.events.lock().unwrap().pop_front();
        let response = match next {
            Some(event) => {
                let mut builder = Response::builder()
                    .status(StatusCode::OK)
                    .header("Lambda-Runtime-Aws-Request-Id", event.request_id)
                    .header(
                        "Lambda-Runtime-Invoked-Function-Arn",
                        "arn:aws:lambda:us-east-1:123456789012:function:demo",
                    )
                    .header("Lambda-Runtime-Deadline-Ms", "4102444800000");
                if let Some(trace_id) = event.trace_id {
                    builder = builder.header("Lambda-Runtime-Trace-Id", trace_id);
                }
                builder.body(Full::new(Bytes::from_static(event.body.as_bytes())))
            }
            None => Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::new())),
        };
        return Ok(response.unwrap());
    }

    let content_type = req
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = req.collect().await?.to_bytes();
    api.posts.lock().unwrap().push(Post {
        path,
        content_type,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    Ok(Response::builder()
        .status(StatusCode::ACCEPTED)
        .body(Full::new(Bytes::new()))
        .unwrap())
}

#[derive(Debug, Deserialize)]
struct Order {
    id: u32,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct Receipt {
    id: u32,
    total: u32,
}

fn runtime_for(addr: SocketAddr, env: Arc<MemoryEnv>) -> Runtime {
    let config = RuntimeConfig::new(addr.to_string(), "orders.checkout").unwrap();
    let transport = Arc::new(HttpTransport::new(config.base_url()));
    Runtime::with_parts(config, transport, env)
}

#[tokio::test]
async fn test_loop_reports_success_and_error() {
    let api = FakeApi::with_events(vec![
        Event {
            request_id: "req-1",
            body: r#"{"id": 1, "quantity": 4}"#,
            trace_id: Some("Root=1-abc"),
        },
        Event {
            request_id: "req-2",
            body: r#"{"id": 2, "quantity": 0}"#,
            trace_id: None,
        },
    ]);
    let addr = serve(api.clone()).await;

    let env = Arc::new(MemoryEnv::new());
    let mut runtime = runtime_for(addr, env.clone());
    runtime.register_typed_async("checkout", |order: Order, _ctx, completion: Completion<Receipt>| {
        std::thread::spawn(move || {
            if order.quantity == 0 {
                completion.fail("quantity must be positive");
            } else {
                completion.succeed(Receipt {
                    id: order.id,
                    total: order.quantity * 25,
                });
            }
        });
    });

    let result = runtime.start().await;

    assert!(matches!(
        result,
        Err(RuntimeError::Transport(TransportError::Status { status, .. }))
            if status == StatusCode::INTERNAL_SERVER_ERROR
    ));
    assert_eq!(runtime.invocation_count(), 2);

    let posts = api.posts();
    assert_eq!(posts.len(), 2);

    assert_eq!(posts[0].path, "/2018-06-01/runtime/invocation/req-1/response");
    assert_eq!(posts[0].body, json!({ "id": 1, "total": 100 }));

    assert_eq!(posts[1].path, "/2018-06-01/runtime/invocation/req-2/error");
    assert_eq!(posts[1].content_type.as_deref(), Some("application/json"));
    assert_eq!(
        posts[1].body,
        json!({ "errorMessage": "quantity must be positive" })
    );

    assert_eq!(env.get("_X_AMZN_TRACE_ID").as_deref(), Some("Root=1-abc"));
}

#[tokio::test]
async fn test_transport_returns_body_and_headers() {
    let api = FakeApi::with_events(vec![Event {
        request_id: "req-9",
        body: r#"{"hello": "world"}"#,
        trace_id: Some("Root=1-def"),
    }]);
    let addr = serve(api).await;
    let transport = HttpTransport::new(format!("http://{addr}"));

    let invocation = transport.next_invocation().await.unwrap();

    assert_eq!(invocation.request_id(), Some("req-9"));
    assert_eq!(invocation.header("lambda-runtime-trace-id"), Some("Root=1-def"));
    assert_eq!(invocation.body, Bytes::from_static(br#"{"hello": "world"}"#));

    let context = Context::build(&MemoryEnv::new(), &invocation.headers).unwrap();
    assert_eq!(context.deadline_ms, Some(4_102_444_800_000));
    assert!(context.remaining_time().is_some());
}

#[tokio::test]
async fn test_unreachable_api_is_fatal() {
    // Reserve a port, then close it so nothing is listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut runtime = runtime_for(addr, Arc::new(MemoryEnv::new()));
    runtime.register_json("checkout", |event, _| Ok(event));

    let result = runtime.start().await;

    assert!(matches!(
        result,
        Err(RuntimeError::Transport(TransportError::Request(_)))
    ));
    assert_eq!(runtime.invocation_count(), 0);
}
