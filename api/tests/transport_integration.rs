//! Integration tests for the RPC transport shim.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use acme_api::{trpc_router, InMemoryPostRepository, TransportState};
use acme_auth::mocks::MockSessionStore;
use acme_auth::{Session, SessionUser, UserId};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::io;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

fn app_at(mount: &str, sessions: MockSessionStore) -> Router {
    let state = TransportState::new(Arc::new(InMemoryPostRepository::new()), Arc::new(sessions));
    Router::new().nest(mount, trpc_router(Arc::new(state)))
}

fn app(sessions: MockSessionStore) -> Router {
    app_at("/api/trpc", sessions)
}

fn signed_in_sessions() -> MockSessionStore {
    let sessions = MockSessionStore::new();
    sessions
        .insert(
            "tok",
            Session {
                user: SessionUser {
                    id: UserId("user-1".into()),
                    name: Some("Ada".into()),
                    email: None,
                    image: None,
                },
                expires: Utc::now() + Duration::days(30),
            },
        )
        .unwrap();
    sessions
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-trpc-source", "expo-react")
        .header(header::AUTHORIZATION, "Bearer tok");
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log sink shared with a `fmt` subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}

#[tokio::test]
async fn test_preflight_is_fixed() {
    for uri in ["/api/trpc", "/api/trpc/post.all", "/api/trpc/does.not.exist"] {
        let response = app(MockSessionStore::new())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri(uri)
                    .header(header::ORIGIN, "http://localhost:8081")
                    .body(Body::from("ignored"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT, "{uri}");
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-request-method"], "*");
        assert_eq!(headers["access-control-allow-methods"], "OPTIONS, GET, POST");
        assert_eq!(headers["access-control-allow-headers"], "*");
    }
}

#[tokio::test]
async fn test_query_success_allows_any_origin() {
    let response = app(MockSessionStore::new())
        .oneshot(request(Method::GET, "/api/trpc/post.all", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(json_body(response).await, json!({ "result": { "data": [] } }));
}

#[tokio::test]
async fn test_procedure_error_keeps_router_status_and_is_logged() {
    let (logs, _guard) = capture_logs();

    let response = app(MockSessionStore::new())
        .oneshot(request(Method::GET, "/api/trpc/auth.getSecretMessage", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["path"], "auth.getSecretMessage");

    let logs = logs.contents();
    assert!(logs.contains("tRPC Error on 'auth.getSecretMessage'"), "{logs}");
    assert!(logs.contains("Handled"), "{logs}");
}

#[tokio::test]
async fn test_mutation_with_bearer_session() {
    let app = app(signed_in_sessions());

    let created = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/trpc/post.create",
            Some(json!({ "title": "Hello", "content": "World" })),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let created = json_body(created).await;
    assert_eq!(created["result"]["data"]["title"], "Hello");

    let all = app
        .oneshot(request(Method::GET, "/api/trpc/post.all", None))
        .await
        .unwrap();
    let all = json_body(all).await;
    assert_eq!(all["result"]["data"][0], created["result"]["data"]);
}

#[tokio::test]
async fn test_query_input_and_parse_error() {
    let app = app(MockSessionStore::new());

    let found = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/trpc/post.byId?input=%7B%22id%22%3A%22missing%22%7D",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    assert_eq!(json_body(found).await, json!({ "result": { "data": null } }));

    let broken = app
        .oneshot(request(Method::GET, "/api/trpc/post.byId?input=%7Bnope", None))
        .await
        .unwrap();
    assert_eq!(broken.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(broken).await["error"]["code"], "PARSE_ERROR");
}

#[tokio::test]
async fn test_wrong_method_and_unknown_procedure() {
    let app = app(signed_in_sessions());

    let wrong = app
        .clone()
        .oneshot(request(Method::POST, "/api/trpc/post.all", Some(json!(null))))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(wrong).await["error"]["code"], "METHOD_NOT_SUPPORTED");

    let unknown = app
        .oneshot(request(Method::GET, "/api/trpc/post.nope", None))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_batch_query() {
    let response = app(signed_in_sessions())
        .oneshot(request(
            Method::GET,
            "/api/trpc/auth.getSession,auth.getSecretMessage?batch=1&input=%7B%7D",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["result"]["data"]["user"]["id"], "user-1");
    assert_eq!(body[1]["result"]["data"], "you can see this secret message!");
}

#[tokio::test]
async fn test_sign_out_mutation() {
    let sessions = signed_in_sessions();
    let response = app(sessions.clone())
        .oneshot(request(Method::POST, "/api/trpc/auth.signOut", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "result": { "data": { "success": true } } })
    );
    assert!(sessions.was_invalidated("tok").unwrap());
}

#[tokio::test]
async fn test_adapter_failure_is_logged_and_rethrown() {
    let (logs, _guard) = capture_logs();

    // Mounted somewhere the adapter does not expect.
    let response = app_at("/rpc", MockSessionStore::new())
        .oneshot(request(Method::GET, "/rpc/post.all", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get("access-control-allow-origin").is_none());

    let logs = logs.contents();
    assert!(logs.contains("tRPC Error on 'undefined'"), "{logs}");
    assert!(logs.contains("Rethrown"), "{logs}");
}
