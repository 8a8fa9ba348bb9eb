use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::Router;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use mserver::services::api;
use mserver::services::registry::{
    ManualClock, MemoryStore, RegistryService, RegistrySettings, SignatureValidator,
};

const SECRET: &str = "s3cret";

fn peer() -> SocketAddr {
    SocketAddr::from(([203, 0, 113, 7], 40000))
}

fn app_with_clock(require_signature: bool) -> (Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
    ));
    let service = RegistryService::new(
        Arc::new(MemoryStore::new()),
        clock.clone(),
        RegistrySettings {
            secret: SECRET.as_bytes().to_vec(),
            timeout: Duration::from_secs(30),
            require_signature,
        },
    );
    let app = api::router(service).layer(MockConnectInfo(peer()));
    (app, clock)
}

fn app() -> Router {
    app_with_clock(true).0
}

fn sign(identity: &str) -> String {
    SignatureValidator::new(SECRET).sign(identity).unwrap()
}

fn json_request(method: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn register_body(uuid: &str) -> Value {
    json!({
        "uuid": uuid,
        "name": "worker",
        "address": "1.2.3.4",
        "port": 8080,
        "signature": sign(uuid),
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn list(app: &Router) -> Vec<Value> {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, json) = send_json(app, request).await;
    assert_eq!(status, StatusCode::OK);
    json.as_array().unwrap().clone()
}

#[tokio::test]
async fn test_register_and_list() {
    let app = app();

    let (status, json) = send_json(&app, json_request("POST", register_body("node-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"status": "success", "message": "Registered new server."})
    );

    let servers = list(&app).await;
    assert_eq!(servers.len(), 1);
    assert_eq!(
        servers[0],
        json!({
            "uuid": "node-1",
            "name": "worker",
            "address": "203.0.113.7",
            "port": 8080,
            "timestamp": 1_700_000_000u64,
        })
    );
}

#[tokio::test]
async fn test_register_duplicate_is_domain_error() {
    let app = app();
    send(&app, json_request("POST", register_body("node-1"))).await;

    let (status, json) = send_json(&app, json_request("POST", register_body("node-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "Server with that uuid already exists.");
}

#[tokio::test]
async fn test_register_missing_port() {
    let app = app();
    let mut body = register_body("node-1");
    body.as_object_mut().unwrap().remove("port");

    let (status, json) = send_json(&app, json_request("POST", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "error");
    let message = json["message"].as_str().unwrap();
    assert!(message.starts_with("Must include all fields: uuid, name, port"));
    assert!(message.ends_with("(missing: port)"));
}

#[tokio::test]
async fn test_register_without_address_uses_peer() {
    let app = app();
    let mut body = register_body("node-1");
    body.as_object_mut().unwrap().remove("address");

    let (status, json) = send_json(&app, json_request("POST", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");

    let servers = list(&app).await;
    assert_eq!(servers[0]["address"], "203.0.113.7");
}

#[tokio::test]
async fn test_bad_signature_is_generic_bad_request() {
    let app = app();
    let mut body = register_body("node-1");
    body["signature"] = json!(sign("node-2"));

    let (status, bytes) = send(&app, json_request("POST", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(bytes.is_empty());
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn test_non_json_content_type_rejected() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("uuid=node-1"))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn test_unparsable_json_rejected() {
    let app = app();
    let request = Request::builder()
        .method("PUT")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(bytes, b"Invalid JSON.".to_vec());
}

#[tokio::test]
async fn test_heartbeat_flow() {
    let (app, clock) = app_with_clock(true);
    send(&app, json_request("POST", register_body("node-1"))).await;

    clock.advance(Duration::from_secs(25));
    let heartbeat = json!({"uuid": "node-1", "signature": sign("node-1")});
    let (status, json) = send_json(&app, json_request("PUT", heartbeat)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"status": "success", "message": "Accepted heartbeat for server."})
    );

    clock.advance(Duration::from_secs(25));
    let servers = list(&app).await;
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0]["timestamp"], 1_700_000_025u64);

    clock.advance(Duration::from_secs(10));
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn test_heartbeat_unknown_server() {
    let app = app();
    let heartbeat = json!({"uuid": "ghost", "signature": sign("ghost")});

    let (status, json) = send_json(&app, json_request("PUT", heartbeat)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"status": "error", "message": "That server doesn't exist."})
    );
}

#[tokio::test]
async fn test_unsigned_mode_accepts_missing_signature() {
    let (app, _) = app_with_clock(false);
    let body = json!({"uuid": "node-1", "name": "w", "address": "x", "port": 1});

    let (status, json) = send_json(&app, json_request("POST", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
}

#[tokio::test]
async fn test_unsupported_method_lists_allowed() {
    let app = app();
    let request = Request::builder()
        .method("DELETE")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = response
        .headers()
        .get(header::ALLOW)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    for method in ["GET", "POST", "PUT"] {
        assert!(allow.contains(method), "{allow} should contain {method}");
    }
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let request = Request::builder()
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();

    let (status, json) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "ok"}));
}
