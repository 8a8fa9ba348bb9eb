use axum::Json;
use axum::extract::{ConnectInfo, State};
use serde_json::{Value, json};
use std::net::SocketAddr;

use super::extractor::JsonBody;
use super::response::ServerView;
use crate::services::registry::{
    HeartbeatError, HeartbeatRequest, ListError, RegisterError, RegisterRequest, RegistryService,
    Success,
};

pub async fn list_servers(
    State(service): State<RegistryService>,
) -> Result<Json<Vec<ServerView>>, ListError> {
    let entries = service.list().await?;
    Ok(Json(entries.into_iter().map(ServerView::from).collect()))
}

pub async fn register_server(
    State(service): State<RegistryService>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Success, RegisterError> {
    // 双栈监听时把 ::ffff:a.b.c.d 还原为 IPv4
    service.register(request, peer.ip().to_canonical()).await
}

pub async fn heartbeat_server(
    State(service): State<RegistryService>,
    JsonBody(request): JsonBody<HeartbeatRequest>,
) -> Result<Success, HeartbeatError> {
    service.heartbeat(request).await
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
