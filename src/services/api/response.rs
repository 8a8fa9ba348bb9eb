use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::net::IpAddr;
use std::time::UNIX_EPOCH;

use crate::services::registry::{Entry, HeartbeatError, ListError, RegisterError, Success};

// 统一响应体 {"status": ..., "message": ...}
#[derive(Debug, Clone, Serialize)]
pub struct StatusMessage {
    pub status: &'static str,
    pub message: String,
}

pub fn success(message: impl Into<String>) -> Json<StatusMessage> {
    Json(StatusMessage {
        status: "success",
        message: message.into(),
    })
}

pub fn error(message: impl Into<String>) -> Json<StatusMessage> {
    Json(StatusMessage {
        status: "error",
        message: message.into(),
    })
}

// 列表中对外暴露的字段
#[derive(Debug, Clone, Serialize)]
pub struct ServerView {
    pub uuid: String,
    pub name: String,
    pub address: IpAddr,
    pub port: u16,
    /// Last heartbeat as UNIX seconds.
    pub timestamp: u64,
}

impl From<Entry> for ServerView {
    fn from(entry: Entry) -> Self {
        Self {
            timestamp: entry
                .last_seen
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            uuid: entry.uuid,
            name: entry.name,
            address: entry.address,
            port: entry.port,
        }
    }
}

impl IntoResponse for Success {
    fn into_response(self) -> Response {
        success(self.message).into_response()
    }
}

// 签名失败只返回空的 400，不透露原因
fn bad_signature() -> Response {
    StatusCode::BAD_REQUEST.into_response()
}

fn storage_unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        error("Storage unavailable."),
    )
        .into_response()
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        match self {
            RegisterError::BadSignature => bad_signature(),
            RegisterError::StorageUnavailable(_) => storage_unavailable(),
            RegisterError::MissingFields { .. } | RegisterError::DuplicateKey(_) => {
                error(self.to_string()).into_response()
            }
        }
    }
}

impl IntoResponse for HeartbeatError {
    fn into_response(self) -> Response {
        match self {
            HeartbeatError::BadSignature => bad_signature(),
            HeartbeatError::StorageUnavailable(_) => storage_unavailable(),
            HeartbeatError::UnknownServer(_) => error(self.to_string()).into_response(),
        }
    }
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        match self {
            ListError::StorageUnavailable(_) => storage_unavailable(),
        }
    }
}
