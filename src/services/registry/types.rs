use serde::Deserialize;
use std::net::IpAddr;
use std::time::{Duration, SystemTime};
use thiserror::Error;

// 注册必填字段
pub const REQUIRED_FIELDS: [&str; 3] = ["uuid", "name", "port"];

// 已注册的服务节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub uuid: String,
    pub name: String,
    // 始终取自传输层观察到的来源地址
    pub address: IpAddr,
    pub port: u16,
    pub last_seen: SystemTime,
}

impl Entry {
    pub fn is_expired(&self, now: SystemTime, timeout: Duration) -> bool {
        // 时钟回拨时 duration_since 失败，视为未过期
        match now.duration_since(self.last_seen) {
            Ok(elapsed) => elapsed > timeout,
            Err(_) => false,
        }
    }
}

// 注册请求体，所有字段均可缺失，由服务层校验
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub uuid: Option<String>,
    pub name: Option<String>,
    // 可选，存储时总是被来源地址覆盖
    pub address: Option<String>,
    pub port: Option<u16>,
    pub signature: Option<String>,
}

impl RegisterRequest {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [self.uuid.is_some(), self.name.is_some(), self.port.is_some()];
        REQUIRED_FIELDS
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(field, _)| *field)
            .collect()
    }
}

// 心跳请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeartbeatRequest {
    pub uuid: Option<String>,
    pub signature: Option<String>,
}

/// Settings consumed by the registry core.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Shared secret used as the HMAC key.
    pub secret: Vec<u8>,
    /// Entries whose last heartbeat is older than this are pruned.
    pub timeout: Duration,
    /// When false, mutating requests skip signature verification.
    pub require_signature: bool,
}

/// Successful outcome of a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Success {
    pub message: &'static str,
}

impl Success {
    pub const REGISTERED: Success = Success {
        message: "Registered new server.",
    };
    pub const HEARTBEAT_ACCEPTED: Success = Success {
        message: "Accepted heartbeat for server.",
    };
}

/// 存储层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// 注册错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error(
        "Must include all fields: {} (missing: {})",
        REQUIRED_FIELDS.join(", "),
        .missing.join(", ")
    )]
    MissingFields { missing: Vec<&'static str> },

    // 不对外透露失败原因
    #[error("Bad request")]
    BadSignature,

    #[error("Server with that uuid already exists.")]
    DuplicateKey(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// 心跳错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatError {
    #[error("Bad request")]
    BadSignature,

    #[error("That server doesn't exist.")]
    UnknownServer(Option<String>),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl StoreError {
    // 去掉 Unavailable 的前缀，避免重复
    pub fn into_detail(self) -> String {
        match self {
            StoreError::Unavailable(detail) => detail,
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for ListError {
    fn from(err: StoreError) -> Self {
        ListError::StorageUnavailable(err.into_detail())
    }
}
