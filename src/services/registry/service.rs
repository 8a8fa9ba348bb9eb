use std::net::IpAddr;
use std::sync::Arc;

use super::clock::Clock;
use super::signature::SignatureValidator;
use super::store::RegistryStore;
use super::types::{
    Entry, HeartbeatError, HeartbeatRequest, ListError, RegisterError, RegisterRequest,
    RegistrySettings, StoreError, Success,
};

// 注册中心服务：每个操作开始前先清理过期条目
#[derive(Clone)]
pub struct RegistryService {
    store: Arc<dyn RegistryStore>,
    clock: Arc<dyn Clock>,
    validator: SignatureValidator,
    settings: RegistrySettings,
}

impl std::fmt::Debug for RegistryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryService")
            .field("timeout", &self.settings.timeout)
            .field("require_signature", &self.settings.require_signature)
            .finish_non_exhaustive()
    }
}

impl RegistryService {
    pub fn new(
        store: Arc<dyn RegistryStore>,
        clock: Arc<dyn Clock>,
        settings: RegistrySettings,
    ) -> Self {
        Self {
            store,
            clock,
            validator: SignatureValidator::new(settings.secret.clone()),
            settings,
        }
    }

    // 清理过期的服务
    pub async fn prune(&self) -> Result<Vec<Entry>, StoreError> {
        let now = self.clock.now();
        let removed = self.store.prune(now, self.settings.timeout).await?;

        for entry in &removed {
            tracing::warn!(
                uuid = %entry.uuid,
                name = %entry.name,
                timeout_secs = self.settings.timeout.as_secs(),
                "Server expired due to heartbeat timeout, removed from registry"
            );
        }
        if !removed.is_empty() {
            tracing::info!(expired_count = removed.len(), "Pruned expired servers");
        }

        Ok(removed)
    }

    // 获取所有存活的服务
    pub async fn list(&self) -> Result<Vec<Entry>, ListError> {
        self.prune().await?;
        let entries = self.store.list_all().await?;
        tracing::debug!(count = entries.len(), "Listed registered servers");
        Ok(entries)
    }

    // 注册新服务，地址取自来源连接
    pub async fn register(
        &self,
        request: RegisterRequest,
        source: IpAddr,
    ) -> Result<Success, RegisterError> {
        self.prune().await.map_err(register_storage_error)?;

        let missing = request.missing_fields();
        // 请求体中的 address 不参与校验也不存储
        let (Some(uuid), Some(name), Some(port)) = (request.uuid, request.name, request.port) else {
            tracing::debug!(missing = ?missing, "Register request missing fields");
            return Err(RegisterError::MissingFields { missing });
        };

        if !self.signature_accepted(Some(uuid.as_str()), request.signature.as_deref()) {
            tracing::warn!(source = %source, "Rejected register request with bad signature");
            return Err(RegisterError::BadSignature);
        }

        let candidate = Entry {
            uuid,
            name,
            address: source,
            port,
            last_seen: self.clock.now(),
        };

        match self.store.insert(candidate).await {
            Ok(entry) => {
                tracing::info!(
                    uuid = %entry.uuid,
                    name = %entry.name,
                    address = %entry.address,
                    port = entry.port,
                    "Registered new server"
                );
                Ok(Success::REGISTERED)
            }
            Err(StoreError::AlreadyExists(uuid)) => {
                tracing::info!(uuid = %uuid, "Rejected duplicate registration");
                Err(RegisterError::DuplicateKey(uuid))
            }
            Err(e) => Err(register_storage_error(e)),
        }
    }

    // 刷新心跳
    pub async fn heartbeat(&self, request: HeartbeatRequest) -> Result<Success, HeartbeatError> {
        self.prune().await.map_err(heartbeat_storage_error)?;

        if !self.signature_accepted(request.uuid.as_deref(), request.signature.as_deref()) {
            tracing::warn!(uuid = ?request.uuid, "Rejected heartbeat with bad signature");
            return Err(HeartbeatError::BadSignature);
        }

        let Some(uuid) = request.uuid else {
            return Err(HeartbeatError::UnknownServer(None));
        };

        match self.store.touch(&uuid, self.clock.now()).await {
            Ok(entry) => {
                tracing::debug!(uuid = %entry.uuid, name = %entry.name, "Accepted heartbeat");
                Ok(Success::HEARTBEAT_ACCEPTED)
            }
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(uuid = %uuid, "Heartbeat for unknown server");
                Err(HeartbeatError::UnknownServer(Some(uuid)))
            }
            Err(e) => Err(heartbeat_storage_error(e)),
        }
    }

    fn signature_accepted(&self, identity: Option<&str>, signature: Option<&str>) -> bool {
        !self.settings.require_signature || self.validator.verify(identity, signature)
    }
}

fn register_storage_error(err: StoreError) -> RegisterError {
    tracing::error!(error = %err, "Storage failure during register");
    RegisterError::StorageUnavailable(err.into_detail())
}

fn heartbeat_storage_error(err: StoreError) -> HeartbeatError {
    tracing::error!(error = %err, "Storage failure during heartbeat");
    HeartbeatError::StorageUnavailable(err.into_detail())
}
