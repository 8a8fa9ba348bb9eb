use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::types::{Entry, StoreError};

/// 服务表的存储后端
///
/// 所有方法都必须支持并发调用。`insert` 与 `touch` 对同一个键是原子的；
/// 返回 `StoreError::Unavailable` 时不得留下部分修改。
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// 当前所有条目的快照
    async fn list_all(&self) -> Result<Vec<Entry>, StoreError>;

    /// 删除并返回所有 `now - last_seen > timeout` 的条目
    async fn prune(&self, now: SystemTime, timeout: Duration) -> Result<Vec<Entry>, StoreError>;

    /// 键已存在时返回 `AlreadyExists`
    async fn insert(&self, candidate: Entry) -> Result<Entry, StoreError>;

    /// 刷新 `last_seen`，键不存在时返回 `NotFound`
    async fn touch(&self, uuid: &str, now: SystemTime) -> Result<Entry, StoreError>;
}

// 内存存储（uuid -> 条目）
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn prune(&self, now: SystemTime, timeout: Duration) -> Result<Vec<Entry>, StoreError> {
        let mut removed = Vec::new();
        self.entries.retain(|_, entry| {
            if entry.is_expired(now, timeout) {
                removed.push(entry.clone());
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn insert(&self, candidate: Entry) -> Result<Entry, StoreError> {
        // entry() 持有分片写锁，检查与插入是同一步
        match self.entries.entry(candidate.uuid.clone()) {
            MapEntry::Occupied(occupied) => Err(StoreError::AlreadyExists(occupied.key().clone())),
            MapEntry::Vacant(vacant) => Ok(vacant.insert(candidate).value().clone()),
        }
    }

    async fn touch(&self, uuid: &str, now: SystemTime) -> Result<Entry, StoreError> {
        let mut entry = self
            .entries
            .get_mut(uuid)
            .ok_or_else(|| StoreError::NotFound(uuid.to_string()))?;
        // last_seen 只增不减
        if now > entry.last_seen {
            entry.last_seen = now;
        }
        Ok(entry.value().clone())
    }
}
