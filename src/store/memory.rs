//! 内存存储

use super::{StatusStore, StoreConnector};
use crate::error::StoreError;
use crate::health::result::HealthRecord;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 进程内存中的健康记录表
///
/// 克隆得到的实例共享同一张表。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<BTreeMap<String, HealthRecord>>>,
}

impl MemoryStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录条数
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// 是否为空
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// 按名称读取
    pub async fn get(&self, name: &str) -> Option<HealthRecord> {
        self.records.read().await.get(name).cloned()
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn upsert(&self, record: &HealthRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(record.name.clone(), record.clone());
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<HealthRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }
}

#[async_trait]
impl StoreConnector for MemoryStore {
    async fn connect(&self) -> Result<Arc<dyn StatusStore>, StoreError> {
        Ok(Arc::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::result::HealthStatus;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_empty_store_is_not_an_error() {
        let store = MemoryStore::new();
        assert!(store.query_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_twice_keeps_second() {
        let store = MemoryStore::new();
        let first = Utc::now();
        let second = first + Duration::seconds(5);

        store
            .upsert(&HealthRecord::new("build", HealthStatus::Running, first))
            .await
            .unwrap();
        store
            .upsert(&HealthRecord::new("build", HealthStatus::Down, second))
            .await
            .unwrap();

        let records = store.query_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, HealthStatus::Down);
        assert_eq!(records[0].timestamp, second);
    }

    #[tokio::test]
    async fn test_connected_handles_share_records() {
        let store = MemoryStore::new();
        let handle = store.connect().await.unwrap();

        handle
            .upsert(&HealthRecord::completed_now(
                "deploy",
                crate::health::Outcome::Pass,
            ))
            .await
            .unwrap();

        assert_eq!(
            store.get("deploy").await.map(|r| r.status),
            Some(HealthStatus::Running)
        );
    }

    #[tokio::test]
    async fn test_concurrent_upserts_to_disjoint_names() {
        let store = MemoryStore::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let record = HealthRecord::completed_now(format!("probe-{i}"), (i % 2 == 0).into());
                store.upsert(&record).await
            }));
        }
        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        assert_eq!(store.len().await, 16);
    }
}
