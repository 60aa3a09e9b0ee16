//! JSON文件存储
//!
//! 文件内容是 `health` 集合：`{"health": [{name, status, timestamp}, ...]}`。
//! 写入先落到临时文件再原子替换，读取无需加锁。

use super::{StatusStore, StoreConnector};
use crate::error::StoreError;
use crate::health::result::HealthRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// 文件中的集合结构
#[derive(Debug, Default, Serialize, Deserialize)]
struct HealthCollection {
    #[serde(default)]
    health: Vec<HealthRecord>,
}

/// 基于JSON文件的健康记录存储
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// 串行化读改写
    write_lock: Mutex<()>,
}

impl FileStore {
    /// 创建文件存储，文件不存在时视为空集合
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// 存储文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_collection(&self) -> Result<HealthCollection, String> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HealthCollection::default()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| format!("解析 {} 失败: {}", self.path.display(), e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HealthCollection::default()),
            Err(e) => Err(format!("读取 {} 失败: {}", self.path.display(), e)),
        }
    }

    async fn write_collection(&self, collection: &HealthCollection) -> Result<(), String> {
        let data = serde_json::to_vec_pretty(collection).map_err(|e| e.to_string())?;
        let tmp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, data)
            .await
            .map_err(|e| format!("写入 {} 失败: {}", tmp_path.display(), e))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                warn!("清理临时文件 {} 失败: {}", tmp_path.display(), cleanup);
            }
            return Err(format!("替换 {} 失败: {}", self.path.display(), e));
        }
        Ok(())
    }

    /// 检查存储是否可用：目录可创建，已有文件可解析
    async fn probe_access(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Connect(format!("创建目录 {} 失败: {}", parent.display(), e))
            })?;
        }
        self.read_collection()
            .await
            .map(|_| ())
            .map_err(StoreError::Connect)
    }
}

#[async_trait]
impl StatusStore for FileStore {
    async fn upsert(&self, record: &HealthRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let write_error = |reason: String| StoreError::Write {
            name: record.name.clone(),
            reason,
        };

        let mut collection = self.read_collection().await.map_err(write_error)?;
        match collection.health.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record.clone(),
            None => collection.health.push(record.clone()),
        }
        collection.health.sort_by(|a, b| a.name.cmp(&b.name));

        self.write_collection(&collection).await.map_err(write_error)?;
        debug!("健康记录已写入 {}: {}", self.path.display(), record.name);
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<HealthRecord>, StoreError> {
        let mut collection = self.read_collection().await.map_err(StoreError::Query)?;
        collection.health.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(collection.health)
    }
}

/// 文件存储连接器，每次连接都会重新检查文件可用性
#[derive(Debug, Clone)]
pub struct FileStoreConnector {
    store: Arc<FileStore>,
}

impl FileStoreConnector {
    /// 创建连接器
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: Arc::new(FileStore::new(path)),
        }
    }
}

#[async_trait]
impl StoreConnector for FileStoreConnector {
    async fn connect(&self) -> Result<Arc<dyn StatusStore>, StoreError> {
        self.store.probe_access().await?;
        Ok(self.store.clone())
    }
}
