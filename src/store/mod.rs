//! 状态存储模块
//!
//! 每个探针名对应一条健康记录，写入为按名称的插入或替换。
//! 存储通过连接器获取，以便每一轮检测都能感知“无法获取连接”。

pub mod file;
pub mod memory;

use crate::config::{StoreConfig, StoreKind};
use crate::error::StoreError;
use crate::health::result::HealthRecord;
use async_trait::async_trait;
use std::sync::Arc;

pub use file::{FileStore, FileStoreConnector};
pub use memory::MemoryStore;

/// 健康记录存储
///
/// 不同名称的并发写入无需调用方加锁。
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// 插入或替换 `record.name` 对应的记录
    async fn upsert(&self, record: &HealthRecord) -> Result<(), StoreError>;

    /// 读取全部记录，按名称排序
    async fn query_all(&self) -> Result<Vec<HealthRecord>, StoreError>;
}

/// 存储连接器
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// 获取一个可用的存储
    async fn connect(&self) -> Result<Arc<dyn StatusStore>, StoreError>;
}

/// 按配置创建连接器
pub fn connector_from_config(config: &StoreConfig) -> Arc<dyn StoreConnector> {
    match config.kind {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::File => Arc::new(FileStoreConnector::new(config.resolved_path())),
    }
}
