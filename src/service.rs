//! 服务生命周期模块
//!
//! 宿主按 `start` → 提供路由 → `stop` 的顺序驱动模块。
//! `HealthCheckerModule` 在启动时连接状态存储并拉起检测循环，
//! 同时对外提供状态查询。

use crate::config::Config;
use crate::error::{HealthCheckerError, Result, StoreError};
use crate::health::{HealthRecord, ProbeRegistry, RoundScheduler};
use crate::store::{connector_from_config, StatusStore, StoreConnector};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 停止时等待检测循环退出的最长时间
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// 宿主可驱动的服务模块
#[async_trait]
pub trait Module: Send + Sync {
    /// 模块名称
    fn name(&self) -> &str;

    /// 启动模块，失败时宿主应放弃启动
    async fn start(&self) -> Result<()>;

    /// 停止模块
    async fn stop(&self) -> Result<()>;

    /// 模块提供的HTTP路由
    fn routes(self: Arc<Self>) -> axum::Router;
}

/// 运行期状态
struct Running {
    store: Arc<dyn StatusStore>,
    handle: JoinHandle<()>,
    shutdown_tx: broadcast::Sender<()>,
}

/// 健康检查模块
pub struct HealthCheckerModule {
    config: Arc<Config>,
    connector: Arc<dyn StoreConnector>,
    registry: Arc<ProbeRegistry>,
    running: Mutex<Option<Running>>,
}

impl HealthCheckerModule {
    /// 按配置创建模块，使用标准探针集合和配置指定的存储
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let registry = Arc::new(ProbeRegistry::standard(&config)?);
        let connector = connector_from_config(&config.store);
        Ok(Self::with_parts(config, connector, registry))
    }

    /// 使用指定的存储连接器和探针集合创建模块
    pub fn with_parts(
        config: Arc<Config>,
        connector: Arc<dyn StoreConnector>,
        registry: Arc<ProbeRegistry>,
    ) -> Self {
        Self {
            config,
            connector,
            registry,
            running: Mutex::new(None),
        }
    }

    /// 模块配置
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 是否已启动
    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// 查询全部健康记录
    pub async fn get_health_status(&self) -> std::result::Result<Vec<HealthRecord>, StoreError> {
        let store = match self.running.lock().await.as_ref() {
            Some(running) => Arc::clone(&running.store),
            None => return Err(StoreError::NotConnected),
        };
        store.query_all().await
    }

    fn scheduler(&self) -> RoundScheduler {
        RoundScheduler::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.connector),
            self.config.interval(),
        )
    }
}

#[async_trait]
impl Module for HealthCheckerModule {
    fn name(&self) -> &str {
        "health-checker"
    }

    async fn start(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            warn!("健康检查模块已在运行");
            return Ok(());
        }

        let store = self.connector.connect().await.map_err(|e| {
            error!("启动时无法连接状态存储: {}", e);
            HealthCheckerError::Store(e)
        })?;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let scheduler = self.scheduler();
        let handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

        *running = Some(Running {
            store,
            handle,
            shutdown_tx,
        });
        info!(
            "健康检查模块已启动，探针: {:?}",
            self.registry.names()
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let Some(running) = self.running.lock().await.take() else {
            return Ok(());
        };

        let _ = running.shutdown_tx.send(());
        let mut handle = running.handle;
        match tokio::time::timeout(STOP_GRACE_PERIOD, &mut handle).await {
            Ok(Ok(())) => info!("检测循环已停止"),
            Ok(Err(e)) => warn!("检测循环异常退出: {}", e),
            Err(_) => {
                warn!("检测循环未在 {:?} 内退出，强制终止", STOP_GRACE_PERIOD);
                handle.abort();
            }
        }
        Ok(())
    }

    fn routes(self: Arc<Self>) -> axum::Router {
        crate::web::handlers::status_routes(self)
    }
}
