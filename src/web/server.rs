//! Web服务器实现
//!
//! 承载服务模块：启动模块、挂载其路由、监听端口，收到关闭信号后
//! 停止接收请求并停止模块。

use crate::daemon::wait_for_shutdown;
use crate::error::{HealthCheckerError, Result};
use crate::service::Module;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Web服务器
pub struct WebServer<M: Module + 'static> {
    /// 监听地址
    addr: SocketAddr,
    /// 承载的模块
    module: Arc<M>,
    /// 关闭信号接收器
    shutdown_rx: Option<broadcast::Receiver<()>>,
}

impl<M: Module + 'static> WebServer<M> {
    /// 创建新的Web服务器
    pub fn new(addr: SocketAddr, module: Arc<M>, shutdown_rx: broadcast::Receiver<()>) -> Self {
        Self {
            addr,
            module,
            shutdown_rx: Some(shutdown_rx),
        }
    }

    /// 创建路由
    pub fn router(&self) -> Router {
        Arc::clone(&self.module)
            .routes()
            .layer(TraceLayer::new_for_http())
    }

    /// 启动模块并提供服务，直到收到关闭信号
    pub async fn run(&mut self) -> Result<()> {
        let shutdown_rx = self.shutdown_rx.take().ok_or_else(|| {
            HealthCheckerError::Other(anyhow::anyhow!("关闭信号接收器已被使用"))
        })?;

        self.module.start().await?;

        let listener = match TcpListener::bind(self.addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("无法监听 {}: {}", self.addr, e);
                self.module.stop().await?;
                return Err(e.into());
            }
        };
        info!("Web服务器已启动: http://{}/status", listener.local_addr()?);

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
            .await;

        self.module.stop().await?;
        info!("Web服务器已关闭，模块 {} 已停止", self.module.name());
        served.map_err(HealthCheckerError::from)
    }
}
