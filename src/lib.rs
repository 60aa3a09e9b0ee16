//! Binder Health Checker - Binder构建与部署服务健康检查代理
//!
//! 周期性地对部署服务和构建服务执行合成检测：
//! - 部署探针：创建短生命周期实例并轮询直到就绪
//! - 构建探针：查询示例镜像的构建状态
//! - 每个探针的最新结果写入状态存储，并通过 `GET /status` 对外提供
//! - 结构化日志记录

pub mod cli;
pub mod client;
pub mod config;
pub mod daemon;
pub mod error;
pub mod health;
pub mod logging;
pub mod service;
pub mod store;
pub mod web;

// 重新导出主要类型
pub use config::Config;
pub use error::HealthCheckerError;
pub use health::{HealthRecord, HealthStatus, Outcome, Probe, ProbeRegistry, RoundScheduler};
pub use service::{HealthCheckerModule, Module};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
