//! 健康检测模块
//!
//! 提供探针定义、重试策略、探针注册表和轮次调度功能

pub mod build;
pub mod deploy;
pub mod probe;
pub mod registry;
pub mod result;
pub mod retry;
pub mod scheduler;

// 重新导出主要类型
pub use build::{BuildProbe, BUILD_PROBE_NAME};
pub use deploy::{DeployProbe, DEPLOY_PROBE_NAME};
pub use probe::{execute_guarded, Probe};
pub use registry::ProbeRegistry;
pub use result::{HealthRecord, HealthStatus, Outcome};
pub use retry::{retry, Attempt, RetryError, RetryPolicy, RetrySession};
pub use scheduler::{ProbeReport, RoundScheduler, RoundSummary};
