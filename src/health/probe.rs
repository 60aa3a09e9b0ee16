//! 探针接口
//!
//! 探针是一次针对下游服务的合成检测，名称即持久化主键。

use crate::error::ProbeError;
use crate::health::result::Outcome;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{error, warn};

/// 探针trait
#[async_trait]
pub trait Probe: Send + Sync {
    /// 探针名称
    fn name(&self) -> &str;

    /// 执行一次检测
    ///
    /// 预期内的失败应返回 `Ok(Outcome::Fail)`；`Err` 表示意外错误，
    /// 由执行框架折算为 `Fail`。
    async fn execute(&self) -> Result<Outcome, ProbeError>;
}

/// 执行探针，错误和panic都折算为 `Fail`
pub async fn execute_guarded(probe: &dyn Probe) -> Outcome {
    match AssertUnwindSafe(probe.execute()).catch_unwind().await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            warn!(probe = probe.name(), "探针执行出错，记为失败: {}", e);
            Outcome::Fail
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(probe = probe.name(), "探针执行panic，记为失败: {}", message);
            Outcome::Fail
        }
    }
}
