//! 部署探针
//!
//! 从示例模板创建一个带自动回收时间的临时实例，然后有界轮询实例状态，
//! 直到出现访问地址（通过）、查询出错或次数耗尽（失败）。

use crate::client::DeployApi;
use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::health::probe::Probe;
use crate::health::result::Outcome;
use crate::health::retry::{retry, Attempt, RetryError, RetryPolicy};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 部署探针的注册名
pub const DEPLOY_PROBE_NAME: &str = "deploy";

/// 部署探针
pub struct DeployProbe {
    api: Arc<dyn DeployApi>,
    template_name: String,
    cull_timeout: u64,
    policy: RetryPolicy,
}

impl DeployProbe {
    /// 创建部署探针
    ///
    /// # 参数
    /// * `api` - 部署服务接口
    /// * `template_name` - 示例模板名
    /// * `cull_timeout` - 实例自动回收时间
    /// * `policy` - 状态轮询策略
    pub fn new(
        api: Arc<dyn DeployApi>,
        template_name: impl Into<String>,
        cull_timeout: u64,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            api,
            template_name: template_name.into(),
            cull_timeout,
            policy,
        }
    }

    /// 按配置创建
    pub fn from_config(api: Arc<dyn DeployApi>, config: &ProbeConfig) -> Self {
        Self::new(
            api,
            config.template_name.clone(),
            config.cull_timeout,
            RetryPolicy::new(config.poll_attempts, config.poll_interval()),
        )
    }

    /// 创建实例并等待就绪，成功时返回实例地址
    pub async fn run(&self) -> Result<String, ProbeError> {
        let launched = self
            .api
            .launch(&self.template_name, self.cull_timeout)
            .await
            .map_err(ProbeError::Launch)?;
        debug!("部署实例已创建: {}", launched.id);

        let id = launched.id.as_str();
        let template_name = self.template_name.as_str();
        let api = &self.api;

        let polled = retry(&self.policy, |attempt| async move {
            match api.status(id, template_name).await {
                Err(e) => Attempt::Fatal(e),
                Ok(status) if status.is_ready() => {
                    Attempt::Success(status.location.unwrap_or_default())
                }
                Ok(_) => {
                    debug!("部署实例 {} 第 {} 次查询尚未就绪", id, attempt);
                    Attempt::Retry
                }
            }
        })
        .await;

        polled.map_err(|e| match e {
            RetryError::Fatal { attempt, error } => ProbeError::Poll {
                attempt,
                source: error,
            },
            RetryError::Exhausted { attempts } => ProbeError::RetryExhausted { attempts },
        })
    }
}

#[async_trait]
impl Probe for DeployProbe {
    fn name(&self) -> &str {
        DEPLOY_PROBE_NAME
    }

    async fn execute(&self) -> Result<Outcome, ProbeError> {
        match self.run().await {
            Ok(location) => {
                info!("部署探针通过，实例地址: {}", location);
                Ok(Outcome::Pass)
            }
            Err(e) => {
                warn!("部署探针失败: {}", e);
                Ok(Outcome::Fail)
            }
        }
    }
}
