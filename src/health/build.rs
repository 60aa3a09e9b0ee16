//! 构建探针
//!
//! 对已构建好的示例镜像做一次状态查询，不重试。

use crate::client::BuildApi;
use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::health::probe::Probe;
use crate::health::result::Outcome;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// 构建探针的注册名
pub const BUILD_PROBE_NAME: &str = "build";

/// 构建探针
pub struct BuildProbe {
    api: Arc<dyn BuildApi>,
    image_name: String,
}

impl BuildProbe {
    /// 创建构建探针
    pub fn new(api: Arc<dyn BuildApi>, image_name: impl Into<String>) -> Self {
        Self {
            api,
            image_name: image_name.into(),
        }
    }

    /// 按配置创建
    pub fn from_config(api: Arc<dyn BuildApi>, config: &ProbeConfig) -> Self {
        Self::new(api, config.image_name.clone())
    }

    /// 查询一次构建状态
    pub async fn run(&self) -> Result<serde_json::Value, ProbeError> {
        self.api
            .status(&self.image_name)
            .await
            .map_err(ProbeError::BuildQuery)
    }
}

#[async_trait]
impl Probe for BuildProbe {
    fn name(&self) -> &str {
        BUILD_PROBE_NAME
    }

    async fn execute(&self) -> Result<Outcome, ProbeError> {
        match self.run().await {
            Ok(status) => {
                debug!("构建探针通过: {}", status);
                Ok(Outcome::Pass)
            }
            Err(e) => {
                warn!("构建探针失败: {}", e);
                Ok(Outcome::Fail)
            }
        }
    }
}
