//! 下游服务客户端模块
//!
//! 定义部署服务和构建服务的调用接口，以及基于HTTP的实现

pub mod http;

use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::BinderClient;

/// 部署实例创建结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchResponse {
    /// 实例ID
    pub id: String,
}

/// 部署实例状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployStatus {
    /// 实例就绪后才会出现的访问地址
    #[serde(default)]
    pub location: Option<String>,
}

impl DeployStatus {
    /// 实例是否已就绪
    pub fn is_ready(&self) -> bool {
        self.location.as_deref().is_some_and(|l| !l.is_empty())
    }
}

/// 部署服务接口
#[async_trait]
pub trait DeployApi: Send + Sync {
    /// 从模板创建临时实例
    ///
    /// # 参数
    /// * `template_name` - 模板名
    /// * `cull_timeout` - 实例自动回收时间
    async fn launch(&self, template_name: &str, cull_timeout: u64)
        -> Result<LaunchResponse, ApiError>;

    /// 查询实例状态
    ///
    /// # 参数
    /// * `id` - 实例ID
    /// * `template_name` - 模板名
    async fn status(&self, id: &str, template_name: &str) -> Result<DeployStatus, ApiError>;
}

/// 构建服务接口
#[async_trait]
pub trait BuildApi: Send + Sync {
    /// 查询镜像构建状态，返回原始响应体
    async fn status(&self, image_name: &str) -> Result<serde_json::Value, ApiError>;
}
