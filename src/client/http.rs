//! 基于HTTP的Binder客户端
//!
//! 部署服务：`POST /applications/{template}` 创建实例，
//! `GET /applications/{template}/{id}` 查询实例状态。
//! 构建服务：`GET /builds/{image}` 查询构建状态。

use super::{BuildApi, DeployApi, DeployStatus, LaunchResponse};
use crate::config::EndpointConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// 单个下游服务的HTTP客户端
#[derive(Debug, Clone)]
pub struct BinderClient {
    /// HTTP客户端
    client: Client,
    /// 服务根地址
    base_url: String,
    /// 转发的API密钥
    api_key: Option<String>,
}

impl BinderClient {
    /// 创建新的客户端
    ///
    /// # 参数
    /// * `endpoint` - 服务地址
    /// * `api_key` - API密钥
    /// * `timeout` - 单次请求超时
    pub fn new(
        endpoint: &EndpointConfig,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Self::with_base_url(endpoint.base_url(), api_key, timeout)
    }

    /// 直接使用根地址创建客户端
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// 服务根地址
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(reqwest::header::AUTHORIZATION, key.as_str()),
            None => request,
        }
    }

    /// 发送请求，非2xx视为错误
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DeployApi for BinderClient {
    async fn launch(
        &self,
        template_name: &str,
        cull_timeout: u64,
    ) -> Result<LaunchResponse, ApiError> {
        let url = self.url(&format!("/applications/{template_name}"));
        debug!("创建部署实例: {}", url);

        let request = self
            .client
            .post(&url)
            .json(&json!({ "cull-timeout": cull_timeout }));
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn status(&self, id: &str, template_name: &str) -> Result<DeployStatus, ApiError> {
        let url = self.url(&format!("/applications/{template_name}/{id}"));
        debug!("查询部署实例状态: {}", url);

        let response = self.send(self.client.get(&url)).await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl BuildApi for BinderClient {
    async fn status(&self, image_name: &str) -> Result<serde_json::Value, ApiError> {
        let url = self.url(&format!("/builds/{image_name}"));
        debug!("查询构建状态: {}", url);

        // 2xx即视为构建可用，响应体不是JSON时按原文返回
        let response = self.send(self.client.get(&url)).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }))
    }
}
