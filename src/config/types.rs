//! 配置数据结构定义
//!
//! 定义代理的配置结构体、分层覆盖规则和验证逻辑

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// 部署探针与构建探针共用的示例资源名
pub const EXAMPLE_RESOURCE_NAME: &str = "binder-project-example-requirements";

/// 主配置结构
///
/// 启动时构建一次，之后以 `Arc<Config>` 只读传递。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 两轮检测之间的间隔（秒）
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 转发给下游服务的API密钥
    #[serde(default)]
    pub api_key: Option<String>,
    /// 构建服务地址
    #[serde(default = "default_build_endpoint")]
    pub build: EndpointConfig,
    /// 部署服务地址
    #[serde(default = "default_deploy_endpoint")]
    pub deploy: EndpointConfig,
    /// 状态查询接口的监听配置
    #[serde(default)]
    pub web: WebConfig,
    /// 状态存储配置
    #[serde(default)]
    pub store: StoreConfig,
    /// 探针参数
    #[serde(default)]
    pub probes: ProbeConfig,
    /// PID文件路径
    #[serde(default)]
    pub pid_file: Option<PathBuf>,
}

/// 下游服务地址
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    /// 主机名
    pub host: String,
    /// 端口
    pub port: u16,
}

impl EndpointConfig {
    /// 服务根地址
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

/// 状态查询接口配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebConfig {
    /// 绑定地址
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// 监听端口
    #[serde(default = "default_web_port")]
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_web_port(),
        }
    }
}

impl WebConfig {
    /// 解析监听地址，`bind_address` 可以是IP或主机名（如 `localhost`）
    pub async fn resolve_addr(&self) -> Result<SocketAddr, String> {
        let mut addrs = tokio::net::lookup_host((self.bind_address.as_str(), self.port))
            .await
            .map_err(|e| format!("无效的监听地址 {}:{}: {}", self.bind_address, self.port, e))?;
        addrs
            .next()
            .ok_or_else(|| format!("监听地址 {} 未解析到任何IP", self.bind_address))
    }
}

/// 存储后端类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// 进程内存
    Memory,
    /// JSON文件
    #[default]
    File,
}

/// 状态存储配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StoreConfig {
    /// 存储后端
    #[serde(default)]
    pub kind: StoreKind,
    /// 文件存储路径，未指定时使用数据目录下的 health.json
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// 文件存储的实际路径
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|dir| dir.join("binder-health-checker").join("health.json"))
                .unwrap_or_else(|| PathBuf::from("health.json"))
        })
    }
}

/// 探针参数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeConfig {
    /// 部署探针使用的模板名
    #[serde(default = "default_resource_name")]
    pub template_name: String,
    /// 构建探针查询的镜像名
    #[serde(default = "default_resource_name")]
    pub image_name: String,
    /// 临时实例的自动回收时间
    #[serde(default = "default_cull_timeout")]
    pub cull_timeout: u64,
    /// 部署状态最大轮询次数
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    /// 轮询间隔（毫秒）
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 单次下游请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            template_name: default_resource_name(),
            image_name: default_resource_name(),
            cull_timeout: default_cull_timeout(),
            poll_attempts: default_poll_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl ProbeConfig {
    /// 轮询间隔
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            log_level: default_log_level(),
            api_key: None,
            build: default_build_endpoint(),
            deploy: default_deploy_endpoint(),
            web: WebConfig::default(),
            store: StoreConfig::default(),
            probes: ProbeConfig::default(),
            pid_file: None,
        }
    }
}

impl Config {
    /// 两轮检测之间的间隔
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// PID文件路径
    pub fn pid_file_path(&self) -> PathBuf {
        self.pid_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("binder-health-checker.pid"))
    }

    /// 叠加 `--config` 指定的JSON选项
    pub fn apply_options(&mut self, options: ConfigOptions) {
        if let Some(interval) = options.interval_seconds {
            self.interval_seconds = interval;
        }
        if let Some(level) = options.log_level {
            self.log_level = level;
        }
        if let Some(key) = options.api_key {
            self.api_key = Some(key);
        }
        if let Some(port) = options.port {
            self.web.port = port;
        }
        if let Some(build) = options.build {
            self.build = build;
        }
        if let Some(deploy) = options.deploy {
            self.deploy = deploy;
        }
        if let Some(store) = options.store {
            self.store = store;
        }
        if let Some(probes) = options.probes {
            self.probes = probes;
        }
        if let Some(pid_file) = options.pid_file {
            self.pid_file = Some(pid_file);
        }
    }
}

/// `--config` 文件中的可选覆盖项，全部字段可缺省
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOptions {
    #[serde(default, alias = "interval_seconds")]
    pub interval_seconds: Option<u64>,
    #[serde(default, alias = "log_level")]
    pub log_level: Option<String>,
    #[serde(default, alias = "api_key")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub build: Option<EndpointConfig>,
    #[serde(default)]
    pub deploy: Option<EndpointConfig>,
    #[serde(default)]
    pub store: Option<StoreConfig>,
    #[serde(default)]
    pub probes: Option<ProbeConfig>,
    #[serde(default, alias = "pid_file")]
    pub pid_file: Option<PathBuf>,
}

// 默认值函数
fn default_interval() -> u64 {
    60
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_build_endpoint() -> EndpointConfig {
    EndpointConfig {
        host: "localhost".to_string(),
        port: 8082,
    }
}
fn default_deploy_endpoint() -> EndpointConfig {
    EndpointConfig {
        host: "localhost".to_string(),
        port: 8084,
    }
}
fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_web_port() -> u16 {
    8080
}
fn default_resource_name() -> String {
    EXAMPLE_RESOURCE_NAME.to_string()
}
fn default_cull_timeout() -> u64 {
    1
}
fn default_poll_attempts() -> u32 {
    30
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_request_timeout() -> u64 {
    30
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.interval_seconds == 0 {
        return Err("检测间隔不能为0".to_string());
    }

    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.log_level, valid_log_levels
        ));
    }

    for (label, endpoint) in [("构建服务", &config.build), ("部署服务", &config.deploy)] {
        if endpoint.host.trim().is_empty() {
            return Err(format!("{label}主机名不能为空"));
        }
        if endpoint.port == 0 {
            return Err(format!("{label}端口不能为0"));
        }
    }

    if config.web.port == 0 {
        return Err("状态接口端口不能为0".to_string());
    }
    if config.web.bind_address.trim().is_empty() {
        return Err("状态接口绑定地址不能为空".to_string());
    }

    let probes = &config.probes;
    if probes.template_name.trim().is_empty() {
        return Err("部署模板名不能为空".to_string());
    }
    if probes.image_name.trim().is_empty() {
        return Err("构建镜像名不能为空".to_string());
    }
    if probes.poll_attempts == 0 {
        return Err("轮询次数至少为1".to_string());
    }
    if probes.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.probes.poll_attempts, 30);
        assert_eq!(config.probes.poll_interval(), Duration::from_millis(1000));
        assert_eq!(config.probes.template_name, EXAMPLE_RESOURCE_NAME);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            interval_seconds = 30

            [deploy]
            host = "deploy.internal"
            port = 9000
            "#,
        )
        .expect("反序列化失败");

        assert_eq!(config.interval_seconds, 30);
        assert_eq!(config.deploy.base_url(), "http://deploy.internal:9000");
        assert_eq!(config.build, default_build_endpoint());
        assert_eq!(config.store.kind, StoreKind::File);
    }

    #[test]
    fn test_validation_rejects_zero_interval() {
        let mut config = Config::default();
        config.interval_seconds = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_attempts() {
        let mut config = Config::default();
        config.probes.poll_attempts = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.contains("轮询次数"));
    }

    #[test]
    fn test_validation_rejects_bad_log_level() {
        let mut config = Config::default();
        config.log_level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_apply_options_overrides_only_present_fields() {
        let mut config = Config::default();
        let options: ConfigOptions = serde_json::from_str(
            r#"{ "apiKey": "from-options", "port": 9100, "intervalSeconds": 5 }"#,
        )
        .unwrap();

        config.apply_options(options);

        assert_eq!(config.api_key.as_deref(), Some("from-options"));
        assert_eq!(config.web.port, 9100);
        assert_eq!(config.interval_seconds, 5);
        assert_eq!(config.deploy, default_deploy_endpoint());
    }

    #[tokio::test]
    async fn test_bind_address_accepts_hostname() {
        let web = WebConfig {
            bind_address: "localhost".to_string(),
            port: 8080,
        };
        let addr = web.resolve_addr().await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 8080);

        let ip = WebConfig::default().resolve_addr().await.unwrap();
        assert_eq!(ip, "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn test_validation_rejects_empty_bind_address() {
        let mut config = Config::default();
        config.web.bind_address = "  ".to_string();
        assert!(validate_config(&config).is_err());

        config.web.bind_address = "localhost".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_endpoint_base_url_keeps_scheme() {
        let endpoint = EndpointConfig {
            host: "https://build.example.org/".to_string(),
            port: 443,
        };
        assert_eq!(endpoint.base_url(), "https://build.example.org:443");
    }
}
