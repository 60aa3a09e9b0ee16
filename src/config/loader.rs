//! 配置加载器实现
//!
//! 提供TOML设置文件解析、环境变量替换，以及按优先级叠加各来源配置的构建器

use crate::config::types::{validate_config, Config, ConfigOptions};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 读取API密钥的环境变量名
pub const API_KEY_ENV: &str = "BINDER_API_KEY";

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config>;

    /// 从字符串加载配置
    async fn load_from_string(&self, content: &str) -> Result<Config>;

    /// 验证配置
    fn validate(&self, config: &Config) -> Result<()>;
}

/// TOML配置加载器实现
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
}

impl TomlConfigLoader {
    /// 创建新的TOML配置加载器
    ///
    /// # 参数
    /// * `enable_env_substitution` - 是否启用 `${VAR}` 环境变量替换
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 替换字符串中的环境变量
    fn substitute_env_vars(&self, content: &str) -> Result<String> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        // 匹配 ${VAR_NAME} 格式的环境变量
        let env_var_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {e}")))?;

        let mut result = content.to_string();

        for captures in env_var_regex.captures_iter(content) {
            let full_match = &captures[0];
            let var_name = &captures[1];

            match std::env::var(var_name) {
                Ok(value) => {
                    result = result.replace(full_match, &value);
                }
                Err(_) => {
                    return Err(ConfigError::EnvVarError {
                        var: var_name.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(result)
    }

    /// 解析TOML内容
    fn parse_toml(&self, content: &str) -> Result<Config> {
        let processed_content = self.substitute_env_vars(content)?;

        let config: Config = toml::from_str(&processed_content)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {e}")))?;

        Ok(config)
    }

    /// 加载设置文件
    ///
    /// 显式指定的文件必须存在；未指定时尝试默认路径，不存在则使用内置默认值。
    pub async fn load_settings(&self, path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => self.load_from_file(path).await,
            None => {
                let default_path = get_default_settings_path();
                if default_path.exists() {
                    self.load_from_file(&default_path).await
                } else {
                    tracing::debug!("未找到设置文件 {}，使用内置默认值", default_path.display());
                    Ok(Config::default())
                }
            }
        }
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {e}")))?;

        let config = self.parse_toml(&content)?;
        self.validate(&config)?;

        log::info!("成功加载设置文件: {}", path.display());
        log::debug!("设置内容: {:?}", config);

        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<Config> {
        let config = self.parse_toml(content)?;
        self.validate(&config)?;
        Ok(config)
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
    }
}

/// 读取 `--config` 指定的JSON选项文件
pub async fn load_options_file(path: &Path) -> Result<ConfigOptions> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_string_lossy().to_string(),
        }
        .into());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("JSON解析失败: {e}")).into())
}

/// 按优先级叠加配置来源
///
/// 优先级从低到高：设置文件 < 选项文件 < `--port` < 环境变量密钥 < `--api-key`。
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// 以设置文件内容为基础
    pub fn new(settings: Config) -> Self {
        Self { config: settings }
    }

    /// 叠加选项文件
    pub fn with_options(mut self, options: Option<ConfigOptions>) -> Self {
        if let Some(options) = options {
            self.config.apply_options(options);
        }
        self
    }

    /// 叠加显式端口
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.config.web.port = port;
        }
        self
    }

    /// 叠加环境变量中的API密钥，空字符串视为未设置
    pub fn with_env_api_key(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.config.api_key = Some(key);
        }
        self
    }

    /// 叠加命令行中的API密钥
    pub fn with_cli_api_key(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.config.api_key = Some(key);
        }
        self
    }

    /// 验证并冻结配置
    pub fn build(self) -> Result<Arc<Config>> {
        validate_config(&self.config).map_err(ConfigError::ValidationError)?;
        Ok(Arc::new(self.config))
    }
}

/// 从进程环境读取API密钥
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok()
}

/// 获取默认设置文件路径
pub fn get_default_settings_path() -> PathBuf {
    if Path::new("settings.toml").exists() {
        PathBuf::from("settings.toml")
    } else {
        dirs::config_dir()
            .map(|config_dir| config_dir.join("binder-health-checker").join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from("settings.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TEST_SETTINGS_TOML: &str = r#"
interval_seconds = 120
log_level = "debug"
api_key = "from-settings"

[build]
host = "build.internal"
port = 8082

[deploy]
host = "deploy.internal"
port = 8084

[web]
port = 8000
"#;

    #[tokio::test]
    async fn test_toml_parsing() {
        let loader = TomlConfigLoader::new(false);
        let config = loader.load_from_string(TEST_SETTINGS_TOML).await.unwrap();

        assert_eq!(config.interval_seconds, 120);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.build.host, "build.internal");
        assert_eq!(config.web.port, 8000);
        assert_eq!(config.api_key.as_deref(), Some("from-settings"));
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_substitution() {
        env::set_var("HC_TEST_DEPLOY_HOST", "deploy.from.env");

        let loader = TomlConfigLoader::new(true);
        let config = loader
            .load_from_string(
                r#"
[deploy]
host = "${HC_TEST_DEPLOY_HOST}"
port = 8084
"#,
            )
            .await
            .unwrap();

        assert_eq!(config.deploy.host, "deploy.from.env");

        env::remove_var("HC_TEST_DEPLOY_HOST");
    }

    #[tokio::test]
    async fn test_env_var_substitution_missing_var() {
        let loader = TomlConfigLoader::new(true);
        let result = loader
            .load_from_string("api_key = \"${HC_TEST_MISSING_VAR}\"")
            .await;

        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("HC_TEST_MISSING_VAR"));
        }
    }

    #[tokio::test]
    async fn test_load_missing_explicit_settings_file() {
        let loader = TomlConfigLoader::new(false);
        let result = loader
            .load_settings(Some(Path::new("/nonexistent/settings.toml")))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_options_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "apiKey": "opt-key", "port": 9001 }}"#).unwrap();

        let options = load_options_file(file.path()).await.unwrap();
        assert_eq!(options.api_key.as_deref(), Some("opt-key"));
        assert_eq!(options.port, Some(9001));
    }

    #[tokio::test]
    async fn test_precedence_order() {
        let loader = TomlConfigLoader::new(false);
        let settings = loader.load_from_string(TEST_SETTINGS_TOML).await.unwrap();
        let options = ConfigOptions {
            api_key: Some("from-options".to_string()),
            port: Some(9001),
            ..Default::default()
        };

        // 选项文件覆盖设置文件
        let config = ConfigBuilder::new(settings.clone())
            .with_options(Some(options.clone()))
            .build()
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-options"));
        assert_eq!(config.web.port, 9001);

        // 显式端口覆盖选项文件，环境变量密钥覆盖选项文件
        let config = ConfigBuilder::new(settings.clone())
            .with_options(Some(options.clone()))
            .with_port(Some(9500))
            .with_env_api_key(Some("from-env".to_string()))
            .build()
            .unwrap();
        assert_eq!(config.web.port, 9500);
        assert_eq!(config.api_key.as_deref(), Some("from-env"));

        // 命令行密钥优先级最高
        let config = ConfigBuilder::new(settings)
            .with_options(Some(options))
            .with_env_api_key(Some("from-env".to_string()))
            .with_cli_api_key(Some("from-cli".to_string()))
            .build()
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-cli"));
    }

    #[test]
    fn test_empty_env_key_is_ignored() {
        let config = ConfigBuilder::new(Config {
            api_key: Some("from-settings".to_string()),
            ..Config::default()
        })
        .with_env_api_key(Some(String::new()))
        .build()
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("from-settings"));
    }

    #[test]
    fn test_builder_validates() {
        let result = ConfigBuilder::new(Config::default())
            .with_port(Some(0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_substitute_env_vars_disabled() {
        let loader = TomlConfigLoader::new(false);
        let content = "test ${VAR} content";
        let result = loader.substitute_env_vars(content).unwrap();
        assert_eq!(result, content);
    }
}
