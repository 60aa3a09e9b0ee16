//! 配置管理模块
//!
//! 提供设置文件解析、分层覆盖和验证功能

pub mod loader;
pub mod types;

// 重新导出主要类型
pub use loader::{
    api_key_from_env, load_options_file, ConfigBuilder, ConfigLoader, TomlConfigLoader,
    API_KEY_ENV,
};
pub use types::{
    validate_config, Config, ConfigOptions, EndpointConfig, ProbeConfig, StoreConfig, StoreKind,
    WebConfig, EXAMPLE_RESOURCE_NAME,
};
