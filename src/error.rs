//! 错误处理模块
//!
//! 定义健康检查代理的统一错误类型

use thiserror::Error;

/// 健康检查代理的主要错误类型
#[derive(Error, Debug)]
pub enum HealthCheckerError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 下游接口调用错误
    #[error("下游接口错误: {0}")]
    Api(#[from] ApiError),

    /// 探针执行错误
    #[error("探针错误: {0}")]
    Probe(#[from] ProbeError),

    /// 状态存储错误
    #[error("状态存储错误: {0}")]
    Store(#[from] StoreError),

    /// 进程管理错误
    #[error("进程管理错误: {0}")]
    Daemon(String),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },

    /// 探针名称重复
    #[error("探针名称重复: {name}")]
    DuplicateProbe { name: String },
}

/// 下游构建/部署服务接口错误
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP请求错误（连接、超时等）
    #[error("HTTP请求失败: {0}")]
    Request(#[from] reqwest::Error),

    /// 非2xx响应
    #[error("接口返回异常状态: {status} {body}")]
    Status { status: u16, body: String },

    /// 响应体无法解析
    #[error("响应解析失败: {0}")]
    Decode(String),
}

impl ApiError {
    /// 是否为资源不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// 探针执行错误
///
/// 每个变体都会被执行框架折算为 `Fail`，只用于日志中区分失败原因。
#[derive(Error, Debug)]
pub enum ProbeError {
    /// 部署实例创建失败，未进行任何轮询
    #[error("部署实例创建失败: {0}")]
    Launch(#[source] ApiError),

    /// 轮询过程中出现硬错误，轮询提前终止
    #[error("第 {attempt} 次状态查询失败: {source}")]
    Poll {
        attempt: u32,
        #[source]
        source: ApiError,
    },

    /// 重试次数耗尽仍未就绪
    #[error("已轮询 {attempts} 次，实例仍未就绪")]
    RetryExhausted { attempts: u32 },

    /// 构建状态查询失败
    #[error("构建状态查询失败: {0}")]
    BuildQuery(#[source] ApiError),

    /// 探针内部异常
    #[error("探针执行异常: {0}")]
    Unexpected(String),
}

/// 状态存储错误
#[derive(Error, Debug)]
pub enum StoreError {
    /// 无法获取存储连接
    #[error("无法连接状态存储: {0}")]
    Connect(String),

    /// 尚未建立连接
    #[error("状态存储尚未连接")]
    NotConnected,

    /// 写入单条记录失败
    #[error("写入健康记录失败 {name}: {reason}")]
    Write { name: String, reason: String },

    /// 查询失败
    #[error("查询健康记录失败: {0}")]
    Query(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, HealthCheckerError>;
