//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Binder Health Checker - Binder构建与部署服务健康检查代理
#[derive(Parser, Debug, Clone)]
#[command(
    name = "binder-health-checker",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 基础设置文件路径（TOML）
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "基础设置文件路径",
        env = "BINDER_HEALTH_SETTINGS",
        global = true
    )]
    pub settings: Option<PathBuf>,

    /// 日志级别，未指定时使用配置中的值
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别",
        env = "BINDER_HEALTH_LOG_LEVEL",
        global = true
    )]
    pub log_level: Option<LogLevel>,

    /// PID文件路径
    #[arg(long, value_name = "FILE", help = "PID文件路径", global = true)]
    pub pid_file: Option<PathBuf>,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    /// 跟踪级别
    Trace,
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 在前台启动健康检查代理
    Start {
        /// 转发给下游服务的API密钥，优先级最高
        #[arg(short = 'k', long, value_name = "KEY", help = "API密钥")]
        api_key: Option<String>,

        /// JSON格式的选项文件
        #[arg(short, long, value_name = "FILE", help = "JSON选项文件")]
        config: Option<PathBuf>,

        /// 状态查询接口端口
        #[arg(short, long, value_name = "PORT", help = "状态查询接口端口")]
        port: Option<u16>,
    },

    /// 停止正在运行的代理
    Stop,

    /// 执行一轮检测并输出结果
    Check {
        /// 转发给下游服务的API密钥
        #[arg(short = 'k', long, value_name = "KEY", help = "API密钥")]
        api_key: Option<String>,

        /// JSON格式的选项文件
        #[arg(short, long, value_name = "FILE", help = "JSON选项文件")]
        config: Option<PathBuf>,

        /// 以JSON格式输出
        #[arg(long, help = "以JSON格式输出")]
        json: bool,
    },
}

impl Args {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
