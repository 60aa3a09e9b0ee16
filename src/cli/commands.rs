//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands};
use crate::config::{
    api_key_from_env, load_options_file, Config, ConfigBuilder, TomlConfigLoader,
};
use crate::daemon::{setup_signal_handlers, PidFile};
use crate::error::{HealthCheckerError, Result};
use crate::health::{HealthRecord, ProbeRegistry, RoundScheduler};
use crate::logging::{LogConfig, LoggingSystem};
use crate::service::HealthCheckerModule;
use crate::store::connector_from_config;
use crate::web::WebServer;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 按优先级合并全部配置来源
///
/// # 参数
/// * `args` - 全局参数，提供设置文件路径
/// * `options_path` - `--config` 指定的JSON选项文件
/// * `port` - `--port`
/// * `api_key` - `--api-key`
pub async fn resolve_config(
    args: &Args,
    options_path: Option<&Path>,
    port: Option<u16>,
    api_key: Option<String>,
) -> Result<Arc<Config>> {
    let settings = TomlConfigLoader::new(true)
        .load_settings(args.settings.as_deref())
        .await?;

    let options = match options_path {
        Some(path) => Some(load_options_file(path).await?),
        None => None,
    };

    ConfigBuilder::new(settings)
        .with_options(options)
        .with_port(port)
        .with_env_api_key(api_key_from_env())
        .with_cli_api_key(api_key)
        .build()
}

/// 初始化日志，命令行级别优先于配置中的级别
pub fn init_logging(args: &Args, config_level: Option<&str>) -> Result<LoggingSystem> {
    let mut log_config = LogConfig::with_level_name(config_level.unwrap_or("info"));
    if let Some(level) = args.log_level {
        log_config.level = level.into();
    }

    LoggingSystem::setup_logging(log_config).map_err(HealthCheckerError::Other)
}

/// PID文件路径，命令行参数优先
fn pid_file_path(args: &Args, config: Option<&Config>) -> PathBuf {
    args.pid_file.clone().unwrap_or_else(|| match config {
        Some(config) => config.pid_file_path(),
        None => Config::default().pid_file_path(),
    })
}

/// 启动命令
pub struct StartCommand;

#[async_trait]
impl Command for StartCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Start {
            api_key,
            config,
            port,
        } = &args.command
        {
            let config = resolve_config(args, config.as_deref(), *port, api_key.clone()).await?;
            let logging = init_logging(args, Some(&config.log_level))?;
            debug!("日志级别: {}", logging.config().level);
            self.run(args, config).await
        } else {
            Ok(())
        }
    }
}

impl StartCommand {
    async fn run(&self, args: &Args, config: Arc<Config>) -> Result<()> {
        info!("{} v{} 启动", crate::APP_NAME, crate::VERSION);

        let addr = config
            .web
            .resolve_addr()
            .await
            .map_err(|e| HealthCheckerError::Config(crate::error::ConfigError::ValidationError(e)))?;
        let module = Arc::new(HealthCheckerModule::new(Arc::clone(&config))?);

        let pid_file = PidFile::new(pid_file_path(args, Some(&config)));
        pid_file.write()?;
        info!("PID文件: {}", pid_file.path().display());

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let result = match setup_signal_handlers(shutdown_tx).await {
            Ok(()) => WebServer::new(addr, module, shutdown_rx).run().await,
            Err(e) => Err(e),
        };

        if let Err(e) = pid_file.remove() {
            error!("删除PID文件失败: {}", e);
        }
        result
    }
}

/// 停止命令
pub struct StopCommand;

#[async_trait]
impl Command for StopCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let _logging = init_logging(args, None)?;

        // 设置文件可能指定了PID文件位置
        let config = TomlConfigLoader::new(true)
            .load_settings(args.settings.as_deref())
            .await
            .ok();

        let pid_file = PidFile::new(pid_file_path(args, config.as_ref()));
        let pid = pid_file.signal_stop()?;
        println!("已向进程 {pid} 发送停止信号");
        Ok(())
    }
}

/// 单轮检测命令
pub struct CheckCommand;

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Check {
            api_key,
            config,
            json,
        } = &args.command
        {
            let config = resolve_config(args, config.as_deref(), None, api_key.clone()).await?;
            let _logging = init_logging(args, Some(&config.log_level))?;
            self.perform_round(&config, *json).await
        } else {
            Ok(())
        }
    }
}

impl CheckCommand {
    /// 执行一轮检测并输出存储中的记录
    async fn perform_round(&self, config: &Config, json: bool) -> Result<()> {
        let connector = connector_from_config(&config.store);
        let registry = Arc::new(ProbeRegistry::standard(config)?);
        let scheduler = RoundScheduler::new(registry, Arc::clone(&connector), config.interval());

        let summary = scheduler.run_round().await?;
        let records = connector.connect().await?.query_all().await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&records)?);
        } else {
            self.print_text_results(&records);
        }

        match summary.failed() {
            0 => Ok(()),
            failed => Err(HealthCheckerError::Other(anyhow::anyhow!(
                "{failed} 个探针检测失败"
            ))),
        }
    }

    /// 打印文本格式结果
    fn print_text_results(&self, records: &[HealthRecord]) {
        for record in records {
            let status_icon = if record.status.is_healthy() {
                "✓"
            } else {
                "✗"
            };
            println!(
                "{} {} - {} - {}",
                status_icon,
                record.name,
                record.status,
                record.timestamp.to_rfc3339()
            );
        }
    }
}
