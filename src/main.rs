//! Binder Health Checker 主程序入口

use anyhow::{Context, Result};
use binder_health_checker::cli::args::{Args, Commands};
use binder_health_checker::cli::commands::{CheckCommand, Command, StartCommand, StopCommand};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = execute_command(&args).await {
        // 日志可能尚未初始化，直接输出到标准错误
        eprintln!("{e:#}");
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 执行CLI命令
async fn execute_command(args: &Args) -> Result<()> {
    let command: Box<dyn Command> = match &args.command {
        Commands::Start { .. } => Box::new(StartCommand),
        Commands::Stop => Box::new(StopCommand),
        Commands::Check { .. } => Box::new(CheckCommand),
    };

    command
        .execute(args)
        .await
        .context("命令执行失败")?;
    Ok(())
}
