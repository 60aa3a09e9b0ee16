//! PID文件管理
//!
//! `start` 写入当前进程PID，退出时删除；`stop` 读取PID并发送 SIGTERM。

use crate::error::{HealthCheckerError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// PID文件
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// 创建PID文件句柄，不会写入磁盘
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入当前进程PID
    ///
    /// 文件中记录的进程仍在运行时拒绝覆盖。
    pub fn write(&self) -> Result<()> {
        if let Some(pid) = self.read()? {
            if is_process_running(pid) {
                return Err(HealthCheckerError::Daemon(format!(
                    "进程 {} 已在运行 (PID文件: {})",
                    pid,
                    self.path.display()
                )));
            }
            warn!("清理过期的PID文件: {}", self.path.display());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, std::process::id().to_string())?;
        debug!("PID文件已写入: {}", self.path.display());
        Ok(())
    }

    /// 读取PID，文件不存在时返回 `None`
    ///
    /// 只接受正数PID：0 和负数在 `kill` 中表示进程组或全部进程。
    pub fn read(&self) -> Result<Option<i32>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let pid = content.trim().parse::<i32>().map_err(|e| {
            HealthCheckerError::Daemon(format!(
                "PID文件内容无效 {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if pid <= 0 {
            return Err(HealthCheckerError::Daemon(format!(
                "PID文件内容无效 {}: PID必须为正数，实际为 {}",
                self.path.display(),
                pid
            )));
        }
        Ok(Some(pid))
    }

    /// 删除PID文件，文件不存在时忽略
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("PID文件已删除: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// 向记录的进程发送 SIGTERM
    pub fn signal_stop(&self) -> Result<i32> {
        let pid = self.read()?.ok_or_else(|| {
            HealthCheckerError::Daemon(format!(
                "未找到PID文件，服务可能未在运行: {}",
                self.path.display()
            ))
        })?;

        if !is_process_running(pid) {
            return Err(HealthCheckerError::Daemon(format!(
                "进程 {} 不存在，PID文件已过期: {}",
                pid,
                self.path.display()
            )));
        }

        send_terminate(pid)?;
        info!("已向进程 {} 发送停止信号", pid);
        Ok(pid)
    }
}

/// 检查进程是否存在，非正数PID视为不存在
#[cfg(unix)]
pub fn is_process_running(pid: i32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    pid > 0 && kill(Pid::from_raw(pid), None).is_ok()
}

/// 检查进程是否存在
#[cfg(not(unix))]
pub fn is_process_running(_pid: i32) -> bool {
    false
}

#[cfg(unix)]
fn send_terminate(pid: i32) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(|e| {
        HealthCheckerError::Daemon(format!("向进程 {} 发送 SIGTERM 失败: {}", pid, e))
    })
}

#[cfg(not(unix))]
fn send_terminate(pid: i32) -> Result<()> {
    Err(HealthCheckerError::Daemon(format!(
        "当前平台不支持通过信号停止进程 {}",
        pid
    )))
}
