//! 进程管理模块
//!
//! 提供PID文件和信号处理支持

pub mod pid;
pub mod signal_handler;

pub use pid::{is_process_running, PidFile};
pub use signal_handler::{setup_signal_handlers, wait_for_shutdown};
