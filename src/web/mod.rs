//! Web模块
//!
//! 提供状态查询接口和承载服务模块的HTTP服务器

pub mod handlers;
pub mod server;

pub use handlers::{health_status, status_routes};
pub use server::WebServer;
