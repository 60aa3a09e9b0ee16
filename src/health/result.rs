//! 健康检测结果数据结构
//!
//! 定义探针结果、持久化状态枚举和健康记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单次探针执行的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// 检测通过
    Pass,
    /// 检测失败
    Fail,
}

impl Outcome {
    /// 是否通过
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

impl From<bool> for Outcome {
    fn from(passed: bool) -> Self {
        if passed {
            Outcome::Pass
        } else {
            Outcome::Fail
        }
    }
}

/// 持久化的健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// 服务正常
    Running,
    /// 服务异常
    Down,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Running => write!(f, "running"),
            HealthStatus::Down => write!(f, "down"),
        }
    }
}

impl HealthStatus {
    /// 判断状态是否为健康
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Running)
    }
}

impl From<Outcome> for HealthStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Pass => HealthStatus::Running,
            Outcome::Fail => HealthStatus::Down,
        }
    }
}

/// 每个探针名对应的一条健康记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// 探针名称，同时是持久化主键
    pub name: String,
    /// 健康状态
    pub status: HealthStatus,
    /// 最近一次检测完成的时间
    pub timestamp: DateTime<Utc>,
}

impl HealthRecord {
    /// 创建健康记录
    ///
    /// # 参数
    /// * `name` - 探针名称
    /// * `status` - 健康状态
    /// * `timestamp` - 检测完成时间
    pub fn new(name: impl Into<String>, status: HealthStatus, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            status,
            timestamp,
        }
    }

    /// 以当前时间为完成时间，根据探针结果创建记录
    pub fn completed_now(name: impl Into<String>, outcome: Outcome) -> Self {
        Self::new(name, outcome.into(), Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_maps_to_status() {
        assert_eq!(HealthStatus::from(Outcome::Pass), HealthStatus::Running);
        assert_eq!(HealthStatus::from(Outcome::Fail), HealthStatus::Down);
        assert_eq!(Outcome::from(true), Outcome::Pass);
    }

    #[test]
    fn test_record_document_shape() {
        let timestamp = "2024-01-02T03:04:05Z".parse::<DateTime<Utc>>().unwrap();
        let record = HealthRecord::new("deploy", HealthStatus::Down, timestamp);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "deploy");
        assert_eq!(json["status"], "down");
        assert_eq!(json["timestamp"], "2024-01-02T03:04:05Z");
    }

    #[test]
    fn test_record_rejects_unknown_status() {
        let json = r#"{"name":"build","status":"degraded","timestamp":"2024-01-02T03:04:05Z"}"#;
        assert!(serde_json::from_str::<HealthRecord>(json).is_err());
    }
}
