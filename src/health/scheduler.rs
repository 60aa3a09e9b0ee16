//! 轮次调度器
//!
//! 启动后立即执行一轮检测：每个探针一个任务并发执行，各自完成后立即写入
//! 结果，全部结束后休眠固定间隔再开始下一轮。轮次之间不重叠。

use crate::error::StoreError;
use crate::health::probe::{execute_guarded, Probe};
use crate::health::registry::ProbeRegistry;
use crate::health::result::{HealthRecord, Outcome};
use crate::store::{StatusStore, StoreConnector};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// 单个探针在一轮中的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// 探针名称
    pub name: String,
    /// 检测结果
    pub outcome: Outcome,
    /// 结果是否已写入存储
    pub persisted: bool,
}

/// 一轮检测的汇总
#[derive(Debug, Clone)]
pub struct RoundSummary {
    /// 轮次ID
    pub round_id: Uuid,
    /// 各探针结果，顺序与注册顺序一致
    pub reports: Vec<ProbeReport>,
}

impl RoundSummary {
    /// 通过的探针数
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_pass()).count()
    }

    /// 失败的探针数
    pub fn failed(&self) -> usize {
        self.reports.len() - self.passed()
    }

    /// 是否全部写入成功
    pub fn all_persisted(&self) -> bool {
        self.reports.iter().all(|r| r.persisted)
    }

    /// 按名称查找
    pub fn report(&self, name: &str) -> Option<&ProbeReport> {
        self.reports.iter().find(|r| r.name == name)
    }
}

/// 轮次调度器
#[derive(Clone)]
pub struct RoundScheduler {
    /// 探针注册表
    registry: Arc<ProbeRegistry>,
    /// 存储连接器
    connector: Arc<dyn StoreConnector>,
    /// 轮次间隔
    interval: Duration,
}

impl RoundScheduler {
    /// 创建调度器
    ///
    /// # 参数
    /// * `registry` - 探针注册表
    /// * `connector` - 存储连接器，每轮获取一次连接
    /// * `interval` - 一轮结束到下一轮开始的间隔
    pub fn new(
        registry: Arc<ProbeRegistry>,
        connector: Arc<dyn StoreConnector>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            connector,
            interval,
        }
    }

    /// 轮次间隔
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 执行一轮检测
    ///
    /// 获取存储连接失败时整轮跳过并返回错误；单个探针的执行或写入失败
    /// 只体现在对应的 [`ProbeReport`] 中。
    pub async fn run_round(&self) -> Result<RoundSummary, StoreError> {
        let round_id = Uuid::new_v4();
        let span = info_span!("round", %round_id);

        async {
            let store = self.connector.connect().await?;
            debug!("开始一轮检测，探针数量: {}", self.registry.len());

            let handles: Vec<JoinHandle<ProbeReport>> = self
                .registry
                .probes()
                .iter()
                .map(|probe| {
                    let probe = Arc::clone(probe);
                    let store = Arc::clone(&store);
                    let span = info_span!("probe", name = probe.name());
                    tokio::spawn(
                        async move { check_and_record(probe.as_ref(), store.as_ref()).await }
                            .instrument(span),
                    )
                })
                .collect();

            let mut reports = Vec::with_capacity(handles.len());
            for (probe, joined) in self.registry.probes().iter().zip(join_all(handles).await) {
                match joined {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        error!("探针任务异常终止 {}: {}", probe.name(), e);
                        reports.push(ProbeReport {
                            name: probe.name().to_string(),
                            outcome: Outcome::Fail,
                            persisted: false,
                        });
                    }
                }
            }

            let summary = RoundSummary { round_id, reports };
            info!(
                "本轮检测完成: 通过 {}，失败 {}",
                summary.passed(),
                summary.failed()
            );
            Ok::<_, StoreError>(summary)
        }
        .instrument(span)
        .await
    }

    /// 持续执行检测直到收到关闭信号
    ///
    /// 关闭信号只在两轮之间的休眠期生效，正在进行的一轮不会被中断。
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "启动检测循环，探针: {:?}，间隔: {:?}",
            self.registry.names(),
            self.interval
        );

        loop {
            if let Err(e) = self.run_round().await {
                error!("无法执行健康检测，跳过本轮: {}", e);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown_rx.recv() => {
                    info!("收到关闭信号，检测循环退出");
                    break;
                }
            }
        }
    }
}

/// 执行一个探针并立即写入结果
async fn check_and_record(probe: &dyn Probe, store: &dyn StatusStore) -> ProbeReport {
    let outcome = execute_guarded(probe).await;
    let record = HealthRecord::completed_now(probe.name(), outcome);

    let persisted = match store.upsert(&record).await {
        Ok(()) => {
            debug!("已记录 {} 为 {}", record.name, record.status);
            true
        }
        Err(e) => {
            error!("无法记录检测结果 {}: {}", record.name, e);
            false
        }
    };

    if !outcome.is_pass() {
        warn!("探针 {} 检测失败", record.name);
    }

    ProbeReport {
        name: record.name,
        outcome,
        persisted,
    }
}
