//! 检测轮次基准测试
//!
//! 测试重试引擎和一轮探针扇出的开销

use async_trait::async_trait;
use binder_health_checker::error::ProbeError;
use binder_health_checker::health::{
    retry, Attempt, HealthRecord, HealthStatus, Outcome, Probe, ProbeRegistry, RetryPolicy,
    RoundScheduler,
};
use binder_health_checker::store::MemoryStore;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

struct InstantProbe(String);

#[async_trait]
impl Probe for InstantProbe {
    fn name(&self) -> &str {
        &self.0
    }

    async fn execute(&self) -> Result<Outcome, ProbeError> {
        Ok(Outcome::Pass)
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// 重试引擎基准测试
fn retry_benchmark(c: &mut Criterion) {
    let rt = runtime();
    let policy = RetryPolicy::new(30, Duration::ZERO);

    c.bench_function("retry_immediate_success", |b| {
        b.iter(|| {
            let result = rt.block_on(retry(&policy, |_| async { Attempt::<u32, ()>::Success(1) }));
            black_box(result)
        });
    });

    c.bench_function("retry_exhausted_30_attempts", |b| {
        b.iter(|| {
            let result = rt.block_on(retry(&policy, |_| async { Attempt::<u32, ()>::Retry }));
            black_box(result)
        });
    });
}

/// 轮次扇出基准测试
fn round_benchmark(c: &mut Criterion) {
    let rt = runtime();

    for count in [2usize, 16] {
        let mut registry = ProbeRegistry::new();
        for i in 0..count {
            registry
                .register(Arc::new(InstantProbe(format!("probe-{i}"))))
                .unwrap();
        }
        let scheduler = RoundScheduler::new(
            Arc::new(registry),
            Arc::new(MemoryStore::new()),
            Duration::from_secs(60),
        );

        c.bench_function(&format!("round_{count}_probes_memory_store"), |b| {
            b.iter(|| black_box(rt.block_on(scheduler.run_round()).unwrap()));
        });
    }

    c.bench_function("health_record_serialization", |b| {
        let record = HealthRecord::new("deploy", HealthStatus::Running, chrono::Utc::now());
        b.iter(|| black_box(serde_json::to_string(&record).unwrap()));
    });
}

criterion_group!(benches, retry_benchmark, round_benchmark);
criterion_main!(benches);
