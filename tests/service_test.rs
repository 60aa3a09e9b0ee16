//! 服务模块端到端测试
//!
//! 下游服务由mockito模拟，状态写入临时目录中的JSON文件

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use binder_health_checker::config::{Config, EndpointConfig, StoreConfig, StoreKind};
use binder_health_checker::health::HealthRecord;
use binder_health_checker::service::{HealthCheckerModule, Module};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

fn endpoint(server: &mockito::ServerGuard) -> EndpointConfig {
    let addr = server.socket_address();
    EndpointConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
    }
}

fn config(server: &mockito::ServerGuard, dir: &TempDir) -> Config {
    let mut config = Config {
        api_key: Some("secret".to_string()),
        build: endpoint(server),
        deploy: endpoint(server),
        store: StoreConfig {
            kind: StoreKind::File,
            path: Some(dir.path().join("health.json")),
        },
        ..Config::default()
    };
    config.probes.poll_interval_ms = 10;
    config.probes.poll_attempts = 3;
    config
}

async fn wait_for_records(module: &HealthCheckerModule, count: usize) -> Vec<HealthRecord> {
    for _ in 0..100 {
        let records = module.get_health_status().await.unwrap();
        if records.len() >= count {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("records were not written in time");
}

#[tokio::test]
async fn test_first_round_is_served_over_http() {
    let mut server = mockito::Server::new_async().await;
    let template = binder_health_checker::config::EXAMPLE_RESOURCE_NAME;
    server
        .mock("POST", format!("/applications/{template}").as_str())
        .match_header("authorization", "secret")
        .with_status(200)
        .with_body(r#"{"id": "i-1"}"#)
        .create_async()
        .await;
    server
        .mock("GET", format!("/applications/{template}/i-1").as_str())
        .with_status(200)
        .with_body(r#"{"location": "http://instance"}"#)
        .create_async()
        .await;
    server
        .mock("GET", format!("/builds/{template}").as_str())
        .with_status(500)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let module = Arc::new(HealthCheckerModule::new(Arc::new(config(&server, &dir))).unwrap());
    module.start().await.unwrap();

    let records = wait_for_records(&module, 2).await;
    assert_eq!(records[0].name, "build");
    assert!(!records[0].status.is_healthy());
    assert_eq!(records[1].name, "deploy");
    assert!(records[1].status.is_healthy());

    let response = Arc::clone(&module)
        .routes()
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let served: Vec<HealthRecord> = serde_json::from_slice(&body).unwrap();
    assert_eq!(served, records);

    module.stop().await.unwrap();
    assert!(dir.path().join("health.json").exists());
}

#[tokio::test]
async fn test_start_fails_when_store_unavailable() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    let config = Config {
        store: StoreConfig {
            kind: StoreKind::File,
            path: Some(blocker.join("health.json")),
        },
        ..Config::default()
    };

    let module = HealthCheckerModule::new(Arc::new(config)).unwrap();
    assert!(module.start().await.is_err());
    assert!(!module.is_running().await);
}
