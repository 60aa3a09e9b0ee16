//! Web 路由处理函数
//!
//! `GET /status` 返回全部健康记录

use crate::service::HealthCheckerModule;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// 状态查询路由
pub fn status_routes(module: Arc<HealthCheckerModule>) -> Router {
    Router::new()
        .route("/status", get(health_status))
        .with_state(module)
}

/// 状态查询处理函数
///
/// 成功时返回记录数组，查询失败返回400和错误信息。
pub async fn health_status(State(module): State<Arc<HealthCheckerModule>>) -> Response {
    match module.get_health_status().await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => {
            error!("健康状态查询失败: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::health::{HealthRecord, HealthStatus, ProbeRegistry};
    use crate::service::Module;
    use crate::store::{MemoryStore, StatusStore};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn module(store: &MemoryStore) -> Arc<HealthCheckerModule> {
        Arc::new(HealthCheckerModule::with_parts(
            Arc::new(Config::default()),
            Arc::new(store.clone()),
            Arc::new(ProbeRegistry::new()),
        ))
    }

    async fn get_status(router: Router) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_returns_records() {
        let store = MemoryStore::new();
        store
            .upsert(&HealthRecord::new(
                "build",
                HealthStatus::Running,
                chrono::Utc::now(),
            ))
            .await
            .unwrap();

        let module = module(&store);
        module.start().await.unwrap();

        let (status, body) = get_status(Arc::clone(&module).routes()).await;
        assert_eq!(status, StatusCode::OK);
        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "build");
        assert_eq!(records[0]["status"], "running");

        module.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_empty_store_is_empty_array() {
        let store = MemoryStore::new();
        let module = module(&store);
        module.start().await.unwrap();

        let (status, body) = get_status(Arc::clone(&module).routes()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        module.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_before_start_is_bad_request() {
        let module = module(&MemoryStore::new());

        let (status, body) = get_status(module.routes()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
