// HTTP route handlers for the runner service

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use leetcoach_common::types::ExecutionRequest;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::executor;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// GET /health - Liveness check
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            service: "leetcoach-runner",
        }),
    )
}

/// POST /execute - Judge one submission synchronously
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExecutionRequest>,
) -> Response {
    match executor::execute_request(&state.engine, state.config.max_source_bytes, &payload).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            info!(language = %payload.language, reason = %e, "Request rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    detail: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LanguageConfigManager;
    use crate::engine::JudgeEngine;
    use leetcoach_common::config::Config;
    use serde_json::{json, Value};

    fn state(max_source_bytes: usize) -> Arc<AppState> {
        let config = Config {
            max_source_bytes,
            ..Config::default()
        };
        Arc::new(AppState {
            engine: JudgeEngine::new(LanguageConfigManager::builtin(), &config),
            config,
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"status": "healthy", "service": "leetcoach-runner"})
        );
    }

    #[tokio::test]
    async fn test_execute_unsupported_language() {
        let request = ExecutionRequest {
            language: "java".to_string(),
            code: "class Solution {}".to_string(),
            test_cases: Vec::new(),
        };
        let response = execute(State(state(1024)), Json(request)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"detail": "Unsupported language"}));
    }

    #[tokio::test]
    async fn test_execute_oversized_code() {
        let request = ExecutionRequest {
            language: "python".to_string(),
            code: "#".repeat(2048),
            test_cases: Vec::new(),
        };
        let response = execute(State(state(1024)), Json(request)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().starts_with("Source code too large"));
    }
}
