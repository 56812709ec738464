/// Request Executor - Validation and Orchestration
///
/// **Responsibility:**
/// Turn an incoming `ExecutionRequest` into a judging run.
///
/// This module is the glue layer between HTTP and the engine. It rejects requests the
/// engine must never see (unknown language, oversized source) and logs the summary of
/// every run. It knows nothing about how code executes or how outputs are scored.
use crate::engine::JudgeEngine;
use leetcoach_common::types::{ExecutionRequest, ExecutionResult, Language};
use tracing::{info, warn};

/// Reasons a request is refused before any judging happens
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Unsupported language")]
    UnsupportedLanguage(String),

    #[error("Source code too large: {size} bytes (limit {limit} bytes)")]
    SourceTooLarge { size: usize, limit: usize },
}

/// Validate `request` and judge it
pub async fn execute_request(
    engine: &JudgeEngine,
    max_source_bytes: usize,
    request: &ExecutionRequest,
) -> Result<ExecutionResult, RequestError> {
    let language = Language::from_str(&request.language)
        .filter(|lang| engine.languages().get_config(lang).is_ok())
        .ok_or_else(|| {
            warn!(language = %request.language, "Rejected request for unsupported language");
            RequestError::UnsupportedLanguage(request.language.clone())
        })?;

    if request.code.len() > max_source_bytes {
        warn!(
            size = request.code.len(),
            limit = max_source_bytes,
            "Rejected oversized submission"
        );
        return Err(RequestError::SourceTooLarge {
            size: request.code.len(),
            limit: max_source_bytes,
        });
    }

    info!(
        language = %language,
        test_count = request.test_cases.len(),
        code_bytes = request.code.len(),
        "Starting judging run"
    );

    let result = engine
        .judge(language, &request.code, &request.test_cases)
        .await;

    info!(
        language = %language,
        verdict = ?result.verdict,
        passed = result.passed(),
        total = result.test_results.len(),
        peak_memory_kb = result.peak_memory_kb,
        "Judging run returned"
    );

    Ok(result)
}
