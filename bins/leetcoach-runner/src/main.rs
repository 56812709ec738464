mod config;
mod engine;
mod evaluator;
mod executor;
mod handlers;
mod harness;
mod workspace;


use axum::{
    routing::{get, post},
    Router,
};
use config::LanguageConfigManager;
use engine::JudgeEngine;
use leetcoach_common::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

pub struct AppState {
    pub engine: JudgeEngine,
    pub config: Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_line_number(true)
        .init();

    info!("LeetCoach runner booting...");

    let config = Config::from_env();

    // Load language configurations
    let languages = match &config.languages_path {
        Some(path) => LanguageConfigManager::load(path).map_err(|e| {
            error!("Failed to load language configurations from {}: {}", path.display(), e);
            e
        })?,
        None => LanguageConfigManager::load_default().unwrap_or_else(|e| {
            warn!("{}; using built-in language settings", e);
            LanguageConfigManager::builtin()
        }),
    };

    info!("Loaded language configurations for: {:?}", languages.describe());
    info!(
        work_root = %config.work_root.display(),
        submission_budget_ms = config.submission_budget_ms,
        max_source_bytes = config.max_source_bytes,
        "Runner settings"
    );

    let state = Arc::new(AppState {
        engine: JudgeEngine::new(languages, &config),
        config: config.clone(),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/execute", post(handlers::execute))
        .with_state(state);

    // Start server
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
