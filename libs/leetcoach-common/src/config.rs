// Runner service configuration
// Everything here comes from the environment; per-language settings live in languages.json

use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8002";
pub const DEFAULT_SUBMISSION_BUDGET_MS: u64 = 30_000;
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 1024 * 1024; // 1MB

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// Parent directory for per-run scoped workspaces
    pub work_root: PathBuf,
    pub languages_path: Option<PathBuf>,
    /// Ceiling for one whole judging run, across all of its tests
    pub submission_budget_ms: u64,
    pub max_source_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("RUNNER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string()),
            work_root: std::env::var("RUNNER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            languages_path: std::env::var("LANGUAGES_CONFIG").ok().map(PathBuf::from),
            submission_budget_ms: env_number("SUBMISSION_BUDGET_MS", DEFAULT_SUBMISSION_BUDGET_MS),
            max_source_bytes: env_number("MAX_SOURCE_BYTES", DEFAULT_MAX_SOURCE_BYTES),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            work_root: std::env::temp_dir(),
            languages_path: None,
            submission_budget_ms: DEFAULT_SUBMISSION_BUDGET_MS,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
