// Language configuration management for the LeetCoach runner
use anyhow::{bail, Context, Result};
use leetcoach_common::types::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A build-time step: syntax check for interpreted languages, compile for the rest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageExecution {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub name: String,
    pub version: String,
    pub source_file: String,
    #[serde(default)]
    pub check: Option<StepConfig>,
    #[serde(default)]
    pub compile: Option<StepConfig>,
    /// Absent for compiled languages: the produced binary is run directly
    #[serde(default)]
    pub run: Option<LanguageExecution>,
    pub run_timeout_ms: u64,
}

impl LanguageConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LanguagesJson {
    languages: Vec<LanguageConfig>,
}

/// Language configuration manager
#[derive(Debug, Clone)]
pub struct LanguageConfigManager {
    configs: HashMap<String, LanguageConfig>,
}

impl LanguageConfigManager {
    /// Load language configurations from languages.json
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Language config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .context("Failed to read languages.json")?;

        Self::from_json(&content)
    }

    /// Load with default path (config/languages.json)
    pub fn load_default() -> Result<Self> {
        Self::load(Path::new("config/languages.json"))
    }

    fn from_json(content: &str) -> Result<Self> {
        let languages_json: LanguagesJson = serde_json::from_str(content)
            .context("Failed to parse languages.json")?;

        let mut configs = HashMap::new();
        for lang in languages_json.languages {
            let Some(language) = Language::from_str(&lang.name) else {
                bail!("Unknown language '{}' in languages.json", lang.name);
            };
            if !lang.source_file.ends_with(&format!(".{}", language.file_extension())) {
                bail!("source_file for '{}' must end in .{}", lang.name, language.file_extension());
            }
            if lang.run_timeout_ms == 0 {
                bail!("run_timeout_ms must be positive for '{}'", lang.name);
            }
            configs.insert(lang.name.clone(), lang);
        }

        if configs.is_empty() {
            bail!("No languages configured in languages.json");
        }

        Ok(Self { configs })
    }

    /// Built-in settings: py_compile (5s), g++ -O2 -std=c++17 (10s), 2s per test
    pub fn builtin() -> Self {
        let python = LanguageConfig {
            name: "python".to_string(),
            version: "3".to_string(),
            source_file: "solution.py".to_string(),
            check: Some(StepConfig {
                command: "python3".to_string(),
                args: vec!["-m".to_string(), "py_compile".to_string()],
                timeout_ms: 5000,
            }),
            compile: None,
            run: Some(LanguageExecution {
                command: "python3".to_string(),
                args: Vec::new(),
            }),
            run_timeout_ms: 2000,
        };
        let cpp = LanguageConfig {
            name: "cpp".to_string(),
            version: "c++17".to_string(),
            source_file: "harness.cpp".to_string(),
            check: None,
            compile: Some(StepConfig {
                command: "g++".to_string(),
                args: vec!["-O2".to_string(), "-std=c++17".to_string()],
                timeout_ms: 10000,
            }),
            run: None,
            run_timeout_ms: 2000,
        };

        let mut configs = HashMap::new();
        configs.insert(python.name.clone(), python);
        configs.insert(cpp.name.clone(), cpp);
        Self { configs }
    }

    /// Get configuration for a specific language
    pub fn get_config(&self, language: &Language) -> Result<&LanguageConfig> {
        let lang_name = language.to_string();
        self.configs
            .get(&lang_name)
            .ok_or_else(|| anyhow::anyhow!("No configuration found for language: {}", lang_name))
    }

    /// List all configured languages
    pub fn list_languages(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.keys().cloned().collect();
        names.sort();
        names
    }

    /// `name (version)` per configured language, sorted by name
    pub fn describe(&self) -> Vec<String> {
        self.list_languages()
            .into_iter()
            .filter_map(|name| {
                self.configs
                    .get(&name)
                    .map(|config| format!("{} ({})", name, config.version))
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn with_run_timeout(mut self, language: &Language, timeout_ms: u64) -> Self {
        if let Some(config) = self.configs.get_mut(&language.to_string()) {
            config.run_timeout_ms = timeout_ms;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let manager = LanguageConfigManager::builtin();
        assert_eq!(manager.list_languages(), vec!["cpp", "python"]);

        let python = manager.get_config(&Language::Python).unwrap();
        assert_eq!(python.check.as_ref().unwrap().timeout_ms, 5000);
        assert!(python.compile.is_none());
        assert_eq!(python.run_timeout(), Duration::from_secs(2));

        let cpp = manager.get_config(&Language::Cpp).unwrap();
        let compile = cpp.compile.as_ref().unwrap();
        assert_eq!(compile.command, "g++");
        assert_eq!(compile.args, vec!["-O2", "-std=c++17"]);
        assert_eq!(compile.timeout_ms, 10000);
        assert!(cpp.run.is_none());
    }

    #[test]
    fn test_describe_includes_versions() {
        let manager = LanguageConfigManager::builtin();
        assert_eq!(manager.describe(), vec!["cpp (c++17)", "python (3)"]);
    }

    #[test]
    fn test_load_shipped_config() {
        // Path is relative to the crate when run through cargo test
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/languages.json");
        let manager = LanguageConfigManager::load(&path).unwrap();
        let cpp = manager.get_config(&Language::Cpp).unwrap();
        assert_eq!(cpp.source_file, "harness.cpp");
        assert_eq!(cpp.run_timeout_ms, 2000);
    }

    #[test]
    fn test_rejects_unknown_language() {
        let json = r#"{"languages": [{
            "name": "java", "version": "17", "source_file": "Main.java", "run_timeout_ms": 2000
        }]}"#;
        let err = LanguageConfigManager::from_json(json).unwrap_err();
        assert!(err.to_string().contains("Unknown language 'java'"));
    }

    #[test]
    fn test_rejects_mismatched_source_file() {
        let json = r#"{"languages": [{
            "name": "cpp", "version": "c++17", "source_file": "harness.py", "run_timeout_ms": 2000
        }]}"#;
        let err = LanguageConfigManager::from_json(json).unwrap_err();
        assert!(err.to_string().contains("must end in .cpp"));
    }

    #[test]
    fn test_rejects_empty_config() {
        assert!(LanguageConfigManager::from_json(r#"{"languages": []}"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = LanguageConfigManager::load(Path::new("/nonexistent/languages.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_language_config() {
        let json = r#"{"languages": [{
            "name": "python", "version": "3", "source_file": "solution.py", "run_timeout_ms": 2000
        }]}"#;
        let manager = LanguageConfigManager::from_json(json).unwrap();
        assert!(manager.get_config(&Language::Cpp).is_err());
    }
}
