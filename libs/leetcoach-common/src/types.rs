use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Cpp,
}

impl Language {
    /// Parse a wire language name; anything other than the two supported names is rejected
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "python" => Some(Language::Python),
            "cpp" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Cpp => "cpp",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::Cpp => write!(f, "cpp"),
        }
    }
}

fn default_public() -> bool {
    true
}

/// One test case as produced by the problem generators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Value,
    pub expected_output: Value,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeStatus {
    Pass,
    Fail,
    Error,
}

/// Per-test result record. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub status: OutcomeStatus,
    pub input: Value,
    pub expected_output: Value,
    pub actual_output: Option<Value>,
    #[serde(default)]
    pub error_message: String,
    pub runtime_ms: u64,
}

impl TestOutcome {
    pub fn pass(test_case: &TestCase, actual: Value, runtime_ms: u64) -> Self {
        Self::with_actual(OutcomeStatus::Pass, test_case, actual, runtime_ms)
    }

    pub fn fail(test_case: &TestCase, actual: Value, runtime_ms: u64) -> Self {
        Self::with_actual(OutcomeStatus::Fail, test_case, actual, runtime_ms)
    }

    pub fn error(test_case: &TestCase, message: impl Into<String>, runtime_ms: u64) -> Self {
        Self {
            status: OutcomeStatus::Error,
            input: test_case.input.clone(),
            expected_output: test_case.expected_output.clone(),
            actual_output: None,
            error_message: message.into(),
            runtime_ms,
        }
    }

    fn with_actual(status: OutcomeStatus, test_case: &TestCase, actual: Value, runtime_ms: u64) -> Self {
        Self {
            status,
            input: test_case.input.clone(),
            expected_output: test_case.expected_output.clone(),
            actual_output: Some(actual),
            error_message: String::new(),
            runtime_ms,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status == OutcomeStatus::Pass
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    Timeout,
    RuntimeError,
    CompileError,
}

/// Body of POST /execute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub language: String,
    pub code: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// The single output artifact of a judging run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub verdict: Verdict,
    pub test_results: Vec<TestOutcome>,
    pub total_runtime_ms: u64,
    pub peak_memory_kb: u64,
    #[serde(default)]
    pub compilation_output: String,
    #[serde(default)]
    pub runtime_output: String,
}

impl ExecutionResult {
    pub fn compile_error(diagnostic: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::CompileError,
            test_results: Vec::new(),
            total_runtime_ms: 0,
            peak_memory_kb: 0,
            compilation_output: diagnostic.into(),
            runtime_output: String::new(),
        }
    }

    pub fn passed(&self) -> usize {
        self.test_results.iter().filter(|t| t.is_pass()).count()
    }
}
