/// Test Evaluator - Result Comparator and Verdict Aggregator
///
/// **Core Responsibility:**
/// Turn what the engine observed for each test into a `TestOutcome`, then reduce all
/// outcomes into one submission-level `Verdict`.
///
/// **Critical Properties:**
/// - Knows nothing about processes, compilers or temp files
/// - Pure functions: (observed outputs, test cases, run signals) -> result
///
/// **Equality Policy (both languages):**
/// - Exact structural equality, numbers compared numerically
/// - OR, for two arrays of equal length, equality after sorting both independently
/// - Nothing else: bool never equals number, string never equals number
///
/// The sort leniency accepts answers like index pairs in either order. It can also
/// accept an order-sensitive answer whose elements are a permutation of the expected
/// ones; that is a known looseness kept for compatibility.
use leetcoach_common::types::{ExecutionResult, OutcomeStatus, TestCase, TestOutcome, Verdict};
use serde_json::Value;
use std::cmp::Ordering;

pub const TIME_LIMIT_MESSAGE: &str = "Time limit exceeded";

/// What the engine observed for one test, already decoded per language
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The program finished and produced this value
    Produced(Value),
    /// Non-zero exit, user exception, undecodable output or an internal fault
    Failed(String),
    /// Killed after exceeding the per-test timeout
    TimedOut,
}

/// Raw execution output for a single test case
/// Produced by the engine, consumed by the evaluator
#[derive(Debug, Clone)]
pub struct TestExecutionOutput {
    pub outcome: RunOutcome,
    /// Wall-clock time, or the fixed timeout charge when timed out
    pub execution_time_ms: u64,
    pub memory_delta_kb: u64,
    pub stderr: String,
}

/// Run-level flags surfaced by the driver (or an upstream caller)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSignals {
    pub compile_failed: bool,
    /// The whole-run budget ran out
    pub run_timed_out: bool,
    /// A caller above the engine decided the submission exceeded its allotment
    pub upstream_timeout: bool,
}

/// Order-tolerant equality between an actual and an expected value
pub fn outputs_match(actual: &Value, expected: &Value) -> bool {
    if values_equal(actual, expected) {
        return true;
    }

    match (actual, expected) {
        (Value::Array(a), Value::Array(b)) if a.len() == b.len() => {
            match (sorted(a), sorted(b)) {
                (Some(a), Some(b)) => a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y)),
                _ => false,
            }
        }
        _ => false,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| values_equal(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).map(|w| values_equal(v, w)).unwrap_or(false))
        }
        _ => a == b,
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Sorted view of `items`, or `None` when the elements are not mutually orderable
/// (mixed kinds, or objects)
fn sorted(items: &[Value]) -> Option<Vec<&Value>> {
    if let Some(first) = items.first() {
        let kind = kind_rank(first);
        if first.is_object() || items.iter().any(|v| kind_rank(v) != kind) {
            return None;
        }
    }

    let mut view: Vec<&Value> = items.iter().collect();
    view.sort_by(|a, b| compare_values(a, b));
    Some(view)
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (p, q) in x.iter().zip(y.iter()) {
                let ord = compare_values(p, q);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => a.to_string().cmp(&b.to_string()),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Evaluate a single test case execution output
pub fn evaluate_test(test_case: &TestCase, output: &TestExecutionOutput) -> TestOutcome {
    let runtime_ms = output.execution_time_ms;
    match &output.outcome {
        RunOutcome::Produced(actual) => {
            if outputs_match(actual, &test_case.expected_output) {
                TestOutcome::pass(test_case, actual.clone(), runtime_ms)
            } else {
                TestOutcome::fail(test_case, actual.clone(), runtime_ms)
            }
        }
        RunOutcome::Failed(message) => TestOutcome::error(test_case, message.clone(), runtime_ms),
        RunOutcome::TimedOut => TestOutcome::error(test_case, TIME_LIMIT_MESSAGE, runtime_ms),
    }
}

/// Reduce outcomes to one verdict; first matching rule wins
///
/// 1. COMPILE_ERROR  2. TIMEOUT (run-level)  3. RUNTIME_ERROR (any ERROR outcome)
/// 4. ACCEPTED (all PASS, at least one test)  5. WRONG_ANSWER
///
/// Rule 3 outranks WRONG_ANSWER: one erroring test makes the whole
/// submission a runtime error even if other tests merely failed.
pub fn determine_verdict(signals: &RunSignals, outcomes: &[TestOutcome]) -> Verdict {
    if signals.compile_failed {
        Verdict::CompileError
    } else if signals.run_timed_out || signals.upstream_timeout {
        Verdict::Timeout
    } else if outcomes.iter().any(|o| o.status == OutcomeStatus::Error) {
        Verdict::RuntimeError
    } else if !outcomes.is_empty() && outcomes.iter().all(TestOutcome::is_pass) {
        Verdict::Accepted
    } else {
        Verdict::WrongAnswer
    }
}

/// Aggregate per-test outputs into the final execution result
///
/// `outputs` pairs positionally with `test_cases`; order is preserved.
pub fn aggregate_results(
    test_cases: &[TestCase],
    outputs: &[TestExecutionOutput],
    signals: &RunSignals,
) -> ExecutionResult {
    let test_results: Vec<TestOutcome> = test_cases
        .iter()
        .zip(outputs.iter())
        .map(|(tc, out)| evaluate_test(tc, out))
        .collect();

    let total_runtime_ms = test_results.iter().map(|t| t.runtime_ms).sum();
    let peak_memory_kb = outputs.iter().map(|o| o.memory_delta_kb).max().unwrap_or(0);
    let runtime_output = outputs
        .iter()
        .rev()
        .find(|o| !o.stderr.trim().is_empty())
        .map(|o| o.stderr.clone())
        .unwrap_or_default();

    ExecutionResult {
        verdict: determine_verdict(signals, &test_results),
        test_results,
        total_runtime_ms,
        peak_memory_kb,
        compilation_output: String::new(),
        runtime_output,
    }
}
