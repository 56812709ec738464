/// Execution Engine - Judging Runs for One Submission
///
/// **Core Responsibility:**
/// Prepare an executable form of the submission once, run it against every test case
/// in order, and hand the raw observations to the evaluator.
///
/// **Run Lifecycle:**
/// 1. Create a scoped workspace (removed on every exit path)
/// 2. Python: syntax check with `py_compile`; C++: synthesize a harness and compile it
/// 3. Failure at step 2 ends the run as COMPILE_ERROR with zero outcomes
/// 4. One subprocess per test, strictly sequential, each under a hard timeout
/// 5. Evaluate and aggregate
///
/// **Failure Policy:**
/// Nothing escapes `judge`. Per-test faults become ERROR outcomes; infrastructure
/// faults before the first test are charged to every test as ERROR outcomes.
use crate::config::{LanguageConfig, LanguageConfigManager, LanguageExecution, StepConfig};
use crate::evaluator::{self, RunOutcome, RunSignals, TestExecutionOutput};
use crate::harness::python::{self, DriverReply};
use crate::harness::ProblemShape;
use crate::workspace::ScopedWorkspace;
use anyhow::{Context, Result};
use leetcoach_common::config::Config;
use leetcoach_common::types::{ExecutionResult, Language, TestCase};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, error, info, instrument, warn};

pub const BUDGET_EXCEEDED_MESSAGE: &str = "Submission time budget exceeded";
pub const OUTPUT_LIMIT_MESSAGE: &str = "Output limit exceeded";

/// Per-stream capture cap for one subprocess
pub const OUTPUT_LIMIT_BYTES: usize = 1024 * 1024; // 1MB

/// Name of the compiled harness binary inside the workspace
const BINARY_NAME: &str = "harness";

/// Captured output of a subprocess that ran to completion
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// stdout or stderr went past `OUTPUT_LIMIT_BYTES`; captured text is truncated
    pub overflowed: bool,
}

#[derive(Debug)]
pub enum ProcessRun {
    Finished { output: ProcessOutput, elapsed: Duration },
    TimedOut,
}

/// Spawn `command`, feed it `input` on stdin, and collect stdout/stderr under `limit`
///
/// The child is killed when the limit expires (and when this future is dropped).
pub async fn run_process(mut command: Command, input: &str, limit: Duration) -> Result<ProcessRun> {
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().context("Failed to spawn process")?;
    let mut stdin = child.stdin.take().context("Failed to open stdin")?;
    let stdout = child.stdout.take().context("Failed to open stdout")?;
    let stderr = child.stderr.take().context("Failed to open stderr")?;

    let input = input.as_bytes().to_vec();
    let start = Instant::now();

    let res = {
        let feed = async move {
            // A child may exit without reading stdin; a broken pipe is not our failure
            let _ = stdin.write_all(&input).await;
            drop(stdin);
            Ok::<(), std::io::Error>(())
        };
        let fut_stdout = read_capped(stdout);
        let fut_stderr = read_capped(stderr);
        let fut_exit_status = child.wait();

        tokio::time::timeout(limit, async {
            tokio::try_join!(feed, fut_stdout, fut_stderr, fut_exit_status)
        })
        .await
    };
    let elapsed = start.elapsed();

    match res {
        Err(_) => {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill timed-out process");
            }
            Ok(ProcessRun::TimedOut)
        }
        Ok(Err(e)) => Err(e).context("Failed to communicate with subprocess"),
        Ok(Ok((_, mut stdout_buf, mut stderr_buf, status))) => {
            let overflowed = stdout_buf.len() > OUTPUT_LIMIT_BYTES || stderr_buf.len() > OUTPUT_LIMIT_BYTES;
            stdout_buf.truncate(OUTPUT_LIMIT_BYTES);
            stderr_buf.truncate(OUTPUT_LIMIT_BYTES);
            Ok(ProcessRun::Finished {
                output: ProcessOutput {
                    status: status.code(),
                    success: status.success(),
                    stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
                    overflowed,
                },
                elapsed,
            })
        }
    }
}

/// Read at most one byte past the cap, then close the pipe
///
/// Once the read end is gone further writes fail in the child (EPIPE/SIGPIPE), so a
/// runaway printer exits instead of blocking on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    (&mut reader)
        .take(OUTPUT_LIMIT_BYTES as u64 + 1)
        .read_to_end(&mut buf)
        .await?;
    drop(reader);
    Ok(buf)
}

/// Best-effort resident set size of this process in KB (0 where unavailable)
pub fn resident_memory_kb() -> u64 {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|status| {
                status.lines().find_map(|line| {
                    line.strip_prefix("VmRSS:")?
                        .split_whitespace()
                        .next()?
                        .parse::<u64>()
                        .ok()
                })
            })
            .unwrap_or(0)
    }
    #[cfg(not(target_os = "linux"))]
    {
        0
    }
}

/// Result of the syntax-check / compile step
#[derive(Debug, PartialEq)]
enum BuildOutcome {
    Built,
    Failed(String),
    TimedOut(u64),
}

/// A submission made runnable, ready to be fed test cases
enum PreparedProgram<'a> {
    Python {
        interpreter: &'a LanguageExecution,
        driver: PathBuf,
        source: PathBuf,
    },
    Cpp {
        binary: PathBuf,
        shape: ProblemShape,
    },
}

impl PreparedProgram<'_> {
    fn command(&self, cwd: &Path) -> Command {
        let mut command = match self {
            PreparedProgram::Python { interpreter, driver, source } => {
                let mut command = Command::new(&interpreter.command);
                command
                    .args(&interpreter.args)
                    .arg(driver)
                    .arg(source)
                    .env("PYTHONDONTWRITEBYTECODE", "1");
                command
            }
            PreparedProgram::Cpp { binary, .. } => Command::new(binary),
        };
        command.current_dir(cwd);
        command
    }

    /// Serialize one test input into what the program expects on stdin
    fn stdin_for(&self, test_case: &TestCase) -> Result<String> {
        match self {
            PreparedProgram::Python { .. } => Ok(serde_json::to_string(&test_case.input)?),
            PreparedProgram::Cpp { shape, .. } => Ok(format!("{}\n", shape.encode_input(&test_case.input)?)),
        }
    }

    /// Decode a finished process into a run outcome
    fn interpret(&self, output: &ProcessOutput) -> RunOutcome {
        match self {
            PreparedProgram::Python { .. } => match python::parse_driver_output(&output.stdout) {
                Some(DriverReply::Returned(value)) if output.success => RunOutcome::Produced(value),
                Some(DriverReply::Raised(message)) => RunOutcome::Failed(message),
                _ if output.success => RunOutcome::Failed("Invalid output format".to_string()),
                _ => RunOutcome::Failed(failure_message(output)),
            },
            PreparedProgram::Cpp { shape, .. } => {
                if !output.success {
                    return RunOutcome::Failed(failure_message(output));
                }
                match shape.decode_output(&output.stdout) {
                    Ok(value) => RunOutcome::Produced(value),
                    Err(e) => RunOutcome::Failed(e.to_string()),
                }
            }
        }
    }
}

fn failure_message(output: &ProcessOutput) -> String {
    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    match output.status {
        Some(code) => format!("Runtime error (exit code {})", code),
        None => "Runtime error (terminated by signal)".to_string(),
    }
}

fn diagnostic(output: &ProcessOutput) -> String {
    if !output.stderr.trim().is_empty() {
        output.stderr.clone()
    } else if !output.stdout.trim().is_empty() {
        output.stdout.clone()
    } else {
        format!("Build step exited with status {:?}", output.status)
    }
}

/// Engine for judging Python and C++ submissions with local subprocesses
pub struct JudgeEngine {
    languages: LanguageConfigManager,
    work_root: PathBuf,
    submission_budget: Duration,
}

impl JudgeEngine {
    pub fn new(languages: LanguageConfigManager, config: &Config) -> Self {
        Self {
            languages,
            work_root: config.work_root.clone(),
            submission_budget: Duration::from_millis(config.submission_budget_ms),
        }
    }

    pub fn languages(&self) -> &LanguageConfigManager {
        &self.languages
    }

    /// Judge one submission; never fails, every fault is folded into the result
    #[instrument(skip_all, fields(language = %language, test_count = test_cases.len()))]
    pub async fn judge(&self, language: Language, code: &str, test_cases: &[TestCase]) -> ExecutionResult {
        let started = Instant::now();

        let result = match ScopedWorkspace::create(&self.work_root) {
            Ok(workspace) => self.judge_in(&workspace, language, code, test_cases).await,
            Err(e) => Err(e),
        };

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                error!(error = %format!("{:#}", e), "Judging run failed before tests could execute");
                internal_failure(test_cases, &e)
            }
        };

        info!(
            verdict = ?result.verdict,
            passed = result.passed(),
            total = result.test_results.len(),
            total_runtime_ms = result.total_runtime_ms,
            wall_ms = started.elapsed().as_millis() as u64,
            "Judging run completed"
        );
        result
    }

    /// Judge inside an existing workspace; the caller owns its lifetime
    pub async fn judge_in(
        &self,
        workspace: &ScopedWorkspace,
        language: Language,
        code: &str,
        test_cases: &[TestCase],
    ) -> Result<ExecutionResult> {
        let config = self.languages.get_config(&language)?;

        let program = match language {
            Language::Python => self.prepare_python(workspace, config, code).await?,
            Language::Cpp => self.prepare_cpp(workspace, config, code, test_cases).await?,
        };

        let program = match program {
            Ok(program) => program,
            Err(short_circuit) => return Ok(short_circuit),
        };

        Ok(self
            .run_tests(workspace, &program, test_cases, config.run_timeout())
            .await)
    }

    /// Write the source, run the syntax check and drop the discovery driver next to it
    async fn prepare_python<'a>(
        &self,
        workspace: &ScopedWorkspace,
        config: &'a LanguageConfig,
        code: &str,
    ) -> Result<std::result::Result<PreparedProgram<'a>, ExecutionResult>> {
        let source = workspace.write(&config.source_file, code)?;

        if let Some(check) = &config.check {
            let outcome = self
                .build_step(workspace, check, vec![source.clone().into_os_string()])
                .await?;
            if let Some(result) = build_short_circuit(outcome) {
                return Ok(Err(result));
            }
        }

        let driver = workspace.write(python::DRIVER_FILE, &python::driver_script())?;
        let interpreter = config
            .run
            .as_ref()
            .with_context(|| format!("No run command configured for {}", config.name))?;

        Ok(Ok(PreparedProgram::Python {
            interpreter,
            driver,
            source,
        }))
    }

    /// Synthesize the harness from the first test's input shape and compile it once
    async fn prepare_cpp<'a>(
        &self,
        workspace: &ScopedWorkspace,
        config: &'a LanguageConfig,
        code: &str,
        test_cases: &[TestCase],
    ) -> Result<std::result::Result<PreparedProgram<'a>, ExecutionResult>> {
        let shape = test_cases
            .first()
            .map(|tc| ProblemShape::detect(&tc.input))
            .unwrap_or(ProblemShape::Generic);
        debug!(shape = shape.name(), "Selected harness shape");

        let source = workspace.write(&config.source_file, &shape.render_program(code))?;
        let binary = workspace.path(BINARY_NAME);

        let compile = config
            .compile
            .as_ref()
            .with_context(|| format!("No compile command configured for {}", config.name))?;
        let outcome = self
            .build_step(
                workspace,
                compile,
                vec![
                    OsString::from("-o"),
                    binary.clone().into_os_string(),
                    source.into_os_string(),
                ],
            )
            .await?;
        if let Some(result) = build_short_circuit(outcome) {
            return Ok(Err(result));
        }

        Ok(Ok(PreparedProgram::Cpp { binary, shape }))
    }

    async fn build_step(
        &self,
        workspace: &ScopedWorkspace,
        step: &StepConfig,
        extra_args: Vec<OsString>,
    ) -> Result<BuildOutcome> {
        let mut command = Command::new(&step.command);
        command
            .args(&step.args)
            .args(extra_args)
            .current_dir(workspace.dir());

        let started = Instant::now();
        let run = run_process(command, "", Duration::from_millis(step.timeout_ms))
            .await
            .with_context(|| format!("Failed to run build step '{}'", step.command))?;

        let outcome = match run {
            ProcessRun::TimedOut => BuildOutcome::TimedOut(step.timeout_ms),
            ProcessRun::Finished { output, .. } if output.success => BuildOutcome::Built,
            ProcessRun::Finished { output, .. } => BuildOutcome::Failed(diagnostic(&output)),
        };

        match &outcome {
            BuildOutcome::Built => info!(
                command = %step.command,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Build step succeeded"
            ),
            BuildOutcome::Failed(diag) => warn!(
                command = %step.command,
                error_preview = diag.lines().next().unwrap_or(""),
                "Build step failed"
            ),
            BuildOutcome::TimedOut(ms) => warn!(command = %step.command, timeout_ms = ms, "Build step timed out"),
        }

        Ok(outcome)
    }

    /// Run every test case in order, one subprocess at a time
    async fn run_tests(
        &self,
        workspace: &ScopedWorkspace,
        program: &PreparedProgram<'_>,
        test_cases: &[TestCase],
        limit: Duration,
    ) -> ExecutionResult {
        let deadline = Instant::now() + self.submission_budget;
        let mut signals = RunSignals::default();
        let mut outputs = Vec::with_capacity(test_cases.len());

        for (idx, test_case) in test_cases.iter().enumerate() {
            if Instant::now() >= deadline {
                if !signals.run_timed_out {
                    warn!(
                        completed = idx,
                        total = test_cases.len(),
                        budget_ms = self.submission_budget.as_millis() as u64,
                        "Submission budget exhausted; remaining tests not executed"
                    );
                }
                signals.run_timed_out = true;
                outputs.push(TestExecutionOutput {
                    outcome: RunOutcome::Failed(BUDGET_EXCEEDED_MESSAGE.to_string()),
                    execution_time_ms: 0,
                    memory_delta_kb: 0,
                    stderr: String::new(),
                });
                continue;
            }

            let output = self.run_single(workspace, program, test_case, limit).await;
            debug!(
                test_num = idx + 1,
                execution_ms = output.execution_time_ms,
                outcome = ?output.outcome,
                "Test executed"
            );
            outputs.push(output);
        }

        evaluator::aggregate_results(test_cases, &outputs, &signals)
    }

    async fn run_single(
        &self,
        workspace: &ScopedWorkspace,
        program: &PreparedProgram<'_>,
        test_case: &TestCase,
        limit: Duration,
    ) -> TestExecutionOutput {
        let input = match program.stdin_for(test_case) {
            Ok(input) => input,
            Err(e) => {
                return TestExecutionOutput {
                    outcome: RunOutcome::Failed(format!("Unsupported test input: {}", e)),
                    execution_time_ms: 0,
                    memory_delta_kb: 0,
                    stderr: String::new(),
                }
            }
        };

        let memory_before = resident_memory_kb();
        let run = run_process(program.command(workspace.dir()), &input, limit).await;
        let memory_delta_kb = resident_memory_kb().saturating_sub(memory_before);

        match run {
            Ok(ProcessRun::Finished { output, elapsed }) if output.overflowed => TestExecutionOutput {
                outcome: RunOutcome::Failed(OUTPUT_LIMIT_MESSAGE.to_string()),
                execution_time_ms: elapsed.as_millis() as u64,
                memory_delta_kb,
                stderr: String::new(),
            },
            Ok(ProcessRun::Finished { output, elapsed }) => TestExecutionOutput {
                outcome: program.interpret(&output),
                execution_time_ms: elapsed.as_millis() as u64,
                memory_delta_kb,
                stderr: output.stderr,
            },
            Ok(ProcessRun::TimedOut) => TestExecutionOutput {
                outcome: RunOutcome::TimedOut,
                execution_time_ms: limit.as_millis() as u64,
                memory_delta_kb,
                stderr: String::new(),
            },
            Err(e) => {
                error!(error = %format!("{:#}", e), "Test execution fault");
                TestExecutionOutput {
                    outcome: RunOutcome::Failed(format!("Internal error: {:#}", e)),
                    execution_time_ms: 0,
                    memory_delta_kb,
                    stderr: String::new(),
                }
            }
        }
    }
}

/// COMPILE_ERROR for a failed build, run-level TIMEOUT for a build that hung
///
/// Both go through the verdict aggregator with zero outcomes; the reason is carried in
/// `compilation_output`.
fn build_short_circuit(outcome: BuildOutcome) -> Option<ExecutionResult> {
    let (signals, compilation_output) = match outcome {
        BuildOutcome::Built => return None,
        BuildOutcome::Failed(diag) => (
            RunSignals {
                compile_failed: true,
                ..Default::default()
            },
            diag,
        ),
        BuildOutcome::TimedOut(ms) => (
            RunSignals {
                run_timed_out: true,
                ..Default::default()
            },
            format!("Compilation timed out after {}ms", ms),
        ),
    };
    let mut result = evaluator::aggregate_results(&[], &[], &signals);
    result.compilation_output = compilation_output;
    Some(result)
}

/// Every test charged with the same internal fault
fn internal_failure(test_cases: &[TestCase], e: &anyhow::Error) -> ExecutionResult {
    let outputs: Vec<TestExecutionOutput> = test_cases
        .iter()
        .map(|_| TestExecutionOutput {
            outcome: RunOutcome::Failed(format!("Internal error: {:#}", e)),
            execution_time_ms: 0,
            memory_delta_kb: 0,
            stderr: String::new(),
        })
        .collect();
    evaluator::aggregate_results(test_cases, &outputs, &RunSignals::default())
}
