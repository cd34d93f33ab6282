//! Process invoker: one interpreter process per invocation.

use std::{
    path::PathBuf,
    process::Stdio,
    time::Duration,
};

use serde::Serialize;
use tokio::{process::Command, time::timeout};

use super::{marshal::{self, ScriptArg}, template::{self, TemplateStore}};
use crate::error::{BridgeError, Result};

pub const DEFAULT_INTERPRETER: &str = "osascript";
pub const DEFAULT_INLINE_FLAG: &str = "-e";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// One execution request. Owned by the caller and consumed by a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptInvocation {
    /// Complete script text, passed after the inline flag.
    Inline { source: String },
    /// A template file under the script root plus positional arguments.
    File { template: PathBuf, args: Vec<ScriptArg> },
}

impl ScriptInvocation {
    pub fn inline(source: impl Into<String>) -> Self {
        Self::Inline { source: source.into() }
    }

    /// Render an inline template with escaped placeholder values.
    pub fn inline_template(source: &str, bindings: &[(&str, ScriptArg)]) -> Self {
        Self::Inline { source: template::render(source, bindings) }
    }

    pub fn file(template: impl Into<PathBuf>, args: Vec<ScriptArg>) -> Self {
        Self::File { template: template.into(), args }
    }

    fn mode(&self) -> &'static str {
        match self {
            Self::Inline { .. } => "inline",
            Self::File { .. } => "file",
        }
    }
}

/// The single result of a [`ScriptInvocation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Exit status 0. `stdout` is newline-normalized and trimmed.
    Completed { stdout: String },
    /// The bound expired; the process was killed and its output dropped.
    TimedOut,
    /// Non-zero exit. `exit_code` is `None` when a signal ended the process.
    Failed { exit_code: Option<i32>, stderr: String },
    /// The interpreter could not be spawned.
    LaunchError { reason: String },
}

impl ExecutionOutcome {
    /// Fold the outcome into captured text or a typed error.
    pub fn into_result(self, program: &str, bound: Duration) -> Result<String> {
        match self {
            Self::Completed { stdout } => Ok(stdout),
            Self::TimedOut => Err(BridgeError::Timeout(bound)),
            Self::Failed { exit_code, stderr } => {
                Err(BridgeError::ProcessFailed { exit_code, stderr })
            }
            Self::LaunchError { reason } => Err(BridgeError::LaunchError {
                program: program.to_string(),
                reason,
            }),
        }
    }
}

/// The interpreter binary and how it accepts inline text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub program: String,
    pub inline_flag: String,
}

impl Interpreter {
    pub fn new(program: impl Into<String>, inline_flag: impl Into<String>) -> Self {
        Self { program: program.into(), inline_flag: inline_flag.into() }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER, DEFAULT_INLINE_FLAG)
    }
}

/// Runs invocations with a fixed wall-clock bound.
#[derive(Debug, Clone)]
pub struct Invoker {
    interpreter: Interpreter,
    timeout: Duration,
}

impl Invoker {
    pub fn new(interpreter: Interpreter, timeout: Duration) -> Self {
        Self { interpreter, timeout }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute one invocation.
    ///
    /// Returns `Err` only when a file template cannot be resolved, in which
    /// case no process was started and no outcome exists.
    pub async fn run(
        &self,
        store: &TemplateStore,
        invocation: &ScriptInvocation,
    ) -> Result<ExecutionOutcome> {
        let argv = match invocation {
            ScriptInvocation::Inline { source } => {
                vec![self.interpreter.inline_flag.clone(), source.clone()]
            }
            ScriptInvocation::File { template, args } => {
                let path = store.resolve(template)?;
                let mut argv = vec![path.to_string_lossy().into_owned()];
                argv.extend(marshal::to_argv(args));
                argv
            }
        };
        tracing::debug!(
            program = %self.interpreter.program,
            mode = invocation.mode(),
            "spawning interpreter"
        );
        let outcome = self.spawn(&argv).await;
        match &outcome {
            ExecutionOutcome::Completed { stdout } => {
                tracing::debug!(bytes = stdout.len(), "script completed")
            }
            ExecutionOutcome::TimedOut => {
                tracing::warn!(timeout = ?self.timeout, "script timed out")
            }
            ExecutionOutcome::Failed { exit_code, stderr } => {
                tracing::warn!(?exit_code, %stderr, "script failed")
            }
            ExecutionOutcome::LaunchError { reason } => {
                tracing::warn!(program = %self.interpreter.program, %reason, "interpreter launch failed")
            }
        }
        Ok(outcome)
    }

    async fn spawn(&self, argv: &[String]) -> ExecutionOutcome {
        let mut cmd = Command::new(&self.interpreter.program);
        cmd.args(argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout must take the child with it.
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return ExecutionOutcome::LaunchError { reason: e.to_string() },
        };

        let out = match timeout(self.timeout, child.wait_with_output()).await {
            Err(_) => return ExecutionOutcome::TimedOut,
            Ok(Err(e)) => {
                return ExecutionOutcome::Failed { exit_code: None, stderr: e.to_string() }
            }
            Ok(Ok(out)) => out,
        };

        if out.status.success() {
            let stdout = normalize_newlines(&String::from_utf8_lossy(&out.stdout));
            ExecutionOutcome::Completed { stdout: stdout.trim().to_string() }
        } else {
            let stderr = normalize_newlines(&String::from_utf8_lossy(&out.stderr));
            ExecutionOutcome::Failed {
                exit_code: out.status.code(),
                stderr: stderr.trim().to_string(),
            }
        }
    }
}

/// Translate `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newlines_normalized() {
        assert_eq!(normalize_newlines("a\rb\r\nc\n"), "a\nb\nc\n");
    }

    #[test]
    fn outcome_maps_to_errors() {
        let bound = Duration::from_secs(2);
        assert_eq!(
            ExecutionOutcome::Completed { stdout: "ok".into() }
                .into_result("osascript", bound)
                .unwrap(),
            "ok"
        );
        assert!(matches!(
            ExecutionOutcome::TimedOut.into_result("osascript", bound),
            Err(BridgeError::Timeout(d)) if d == bound
        ));
        assert!(matches!(
            ExecutionOutcome::Failed { exit_code: Some(1), stderr: "boom".into() }
                .into_result("osascript", bound),
            Err(BridgeError::ProcessFailed { exit_code: Some(1), stderr }) if stderr == "boom"
        ));
        assert!(matches!(
            ExecutionOutcome::LaunchError { reason: "missing".into() }
                .into_result("osascript", bound),
            Err(BridgeError::LaunchError { program, .. }) if program == "osascript"
        ));
    }

    #[test]
    fn inline_template_escapes_bindings() {
        let inv = ScriptInvocation::inline_template(
            r#"return "{{q}}""#,
            &[("q", ScriptArg::from(r#"a"b"#))],
        );
        assert_eq!(inv, ScriptInvocation::inline(r#"return "a\"b""#));
    }
}
