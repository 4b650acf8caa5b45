//! Process invoker: runs the external para binary under a timeout.
//!
//! The child inherits the gateway's full environment, so location variables
//! like `PARA_HOME` and `PARA_ARCHIVE` pass through untouched. A configured
//! credential is injected on top under its own variable name.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use secrecy::ExposeSecret;
use tokio::process::Command;

use crate::config::Config;
use crate::error::ToolError;

/// Maximum captured output size before truncation (64 KiB per stream).
const MAX_OUTPUT_SIZE: usize = 64 * 1024;

/// Default wall-clock timeout when none is configured.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of one completed external invocation.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Executes the external program with captured output and a hard timeout.
#[derive(Debug, Clone)]
pub struct Invoker {
    program: PathBuf,
    timeout: Duration,
    credential: Option<(String, String)>,
}

impl Invoker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
            credential: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_credential(mut self, var: impl Into<String>, value: impl Into<String>) -> Self {
        self.credential = Some((var.into(), value.into()));
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let mut invoker = Self::new(config.para_cli_path.clone()).with_timeout(config.timeout);
        if let Some(credential) = &config.credential {
            invoker = invoker
                .with_credential(credential.var.clone(), credential.value.expose_secret());
        }
        invoker
    }

    /// Run the program with the given argument vector.
    ///
    /// Classification: spawn failure is [`ToolError::Launch`], exceeding the
    /// wall-clock budget is [`ToolError::Timeout`] (the child is killed, not
    /// orphaned), and a non-zero exit is [`ToolError::ExternalTool`] carrying
    /// the captured stderr.
    pub async fn invoke(&self, tool: &str, argv: &[String]) -> Result<ProcessOutcome, ToolError> {
        let mut command = Command::new(&self.program);
        command
            .args(argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out future drops the child; the process must die with it.
            .kill_on_drop(true);

        if let Some((var, value)) = &self.credential {
            command.env(var, value);
        }

        tracing::debug!(tool, ?argv, "invoking {}", self.program.display());
        let start = Instant::now();

        let child = command.spawn().map_err(|e| ToolError::Launch {
            program: self.program.display().to_string(),
            reason: e.to_string(),
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::Launch {
                    program: self.program.display().to_string(),
                    reason: format!("failed to collect output: {e}"),
                });
            }
            Err(_) => {
                tracing::warn!(tool, timeout = ?self.timeout, "external process timed out");
                return Err(ToolError::Timeout {
                    tool: tool.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        let duration = start.elapsed();
        let stdout = truncate_output(&String::from_utf8_lossy(&output.stdout));
        let stderr = truncate_output(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            let message = if stderr.trim().is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(ToolError::ExternalTool {
                tool: tool.to_string(),
                message,
            });
        }

        tracing::debug!(tool, ?duration, "external process completed");
        Ok(ProcessOutcome {
            status: output.status,
            stdout,
            stderr,
            duration,
        })
    }
}

/// Truncate output to fit within limits (UTF-8 safe).
fn truncate_output(s: &str) -> String {
    if s.len() <= MAX_OUTPUT_SIZE {
        return s.to_string();
    }
    let half = MAX_OUTPUT_SIZE / 2;
    let head_end = floor_char_boundary(s, half);
    let tail_start = floor_char_boundary(s, s.len() - half);
    format!(
        "{}\n\n... [truncated {} bytes] ...\n\n{}",
        &s[..head_end],
        s.len() - MAX_OUTPUT_SIZE,
        &s[tail_start..]
    )
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> (Invoker, Vec<String>) {
        let invoker = Invoker::new("sh");
        let argv = vec!["-c".to_string(), script.to_string()];
        (invoker, argv)
    }

    #[tokio::test]
    async fn captures_stdout_on_success() {
        let (invoker, argv) = sh("echo '{\"ok\": true}'");
        let outcome = invoker.invoke("test", &argv).await.unwrap();
        assert!(outcome.status.success());
        assert!(outcome.stdout.contains("\"ok\""));
    }

    #[tokio::test]
    async fn missing_program_is_launch_error() {
        let invoker = Invoker::new("/nonexistent/para-binary");
        let err = invoker.invoke("test", &[]).await.unwrap_err();
        assert!(matches!(err, ToolError::Launch { .. }));
    }

    #[tokio::test]
    async fn slow_process_times_out() {
        let (invoker, argv) = sh("sleep 10");
        let invoker = invoker.with_timeout(Duration::from_millis(100));
        let err = invoker.invoke("test", &argv).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    #[tokio::test]
    async fn nonzero_exit_carries_stderr() {
        let (invoker, argv) = sh("echo 'no such project' >&2; exit 3");
        let err = invoker.invoke("test", &argv).await.unwrap_err();
        match err {
            ToolError::ExternalTool { message, .. } => {
                assert!(message.contains("no such project"));
            }
            other => panic!("expected ExternalTool, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_without_stderr_gets_generic_message() {
        let (invoker, argv) = sh("exit 2");
        let err = invoker.invoke("test", &argv).await.unwrap_err();
        match err {
            ToolError::ExternalTool { message, .. } => {
                assert!(message.contains("exited with"));
            }
            other => panic!("expected ExternalTool, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn credential_reaches_child_environment() {
        let (invoker, argv) = sh("printf '%s' \"$TEST_GATEWAY_KEY\"");
        let invoker = invoker.with_credential("TEST_GATEWAY_KEY", "sekrit");
        let outcome = invoker.invoke("test", &argv).await.unwrap();
        assert_eq!(outcome.stdout, "sekrit");
    }

    #[test]
    fn truncation_is_utf8_safe() {
        let s = "é".repeat(MAX_OUTPUT_SIZE);
        let truncated = truncate_output(&s);
        assert!(truncated.len() < s.len());
        assert!(truncated.contains("truncated"));
    }

    #[test]
    fn short_output_is_untouched() {
        assert_eq!(truncate_output("hello"), "hello");
    }
}
