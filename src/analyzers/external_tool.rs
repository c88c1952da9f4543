//! Subprocess plumbing shared by the tool-backed analyzers
//!
//! Every analyzer follows the same pattern:
//! 1. Run the tool as a subprocess with `std::process::Command`
//! 2. Capture stdout/stderr, killing the process if it overruns its timeout
//! 3. Parse the JSON report the tool writes to stdout

use anyhow::{anyhow, Result};
use serde_json::Value as JsonValue;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result from running an external tool
#[derive(Debug, Clone)]
pub struct ExternalToolResult {
    /// Whether the tool ran to completion (it may still have reported findings)
    pub success: bool,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Process exit code
    pub return_code: Option<i32>,
    /// Whether the tool timed out
    pub timed_out: bool,
    /// Error message if failed
    pub error: Option<String>,
}

impl ExternalToolResult {
    /// Create a successful result
    pub fn success(stdout: String, stderr: String, return_code: i32) -> Self {
        Self {
            success: true,
            stdout,
            stderr,
            return_code: Some(return_code),
            timed_out: false,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            return_code: None,
            timed_out: false,
            error: Some(error),
        }
    }

    /// Create a timeout result
    pub fn timeout(tool_name: &str, timeout_secs: u64) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            return_code: None,
            timed_out: true,
            error: Some(format!("{} timed out after {}s", tool_name, timeout_secs)),
        }
    }

    /// Turn a failed run into an error, passing successful runs through
    pub fn into_completed(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(anyhow!(self
                .error
                .unwrap_or_else(|| "tool did not complete".to_string())))
        }
    }

    /// Parse stdout as JSON
    pub fn json_output(&self) -> Option<JsonValue> {
        if self.stdout.trim().is_empty() {
            return None;
        }
        serde_json::from_str(&self.stdout).ok()
    }

    /// Parse stdout as JSON array
    pub fn json_array(&self) -> Option<Vec<JsonValue>> {
        self.json_output().and_then(|v| v.as_array().cloned())
    }

    /// First non-empty stderr line, for error messages
    pub fn stderr_summary(&self) -> Option<&str> {
        self.stderr.lines().map(str::trim).find(|l| !l.is_empty())
    }
}

/// Run an external tool with standard error handling
///
/// # Arguments
/// * `cmd` - Command and arguments to run
/// * `tool_name` - Human-readable tool name for error messages
/// * `timeout_secs` - Timeout in seconds (0 = no timeout)
/// * `cwd` - Working directory for the tool
pub fn run_external_tool(
    cmd: &[String],
    tool_name: &str,
    timeout_secs: u64,
    cwd: Option<&Path>,
) -> ExternalToolResult {
    let Some((program, args)) = cmd.split_first() else {
        return ExternalToolResult::failure("Empty command".to_string());
    };

    debug!("Running {}: {} {:?}", tool_name, program, args);

    let mut command = Command::new(program);
    command.args(args);

    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                return ExternalToolResult::failure(format!(
                    "{} not found. Please install it first.",
                    tool_name
                ));
            }
            return ExternalToolResult::failure(format!("Failed to run {}: {}", tool_name, e));
        }
    };

    if timeout_secs > 0 {
        run_with_timeout(child, tool_name, timeout_secs)
    } else {
        run_without_timeout(child, tool_name)
    }
}

/// Run process without timeout
fn run_without_timeout(child: Child, tool_name: &str) -> ExternalToolResult {
    let output = match child.wait_with_output() {
        Ok(output) => output,
        Err(e) => {
            return ExternalToolResult::failure(format!("Failed to wait for {}: {}", tool_name, e));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let return_code = output.status.code().unwrap_or(-1);

    ExternalToolResult::success(stdout, stderr, return_code)
}

/// Drain a pipe on its own thread so a chatty tool cannot fill the pipe
/// buffer and stall while we poll for its exit
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Run process with timeout
fn run_with_timeout(mut child: Child, tool_name: &str, timeout_secs: u64) -> ExternalToolResult {
    let start = Instant::now();
    let timeout = Duration::from_secs(timeout_secs);

    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout = stdout_reader.join().unwrap_or_default();
                let stderr = stderr_reader.join().unwrap_or_default();
                return ExternalToolResult::success(stdout, stderr, status.code().unwrap_or(-1));
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!("{} timed out after {}s", tool_name, timeout_secs);
                    return ExternalToolResult::timeout(tool_name, timeout_secs);
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                let _ = child.kill();
                return ExternalToolResult::failure(format!(
                    "Failed to wait for {}: {}",
                    tool_name, e
                ));
            }
        }
    }
}

/// Check if a tool command is runnable (`<cmd> --version` exits cleanly)
pub fn is_tool_installed(cmd: &[String]) -> bool {
    let Some((program, args)) = cmd.split_first() else {
        return false;
    };
    Command::new(program)
        .args(args)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_tool_result() {
        let result = ExternalToolResult::success("output".into(), "".into(), 0);
        assert!(result.success);
        assert_eq!(result.stdout, "output");

        let result = ExternalToolResult::failure("error".into());
        assert!(!result.success);
        assert_eq!(result.error, Some("error".into()));
        assert_eq!(result.into_completed().unwrap_err().to_string(), "error");

        let result = ExternalToolResult::timeout("radon", 60);
        assert!(result.timed_out);
        assert_eq!(result.error.as_deref(), Some("radon timed out after 60s"));
    }

    #[test]
    fn test_json_parsing() {
        let result = ExternalToolResult::success(r#"{"key": "value"}"#.into(), "".into(), 0);
        let json = result.json_output().unwrap();
        assert_eq!(json["key"], "value");

        let result = ExternalToolResult::success(r#"[1, 2, 3]"#.into(), "".into(), 0);
        let arr = result.json_array().unwrap();
        assert_eq!(arr.len(), 3);

        let result = ExternalToolResult::success("  \n".into(), "".into(), 0);
        assert!(result.json_output().is_none());
    }

    #[test]
    fn test_stderr_summary_skips_blank_lines() {
        let result = ExternalToolResult::success(
            String::new(),
            "\n  \nusage: pylint [options]\nmore".into(),
            32,
        );
        assert_eq!(result.stderr_summary(), Some("usage: pylint [options]"));
    }

    #[test]
    fn test_missing_tool_reports_not_found() {
        let cmd = vec!["definitely-not-a-real-tool-4f1c".to_string()];
        let result = run_external_tool(&cmd, "ghost", 5, None);
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("ghost not found. Please install it first.")
        );
        assert!(!is_tool_installed(&cmd));
    }

    #[test]
    fn test_empty_command() {
        let result = run_external_tool(&[], "nothing", 0, None);
        assert_eq!(result.error.as_deref(), Some("Empty command"));
        assert!(!is_tool_installed(&[]));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_output_with_timeout() {
        let cmd = vec!["sh".to_string(), "-c".to_string(), "echo out; echo err 1>&2".to_string()];
        let result = run_external_tool(&cmd, "sh", 10, None);
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
        assert_eq!(result.return_code, Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_process() {
        let cmd = vec!["sleep".to_string(), "5".to_string()];
        let result = run_external_tool(&cmd, "sleep", 1, None);
        assert!(result.timed_out);
        assert!(!result.success);
    }
}
