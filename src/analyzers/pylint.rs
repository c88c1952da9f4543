//! Pylint-backed code smell linter
//!
//! Runs pylint with its JSON reporter on top of the default checks, with a
//! fixed set of extra checks enabled and two noisy ones disabled.

use super::external_tool::{run_external_tool, ExternalToolResult};
use super::{SmellLinter, SourceFile};
use anyhow::{anyhow, bail, Result};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

/// Checks enabled on top of pylint's defaults
pub const DEFAULT_ENABLE: &[&str] = &[
    "missing-function-docstring",
    "unused-variable",
    "unused-import",
    "invalid-name",
];

/// Checks switched off
pub const DEFAULT_DISABLE: &[&str] = &["missing-module-docstring", "too-few-public-methods"];

/// Empty rcfile so no pylintrc, pyproject.toml or `PYLINTRC` is consulted
#[cfg(unix)]
const EMPTY_RCFILE: &str = "/dev/null";
#[cfg(windows)]
const EMPTY_RCFILE: &str = "NUL";

/// Pylint code smell linter
pub struct PylintLinter {
    command: Vec<String>,
    timeout_secs: u64,
    enable: Vec<String>,
    disable: Vec<String>,
}

impl PylintLinter {
    /// Create a linter invoking `pylint` from `PATH`
    pub fn new() -> Self {
        Self {
            command: vec!["pylint".to_string()],
            timeout_secs: 60,
            enable: DEFAULT_ENABLE.iter().map(|s| s.to_string()).collect(),
            disable: DEFAULT_DISABLE.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Set the command prefix (e.g. `python3 -m pylint`)
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    /// Set timeout in seconds
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Replace the extra checks to enable
    pub fn with_enable(mut self, rules: Vec<String>) -> Self {
        self.enable = rules;
        self
    }

    /// Replace the checks to disable
    pub fn with_disable(mut self, rules: Vec<String>) -> Self {
        self.disable = rules;
        self
    }

    fn build_command(&self, source: SourceFile<'_>) -> Vec<String> {
        let mut cmd = self.command.clone();
        cmd.push("--output-format=json".to_string());
        cmd.push("--persistent=n".to_string());
        cmd.push(format!("--rcfile={}", EMPTY_RCFILE));

        if !self.enable.is_empty() {
            cmd.push(format!("--enable={}", self.enable.join(",")));
        }
        if !self.disable.is_empty() {
            cmd.push(format!("--disable={}", self.disable.join(",")));
        }

        cmd.push(source.path.to_string_lossy().to_string());
        cmd
    }

    /// Extract findings from a completed pylint run
    ///
    /// Pylint exits non-zero whenever it reports anything, so the exit code
    /// only matters when nothing was written to stdout. The JSON reporter
    /// always prints at least `[]`; empty stdout is a clean run only when
    /// pylint exited 0 and said nothing on stderr.
    fn parse_report(result: ExternalToolResult) -> Result<Vec<JsonValue>> {
        let result = result.into_completed()?;

        if result.stdout.trim().is_empty() {
            let code = result.return_code.unwrap_or(0);
            if let Some(summary) = result.stderr_summary() {
                bail!("{}", summary);
            }
            if code != 0 {
                bail!("pylint exited with status {} and produced no report", code);
            }
            return Ok(Vec::new());
        }

        result
            .json_array()
            .ok_or_else(|| anyhow!("unexpected pylint output: not a JSON array"))
    }
}

impl Default for PylintLinter {
    fn default() -> Self {
        Self::new()
    }
}

impl SmellLinter for PylintLinter {
    fn name(&self) -> &'static str {
        "pylint"
    }

    fn lint(&self, source: SourceFile<'_>) -> Result<Vec<JsonValue>> {
        let cmd = self.build_command(source);
        let result = run_external_tool(&cmd, "pylint", self.timeout_secs, source.path.parent());
        debug!("pylint raw output: {}", result.stdout);

        let findings = Self::parse_report(result)?;
        info!("pylint reported {} messages", findings.len());
        Ok(findings)
    }
}
