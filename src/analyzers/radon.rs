//! Radon-backed complexity and maintainability scoring
//!
//! Uses radon for Python metrics:
//! - `radon cc --json`: per-block cyclomatic complexity, summed per file
//! - `radon mi --json`: maintainability index (multi-line strings count as comments)

use super::external_tool::run_external_tool;
use super::{ComplexityScorer, MaintainabilityScorer, SourceFile};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value as JsonValue;
use tracing::info;

/// Radon complexity and maintainability scorer
pub struct RadonScorer {
    command: Vec<String>,
    timeout_secs: u64,
}

impl RadonScorer {
    /// Create a scorer invoking `radon` from `PATH`
    pub fn new() -> Self {
        Self {
            command: vec!["radon".to_string()],
            timeout_secs: 60,
        }
    }

    /// Set the command prefix (e.g. `python3 -m radon`)
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    /// Set timeout in seconds
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Run one radon subcommand and return the report entry for the file
    fn run(&self, subcommand: &str, source: SourceFile<'_>) -> Result<JsonValue> {
        let mut cmd = self.command.clone();
        cmd.push(subcommand.to_string());
        cmd.push("--json".to_string());
        cmd.push(source.path.to_string_lossy().to_string());

        let result = run_external_tool(&cmd, "radon", self.timeout_secs, source.path.parent())
            .into_completed()?;

        let report = result.json_output().ok_or_else(|| {
            anyhow!(
                "radon {} produced no JSON report{}",
                subcommand,
                result
                    .stderr_summary()
                    .map(|s| format!(": {}", s))
                    .unwrap_or_default()
            )
        })?;

        file_entry(report).with_context(|| format!("radon {} failed", subcommand))
    }
}

impl Default for RadonScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Radon keys its report by file path; we only ever pass one file
fn file_entry(report: JsonValue) -> Result<JsonValue> {
    let JsonValue::Object(files) = report else {
        bail!("unexpected report shape");
    };
    let entry = files
        .into_iter()
        .next()
        .map(|(_, entry)| entry)
        .ok_or_else(|| anyhow!("report is empty"))?;

    if let Some(err) = entry.get("error").and_then(|e| e.as_str()) {
        bail!("{}", err);
    }
    Ok(entry)
}

/// Sum the complexity of every block in a `radon cc` file entry
fn total_complexity(entry: &JsonValue) -> Result<u32> {
    let blocks = entry
        .as_array()
        .ok_or_else(|| anyhow!("complexity entry is not a list of blocks"))?;

    Ok(blocks
        .iter()
        .filter_map(|b| b.get("complexity").and_then(|c| c.as_u64()))
        .map(|c| c as u32)
        .sum())
}

/// Read the index out of a `radon mi` file entry
fn maintainability_index(entry: &JsonValue) -> Result<f64> {
    entry
        .get("mi")
        .and_then(|m| m.as_f64())
        .ok_or_else(|| anyhow!("maintainability entry has no 'mi' value"))
}

impl ComplexityScorer for RadonScorer {
    fn name(&self) -> &'static str {
        "radon cc"
    }

    fn complexity(&self, source: SourceFile<'_>) -> Result<u32> {
        let entry = self.run("cc", source)?;
        let complexity = total_complexity(&entry)?;
        info!("Complexity calculated: {}", complexity);
        Ok(complexity)
    }
}

impl MaintainabilityScorer for RadonScorer {
    fn name(&self) -> &'static str {
        "radon mi"
    }

    fn maintainability(&self, source: SourceFile<'_>) -> Result<f64> {
        let entry = self.run("mi", source)?;
        let mi = maintainability_index(&entry)?;
        info!("Maintainability calculated: {:.2}", mi);
        Ok(mi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cc_blocks_are_summed() {
        let report = json!({
            "/tmp/upload_x.py": [
                {"type": "function", "name": "f", "complexity": 3, "rank": "A", "lineno": 1},
                {"type": "class", "name": "C", "complexity": 2, "rank": "A", "lineno": 8},
                {"type": "method", "name": "m", "complexity": 1, "rank": "A", "lineno": 9}
            ]
        });
        let entry = file_entry(report).unwrap();
        assert_eq!(total_complexity(&entry).unwrap(), 6);
    }

    #[test]
    fn test_cc_no_blocks_is_zero() {
        let entry = file_entry(json!({"a.py": []})).unwrap();
        assert_eq!(total_complexity(&entry).unwrap(), 0);
    }

    #[test]
    fn test_mi_value() {
        let entry = file_entry(json!({"a.py": {"mi": 71.42, "rank": "A"}})).unwrap();
        assert!((maintainability_index(&entry).unwrap() - 71.42).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_error_entry_fails() {
        let err = file_entry(json!({"a.py": {"error": "invalid syntax (<unknown>, line 1)"}}))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid syntax (<unknown>, line 1)");
    }

    #[test]
    fn test_malformed_reports_fail() {
        assert!(file_entry(json!([])).is_err());
        assert!(file_entry(json!({})).is_err());
        assert!(total_complexity(&json!({"mi": 1.0})).is_err());
        assert!(maintainability_index(&json!([])).is_err());
    }

    #[cfg(unix)]
    fn fake_radon(script: &str) -> RadonScorer {
        RadonScorer::new()
            .with_command(vec!["sh".into(), "-c".into(), script.into(), "radon".into()])
            .with_timeout(1)
    }

    #[cfg(unix)]
    #[test]
    fn test_fake_tool_exit_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.py");
        std::fs::write(&path, "x = 1\n").unwrap();
        let src = SourceFile { path: &path, text: "x = 1\n" };

        // $1 is the radon subcommand
        let scorer = fake_radon(
            r#"if [ "$1" = cc ]; then echo '{"f.py": [{"complexity": 4}, {"complexity": 1}]}'; else echo '{"f.py": {"mi": 55.5}}'; fi"#,
        );
        assert_eq!(scorer.complexity(src).unwrap(), 5);
        assert!((scorer.maintainability(src).unwrap() - 55.5).abs() < f64::EPSILON);

        let err = fake_radon("echo 'not json'; echo 'oops' >&2").complexity(src).unwrap_err();
        assert!(err.to_string().contains("produced no JSON report: oops"));

        let err = fake_radon("sleep 5").maintainability(src).unwrap_err();
        assert!(err.to_string().contains("timed out"));

        let err = fake_radon(r#"echo '{"f.py": {"error": "invalid syntax"}}'"#)
            .complexity(src)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("invalid syntax"));
    }
}
