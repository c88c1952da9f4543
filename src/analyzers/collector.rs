//! Runs the three analyses and degrades each failure on its own

use super::{ComplexityScorer, MaintainabilityScorer, SmellLinter, SourceFile};
use crate::normalizer::Normalized;
use anyhow::{anyhow, Result};
use serde_json::{json, Value as JsonValue};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

const SCRATCH_FILE: &str = "upload.py";

/// Raw output of the three analyses
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedMetrics {
    pub complexity: u32,
    /// Raw lint findings, in the order the linter reported them
    pub smells: Vec<JsonValue>,
    pub maintainability: f64,
}

/// Example findings shown when the linter has nothing to say
pub fn placeholder_smells() -> Vec<JsonValue> {
    vec![
        json!({"message": "Missing function docstring", "type": "convention", "line": 1}),
        json!({"message": "Unused variable 'i'", "type": "warning", "line": 4}),
    ]
}

/// Drives the complexity, smell and maintainability analyses
#[derive(Clone)]
pub struct MetricCollector {
    complexity: Arc<dyn ComplexityScorer>,
    linter: Arc<dyn SmellLinter>,
    maintainability: Arc<dyn MaintainabilityScorer>,
    placeholder_findings: bool,
}

impl MetricCollector {
    pub fn new(
        complexity: Arc<dyn ComplexityScorer>,
        linter: Arc<dyn SmellLinter>,
        maintainability: Arc<dyn MaintainabilityScorer>,
    ) -> Self {
        Self {
            complexity,
            linter,
            maintainability,
            placeholder_findings: true,
        }
    }

    /// Whether to substitute [`placeholder_smells`] for an empty lint report
    pub fn with_placeholder_findings(mut self, enabled: bool) -> Self {
        self.placeholder_findings = enabled;
        self
    }

    /// Run every analysis against the normalized text
    ///
    /// Never fails. The text is written to one file in a private temp
    /// directory shared by all analyzers; the directory is removed before
    /// returning.
    pub fn collect(&self, normalized: &Normalized) -> CollectedMetrics {
        let scratch = write_scratch(&normalized.text);
        let text = normalized.text.as_str();

        let complexity = match with_source(&scratch, text, |src| self.complexity.complexity(src)) {
            Ok(v) => v,
            Err(e) => {
                warn!("Complexity error ({}): {:#}", self.complexity.name(), e);
                0
            }
        };

        let mut smells = match with_source(&scratch, text, |src| self.linter.lint(src)) {
            Ok(findings) => findings,
            Err(e) => {
                warn!("Pylint error ({}): {:#}", self.linter.name(), e);
                vec![json!({
                    "message": format!("Pylint error: {}", e),
                    "type": "error",
                    "line": 0,
                })]
            }
        };

        if smells.is_empty() && self.placeholder_findings && !normalized.has_error() {
            info!("No lint findings; substituting placeholder smells");
            smells = placeholder_smells();
        }

        let maintainability =
            match with_source(&scratch, text, |src| self.maintainability.maintainability(src)) {
                Ok(v) => v,
                Err(e) => {
                    warn!(
                        "Maintainability error ({}): {:#}",
                        self.maintainability.name(),
                        e
                    );
                    0.0
                }
            };

        drop(scratch);

        CollectedMetrics {
            complexity,
            smells,
            maintainability,
        }
    }
}

/// Request-private directory holding the source file
struct Scratch {
    _dir: TempDir,
    path: PathBuf,
}

/// Hand the scratch file to one analysis, or fail that analysis alone if
/// the file could not be written
fn with_source<T>(
    scratch: &Result<Scratch, String>,
    text: &str,
    analyze: impl FnOnce(SourceFile<'_>) -> Result<T>,
) -> Result<T> {
    match scratch {
        Ok(scratch) => analyze(SourceFile {
            path: &scratch.path,
            text,
        }),
        Err(e) => Err(anyhow!("{}", e)),
    }
}

/// Write the text to `upload.py` in a fresh directory readable only by
/// this user
fn write_scratch(text: &str) -> Result<Scratch, String> {
    let dir = tempfile::Builder::new()
        .prefix("upload_")
        .tempdir()
        .map_err(|e| format!("failed to create temp dir: {}", e))?;
    let path = dir.path().join(SCRATCH_FILE);
    std::fs::write(&path, text).map_err(|e| format!("failed to write temp file: {}", e))?;
    debug!("Wrote {} bytes to {:?}", text.len(), path);
    Ok(Scratch { _dir: dir, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use anyhow::bail;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct FixedComplexity(Result<u32, &'static str>);

    impl ComplexityScorer for FixedComplexity {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn complexity(&self, _source: SourceFile<'_>) -> Result<u32> {
            match self.0 {
                Ok(v) => Ok(v),
                Err(e) => bail!(e),
            }
        }
    }

    struct FixedMaintainability(Result<f64, &'static str>);

    impl MaintainabilityScorer for FixedMaintainability {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn maintainability(&self, _source: SourceFile<'_>) -> Result<f64> {
            match self.0 {
                Ok(v) => Ok(v),
                Err(e) => bail!(e),
            }
        }
    }

    /// Records what it was shown, then returns a canned report
    struct RecordingLinter {
        findings: Result<Vec<JsonValue>, &'static str>,
        seen: Mutex<Option<(PathBuf, String, String)>>,
    }

    impl RecordingLinter {
        fn new(findings: Result<Vec<JsonValue>, &'static str>) -> Self {
            Self {
                findings,
                seen: Mutex::new(None),
            }
        }
    }

    impl SmellLinter for RecordingLinter {
        fn name(&self) -> &'static str {
            "recording"
        }
        fn lint(&self, source: SourceFile<'_>) -> Result<Vec<JsonValue>> {
            let on_disk = std::fs::read_to_string(source.path)?;
            *self.seen.lock().unwrap() =
                Some((source.path.to_path_buf(), source.text.to_string(), on_disk));
            match &self.findings {
                Ok(f) => Ok(f.clone()),
                Err(e) => bail!(*e),
            }
        }
    }

    fn collector(linter: Arc<RecordingLinter>) -> MetricCollector {
        MetricCollector::new(
            Arc::new(FixedComplexity(Ok(4))),
            linter,
            Arc::new(FixedMaintainability(Ok(72.5))),
        )
    }

    #[test]
    fn test_findings_pass_through() {
        let finding = json!({"message": "Unused import os", "type": "warning", "line": 1});
        let linter = Arc::new(RecordingLinter::new(Ok(vec![finding.clone()])));
        let metrics = collector(linter).collect(&normalize("import os\n"));
        assert_eq!(metrics.complexity, 4);
        assert_eq!(metrics.smells, vec![finding]);
        assert_eq!(metrics.maintainability, 72.5);
    }

    #[test]
    fn test_scratch_file_holds_normalized_text_and_is_removed() {
        let linter = Arc::new(RecordingLinter::new(Ok(vec![])));
        collector(linter.clone()).collect(&normalize("a = 1\r\nb = 2\r\n"));

        let (path, text, on_disk) = linter.seen.lock().unwrap().take().unwrap();
        assert_eq!(text, "a = 1\nb = 2\n");
        assert_eq!(on_disk, text);
        assert_eq!(path.file_name().and_then(|e| e.to_str()), Some("upload.py"));
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
    }

    #[test]
    fn test_lint_failure_becomes_single_error() {
        let linter = Arc::new(RecordingLinter::new(Err("pylint not found. Please install it first.")));
        let metrics = collector(linter).collect(&normalize("x = 1\n"));
        assert_eq!(metrics.smells.len(), 1);
        assert_eq!(metrics.smells[0]["type"], "error");
        assert_eq!(
            metrics.smells[0]["message"],
            "Pylint error: pylint not found. Please install it first."
        );
        assert_eq!(metrics.complexity, 4);
        assert_eq!(metrics.maintainability, 72.5);
    }

    #[test]
    fn test_numeric_failures_degrade_to_zero() {
        let linter = Arc::new(RecordingLinter::new(Ok(vec![json!({"message": "m"})])));
        let metrics = MetricCollector::new(
            Arc::new(FixedComplexity(Err("invalid syntax"))),
            linter,
            Arc::new(FixedMaintainability(Err("invalid syntax"))),
        )
        .collect(&normalize("def (:\n"));
        assert_eq!(metrics.complexity, 0);
        assert_eq!(metrics.maintainability, 0.0);
        assert_eq!(metrics.smells.len(), 1);
    }

    #[test]
    fn test_empty_report_gets_placeholders() {
        let linter = Arc::new(RecordingLinter::new(Ok(vec![])));
        let metrics = collector(linter).collect(&normalize("x = 1\n"));
        assert_eq!(metrics.smells, placeholder_smells());
    }

    #[test]
    fn test_no_placeholders_after_normalizer_error() {
        let linter = Arc::new(RecordingLinter::new(Ok(vec![])));
        let normalized = crate::normalizer::normalize_bytes(b"x = '\xff'\n");
        let metrics = collector(linter).collect(&normalized);
        assert!(metrics.smells.is_empty());
    }

    #[test]
    fn test_placeholders_can_be_disabled() {
        let linter = Arc::new(RecordingLinter::new(Ok(vec![])));
        let metrics = collector(linter)
            .with_placeholder_findings(false)
            .collect(&normalize("x = 1\n"));
        assert!(metrics.smells.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_scratch_directory_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let scratch = write_scratch("x = 1\n").unwrap();
        let dir = scratch.path.parent().unwrap().to_path_buf();
        let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);

        drop(scratch);
        assert!(!dir.exists());
    }
}
