//! Shapes normalizer diagnostics and collected metrics into an [`AnalysisResult`]

use crate::analyzers::CollectedMetrics;
use crate::models::{AnalysisResult, Diagnostic, DiagnosticKind};
use chrono::Utc;
use serde_json::Value as JsonValue;

/// How many linter findings make it into a result
pub const MAX_COLLECTED_SMELLS: usize = 3;

/// Current UTC time as an offset-less ISO-8601 string with microseconds
pub fn utc_timestamp() -> String {
    Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Coerce one raw finding into a [`Diagnostic`]
///
/// Missing fields fall back to the raw entry as message, `unknown` type and
/// line 0.
pub fn to_diagnostic(raw: &JsonValue) -> Diagnostic {
    let message = match raw.get("message") {
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => match raw {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        },
    };

    let kind = match raw.get("type") {
        Some(JsonValue::String(s)) => DiagnosticKind::parse(s),
        _ => DiagnosticKind::Unknown,
    };

    let line = match raw.get("line") {
        Some(JsonValue::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(JsonValue::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(0);

    Diagnostic::new(kind, message, line)
}

/// Build the final result for one file
///
/// `smell_details` lists every normalizer diagnostic followed by at most
/// [`MAX_COLLECTED_SMELLS`] linter findings; `smells` is its length.
pub fn assemble(
    normalizer_diagnostics: &[Diagnostic],
    metrics: CollectedMetrics,
    filename: impl Into<String>,
    timestamp: impl Into<String>,
) -> AnalysisResult {
    let smell_details: Vec<Diagnostic> = normalizer_diagnostics
        .iter()
        .cloned()
        .chain(
            metrics
                .smells
                .iter()
                .take(MAX_COLLECTED_SMELLS)
                .map(to_diagnostic),
        )
        .collect();

    AnalysisResult {
        complexity: metrics.complexity,
        smells: smell_details.len(),
        smell_details,
        maintainability: metrics.maintainability,
        filename: filename.into(),
        timestamp: timestamp.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metrics(smells: Vec<JsonValue>) -> CollectedMetrics {
        CollectedMetrics {
            complexity: 5,
            smells,
            maintainability: 64.0,
        }
    }

    #[test]
    fn test_collector_findings_are_capped() {
        let raw: Vec<JsonValue> = (1..=6)
            .map(|i| json!({"message": format!("m{}", i), "type": "convention", "line": i}))
            .collect();
        let diags = vec![Diagnostic::info("Line endings normalized (CRLF or CR to LF)", 0)];
        let result = assemble(&diags, metrics(raw), "a.py", "2024-01-01T00:00:00.000000");

        assert_eq!(result.smell_details.len(), 4);
        assert_eq!(result.smells, result.smell_details.len());
        assert_eq!(result.smell_details[0], diags[0]);
        assert_eq!(result.smell_details[3].message, "m3");
        assert_eq!(result.smell_details[3].line, 3);
    }

    #[test]
    fn test_all_normalizer_diagnostics_are_kept() {
        let diags: Vec<Diagnostic> = (0..5)
            .map(|i| Diagnostic::warning(format!("w{}", i), i + 1))
            .collect();
        let result = assemble(&diags, metrics(vec![]), "a.py", "t");
        assert_eq!(result.smells, 5);
        assert!(result.smells <= diags.len() + MAX_COLLECTED_SMELLS);
    }

    #[test]
    fn test_defensive_defaults() {
        let d = to_diagnostic(&json!({"symbol": "unused-import"}));
        assert_eq!(d.message, r#"{"symbol":"unused-import"}"#);
        assert_eq!(d.kind, DiagnosticKind::Unknown);
        assert_eq!(d.line, 0);

        let d = to_diagnostic(&json!("bare string finding"));
        assert_eq!(d.message, "bare string finding");

        let d = to_diagnostic(&json!({"message": "m", "type": "refactor", "line": "12"}));
        assert_eq!(d.kind, DiagnosticKind::Refactor);
        assert_eq!(d.line, 12);
    }

    #[test]
    fn test_metrics_carry_over() {
        let result = assemble(&[], metrics(vec![]), "demo.py", "t");
        assert_eq!(result.complexity, 5);
        assert_eq!(result.maintainability, 64.0);
        assert_eq!(result.filename, "demo.py");
        assert_eq!(result.smells, 0);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = utc_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
        assert_eq!(ts.split('.').nth(1).map(str::len), Some(6));
    }
}
