//! Core data models for the code quality service
//!
//! These models travel between the analysis pipeline, the HTTP layer,
//! the document store and the PDF renderer.
//!
//! On the wire every [`Diagnostic`] field is a string (`"line": "3"`), which
//! is the shape the frontend stores and later sends back in a
//! [`ReportRequest`]. Deserialization therefore accepts both numbers and
//! numeric strings for `line`.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Kind of a diagnostic, following pylint's message categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiagnosticKind {
    Info,
    Warning,
    Error,
    Convention,
    Refactor,
    Fatal,
    #[default]
    Unknown,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Info => "info",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Error => "error",
            DiagnosticKind::Convention => "convention",
            DiagnosticKind::Refactor => "refactor",
            DiagnosticKind::Fatal => "fatal",
            DiagnosticKind::Unknown => "unknown",
        }
    }

    /// Parse a type string; anything unrecognised is `Unknown`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "info" => DiagnosticKind::Info,
            "warning" => DiagnosticKind::Warning,
            "error" => DiagnosticKind::Error,
            "convention" => DiagnosticKind::Convention,
            "refactor" => DiagnosticKind::Refactor,
            "fatal" => DiagnosticKind::Fatal,
            _ => DiagnosticKind::Unknown,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DiagnosticKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DiagnosticKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match raw {
            serde_json::Value::String(s) => DiagnosticKind::parse(&s),
            _ => DiagnosticKind::Unknown,
        })
    }
}

/// A single finding: an encoding issue from the normalizer or a lint message
///
/// `line == 0` means the diagnostic is not tied to a specific line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: DiagnosticKind,
    #[serde(
        default,
        serialize_with = "serialize_line",
        deserialize_with = "deserialize_line"
    )]
    pub line: u32,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            kind,
            line,
        }
    }

    pub fn info(message: impl Into<String>, line: u32) -> Self {
        Self::new(DiagnosticKind::Info, message, line)
    }

    pub fn warning(message: impl Into<String>, line: u32) -> Self {
        Self::new(DiagnosticKind::Warning, message, line)
    }

    pub fn error(message: impl Into<String>, line: u32) -> Self {
        Self::new(DiagnosticKind::Error, message, line)
    }

    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }
}

fn serialize_line<S: Serializer>(line: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(line)
}

fn deserialize_line<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    match raw {
        serde_json::Value::Number(n) => Ok(n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)),
        serde_json::Value::String(s) => Ok(s.trim().parse().unwrap_or(0)),
        _ => Ok(0),
    }
}

/// The outcome of analysing one uploaded file
///
/// Assembled once per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub complexity: u32,
    pub smells: usize,
    pub smell_details: Vec<Diagnostic>,
    pub maintainability: f64,
    pub filename: String,
    pub timestamp: String,
}

/// Payload of the PDF report endpoint
///
/// Usually an [`AnalysisResult`] echoed back by the frontend together with a
/// rendering of the metrics chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(default = "default_report_name")]
    pub filename: String,
    #[serde(default)]
    pub complexity: u32,
    #[serde(default)]
    pub smells: usize,
    #[serde(default)]
    pub maintainability: f64,
    #[serde(default)]
    pub smell_details: Vec<Diagnostic>,
    /// Base64 PNG, optionally prefixed with a `data:` URI header
    #[serde(default)]
    pub chart_image: String,
}

fn default_report_name() -> String {
    "report".to_string()
}

impl ReportRequest {
    /// Name of the generated PDF
    pub fn pdf_filename(&self) -> String {
        format!("{}_analysis.pdf", self.filename)
    }
}

impl From<&AnalysisResult> for ReportRequest {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            filename: result.filename.clone(),
            complexity: result.complexity,
            smells: result.smells,
            maintainability: result.maintainability,
            smell_details: result.smell_details.clone(),
            chart_image: String::new(),
        }
    }
}
