//! Metric collection for uploaded source files
//!
//! Three independent analyses run against the normalized text:
//! - cyclomatic complexity ([`ComplexityScorer`], backed by `radon cc`)
//! - lint-style code smells ([`SmellLinter`], backed by `pylint`)
//! - maintainability index ([`MaintainabilityScorer`], backed by `radon mi`)
//!
//! Each analysis returns its own `Result`; [`MetricCollector`] degrades a
//! failed step to a neutral value and always runs all three.

mod collector;
pub mod external_tool;
mod pylint;
mod radon;

pub use collector::{placeholder_smells, CollectedMetrics, MetricCollector};
pub use pylint::PylintLinter;
pub use radon::RadonScorer;

use crate::config::AnalysisSettings;
use anyhow::Result;
use external_tool::is_tool_installed;
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// A normalized source file as seen by the analyzers
///
/// `path` points at a request-scoped temp file holding exactly `text`.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub path: &'a Path,
    pub text: &'a str,
}

/// Computes the total cyclomatic complexity of a file
pub trait ComplexityScorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Sum of the complexity of every block in the file
    fn complexity(&self, source: SourceFile<'_>) -> Result<u32>;
}

/// Produces lint findings for a file
pub trait SmellLinter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw findings, one JSON object per message
    fn lint(&self, source: SourceFile<'_>) -> Result<Vec<JsonValue>>;
}

/// Computes the maintainability index of a file
pub trait MaintainabilityScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn maintainability(&self, source: SourceFile<'_>) -> Result<f64>;
}

/// Build the pylint/radon-backed collector described by the settings
pub fn build_collector(settings: &AnalysisSettings) -> MetricCollector {
    let timeout = settings.timeout_secs();

    let mut linter = PylintLinter::new()
        .with_command(settings.pylint_command())
        .with_timeout(timeout);
    if let Some(enable) = &settings.pylint_enable {
        linter = linter.with_enable(enable.clone());
    }
    if let Some(disable) = &settings.pylint_disable {
        linter = linter.with_disable(disable.clone());
    }

    let radon = Arc::new(
        RadonScorer::new()
            .with_command(settings.radon_command())
            .with_timeout(timeout),
    );

    MetricCollector::new(radon.clone(), Arc::new(linter), radon)
        .with_placeholder_findings(settings.placeholder_findings())
}

/// Warn about analyzer commands that cannot be run
///
/// Returns the names of the missing tools.
pub fn check_tools(settings: &AnalysisSettings) -> Vec<&'static str> {
    let mut missing = Vec::new();
    for (name, cmd) in [
        ("pylint", settings.pylint_command()),
        ("radon", settings.radon_command()),
    ] {
        if !is_tool_installed(&cmd) {
            warn!(
                "{} is not runnable as `{}`; its metric will be degraded",
                name,
                cmd.join(" ")
            );
            missing.push(name);
        }
    }
    missing
}
