//! End-to-end analysis of one uploaded file
//!
//! normalize → collect metrics → assemble. Runs synchronously; callers on an
//! async runtime should move it onto a blocking thread.

use crate::analyzers::MetricCollector;
use crate::assembler::{assemble, utc_timestamp};
use crate::models::AnalysisResult;
use crate::normalizer::normalize_bytes;
use tracing::{debug, info};

/// Analyze raw upload bytes under the given file name
pub fn analyze_upload(collector: &MetricCollector, filename: &str, raw: &[u8]) -> AnalysisResult {
    let normalized = normalize_bytes(raw);
    debug!(
        "Normalized {} ({} chars, {} diagnostics)",
        filename,
        normalized.text.chars().count(),
        normalized.diagnostics.len()
    );

    let metrics = collector.collect(&normalized);
    let result = assemble(&normalized.diagnostics, metrics, filename, utc_timestamp());

    info!(
        "Analyzed {}: complexity={} smells={} maintainability={:.1}",
        result.filename, result.complexity, result.smells, result.maintainability
    );
    result
}
