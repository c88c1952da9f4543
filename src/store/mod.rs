//! Persistence of analysis results
//!
//! Results are appended to a document store on a best-effort basis: the
//! HTTP layer logs a failed write and carries on. The sink is built once at
//! startup and shared through the router state.

mod mongo;

pub use mongo::MongoSink;

use crate::config::StoreSettings;
use crate::models::AnalysisResult;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Write-only destination for analysis results
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Name of this sink (for logging)
    fn name(&self) -> &str;

    /// Append one result; the sink receives its own copy
    async fn store(&self, report: AnalysisResult) -> Result<()>;
}

/// Sink that drops everything, used when persistence is disabled
#[derive(Debug, Default)]
pub struct DiscardSink;

#[async_trait]
impl ReportSink for DiscardSink {
    fn name(&self) -> &str {
        "discard"
    }

    async fn store(&self, _report: AnalysisResult) -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps results in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<AnalysisResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far
    pub fn reports(&self) -> Vec<AnalysisResult> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReportSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn store(&self, report: AnalysisResult) -> Result<()> {
        self.reports
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink lock poisoned"))?
            .push(report);
        Ok(())
    }
}

/// Build the sink described by the store settings
///
/// A store that cannot be configured is logged and replaced by
/// [`DiscardSink`] so the service still starts.
pub async fn open_sink(settings: &StoreSettings) -> Arc<dyn ReportSink> {
    if !settings.enabled() {
        info!("Result persistence disabled");
        return Arc::new(DiscardSink);
    }

    match MongoSink::connect(settings).await {
        Ok(sink) => {
            info!(
                "Persisting results to {}.{}",
                settings.database(),
                settings.collection()
            );
            Arc::new(sink)
        }
        Err(e) => {
            warn!("MongoDB unavailable, results will not be stored: {:#}", e);
            Arc::new(DiscardSink)
        }
    }
}

/// Store a copy of the result, logging instead of failing
pub async fn persist(sink: &dyn ReportSink, result: &AnalysisResult) {
    if let Err(e) = sink.store(result.clone()).await {
        warn!("Failed to store result in {}: {:#}", sink.name(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Diagnostic;

    fn result() -> AnalysisResult {
        AnalysisResult {
            complexity: 2,
            smells: 1,
            smell_details: vec![Diagnostic::warning("w", 3)],
            maintainability: 90.0,
            filename: "a.py".to_string(),
            timestamp: "2024-01-01T00:00:00.000000".to_string(),
        }
    }

    struct BrokenSink;

    #[async_trait]
    impl ReportSink for BrokenSink {
        fn name(&self) -> &str {
            "broken"
        }

        async fn store(&self, _report: AnalysisResult) -> Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn test_memory_sink_keeps_copies() {
        let sink = MemorySink::new();
        let mut original = result();
        persist(&sink, &original).await;
        original.smell_details.clear();

        let stored = sink.reports();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].smell_details.len(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        persist(&BrokenSink, &result()).await;
        persist(&DiscardSink, &result()).await;
    }

    #[tokio::test]
    async fn test_disabled_store_discards() {
        let settings: StoreSettings = toml::from_str("enabled = false").unwrap();
        let sink = open_sink(&settings).await;
        assert_eq!(sink.name(), "discard");
    }
}
