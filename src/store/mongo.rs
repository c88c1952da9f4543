//! MongoDB-backed result sink

use super::ReportSink;
use crate::config::StoreSettings;
use crate::models::AnalysisResult;
use anyhow::{Context, Result};
use async_trait::async_trait;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use std::time::Duration;
use tracing::debug;

/// Appends each result as one document to a collection
pub struct MongoSink {
    collection: Collection<AnalysisResult>,
}

impl MongoSink {
    /// Build a client for the configured deployment
    ///
    /// The driver connects lazily, so this only fails on a malformed URI;
    /// an unreachable server shows up as a failed [`ReportSink::store`].
    pub async fn connect(settings: &StoreSettings) -> Result<Self> {
        let mut options = ClientOptions::parse(settings.uri())
            .await
            .with_context(|| format!("invalid MongoDB URI '{}'", settings.uri()))?;

        let timeout = Duration::from_secs(settings.timeout_secs());
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options).context("failed to build MongoDB client")?;
        let collection = client
            .database(settings.database())
            .collection::<AnalysisResult>(settings.collection());

        Ok(Self { collection })
    }
}

#[async_trait]
impl ReportSink for MongoSink {
    fn name(&self) -> &str {
        "mongodb"
    }

    async fn store(&self, report: AnalysisResult) -> Result<()> {
        let inserted = self
            .collection
            .insert_one(&report)
            .await
            .context("insert_one failed")?;
        debug!("Stored result for {} as {:?}", report.filename, inserted.inserted_id);
        Ok(())
    }
}
