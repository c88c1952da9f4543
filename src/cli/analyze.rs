//! Analyze command - run the analysis pipeline on one local file

use crate::analyzers::{build_collector, check_tools};
use crate::config::ServiceConfig;
use crate::pipeline::analyze_upload;
use crate::store::{open_sink, persist};
use anyhow::{Context, Result};
use std::path::Path;

/// Analyze `file` and print the result as pretty JSON
pub fn run(config: &ServiceConfig, file: &Path, store: bool) -> Result<()> {
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file name: {}", file.display()))?;

    let extension = config.server.source_extension();
    if !filename.ends_with(extension) {
        anyhow::bail!("Only {} files are supported", extension);
    }

    let raw = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    check_tools(&config.analysis);
    let collector = build_collector(&config.analysis);
    let result = analyze_upload(&collector, filename, &raw);

    if store {
        super::runtime()?.block_on(async {
            let sink = open_sink(&config.store).await;
            persist(sink.as_ref(), &result).await;
        });
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
