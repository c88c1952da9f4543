//! Report command - render a PDF from a report request file

use crate::models::ReportRequest;
use crate::report::render_report;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

fn read_request(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read report request from stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Render the report described by `request` and write the PDF
pub fn run(request: &Path, output: Option<&Path>) -> Result<()> {
    let json = read_request(request)?;
    let req: ReportRequest =
        serde_json::from_str(&json).context("Report request is not valid JSON")?;

    let pdf = render_report(&req).context("Failed to generate PDF")?;

    let out = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(req.pdf_filename()));
    std::fs::write(&out, &pdf).with_context(|| format!("Failed to write {}", out.display()))?;

    println!("Wrote {} ({} bytes)", out.display(), pdf.len());
    Ok(())
}
