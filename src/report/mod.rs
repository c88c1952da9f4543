//! PDF analysis reports
//!
//! A report has a fixed structure:
//! - title
//! - "Summary" table with the headline metrics
//! - "Code Smells" table, or a note when there are none
//! - "Metrics Chart" with the client-rendered chart image, or a note when
//!   there is no chart
//!
//! Everything is rendered in memory; no temporary files are written.

pub mod chart;
pub mod fonts;
pub mod layout;

use crate::models::ReportRequest;
use anyhow::Result;
use fonts::Font;
use layout::{Document, TableStyle, TextStyle, INCH};

pub const REPORT_TITLE: &str = "Code Quality Analysis Report";
pub const NO_SMELLS_TEXT: &str = "No code smells detected.";
pub const NO_CHART_TEXT: &str = "Chart image not available.";

const SUMMARY_WIDTHS: [f32; 2] = [2.0 * INCH, 4.0 * INCH];
const SMELL_WIDTHS: [f32; 3] = [1.5 * INCH, 3.5 * INCH, 1.0 * INCH];
const CHART_WIDTH: f32 = 6.0 * INCH;
const CHART_HEIGHT: f32 = 3.0 * INCH;

fn body() -> TextStyle {
    TextStyle::new(Font::Regular, 10.0)
}

fn heading(doc: &mut Document, text: &str) {
    doc.space(12.0);
    doc.paragraph(text, TextStyle::new(Font::Bold, 14.0));
    doc.space(6.0);
}

fn summary_rows(req: &ReportRequest) -> Vec<Vec<String>> {
    vec![
        vec!["Filename".to_string(), req.filename.clone()],
        vec!["Cyclomatic Complexity".to_string(), req.complexity.to_string()],
        vec!["Code Smells".to_string(), format!("{} issues", req.smells)],
        vec!["Maintainability Index".to_string(), format!("{:.1}", req.maintainability)],
    ]
}

fn smell_rows(req: &ReportRequest) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["Type".to_string(), "Message".to_string(), "Line".to_string()]];
    rows.extend(req.smell_details.iter().map(|d| {
        vec![d.kind.to_string(), d.message.clone(), d.line.to_string()]
    }));
    rows
}

/// Render the PDF for a report request
///
/// Fails only when a non-empty chart image cannot be decoded.
pub fn render_report(req: &ReportRequest) -> Result<Vec<u8>> {
    let chart = chart::decode_chart(&req.chart_image)?;

    let mut doc = Document::new(REPORT_TITLE);
    doc.paragraph(REPORT_TITLE, TextStyle::new(Font::Regular, 16.0).centered());
    doc.space(12.0);

    heading(&mut doc, "Summary");
    doc.table(
        &summary_rows(req),
        &SUMMARY_WIDTHS,
        TableStyle {
            body: body(),
            header: None,
            header_fill: [1.0, 1.0, 1.0],
            header_text: [0.0, 0.0, 0.0],
            grid_width: 1.0,
        },
    );
    doc.space(14.4);

    heading(&mut doc, "Code Smells");
    if req.smell_details.is_empty() {
        doc.paragraph(NO_SMELLS_TEXT, TextStyle::new(Font::Oblique, 10.0));
    } else {
        doc.table(
            &smell_rows(req),
            &SMELL_WIDTHS,
            TableStyle {
                body: body(),
                header: Some(TextStyle::new(Font::Bold, 10.0)),
                header_fill: [0.5, 0.5, 0.5],
                // whitesmoke
                header_text: [0.96, 0.96, 0.96],
                grid_width: 1.0,
            },
        );
    }
    doc.space(14.4);

    heading(&mut doc, "Metrics Chart");
    match chart {
        Some(image) => doc.image(image, CHART_WIDTH, CHART_HEIGHT),
        None => doc.paragraph(NO_CHART_TEXT, body()),
    }

    Ok(doc.finish())
}
