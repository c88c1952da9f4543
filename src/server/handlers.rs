//! Route handlers

use super::error::ApiError;
use super::AppState;
use crate::models::{AnalysisResult, ReportRequest};
use crate::pipeline::analyze_upload;
use crate::report::render_report;
use crate::store::persist;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

/// Multipart field carrying the uploaded source file
pub const UPLOAD_FIELD: &str = "file";

/// `POST /analyze`
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let extension = state.settings.source_extension().to_string();

    let (filename, data) = loop {
        let Some(field) = multipart.next_field().await? else {
            return Err(ApiError::BadRequest(format!(
                "Missing '{}' field in upload",
                UPLOAD_FIELD
            )));
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !filename.ends_with(&extension) {
            debug!("Rejected upload {:?}", filename);
            return Err(ApiError::BadRequest(format!(
                "Only {} files are supported",
                extension
            )));
        }
        break (filename, field.bytes().await?);
    };

    info!("Received {} ({} bytes)", filename, data.len());
    let collector = state.collector.clone();
    let result = tokio::task::spawn_blocking(move || analyze_upload(&collector, &filename, &data))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    persist(state.sink.as_ref(), &result).await;
    Ok(Json(result))
}

/// `POST /generate_pdf`
pub async fn generate_pdf(
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let disposition = content_disposition(&req.pdf_filename());

    let pdf = tokio::task::spawn_blocking(move || render_report(&req))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Render(format!("{:#}", e)))?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

/// `GET /health`
pub async fn health() -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `attachment` disposition for a download name
///
/// Names that are not plain ASCII get an ASCII fallback plus an RFC 5987
/// `filename*` parameter.
pub fn content_disposition(filename: &str) -> HeaderValue {
    let plain = filename
        .chars()
        .all(|c| (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ');
    let value = if plain {
        format!("attachment; filename=\"{}\"", filename)
    } else {
        let fallback: String = filename
            .chars()
            .map(|c| match c {
                ' ' => ' ',
                '"' | '\\' => '_',
                c if c.is_ascii_graphic() => c,
                _ => '_',
            })
            .collect();
        format!(
            "attachment; filename=\"{}\"; filename*=utf-8''{}",
            fallback,
            percent_encode(filename)
        )
    };
    HeaderValue::from_str(&value)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"report_analysis.pdf\""))
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => out.push(byte as char),
            b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_disposition() {
        assert_eq!(
            content_disposition("main.py_analysis.pdf"),
            "attachment; filename=\"main.py_analysis.pdf\""
        );
        assert_eq!(
            content_disposition("my file_analysis.pdf"),
            "attachment; filename=\"my file_analysis.pdf\""
        );
    }

    #[test]
    fn test_non_ascii_disposition() {
        assert_eq!(
            content_disposition("é.py_analysis.pdf"),
            "attachment; filename=\"_.py_analysis.pdf\"; filename*=utf-8''%C3%A9.py_analysis.pdf"
        );
    }

    #[test]
    fn test_quotes_are_replaced() {
        let value = content_disposition("a\"b_analysis.pdf");
        assert_eq!(
            value,
            "attachment; filename=\"a_b_analysis.pdf\"; filename*=utf-8''a%22b_analysis.pdf"
        );
    }
}
