//! Text normalization for uploaded source files
//!
//! Reports control characters that have no business in a source file and
//! rewrites `CRLF` / lone `CR` line endings to `LF` before the text is handed
//! to the analyzers.

use crate::models::Diagnostic;

const LINE_ENDINGS_MESSAGE: &str = "Line endings normalized (CRLF or CR to LF)";

/// Normalized text plus whatever the scan found along the way
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl Normalized {
    /// Whether the normalizer itself failed on this input
    pub fn has_error(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Normalize raw upload bytes
///
/// Bytes that are not valid UTF-8 cannot be scanned. The text is then
/// returned lossily decoded but otherwise untouched, with a single `error`
/// diagnostic describing the decoding failure.
pub fn normalize_bytes(raw: &[u8]) -> Normalized {
    match std::str::from_utf8(raw) {
        Ok(text) => normalize(text),
        Err(e) => {
            tracing::warn!("Upload is not valid UTF-8: {}", e);
            Normalized {
                text: String::from_utf8_lossy(raw).into_owned(),
                diagnostics: vec![Diagnostic::error(
                    format!("Non-printable check error: {}", e),
                    0,
                )],
            }
        }
    }
}

/// Normalize decoded text
///
/// Never fails and is idempotent: feeding the output back in yields the same
/// text and no diagnostics, unless the text contains control characters.
pub fn normalize(content: &str) -> Normalized {
    let mut diagnostics = Vec::new();
    let mut line = 1u32;

    for (idx, ch) in content.chars().enumerate() {
        let code = ch as u32;
        if code < 32 && ch != '\n' && ch != '\t' {
            diagnostics.push(Diagnostic::warning(
                format!(
                    "Non-printable character U+{:04X} ({}) at position {}",
                    code,
                    control_name(ch).unwrap_or("unknown"),
                    idx + 1
                ),
                line,
            ));
        }
        if ch == '\n' {
            line += 1;
        }
    }

    let text = if content.contains('\r') {
        diagnostics.push(Diagnostic::info(LINE_ENDINGS_MESSAGE, 0));
        content.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        content.to_string()
    };

    Normalized { text, diagnostics }
}

/// Formal Unicode name alias of a C0 control character
fn control_name(ch: char) -> Option<&'static str> {
    const NAMES: [&str; 32] = [
        "NULL",
        "START OF HEADING",
        "START OF TEXT",
        "END OF TEXT",
        "END OF TRANSMISSION",
        "ENQUIRY",
        "ACKNOWLEDGE",
        "ALERT",
        "BACKSPACE",
        "CHARACTER TABULATION",
        "LINE FEED",
        "LINE TABULATION",
        "FORM FEED",
        "CARRIAGE RETURN",
        "SHIFT OUT",
        "SHIFT IN",
        "DATA LINK ESCAPE",
        "DEVICE CONTROL ONE",
        "DEVICE CONTROL TWO",
        "DEVICE CONTROL THREE",
        "DEVICE CONTROL FOUR",
        "NEGATIVE ACKNOWLEDGE",
        "SYNCHRONOUS IDLE",
        "END OF TRANSMISSION BLOCK",
        "CANCEL",
        "END OF MEDIUM",
        "SUBSTITUTE",
        "ESCAPE",
        "INFORMATION SEPARATOR FOUR",
        "INFORMATION SEPARATOR THREE",
        "INFORMATION SEPARATOR TWO",
        "INFORMATION SEPARATOR ONE",
    ];
    NAMES.get(ch as usize).copied()
}
