//! Output types: parse results, generated documents and the JSON contracts
//! returned at the request boundary.

use crate::error::{CellWarning, WorkOrderError};
use crate::model::{Batch, WorkOrderRow};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// A successfully parsed upload.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub batch: Batch,
    /// Cells that were coerced under the lenient quantity policy.
    pub warnings: Vec<CellWarning>,
    pub stats: ParseStats,
}

/// Statistics collected while reading the worksheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    /// Name of the worksheet that was read (always the first one).
    pub sheet_name: String,
    /// Text of A1 after formatting and trimming.
    pub received_date: String,
    /// 1-indexed row holding the column labels, if one was found.
    pub header_row: Option<usize>,
    pub data_rows: usize,
    pub blank_rows_skipped: usize,
}

/// A generated file ready to be returned or written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl GeneratedDocument {
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Kind of generated document; selects extension and log wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Spreadsheet,
    Report,
}

impl DocumentKind {
    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Spreadsheet => "xlsx",
            DocumentKind::Report => "pdf",
        }
    }
}

/// `{label}_{date}.{ext}` with `/` and `\` in the date replaced by `-`.
///
/// An empty date becomes `unknown` so the name never starts with an
/// underscore-dot sequence like `작업지시서_.pdf`.
pub fn output_filename(label: &str, received_date: &str, kind: DocumentKind) -> String {
    let date = received_date.trim();
    let date = if date.is_empty() {
        "unknown".to_string()
    } else {
        date.replace(['/', '\\'], "-")
    };
    format!("{label}_{date}.{}", kind.extension())
}

// ── Boundary contracts ───────────────────────────────────────────────────

/// JSON shape returned for an upload.
///
/// Cell warnings are not part of the contract; they stay in
/// [`ParseOutput::warnings`] and the logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<WorkOrderRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParseResult {
    pub fn ok(output: ParseOutput) -> Self {
        Self {
            success: true,
            data: Some(output.batch.into_rows()),
            error: None,
        }
    }

    pub fn failure(err: &WorkOrderError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
        }
    }
}

impl From<Result<ParseOutput, WorkOrderError>> for ParseResult {
    fn from(r: Result<ParseOutput, WorkOrderError>) -> Self {
        match r {
            Ok(out) => Self::ok(out),
            Err(e) => Self::failure(&e),
        }
    }
}

/// JSON shape returned for a generation request. `data` is base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResult {
    pub fn ok(doc: &GeneratedDocument) -> Self {
        Self {
            success: true,
            data: Some(doc.to_base64()),
            filename: Some(doc.filename.clone()),
            error: None,
        }
    }

    pub fn failure(err: &WorkOrderError) -> Self {
        Self {
            success: false,
            data: None,
            filename: None,
            error: Some(err.to_string()),
        }
    }
}

impl From<Result<GeneratedDocument, WorkOrderError>> for GenerateResult {
    fn from(r: Result<GeneratedDocument, WorkOrderError>) -> Self {
        match r {
            Ok(doc) => Self::ok(&doc),
            Err(e) => Self::failure(&e),
        }
    }
}
