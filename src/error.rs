//! Error types for the workorder-docs library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`WorkOrderError`]: **Fatal**: the request cannot produce a document
//!   (not a spreadsheet, no data rows, renderer crashed). Returned as
//!   `Err(WorkOrderError)` from every pipeline entry point and mapped to a
//!   structured failure result at the request boundary.
//!
//! * [`CellWarning`]: **Non-fatal**: one cell could not be coerced (text in
//!   a quantity column, a negative count) and was replaced by its default.
//!   Collected in [`crate::output::ParseOutput`] so callers can show the
//!   operator what was patched instead of rejecting the whole upload.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the workorder-docs library.
#[derive(Debug, Error)]
pub enum WorkOrderError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Wrong file extension or a byte buffer that is not a workbook container.
    #[error("Not a readable spreadsheet: {reason}\nOnly .xlsx and .xls uploads are accepted.")]
    InvalidFormat { reason: String },

    /// The sheet has a header row but no data rows beneath it.
    #[error("The spreadsheet contains no data rows")]
    EmptyData,

    /// A quantity cell held something other than a non-negative integer and
    /// the strict quantity policy is active.
    #[error("Row {row}, column '{column}': '{value}' is not a valid quantity")]
    InvalidQuantity {
        row: usize,
        column: String,
        value: String,
    },

    /// Rows handed to the generators do not share one received date.
    #[error("Row {row} has received date '{found}' but the batch date is '{expected}'")]
    MixedReceivedDates {
        row: usize,
        expected: String,
        found: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// rust_xlsxwriter refused to build the workbook.
    #[error("Failed to write spreadsheet: {0}")]
    SpreadsheetWrite(#[from] rust_xlsxwriter::XlsxError),

    /// The rasterization engine failed; `message` carries its own output.
    #[error("PDF rendering failed: {message}")]
    RenderFailed { message: String },

    /// The rasterization engine did not finish within the configured budget.
    #[error("PDF rendering timed out after {secs}s\nIncrease --render-timeout.")]
    RenderTimeout { secs: u64 },

    /// No headless browser could be found for the execution environment.
    #[error("{0}")]
    BrowserNotFound(#[from] chrome_locate::LocateError),

    /// Could not create or write a generated document on disk.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal coercion applied to a single cell.
///
/// `row` is the 1-indexed worksheet row, matching what a spreadsheet
/// application shows in its row gutter.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum CellWarning {
    /// Cell text was not a number; the field fell back to its default.
    #[error("Row {row}, column '{column}': '{value}' is not a number, using {fallback}")]
    NotANumber {
        row: usize,
        column: String,
        value: String,
        fallback: String,
    },

    /// A negative count was clamped to zero.
    #[error("Row {row}, column '{column}': negative quantity {value} clamped to 0")]
    NegativeQuantity {
        row: usize,
        column: String,
        value: i64,
    },

    /// A count too large for the inbound quantity field was replaced by 0.
    #[error("Row {row}, column '{column}': quantity {value} is out of range, using 0")]
    QuantityOutOfRange {
        row: usize,
        column: String,
        value: i64,
    },

    /// A fractional count was truncated toward zero.
    #[error("Row {row}, column '{column}': fractional quantity {value} truncated")]
    FractionalQuantity {
        row: usize,
        column: String,
        value: String,
    },
}
