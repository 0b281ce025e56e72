//! Request-level entry points.
//!
//! Each function runs one request end to end: accept an upload, or turn a
//! batch into a named document. The `handle_*` variants sit at the request
//! boundary and never return `Err`; every failure becomes the `error` field
//! of a [`ParseResult`] or [`GenerateResult`].

use crate::config::GeneratorConfig;
use crate::error::WorkOrderError;
use crate::model::{Batch, WorkOrderRow};
use crate::output::{
    output_filename, DocumentKind, GenerateResult, GeneratedDocument, ParseOutput, ParseResult,
};
use crate::pipeline::rasterize::{rasterize_within, DocumentRasterizer};
use crate::pipeline::{parse, report, upload, write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Accept an uploaded workbook and parse it into a batch.
///
/// # Errors
/// - [`WorkOrderError::InvalidFormat`] for a non-Excel name or container.
/// - [`WorkOrderError::EmptyData`] when the sheet has no data rows.
/// - [`WorkOrderError::InvalidQuantity`] under the strict quantity policy.
pub async fn parse_upload(
    file_name: &str,
    bytes: Vec<u8>,
    config: &GeneratorConfig,
) -> Result<ParseOutput, WorkOrderError> {
    let start = Instant::now();
    let kind = upload::accept(file_name, &bytes)?.kind;
    info!("Parsing upload '{}' ({:?}, {} bytes)", file_name, kind, bytes.len());

    let config = config.clone();
    let output = tokio::task::spawn_blocking(move || parse::parse_batch(&bytes, &config))
        .await
        .map_err(|e| WorkOrderError::Internal(format!("Parse task panicked: {}", e)))??;

    if !output.warnings.is_empty() {
        warn!(
            "'{}': {} cell(s) coerced during parsing",
            file_name,
            output.warnings.len()
        );
    }
    info!(
        "Parsed '{}': {} rows in {}ms",
        file_name,
        output.batch.len(),
        start.elapsed().as_millis()
    );
    Ok(output)
}

/// Generate the cleaned workbook for `batch`.
pub async fn generate_spreadsheet(
    batch: &Batch,
    config: &GeneratorConfig,
) -> Result<GeneratedDocument, WorkOrderError> {
    let filename = output_filename(
        &config.document_label,
        batch.received_date(),
        DocumentKind::Spreadsheet,
    );
    let owned = batch.clone();
    let config = config.clone();
    let bytes = tokio::task::spawn_blocking(move || write::write_workbook(&owned, &config))
        .await
        .map_err(|e| WorkOrderError::Internal(format!("Write task panicked: {}", e)))??;

    info!("Generated {} ({} bytes)", filename, bytes.len());
    Ok(GeneratedDocument { filename, bytes })
}

/// Render `batch` and rasterize it into the printable PDF report.
///
/// Rasterization is bounded by `config.render_timeout_secs`.
pub async fn generate_report(
    batch: &Batch,
    config: &GeneratorConfig,
    rasterizer: &dyn DocumentRasterizer,
) -> Result<GeneratedDocument, WorkOrderError> {
    let filename = output_filename(
        &config.document_label,
        batch.received_date(),
        DocumentKind::Report,
    );
    let markup = report::render_report(batch, &config.layout);
    let bytes =
        rasterize_within(rasterizer, &markup, &config.layout, config.render_timeout_secs).await?;

    info!("Generated {} ({} bytes)", filename, bytes.len());
    Ok(GeneratedDocument { filename, bytes })
}

/// Write a generated document into `dir` under its own file name.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_document(
    doc: &GeneratedDocument,
    dir: impl AsRef<Path>,
) -> Result<PathBuf, WorkOrderError> {
    let dir = dir.as_ref();
    let path = dir.join(&doc.filename);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| WorkOrderError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, &doc.bytes)
        .await
        .map_err(|e| WorkOrderError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| WorkOrderError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    info!("Wrote {}", path.display());
    Ok(path)
}

/// Synchronous wrapper around [`parse_upload`].
///
/// Creates a temporary tokio runtime internally.
pub fn parse_upload_sync(
    file_name: &str,
    bytes: Vec<u8>,
    config: &GeneratorConfig,
) -> Result<ParseOutput, WorkOrderError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| WorkOrderError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(parse_upload(file_name, bytes, config))
}

/// Synchronous wrapper around [`generate_spreadsheet`].
pub fn generate_spreadsheet_sync(
    batch: &Batch,
    config: &GeneratorConfig,
) -> Result<GeneratedDocument, WorkOrderError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| WorkOrderError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_spreadsheet(batch, config))
}

// ── Request boundary ─────────────────────────────────────────────────────

/// Upload endpoint: bytes in, [`ParseResult`] out.
pub async fn handle_upload(file_name: &str, bytes: Vec<u8>, config: &GeneratorConfig) -> ParseResult {
    let result = parse_upload(file_name, bytes, config).await;
    if let Err(ref e) = result {
        warn!("Upload '{}' rejected: {}", file_name, e);
    }
    result.into()
}

/// Spreadsheet endpoint: rows posted back by a client, [`GenerateResult`] out.
pub async fn handle_generate_spreadsheet(
    rows: Vec<WorkOrderRow>,
    config: &GeneratorConfig,
) -> GenerateResult {
    let result = match Batch::new(rows) {
        Ok(batch) => generate_spreadsheet(&batch, config).await,
        Err(e) => Err(e),
    };
    if let Err(ref e) = result {
        warn!("Spreadsheet generation failed: {}", e);
    }
    result.into()
}

/// Report endpoint: rows posted back by a client, [`GenerateResult`] out.
pub async fn handle_generate_report(
    rows: Vec<WorkOrderRow>,
    config: &GeneratorConfig,
    rasterizer: &dyn DocumentRasterizer,
) -> GenerateResult {
    let result = match Batch::new(rows) {
        Ok(batch) => generate_report(&batch, config, rasterizer).await,
        Err(e) => Err(e),
    };
    if let Err(ref e) = result {
        warn!("Report generation failed: {}", e);
    }
    result.into()
}
