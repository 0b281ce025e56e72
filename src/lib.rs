//! # workorder-docs
//!
//! Turn an inbound-inventory work-order spreadsheet into a cleaned workbook
//! and a printable, paginated PDF report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .xlsx / .xls upload
//!  │
//!  ├─ 1. Upload    extension + container check
//!  ├─ 2. Parse     first sheet → Batch of WorkOrderRow (calamine, spawn_blocking)
//!  ├─ 3. Write     Batch → formatted .xlsx (rust_xlsxwriter)
//!  ├─ 4. Report    Batch → print-ready HTML (A4 landscape, repeating header)
//!  └─ 5. Rasterize HTML → PDF via headless Chrome, time-bounded
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use workorder_docs::{generate_report, parse_upload, ChromeRasterizer, GeneratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GeneratorConfig::default();
//!     let bytes = std::fs::read("orders.xlsx")?;
//!     let parsed = parse_upload("orders.xlsx", bytes, &config).await?;
//!     for w in &parsed.warnings {
//!         eprintln!("warning: {w}");
//!     }
//!
//!     let chrome = ChromeRasterizer::from_config(&config)?;
//!     let pdf = generate_report(&parsed.batch, &config, &chrome).await?;
//!     std::fs::write(&pdf.filename, &pdf.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `workorder` binary (clap + anyhow + tracing-subscriber + indicatif + serde_json) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! workorder-docs = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod template;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use chrome_locate::ExecutionEnvironment;
pub use config::{
    GeneratorConfig, GeneratorConfigBuilder, Margins, PageLayout, PaperSize, QuantityPolicy,
    WaitUntil,
};
pub use error::{CellWarning, WorkOrderError};
pub use generate::{
    generate_report, generate_spreadsheet, generate_spreadsheet_sync, handle_generate_report,
    handle_generate_spreadsheet, handle_upload, parse_upload, parse_upload_sync, write_document,
};
pub use model::{Batch, Field, WorkOrderRow};
pub use output::{
    output_filename, DocumentKind, GenerateResult, GeneratedDocument, ParseOutput, ParseResult,
    ParseStats,
};
pub use pipeline::rasterize::{ChromeRasterizer, DocumentRasterizer};
