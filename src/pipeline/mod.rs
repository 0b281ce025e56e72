//! Pipeline stages for work-order document generation.
//!
//! Each submodule implements exactly one transformation step so each can be
//! tested on its own and the rasterization engine can be swapped without
//! touching the other stages.
//!
//! ## Data Flow
//!
//! ```text
//!                         ┌──▶ write ──────────────▶ .xlsx
//! upload ──▶ parse ──▶ Batch
//!                         └──▶ report ──▶ rasterize ──▶ .pdf
//! ```
//!
//! 1. [`upload`]   : extension and container check on the raw upload
//! 2. [`parse`]    : first worksheet → [`crate::model::Batch`] via calamine
//! 3. [`write`]    : batch → formatted workbook via rust_xlsxwriter
//! 4. [`report`]   : batch → print-ready HTML
//! 5. [`rasterize`]: HTML → PDF behind the [`rasterize::DocumentRasterizer`]
//!    trait; the only stage that spawns a process

pub mod parse;
pub mod rasterize;
pub mod report;
pub mod upload;
pub mod write;
