//! Spreadsheet parsing: workbook bytes → ordered [`WorkOrderRow`]s.
//!
//! ## Sheet layout
//!
//! ```text
//!     |     A      |    B    |  …  |
//! ----+------------+---------+-----+
//!   1 | 2024/03/15 |         |     |   received date (A1 only)
//!   2 | 바코드번호 | 제품명  |  …  |   header row (first non-blank row below A1)
//!   3 | BC001      | Shirt   |  …  |   data rows
//! ```
//!
//! Files produced by [`crate::pipeline::write`] have a blank separator row
//! between A1 and the header, so the header is located as the first
//! non-blank row below A1 instead of at a hard-coded index. Columns are
//! matched by exact header label through [`Field::from_label`]; their
//! position in the sheet does not matter.
//!
//! Only the first worksheet is read.

use crate::config::{GeneratorConfig, QuantityPolicy};
use crate::error::{CellWarning, WorkOrderError};
use crate::model::{Batch, Field, WorkOrderRow};
use crate::output::{ParseOutput, ParseStats};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Cursor;
use tracing::{debug, info, warn};

/// Rows read from the first worksheet, before the non-empty check.
#[derive(Debug, Default)]
pub struct ParsedSheet {
    pub rows: Vec<WorkOrderRow>,
    pub warnings: Vec<CellWarning>,
    pub stats: ParseStats,
}

/// Parse a workbook into a validated [`Batch`].
///
/// # Errors
/// - [`WorkOrderError::InvalidFormat`] if `bytes` is not a readable workbook.
/// - [`WorkOrderError::EmptyData`] if there are no data rows below the header.
/// - [`WorkOrderError::InvalidQuantity`] under [`QuantityPolicy::Strict`].
pub fn parse_batch(bytes: &[u8], config: &GeneratorConfig) -> Result<ParseOutput, WorkOrderError> {
    let sheet = parse_rows(bytes, config)?;
    if sheet.rows.is_empty() {
        return Err(WorkOrderError::EmptyData);
    }
    let batch = Batch::new(sheet.rows)?;
    Ok(ParseOutput {
        batch,
        warnings: sheet.warnings,
        stats: sheet.stats,
    })
}

/// Parse the first worksheet into rows.
///
/// Unlike [`parse_batch`] this returns an empty `rows` vector rather than
/// an error when the sheet has no data.
pub fn parse_rows(bytes: &[u8], config: &GeneratorConfig) -> Result<ParsedSheet, WorkOrderError> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| WorkOrderError::InvalidFormat {
            reason: e.to_string(),
        })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| WorkOrderError::InvalidFormat {
            reason: "workbook has no worksheets".into(),
        })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| WorkOrderError::InvalidFormat {
            reason: "workbook has no worksheets".into(),
        })?
        .map_err(|e| WorkOrderError::InvalidFormat {
            reason: format!("cannot read sheet '{sheet_name}': {e}"),
        })?;

    let mut sheet = ParsedSheet {
        stats: ParseStats {
            sheet_name: sheet_name.clone(),
            ..Default::default()
        },
        ..Default::default()
    };

    let Some((end_row, end_col)) = range.end() else {
        debug!("Sheet '{}' is empty", sheet_name);
        return Ok(sheet);
    };

    let date_format = config.date_format.as_str();
    let received_date = cell_at(&range, 0, 0)
        .and_then(|d| cell_text(d, date_format))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    sheet.stats.received_date = received_date.clone();

    let Some(header_row) = (1..=end_row).find(|&r| !row_is_blank(&range, r, end_col, date_format))
    else {
        debug!("Sheet '{}' has no header row", sheet_name);
        return Ok(sheet);
    };
    sheet.stats.header_row = Some(header_row as usize + 1);

    let columns = map_columns(&range, header_row, end_col, date_format);
    if columns.is_empty() {
        warn!(
            "Header row {} of sheet '{}' has no recognised column labels",
            header_row + 1,
            sheet_name
        );
    }
    debug!("Column map: {:?}", columns);

    for r in header_row + 1..=end_row {
        if row_is_blank(&range, r, end_col, date_format) {
            sheet.stats.blank_rows_skipped += 1;
            continue;
        }
        let reader = RowReader {
            range: &range,
            columns: &columns,
            row: r,
            date_format,
            policy: config.quantity_policy,
        };
        let row = reader.read(&received_date, &mut sheet.warnings)?;
        sheet.rows.push(row);
    }

    sheet.stats.data_rows = sheet.rows.len();
    info!(
        "Parsed sheet '{}': {} data rows, {} warnings",
        sheet_name,
        sheet.rows.len(),
        sheet.warnings.len()
    );
    Ok(sheet)
}

// ── Row mapping ──────────────────────────────────────────────────────────

struct RowReader<'a> {
    range: &'a Range<Data>,
    columns: &'a HashMap<Field, u32>,
    row: u32,
    date_format: &'a str,
    policy: QuantityPolicy,
}

impl RowReader<'_> {
    fn cell(&self, field: Field) -> Option<&Data> {
        let col = *self.columns.get(&field)?;
        cell_at(self.range, self.row, col)
    }

    fn text(&self, field: Field) -> Option<String> {
        self.cell(field).and_then(|d| cell_text(d, self.date_format))
    }

    /// 1-indexed, as shown in a spreadsheet application.
    fn row_number(&self) -> usize {
        self.row as usize + 1
    }

    fn read(
        &self,
        received_date: &str,
        warnings: &mut Vec<CellWarning>,
    ) -> Result<WorkOrderRow, WorkOrderError> {
        let inbound = self.quantity(Field::InboundQty, "0", warnings)?;
        let inbound_qty = match inbound {
            Some(v) if v < 0 => {
                self.reject_or_warn(
                    v.to_string(),
                    CellWarning::NegativeQuantity {
                        row: self.row_number(),
                        column: Field::InboundQty.label().to_string(),
                        value: v,
                    },
                    warnings,
                )?;
                0
            }
            Some(v) => match u32::try_from(v) {
                Ok(qty) => qty,
                Err(_) => {
                    self.reject_or_warn(
                        v.to_string(),
                        CellWarning::QuantityOutOfRange {
                            row: self.row_number(),
                            column: Field::InboundQty.label().to_string(),
                            value: v,
                        },
                        warnings,
                    )?;
                    0
                }
            },
            None => 0,
        };

        Ok(WorkOrderRow {
            received_date: received_date.to_string(),
            barcode: self.text(Field::Barcode).unwrap_or_default(),
            product_name: self.text(Field::ProductName).unwrap_or_default(),
            color: self.text(Field::Color).unwrap_or_default(),
            size: self.text(Field::Size).unwrap_or_default(),
            inbound_qty,
            outbound_date: self.text(Field::OutboundDate),
            manufacturer: self.text(Field::Manufacturer).unwrap_or_default(),
            actual_qty: self.quantity(Field::ActualQty, "blank", warnings)?,
            total: self.quantity(Field::Total, "blank", warnings)?,
        })
    }

    /// Read a quantity cell. `None` means blank or coerced away.
    fn quantity(
        &self,
        field: Field,
        fallback: &str,
        warnings: &mut Vec<CellWarning>,
    ) -> Result<Option<i64>, WorkOrderError> {
        match read_quantity(self.cell(field)) {
            Quantity::Blank => Ok(None),
            Quantity::Whole(v) => Ok(Some(v)),
            Quantity::Fractional { raw, truncated } => {
                self.reject_or_warn(
                    raw.clone(),
                    CellWarning::FractionalQuantity {
                        row: self.row_number(),
                        column: field.label().to_string(),
                        value: raw,
                    },
                    warnings,
                )?;
                Ok(Some(truncated))
            }
            Quantity::NotANumber(raw) => {
                self.reject_or_warn(
                    raw.clone(),
                    CellWarning::NotANumber {
                        row: self.row_number(),
                        column: field.label().to_string(),
                        value: raw,
                        fallback: fallback.to_string(),
                    },
                    warnings,
                )?;
                Ok(None)
            }
        }
    }

    fn reject_or_warn(
        &self,
        raw: String,
        warning: CellWarning,
        warnings: &mut Vec<CellWarning>,
    ) -> Result<(), WorkOrderError> {
        match self.policy {
            QuantityPolicy::Strict => {
                let column = match &warning {
                    CellWarning::NotANumber { column, .. }
                    | CellWarning::NegativeQuantity { column, .. }
                    | CellWarning::FractionalQuantity { column, .. }
                    | CellWarning::QuantityOutOfRange { column, .. } => column.clone(),
                };
                Err(WorkOrderError::InvalidQuantity {
                    row: self.row_number(),
                    column,
                    value: raw,
                })
            }
            QuantityPolicy::Lenient => {
                warn!("{}", warning);
                warnings.push(warning);
                Ok(())
            }
        }
    }
}

fn map_columns(
    range: &Range<Data>,
    header_row: u32,
    end_col: u32,
    date_format: &str,
) -> HashMap<Field, u32> {
    let mut columns = HashMap::new();
    for c in 0..=end_col {
        let Some(label) = cell_at(range, header_row, c).and_then(|d| cell_text(d, date_format))
        else {
            continue;
        };
        if let Some(field) = Field::from_label(&label) {
            // Duplicate headers: the leftmost column wins.
            columns.entry(field).or_insert(c);
        }
    }
    columns
}

// ── Cell helpers ─────────────────────────────────────────────────────────

/// Non-empty cell at absolute worksheet coordinates.
fn cell_at(range: &Range<Data>, row: u32, col: u32) -> Option<&Data> {
    range
        .get_value((row, col))
        .filter(|d| !matches!(d, Data::Empty))
}

fn row_is_blank(range: &Range<Data>, row: u32, end_col: u32, date_format: &str) -> bool {
    (0..=end_col).all(|c| {
        cell_at(range, row, c)
            .and_then(|d| cell_text(d, date_format))
            .is_none_or(|s| s.trim().is_empty())
    })
}

/// Display text of a cell, the way a spreadsheet application shows it.
///
/// Returns `None` for empty strings and error cells.
pub fn cell_text(data: &Data, date_format: &str) -> Option<String> {
    let text = match data {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match excel_serial_to_datetime(serial) {
                Some(ndt) => format_datetime(&ndt, date_format),
                None => format_number(serial),
            }
        }
        Data::DateTimeIso(s) => parse_iso(s)
            .map(|ndt| format_datetime(&ndt, date_format))
            .unwrap_or_else(|| s.clone()),
        Data::DurationIso(s) => s.clone(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// General-format number: integral values drop the `.0` so barcodes and
/// counts read back the way they were typed.
fn format_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

/// Convert an Excel 1900-system serial to a date-time.
///
/// Serials below 60 predate Excel's phantom 1900-02-29 and are shifted by a
/// day so that serial 1 is 1900-01-01.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::milliseconds(millis))
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Format without panicking on a malformed pattern; falls back to ISO.
fn format_datetime(ndt: &NaiveDateTime, date_format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", ndt.format(date_format)).is_err() {
        out.clear();
        out.push_str(&ndt.format("%Y-%m-%d").to_string());
    }
    out
}

// ── Quantity coercion ────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Quantity {
    Blank,
    Whole(i64),
    Fractional { raw: String, truncated: i64 },
    NotANumber(String),
}

fn read_quantity(cell: Option<&Data>) -> Quantity {
    let Some(cell) = cell else {
        return Quantity::Blank;
    };
    match cell {
        Data::Empty => Quantity::Blank,
        Data::Int(i) => Quantity::Whole(*i),
        Data::Float(f) => from_float(*f),
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Quantity::Blank;
            }
            let cleaned: String = trimmed.chars().filter(|&c| c != ',').collect();
            if let Ok(i) = cleaned.parse::<i64>() {
                Quantity::Whole(i)
            } else if let Ok(f) = cleaned.parse::<f64>() {
                match from_float(f) {
                    Quantity::NotANumber(_) => Quantity::NotANumber(s.clone()),
                    Quantity::Fractional { truncated, .. } => Quantity::Fractional {
                        raw: s.clone(),
                        truncated,
                    },
                    q => q,
                }
            } else {
                Quantity::NotANumber(s.clone())
            }
        }
        Data::Bool(b) => Quantity::NotANumber(if *b { "TRUE" } else { "FALSE" }.into()),
        Data::Error(e) => Quantity::NotANumber(format!("{e:?}")),
        Data::DateTime(dt) => Quantity::NotANumber(format_number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Quantity::NotANumber(s.clone()),
    }
}

fn from_float(f: f64) -> Quantity {
    if !f.is_finite() || f.abs() >= i64::MAX as f64 {
        return Quantity::NotANumber(format!("{f}"));
    }
    if f.fract() == 0.0 {
        Quantity::Whole(f as i64)
    } else {
        Quantity::Fractional {
            raw: format!("{f}"),
            truncated: f.trunc() as i64,
        }
    }
}
