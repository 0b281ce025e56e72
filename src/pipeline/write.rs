//! Spreadsheet writer: [`Batch`] → formatted `.xlsx` bytes.
//!
//! ```text
//! row 1   received date (A1)
//! row 2   (blank)
//! row 3   바코드번호 | 제품명 | 컬러 | 사이즈 | 입고수량 | 출고일 | 제조사 [| 실수량 | 합계]
//! row 4+  one row per record, input order
//! ```
//!
//! The two extension columns are appended only when some row carries one
//! of them, so a plain upload regenerates with exactly the core layout.

use crate::config::GeneratorConfig;
use crate::error::WorkOrderError;
use crate::model::{Batch, Field, WorkOrderRow};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};
use tracing::{debug, info};

const DATE_ROW: u32 = 0;
const HEADER_ROW: u32 = 2;
const FIRST_DATA_ROW: u32 = 3;
const HEADER_FILL: u32 = 0xD3D3D3;

/// Columns emitted for this batch, in sheet order.
pub fn columns_for(batch: &Batch) -> Vec<Field> {
    let mut cols = Field::CORE.to_vec();
    if batch.has_extension_fields() {
        cols.extend_from_slice(&Field::EXTENSION);
    }
    cols
}

/// Serialize a batch into an in-memory `.xlsx` workbook.
///
/// Identical input yields identical cell contents.
pub fn write_workbook(batch: &Batch, config: &GeneratorConfig) -> Result<Vec<u8>, WorkOrderError> {
    let columns = columns_for(batch);
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(&config.document_label)?;

    if !batch.received_date().is_empty() {
        sheet.write_string(DATE_ROW, 0, batch.received_date())?;
    }

    for (c, field) in columns.iter().enumerate() {
        let col = column_index(c)?;
        sheet.set_column_width(col, field.column_width())?;
        sheet.write_string_with_format(HEADER_ROW, col, field.label(), &header_format)?;
    }

    for (i, row) in batch.rows().iter().enumerate() {
        let r = FIRST_DATA_ROW
            + u32::try_from(i).map_err(|_| WorkOrderError::Internal("too many rows".into()))?;
        write_row(sheet, r, row, &columns)?;
    }
    debug!(
        "Wrote {} rows across {} columns",
        batch.len(),
        columns.len()
    );

    let bytes = workbook.save_to_buffer()?;
    info!("Generated workbook: {} bytes", bytes.len());
    Ok(bytes)
}

fn write_row(
    sheet: &mut Worksheet,
    r: u32,
    row: &WorkOrderRow,
    columns: &[Field],
) -> Result<(), WorkOrderError> {
    for (c, field) in columns.iter().enumerate() {
        let col = column_index(c)?;
        let text = match field {
            Field::InboundQty => {
                sheet.write_number(r, col, f64::from(row.inbound_qty))?;
                continue;
            }
            Field::ActualQty | Field::Total => {
                let value = if *field == Field::ActualQty {
                    row.actual_qty
                } else {
                    row.total
                };
                if let Some(v) = value {
                    sheet.write_number(r, col, v as f64)?;
                }
                continue;
            }
            Field::Barcode => row.barcode.as_str(),
            Field::ProductName => row.product_name.as_str(),
            Field::Color => row.color.as_str(),
            Field::Size => row.size.as_str(),
            Field::OutboundDate => row.outbound_date.as_deref().unwrap_or(""),
            Field::Manufacturer => row.manufacturer.as_str(),
        };
        // Empty cells stay empty rather than holding "".
        if !text.is_empty() {
            sheet.write_string(r, col, text)?;
        }
    }
    Ok(())
}

fn column_index(c: usize) -> Result<u16, WorkOrderError> {
    u16::try_from(c).map_err(|_| WorkOrderError::Internal(format!("column {c} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(rows: Vec<WorkOrderRow>) -> Batch {
        Batch::new(rows).unwrap()
    }

    fn shirt() -> WorkOrderRow {
        WorkOrderRow {
            received_date: "2024/03/15".into(),
            barcode: "BC001".into(),
            product_name: "Shirt".into(),
            color: "Red".into(),
            size: "M".into(),
            inbound_qty: 10,
            outbound_date: None,
            manufacturer: "ACME".into(),
            actual_qty: None,
            total: None,
        }
    }

    #[test]
    fn core_columns_only_without_extensions() {
        let cols = columns_for(&batch(vec![shirt()]));
        assert_eq!(cols, Field::CORE.to_vec());
    }

    #[test]
    fn extension_columns_appended_when_present() {
        let mut r = shirt();
        r.total = Some(12);
        let cols = columns_for(&batch(vec![shirt(), r]));
        assert_eq!(cols.len(), 9);
        assert_eq!(cols[7], Field::ActualQty);
        assert_eq!(cols[8], Field::Total);
    }

    #[test]
    fn output_is_a_zip_container() {
        let bytes = write_workbook(&batch(vec![shirt()]), &GeneratorConfig::default()).unwrap();
        assert_eq!(&bytes[..4], b"PK\x03\x04");
    }

    #[test]
    fn overlong_sheet_name_is_a_write_error() {
        let config = GeneratorConfig {
            document_label: "x".repeat(40),
            ..Default::default()
        };
        let err = write_workbook(&batch(vec![shirt()]), &config).unwrap_err();
        assert!(matches!(err, WorkOrderError::SpreadsheetWrite(_)), "got {err:?}");
    }
}
