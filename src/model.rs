//! Canonical row model, batch invariants and the column-label table.
//!
//! A single [`WorkOrderRow`] type serves every stage. The optional extension
//! fields (`actual_qty`, `total`) are simply `None` when a sheet does not
//! carry them, so there is no second "reduced" schema to keep in sync.

use crate::error::WorkOrderError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One inventory line item within one batch.
///
/// Field declaration order is the serialisation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkOrderRow {
    /// Batch-level intake date, copied from cell A1 onto every row.
    pub received_date: String,
    pub barcode: String,
    pub product_name: String,
    pub color: String,
    pub size: String,
    /// Never negative; coercion failures land on 0.
    pub inbound_qty: u32,
    /// Free-form text, kept verbatim. `None` when the source cell is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound_date: Option<String>,
    pub manufacturer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_qty: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

impl WorkOrderRow {
    fn normalize(&mut self) {
        let trimmed = self.received_date.trim();
        if trimmed.len() != self.received_date.len() {
            self.received_date = trimmed.to_string();
        }
        if self.outbound_date.as_deref() == Some("") {
            self.outbound_date = None;
        }
    }
}

/// A validated, non-empty sequence of rows sharing one received date.
///
/// The spreadsheet writer and the report renderer only accept a `Batch`, so
/// they never have to re-check either invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Batch {
    rows: Vec<WorkOrderRow>,
}

impl Batch {
    /// Validate `rows` into a batch.
    ///
    /// Rows are normalised to what a written workbook reads back as: the
    /// received date is trimmed and an empty outbound date becomes `None`.
    ///
    /// # Errors
    /// - [`WorkOrderError::EmptyData`] when `rows` is empty.
    /// - [`WorkOrderError::MixedReceivedDates`] when any row's date differs
    ///   from the first row's.
    pub fn new(mut rows: Vec<WorkOrderRow>) -> Result<Self, WorkOrderError> {
        for row in &mut rows {
            row.normalize();
        }
        let first = rows.first().ok_or(WorkOrderError::EmptyData)?;
        if let Some((idx, odd)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.received_date != first.received_date)
        {
            return Err(WorkOrderError::MixedReceivedDates {
                row: idx + 1,
                expected: first.received_date.clone(),
                found: odd.received_date.clone(),
            });
        }
        Ok(Self { rows })
    }

    /// The single intake date shared by every row.
    pub fn received_date(&self) -> &str {
        &self.rows[0].received_date
    }

    pub fn rows(&self) -> &[WorkOrderRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false`; present for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `true` if any row carries one of the optional extension fields.
    pub fn has_extension_fields(&self) -> bool {
        self.rows
            .iter()
            .any(|r| r.actual_qty.is_some() || r.total.is_some())
    }

    pub fn into_rows(self) -> Vec<WorkOrderRow> {
        self.rows
    }
}

impl<'de> Deserialize<'de> for Batch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rows = Vec::<WorkOrderRow>::deserialize(deserializer)?;
        Batch::new(rows).map_err(serde::de::Error::custom)
    }
}

// ── Column table ─────────────────────────────────────────────────────────

/// A spreadsheet column that maps onto a [`WorkOrderRow`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Barcode,
    ProductName,
    Color,
    Size,
    InboundQty,
    OutboundDate,
    Manufacturer,
    ActualQty,
    Total,
}

impl Field {
    /// Required columns, in the order the writer emits them.
    pub const CORE: [Field; 7] = [
        Field::Barcode,
        Field::ProductName,
        Field::Color,
        Field::Size,
        Field::InboundQty,
        Field::OutboundDate,
        Field::Manufacturer,
    ];

    /// Optional trailing columns.
    pub const EXTENSION: [Field; 2] = [Field::ActualQty, Field::Total];

    /// Header text written to, and expected in, work-order files.
    pub fn label(self) -> &'static str {
        match self {
            Field::Barcode => "바코드번호",
            Field::ProductName => "제품명",
            Field::Color => "컬러",
            Field::Size => "사이즈",
            Field::InboundQty => "입고수량",
            Field::OutboundDate => "출고일",
            Field::Manufacturer => "제조사",
            Field::ActualQty => "실수량",
            Field::Total => "합계",
        }
    }

    /// Every header text accepted for this field, canonical label first.
    pub fn accepted_labels(self) -> &'static [&'static str] {
        match self {
            Field::Barcode => &["바코드번호", "Barcode"],
            Field::ProductName => &["제품명", "Product Name"],
            Field::Color => &["컬러", "Color"],
            Field::Size => &["사이즈", "Size"],
            Field::InboundQty => &["입고수량", "Inbound Qty"],
            Field::OutboundDate => &["출고일", "Outbound Date"],
            Field::Manufacturer => &["제조사", "Manufacturer"],
            Field::ActualQty => &["실수량", "Actual Qty"],
            Field::Total => &["합계", "Total"],
        }
    }

    /// Exact-label lookup. Column position in the sheet is irrelevant.
    pub fn from_label(label: &str) -> Option<Field> {
        LABEL_INDEX.get(label).copied()
    }

    /// Display width in character units used by the spreadsheet writer.
    pub fn column_width(self) -> f64 {
        match self {
            Field::Barcode => 15.0,
            Field::ProductName => 30.0,
            Field::Color => 12.0,
            Field::Size => 10.0,
            Field::InboundQty => 12.0,
            Field::OutboundDate => 12.0,
            Field::Manufacturer => 20.0,
            Field::ActualQty | Field::Total => 10.0,
        }
    }
}

static LABEL_INDEX: Lazy<HashMap<&'static str, Field>> = Lazy::new(|| {
    Field::CORE
        .iter()
        .chain(Field::EXTENSION.iter())
        .flat_map(|&f| f.accepted_labels().iter().map(move |&l| (l, f)))
        .collect()
});
