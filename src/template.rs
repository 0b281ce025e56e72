//! Static text of the printable work-order report.
//!
//! Every label and style rule lives here so the renderer in
//! [`crate::pipeline::report`] only assembles structure. The `@page` rule and
//! the colour-adjust switch are not part of [`STYLESHEET`]; they depend on
//! [`crate::config::PageLayout`] and are emitted by the renderer.

/// Document `<title>`.
pub const TITLE: &str = "작업 지시서";

/// Prefix of the received-date line in the header band.
pub const RECEIVED_DATE_LABEL: &str = "입고날짜";

/// Printed tick boxes in the header band, filled in by hand.
pub const CHECKBOX_LABELS: [&str; 2] = ["업체 소통 완료", "이관 완료"];

/// Number of hand-filled count columns between inbound qty and the sum.
pub const CHECK_COLUMNS: usize = 10;

pub const SUM_LABEL: &str = "합계";
pub const DEFECT_LABEL: &str = "불량";

/// Absolute `<col>` widths in px, left to right.
///
/// barcode, product, color, size, inbound, 1..=10, sum, defect, outbound,
/// manufacturer
pub const COLUMN_WIDTHS_PX: [u32; 19] = [
    90, 220, 50, 45, 55, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 50, 45, 70, 80,
];

/// Report stylesheet, minus the `@page` rule.
pub const STYLESHEET: &str = r#"
* {
  margin: 0;
  padding: 0;
  box-sizing: border-box;
}

html, body {
  font-family: 'Noto Sans KR', 'Malgun Gothic', '맑은 고딕', sans-serif;
  color: #1a1a1a;
  font-size: 9px;
  line-height: 1.5;
  background: #fff;
}

.page {
  padding: 6mm 5mm;
}

.page-header {
  display: flex;
  justify-content: space-between;
  align-items: center;
  margin-bottom: 5mm;
}

.meta-left {
  font-size: 12px;
  font-weight: 700;
}

.meta-right {
  display: flex;
  gap: 20px;
  align-items: center;
}

.checkbox-item {
  display: inline-flex;
  align-items: center;
  gap: 5px;
  font-size: 10px;
  color: #555;
  font-weight: 500;
}

.checkbox-item::before {
  content: '□';
  font-size: 13px;
  color: #90A4AE;
  font-weight: 400;
}

.work-order-table {
  width: 100%;
  border-collapse: collapse;
  table-layout: fixed;
  border: 0.5px solid #E0E0E0;
}

thead {
  display: table-header-group;
}

tr {
  break-inside: avoid;
  page-break-inside: avoid;
}

.work-order-table th {
  background: #E8F4F8;
  color: #37474F;
  border: 0.5px solid #CFD8DC;
  padding: 7px 4px;
  font-weight: 600;
  text-align: center;
  font-size: 9.5px;
  white-space: nowrap;
}

.work-order-table th.col-check {
  font-size: 8px;
}

.work-order-table td {
  border: 0.5px solid #E0E0E0;
  padding: 6px 5px;
  font-size: 9px;
  color: #424242;
  white-space: nowrap;
  overflow: hidden;
  text-overflow: ellipsis;
  vertical-align: middle;
}

.row-even {
  background-color: #FFFFFF;
}

.row-odd {
  background-color: #FAFAFA;
}

.cell-text {
  text-align: left;
  padding-left: 6px;
}

.cell-product {
  font-weight: 600;
  color: #212121;
  white-space: normal !important;
  word-wrap: break-word;
  line-height: 1.3;
  max-height: 2.6em;
}

.cell-number {
  text-align: right;
  font-weight: 600;
  padding-right: 6px;
}

.cell-check {
  text-align: center;
  background: #F0F8FF;
  font-size: 8px;
}

.cell-sum {
  background: #E8F4F8;
  font-weight: 700;
  text-align: right;
  color: #37474F;
  padding-right: 6px;
}
"#;
