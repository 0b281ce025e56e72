//! Integration tests for workorder-docs.
//!
//! Workbooks are built in memory with rust_xlsxwriter, so everything except
//! the Chrome tests runs offline. The Chrome tests launch a real browser and
//! are gated behind the `E2E_ENABLED` environment variable.
//!
//! Run the browser tests with:
//!   E2E_ENABLED=1 cargo test --test pipeline -- --nocapture

use futures::future::BoxFuture;
use futures::FutureExt;
use proptest::prelude::*;
use rust_xlsxwriter::{Format, Workbook};
use std::time::Duration;
use workorder_docs::pipeline::parse::{parse_batch, parse_rows};
use workorder_docs::pipeline::write::write_workbook;
use workorder_docs::{
    generate_report, handle_generate_report, handle_upload, parse_upload, Batch, CellWarning,
    ChromeRasterizer, DocumentRasterizer, GeneratorConfig, PageLayout, QuantityPolicy,
    WorkOrderError, WorkOrderRow,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run browser tests");
            return;
        }
    }};
}

const HEADERS: [&str; 7] = ["바코드번호", "제품명", "컬러", "사이즈", "입고수량", "출고일", "제조사"];

#[derive(Clone, Copy)]
enum Cell<'a> {
    Text(&'a str),
    Num(f64),
    Empty,
}

/// Source-upload layout: A1 date, headers in row 2, data from row 3.
fn upload_xlsx(a1: Cell<'_>, headers: &[&str], rows: &[Vec<Cell<'_>>]) -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    write_cell(ws, 0, 0, a1);
    for (c, h) in headers.iter().enumerate() {
        ws.write_string(1, c as u16, *h).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            write_cell(ws, 2 + r as u32, c as u16, *cell);
        }
    }
    wb.save_to_buffer().unwrap()
}

fn write_cell(ws: &mut rust_xlsxwriter::Worksheet, r: u32, c: u16, cell: Cell<'_>) {
    match cell {
        Cell::Text(s) => {
            ws.write_string(r, c, s).unwrap();
        }
        Cell::Num(n) => {
            ws.write_number(r, c, n).unwrap();
        }
        Cell::Empty => {}
    }
}

fn item(barcode: &'static str, qty: Cell<'static>) -> Vec<Cell<'static>> {
    vec![
        Cell::Text(barcode),
        Cell::Text("Shirt"),
        Cell::Text("Red"),
        Cell::Text("M"),
        qty,
        Cell::Empty,
        Cell::Text("ACME"),
    ]
}

/// Route library logs to the test harness; `RUST_LOG=debug` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn lenient() -> GeneratorConfig {
    GeneratorConfig::default()
}

fn strict() -> GeneratorConfig {
    GeneratorConfig::builder()
        .quantity_policy(QuantityPolicy::Strict)
        .build()
        .unwrap()
}

fn sample_rows() -> Vec<WorkOrderRow> {
    vec![
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
        },
        WorkOrderRow {
            received_date: "2024/03/15".into(),
            barcode: "8801234567890".into(),
            product_name: "반팔 티셔츠 & \"Tee\"".into(),
            color: "블랙".into(),
            size: "XL".into(),
            inbound_qty: 0,
            outbound_date: Some("3/20".into()),
            manufacturer: "<Maker>".into(),
            actual_qty: None,
            total: None,
        },
    ]
}

struct Canned(Result<&'static [u8], &'static str>);

impl DocumentRasterizer for Canned {
    fn rasterize<'a>(
        &'a self,
        _markup: &'a str,
        _layout: &'a PageLayout,
    ) -> BoxFuture<'a, Result<Vec<u8>, WorkOrderError>> {
        let result = match self.0 {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(msg) => Err(WorkOrderError::RenderFailed {
                message: msg.to_string(),
            }),
        };
        async move { result }.boxed()
    }
}

struct Hang;

impl DocumentRasterizer for Hang {
    fn rasterize<'a>(
        &'a self,
        _markup: &'a str,
        _layout: &'a PageLayout,
    ) -> BoxFuture<'a, Result<Vec<u8>, WorkOrderError>> {
        async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
        .boxed()
    }
}

// ── Parsing scenarios ────────────────────────────────────────────────────────

#[test]
fn received_date_from_a1_on_every_row() {
    init_tracing();
    let bytes = upload_xlsx(
        Cell::Text("2024/03/15"),
        &HEADERS,
        &[item("BC001", Cell::Num(10.0)), item("BC002", Cell::Num(4.0))],
    );
    let out = parse_batch(&bytes, &lenient()).unwrap();
    assert_eq!(out.batch.len(), 2);
    assert!(out.batch.rows().iter().all(|r| r.received_date == "2024/03/15"));
    assert_eq!(out.batch.rows()[0].barcode, "BC001");
    assert_eq!(out.batch.rows()[0].product_name, "Shirt");
    assert_eq!(out.batch.rows()[0].inbound_qty, 10);
    assert_eq!(out.batch.rows()[0].outbound_date, None);
    assert_eq!(out.stats.header_row, Some(2));
    assert!(out.warnings.is_empty());
}

#[test]
fn missing_quantity_defaults_to_zero_silently() {
    let bytes = upload_xlsx(
        Cell::Text("2024/03/15"),
        &HEADERS,
        &[item("BC001", Cell::Empty)],
    );
    let out = parse_batch(&bytes, &lenient()).unwrap();
    assert_eq!(out.batch.rows()[0].inbound_qty, 0);
    assert!(out.warnings.is_empty());
}

#[test]
fn text_quantity_coerced_with_warning() {
    init_tracing();
    let bytes = upload_xlsx(
        Cell::Text("2024/03/15"),
        &HEADERS,
        &[item("BC001", Cell::Text("10개"))],
    );
    let out = parse_batch(&bytes, &lenient()).unwrap();
    assert_eq!(out.batch.rows()[0].inbound_qty, 0);
    assert_eq!(
        out.warnings,
        vec![CellWarning::NotANumber {
            row: 3,
            column: "입고수량".into(),
            value: "10개".into(),
            fallback: "0".into(),
        }]
    );
}

#[test]
fn strict_policy_rejects_text_quantity() {
    let bytes = upload_xlsx(
        Cell::Text("2024/03/15"),
        &HEADERS,
        &[item("BC001", Cell::Num(1.0)), item("BC002", Cell::Text("ten"))],
    );
    let err = parse_batch(&bytes, &strict()).unwrap_err();
    match err {
        WorkOrderError::InvalidQuantity { row, column, value } => {
            assert_eq!(row, 4);
            assert_eq!(column, "입고수량");
            assert_eq!(value, "ten");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn negative_quantity_clamped_and_fraction_truncated() {
    let bytes = upload_xlsx(
        Cell::Text("2024/03/15"),
        &HEADERS,
        &[item("A", Cell::Num(-5.0)), item("B", Cell::Num(3.7))],
    );
    let out = parse_batch(&bytes, &lenient()).unwrap();
    assert_eq!(out.batch.rows()[0].inbound_qty, 0);
    assert_eq!(out.batch.rows()[1].inbound_qty, 3);
    assert_eq!(out.warnings.len(), 2);
    assert!(matches!(out.warnings[0], CellWarning::NegativeQuantity { value: -5, .. }));
    assert!(matches!(out.warnings[1], CellWarning::FractionalQuantity { .. }));

    assert!(matches!(
        parse_batch(&bytes, &strict()),
        Err(WorkOrderError::InvalidQuantity { row: 3, .. })
    ));
}

#[test]
fn oversized_quantity_follows_policy() {
    let bytes = upload_xlsx(
        Cell::Text("2024/03/15"),
        &HEADERS,
        &[item("BC001", Cell::Num(5_000_000_000.0))],
    );
    let out = parse_batch(&bytes, &lenient()).unwrap();
    assert_eq!(out.batch.rows()[0].inbound_qty, 0);
    assert_eq!(
        out.warnings,
        vec![CellWarning::QuantityOutOfRange {
            row: 3,
            column: "입고수량".into(),
            value: 5_000_000_000,
        }]
    );

    match parse_batch(&bytes, &strict()).unwrap_err() {
        WorkOrderError::InvalidQuantity { row, value, .. } => {
            assert_eq!(row, 3);
            assert_eq!(value, "5000000000");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn columns_matched_by_label_not_position() {
    let headers = ["제조사", "입고수량", "바코드번호", "비고", "제품명"];
    let bytes = upload_xlsx(
        Cell::Text("2024/03/15"),
        &headers,
        &[vec![
            Cell::Text("ACME"),
            Cell::Num(7.0),
            Cell::Text("BC009"),
            Cell::Text("ignored"),
            Cell::Text("Pants"),
        ]],
    );
    let out = parse_batch(&bytes, &lenient()).unwrap();
    let row = &out.batch.rows()[0];
    assert_eq!(row.manufacturer, "ACME");
    assert_eq!(row.inbound_qty, 7);
    assert_eq!(row.barcode, "BC009");
    assert_eq!(row.product_name, "Pants");
    assert_eq!(row.color, "");
    assert_eq!(row.size, "");
}

#[test]
fn blank_rows_skipped() {
    let bytes = upload_xlsx(
        Cell::Text("2024/03/15"),
        &HEADERS,
        &[
            item("A", Cell::Num(1.0)),
            vec![Cell::Empty; 7],
            item("B", Cell::Num(2.0)),
        ],
    );
    let out = parse_batch(&bytes, &lenient()).unwrap();
    let barcodes: Vec<&str> = out.batch.rows().iter().map(|r| r.barcode.as_str()).collect();
    assert_eq!(barcodes, ["A", "B"]);
    assert_eq!(out.stats.blank_rows_skipped, 1);
}

#[test]
fn numeric_barcode_keeps_all_digits() {
    let mut row = item("x", Cell::Num(1.0));
    row[0] = Cell::Num(8801234567890.0);
    let bytes = upload_xlsx(Cell::Text("2024/03/15"), &HEADERS, &[row]);
    let out = parse_batch(&bytes, &lenient()).unwrap();
    assert_eq!(out.batch.rows()[0].barcode, "8801234567890");
}

#[test]
fn date_typed_a1_uses_configured_format() {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    let date = Format::new().set_num_format("yyyy/mm/dd");
    ws.write_number_with_format(0, 0, 45366.0, &date).unwrap();
    for (c, h) in HEADERS.iter().enumerate() {
        ws.write_string(1, c as u16, *h).unwrap();
    }
    ws.write_string(2, 0, "BC001").unwrap();
    let bytes = wb.save_to_buffer().unwrap();

    let out = parse_batch(&bytes, &lenient()).unwrap();
    assert_eq!(out.batch.received_date(), "2024-03-15");

    let slashed = GeneratorConfig::builder().date_format("%Y/%m/%d").build().unwrap();
    let out = parse_batch(&bytes, &slashed).unwrap();
    assert_eq!(out.batch.received_date(), "2024/03/15");
}

#[test]
fn header_without_data_is_empty() {
    let bytes = upload_xlsx(Cell::Text("2024/03/15"), &HEADERS, &[]);
    assert!(parse_rows(&bytes, &lenient()).unwrap().rows.is_empty());
    assert!(matches!(
        parse_batch(&bytes, &lenient()),
        Err(WorkOrderError::EmptyData)
    ));
}

#[test]
fn garbage_is_invalid_format() {
    assert!(matches!(
        parse_batch(b"this is not a workbook", &lenient()),
        Err(WorkOrderError::InvalidFormat { .. })
    ));
}

// ── Writer ───────────────────────────────────────────────────────────────────

#[test]
fn writer_layout_round_trips() {
    let batch = Batch::new(sample_rows()).unwrap();
    let bytes = write_workbook(&batch, &lenient()).unwrap();
    let out = parse_batch(&bytes, &lenient()).unwrap();
    assert_eq!(out.stats.header_row, Some(3));
    assert_eq!(out.batch.rows(), batch.rows());
    assert!(out.warnings.is_empty());
}

#[test]
fn extension_fields_round_trip() {
    let mut rows = sample_rows();
    rows[0].actual_qty = Some(9);
    rows[0].total = Some(9);
    rows[1].total = Some(-1);
    let batch = Batch::new(rows).unwrap();
    let bytes = write_workbook(&batch, &lenient()).unwrap();
    let out = parse_batch(&bytes, &lenient()).unwrap();
    assert_eq!(out.batch.rows(), batch.rows());
}

#[test]
fn posted_rows_round_trip_after_normalising() {
    let mut rows = sample_rows();
    for row in &mut rows {
        row.received_date = " 2024/03/15 ".into();
    }
    rows[0].outbound_date = Some(String::new());
    let batch = Batch::new(rows).unwrap();
    assert_eq!(batch.received_date(), "2024/03/15");

    let bytes = write_workbook(&batch, &lenient()).unwrap();
    let out = parse_batch(&bytes, &lenient()).unwrap();
    assert_eq!(out.batch.rows(), batch.rows());
    assert_eq!(out.batch.rows()[0].outbound_date, None);
}

#[test]
fn writer_is_deterministic_in_content() {
    let batch = Batch::new(sample_rows()).unwrap();
    let a = parse_rows(&write_workbook(&batch, &lenient()).unwrap(), &lenient()).unwrap();
    let b = parse_rows(&write_workbook(&batch, &lenient()).unwrap(), &lenient()).unwrap();
    assert_eq!(a.rows, b.rows);
}

fn arb_row(date: String) -> impl Strategy<Value = WorkOrderRow> {
    let text = "[A-Za-z0-9가-힣]{0,12}";
    (
        (text, text, text, text, text),
        0u32..100_000,
        proptest::option::of("[0-9A-Za-z/-]{1,10}"),
        proptest::option::of(-1_000_000i64..1_000_000),
        proptest::option::of(-1_000_000i64..1_000_000),
    )
        .prop_map(
            move |((barcode, product_name, color, size, manufacturer), qty, outbound, actual, total)| {
                WorkOrderRow {
                    received_date: date.clone(),
                    barcode,
                    product_name,
                    color,
                    size,
                    inbound_qty: qty,
                    outbound_date: outbound,
                    manufacturer,
                    actual_qty: actual,
                    total,
                }
            },
        )
}

fn arb_rows() -> impl Strategy<Value = Vec<WorkOrderRow>> {
    "[0-9]{4}/[0-9]{2}/[0-9]{2}"
        .prop_flat_map(|date| proptest::collection::vec(arb_row(date), 1..12))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn parse_inverts_write(rows in arb_rows()) {
        let batch = Batch::new(rows).unwrap();
        let bytes = write_workbook(&batch, &lenient()).unwrap();
        let out = parse_batch(&bytes, &lenient()).unwrap();
        prop_assert_eq!(out.batch.rows(), batch.rows());
        prop_assert!(out.warnings.is_empty());
    }
}

// ── Request boundary ─────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_result_json_shape() {
    let bytes = upload_xlsx(
        Cell::Text("2024/03/15"),
        &HEADERS,
        &[item("BC001", Cell::Num(10.0))],
    );
    let result = handle_upload("orders.XLSX", bytes, &lenient()).await;
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"][0]["receivedDate"], "2024/03/15");
    assert_eq!(json["data"][0]["inboundQty"], 10);
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn upload_result_omits_cell_warnings() {
    let bytes = upload_xlsx(
        Cell::Text("2024/03/15"),
        &HEADERS,
        &[item("BC001", Cell::Num(1.0)), item("BC002", Cell::Text("ten"))],
    );
    let result = handle_upload("orders.xlsx", bytes, &lenient()).await;
    let json = serde_json::to_value(&result).unwrap();
    let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["data", "success"]);
    assert_eq!(json["data"][1]["inboundQty"], 0);
}

#[tokio::test]
async fn renamed_csv_is_rejected() {
    let result = handle_upload("orders.xlsx", b"barcode,qty\nA,1\n".to_vec(), &lenient()).await;
    assert!(!result.success);
    assert!(result.data.is_none());
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let bytes = upload_xlsx(Cell::Text("2024/03/15"), &HEADERS, &[]);
    let err = parse_upload("orders.xlsx", bytes, &lenient()).await.unwrap_err();
    assert!(matches!(err, WorkOrderError::EmptyData));
}

#[tokio::test]
async fn report_failure_maps_to_result() {
    let result = handle_generate_report(sample_rows(), &lenient(), &Canned(Err("engine crashed"))).await;
    assert!(!result.success);
    assert!(result.filename.is_none());
    assert!(result.error.unwrap().contains("engine crashed"));
}

#[tokio::test]
async fn report_success_is_base64() {
    let result = handle_generate_report(sample_rows(), &lenient(), &Canned(Ok(b"%PDF-1.7"))).await;
    assert!(result.success);
    assert_eq!(result.data.as_deref(), Some("JVBERi0xLjc="));
    assert_eq!(result.filename.as_deref(), Some("작업지시서_2024-03-15.pdf"));
}

#[tokio::test]
async fn hung_rasterizer_times_out() {
    init_tracing();
    let config = GeneratorConfig::builder().render_timeout_secs(1).build().unwrap();
    let batch = Batch::new(sample_rows()).unwrap();
    let err = generate_report(&batch, &config, &Hang).await.unwrap_err();
    assert!(matches!(err, WorkOrderError::RenderTimeout { secs: 1 }));
}

// ── Headless Chrome (E2E) ────────────────────────────────────────────────────

#[tokio::test]
async fn chrome_renders_report_pdf() {
    init_tracing();
    e2e_skip_unless_enabled!();

    let config = lenient();
    let chrome = ChromeRasterizer::from_config(&config).expect("a browser should be installed");
    let batch = Batch::new(sample_rows()).unwrap();

    let doc = generate_report(&batch, &config, &chrome)
        .await
        .expect("rendering should succeed");
    assert!(doc.bytes.starts_with(b"%PDF"));
    assert_eq!(doc.filename, "작업지시서_2024-03-15.pdf");
    println!("Rendered {} bytes with {}", doc.bytes.len(), chrome.executable().display());
}

#[tokio::test]
async fn chrome_paginates_long_batches() {
    e2e_skip_unless_enabled!();

    let config = lenient();
    let chrome = ChromeRasterizer::from_config(&config).expect("a browser should be installed");
    let rows: Vec<WorkOrderRow> = (0..200)
        .map(|i| WorkOrderRow {
            received_date: "2024/03/15".into(),
            barcode: format!("BC{i:04}"),
            product_name: format!("Item {i}"),
            inbound_qty: i,
            ..Default::default()
        })
        .collect();
    let batch = Batch::new(rows).unwrap();

    let doc = generate_report(&batch, &config, &chrome).await.unwrap();
    assert!(doc.bytes.starts_with(b"%PDF"));
    assert!(doc.bytes.len() > 1_000);
    println!("{} rows → {} bytes", batch.len(), doc.bytes.len());
}
