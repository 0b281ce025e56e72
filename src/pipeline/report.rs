//! Report rendering: [`Batch`] → self-contained HTML ready for printing.
//!
//! The markup carries its own layout intent (`@page` size and margins,
//! repeating `<thead>`, rows that never split across pages) so any engine
//! that honours print CSS produces the same pagination.

use crate::config::PageLayout;
use crate::model::{Batch, Field, WorkOrderRow};
use crate::template::{
    CHECKBOX_LABELS, CHECK_COLUMNS, COLUMN_WIDTHS_PX, DEFECT_LABEL, RECEIVED_DATE_LABEL,
    STYLESHEET, SUM_LABEL, TITLE,
};
use tracing::debug;

/// Render the printable report for `batch`.
pub fn render_report(batch: &Batch, layout: &PageLayout) -> String {
    let mut html = String::with_capacity(8 * 1024 + batch.len() * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"ko\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", TITLE));
    html.push_str("<style>\n");
    html.push_str(&format!(
        "@page {{\n  size: {};\n  margin: {};\n}}\n",
        layout.css_size(),
        layout.margins.css()
    ));
    let adjust = if layout.print_background { "exact" } else { "economy" };
    html.push_str(&format!(
        "html, body {{\n  -webkit-print-color-adjust: {adjust};\n  print-color-adjust: {adjust};\n}}\n"
    ));
    html.push_str(STYLESHEET);
    html.push_str("</style>\n</head>\n<body>\n<main class=\"page\">\n");

    push_header_band(&mut html, batch.received_date());

    html.push_str("<section class=\"table-section\">\n<table class=\"work-order-table\">\n");
    push_colgroup(&mut html);
    push_thead(&mut html);
    html.push_str("<tbody>\n");
    for (index, row) in batch.rows().iter().enumerate() {
        push_row(&mut html, index, row);
    }
    html.push_str("</tbody>\n</table>\n</section>\n</main>\n</body>\n</html>\n");

    debug!("Rendered report: {} rows, {} bytes", batch.len(), html.len());
    html
}

fn push_header_band(html: &mut String, received_date: &str) {
    html.push_str("<header class=\"page-header\">\n");
    html.push_str(&format!(
        "<div class=\"meta-left\">{} : {}</div>\n",
        RECEIVED_DATE_LABEL,
        escape_html(received_date)
    ));
    html.push_str("<div class=\"meta-right\">\n");
    for label in CHECKBOX_LABELS {
        html.push_str(&format!("<div class=\"checkbox-item\">{label}</div>\n"));
    }
    html.push_str("</div>\n</header>\n");
}

fn push_colgroup(html: &mut String) {
    html.push_str("<colgroup>\n");
    for w in COLUMN_WIDTHS_PX {
        html.push_str(&format!("<col style=\"width: {w}px\">\n"));
    }
    html.push_str("</colgroup>\n");
}

fn push_thead(html: &mut String) {
    html.push_str("<thead>\n<tr>\n");
    for field in [
        Field::Barcode,
        Field::ProductName,
        Field::Color,
        Field::Size,
        Field::InboundQty,
    ] {
        html.push_str(&format!("<th>{}</th>\n", field.label()));
    }
    for n in 1..=CHECK_COLUMNS {
        html.push_str(&format!("<th class=\"col-check\">{n}</th>\n"));
    }
    html.push_str(&format!("<th>{SUM_LABEL}</th>\n<th>{DEFECT_LABEL}</th>\n"));
    html.push_str(&format!(
        "<th>{}</th>\n<th>{}</th>\n",
        Field::OutboundDate.label(),
        Field::Manufacturer.label()
    ));
    html.push_str("</tr>\n</thead>\n");
}

fn push_row(html: &mut String, index: usize, row: &WorkOrderRow) {
    let class = if index % 2 == 0 { "row-even" } else { "row-odd" };
    html.push_str(&format!("<tr class=\"{class}\">\n"));
    html.push_str(&format!(
        "<td class=\"cell-text\">{}</td>\n",
        escape_html(&row.barcode)
    ));
    html.push_str(&format!(
        "<td class=\"cell-text cell-product\">{}</td>\n",
        escape_html(&row.product_name)
    ));
    html.push_str(&format!(
        "<td class=\"cell-text\">{}</td>\n",
        escape_html(&row.color)
    ));
    html.push_str(&format!(
        "<td class=\"cell-text\">{}</td>\n",
        escape_html(&row.size)
    ));
    html.push_str(&format!(
        "<td class=\"cell-number\">{}</td>\n",
        row.inbound_qty
    ));
    for _ in 0..CHECK_COLUMNS {
        html.push_str("<td class=\"cell-check\"></td>\n");
    }
    html.push_str("<td class=\"cell-sum\"></td>\n<td class=\"cell-number\"></td>\n");
    html.push_str(&format!(
        "<td class=\"cell-text\">{}</td>\n",
        escape_html(row.outbound_date.as_deref().unwrap_or(""))
    ));
    html.push_str(&format!(
        "<td class=\"cell-text\">{}</td>\n",
        escape_html(&row.manufacturer)
    ));
    html.push_str("</tr>\n");
}

/// Escape the five HTML-significant characters.
///
/// `&` is handled in the same pass as the others, so existing entities are
/// escaped again rather than passed through.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}
