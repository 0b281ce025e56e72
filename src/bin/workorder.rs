//! CLI binary for workorder-docs.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GeneratorConfig`, runs the pipeline on one upload and either writes the
//! generated files or prints the same JSON results a web endpoint returns.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use workorder_docs::{
    generate_report, generate_spreadsheet, handle_generate_report, handle_generate_spreadsheet,
    handle_upload, parse_upload, write_document, Batch, ChromeRasterizer, ExecutionEnvironment,
    GenerateResult, GeneratedDocument, GeneratorConfig, PageLayout, PaperSize, ParseOutput,
    QuantityPolicy, WaitUntil, WorkOrderRow,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Show the parsed rows
  workorder orders.xlsx

  # Regenerate the cleaned workbook and the printable report into ./out
  workorder orders.xlsx --xlsx --pdf -o out

  # Reject uploads with non-numeric quantities instead of coercing them
  workorder --strict orders.xls --xlsx

  # Emit the JSON results an upload/generate endpoint would return
  workorder --json orders.xlsx
  workorder --json rows.json --pdf > report.json

  # Sheet statistics only
  workorder --inspect-only orders.xlsx

INPUT:
  .xlsx / .xls   A work-order upload: received date in A1, column labels in
                 the first non-blank row below it, one item per row after.
  .json          An array of rows as returned by `workorder --json`; used to
                 regenerate documents from edited data.

ENVIRONMENT VARIABLES:
  CHROME_PATH              Browser executable, skips discovery
  CHROMIUM_PATH            Serverless Chromium location, searched first
  WORKORDER_SERVERLESS     Force serverless launch flags (1/true)
  RUST_LOG                 Override log filter (e.g. workorder_docs=debug)
"#;

/// Turn work-order spreadsheets into a cleaned workbook and a printable PDF.
#[derive(Parser, Debug)]
#[command(
    name = "workorder",
    version,
    about = "Turn work-order spreadsheets into a cleaned workbook and a printable PDF report",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Upload (.xlsx/.xls) or a JSON array of rows.
    input: PathBuf,

    /// Directory for generated files.
    #[arg(short, long, env = "WORKORDER_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Generate the cleaned workbook.
    #[arg(long)]
    xlsx: bool,

    /// Generate the printable PDF report.
    #[arg(long)]
    pdf: bool,

    /// Reject non-numeric quantity cells instead of coercing them to 0.
    #[arg(long, env = "WORKORDER_STRICT")]
    strict: bool,

    /// chrono format for date-typed cells.
    #[arg(long, env = "WORKORDER_DATE_FORMAT", default_value = "%Y-%m-%d")]
    date_format: String,

    /// File name prefix and sheet name of generated documents.
    #[arg(long, env = "WORKORDER_LABEL", default_value = workorder_docs::config::DEFAULT_DOCUMENT_LABEL)]
    label: String,

    /// PDF rendering timeout in seconds.
    #[arg(long, env = "WORKORDER_RENDER_TIMEOUT", default_value_t = 60)]
    render_timeout: u64,

    /// Browser launch profile: local or serverless. Detected when unset.
    #[arg(long, env = "WORKORDER_ENVIRONMENT")]
    environment: Option<ExecutionEnvironment>,

    /// Browser executable for PDF rendering.
    #[arg(long, env = "WORKORDER_BROWSER")]
    browser: Option<PathBuf>,

    /// Paper size.
    #[arg(long, env = "WORKORDER_PAPER", value_enum, default_value = "a4")]
    paper: PaperArg,

    /// Portrait instead of landscape.
    #[arg(long)]
    portrait: bool,

    /// Let the page settle (fonts, images) before printing.
    #[arg(long)]
    wait_network_idle: bool,

    /// Print JSON results instead of writing files.
    #[arg(long, env = "WORKORDER_JSON")]
    json: bool,

    /// Print sheet statistics only.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "WORKORDER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "WORKORDER_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PaperArg {
    A4,
    Letter,
}

impl From<PaperArg> for PaperSize {
    fn from(v: PaperArg) -> Self {
        match v {
            PaperArg::A4 => PaperSize::A4,
            PaperArg::Letter => PaperSize::Letter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || cli.json {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let bytes = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let file_name = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let from_json = has_extension(&cli.input, "json");

    if cli.json {
        return run_json(&cli, &config, &file_name, bytes, from_json).await;
    }

    // ── Load rows ────────────────────────────────────────────────────────
    let batch = if from_json {
        let rows: Vec<WorkOrderRow> =
            serde_json::from_slice(&bytes).context("Failed to read rows from JSON")?;
        Batch::new(rows).context("Invalid rows")?
    } else {
        let parsed = parse_upload(&file_name, bytes, &config)
            .await
            .context("Failed to parse upload")?;
        if cli.inspect_only {
            print_stats(&file_name, &parsed);
            return Ok(());
        }
        if !cli.quiet {
            for w in &parsed.warnings {
                eprintln!("  {} {}", yellow("⚠"), w);
            }
        }
        parsed.batch
    };

    if !cli.xlsx && !cli.pdf {
        print_rows(&batch);
        return Ok(());
    }

    // ── Generate ─────────────────────────────────────────────────────────
    if cli.xlsx {
        let doc = generate_spreadsheet(&batch, &config)
            .await
            .context("Spreadsheet generation failed")?;
        report_written(&cli, &doc).await?;
    }

    if cli.pdf {
        let chrome = ChromeRasterizer::from_config(&config).context("No browser for PDF rendering")?;
        let spinner = (!cli.quiet).then(|| render_spinner(batch.len()));
        let result = generate_report(&batch, &config, &chrome).await;
        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }
        let doc = result.context("PDF generation failed")?;
        report_written(&cli, &doc).await?;
    }

    Ok(())
}

/// Boundary mode: print the structured results, exit non-zero on failure.
async fn run_json(
    cli: &Cli,
    config: &GeneratorConfig,
    file_name: &str,
    bytes: Vec<u8>,
    from_json: bool,
) -> Result<()> {
    let rows = if from_json {
        serde_json::from_slice::<Vec<WorkOrderRow>>(&bytes).context("Failed to read rows from JSON")?
    } else {
        let parsed = handle_upload(file_name, bytes, config).await;
        if (!cli.xlsx && !cli.pdf) || !parsed.success {
            println!(
                "{}",
                serde_json::to_string_pretty(&parsed).context("Failed to serialise result")?
            );
            if !parsed.success {
                std::process::exit(1);
            }
            return Ok(());
        }
        parsed.data.unwrap_or_default()
    };

    let mut results: Vec<GenerateResult> = Vec::new();
    if cli.xlsx {
        results.push(handle_generate_spreadsheet(rows.clone(), config).await);
    }
    if cli.pdf {
        let result = match ChromeRasterizer::from_config(config) {
            Ok(chrome) => handle_generate_report(rows, config, &chrome).await,
            Err(e) => GenerateResult::failure(&e),
        };
        results.push(result);
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&results).context("Failed to serialise result")?
    );
    if results.iter().any(|r| !r.success) {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `GeneratorConfig`.
fn build_config(cli: &Cli) -> Result<GeneratorConfig> {
    let layout = PageLayout {
        paper: cli.paper.clone().into(),
        landscape: !cli.portrait,
        wait_until: if cli.wait_network_idle {
            WaitUntil::NetworkIdle
        } else {
            WaitUntil::DomContentLoaded
        },
        ..Default::default()
    };

    let mut builder = GeneratorConfig::builder()
        .quantity_policy(if cli.strict {
            QuantityPolicy::Strict
        } else {
            QuantityPolicy::Lenient
        })
        .date_format(cli.date_format.clone())
        .document_label(cli.label.clone())
        .render_timeout_secs(cli.render_timeout)
        .layout(layout);

    if let Some(env) = cli.environment {
        builder = builder.environment(env);
    }
    if let Some(ref path) = cli.browser {
        builder = builder.browser_path(path.clone());
    }

    builder.build().context("Invalid configuration")
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn render_spinner(rows: usize) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Rendering");
    bar.set_message(format!("{rows} rows"));
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

async fn report_written(cli: &Cli, doc: &GeneratedDocument) -> Result<()> {
    let path = write_document(doc, &cli.output_dir)
        .await
        .context("Failed to write output")?;
    if !cli.quiet {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&path.display().to_string()),
            dim(&format!("{} bytes", doc.bytes.len())),
        );
    }
    Ok(())
}

fn print_stats(file_name: &str, parsed: &ParseOutput) {
    let s = &parsed.stats;
    println!("File:           {}", file_name);
    println!("Sheet:          {}", s.sheet_name);
    println!("Received date:  {}", s.received_date);
    match s.header_row {
        Some(r) => println!("Header row:     {}", r),
        None => println!("Header row:     {}", red("not found")),
    }
    println!("Data rows:      {}", s.data_rows);
    println!("Blank skipped:  {}", s.blank_rows_skipped);
    println!("Warnings:       {}", parsed.warnings.len());
}

fn print_rows(batch: &Batch) {
    println!("{} {}", bold("입고날짜 :"), batch.received_date());
    for row in batch.rows() {
        println!(
            "{:<16} {:<30} {:<8} {:<6} {:>6}  {:<10} {}",
            row.barcode,
            row.product_name,
            row.color,
            row.size,
            row.inbound_qty,
            row.outbound_date.as_deref().unwrap_or("-"),
            row.manufacturer
        );
    }
    eprintln!("{}", dim(&format!("{} rows", batch.len())));
}
