//! Rasterization boundary: report markup → paginated PDF bytes.
//!
//! The engine is a black box behind [`DocumentRasterizer`]. The bundled
//! [`ChromeRasterizer`] drives a headless Chrome/Chromium binary through its
//! `--print-to-pdf` mode, one process per call:
//!
//! ```text
//! tmp/
//! ├── report.html     markup written by us
//! ├── profile/        private --user-data-dir
//! └── report.pdf      written by the browser
//! ```
//!
//! The child is spawned with `kill_on_drop`, and the work dir is a
//! [`TempDir`], so dropping the future (timeout, caller cancellation) kills
//! the browser and removes every file it produced.

use crate::config::{GeneratorConfig, PageLayout, WaitUntil};
use crate::error::WorkOrderError;
use chrome_locate::{launch_args, locate_browser, ExecutionEnvironment, LocateError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};

const PDF_MAGIC: &[u8] = b"%PDF";
const NETWORK_IDLE_BUDGET_MS: u32 = 5_000;
const STDERR_TAIL: usize = 2_000;

/// Turns self-contained markup into PDF bytes.
///
/// Implementations must honour the markup's print CSS and the given layout,
/// and must release every resource they acquire when the returned future
/// completes or is dropped.
pub trait DocumentRasterizer: Send + Sync {
    fn rasterize<'a>(
        &'a self,
        markup: &'a str,
        layout: &'a PageLayout,
    ) -> BoxFuture<'a, Result<Vec<u8>, WorkOrderError>>;
}

/// Run `rasterizer` with a hard deadline.
///
/// On expiry the in-flight future is dropped and
/// [`WorkOrderError::RenderTimeout`] is returned. No retry is attempted.
pub async fn rasterize_within(
    rasterizer: &dyn DocumentRasterizer,
    markup: &str,
    layout: &PageLayout,
    timeout_secs: u64,
) -> Result<Vec<u8>, WorkOrderError> {
    let start = Instant::now();
    match tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        rasterizer.rasterize(markup, layout),
    )
    .await
    {
        Ok(Ok(pdf)) => {
            info!(
                "Rasterized {} bytes of markup into {} bytes of PDF in {}ms",
                markup.len(),
                pdf.len(),
                start.elapsed().as_millis()
            );
            Ok(pdf)
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            warn!("Rasterization exceeded {}s, aborted", timeout_secs);
            Err(WorkOrderError::RenderTimeout { secs: timeout_secs })
        }
    }
}

// ── Headless Chrome ──────────────────────────────────────────────────────

/// [`DocumentRasterizer`] backed by a headless Chrome/Chromium executable.
#[derive(Debug, Clone)]
pub struct ChromeRasterizer {
    executable: PathBuf,
    environment: ExecutionEnvironment,
}

impl ChromeRasterizer {
    pub fn new(executable: impl Into<PathBuf>, environment: ExecutionEnvironment) -> Self {
        Self {
            executable: executable.into(),
            environment,
        }
    }

    /// Use `config.browser_path` if set, otherwise discover a browser for
    /// `config.environment`.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, WorkOrderError> {
        let executable = match &config.browser_path {
            Some(path) if path.is_file() => path.clone(),
            Some(path) => {
                return Err(LocateError::OverrideMissing { path: path.clone() }.into());
            }
            None => locate_browser(config.environment)?,
        };
        debug!(
            "Using browser {} ({} profile)",
            executable.display(),
            config.environment
        );
        Ok(Self::new(executable, config.environment))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Full argument list for one print run.
    fn command_args(
        &self,
        html_path: &Path,
        pdf_path: &Path,
        profile_dir: &Path,
        layout: &PageLayout,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--headless".into()];
        args.extend(launch_args(self.environment).iter().map(OsString::from));

        let mut profile = OsString::from("--user-data-dir=");
        profile.push(profile_dir);
        args.push(profile);

        args.push("--no-pdf-header-footer".into());
        if layout.wait_until == WaitUntil::NetworkIdle {
            args.push(format!("--virtual-time-budget={NETWORK_IDLE_BUDGET_MS}").into());
        }

        let mut out = OsString::from("--print-to-pdf=");
        out.push(pdf_path);
        args.push(out);

        args.push(file_url(html_path).into());
        args
    }

    async fn print(&self, markup: &str, layout: &PageLayout) -> Result<Vec<u8>, WorkOrderError> {
        let work = TempDir::new().map_err(|e| WorkOrderError::Internal(format!("tempdir: {e}")))?;
        let html_path = work.path().join("report.html");
        let pdf_path = work.path().join("report.pdf");
        let profile_dir = work.path().join("profile");

        tokio::fs::write(&html_path, markup)
            .await
            .map_err(|e| WorkOrderError::Internal(format!("write report markup: {e}")))?;

        let args = self.command_args(&html_path, &pdf_path, &profile_dir, layout);
        debug!("Launching {} {:?}", self.executable.display(), args);

        let output = tokio::process::Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| WorkOrderError::RenderFailed {
                message: format!("cannot launch {}: {e}", self.executable.display()),
            })?;

        if !output.status.success() {
            return Err(WorkOrderError::RenderFailed {
                message: format!(
                    "{} exited with {}: {}",
                    self.executable.display(),
                    output.status,
                    stderr_tail(&output.stderr)
                ),
            });
        }

        let pdf = tokio::fs::read(&pdf_path)
            .await
            .map_err(|e| WorkOrderError::RenderFailed {
                message: format!(
                    "browser produced no PDF ({e}): {}",
                    stderr_tail(&output.stderr)
                ),
            })?;

        if !pdf.starts_with(PDF_MAGIC) {
            return Err(WorkOrderError::RenderFailed {
                message: format!("output is not a PDF ({} bytes)", pdf.len()),
            });
        }
        Ok(pdf)
    }
}

impl DocumentRasterizer for ChromeRasterizer {
    fn rasterize<'a>(
        &'a self,
        markup: &'a str,
        layout: &'a PageLayout,
    ) -> BoxFuture<'a, Result<Vec<u8>, WorkOrderError>> {
        self.print(markup, layout).boxed()
    }
}

fn file_url(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    if s.starts_with('/') {
        format!("file://{s}")
    } else {
        format!("file:///{s}")
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("…{}", &text[start..])
}
