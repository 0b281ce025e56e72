//! # chrome-locate
//!
//! Find a headless Chrome / Chromium executable for the current execution
//! environment and hand back the launch flags that environment needs.
//!
//! ## How it works
//!
//! [`locate_browser`] walks a fixed list of candidates, first match wins:
//!
//! 1. `CHROME_PATH`: explicit override, used as-is when the file exists.
//! 2. Serverless only: `CHROMIUM_PATH`, then the paths serverless Chromium
//!    layers unpack to (`/tmp/chromium`, `/opt/chromium/chromium`, …).
//! 3. Platform install locations (`/Applications/Google Chrome.app/…`,
//!    `C:\Program Files\Google\Chrome\…`, `/usr/bin/google-chrome`, …).
//! 4. Well-known executable names searched on `PATH`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrome_locate::{launch_args, locate_browser, ExecutionEnvironment};
//!
//! let env = ExecutionEnvironment::detect();
//! let chrome = locate_browser(env).expect("no browser installed");
//! println!("{} {:?}", chrome.display(), launch_args(env));
//! ```
//!
//! ## Environment variable overrides
//!
//! - `CHROME_PATH`: path to a browser executable; skips discovery.
//! - `CHROMIUM_PATH`: serverless Chromium location.
//! - `WORKORDER_SERVERLESS`: force [`ExecutionEnvironment::Serverless`]
//!   (`1`/`true`) or [`ExecutionEnvironment::Local`] (`0`/`false`).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by chrome-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// No candidate path pointed at an existing file.
    #[error(
        "No Chrome/Chromium executable found for {env} execution.\n\
Searched: {searched}\n\
Set CHROME_PATH=/path/to/chrome to point at an existing browser."
    )]
    NotFound {
        env: ExecutionEnvironment,
        searched: String,
    },

    /// `CHROME_PATH` is set but does not point at a file.
    #[error("CHROME_PATH '{path}' does not exist")]
    OverrideMissing { path: PathBuf },

    /// An execution-environment name could not be parsed.
    #[error("Unknown execution environment '{0}' (expected 'serverless' or 'local')")]
    UnknownEnvironment(String),
}

// ── Execution environment ────────────────────────────────────────────────────

/// Where the rendering engine is going to run.
///
/// Serverless sandboxes have no setuid helper, a tiny `/dev/shm` and a single
/// CPU, so the browser must be launched single-process with the sandbox off.
/// Local machines only need the flags that keep a headless run quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionEnvironment {
    /// Constrained function runtime (Vercel, AWS Lambda, …).
    Serverless,
    /// Unrestricted developer machine or container. (default)
    #[default]
    Local,
}

impl ExecutionEnvironment {
    /// Detect the environment from process variables.
    ///
    /// `WORKORDER_SERVERLESS` wins when set; otherwise the presence of
    /// `VERCEL` or `AWS_LAMBDA_FUNCTION_NAME` means serverless.
    pub fn detect() -> Self {
        if let Ok(v) = std::env::var("WORKORDER_SERVERLESS") {
            return match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Self::Serverless,
                _ => Self::Local,
            };
        }
        let serverless = ["VERCEL", "AWS_LAMBDA_FUNCTION_NAME"]
            .iter()
            .any(|key| std::env::var_os(key).is_some_and(|v| !v.is_empty()));
        if serverless {
            Self::Serverless
        } else {
            Self::Local
        }
    }
}

impl fmt::Display for ExecutionEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serverless => f.write_str("serverless"),
            Self::Local => f.write_str("local"),
        }
    }
}

impl FromStr for ExecutionEnvironment {
    type Err = LocateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serverless" | "lambda" | "vercel" => Ok(Self::Serverless),
            "local" => Ok(Self::Local),
            other => Err(LocateError::UnknownEnvironment(other.to_string())),
        }
    }
}

// ── Launch flags ─────────────────────────────────────────────────────────────

const LOCAL_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
];

const SERVERLESS_ARGS: &[&str] = &[
    "--disable-gpu",
    "--single-process",
    "--no-zygote",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-web-security",
    "--disable-features=IsolateOrigins,site-per-process",
];

/// Browser flags for the given environment.
///
/// Callers append their own `--headless`, profile and output flags.
pub fn launch_args(env: ExecutionEnvironment) -> &'static [&'static str] {
    match env {
        ExecutionEnvironment::Serverless => SERVERLESS_ARGS,
        ExecutionEnvironment::Local => LOCAL_ARGS,
    }
}

// ── Discovery ────────────────────────────────────────────────────────────────

const PATH_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

const SERVERLESS_PATHS: &[&str] = &[
    "/tmp/chromium",
    "/opt/chromium/chromium",
    "/opt/chrome/chrome",
    "/var/task/chromium",
];

/// Candidate install locations for this OS, most common first.
pub fn platform_candidates() -> Vec<PathBuf> {
    let mut out = Vec::new();
    match std::env::consts::OS {
        "macos" => {
            let app = "Google Chrome.app/Contents/MacOS/Google Chrome";
            out.push(PathBuf::from("/Applications").join(app));
            if let Some(home) = dirs::home_dir() {
                out.push(home.join("Applications").join(app));
            }
            out.push(PathBuf::from(
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
            ));
        }
        "windows" => {
            out.push(PathBuf::from(
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            ));
            out.push(PathBuf::from(
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ));
            if let Some(local) = dirs::data_local_dir() {
                out.push(local.join(r"Google\Chrome\Application\chrome.exe"));
            }
        }
        _ => {
            for p in [
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/snap/bin/chromium",
            ] {
                out.push(PathBuf::from(p));
            }
        }
    }
    out
}

/// Every path [`locate_browser`] would try, in order, without touching the
/// file system. Environment overrides are included when set.
pub fn candidates(env: ExecutionEnvironment) -> Vec<PathBuf> {
    let mut out = Vec::new();

    if env == ExecutionEnvironment::Serverless {
        if let Some(p) = non_empty_var("CHROMIUM_PATH") {
            out.push(PathBuf::from(p));
        }
        out.extend(SERVERLESS_PATHS.iter().map(PathBuf::from));
    }

    out.extend(platform_candidates());

    if let Some(path_var) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path_var) {
            for name in PATH_NAMES {
                out.push(dir.join(executable_name(name)));
            }
        }
    }

    out
}

/// Resolve the browser executable for `env`.
///
/// `CHROME_PATH` short-circuits discovery; when it is set but missing the
/// caller gets [`LocateError::OverrideMissing`] instead of a silent fallback
/// to some other browser.
pub fn locate_browser(env: ExecutionEnvironment) -> Result<PathBuf, LocateError> {
    if let Some(p) = non_empty_var("CHROME_PATH") {
        let path = PathBuf::from(p);
        return if path.is_file() {
            Ok(path)
        } else {
            Err(LocateError::OverrideMissing { path })
        };
    }

    let searched = candidates(env);
    if let Some(found) = searched.iter().find(|p| p.is_file()) {
        return Ok(found.clone());
    }

    Err(LocateError::NotFound {
        env,
        searched: summarize(&searched),
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

fn summarize(paths: &[PathBuf]) -> String {
    const SHOWN: usize = 6;
    let mut parts: Vec<String> = paths
        .iter()
        .take(SHOWN)
        .map(|p| p.display().to_string())
        .collect();
    if paths.len() > SHOWN {
        parts.push(format!("… and {} more", paths.len() - SHOWN));
    }
    parts.join(", ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
