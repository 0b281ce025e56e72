//! Configuration types for work-order document generation.
//!
//! All behaviour is controlled through [`GeneratorConfig`], built via its
//! [`GeneratorConfigBuilder`]. One struct carries every knob so the same
//! value can be shared by the parser, both generators and the rasterizer.

use crate::error::WorkOrderError;
use chrome_locate::ExecutionEnvironment;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default label used for generated file names and the sheet name.
pub const DEFAULT_DOCUMENT_LABEL: &str = "작업지시서";

/// Configuration for parsing uploads and generating documents.
///
/// # Example
/// ```rust
/// use workorder_docs::{GeneratorConfig, QuantityPolicy};
///
/// let config = GeneratorConfig::builder()
///     .quantity_policy(QuantityPolicy::Strict)
///     .render_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.render_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// What to do with a quantity cell that is not a non-negative integer.
    /// Default: [`QuantityPolicy::Lenient`].
    pub quantity_policy: QuantityPolicy,

    /// `chrono` format applied to date-typed cells (A1 and outbound dates).
    /// Text cells are never reformatted. Default: `%Y-%m-%d`.
    pub date_format: String,

    /// Prefix of generated file names and the generated sheet's name.
    /// Default: `작업지시서`.
    pub document_label: String,

    /// Page geometry handed to the renderer and the rasterizer.
    pub layout: PageLayout,

    /// Hard limit on one rasterization in seconds. Default: 60.
    ///
    /// The engine is killed and its temp files removed when this elapses.
    pub render_timeout_secs: u64,

    /// Which browser launch profile to use. Default: detected from env.
    #[serde(skip, default = "ExecutionEnvironment::detect")]
    pub environment: ExecutionEnvironment,

    /// Explicit browser executable. `None` runs discovery.
    pub browser_path: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            quantity_policy: QuantityPolicy::default(),
            date_format: "%Y-%m-%d".to_string(),
            document_label: DEFAULT_DOCUMENT_LABEL.to_string(),
            layout: PageLayout::default(),
            render_timeout_secs: 60,
            environment: ExecutionEnvironment::detect(),
            browser_path: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a new builder for `GeneratorConfig`.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    pub fn quantity_policy(mut self, policy: QuantityPolicy) -> Self {
        self.config.quantity_policy = policy;
        self
    }

    pub fn date_format(mut self, fmt: impl Into<String>) -> Self {
        self.config.date_format = fmt.into();
        self
    }

    pub fn document_label(mut self, label: impl Into<String>) -> Self {
        self.config.document_label = label.into();
        self
    }

    pub fn layout(mut self, layout: PageLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn environment(mut self, env: ExecutionEnvironment) -> Self {
        self.config.environment = env;
        self
    }

    pub fn browser_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.browser_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GeneratorConfig, WorkOrderError> {
        let c = &self.config;
        if c.render_timeout_secs == 0 {
            return Err(WorkOrderError::InvalidConfig(
                "Render timeout must be ≥ 1 second".into(),
            ));
        }
        if c.date_format.trim().is_empty() {
            return Err(WorkOrderError::InvalidConfig(
                "Date format must not be empty".into(),
            ));
        }
        if StrftimeItems::new(&c.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(WorkOrderError::InvalidConfig(format!(
                "Date format '{}' is not a valid strftime pattern",
                c.date_format
            )));
        }
        if c.document_label.trim().is_empty() {
            return Err(WorkOrderError::InvalidConfig(
                "Document label must not be empty".into(),
            ));
        }
        if c.document_label.chars().any(|ch| matches!(ch, '/' | '\\' | ':')) {
            return Err(WorkOrderError::InvalidConfig(format!(
                "Document label '{}' must not contain path separators",
                c.document_label
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Policy for quantity cells that cannot be read as a non-negative integer.
///
/// `Lenient` reports each patched cell as a [`crate::error::CellWarning`];
/// `Strict` refuses the upload and names the offending cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuantityPolicy {
    /// Coerce to the field default and warn. (default)
    #[default]
    Lenient,
    /// Reject with [`WorkOrderError::InvalidQuantity`].
    Strict,
}

/// Physical paper size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
}

impl PaperSize {
    /// CSS `@page size` keyword.
    pub fn css_name(self) -> &'static str {
        match self {
            PaperSize::A4 => "A4",
            PaperSize::Letter => "letter",
        }
    }
}

/// When the rasterizer may consider the page laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaitUntil {
    /// Print as soon as the DOM is parsed. The report has no external
    /// resources, so this is enough. (default)
    #[default]
    DomContentLoaded,
    /// Give the page a budget to settle fonts and images first.
    NetworkIdle,
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top_mm: f32,
    pub right_mm: f32,
    pub bottom_mm: f32,
    pub left_mm: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top_mm: 10.0,
            right_mm: 8.0,
            bottom_mm: 10.0,
            left_mm: 8.0,
        }
    }
}

impl Margins {
    /// CSS shorthand in top/right/bottom/left order.
    pub fn css(&self) -> String {
        format!(
            "{}mm {}mm {}mm {}mm",
            self.top_mm, self.right_mm, self.bottom_mm, self.left_mm
        )
    }
}

/// Layout intent shared by the report renderer and the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub paper: PaperSize,
    pub landscape: bool,
    pub margins: Margins,
    pub print_background: bool,
    pub wait_until: WaitUntil,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            landscape: true,
            margins: Margins::default(),
            print_background: true,
            wait_until: WaitUntil::default(),
        }
    }
}

impl PageLayout {
    /// Value of the CSS `@page size` descriptor, e.g. `A4 landscape`.
    pub fn css_size(&self) -> String {
        let orientation = if self.landscape { "landscape" } else { "portrait" };
        format!("{} {}", self.paper.css_name(), orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_report_layout() {
        let c = GeneratorConfig::default();
        assert_eq!(c.quantity_policy, QuantityPolicy::Lenient);
        assert_eq!(c.render_timeout_secs, 60);
        assert_eq!(c.document_label, "작업지시서");
        assert!(c.layout.landscape);
        assert_eq!(c.layout.css_size(), "A4 landscape");
        assert_eq!(c.layout.margins.css(), "10mm 8mm 10mm 8mm");
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = GeneratorConfig::builder()
            .render_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, WorkOrderError::InvalidConfig(_)));
    }

    #[test]
    fn bad_strftime_rejected() {
        assert!(GeneratorConfig::builder().date_format("%Q").build().is_err());
    }

    #[test]
    fn label_with_separator_rejected() {
        assert!(GeneratorConfig::builder()
            .document_label("a/b")
            .build()
            .is_err());
    }

    #[test]
    fn builder_sets_fields() {
        let c = GeneratorConfig::builder()
            .quantity_policy(QuantityPolicy::Strict)
            .date_format("%Y/%m/%d")
            .environment(ExecutionEnvironment::Serverless)
            .browser_path("/opt/chrome/chrome")
            .build()
            .unwrap();
        assert_eq!(c.quantity_policy, QuantityPolicy::Strict);
        assert_eq!(c.date_format, "%Y/%m/%d");
        assert_eq!(c.environment, ExecutionEnvironment::Serverless);
        assert_eq!(c.browser_path, Some(PathBuf::from("/opt/chrome/chrome")));
    }

    #[test]
    fn portrait_letter_css() {
        let layout = PageLayout {
            paper: PaperSize::Letter,
            landscape: false,
            ..Default::default()
        };
        assert_eq!(layout.css_size(), "letter portrait");
    }
}
