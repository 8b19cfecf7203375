//! Configuration types for Markdown-to-PDF export.
//!
//! Every export knob lives in [`ExportConfig`], built through
//! [`ExportConfigBuilder`]. Setters clamp obviously out-of-range values;
//! [`ExportConfigBuilder::build`] rejects combinations that cannot produce a
//! document at all.

use crate::error::ExportError;
use crate::layout::{CellOverflow, LayoutOptions};
use crate::progress::{ExportProgressCallback, ProgressCallback};
use crate::surface::PageSize;
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;

/// Smallest content box (width and height, in points) a page must leave
/// once margins are taken off. One 24pt heading line must fit.
pub const MIN_CONTENT_EXTENT: f32 = 72.0;

/// Configuration for one export.
///
/// Built via [`ExportConfig::builder()`] or [`ExportConfig::default()`].
///
/// # Example
/// ```rust
/// use markpage::{ExportConfig, PageSize};
///
/// let config = ExportConfig::builder()
///     .page_size(PageSize::A4)
///     .margin(40.0)
///     .filename_prefix("lecture")
///     .build()
///     .unwrap();
/// assert_eq!(config.filename_prefix, "lecture");
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Page dimensions. Default: [`PageSize::Letter`].
    pub page_size: PageSize,

    /// Symmetric page margin in points. Default: 50.
    pub margin: f32,

    /// Filename stem; the artifact is named `{prefix}-{YYYY-MM-DD}.pdf`.
    /// Default: `notes`.
    pub filename_prefix: String,

    /// Document title written to the PDF info dictionary.
    pub title: Option<String>,

    /// Date used in the filename. `None` means today in UTC.
    pub date: Option<NaiveDate>,

    /// How table cells that need more than one line are shortened.
    /// Default: [`CellOverflow::Ellipsis`].
    pub cell_overflow: CellOverflow,

    /// Optional progress callback for stage-level events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            margin: 50.0,
            filename_prefix: "notes".to_string(),
            title: None,
            date: None,
            cell_overflow: CellOverflow::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("page_size", &self.page_size)
            .field("margin", &self.margin)
            .field("filename_prefix", &self.filename_prefix)
            .field("title", &self.title)
            .field("date", &self.date)
            .field("cell_overflow", &self.cell_overflow)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExportProgressCallback>"),
            )
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }

    /// The slice of the configuration the layout engine needs.
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            margin: self.margin,
            cell_overflow: self.cell_overflow,
        }
    }

    /// Check that the configuration can produce a document.
    pub fn validate(&self) -> Result<(), ExportError> {
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(ExportError::InvalidConfig(format!(
                "margin must be a finite, non-negative number of points (got {})",
                self.margin
            )));
        }

        let (width, height) = self.page_size.dimensions();
        if !width.is_finite() || !height.is_finite() {
            return Err(ExportError::InvalidConfig(format!(
                "page size {width}×{height}pt is not finite"
            )));
        }
        let content_w = width - 2.0 * self.margin;
        let content_h = height - 2.0 * self.margin;
        if content_w < MIN_CONTENT_EXTENT || content_h < MIN_CONTENT_EXTENT {
            return Err(ExportError::InvalidConfig(format!(
                "margin {}pt leaves a {:.0}×{:.0}pt content area on a {:.0}×{:.0}pt page \
                 (need at least {MIN_CONTENT_EXTENT}pt each way)",
                self.margin,
                content_w.max(0.0),
                content_h.max(0.0),
                width,
                height
            )));
        }

        let prefix = self.filename_prefix.trim();
        if prefix.is_empty() {
            return Err(ExportError::InvalidConfig(
                "filename prefix must not be empty".into(),
            ));
        }
        if prefix.contains(['/', '\\']) || prefix == "." || prefix == ".." {
            return Err(ExportError::InvalidConfig(format!(
                "filename prefix '{prefix}' must not contain path separators"
            )));
        }
        Ok(())
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    /// Negative or non-finite margins become 0.
    pub fn margin(mut self, points: f32) -> Self {
        self.config.margin = if points.is_finite() { points.max(0.0) } else { 0.0 };
        self
    }

    pub fn filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.filename_prefix = prefix.into().trim().to_string();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.config.date = Some(date);
        self
    }

    pub fn cell_overflow(mut self, overflow: CellOverflow) -> Self {
        self.config.cell_overflow = overflow;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ExportProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExportConfig, ExportError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
