//! Drawing surfaces: the paginated 2-D canvas the layout engine draws onto.
//!
//! The engine only talks to [`DrawingSurface`]. Two implementations ship
//! with the crate:
//!
//! * [`PdfSurface`] writes a real PDF with the standard-14 fonts via lopdf.
//! * [`RecordingSurface`] records every drawing call per page; used for
//!   previews and for asserting on layout decisions in tests.
//!
//! ## Coordinates
//!
//! All units are PDF points (1/72 in). The origin is the **top-left** corner
//! of the page and `y` grows downwards, matching how the layout cursor moves.
//! `draw_text` takes the baseline position. Surfaces that need another
//! convention (PDF is bottom-up) flip internally.

pub mod metrics;
mod pdf;
mod recording;
pub mod wrap;

pub use pdf::PdfSurface;
pub use recording::{DrawOp, RecordingSurface};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An RGB colour with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels scaled to `0.0..=1.0` for PDF colour operators.
    pub fn unit(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

/// Built-in font families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFamily {
    /// Proportional sans-serif body face.
    #[default]
    Helvetica,
    /// Fixed-width face for code.
    Courier,
}

/// Weight and slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

/// How a rectangle is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Paint {
    Fill,
    Stroke,
    FillStroke,
}

/// Portrait page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// US Letter, 8.5 × 11 in. (default)
    #[default]
    Letter,
    /// ISO A4, 210 × 297 mm.
    A4,
    /// US Legal, 8.5 × 14 in.
    Legal,
    /// Arbitrary width × height in points.
    Custom { width: f32, height: f32 },
}

impl PageSize {
    /// `(width, height)` in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.28, 841.89),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Letter => write!(f, "letter"),
            PageSize::A4 => write!(f, "a4"),
            PageSize::Legal => write!(f, "legal"),
            PageSize::Custom { width, height } => write!(f, "{width}x{height}"),
        }
    }
}

/// Accepts `letter`, `a4`, `legal` or `<width>x<height>` in points.
impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "letter" => return Ok(PageSize::Letter),
            "a4" => return Ok(PageSize::A4),
            "legal" => return Ok(PageSize::Legal),
            _ => {}
        }

        let invalid = || format!("invalid page size '{s}' (expected letter, a4, legal or WxH)");
        let (w, h) = lower.split_once('x').ok_or_else(invalid)?;
        let width: f32 = w.trim().parse().map_err(|_| invalid())?;
        let height: f32 = h.trim().parse().map_err(|_| invalid())?;
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(invalid());
        }
        Ok(PageSize::Custom { width, height })
    }
}

/// A stateful, paginated 2-D canvas.
///
/// Font, colour and line-width setters change state for subsequent calls,
/// like a PDF graphics state. A freshly constructed surface already has one
/// page, black text and the normal Helvetica face.
pub trait DrawingSurface {
    fn page_width(&self) -> f32;
    fn page_height(&self) -> f32;

    /// Number of pages so far (≥ 1).
    fn page_count(&self) -> usize;

    /// Append a blank page; subsequent drawing goes to it.
    fn add_page(&mut self);

    fn set_font(&mut self, family: FontFamily, style: FontStyle);
    fn set_font_size(&mut self, size: f32);
    fn set_text_color(&mut self, color: Color);
    fn set_fill_color(&mut self, color: Color);
    fn set_stroke_color(&mut self, color: Color);
    fn set_line_width(&mut self, width: f32);

    /// Restore the default black text colour.
    fn reset_text_color(&mut self) {
        self.set_text_color(Color::BLACK);
    }

    /// Draw `text` with its baseline at `y`.
    fn draw_text(&mut self, text: &str, x: f32, y: f32);
    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32);

    /// Draw a rectangle whose top-left corner is `(x, y)`.
    fn draw_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        paint: Paint,
        corner_radius: Option<f32>,
    );

    /// Width of `text` in the current font and size.
    fn text_width(&self, text: &str) -> f32;

    /// Wrap `text` to `max_width` in the current font and size.
    fn split_text_to_size(&self, text: &str, max_width: f32) -> Vec<String> {
        wrap::wrap_text(text, max_width, |s| self.text_width(s))
    }
}
