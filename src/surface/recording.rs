use super::{metrics, Color, DrawingSurface, FontFamily, FontStyle, PageSize, Paint};
use serde::Serialize;

/// One recorded drawing call, with the graphics state that applied to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        y: f32,
        family: FontFamily,
        style: FontStyle,
        size: f32,
        color: Color,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
        width: f32,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        paint: Paint,
        corner_radius: Option<f32>,
        fill: Color,
        stroke: Color,
    },
}

impl DrawOp {
    /// The vertical coordinate the op was emitted at (top edge for rects).
    pub fn y(&self) -> f32 {
        match self {
            DrawOp::Text { y, .. } | DrawOp::Rect { y, .. } => *y,
            DrawOp::Line { y1, y2, .. } => y1.min(*y2),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DrawOp::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// A surface that records [`DrawOp`]s per page instead of producing bytes.
///
/// Measurement uses the same font metrics as [`super::PdfSurface`], so the
/// recorded layout is the layout the PDF would get.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    pages: Vec<Vec<DrawOp>>,
    family: FontFamily,
    style: FontStyle,
    size: f32,
    text_color: Color,
    fill_color: Color,
    stroke_color: Color,
    line_width: f32,
}

impl RecordingSurface {
    pub fn new(page_size: PageSize) -> Self {
        let (width, height) = page_size.dimensions();
        Self {
            width,
            height,
            pages: vec![Vec::new()],
            family: FontFamily::default(),
            style: FontStyle::default(),
            size: 12.0,
            text_color: Color::BLACK,
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: 1.0,
        }
    }

    pub fn pages(&self) -> &[Vec<DrawOp>] {
        &self.pages
    }

    /// All ops across pages, in emission order.
    pub fn ops(&self) -> impl Iterator<Item = &DrawOp> {
        self.pages.iter().flatten()
    }

    /// Text strings drawn on every page, in emission order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops().filter_map(DrawOp::as_text).collect()
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.push(op);
        }
    }
}

impl DrawingSurface for RecordingSurface {
    fn page_width(&self) -> f32 {
        self.width
    }

    fn page_height(&self) -> f32 {
        self.height
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn set_font(&mut self, family: FontFamily, style: FontStyle) {
        self.family = family;
        self.style = style;
    }

    fn set_font_size(&mut self, size: f32) {
        self.size = size;
    }

    fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.stroke_color = color;
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32) {
        let op = DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            family: self.family,
            style: self.style,
            size: self.size,
            color: self.text_color,
        };
        self.push(op);
    }

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let op = DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            color: self.stroke_color,
            width: self.line_width,
        };
        self.push(op);
    }

    fn draw_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        paint: Paint,
        corner_radius: Option<f32>,
    ) {
        let op = DrawOp::Rect {
            x,
            y,
            width,
            height,
            paint,
            corner_radius,
            fill: self.fill_color,
            stroke: self.stroke_color,
        };
        self.push(op);
    }

    fn text_width(&self, text: &str) -> f32 {
        metrics::text_width(text, self.family, self.style, self.size)
    }
}
