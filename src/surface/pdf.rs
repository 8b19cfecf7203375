//! PDF output via lopdf, using only the standard-14 fonts.
//!
//! Drawing calls append content-stream operations to the current page.
//! Nothing touches a [`lopdf::Document`] until [`PdfSurface::finish`], which
//! assembles the page tree, a shared font resource dictionary and the info
//! dictionary, then serialises everything in one go.

use super::metrics::{self, Charset};
use super::{Color, DrawingSurface, FontFamily, FontStyle, PageSize, Paint};
use crate::error::ExportError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use tracing::debug;

/// Resource name, base font, and whether the font takes WinAnsi encoding.
const FONTS: [(&str, &str, bool); 10] = [
    ("F1", "Helvetica", true),
    ("F2", "Helvetica-Bold", true),
    ("F3", "Helvetica-Oblique", true),
    ("F4", "Helvetica-BoldOblique", true),
    ("F5", "Courier", true),
    ("F6", "Courier-Bold", true),
    ("F7", "Courier-Oblique", true),
    ("F8", "Courier-BoldOblique", true),
    ("F9", "Symbol", false),
    ("F10", "ZapfDingbats", false),
];

/// Bézier control-point factor for quarter circles.
const KAPPA: f32 = 0.552_284_8;

fn font_resource(family: FontFamily, style: FontStyle, charset: Charset) -> &'static str {
    match charset {
        Charset::Symbol => "F9",
        Charset::Dingbats => "F10",
        Charset::WinAnsi => match (family, style) {
            (FontFamily::Helvetica, FontStyle::Normal) => "F1",
            (FontFamily::Helvetica, FontStyle::Bold) => "F2",
            (FontFamily::Helvetica, FontStyle::Italic) => "F3",
            (FontFamily::Helvetica, FontStyle::BoldItalic) => "F4",
            (FontFamily::Courier, FontStyle::Normal) => "F5",
            (FontFamily::Courier, FontStyle::Bold) => "F6",
            (FontFamily::Courier, FontStyle::Italic) => "F7",
            (FontFamily::Courier, FontStyle::BoldItalic) => "F8",
        },
    }
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn color_op(operator: &str, color: Color) -> Operation {
    let [r, g, b] = color.unit();
    op(operator, vec![r.into(), g.into(), b.into()])
}

/// A [`DrawingSurface`] that produces a PDF document.
pub struct PdfSurface {
    width: f32,
    height: f32,
    pages: Vec<Vec<Operation>>,
    family: FontFamily,
    style: FontStyle,
    size: f32,
    text_color: Color,
    fill_color: Color,
    stroke_color: Color,
    line_width: f32,
}

impl PdfSurface {
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

    /// Flip a top-down `y` into PDF user space.
    fn flip(&self, y: f32) -> f32 {
        self.height - y
    }

    fn emit(&mut self, ops: impl IntoIterator<Item = Operation>) {
        if let Some(page) = self.pages.last_mut() {
            page.extend(ops);
        }
    }

    fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, r: f32) -> Vec<Operation> {
        let r = r.min(w / 2.0).min(h / 2.0);
        let k = KAPPA * r;
        let (x0, y0, x1, y1) = (x, y, x + w, y + h);
        vec![
            op("m", vec![(x0 + r).into(), y0.into()]),
            op("l", vec![(x1 - r).into(), y0.into()]),
            op(
                "c",
                vec![
                    (x1 - r + k).into(),
                    y0.into(),
                    x1.into(),
                    (y0 + r - k).into(),
                    x1.into(),
                    (y0 + r).into(),
                ],
            ),
            op("l", vec![x1.into(), (y1 - r).into()]),
            op(
                "c",
                vec![
                    x1.into(),
                    (y1 - r + k).into(),
                    (x1 - r + k).into(),
                    y1.into(),
                    (x1 - r).into(),
                    y1.into(),
                ],
            ),
            op("l", vec![(x0 + r).into(), y1.into()]),
            op(
                "c",
                vec![
                    (x0 + r - k).into(),
                    y1.into(),
                    x0.into(),
                    (y1 - r + k).into(),
                    x0.into(),
                    (y1 - r).into(),
                ],
            ),
            op("l", vec![x0.into(), (y0 + r).into()]),
            op(
                "c",
                vec![
                    x0.into(),
                    (y0 + r - k).into(),
                    (x0 + r - k).into(),
                    y0.into(),
                    (x0 + r).into(),
                    y0.into(),
                ],
            ),
            op("h", vec![]),
        ]
    }

    /// Serialise every page into a complete PDF file.
    pub fn finish(self, title: Option<&str>) -> Result<Vec<u8>, ExportError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for (name, base, win_ansi) in FONTS {
            let mut font = dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base,
            };
            if win_ansi {
                font.set("Encoding", "WinAnsiEncoding");
            }
            let font_id = doc.add_object(font);
            fonts.set(name, font_id);
        }
        let resources_id = doc.add_object(dictionary! { "Font" => fonts });

        let page_total = self.pages.len();
        let mut kids: Vec<Object> = Vec::with_capacity(page_total);
        for operations in self.pages {
            let encoded = Content { operations }
                .encode()
                .map_err(|e| ExportError::Render {
                    detail: format!("content stream encoding failed: {e}"),
                })?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_total as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), self.width.into(), self.height.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::String(b"markpage".to_vec(), StringFormat::Literal),
        };
        if let Some(title) = title {
            let encoded: Vec<u8> = metrics::encode_runs(title)
                .into_iter()
                .filter(|run| run.charset == Charset::WinAnsi)
                .flat_map(|run| run.bytes)
                .collect();
            info.set("Title", Object::String(encoded, StringFormat::Literal));
        }
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(|e| ExportError::Render {
            detail: format!("PDF serialisation failed: {e}"),
        })?;
        debug!(pages = page_total, bytes = bytes.len(), "PDF serialised");
        Ok(bytes)
    }
}

impl DrawingSurface for PdfSurface {
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
        let runs = metrics::encode_runs(text);
        if runs.is_empty() {
            return;
        }

        let mut ops = vec![
            op("q", vec![]),
            color_op("rg", self.text_color),
            op("BT", vec![]),
            op("Td", vec![x.into(), self.flip(y).into()]),
        ];
        for run in runs {
            let font = font_resource(self.family, self.style, run.charset);
            ops.push(op("Tf", vec![font.into(), self.size.into()]));
            ops.push(op("Tj", vec![Object::String(run.bytes, StringFormat::Literal)]));
        }
        ops.push(op("ET", vec![]));
        ops.push(op("Q", vec![]));
        self.emit(ops);
    }

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let ops = vec![
            op("q", vec![]),
            color_op("RG", self.stroke_color),
            op("w", vec![self.line_width.into()]),
            op("m", vec![x1.into(), self.flip(y1).into()]),
            op("l", vec![x2.into(), self.flip(y2).into()]),
            op("S", vec![]),
            op("Q", vec![]),
        ];
        self.emit(ops);
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
        let bottom = self.flip(y + height);
        let mut ops = vec![
            op("q", vec![]),
            color_op("rg", self.fill_color),
            color_op("RG", self.stroke_color),
            op("w", vec![self.line_width.into()]),
        ];
        match corner_radius {
            Some(r) if r > 0.0 => ops.extend(Self::rounded_rect_path(x, bottom, width, height, r)),
            _ => ops.push(op(
                "re",
                vec![x.into(), bottom.into(), width.into(), height.into()],
            )),
        }
        let paint_op = match paint {
            Paint::Fill => "f",
            Paint::Stroke => "S",
            Paint::FillStroke => "B",
        };
        ops.push(op(paint_op, vec![]));
        ops.push(op("Q", vec![]));
        self.emit(ops);
    }

    fn text_width(&self, text: &str) -> f32 {
        metrics::text_width(text, self.family, self.style, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_produces_pdf_header() {
        let mut s = PdfSurface::new(PageSize::Letter);
        s.draw_text("Hello", 50.0, 60.0);
        let bytes = s.finish(Some("Notes")).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn one_content_stream_per_page() {
        let mut s = PdfSurface::new(PageSize::A4);
        s.draw_text("one", 50.0, 60.0);
        s.add_page();
        s.draw_rect(50.0, 60.0, 100.0, 20.0, Paint::Fill, Some(3.0));
        s.add_page();
        s.draw_line(50.0, 60.0, 200.0, 60.0);
        assert_eq!(s.page_count(), 3);
        let bytes = s.finish(None).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn text_is_flipped_into_pdf_space() {
        let mut s = PdfSurface::new(PageSize::Letter);
        s.draw_text("x", 10.0, 92.0);
        let td = s.pages[0]
            .iter()
            .find(|o| o.operator == "Td")
            .expect("Td operator");
        assert_eq!(td.operands[1], Object::Real(700.0));
    }

    #[test]
    fn mixed_charsets_switch_fonts() {
        let mut s = PdfSurface::new(PageSize::Letter);
        s.set_font(FontFamily::Helvetica, FontStyle::Bold);
        s.draw_text("x ≤ y", 10.0, 20.0);
        let fonts: Vec<String> = s.pages[0]
            .iter()
            .filter(|o| o.operator == "Tf")
            .map(|o| String::from_utf8_lossy(o.operands[0].as_name().unwrap()).into_owned())
            .collect();
        assert_eq!(fonts, vec!["F2", "F9", "F2"]);
    }

    #[test]
    fn empty_text_emits_nothing() {
        let mut s = PdfSurface::new(PageSize::Letter);
        s.draw_text("", 10.0, 20.0);
        assert!(s.pages[0].is_empty());
    }
}
