//! Page layout engine: sanitized HTML → drawing calls on a paginated surface.
//!
//! ## How it works
//!
//! ```text
//! html ──▶ dom::parse_html ──▶ Node tree ──▶ LayoutEngine::layout_node ──▶ DrawingSurface
//!                                                 │
//!                                          &mut LayoutState
//!                                   (cursor, list depth, counters)
//! ```
//!
//! One linear, depth-first walk with no backtracking. Each element is mapped
//! to a closed [`Tag`] and handled by an exhaustive `match`; unknown
//! elements are transparent and their children are laid out in their place.
//!
//! ## Vertical contract
//!
//! | Tag        | before | render                                 | after |
//! |------------|--------|----------------------------------------|-------|
//! | h1         | 20     | bold 24                                | 10    |
//! | h2         | 16     | bold 18                                | 8     |
//! | h3         | 12     | bold 14                                | 6     |
//! | h4–h6      | 10     | bold 12                                | 4     |
//! | p          | 0      | 11, indent = depth × 20                | 8     |
//! | ul / ol    |        | items, positional numbering            | 6 at depth 0 |
//! | blockquote | 8      | italic 11, gray, indent 20, left rule  | 8     |
//! | pre        | 8      | Courier 10 on rounded background       | 8     |
//! | table      | 10     | one row per line, equal columns        | 10    |
//! | hr         | 15     | rule across the content width          | 15    |
//!
//! Line height is 1.4 × font size.
//!
//! ## Pagination
//!
//! Before anything is drawn, its height is checked against the bottom
//! margin; if it does not fit, a page is added and the cursor returns to the
//! top margin. Text breaks between wrapped lines, code blocks break into
//! per-page chunks with their own background, table rows move whole. Every
//! emitted `y` therefore lies in `[margin, height − margin]`. The one
//! exception is a single item taller than an empty page, which is placed at
//! the top of a page instead of adding pages forever.

mod tag;
pub mod text;

pub use tag::Tag;

use crate::pipeline::dom::{self, Element, Node};
use crate::surface::{Color, DrawingSurface, FontFamily, FontStyle, Paint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

const LINE_HEIGHT_FACTOR: f32 = 1.4;
const BODY_SIZE: f32 = 11.0;
const LIST_INDENT: f32 = 20.0;
const PREFIX_RESERVE: f32 = 15.0;
const PARAGRAPH_AFTER: f32 = 8.0;
const LIST_AFTER: f32 = 6.0;

const QUOTE_SPACE: f32 = 8.0;
const QUOTE_INDENT: f32 = 20.0;
const QUOTE_RULE_OFFSET: f32 = 8.0;
const QUOTE_TEXT: Color = Color::rgb(100, 100, 100);
const QUOTE_RULE: Color = Color::rgb(200, 200, 200);

const CODE_SPACE: f32 = 8.0;
const CODE_SIZE: f32 = 10.0;
const CODE_PADDING: f32 = 8.0;
const CODE_RADIUS: f32 = 3.0;
const CODE_BACKGROUND: Color = Color::rgb(245, 245, 245);

const TABLE_SPACE: f32 = 10.0;
const TABLE_SIZE: f32 = 10.0;
const CELL_PADDING: f32 = 4.0;
const HEADER_FILL: Color = Color::rgb(240, 240, 240);
const BORDER: Color = Color::rgb(200, 200, 200);

const RULE_SPACE: f32 = 15.0;

const ELLIPSIS: char = '…';

// ── Options and results ─────────────────────────────────────────────────

/// What to do with table cell text that needs more than one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellOverflow {
    /// Keep the first line and end it with `…`.
    #[default]
    Ellipsis,
    /// Keep the first line as wrapped, with no marker.
    Clip,
}

impl fmt::Display for CellOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellOverflow::Ellipsis => write!(f, "ellipsis"),
            CellOverflow::Clip => write!(f, "clip"),
        }
    }
}

impl FromStr for CellOverflow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ellipsis" => Ok(CellOverflow::Ellipsis),
            "clip" => Ok(CellOverflow::Clip),
            other => Err(format!(
                "unknown cell overflow '{other}' (expected 'ellipsis' or 'clip')"
            )),
        }
    }
}

/// Geometry and policy for one layout run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Symmetric page margin in points.
    pub margin: f32,
    pub cell_overflow: CellOverflow,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            margin: 50.0,
            cell_overflow: CellOverflow::default(),
        }
    }
}

/// What a layout run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSummary {
    pub pages: usize,
    /// Content text lines drawn (list prefixes not included).
    pub text_lines: usize,
}

/// Mutable state of one walk, threaded through every recursive call.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutState {
    /// Page-local vertical position in points, top-down.
    pub cursor_y: f32,
    pub list_depth: usize,
    /// One counter per open list; reset on entry, bumped per item.
    pub list_counters: Vec<usize>,
    pub text_lines: usize,
}

impl LayoutState {
    pub fn new(margin: f32) -> Self {
        Self {
            cursor_y: margin,
            list_depth: 0,
            list_counters: Vec::new(),
            text_lines: 0,
        }
    }
}

/// Explicit style for one text block. Nothing is inherited.
#[derive(Debug, Clone)]
struct TextStyle {
    family: FontFamily,
    style: FontStyle,
    size: f32,
    color: Color,
    indent: f32,
    prefix: Option<String>,
    rule_x: Option<f32>,
}

impl TextStyle {
    fn body(size: f32, style: FontStyle, indent: f32) -> Self {
        Self {
            family: FontFamily::Helvetica,
            style,
            size,
            color: Color::BLACK,
            indent,
            prefix: None,
            rule_x: None,
        }
    }
}

// ── Entry points ────────────────────────────────────────────────────────

/// Parse sanitized `html` and lay it out onto `surface`.
///
/// Draws nothing when the HTML has no content; never panics for any input
/// string.
pub fn layout_document<S>(html: &str, surface: &mut S, options: &LayoutOptions) -> LayoutSummary
where
    S: DrawingSurface + ?Sized,
{
    let root = dom::parse_html(html);
    layout_tree(&root, surface, options)
}

/// Lay out an already parsed tree.
pub fn layout_tree<S>(root: &Node, surface: &mut S, options: &LayoutOptions) -> LayoutSummary
where
    S: DrawingSurface + ?Sized,
{
    let mut engine = LayoutEngine::new(surface, *options);
    let mut state = LayoutState::new(options.margin);
    engine.layout_node(&mut state, root);
    let summary = engine.summary(&state);
    debug!(
        "Layout finished: {} pages, {} text lines",
        summary.pages, summary.text_lines
    );
    summary
}

// ── Engine ──────────────────────────────────────────────────────────────

/// Walks a document tree and draws it onto a surface.
pub struct LayoutEngine<'s, S: DrawingSurface + ?Sized> {
    surface: &'s mut S,
    options: LayoutOptions,
    page_height: f32,
    content_width: f32,
}

impl<'s, S: DrawingSurface + ?Sized> LayoutEngine<'s, S> {
    pub fn new(surface: &'s mut S, options: LayoutOptions) -> Self {
        let page_height = surface.page_height();
        let content_width = (surface.page_width() - 2.0 * options.margin).max(1.0);
        Self {
            surface,
            options,
            page_height,
            content_width,
        }
    }

    pub fn summary(&self, state: &LayoutState) -> LayoutSummary {
        LayoutSummary {
            pages: self.surface.page_count(),
            text_lines: state.text_lines,
        }
    }

    /// Lay out one node and everything below it.
    pub fn layout_node(&mut self, state: &mut LayoutState, node: &Node) {
        // Bare text is only drawn by the block that owns it.
        let Node::Element(el) = node else {
            return;
        };

        match Tag::from_name(&el.tag) {
            Tag::Heading(level) => self.layout_heading(state, el, level),
            Tag::Paragraph => self.layout_paragraph(state, el),
            Tag::UnorderedList => self.layout_list(state, el, false),
            Tag::OrderedList => self.layout_list(state, el, true),
            Tag::ListItem => self.layout_list_item(state, el, false),
            Tag::BlockQuote => self.layout_blockquote(state, el),
            Tag::Pre => self.layout_pre(state, el),
            Tag::Table => self.layout_table(state, el),
            Tag::HorizontalRule => self.layout_rule(state),
            Tag::Other => self.layout_children(state, el),
        }
    }

    fn layout_children(&mut self, state: &mut LayoutState, el: &Element) {
        for child in &el.children {
            self.layout_node(state, child);
        }
    }

    fn margin(&self) -> f32 {
        self.options.margin
    }

    fn bottom(&self) -> f32 {
        self.page_height - self.options.margin
    }

    fn block_indent(state: &LayoutState) -> f32 {
        state.list_depth as f32 * LIST_INDENT
    }

    fn fits(&self, state: &LayoutState, needed: f32) -> bool {
        state.cursor_y + needed <= self.bottom()
    }

    fn new_page(&mut self, state: &mut LayoutState) {
        self.surface.add_page();
        state.cursor_y = self.margin();
    }

    /// Start a new page unless `needed` points fit below the cursor.
    ///
    /// On a page that is still empty nothing happens even if the item is
    /// too tall; it is placed at the top instead.
    fn ensure_space(&mut self, state: &mut LayoutState, needed: f32) {
        if self.fits(state, needed) {
            return;
        }
        if state.cursor_y > self.margin() {
            self.new_page(state);
        }
        if !self.fits(state, needed) {
            warn!(
                "Block of {:.1}pt does not fit on an empty page; placing it at the top",
                needed
            );
        }
    }

    // ── Text ────────────────────────────────────────────────────────────

    fn layout_heading(&mut self, state: &mut LayoutState, el: &Element, level: u8) {
        let text = element_text(el, false);
        if text.trim().is_empty() {
            return;
        }
        let (before, size, after) = tag::heading_metrics(level);
        state.cursor_y += before;
        let style = TextStyle::body(size, FontStyle::Bold, Self::block_indent(state));
        self.draw_text_block(state, &text, &style);
        state.cursor_y += after;
    }

    fn layout_paragraph(&mut self, state: &mut LayoutState, el: &Element) {
        let text = element_text(el, false);
        if text.trim().is_empty() {
            return;
        }
        let style = TextStyle::body(BODY_SIZE, FontStyle::Normal, Self::block_indent(state));
        self.draw_text_block(state, &text, &style);
        state.cursor_y += PARAGRAPH_AFTER;
    }

    fn layout_blockquote(&mut self, state: &mut LayoutState, el: &Element) {
        let text = element_text(el, false);
        if text.trim().is_empty() {
            return;
        }
        let base = Self::block_indent(state);
        state.cursor_y += QUOTE_SPACE;
        let style = TextStyle {
            color: QUOTE_TEXT,
            rule_x: Some(self.margin() + base + QUOTE_RULE_OFFSET),
            ..TextStyle::body(BODY_SIZE, FontStyle::Italic, base + QUOTE_INDENT)
        };
        self.draw_text_block(state, &text, &style);
        state.cursor_y += QUOTE_SPACE;
    }

    /// Wrap and draw `text`, one line at a time, breaking pages between
    /// lines. The prefix, if any, sits on the first line. Hard breaks
    /// ([`text::LINE_BREAK`]) always start a new line.
    fn draw_text_block(&mut self, state: &mut LayoutState, text: &str, style: &TextStyle) {
        self.surface.set_font(style.family, style.style);
        self.surface.set_font_size(style.size);
        self.surface.set_text_color(style.color);

        let reserve = if style.prefix.is_some() { PREFIX_RESERVE } else { 0.0 };
        let available = (self.content_width - style.indent - reserve).max(1.0);
        let mut lines: Vec<String> = text
            .split(text::LINE_BREAK)
            .flat_map(|segment| self.surface.split_text_to_size(segment, available))
            .collect();
        if lines.is_empty() {
            if style.prefix.is_none() {
                self.surface.reset_text_color();
                return;
            }
            lines.push(String::new());
        }

        let line_height = style.size * LINE_HEIGHT_FACTOR;
        let left = self.margin() + style.indent;
        let mut segment_top = state.cursor_y;

        for (i, line) in lines.iter().enumerate() {
            if !self.fits(state, line_height) && state.cursor_y > self.margin() {
                if let Some(x) = style.rule_x {
                    self.draw_rule_segment(x, segment_top, state.cursor_y);
                }
                self.new_page(state);
                segment_top = state.cursor_y;
            }

            let baseline = state.cursor_y + style.size;
            if i == 0 {
                if let Some(prefix) = &style.prefix {
                    self.surface.draw_text(prefix, left, baseline);
                }
            }
            if !line.is_empty() {
                self.surface.draw_text(line, left + reserve, baseline);
                state.text_lines += 1;
            }
            state.cursor_y += line_height;
        }

        if let Some(x) = style.rule_x {
            self.draw_rule_segment(x, segment_top, state.cursor_y.min(self.bottom()));
        }
        self.surface.reset_text_color();
    }

    fn draw_rule_segment(&mut self, x: f32, top: f32, bottom: f32) {
        if bottom <= top {
            return;
        }
        self.surface.set_stroke_color(QUOTE_RULE);
        self.surface.set_line_width(2.0);
        self.surface.draw_line(x, top, x, bottom);
    }

    // ── Lists ───────────────────────────────────────────────────────────

    fn layout_list(&mut self, state: &mut LayoutState, el: &Element, ordered: bool) {
        state.list_depth += 1;
        state.list_counters.push(0);

        for child in &el.children {
            match child {
                Node::Element(item) if item.tag == "li" => {
                    self.layout_list_item(state, item, ordered)
                }
                other => self.layout_node(state, other),
            }
        }

        state.list_counters.pop();
        state.list_depth -= 1;
        if state.list_depth == 0 {
            state.cursor_y += LIST_AFTER;
        }
    }

    fn layout_list_item(&mut self, state: &mut LayoutState, el: &Element, ordered: bool) {
        let position = match state.list_counters.last_mut() {
            Some(counter) => {
                *counter += 1;
                *counter
            }
            None => 1,
        };

        let prefix = match find_checkbox(el) {
            Some(true) => "☑".to_string(),
            Some(false) => "☐".to_string(),
            None if ordered => format!("{position}."),
            None => "•".to_string(),
        };

        let mut own_text = String::new();
        let mut blocks = Vec::new();
        for child in &el.children {
            match child {
                Node::Element(c) if Tag::from_name(&c.tag).is_block() => blocks.push(child),
                // Loose items: paragraphs after the first become their own blocks.
                Node::Element(c) if c.tag == "p" && !own_text.trim().is_empty() => {
                    blocks.push(child)
                }
                _ => own_text.push_str(&text::extract_text(child, true)),
            }
        }

        let indent = state.list_depth.saturating_sub(1) as f32 * LIST_INDENT;
        let style = TextStyle {
            prefix: Some(prefix),
            ..TextStyle::body(BODY_SIZE, FontStyle::Normal, indent)
        };
        self.draw_text_block(state, &own_text, &style);

        for block in blocks {
            self.layout_node(state, block);
        }
    }

    // ── Code blocks ─────────────────────────────────────────────────────

    fn layout_pre(&mut self, state: &mut LayoutState, el: &Element) {
        let raw = text::extract_pre_text(el);
        let raw = raw.strip_suffix('\n').unwrap_or(&raw);
        let lines: Vec<String> = raw.split('\n').map(|l| l.replace('\t', "    ")).collect();

        state.cursor_y += CODE_SPACE;
        self.surface.set_font(FontFamily::Courier, FontStyle::Normal);
        self.surface.set_font_size(CODE_SIZE);
        self.surface.reset_text_color();

        let indent = Self::block_indent(state);
        let line_height = CODE_SIZE * LINE_HEIGHT_FACTOR;
        let mut next = 0;

        while next < lines.len() {
            let room = self.bottom() - state.cursor_y - 2.0 * CODE_PADDING;
            let mut fit = (room / line_height).floor().max(0.0) as usize;
            if fit == 0 {
                if state.cursor_y > self.margin() {
                    self.new_page(state);
                    continue;
                }
                warn!("Code line does not fit on an empty page; placing it at the top");
                fit = 1;
            }

            let chunk = &lines[next..(next + fit).min(lines.len())];
            let height = chunk.len() as f32 * line_height + 2.0 * CODE_PADDING;
            let x = self.margin() + indent;

            self.surface.set_fill_color(CODE_BACKGROUND);
            self.surface.draw_rect(
                x,
                state.cursor_y,
                self.content_width - indent,
                height,
                Paint::Fill,
                Some(CODE_RADIUS),
            );
            for (i, line) in chunk.iter().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let baseline = state.cursor_y + CODE_PADDING + i as f32 * line_height + CODE_SIZE;
                self.surface.draw_text(line, x + CODE_PADDING, baseline);
                state.text_lines += 1;
            }

            state.cursor_y += height;
            next += chunk.len();
        }

        state.cursor_y += CODE_SPACE;
    }

    // ── Tables ──────────────────────────────────────────────────────────

    fn layout_table(&mut self, state: &mut LayoutState, el: &Element) {
        let rows = table_rows(el);
        let columns = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);

        state.cursor_y += TABLE_SPACE;
        if columns > 0 {
            let indent = Self::block_indent(state);
            let x0 = self.margin() + indent;
            let table_width = self.content_width - indent;
            let column_width = table_width / columns as f32;
            let row_height = TABLE_SIZE * LINE_HEIGHT_FACTOR + 2.0 * CELL_PADDING;

            for row in &rows {
                self.ensure_space(state, row_height);
                let top = state.cursor_y;

                if row.header {
                    self.surface.set_fill_color(HEADER_FILL);
                    self.surface
                        .draw_rect(x0, top, table_width, row_height, Paint::Fill, None);
                }

                let style = if row.header { FontStyle::Bold } else { FontStyle::Normal };
                self.surface.set_font(FontFamily::Helvetica, style);
                self.surface.set_font_size(TABLE_SIZE);
                self.surface.reset_text_color();

                let available = (column_width - 2.0 * CELL_PADDING).max(1.0);
                for (i, cell) in row.cells.iter().enumerate() {
                    let text = self.fit_cell(&element_text(cell, false), available);
                    if text.is_empty() {
                        continue;
                    }
                    let x = x0 + i as f32 * column_width + CELL_PADDING;
                    self.surface.draw_text(&text, x, top + CELL_PADDING + TABLE_SIZE);
                    state.text_lines += 1;
                }

                self.surface.set_stroke_color(BORDER);
                self.surface.set_line_width(0.5);
                self.surface
                    .draw_rect(x0, top, table_width, row_height, Paint::Stroke, None);
                for i in 1..columns {
                    let x = x0 + i as f32 * column_width;
                    self.surface.draw_line(x, top, x, top + row_height);
                }

                state.cursor_y += row_height;
            }
        }
        state.cursor_y += TABLE_SPACE;
    }

    /// The single line a cell shows.
    fn fit_cell(&self, text: &str, available: f32) -> String {
        let mut lines = self.surface.split_text_to_size(text, available).into_iter();
        let Some(first) = lines.next() else {
            return String::new();
        };
        if lines.next().is_none() {
            return first;
        }

        match self.options.cell_overflow {
            CellOverflow::Clip => first,
            CellOverflow::Ellipsis => {
                warn!("Table cell truncated to one line: {:?}", text.trim());
                let mut kept = first;
                loop {
                    let candidate = format!("{}{ELLIPSIS}", kept.trim_end());
                    if kept.is_empty() || self.surface.text_width(&candidate) <= available {
                        return candidate;
                    }
                    kept.pop();
                }
            }
        }
    }

    fn layout_rule(&mut self, state: &mut LayoutState) {
        state.cursor_y += RULE_SPACE;
        self.ensure_space(state, 0.0);
        let x = self.margin() + Self::block_indent(state);
        self.surface.set_stroke_color(BORDER);
        self.surface.set_line_width(0.5);
        self.surface
            .draw_line(x, state.cursor_y, self.margin() + self.content_width, state.cursor_y);
        state.cursor_y += RULE_SPACE;
    }
}

// ── Tree helpers ────────────────────────────────────────────────────────

fn element_text(el: &Element, skip_lists: bool) -> String {
    el.children
        .iter()
        .map(|child| text::extract_text(child, skip_lists))
        .collect()
}

fn is_checkbox(el: &Element) -> bool {
    el.attr("type")
        .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
}

/// `Some(checked)` when the item carries a task checkbox of its own.
fn find_checkbox(item: &Element) -> Option<bool> {
    fn search(el: &Element) -> Option<bool> {
        for child in el.child_elements() {
            match child.tag.as_str() {
                "ul" | "ol" => continue,
                "input" if is_checkbox(child) => return Some(child.has_attr("checked")),
                _ => {}
            }
            if let Some(found) = search(child) {
                return Some(found);
            }
        }
        None
    }
    search(item)
}

struct TableRow<'a> {
    header: bool,
    cells: Vec<&'a Element>,
}

fn table_rows(table: &Element) -> Vec<TableRow<'_>> {
    let mut rows = Vec::new();
    for section in table.child_elements() {
        match section.tag.as_str() {
            "tr" => rows.push(table_row(section, false)),
            "thead" | "tbody" | "tfoot" => {
                let in_head = section.tag == "thead";
                for tr in section.child_elements().filter(|e| e.tag == "tr") {
                    rows.push(table_row(tr, in_head));
                }
            }
            _ => {}
        }
    }
    rows
}

fn table_row(tr: &Element, in_head: bool) -> TableRow<'_> {
    let cells: Vec<&Element> = tr
        .child_elements()
        .filter(|c| c.tag == "th" || c.tag == "td")
        .collect();
    TableRow {
        header: in_head || cells.iter().any(|c| c.tag == "th"),
        cells,
    }
}
