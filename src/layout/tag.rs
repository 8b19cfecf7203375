/// The element kinds the layout engine knows how to place.
///
/// Everything else maps to [`Tag::Other`], whose children are laid out in
/// its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Heading(u8),
    Paragraph,
    UnorderedList,
    OrderedList,
    ListItem,
    BlockQuote,
    Pre,
    Table,
    HorizontalRule,
    Other,
}

impl Tag {
    pub fn from_name(name: &str) -> Self {
        match name {
            "h1" => Tag::Heading(1),
            "h2" => Tag::Heading(2),
            "h3" => Tag::Heading(3),
            "h4" => Tag::Heading(4),
            "h5" => Tag::Heading(5),
            "h6" => Tag::Heading(6),
            "p" => Tag::Paragraph,
            "ul" => Tag::UnorderedList,
            "ol" => Tag::OrderedList,
            "li" => Tag::ListItem,
            "blockquote" => Tag::BlockQuote,
            "pre" => Tag::Pre,
            "table" => Tag::Table,
            "hr" => Tag::HorizontalRule,
            _ => Tag::Other,
        }
    }

    /// Blocks that a list item lays out after its own text rather than
    /// folding into it.
    pub fn is_block(self) -> bool {
        !matches!(self, Tag::Paragraph | Tag::Other)
    }
}

/// `(space before, font size, space after)` for a heading level.
pub fn heading_metrics(level: u8) -> (f32, f32, f32) {
    match level {
        1 => (20.0, 24.0, 10.0),
        2 => (16.0, 18.0, 8.0),
        3 => (12.0, 14.0, 6.0),
        _ => (10.0, 12.0, 4.0),
    }
}
