//! Markdown → HTML via comrak (CommonMark + GitHub extensions).
//!
//! Compilation never fails. Anything comrak cannot interpret as structure
//! is kept as literal text, which is exactly the degradation a note with a
//! stray `|` or an unclosed `*` should get.

use comrak::{markdown_to_html, Options};

/// Compile normalised Markdown into an HTML fragment.
///
/// Enabled extensions: GFM tables, task lists, strikethrough, autolinks and
/// `$`/`$$` math markers. Raw HTML embedded in the note is omitted rather
/// than passed through; the sanitizer still runs afterwards.
pub fn compile(markdown: &str) -> String {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.tasklist = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.math_dollars = true;
    options.render.unsafe_ = false;
    markdown_to_html(markdown, &options)
}
