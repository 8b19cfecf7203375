//! HTML allow-list sanitizer.
//!
//! This is the only XSS boundary in the pipeline: it runs on the compiled
//! HTML and everything downstream (tree parsing, layout) assumes its output.
//!
//! * Tags outside [`ALLOWED_TAGS`] are unwrapped; their children stay in
//!   place.
//! * Tags in [`DANGEROUS_CONTAINERS`] are removed together with their
//!   content.
//! * Attributes outside [`ALLOWED_ATTRS`] are dropped, and so is any `href`
//!   with a script-capable scheme.
//! * `<input>` survives only as a checkbox; comments are removed.

use crate::error::ExportError;
use lol_html::html_content::Element;
use lol_html::{doc_comments, element, rewrite_str, RewriteStrSettings};

pub const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "hr", "ul", "ol", "li", "blockquote", "pre",
    "code", "table", "thead", "tbody", "tfoot", "tr", "th", "td", "a", "em", "strong", "del", "s",
    "b", "i", "input", "span", "div",
];

pub const ALLOWED_ATTRS: &[&str] = &["href", "type", "checked", "disabled", "class"];

pub const DANGEROUS_CONTAINERS: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "noscript",
    "template", "svg", "math", "textarea", "select", "title", "head",
];

const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Restrict `html` to the allow-list.
pub fn sanitize_html(html: &str) -> Result<String, ExportError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", |el| {
                filter_element(el);
                Ok(())
            })],
            document_content_handlers: vec![doc_comments!(|c| {
                c.remove();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| ExportError::Sanitize {
        detail: e.to_string(),
    })
}

fn filter_element(el: &mut Element<'_, '_>) {
    let tag = el.tag_name().to_ascii_lowercase();

    if DANGEROUS_CONTAINERS.contains(&tag.as_str()) {
        el.remove();
        return;
    }
    if !ALLOWED_TAGS.contains(&tag.as_str()) {
        el.remove_and_keep_content();
        return;
    }
    if tag == "input" && !is_checkbox(el) {
        el.remove();
        return;
    }

    let names: Vec<String> = el.attributes().iter().map(|a| a.name()).collect();
    for name in names {
        let keep = ALLOWED_ATTRS.contains(&name.as_str())
            && !(name == "href" && el.get_attribute(&name).is_some_and(|v| is_unsafe_url(&v)));
        if !keep {
            el.remove_attribute(&name);
        }
    }
}

fn is_checkbox(el: &Element<'_, '_>) -> bool {
    el.get_attribute("type")
        .is_some_and(|t| t.trim().eq_ignore_ascii_case("checkbox"))
}

fn is_unsafe_url(url: &str) -> bool {
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    UNSAFE_SCHEMES.iter().any(|s| compact.starts_with(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_markup_passes_through() {
        let html = "<h2>Title</h2><p><strong>a</strong> <em>b</em> <del>c</del></p>";
        assert_eq!(sanitize_html(html).unwrap(), html);
    }

    #[test]
    fn script_and_style_are_removed_with_content() {
        let out = sanitize_html("<p>ok</p><script>alert(1)</script><style>p{}</style>").unwrap();
        assert_eq!(out, "<p>ok</p>");
    }

    #[test]
    fn unknown_tags_are_unwrapped() {
        let out = sanitize_html("<section><p>kept <u>text</u></p></section>").unwrap();
        assert_eq!(out, "<p>kept text</p>");
    }

    #[test]
    fn event_handlers_and_styles_are_dropped() {
        let out =
            sanitize_html(r#"<p onclick="x()" style="color:red" class="note">hi</p>"#).unwrap();
        assert_eq!(out, r#"<p class="note">hi</p>"#);
    }

    #[test]
    fn javascript_href_is_dropped() {
        let out = sanitize_html(r#"<a href=" JavaScript:alert(1)">x</a>"#).unwrap();
        assert_eq!(out, "<a>x</a>");
        let out = sanitize_html(r#"<a href="https://example.org">x</a>"#).unwrap();
        assert_eq!(out, r#"<a href="https://example.org">x</a>"#);
    }

    #[test]
    fn checkbox_input_survives() {
        let html = r#"<li><input type="checkbox" checked="" disabled="" /> done</li>"#;
        let out = sanitize_html(html).unwrap();
        assert!(out.contains(r#"type="checkbox""#), "got: {out}");
        assert!(out.contains("checked"), "got: {out}");
    }

    #[test]
    fn other_inputs_are_removed() {
        let out = sanitize_html(r#"<p><input type="text" value="x">after</p>"#).unwrap();
        assert_eq!(out, "<p>after</p>");
    }

    #[test]
    fn comments_are_removed() {
        let out = sanitize_html("<!-- raw HTML omitted --><p>x</p>").unwrap();
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn iframe_is_removed() {
        let out = sanitize_html(r#"<div><iframe src="https://evil"></iframe>text</div>"#).unwrap();
        assert_eq!(out, "<div>text</div>");
    }
}
