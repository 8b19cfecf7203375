//! Plain-text extraction from document subtrees.

use crate::pipeline::dom::{Element, Node};

/// Recursion cap. Past this depth the subtree's raw text is used as-is.
pub const MAX_DEPTH: usize = 50;

/// Marks a hard line break (`<br>`) in extracted text. Soft breaks arrive as
/// `\n` inside text nodes and are wrapped like any other whitespace.
pub const LINE_BREAK: char = '\u{2028}';

/// Flatten `node` into the text a block should draw.
///
/// Inline `code` outside a `pre` is wrapped in backticks. With
/// `skip_lists`, nested `ul`/`ol` subtrees contribute nothing; list items
/// use this so a parent item does not repeat its children's text.
pub fn extract_text(node: &Node, skip_lists: bool) -> String {
    let mut out = String::new();
    collect(node, 0, false, skip_lists, &mut out);
    out
}

/// Literal text of a `pre` block. `code` inside it gets no backticks.
pub fn extract_pre_text(pre: &Element) -> String {
    let mut out = String::new();
    for child in &pre.children {
        collect(child, 1, true, false, &mut out);
    }
    out
}

fn collect(node: &Node, depth: usize, in_pre: bool, skip_lists: bool, out: &mut String) {
    if depth > MAX_DEPTH {
        out.push_str(&node.text_content());
        return;
    }

    let el = match node {
        Node::Text(text) => {
            out.push_str(text);
            return;
        }
        Node::Element(el) => el,
    };

    match el.tag.as_str() {
        "ul" | "ol" if skip_lists => {}
        "br" => out.push(if in_pre { '\n' } else { LINE_BREAK }),
        "code" if !in_pre => {
            out.push('`');
            for child in &el.children {
                collect(child, depth + 1, in_pre, skip_lists, out);
            }
            out.push('`');
        }
        tag => {
            let in_pre = in_pre || tag == "pre";
            for child in &el.children {
                collect(child, depth + 1, in_pre, skip_lists, out);
            }
        }
    }
}
