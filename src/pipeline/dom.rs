//! Parse sanitized HTML into an owned, immutable document tree.
//!
//! html5ever does the HTML5 tree construction (implied `<tbody>`, unclosed
//! `<li>`, void elements); the rcdom result is then copied into plain
//! [`Node`] values so the layout engine never sees `Rc`/`RefCell`.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::collections::BTreeMap;

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element: tag name, attributes and ordered children. html5ever
/// lowercases HTML tag and attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Child elements, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Depth-first search over descendants (not including `self`).
    pub fn find_descendant<P>(&self, pred: &P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Concatenated text of this subtree, with no markup applied.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// Elements nested deeper than this below `<body>` are collapsed into a
/// single text node holding their text content.
pub const MAX_TREE_DEPTH: usize = 128;

/// Parse an HTML string and return its `<body>` as an element root.
///
/// Never fails: html5ever recovers from any malformed input, and an empty
/// string yields a `body` with no children. The returned tree is at most
/// [`MAX_TREE_DEPTH`] elements deep, so recursive walks over it are bounded
/// however deeply the input nests.
pub fn parse_html(html: &str) -> Node {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    let mut root = Element::new("body");
    if let Some(body) = find_body(&dom.document) {
        root.children = convert_children(&body, 1);
    }
    Node::Element(root)
}

fn find_body(document: &Handle) -> Option<Handle> {
    let mut stack = vec![document.clone()];
    while let Some(handle) = stack.pop() {
        if let NodeData::Element { ref name, .. } = handle.data {
            if &*name.local == "body" {
                return Some(handle);
            }
        }
        stack.extend(handle.children.borrow().iter().rev().cloned());
    }
    None
}

fn convert_children(handle: &Handle, depth: usize) -> Vec<Node> {
    handle
        .children
        .borrow()
        .iter()
        .filter_map(|child| convert(child, depth))
        .collect()
}

fn convert(handle: &Handle, depth: usize) -> Option<Node> {
    match handle.data {
        NodeData::Text { ref contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Element { .. } if depth >= MAX_TREE_DEPTH => {
            Some(Node::Text(flatten_text(handle)))
        }
        NodeData::Element {
            ref name,
            ref attrs,
            ..
        } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|a| (a.name.local.to_string(), a.value.to_string()))
                .collect();
            Some(Node::Element(Element {
                tag: name.local.to_string(),
                attrs,
                children: convert_children(handle, depth + 1),
            }))
        }
        _ => None,
    }
}

/// Text content of an rcdom subtree, walked without recursion.
fn flatten_text(handle: &Handle) -> String {
    let mut out = String::new();
    let mut stack = vec![handle.clone()];
    while let Some(node) = stack.pop() {
        if let NodeData::Text { ref contents } = node.data {
            out.push_str(&contents.borrow());
        }
        stack.extend(node.children.borrow().iter().rev().cloned());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(html: &str) -> Element {
        match parse_html(html) {
            Node::Element(el) => el,
            Node::Text(_) => panic!("root must be an element"),
        }
    }

    #[test]
    fn empty_input_gives_empty_body() {
        let root = body("");
        assert_eq!(root.tag, "body");
        assert!(root.children.is_empty());
    }

    #[test]
    fn parses_nested_structure() {
        let root = body("<h1>Title</h1><p>Hello <strong>world</strong></p>");
        let tags: Vec<&str> = root.child_elements().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["h1", "p"]);
        assert_eq!(Node::Element(root).text_content(), "TitleHello world");
    }

    #[test]
    fn keeps_attributes() {
        let root = body(r#"<ul><li><input type="checkbox" checked="" disabled=""> done</li></ul>"#);
        let input = root
            .find_descendant(&|e: &Element| e.tag == "input")
            .expect("input element");
        assert_eq!(input.attr("type"), Some("checkbox"));
        assert!(input.has_attr("checked"));
    }

    #[test]
    fn implied_tbody_is_inserted() {
        let root = body("<table><tr><td>a</td></tr></table>");
        let table = root.child_elements().next().unwrap();
        assert_eq!(table.child_elements().next().unwrap().tag, "tbody");
    }

    fn element_depth(node: &Node) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(node, 0)];
        while let Some((node, depth)) = stack.pop() {
            if let Node::Element(el) = node {
                deepest = deepest.max(depth + 1);
                stack.extend(el.children.iter().map(|c| (c, depth + 1)));
            }
        }
        deepest
    }

    #[test]
    fn deep_nesting_is_flattened_past_the_cap() {
        let html = format!("{}deep text", "<blockquote>".repeat(5000));
        let root = parse_html(&html);
        assert!(element_depth(&root) <= MAX_TREE_DEPTH);
        assert_eq!(root.text_content(), "deep text");
    }

    #[test]
    fn shallow_trees_are_not_flattened() {
        let html = format!("{}x", "<div>".repeat(MAX_TREE_DEPTH - 2));
        let root = parse_html(&html);
        assert_eq!(element_depth(&root), MAX_TREE_DEPTH - 1);
    }

    #[test]
    fn decodes_entities() {
        let root = body("<p>a &amp; b &lt; c</p>");
        assert_eq!(Node::Element(root).text_content(), "a & b < c");
    }
}
