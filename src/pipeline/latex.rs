//! Inline-math normalisation: `$\alpha \to \beta$` → `α → β`.
//!
//! Note-takers write math with a handful of LaTeX macros. The PDF surface
//! has no math renderer, so recognised macros are replaced with Unicode
//! glyphs before the Markdown is compiled.
//!
//! ## Matching
//!
//! A single left-to-right regex pass finds `$$…$$` (display) and `$…$`
//! (inline) spans. Display spans are matched first by the alternation, so an
//! inline match can never start inside a consumed `$$` span.
//!
//! Code is never touched: fenced blocks (```` ``` ```` or `~~~`) are copied
//! through line by line, and inline code spans are matched ahead of math so
//! a shell snippet like `` `echo $HOME $PATH` `` keeps its dollars.
//!
//! Inside a span, each macro name is read in full (`\[A-Za-z]+`) and looked
//! up exactly. Matching is therefore longest-match by construction: `\le`
//! never fires inside `\leftarrow` regardless of table order.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Macro name (without backslash) → replacement glyph.
const MACROS: &[(&str, &str)] = &[
    // Arrows
    ("rightarrow", "→"),
    ("to", "→"),
    ("leftarrow", "←"),
    ("gets", "←"),
    ("leftrightarrow", "↔"),
    ("Rightarrow", "⇒"),
    ("implies", "⇒"),
    ("Leftarrow", "⇐"),
    ("Leftrightarrow", "⇔"),
    ("iff", "⇔"),
    ("uparrow", "↑"),
    ("downarrow", "↓"),
    ("mapsto", "→"),
    // Comparison and operators
    ("leq", "≤"),
    ("le", "≤"),
    ("geq", "≥"),
    ("ge", "≥"),
    ("neq", "≠"),
    ("ne", "≠"),
    ("approx", "≈"),
    ("equiv", "≡"),
    ("sim", "∼"),
    ("pm", "±"),
    ("times", "×"),
    ("div", "÷"),
    ("cdot", "·"),
    ("sum", "∑"),
    ("prod", "∏"),
    ("int", "∫"),
    ("sqrt", "√"),
    ("partial", "∂"),
    ("nabla", "∇"),
    ("forall", "∀"),
    ("exists", "∃"),
    ("neg", "¬"),
    ("land", "∧"),
    ("lor", "∨"),
    // Greek, lower case
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("epsilon", "ε"),
    ("varepsilon", "ε"),
    ("zeta", "ζ"),
    ("eta", "η"),
    ("theta", "θ"),
    ("iota", "ι"),
    ("kappa", "κ"),
    ("lambda", "λ"),
    ("mu", "μ"),
    ("nu", "ν"),
    ("xi", "ξ"),
    ("pi", "π"),
    ("rho", "ρ"),
    ("sigma", "σ"),
    ("tau", "τ"),
    ("upsilon", "υ"),
    ("phi", "φ"),
    ("varphi", "φ"),
    ("chi", "χ"),
    ("psi", "ψ"),
    ("omega", "ω"),
    // Greek, upper case
    ("Gamma", "Γ"),
    ("Delta", "Δ"),
    ("Theta", "Θ"),
    ("Lambda", "Λ"),
    ("Xi", "Ξ"),
    ("Pi", "Π"),
    ("Sigma", "Σ"),
    ("Phi", "Φ"),
    ("Psi", "Ψ"),
    ("Omega", "Ω"),
    // Sets and symbols
    ("infty", "∞"),
    ("cup", "∪"),
    ("cap", "∩"),
    ("in", "∈"),
    ("notin", "∉"),
    ("subset", "⊂"),
    ("subseteq", "⊆"),
    ("supset", "⊃"),
    ("supseteq", "⊇"),
    ("emptyset", "∅"),
    ("varnothing", "∅"),
    ("checkmark", "✓"),
    ("ldots", "…"),
    ("dots", "…"),
    ("cdots", "⋯"),
    ("degree", "°"),
    ("circ", "°"),
];

static MACRO_TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| MACROS.iter().copied().collect());

/// Inline code first, then display math (group 1), then inline math (group 2).
static RE_MATH_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"``[^\n]*?``|`[^`\n]+`|(?s:\$\$(.+?)\$\$)|\$([^$\n]+?)\$").unwrap()
});

static RE_DEGREE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^\s*(?:\{\s*\\circ\s*\}|\\circ\b)").unwrap());

/// Replace recognised LaTeX macros inside every math span.
///
/// Inline spans lose their `$` delimiters; display spans keep `$$` so the
/// Markdown compiler still sees display math. A span whose content would
/// normalise to nothing is left exactly as written. Fenced code blocks and
/// inline code spans are copied unchanged.
pub fn normalize(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut prose = String::new();
    let mut fence: Option<Fence> = None;

    for line in markdown.split_inclusive('\n') {
        if let Some(open) = fence {
            if open.is_closed_by(line) {
                fence = None;
            }
            out.push_str(line);
        } else if let Some(open) = Fence::opened_by(line) {
            out.push_str(&normalize_prose(&prose));
            prose.clear();
            fence = Some(open);
            out.push_str(line);
        } else {
            prose.push_str(line);
        }
    }
    out.push_str(&normalize_prose(&prose));
    out
}

fn normalize_prose(text: &str) -> String {
    RE_MATH_SPAN
        .replace_all(text, |caps: &Captures<'_>| {
            let original = &caps[0];
            if let Some(display) = caps.get(1) {
                return match normalize_expr(display.as_str()) {
                    Some(expr) => format!("$${expr}$$"),
                    None => original.to_string(),
                };
            }
            match caps.get(2) {
                Some(inline) => {
                    normalize_expr(inline.as_str()).unwrap_or_else(|| original.to_string())
                }
                None => original.to_string(),
            }
        })
        .into_owned()
}

/// An open code fence: its marker character and run length.
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// Indentation is not checked, so fences nested in list items count too.
    fn opened_by(line: &str) -> Option<Fence> {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let len = trimmed.chars().take_while(|&c| c == marker).count();
        if len < 3 {
            return None;
        }
        if marker == '`' && trimmed[len..].contains('`') {
            return None;
        }
        Some(Fence { marker, len })
    }

    fn is_closed_by(self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.len() >= self.len && trimmed.chars().all(|c| c == self.marker)
    }
}

/// Normalise the content of one span; `None` when nothing would remain.
fn normalize_expr(expr: &str) -> Option<String> {
    let expr = RE_DEGREE.replace_all(expr.trim(), "°");
    let mut out = String::with_capacity(expr.len());
    let mut chars = expr.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_alphabetic() {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                if name.is_empty() {
                    // `\%`, `\,`, `\\`: keep the escaped character, drop spacing commands.
                    match chars.next() {
                        Some(c) if !matches!(c, ',' | ';' | ':' | '!' | '\\' | ' ') => out.push(c),
                        _ => {}
                    }
                } else if let Some(glyph) = MACRO_TABLE.get(name.as_str()) {
                    out.push_str(glyph);
                }
            }
            '{' | '}' => {}
            _ => out.push(ch),
        }
    }

    let out = out.trim().to_string();
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greek_and_arrow() {
        assert_eq!(normalize("$\\alpha \\to \\beta$"), "α → β");
    }

    #[test]
    fn prefix_macros_do_not_misfire() {
        assert_eq!(normalize("$a \\leq b$"), "a ≤ b");
        assert_eq!(normalize("$a \\le b$"), "a ≤ b");
        assert_eq!(normalize("$x \\leftarrow y$"), "x ← y");
        assert_eq!(normalize("$\\Leftrightarrow$"), "⇔");
        assert_eq!(normalize("$\\in \\infty \\int$"), "∈ ∞ ∫");
    }

    #[test]
    fn trims_inner_whitespace() {
        assert_eq!(normalize("see $  \\pi  $ here"), "see π here");
    }

    #[test]
    fn unknown_macros_and_braces_are_stripped() {
        assert_eq!(normalize("$\\mathbf{x} + 1$"), "x + 1");
    }

    #[test]
    fn empty_result_falls_back_to_original() {
        assert_eq!(normalize("$\\frac{}{}$"), "$\\frac{}{}$");
    }

    #[test]
    fn degree_notation() {
        assert_eq!(normalize("$90^\\circ$"), "90°");
        assert_eq!(normalize("$45^{\\circ}$"), "45°");
    }

    #[test]
    fn display_math_keeps_delimiters() {
        assert_eq!(normalize("$$\\sum x$$"), "$$∑ x$$");
    }

    #[test]
    fn inline_never_starts_inside_display_span() {
        let input = "$$a \\to b$$ and $\\gamma$";
        assert_eq!(normalize(input), "$$a → b$$ and γ");
    }

    #[test]
    fn inline_spans_do_not_cross_lines() {
        let input = "costs $5\nand $10";
        assert_eq!(normalize(input), input);
    }

    #[test]
    fn text_outside_math_is_untouched() {
        let input = "plain \\alpha and {braces}";
        assert_eq!(normalize(input), input);
    }

    #[test]
    fn fenced_code_is_copied_unchanged() {
        let input = "```sh\necho $HOME $PATH\n```\nthen $\\alpha$";
        assert_eq!(normalize(input), "```sh\necho $HOME $PATH\n```\nthen α");

        let tilde = "~~~~\n$\\beta$\n~~~\nstill code $\\beta$\n~~~~\n$\\beta$";
        assert_eq!(
            normalize(tilde),
            "~~~~\n$\\beta$\n~~~\nstill code $\\beta$\n~~~~\nβ"
        );
    }

    #[test]
    fn unclosed_fence_runs_to_the_end() {
        let input = "$\\pi$\n  ```\n$\\alpha$ and $\\beta$";
        assert_eq!(normalize(input), "π\n  ```\n$\\alpha$ and $\\beta$");
    }

    #[test]
    fn inline_code_spans_are_copied_unchanged() {
        assert_eq!(normalize("`$x$` and $\\beta$"), "`$x$` and β");
        assert_eq!(normalize("``a ` $y$`` then $\\to$"), "``a ` $y$`` then →");
    }

    #[test]
    fn every_glyph_is_encodable_by_the_pdf_fonts() {
        use crate::surface::metrics::{encode_runs, Charset};
        for (name, glyph) in MACROS {
            let unmapped = encode_runs(glyph)
                .iter()
                .any(|run| run.charset == Charset::WinAnsi && run.bytes.contains(&b'?'));
            assert!(!unmapped, "\\{name} → {glyph} has no PDF glyph");
        }
    }

    #[test]
    fn escaped_characters_keep_the_character() {
        assert_eq!(normalize("$50\\%$"), "50%");
    }
}
