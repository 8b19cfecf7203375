//! Text-to-tree stages that run before layout.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! markdown ──▶ latex ──▶ markdown ──▶ sanitize ──▶ dom
//!            (glyphs)    (comrak)    (lol_html)   (html5ever)
//! ```
//!
//! 1. [`latex`]:    replace LaTeX macros inside `$…$` with Unicode glyphs
//! 2. [`markdown`]: CommonMark + GFM to an HTML fragment; never fails
//! 3. [`sanitize`]: allow-list filter; the only XSS boundary
//! 4. [`dom`]:      parse the sanitized HTML into an owned [`dom::Node`] tree

pub mod dom;
pub mod latex;
pub mod markdown;
pub mod sanitize;
