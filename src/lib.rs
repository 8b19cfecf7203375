//! # markpage
//!
//! Turn Markdown notes into paginated PDF documents, without a browser.
//!
//! Notes arrive as Markdown with GitHub extensions and a sprinkling of
//! inline LaTeX. This crate lays them out onto fixed-size pages itself: a
//! recursive tree walk tracks the vertical cursor, decides page breaks,
//! numbers nested lists, wraps proportionally spaced text and frames code
//! blocks and tables.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Normalize  $\alpha \to \beta$ → α → β
//!  ├─ 2. Compile    CommonMark + GFM → HTML (comrak)
//!  ├─ 3. Sanitize   allow-listed tags and attributes only (lol_html)
//!  ├─ 4. Parse      HTML → owned document tree (html5ever)
//!  ├─ 5. Layout     tree → drawing calls on a paginated surface
//!  ├─ 6. Serialize  PDF with the standard-14 fonts (lopdf)
//!  └─ 7. Persist    `{prefix}-{YYYY-MM-DD}.pdf` → ArtifactSink
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use markpage::{export_to_dir, ExportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExportConfig::builder().filename_prefix("lecture").build()?;
//!     let output = export_to_dir("# Week 1\n\n- $\\alpha$ decay", "out", &config).await?;
//!     eprintln!("{} ({} pages)", output.location, output.stats.pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `markpage` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! markpage = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod sink;
pub mod surface;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExportConfig, ExportConfigBuilder};
pub use error::ExportError;
pub use export::{
    export, export_filename, export_sync, export_to_dir, preview, render_pdf, sanitized_html,
};
pub use layout::{layout_document, layout_tree, CellOverflow, LayoutOptions, LayoutSummary};
pub use output::{ExportOutput, ExportStats, RenderedDocument, StageTiming};
pub use progress::{ExportProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use sink::{ArtifactSink, DirectorySink, MemorySink};
pub use surface::{DrawingSurface, PageSize, PdfSurface, RecordingSurface};
