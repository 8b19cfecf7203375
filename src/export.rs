//! Export entry points: Markdown in, paginated PDF out.
//!
//! ```text
//! markdown ─▶ normalize ─▶ compile ─▶ sanitize ─▶ layout ─▶ serialize ─▶ sink
//!             └──────────── blocking pool (spawn_blocking) ──────────┘    async
//! ```
//!
//! [`export`] is the async API and the one most callers want. It checks for
//! empty input before doing any work, runs the CPU-bound stages on tokio's
//! blocking pool, then hands `{prefix}-{YYYY-MM-DD}.pdf` to an
//! [`ArtifactSink`]. [`render_pdf`] runs the same stages synchronously and
//! returns the bytes without persisting them.
//!
//! Every stage either succeeds fully or fails; nothing reaches the sink
//! after a failure. Failures are logged once here and returned unchanged.

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::layout::{self, LayoutSummary};
use crate::output::{ExportOutput, ExportStats, RenderedDocument, StageTiming};
use crate::pipeline::{dom, latex, markdown, sanitize};
use crate::progress::Stage;
use crate::sink::{ArtifactSink, DirectorySink};
use crate::surface::{PdfSurface, RecordingSurface};
use chrono::{NaiveDate, Utc};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

/// Export Markdown to a PDF and hand it to `sink`.
///
/// # Errors
/// * [`ExportError::EmptyMarkdown`] when `markdown` is empty or whitespace;
///   checked before any parsing.
/// * [`ExportError::InvalidConfig`] when `config` fails validation.
/// * Any pipeline or sink error, unchanged.
pub async fn export(
    markdown: &str,
    config: &ExportConfig,
    sink: &dyn ArtifactSink,
) -> Result<ExportOutput, ExportError> {
    let total_start = Instant::now();
    ensure_not_empty(markdown)?;
    config.validate().map_err(log_failure)?;

    info!("Exporting {} bytes of Markdown", markdown.len());
    if let Some(ref cb) = config.progress_callback {
        cb.on_export_start(markdown.len());
    }

    // ── Render on the blocking pool ──────────────────────────────────────
    let owned_markdown = markdown.to_owned();
    let owned_config = config.clone();
    let rendered = tokio::task::spawn_blocking(move || render_pdf(&owned_markdown, &owned_config))
        .await
        .map_err(|e| log_failure(ExportError::Internal(format!("render task panicked: {e}"))))??;

    // ── Persist ──────────────────────────────────────────────────────────
    let filename = export_filename(&config.filename_prefix, export_date(config));
    let pdf_bytes = rendered.bytes.len();
    let persist_start = Instant::now();
    let location = sink
        .persist(&filename, rendered.bytes)
        .await
        .map_err(log_failure)?;

    let mut timings = rendered.timings;
    timings.push(finish_stage(config, Stage::Persist, persist_start));

    let stats = ExportStats {
        pages: rendered.layout.pages,
        text_lines: rendered.layout.text_lines,
        markdown_bytes: markdown.len(),
        pdf_bytes,
        timings,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_export_complete(&filename, stats.pages);
    }
    info!(
        "Exported {} ({} pages, {} bytes) in {}ms",
        location, stats.pages, stats.pdf_bytes, stats.total_duration_ms
    );

    Ok(ExportOutput {
        filename,
        location,
        stats,
    })
}

/// Run every stage up to PDF serialisation and return the bytes.
///
/// Synchronous and CPU-bound; [`export`] calls it on the blocking pool.
pub fn render_pdf(markdown: &str, config: &ExportConfig) -> Result<RenderedDocument, ExportError> {
    ensure_not_empty(markdown)?;
    config.validate()?;

    let mut timings = Vec::with_capacity(Stage::ALL.len());
    let html = compile_html(markdown, config, &mut timings).map_err(log_failure)?;

    let start = Instant::now();
    let mut surface = PdfSurface::new(config.page_size);
    let root = dom::parse_html(&html);
    let layout = layout::layout_tree(&root, &mut surface, &config.layout_options());
    timings.push(finish_stage(config, Stage::Layout, start));

    let start = Instant::now();
    let bytes = surface
        .finish(config.title.as_deref())
        .map_err(log_failure)?;
    timings.push(finish_stage(config, Stage::Serialize, start));

    debug!(
        "Rendered {} pages, {} text lines, {} bytes",
        layout.pages,
        layout.text_lines,
        bytes.len()
    );
    Ok(RenderedDocument {
        bytes,
        layout,
        timings,
    })
}

/// Lay the document out on a [`RecordingSurface`] instead of a PDF.
///
/// The recorded pages are exactly what [`render_pdf`] would draw.
pub fn preview(
    markdown: &str,
    config: &ExportConfig,
) -> Result<(RecordingSurface, LayoutSummary), ExportError> {
    ensure_not_empty(markdown)?;
    config.validate()?;

    let html = compile_html(markdown, config, &mut Vec::new())?;
    let mut surface = RecordingSurface::new(config.page_size);
    let summary = layout::layout_document(&html, &mut surface, &config.layout_options());
    Ok((surface, summary))
}

/// The sanitized HTML the layout engine would receive for `markdown`.
pub fn sanitized_html(markdown: &str) -> Result<String, ExportError> {
    ensure_not_empty(markdown)?;
    let html = markdown::compile(&latex::normalize(markdown));
    sanitize::sanitize_html(&html)
}

/// Export into `dir` using a [`DirectorySink`].
pub async fn export_to_dir(
    markdown: &str,
    dir: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<ExportOutput, ExportError> {
    let sink = DirectorySink::new(dir.as_ref());
    export(markdown, config, &sink).await
}

/// Synchronous wrapper around [`export`].
///
/// Creates a temporary tokio runtime internally.
pub fn export_sync(
    markdown: &str,
    config: &ExportConfig,
    sink: &dyn ArtifactSink,
) -> Result<ExportOutput, ExportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(export(markdown, config, sink))
}

/// `{prefix}-{YYYY-MM-DD}.pdf`
pub fn export_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.pdf", prefix, date.format("%Y-%m-%d"))
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn ensure_not_empty(markdown: &str) -> Result<(), ExportError> {
    if markdown.trim().is_empty() {
        debug!("Refusing to export empty Markdown");
        return Err(ExportError::EmptyMarkdown);
    }
    Ok(())
}

fn export_date(config: &ExportConfig) -> NaiveDate {
    config.date.unwrap_or_else(|| Utc::now().date_naive())
}

/// Normalize, compile and sanitize, recording a timing per stage.
fn compile_html(
    markdown: &str,
    config: &ExportConfig,
    timings: &mut Vec<StageTiming>,
) -> Result<String, ExportError> {
    let start = Instant::now();
    let normalized = latex::normalize(markdown);
    timings.push(finish_stage(config, Stage::Normalize, start));

    let start = Instant::now();
    let html = markdown::compile(&normalized);
    timings.push(finish_stage(config, Stage::Compile, start));

    let start = Instant::now();
    let clean = sanitize::sanitize_html(&html)?;
    timings.push(finish_stage(config, Stage::Sanitize, start));

    Ok(clean)
}

fn finish_stage(config: &ExportConfig, stage: Stage, start: Instant) -> StageTiming {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    debug!("Stage {} finished in {}ms", stage, elapsed_ms);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, elapsed_ms);
    }
    StageTiming { stage, elapsed_ms }
}

fn log_failure(err: ExportError) -> ExportError {
    error!("Export failed: {}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn fixed_config() -> ExportConfig {
        ExportConfig::builder()
            .date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn filename_format() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(export_filename("notes", date), "notes-2024-01-05.pdf");
    }

    #[test]
    fn render_rejects_whitespace() {
        let err = render_pdf(" \n\t ", &ExportConfig::default()).unwrap_err();
        assert!(matches!(err, ExportError::EmptyMarkdown));
    }

    #[test]
    fn render_produces_pdf_bytes() {
        let doc = render_pdf("# Hello\n\nWorld", &ExportConfig::default()).unwrap();
        assert!(doc.bytes.starts_with(b"%PDF-"));
        assert_eq!(doc.layout.pages, 1);
        let stages: Vec<Stage> = doc.timings.iter().map(|t| t.stage).collect();
        assert_eq!(stages, Stage::ALL[..5].to_vec());
    }

    #[test]
    fn invalid_config_is_reported_before_rendering() {
        let config = ExportConfig {
            margin: 400.0,
            ..ExportConfig::default()
        };
        let err = render_pdf("text", &config).unwrap_err();
        assert!(matches!(err, ExportError::InvalidConfig(_)));
    }

    #[test]
    fn preview_matches_layout_of_rendered_pdf() {
        let md = "# T\n\n- a\n- b\n\n| x | y |\n|---|---|\n| 1 | 2 |";
        let config = ExportConfig::default();
        let (surface, summary) = preview(md, &config).unwrap();
        let rendered = render_pdf(md, &config).unwrap();
        assert_eq!(summary, rendered.layout);
        assert!(surface.texts().contains(&"•"));
    }

    #[test]
    fn sanitized_html_strips_scripts_and_converts_math() {
        let html = sanitized_html("$\\alpha$ <script>x</script>").unwrap();
        assert!(html.contains('α'), "got: {html}");
        assert!(!html.contains("<script"), "got: {html}");
    }

    #[tokio::test]
    async fn export_hands_named_pdf_to_sink() {
        let sink = MemorySink::new();
        let output = export("Some notes", &fixed_config(), &sink).await.unwrap();
        assert_eq!(output.filename, "notes-2024-03-09.pdf");
        assert_eq!(output.location, "memory:notes-2024-03-09.pdf");
        assert_eq!(output.stats.timings.len(), Stage::ALL.len());

        let artifacts = sink.take();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].1.len(), output.stats.pdf_bytes);
    }

    #[tokio::test]
    async fn empty_export_never_reaches_the_sink() {
        let sink = MemorySink::new();
        let err = export("", &fixed_config(), &sink).await.unwrap_err();
        assert!(matches!(err, ExportError::EmptyMarkdown));
        assert!(sink.filenames().is_empty());
    }
}
