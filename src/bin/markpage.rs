//! CLI binary for markpage.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExportConfig` and reports the result.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use markpage::{
    export_to_dir, sanitized_html, CellOverflow, ExportConfig, ExportError,
    ExportProgressCallback, PageSize, ProgressCallback, Stage,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that names the stage in progress and logs each finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Exporting");
        bar.set_message("reading note…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn next_stage(stage: Stage) -> Option<Stage> {
        let pos = Stage::ALL.iter().position(|s| *s == stage)?;
        Stage::ALL.get(pos + 1).copied()
    }
}

impl ExportProgressCallback for CliProgressCallback {
    fn on_export_start(&self, markdown_len: usize) {
        self.bar
            .set_message(format!("{} ({markdown_len} bytes)", Stage::Normalize));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<10} {}",
            green("✓"),
            stage.as_str(),
            dim(&format!("{elapsed_ms}ms"))
        ));
        if let Some(next) = Self::next_stage(stage) {
            self.bar.set_message(next.to_string());
        }
    }

    fn on_export_complete(&self, filename: &str, pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} {}",
            green("✔"),
            bold(filename),
            dim(&format!("({pages} pages)"))
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Export a note into the current directory
  markpage lecture.md

  # Read from stdin, write into ./out with a custom prefix
  cat notes.md | markpage - -o out --prefix physics

  # A4 paper, tighter margins, fixed date in the filename
  markpage notes.md --page-size a4 --margin 36 --date 2024-09-01

  # Inspect the sanitized HTML the layout engine will see
  markpage notes.md --html-only

  # Machine-readable result
  markpage notes.md --json

PAGE SIZES:
  letter (default, 612×792pt), a4 (595.28×841.89pt), legal (612×1008pt),
  or WIDTHxHEIGHT in points, e.g. 420x595

ENVIRONMENT VARIABLES:
  MARKPAGE_OUTPUT_DIR     Default output directory
  MARKPAGE_PREFIX         Default filename prefix
  MARKPAGE_PAGE_SIZE      Default page size
  RUST_LOG                Override log filter (e.g. markpage=debug)
"#;

/// Export Markdown notes to paginated PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "markpage",
    version,
    about = "Export Markdown notes to paginated PDF documents",
    long_about = "Export Markdown notes (CommonMark + GitHub tables and task lists, with inline \
LaTeX symbols) to a paginated PDF named {prefix}-{YYYY-MM-DD}.pdf. Layout is done in-process; \
no browser or external renderer is needed.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to export, or `-` for stdin.
    input: String,

    /// Directory to write the PDF into.
    #[arg(short, long, env = "MARKPAGE_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Filename prefix; the file is named {prefix}-{YYYY-MM-DD}.pdf.
    #[arg(long, env = "MARKPAGE_PREFIX", default_value = "notes")]
    prefix: String,

    /// Page size: letter, a4, legal, or WIDTHxHEIGHT in points.
    #[arg(long, env = "MARKPAGE_PAGE_SIZE", default_value = "letter")]
    page_size: PageSize,

    /// Page margin in points.
    #[arg(long, env = "MARKPAGE_MARGIN", default_value_t = 50.0)]
    margin: f32,

    /// Document title stored in the PDF. Defaults to the input file name.
    #[arg(long)]
    title: Option<String>,

    /// Date used in the filename (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Table cells longer than one line: ellipsis or clip.
    #[arg(long, env = "MARKPAGE_CELL_OVERFLOW", default_value = "ellipsis")]
    cell_overflow: CellOverflow,

    /// Print the sanitized HTML and exit without writing a PDF.
    #[arg(long)]
    html_only: bool,

    /// Output structured JSON (ExportOutput) on stdout.
    #[arg(long, env = "MARKPAGE_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "MARKPAGE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MARKPAGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MARKPAGE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports progress, so INFO logs are hidden while
    // it runs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.html_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let markdown = read_input(&cli.input).await?;

    // ── HTML-only mode ───────────────────────────────────────────────────
    if cli.html_only {
        let html = match sanitized_html(&markdown) {
            Err(e) if e.is_user_error() => user_error(&e),
            other => other.context("Failed to compile Markdown")?,
        };
        print!("{html}");
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExportProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run export ───────────────────────────────────────────────────────
    let output = match export_to_dir(&markdown, &cli.output_dir, &config).await {
        Err(e) if e.is_user_error() => user_error(&e),
        other => other.context("Export failed")?,
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        if !show_progress {
            eprintln!("{} {}", green("✔"), bold(&output.location));
        }
        eprintln!(
            "   {} pages  {} text lines  {} bytes  {}ms",
            output.stats.pages,
            output.stats.text_lines,
            output.stats.pdf_bytes,
            dim(&output.stats.total_duration_ms.to_string()),
        );
    }

    Ok(())
}

/// Read the note from a file, or from stdin for `-`.
async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read Markdown from stdin")?;
        return Ok(buf);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read Markdown from {input:?}"))
}

/// Map CLI args to `ExportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExportConfig> {
    let mut builder = ExportConfig::builder()
        .page_size(cli.page_size)
        .margin(cli.margin)
        .filename_prefix(cli.prefix.as_str())
        .cell_overflow(cli.cell_overflow);

    if let Some(title) = cli.title.clone().or_else(|| default_title(&cli.input)) {
        builder = builder.title(title);
    }
    if let Some(date) = cli.date {
        builder = builder.date(date);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn default_title(input: &str) -> Option<String> {
    if input == "-" {
        return None;
    }
    Path::new(input)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

/// Friendly message for problems with the note itself; no error chain.
fn user_error(err: &ExportError) -> ! {
    eprintln!("{} {}", red("✘"), err);
    std::process::exit(2)
}
