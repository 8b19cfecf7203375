//! End-to-end tests: Markdown in, PDF on disk or in memory out.
//!
//! The produced bytes are loaded back with lopdf and the page content
//! streams decoded, so these tests check the actual file rather than the
//! layout engine's intent.

use chrono::NaiveDate;
use lopdf::content::Content;
use lopdf::{Document, Object};
use markpage::{
    export, export_to_dir, render_pdf, ExportConfig, ExportError, ExportProgressCallback,
    MemorySink, PageSize, Stage,
};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config() -> ExportConfig {
    init_tracing();
    ExportConfig::builder()
        .date(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap())
        .title("Test notes")
        .build()
        .unwrap()
}

/// Decoded `Tj` strings per page. WinAnsi bytes below 0x80 are ASCII.
fn page_strings(bytes: &[u8]) -> Vec<Vec<String>> {
    let doc = Document::load_mem(bytes).expect("valid PDF");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let raw = doc.get_page_content(page_id).expect("page content");
            let content = Content::decode(&raw).expect("decodable content");
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(s, _)) => Some(s.iter().map(|&b| b as char).collect()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

fn all_strings(bytes: &[u8]) -> Vec<String> {
    page_strings(bytes).into_iter().flatten().collect()
}

fn long_note(sections: usize) -> String {
    let mut md = String::from("# Lecture notes\n\n");
    for i in 0..sections {
        md.push_str(&format!("## Part {i}\n\n"));
        md.push_str(&"The quick brown fox jumps over the lazy dog. ".repeat(8));
        md.push_str("\n\n1. first\n2. second\n   - nested\n\n```\nlet x = 1;\nlet y = 2;\n```\n\n");
    }
    md
}

// ── Export to a directory ────────────────────────────────────────────────────

#[tokio::test]
async fn exports_dated_pdf_into_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output = export_to_dir("# Hello\n\nWorld", dir.path(), &config())
        .await
        .unwrap();

    assert_eq!(output.filename, "notes-2024-05-17.pdf");
    let path = dir.path().join(&output.filename);
    assert!(path.exists());

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), output.stats.pdf_bytes);
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), output.stats.pages);

    let strings = all_strings(&bytes);
    assert!(strings.contains(&"Hello".to_string()), "{strings:?}");
    assert!(strings.contains(&"World".to_string()), "{strings:?}");
}

#[tokio::test]
async fn whitespace_only_markdown_is_rejected_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    for input in ["", "   ", "\n\t \n"] {
        let err = export_to_dir(input, dir.path(), &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::EmptyMarkdown), "{input:?}");
        assert!(err.is_user_error());
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn any_non_empty_input_yields_at_least_one_page() {
    let inputs = [
        "x",
        "   padded   ",
        "|",
        "$",
        "**unclosed",
        "<script>alert(1)</script>",
        "- [ ]",
        "```",
        "$$\n\\frac{}{}\n$$",
    ];
    for input in inputs {
        let sink = MemorySink::new();
        let output = export(input, &config(), &sink).await.unwrap();
        assert!(output.stats.pages >= 1, "{input:?}");

        let (_, bytes) = sink.take().pop().unwrap();
        assert!(!Document::load_mem(&bytes).unwrap().get_pages().is_empty());
    }
}

// ── Layout visible in the PDF ────────────────────────────────────────────────

#[test]
fn long_notes_span_several_pages() {
    let doc = render_pdf(&long_note(20), &config()).unwrap();
    let pages = page_strings(&doc.bytes);
    assert!(pages.len() > 2, "got {} pages", pages.len());
    assert_eq!(pages.len(), doc.layout.pages);
    assert!(pages.iter().all(|p| !p.is_empty()), "no blank pages");
}

#[test]
fn list_prefixes_reach_the_pdf() {
    let doc = render_pdf("- a\n- b\n\n3. x\n9. y", &config()).unwrap();
    let strings = all_strings(&doc.bytes);
    // `•` is 0x95 in WinAnsi.
    assert_eq!(strings.iter().filter(|s| *s == "\u{95}").count(), 2);
    assert!(strings.contains(&"1.".to_string()));
    assert!(strings.contains(&"2.".to_string()));
    assert!(!strings.contains(&"3.".to_string()));
}

#[test]
fn fenced_code_lines_reach_the_pdf_verbatim() {
    let md = "Setup:\n\n```sh\nexport PATH=$HOME/bin:$PATH\ncargo build --release\n```\n\nRun `it` now.";
    let strings = all_strings(&render_pdf(md, &config()).unwrap().bytes);
    assert!(strings.contains(&"export PATH=$HOME/bin:$PATH".to_string()), "{strings:?}");
    assert!(strings.contains(&"cargo build --release".to_string()), "{strings:?}");
    assert!(strings.contains(&"Run `it` now.".to_string()), "{strings:?}");
    assert_eq!(strings.iter().filter(|s| s.contains('`')).count(), 1, "{strings:?}");
}

#[test]
fn deeply_nested_quotes_render_instead_of_overflowing() {
    let md = format!("{}bottom of the well", "> ".repeat(5000));
    let doc = render_pdf(&md, &config()).unwrap();
    assert!(doc.layout.pages >= 1);
    assert!(all_strings(&doc.bytes).contains(&"bottom of the well".to_string()));
}

#[test]
fn math_glyphs_use_the_symbol_font() {
    let doc = render_pdf("Decay: $\\alpha \\to \\beta$", &config()).unwrap();
    let pdf = Document::load_mem(&doc.bytes).unwrap();
    let page_id = *pdf.get_pages().values().next().unwrap();
    let content = Content::decode(&pdf.get_page_content(page_id).unwrap()).unwrap();
    let symbol_runs = content
        .operations
        .iter()
        .filter(|op| op.operator == "Tf")
        .filter(|op| op.operands.first().and_then(|o| o.as_name().ok()) == Some(&b"F9"[..]))
        .count();
    assert!(symbol_runs >= 3, "α, → and β each need a Symbol run");
}

#[test]
fn page_size_sets_media_box() {
    let config = ExportConfig::builder()
        .page_size(PageSize::A4)
        .build()
        .unwrap();
    let doc = render_pdf("A4 page", &config).unwrap();
    let text = String::from_utf8_lossy(&doc.bytes);
    assert!(text.contains("595.28"), "A4 width in the MediaBox");
}

#[test]
fn rendering_is_repeatable() {
    let md = long_note(6);
    let a = render_pdf(&md, &config()).unwrap();
    let b = render_pdf(&md, &config()).unwrap();
    assert_eq!(a.layout, b.layout);
    assert_eq!(page_strings(&a.bytes), page_strings(&b.bytes));
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Events(Mutex<Vec<String>>);

impl ExportProgressCallback for Events {
    fn on_export_start(&self, markdown_len: usize) {
        self.0.lock().unwrap().push(format!("start:{markdown_len}"));
    }

    fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
        self.0.lock().unwrap().push(stage.to_string());
    }

    fn on_export_complete(&self, filename: &str, pages: usize) {
        self.0.lock().unwrap().push(format!("done:{filename}:{pages}"));
    }
}

#[tokio::test]
async fn progress_events_arrive_in_pipeline_order() {
    let events = Arc::new(Events::default());
    let config = ExportConfig::builder()
        .date(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap())
        .progress_callback(events.clone())
        .build()
        .unwrap();

    export("hello", &config, &MemorySink::new()).await.unwrap();

    let seen = events.0.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            "start:5",
            "normalize",
            "compile",
            "sanitize",
            "layout",
            "serialize",
            "persist",
            "done:notes-2024-05-17.pdf:1",
        ]
    );
}

#[tokio::test]
async fn output_serialises_to_json() {
    let output = export("# JSON", &config(), &MemorySink::new()).await.unwrap();
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["filename"], "notes-2024-05-17.pdf");
    assert_eq!(json["stats"]["pages"], 1);
    assert_eq!(json["stats"]["timings"].as_array().unwrap().len(), 6);
}
