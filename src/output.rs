//! Result types returned by the exporter.

use crate::layout::LayoutSummary;
use crate::progress::Stage;
use serde::{Deserialize, Serialize};

/// A finished PDF that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Complete PDF file contents.
    pub bytes: Vec<u8>,
    pub layout: LayoutSummary,
    /// Per-stage wall-clock timings, in execution order.
    pub timings: Vec<StageTiming>,
}

/// How long one stage took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed_ms: u64,
}

/// Summary numbers for one export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    pub pages: usize,
    pub text_lines: usize,
    pub markdown_bytes: usize,
    pub pdf_bytes: usize,
    pub timings: Vec<StageTiming>,
    pub total_duration_ms: u64,
}

/// What a successful export produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutput {
    /// `{prefix}-{YYYY-MM-DD}.pdf`
    pub filename: String,
    /// Where the sink put the artifact (a file path, or a `memory:` label).
    pub location: String,
    pub stats: ExportStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_serializes_with_stage_names() {
        let output = ExportOutput {
            filename: "notes-2024-03-01.pdf".into(),
            location: "/tmp/notes-2024-03-01.pdf".into(),
            stats: ExportStats {
                pages: 2,
                timings: vec![StageTiming {
                    stage: Stage::Layout,
                    elapsed_ms: 4,
                }],
                ..ExportStats::default()
            },
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["filename"], "notes-2024-03-01.pdf");
        assert_eq!(json["stats"]["pages"], 2);
        assert_eq!(json["stats"]["timings"][0]["stage"], "layout");
    }
}
