//! Progress-callback trait for export stage events.
//!
//! Inject an [`Arc<dyn ExportProgressCallback>`] via
//! [`crate::config::ExportConfigBuilder::progress_callback`] to be told when
//! an export starts, as each pipeline stage finishes, and when the artifact
//! has been handed to the sink.
//!
//! # Example
//!
//! ```rust
//! use markpage::{ExportConfig, ExportProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct StageCounter(AtomicUsize);
//!
//! impl ExportProgressCallback for StageCounter {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} took {elapsed_ms} ms");
//!     }
//! }
//!
//! let config = ExportConfig::builder()
//!     .progress_callback(Arc::new(StageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One step of the export pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Normalize,
    Compile,
    Sanitize,
    Layout,
    Serialize,
    Persist,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Normalize,
        Stage::Compile,
        Stage::Sanitize,
        Stage::Layout,
        Stage::Serialize,
        Stage::Persist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Compile => "compile",
            Stage::Sanitize => "sanitize",
            Stage::Layout => "layout",
            Stage::Serialize => "serialize",
            Stage::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Called by the exporter as it moves through the pipeline.
///
/// Stages before [`Stage::Persist`] run on tokio's blocking pool, so the
/// callback is invoked from a worker thread. All methods have default
/// no-op implementations.
pub trait ExportProgressCallback: Send + Sync {
    /// Called once, after the empty-input check passed.
    fn on_export_start(&self, markdown_len: usize) {
        let _ = markdown_len;
    }

    /// Called when `stage` has finished.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called once the sink has accepted the artifact.
    fn on_export_complete(&self, filename: &str, pages: usize) {
        let _ = (filename, pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn ExportProgressCallback>;
