//! Where finished PDFs go.
//!
//! The exporter never touches the filesystem itself; it hands the filename
//! and bytes to an [`ArtifactSink`] as its last step. A sink either accepts
//! the whole artifact or fails, and a failed export never calls it.

use crate::error::ExportError;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Receives the finished artifact.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store `bytes` under `filename` and return a human-readable location.
    async fn persist(&self, filename: &str, bytes: Vec<u8>) -> Result<String, ExportError>;
}

/// Writes artifacts into a directory.
///
/// Each file is written to a temporary file in the same directory and then
/// renamed into place, so readers never observe a partial PDF.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn persist(&self, filename: &str, bytes: Vec<u8>) -> Result<String, ExportError> {
        let path = self.dir.join(filename);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ExportError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;

        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &bytes))
            .await
            .map_err(|e| ExportError::Internal(format!("write task panicked: {e}")))??;

        debug!("Wrote {}", path.display());
        Ok(path.display().to_string())
    }
}

fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let failed = |source: std::io::Error| ExportError::OutputWriteFailed {
        path: target.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(failed)?;
    tmp.write_all(bytes).map_err(failed)?;
    tmp.as_file().sync_all().map_err(failed)?;
    tmp.persist(target).map_err(|e| failed(e.error))?;
    Ok(())
}

/// Keeps artifacts in memory. Useful for servers that stream the PDF back
/// to a client, and for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filenames received so far, in order.
    pub fn filenames(&self) -> Vec<String> {
        self.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Remove and return everything received so far.
    pub fn take(&self) -> Vec<(String, Vec<u8>)> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Vec<u8>)>> {
        // A push cannot leave the vector half-updated, so poisoning is ignored.
        self.artifacts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn persist(&self, filename: &str, bytes: Vec<u8>) -> Result<String, ExportError> {
        self.lock().push((filename.to_string(), bytes));
        Ok(format!("memory:{filename}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("out"));
        let location = sink.persist("a.pdf", b"%PDF-1.5".to_vec()).await.unwrap();

        let written = std::fs::read(dir.path().join("out").join("a.pdf")).unwrap();
        assert_eq!(written, b"%PDF-1.5");
        assert!(location.ends_with("a.pdf"));

        // No temp files left behind.
        let entries = std::fs::read_dir(dir.path().join("out")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn directory_sink_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        sink.persist("a.pdf", b"old".to_vec()).await.unwrap();
        sink.persist("a.pdf", b"new".to_vec()).await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("a.pdf")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn directory_sink_reports_unwritable_target() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        // `file` is a regular file, so it cannot be used as a directory.
        let sink = DirectorySink::new(&blocker);
        let err = sink.persist("a.pdf", vec![1]).await.unwrap_err();
        assert!(matches!(err, ExportError::OutputWriteFailed { .. }));
    }

    #[tokio::test]
    async fn memory_sink_keeps_artifacts() {
        let sink = MemorySink::new();
        let location = sink.persist("n.pdf", vec![1, 2, 3]).await.unwrap();
        assert_eq!(location, "memory:n.pdf");
        assert_eq!(sink.filenames(), vec!["n.pdf"]);
        assert_eq!(sink.take(), vec![("n.pdf".to_string(), vec![1, 2, 3])]);
        assert!(sink.filenames().is_empty());
    }
}
