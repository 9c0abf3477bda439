//! Per-export scratch files
//!
//! An [`ExportSession`] owns the compressed photos written while one export
//! runs. Its files are deleted when the session is dropped, which covers
//! success, early returns on error, cancellation and unwinding.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::error::{ExportError, ExportPhase, Result};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Scope of one export call and its temp files
#[derive(Debug)]
pub struct ExportSession {
    id: String,
    prefix: String,
    scratch_dir: PathBuf,
    /// Record index (input position) -> temp file
    files: BTreeMap<usize, PathBuf>,
}

impl ExportSession {
    /// Start a session whose temp files are named `<prefix>_<id>_<record>.jpg`
    pub fn new(prefix: impl Into<String>, scratch_dir: impl Into<PathBuf>) -> Self {
        let id = format!(
            "{}-{}",
            std::process::id(),
            NEXT_SESSION.fetch_add(1, Ordering::Relaxed)
        );
        Self {
            id,
            prefix: prefix.into(),
            scratch_dir: scratch_dir.into(),
            files: BTreeMap::new(),
        }
    }

    /// Unique id of this session (process id and a process-wide counter)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Path of the temp file for `record_index`, whether or not it exists yet
    pub fn temp_path(&self, record_index: usize) -> PathBuf {
        self.scratch_dir
            .join(format!("{}_{}_{}.jpg", self.prefix, self.id, record_index))
    }

    /// Write the compressed photo of `record_index` to its temp file
    pub fn store(&mut self, record_index: usize, bytes: &[u8]) -> Result<&Path> {
        fs::create_dir_all(&self.scratch_dir)
            .map_err(|e| ExportError::io(ExportPhase::TempWrite, &self.scratch_dir, e))?;

        let path = self.temp_path(record_index);
        // Tracked before writing so a partial file is still removed
        self.files.insert(record_index, path.clone());
        fs::write(&path, bytes).map_err(|e| ExportError::io(ExportPhase::TempWrite, &path, e))?;

        Ok(self.files[&record_index].as_path())
    }

    /// Temp file already holding the photo of `record_index`
    pub fn cached(&self, record_index: usize) -> Option<&Path> {
        self.files.get(&record_index).map(PathBuf::as_path)
    }

    /// Re-read the stored photo of `record_index`
    pub fn load(&self, record_index: usize) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.cached(record_index) else {
            return Ok(None);
        };
        fs::read(path)
            .map(Some)
            .map_err(|e| ExportError::io(ExportPhase::TempRead, path, e))
    }

    /// All temp files owned by the session
    pub fn temp_files(&self) -> impl Iterator<Item = &Path> {
        self.files.values().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Drop for ExportSession {
    fn drop(&mut self) {
        for path in self.files.values() {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove temp file"),
            }
        }
        debug!(session = %self.id, files = self.files.len(), "export session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = ExportSession::new("GeneralControl", dir.path());
        let b = ExportSession::new("GeneralControl", dir.path());
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with(&format!("{}-", std::process::id())));
    }

    #[test]
    fn test_temp_file_naming() {
        let dir = tempfile::tempdir().unwrap();
        let session = ExportSession::new("WorkOrders", dir.path());
        let expected = dir
            .path()
            .join(format!("WorkOrders_{}_3.jpg", session.id()));
        assert_eq!(session.temp_path(3), expected);
    }

    #[test]
    fn test_store_load_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut session = ExportSession::new("WorkOrders", dir.path());
            assert!(session.cached(0).is_none());
            assert_eq!(session.load(0).unwrap(), None);

            let path = session.store(0, b"jpeg bytes").unwrap().to_path_buf();
            assert!(path.exists());
            assert_eq!(session.cached(0), Some(path.as_path()));
            assert_eq!(session.load(0).unwrap().as_deref(), Some(&b"jpeg bytes"[..]));
            assert_eq!(session.len(), 1);
            path
        };

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_scratch_dir_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("nested").join("scratch");
        let mut session = ExportSession::new("Template", &scratch);

        session.store(7, b"x").unwrap();
        assert!(scratch.join(format!("Template_{}_7.jpg", session.id())).exists());
    }

    #[test]
    fn test_cleanup_on_unwind() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().to_path_buf();

        let result = std::panic::catch_unwind(move || {
            let mut session = ExportSession::new("GeneralControl", &scratch);
            session.store(1, b"x").unwrap();
            panic!("export aborted");
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ExportSession::new("WorkOrders", dir.path());
        let path = session.store(2, b"x").unwrap().to_path_buf();
        std::fs::remove_file(&path).unwrap();

        let err = session.load(2).unwrap_err();
        assert!(matches!(
            err,
            ExportError::Io { phase: ExportPhase::TempRead, .. }
        ));
    }
}
