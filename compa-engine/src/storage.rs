//! Durable file storage for uploads and generated result files
//!
//! Files are addressed by the opaque relative path returned at store time;
//! callers keep that path (in the upload ledger) and retrieve by it later.

use compa_common::{Error, Result};
use std::path::{Path, PathBuf};

/// File storage rooted at a configured directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `root`; the directory is created lazily
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store the original upload; returns its opaque path
    pub fn store_upload(&self, tenant_id: &str, batch_id: &str, bytes: &[u8]) -> Result<String> {
        self.store(&format!("uploads/{tenant_id}/{batch_id}.xlsx"), bytes)
    }

    /// Store a generated result file; returns its opaque path
    pub fn store_result(&self, tenant_id: &str, batch_id: &str, bytes: &[u8]) -> Result<String> {
        self.store(&format!("results/{tenant_id}/{batch_id}.xlsx"), bytes)
    }

    /// Retrieve a previously stored file by its opaque path
    pub fn load(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        Ok(std::fs::read(full)?)
    }

    fn store(&self, rel_path: &str, bytes: &[u8]) -> Result<String> {
        let full = self.resolve(rel_path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, bytes)?;
        tracing::debug!(path = rel_path, size = bytes.len(), "Stored file");
        Ok(rel_path.to_string())
    }

    // Paths are opaque tokens we issued ourselves; still refuse traversal
    fn resolve(&self, rel_path: &str) -> Result<PathBuf> {
        let rel = Path::new(rel_path);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(Error::Internal(format!("invalid storage path: {rel_path}")));
        }
        Ok(self.root.join(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let path = storage.store_upload("t1", "b1", b"workbook bytes").unwrap();
        assert_eq!(path, "uploads/t1/b1.xlsx");
        assert_eq!(storage.load(&path).unwrap(), b"workbook bytes");
    }

    #[test]
    fn results_and_uploads_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let up = storage.store_upload("t1", "b1", b"in").unwrap();
        let out = storage.store_result("t1", "b1", b"out").unwrap();
        assert_ne!(up, out);
        assert_eq!(storage.load(&up).unwrap(), b"in");
        assert_eq!(storage.load(&out).unwrap(), b"out");
    }

    #[test]
    fn traversal_paths_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.load("../etc/passwd").is_err());
        assert!(storage.load("/etc/passwd").is_err());
    }
}
