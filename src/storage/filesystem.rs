//! File system storage backend
//!
//! Implements StorageBackend on top of `std::fs`.
//!
//! ## Security
//!
//! Cache keys are derived from remote model names, so every path is validated: paths
//! containing ".." are rejected, and resolved paths must stay within the base directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::{StorageBackend, StorageError};

/// File system storage backend
#[derive(Debug, Clone)]
pub struct FileSystemStorageBackend {
    base_path: PathBuf,
}

impl FileSystemStorageBackend {
    /// Create a new file system storage backend rooted at `base_path`
    ///
    /// # Example
    ///
    /// ```rust
    /// use model_explorer_sdk::storage::FileSystemStorageBackend;
    ///
    /// let backend = FileSystemStorageBackend::new("/home/me/.odoo_explorer");
    /// assert!(backend.base_path().ends_with(".odoo_explorer"));
    /// ```
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Join `path` onto the base directory, rejecting anything that escapes it
    fn resolve_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        let normalized = path.trim_start_matches('/');

        if normalized.contains("..") {
            return Err(StorageError::PermissionDenied(
                "Path traversal (..) not allowed".to_string(),
            ));
        }

        let full = self.base_path.join(normalized);

        for component in full.components() {
            if matches!(component, Component::ParentDir) {
                return Err(StorageError::PermissionDenied(
                    "Path traversal not allowed".to_string(),
                ));
            }
        }

        // Symlinks could still point outside the base directory
        let checked = if full.exists() {
            Some(full.as_path())
        } else {
            full.parent().filter(|parent| parent.exists())
        };

        if let Some(existing) = checked {
            let canonical = existing
                .canonicalize()
                .map_err(|e| StorageError::IoError(format!("Failed to resolve path: {}", e)))?;
            let base_canonical = self
                .base_path
                .canonicalize()
                .unwrap_or_else(|_| self.base_path.clone());

            if !canonical.starts_with(&base_canonical) {
                return Err(StorageError::PermissionDenied(
                    "Path escapes base directory".to_string(),
                ));
            }
        }

        Ok(full)
    }
}

impl StorageBackend for FileSystemStorageBackend {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full_path = self.resolve_path(path)?;

        fs::read(&full_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::FileNotFound(path.to_string())
            } else {
                StorageError::IoError(format!("Failed to read file {}: {}", path, e))
            }
        })
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        let full_path = self.resolve_path(path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::IoError(format!("Failed to create directory for {}: {}", path, e))
            })?;
        }

        // Readers never observe a half-written entry
        let staging = full_path.with_extension("tmp");
        fs::write(&staging, content)
            .and_then(|_| fs::rename(&staging, &full_path))
            .map_err(|e| {
                let _ = fs::remove_file(&staging);
                StorageError::IoError(format!("Cannot store {}: {}", path, e))
            })
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let full_path = self.resolve_path(dir)?;

        let read_dir = fs::read_dir(&full_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::DirectoryNotFound(dir.to_string())
            } else {
                StorageError::IoError(format!("Failed to read directory {}: {}", dir, e))
            }
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry
                .map_err(|e| StorageError::IoError(format!("Failed to read directory entry: {}", e)))?;
            let is_file = entry.file_type().is_ok_and(|t| t.is_file());
            if let (true, Some(name)) = (is_file, entry.file_name().to_str())
                && !name.ends_with(".tmp")
            {
                entries.push(name.to_string());
            }
        }
        entries.sort();

        Ok(entries)
    }

    fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        let full_path = self.resolve_path(path)?;

        match fs::metadata(&full_path) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(format!(
                "Failed to check file existence {}: {}",
                path, e
            ))),
        }
    }

    fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let full_path = self.resolve_path(path)?;

        fs::remove_file(&full_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::FileNotFound(path.to_string())
            } else {
                StorageError::IoError(format!("Failed to delete file {}: {}", path, e))
            }
        })
    }

    fn create_dir(&self, path: &str) -> Result<(), StorageError> {
        let full_path = self.resolve_path(path)?;

        fs::create_dir_all(&full_path).map_err(|e| {
            StorageError::IoError(format!("Failed to create directory {}: {}", path, e))
        })
    }

    fn dir_exists(&self, path: &str) -> Result<bool, StorageError> {
        let full_path = self.resolve_path(path)?;

        match fs::metadata(&full_path) {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(format!(
                "Failed to check directory existence {}: {}",
                path, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_traversal_blocked() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path());

        let result = backend.resolve_path("../etc/passwd");
        assert!(matches!(result, Err(StorageError::PermissionDenied(_))));

        let result = backend.resolve_path("/fields/../../../etc/passwd");
        assert!(matches!(result, Err(StorageError::PermissionDenied(_))));

        let result = backend.resolve_path("fields/res_partner.json");
        assert!(result.is_ok());
    }

    #[test]
    fn test_write_read_delete() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path());

        backend
            .write_file("sampleRecords/res_partner_sample.json", b"{}")
            .unwrap();
        assert!(backend.dir_exists("sampleRecords").unwrap());
        assert!(
            backend
                .file_exists("sampleRecords/res_partner_sample.json")
                .unwrap()
        );
        assert_eq!(
            backend
                .read_file("sampleRecords/res_partner_sample.json")
                .unwrap(),
            b"{}"
        );
        assert_eq!(
            backend.list_files("sampleRecords").unwrap(),
            vec!["res_partner_sample.json".to_string()]
        );

        backend
            .delete_file("sampleRecords/res_partner_sample.json")
            .unwrap();
        assert!(
            !backend
                .file_exists("sampleRecords/res_partner_sample.json")
                .unwrap()
        );
    }

    #[test]
    fn test_write_leaves_no_staging_file() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path());

        backend.write_file("fields/res_partner.json", b"{}").unwrap();
        backend.write_file("fields/res_partner.json", b"[]").unwrap();

        assert!(!temp.path().join("fields/res_partner.tmp").exists());
        assert_eq!(backend.read_file("fields/res_partner.json").unwrap(), b"[]");
    }

    #[test]
    fn test_missing_file_reports_not_found() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path());

        assert!(matches!(
            backend.read_file("modelNames.json"),
            Err(StorageError::FileNotFound(_))
        ));
        assert!(matches!(
            backend.list_files("fields"),
            Err(StorageError::DirectoryNotFound(_))
        ));
    }
}
