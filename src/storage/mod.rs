//! Storage backend abstraction
//!
//! Defines the StorageBackend trait used for the persisted layer of the metadata
//! cache, and the FileSystemStorageBackend implementation rooted at the cache directory.

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Trait for storage backends
///
/// Paths are relative to the backend's root and use `/` as separator.
pub trait StorageBackend {
    /// Read a file from storage
    fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a file to storage, creating parent directories as needed
    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError>;

    /// List file names (not paths) in a directory
    fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError>;

    /// Check if a file exists
    fn file_exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete a file
    fn delete_file(&self, path: &str) -> Result<(), StorageError>;

    /// Create a directory
    fn create_dir(&self, path: &str) -> Result<(), StorageError>;

    /// Check if a directory exists
    fn dir_exists(&self, path: &str) -> Result<bool, StorageError>;
}

pub mod filesystem;

pub use filesystem::FileSystemStorageBackend;
