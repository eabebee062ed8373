//! CLI error types

use std::path::PathBuf;

use crate::analysis::AnalysisError;
use crate::cache::CacheError;
use crate::client::ClientError;
use crate::config::ConfigError;
use crate::export::ExportError;
use crate::selection::SelectionError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read {0}: {1}")]
    FileReadError(PathBuf, String),

    #[error("Failed to write {0}: {1}")]
    FileWriteError(PathBuf, String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("No models selected. Use `select add <model>` first.")]
    NothingSelected,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}
