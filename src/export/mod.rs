//! Export functionality
//!
//! Turns the current selection into artifacts:
//! - Schema export (JSON / YAML)
//! - LLM prompts for ERP and mobile app development
//! - React Native details screen components
//! - Mobile app analysis and API endpoint summary
//! - Mobile app development package
//! - Relationship diagrams (Mermaid / PlantUML)
//!
//! Every exporter returns an empty result, after logging a warning, when no model is
//! selected; [`ExportResult::write_to`] refuses to write empty artifacts.

pub mod component;
pub mod diagram;
pub mod markdown;
pub mod mobile;
pub mod package;
pub mod prompt;
pub mod schema;
pub mod timezone;

use std::path::Path;

use tracing::info;

use crate::analysis::AnalysisError;

/// Result of an export operation
#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    /// Exported content
    pub content: String,
    /// Format identifier
    pub format: String,
}

impl ExportResult {
    pub fn new(content: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            format: format.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Write the artifact to `path`. Empty artifacts are never written.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let path = path.as_ref();
        if self.is_empty() {
            return Err(ExportError::EmptyExport(format!(
                "nothing to write to {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ExportError::IoError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        std::fs::write(path, &self.content).map_err(|e| {
            ExportError::IoError(format!("Failed to write {}: {}", path.display(), e))
        })?;
        info!("Exported {} to {}", self.format, path.display());
        Ok(())
    }
}

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    #[error("No field schema available for model: {0}")]
    SchemaUnavailable(String),
    #[error("Nothing to export: {0}")]
    EmptyExport(String),
    #[error("Unknown output format: {0}")]
    InvalidFormat(String),
}

impl From<AnalysisError> for ExportError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::ModelNotFound(model) => ExportError::ModelNotFound(model),
            AnalysisError::SchemaUnavailable(model) => ExportError::SchemaUnavailable(model),
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ExportError {
    fn from(err: serde_yaml::Error) -> Self {
        ExportError::SerializationError(err.to_string())
    }
}

/// `res.partner` → `ResPartner`
pub fn component_name(model: &str) -> String {
    model
        .split(['.', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.map(|c| c.to_ascii_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect()
}

pub use component::ComponentGenerator;
pub use diagram::{DiagramExporter, DiagramFormat, DiagramStyle};
pub use mobile::{EndpointRegistry, MobileAnalysis, MobileAnalyzer};
pub use package::{MobileDevPackage, PackageExporter};
pub use prompt::{Framework, PromptBuilder, PromptOptions};
pub use schema::{SchemaExport, SchemaExportOptions, SchemaExporter};
