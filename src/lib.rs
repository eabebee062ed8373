//! Model Explorer SDK - explore, cache and export ERP model metadata
//!
//! Provides:
//! - Schema clients for the REST API (and an in-memory catalog for offline use)
//! - A two-layer metadata cache (memory + disk) with refresh/bypass rules
//! - Bounded relation expansion of sample records
//! - Model analysis and persistent model/field selection
//! - Exporters: schema documents, LLM prompts, React Native screens, mobile analysis,
//!   API endpoint summaries, mobile development packages and relationship diagrams

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod expand;
pub mod export;
pub mod models;
pub mod selection;
pub mod storage;

// Re-export commonly used types
pub use storage::{FileSystemStorageBackend, StorageBackend, StorageError};

pub use client::{Catalog, ClientError, ClientResult, InMemorySchemaClient, SchemaClient, SearchQuery};
#[cfg(feature = "api-backend")]
pub use client::{Auth, RestSchemaClient};

pub use cache::{CacheError, CacheOptions, CacheStats, MetadataCache, SampleOptions};
pub use expand::RelationExpander;
pub use analysis::{AnalysisError, ModelAnalysis, analyze_model};
pub use selection::{Selection, SelectionError};
pub use config::{ConfigError, ExplorerConfig};

pub use export::{
    ComponentGenerator, DiagramExporter, DiagramFormat, DiagramStyle, ExportError, ExportResult,
    Framework, MobileAnalysis, MobileAnalyzer, MobileDevPackage, PackageExporter, PromptBuilder,
    PromptOptions, SchemaExport, SchemaExportOptions, SchemaExporter,
};

// Re-export models
pub use models::{Field, FieldKind, FieldSchema, FieldType, ModelInfo, Record, RelationKind};
