//! Metadata cache
//!
//! Two-layer cache (memory, then disk) in front of a [`SchemaClient`]. Entries are
//! created on the first successful fetch and reused until refreshed or cleared.
//! Remote failures are logged and degrade to empty values, which are never persisted.
//!
//! ```rust
//! use model_explorer_sdk::cache::{CacheOptions, MetadataCache};
//! use model_explorer_sdk::client::InMemorySchemaClient;
//! use model_explorer_sdk::storage::FileSystemStorageBackend;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let storage = FileSystemStorageBackend::new(dir.path());
//! let mut cache = MetadataCache::open(InMemorySchemaClient::default(), storage).unwrap();
//! assert!(cache.model_names(CacheOptions::default()).is_empty());
//! ```

pub mod keys;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::client::{ClientResult, SchemaClient, SearchQuery};
use crate::expand::RelationExpander;
use crate::models::{FieldSchema, ModelInfo, Record};
use crate::storage::{FileSystemStorageBackend, StorageBackend, StorageError};
use keys::{FIELDS_DIR, MODEL_NAMES_FILE, MODELS_INFO_FILE, SAMPLES_DIR, fields_path, sample_path};

/// Name of the cache directory under the user's home directory
pub const DEFAULT_CACHE_DIR_NAME: &str = ".odoo_explorer";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Could not determine a home directory for the cache")]
    NoCacheDir,
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Default cache location: `~/.odoo_explorer`
pub fn default_cache_dir() -> CacheResult<PathBuf> {
    let base = dirs::home_dir().ok_or(CacheError::NoCacheDir)?;
    Ok(base.join(DEFAULT_CACHE_DIR_NAME))
}

/// How a lookup may use cached entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Read existing entries
    pub use_cache: bool,
    /// Ignore and replace existing entries, including the in-memory copy
    pub refresh: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            refresh: false,
        }
    }
}

impl CacheOptions {
    pub fn refresh() -> Self {
        Self {
            use_cache: true,
            refresh: true,
        }
    }

    pub fn bypass() -> Self {
        Self {
            use_cache: false,
            refresh: false,
        }
    }

    fn reads_cache(&self) -> bool {
        self.use_cache && !self.refresh
    }
}

/// Options for [`MetadataCache::sample_record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleOptions {
    pub cache: CacheOptions,
    pub expand_relations: bool,
    pub max_depth: u32,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            cache: CacheOptions::default(),
            expand_relations: true,
            max_depth: 1,
        }
    }
}

impl SampleOptions {
    pub fn with_cache(mut self, cache: CacheOptions) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_expand_relations(mut self, expand: bool) -> Self {
        self.expand_relations = expand;
        self
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Counters of where lookups were served from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub remote_fetches: usize,
    pub disk_hits: usize,
    pub memory_hits: usize,
}

#[derive(Debug, Default)]
struct MemoryLayer {
    model_names: Option<Vec<String>>,
    models_info: Option<Vec<ModelInfo>>,
    fields: HashMap<String, FieldSchema>,
    samples: HashMap<String, Record>,
}

pub struct MetadataCache<C: SchemaClient, S: StorageBackend = FileSystemStorageBackend> {
    client: C,
    storage: S,
    memory: MemoryLayer,
    stats: CacheStats,
}

impl<C: SchemaClient> MetadataCache<C, FileSystemStorageBackend> {
    /// Open a cache stored in `dir`
    pub fn open_dir(client: C, dir: impl AsRef<Path>) -> CacheResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            StorageError::IoError(format!("Failed to create cache dir {}: {}", dir.display(), e))
        })?;
        Self::open(client, FileSystemStorageBackend::new(dir))
    }
}

impl<C: SchemaClient, S: StorageBackend> MetadataCache<C, S> {
    /// Open the cache, creating the directory layout if needed
    pub fn open(client: C, storage: S) -> CacheResult<Self> {
        storage.create_dir(FIELDS_DIR)?;
        storage.create_dir(SAMPLES_DIR)?;

        Ok(Self {
            client,
            storage,
            memory: MemoryLayer::default(),
            stats: CacheStats::default(),
        })
    }

    /// Close the cache. Writes are eager, so nothing is pending; returns the final counters.
    pub fn close(self) -> CacheStats {
        debug!(
            "Closing metadata cache: {} remote fetches, {} disk hits, {} memory hits",
            self.stats.remote_fetches, self.stats.disk_hits, self.stats.memory_hits
        );
        self.stats
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Names of all models
    pub fn model_names(&mut self, options: CacheOptions) -> Vec<String> {
        if options.refresh {
            self.memory.model_names = None;
        }
        if options.reads_cache() {
            if let Some(names) = &self.memory.model_names {
                self.stats.memory_hits += 1;
                return names.clone();
            }
            if let Some(names) = self.read_persisted::<Vec<String>>(MODEL_NAMES_FILE) {
                self.memory.model_names = Some(names.clone());
                return names;
            }
        }

        self.stats.remote_fetches += 1;
        match self.client.list_model_names() {
            Ok(names) => {
                info!("Fetched {} model names", names.len());
                self.persist(MODEL_NAMES_FILE, &names);
                self.memory.model_names = Some(names.clone());
                names
            }
            Err(e) => {
                error!("Failed to fetch model names: {}", e);
                Vec::new()
            }
        }
    }

    /// Catalog entries of all models
    pub fn models_info(&mut self, options: CacheOptions) -> Vec<ModelInfo> {
        if options.refresh {
            self.memory.models_info = None;
        }
        if options.reads_cache() {
            if let Some(info) = &self.memory.models_info {
                self.stats.memory_hits += 1;
                return info.clone();
            }
            if let Some(info) = self.read_persisted::<Vec<ModelInfo>>(MODELS_INFO_FILE) {
                self.memory.models_info = Some(info.clone());
                return info;
            }
        }

        self.stats.remote_fetches += 1;
        match self.client.list_models_info() {
            Ok(info) => {
                info!("Fetched info for {} models", info.len());
                self.persist(MODELS_INFO_FILE, &info);
                self.memory.models_info = Some(info.clone());
                info
            }
            Err(e) => {
                error!("Failed to fetch models info: {}", e);
                Vec::new()
            }
        }
    }

    /// Field schema of `model`; empty when the model is unknown or unreachable
    pub fn fields(&mut self, model: &str, options: CacheOptions) -> FieldSchema {
        if options.refresh {
            self.memory.fields.remove(model);
        }
        if options.reads_cache() {
            if let Some(fields) = self.memory.fields.get(model) {
                self.stats.memory_hits += 1;
                return fields.clone();
            }
            if let Some(fields) = self.read_persisted::<FieldSchema>(&fields_path(model)) {
                self.memory.fields.insert(model.to_string(), fields.clone());
                return fields;
            }
        }

        self.stats.remote_fetches += 1;
        match self.client.field_schema(model) {
            Ok(fields) => {
                debug!("Fetched {} fields for {}", fields.len(), model);
                self.persist(&fields_path(model), &fields);
                self.memory.fields.insert(model.to_string(), fields.clone());
                fields
            }
            Err(e) => {
                error!("Failed to fetch fields for {}: {}", model, e);
                FieldSchema::new()
            }
        }
    }

    /// Latest record of `model`, with relation fields expanded as configured
    pub fn sample_record(&mut self, model: &str, options: SampleOptions) -> Record {
        if options.cache.refresh {
            self.memory.samples.remove(model);
        }
        if options.cache.reads_cache() {
            if let Some(record) = self.memory.samples.get(model) {
                self.stats.memory_hits += 1;
                return record.clone();
            }
            if let Some(record) = self.read_persisted::<Record>(&sample_path(model)) {
                self.memory.samples.insert(model.to_string(), record.clone());
                return record;
            }
        }

        let fields = self.fields(model, CacheOptions::default());
        if fields.is_empty() {
            error!("Cannot sample {}: no field schema available", model);
            return Record::new();
        }

        let query = SearchQuery::new().with_limit(1).with_order("id desc");
        let record = match self.read_records(model, &query) {
            Ok(records) => match records.into_iter().next() {
                Some(record) => record,
                None => {
                    warn!("No records found for {}", model);
                    return Record::new();
                }
            },
            Err(e) => {
                error!("Failed to read a sample record of {}: {}", model, e);
                return Record::new();
            }
        };

        let record = if options.expand_relations && options.max_depth > 0 {
            let relation_fields: Vec<String> = fields
                .iter()
                .filter(|(_, field)| field.is_relational())
                .map(|(name, _)| name.clone())
                .collect();
            RelationExpander::new().expand(self, record, model, &relation_fields, options.max_depth)
        } else {
            record
        };

        self.persist(&sample_path(model), &record);
        self.memory.samples.insert(model.to_string(), record.clone());
        record
    }

    /// Uncached record read, counted as a remote fetch
    pub fn read_records(&mut self, model: &str, query: &SearchQuery) -> ClientResult<Vec<Record>> {
        self.stats.remote_fetches += 1;
        self.client.search_read(model, query)
    }

    /// Delete every persisted and in-memory entry, then reload the model catalog
    pub fn clear(&mut self) -> CacheResult<()> {
        for file in [MODEL_NAMES_FILE, MODELS_INFO_FILE] {
            if self.storage.file_exists(file)? {
                self.storage.delete_file(file)?;
            }
        }

        for dir in [FIELDS_DIR, SAMPLES_DIR] {
            let files = match self.storage.list_files(dir) {
                Ok(files) => files,
                Err(StorageError::DirectoryNotFound(_)) => {
                    self.storage.create_dir(dir)?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            for name in files {
                self.storage.delete_file(&format!("{}/{}", dir, name))?;
            }
        }

        self.memory = MemoryLayer::default();
        info!("Cache cleared");

        self.model_names(CacheOptions::refresh());
        self.models_info(CacheOptions::refresh());
        Ok(())
    }

    /// Catalog entry of one model
    pub fn model_info(&mut self, model: &str) -> Option<ModelInfo> {
        self.models_info(CacheOptions::default())
            .into_iter()
            .find(|info| info.model == model)
    }

    pub fn model_description(&mut self, model: &str) -> Option<String> {
        self.model_info(model).and_then(|info| info.description)
    }

    pub fn is_transient(&mut self, model: &str) -> bool {
        self.model_info(model).is_some_and(|info| info.is_transient)
    }

    pub fn is_known_model(&mut self, model: &str) -> bool {
        self.model_names(CacheOptions::default())
            .iter()
            .any(|name| name == model)
    }

    /// Model names containing `query`, case-insensitively
    pub fn search_models(&mut self, query: &str) -> Vec<String> {
        let needle = query.to_lowercase();
        self.model_names(CacheOptions::default())
            .into_iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect()
    }

    fn read_persisted<T: DeserializeOwned>(&mut self, path: &str) -> Option<T> {
        match self.storage.file_exists(path) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                warn!("Cannot check cache entry {}: {}", path, e);
                return None;
            }
        }

        let bytes = match self.storage.read_file(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot read cache entry {}: {}", path, e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                self.stats.disk_hits += 1;
                Some(value)
            }
            Err(e) => {
                warn!("Ignoring corrupt cache entry {}: {}", path, e);
                None
            }
        }
    }

    fn persist<T: Serialize>(&self, path: &str, value: &T) {
        let result = serde_json::to_vec_pretty(value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))
            .and_then(|bytes| self.storage.write_file(path, &bytes));
        if let Err(e) = result {
            warn!("Failed to write cache entry {}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemorySchemaClient;
    use crate::models::{Field, ScalarType};
    use tempfile::TempDir;

    fn partner_client() -> InMemorySchemaClient {
        let mut fields = FieldSchema::new();
        fields.insert(
            "name".to_string(),
            Field::scalar(ScalarType::Char).with_required(true),
        );
        InMemorySchemaClient::default().with_model(
            ModelInfo::new("res.partner").with_description("Contact"),
            fields,
        )
    }

    #[test]
    fn test_second_lookup_served_from_memory() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(partner_client(), temp.path()).unwrap();

        let first = cache.fields("res.partner", CacheOptions::default());
        let second = cache.fields("res.partner", CacheOptions::default());

        assert_eq!(first, second);
        assert_eq!(cache.client().call_count("field_schema"), 1);
        assert_eq!(cache.stats().memory_hits, 1);
    }

    #[test]
    fn test_refresh_invalidates_memory() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(partner_client(), temp.path()).unwrap();

        cache.fields("res.partner", CacheOptions::default());
        cache.fields("res.partner", CacheOptions::refresh());
        cache.fields("res.partner", CacheOptions::default());

        assert_eq!(cache.client().call_count("field_schema"), 2);
    }

    #[test]
    fn test_refresh_rewrites_persisted_entry() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(partner_client(), temp.path()).unwrap();
        cache.fields("res.partner", CacheOptions::default());

        cache
            .client_mut()
            .catalog_mut()
            .fields
            .get_mut("res.partner")
            .unwrap()
            .insert("email".to_string(), Field::scalar(ScalarType::Char));

        assert!(!cache.fields("res.partner", CacheOptions::default()).contains_key("email"));
        assert!(cache.fields("res.partner", CacheOptions::refresh()).contains_key("email"));

        let persisted: FieldSchema = serde_json::from_slice(
            &std::fs::read(temp.path().join("fields/res_partner.json")).unwrap(),
        )
        .unwrap();
        assert!(persisted.contains_key("email"));
        assert!(persisted.contains_key("name"));
    }

    #[test]
    fn test_failed_fetch_is_not_persisted() {
        let temp = TempDir::new().unwrap();
        let client = partner_client().with_failing_model("res.partner");
        let mut cache = MetadataCache::open_dir(client, temp.path()).unwrap();

        assert!(cache.fields("res.partner", CacheOptions::default()).is_empty());
        assert!(!temp.path().join("fields/res_partner.json").exists());
    }

    #[test]
    fn test_corrupt_entry_is_refetched() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("fields")).unwrap();
        std::fs::write(temp.path().join("fields/res_partner.json"), "{not json").unwrap();

        let mut cache = MetadataCache::open_dir(partner_client(), temp.path()).unwrap();
        let fields = cache.fields("res.partner", CacheOptions::default());

        assert!(fields.contains_key("name"));
        assert_eq!(cache.client().call_count("field_schema"), 1);
    }

    #[test]
    fn test_model_lookups() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(partner_client(), temp.path()).unwrap();

        assert_eq!(cache.model_description("res.partner").as_deref(), Some("Contact"));
        assert!(!cache.is_transient("res.partner"));
        assert!(cache.is_known_model("res.partner"));
        assert_eq!(cache.search_models("PART"), vec!["res.partner".to_string()]);
        assert!(cache.search_models("invoice").is_empty());
    }
}
