//! CLI command implementations

pub mod cache;
pub mod explore;
pub mod export;
pub mod select;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{CacheStats, MetadataCache};
use crate::cli::error::CliError;
use crate::client::{Auth, InMemorySchemaClient, RestSchemaClient, SchemaClient};
use crate::config::ExplorerConfig;
use crate::export::ExportResult;
use crate::selection::Selection;

/// Selection file used when none is given
pub const DEFAULT_SELECTION_FILE: &str = "selection.json";

pub type ExplorerCache = MetadataCache<Box<dyn SchemaClient>>;

/// Cache, selection and configuration shared by every command
pub struct Session {
    pub cache: ExplorerCache,
    pub selection: Selection,
    pub config: ExplorerConfig,
    selection_path: PathBuf,
}

impl Session {
    /// Connect (or load `catalog` for offline use), open the cache and load the selection
    pub fn open(
        config: ExplorerConfig,
        catalog: Option<&Path>,
        selection_path: PathBuf,
    ) -> Result<Self, CliError> {
        let client = build_client(&config, catalog)?;
        let cache_dir = config.cache.resolve_dir()?;
        debug!("Using cache directory {}", cache_dir.display());

        let cache = MetadataCache::open_dir(client, &cache_dir)?;
        let selection = Selection::load(&selection_path)?;

        Ok(Self {
            cache,
            selection,
            config,
            selection_path,
        })
    }

    pub fn save_selection(&self) -> Result<(), CliError> {
        self.selection.save(&self.selection_path)?;
        Ok(())
    }

    pub fn require_selection(&self) -> Result<(), CliError> {
        if self.selection.is_empty() {
            return Err(CliError::NothingSelected);
        }
        Ok(())
    }

    pub fn require_model(&mut self, model: &str) -> Result<(), CliError> {
        if !self.cache.is_known_model(model) {
            return Err(CliError::ModelNotFound(model.to_string()));
        }
        Ok(())
    }

    pub fn close(self) -> CacheStats {
        self.cache.close()
    }
}

fn build_client(
    config: &ExplorerConfig,
    catalog: Option<&Path>,
) -> Result<Box<dyn SchemaClient>, CliError> {
    if let Some(catalog) = catalog {
        info!("Using offline catalog {}", catalog.display());
        return Ok(Box::new(InMemorySchemaClient::from_file(catalog)?));
    }

    let server = &config.server;
    let url = server.url.as_deref().ok_or_else(|| {
        CliError::InvalidArgument("No server URL: pass --url, set [server] url or use --catalog".to_string())
    })?;

    let auth = match (&server.token, &server.username, &server.password) {
        (Some(token), _, _) => Auth::Bearer(token.clone()),
        (None, Some(username), Some(password)) => Auth::Basic {
            username: username.clone(),
            password: password.clone(),
        },
        (None, Some(_), None) => {
            warn!("Username given without password, connecting anonymously");
            Auth::None
        }
        _ => Auth::None,
    };

    let mut client =
        RestSchemaClient::with_timeout(url, auth, Duration::from_secs(server.timeout_seconds))?;
    if let Some(database) = &server.database {
        client = client.with_database(database);
    }
    Ok(Box::new(client))
}

/// Write the artifact to `output`, or print it
pub fn emit(result: &ExportResult, output: Option<&Path>) -> Result<(), CliError> {
    if result.is_empty() {
        println!("⚠️  Nothing to export");
        return Ok(());
    }
    match output {
        Some(path) => {
            result.write_to(path)?;
            println!("✅ Wrote {} to {}", result.format, path.display());
        }
        None => println!("{}", result.content),
    }
    Ok(())
}
