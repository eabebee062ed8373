//! Cache maintenance commands

use super::Session;
use crate::cli::error::CliError;

/// Handle the `clear-cache` command: drop every entry and reload the model catalog
pub fn handle_clear_cache(session: &mut Session) -> Result<(), CliError> {
    session.cache.clear()?;
    let names = session
        .cache
        .model_names(crate::cache::CacheOptions::default());
    println!("✅ Cache cleared, {} model(s) reloaded", names.len());
    Ok(())
}
