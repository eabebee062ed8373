//! Exploration commands: list, search, inspect and sample models

use super::Session;
use crate::analysis::analyze_model;
use crate::cache::{CacheOptions, SampleOptions};
use crate::cli::error::CliError;
use crate::cli::output::{format_analysis, format_fields, format_models, format_record};
use crate::export::ExportError;

fn cache_options(refresh: bool) -> CacheOptions {
    if refresh {
        CacheOptions::refresh()
    } else {
        CacheOptions::default()
    }
}

/// Handle the `models` command; `query` filters names case-insensitively
pub fn handle_models(session: &mut Session, query: Option<&str>, refresh: bool) -> Result<(), CliError> {
    let names = session.cache.model_names(cache_options(refresh));
    let infos = session.cache.models_info(cache_options(refresh));

    let names = match query {
        Some(query) => session.cache.search_models(query),
        None => names,
    };

    print!("{}", format_models(&infos, &names, &session.selection));
    Ok(())
}

/// Handle the `fields` command
pub fn handle_fields(session: &mut Session, model: &str, refresh: bool) -> Result<(), CliError> {
    session.require_model(model)?;
    let fields = session.cache.fields(model, cache_options(refresh));
    if fields.is_empty() {
        println!("⚠️  No fields available for {}", model);
        return Ok(());
    }
    print!("{}", format_fields(model, &fields, &session.selection));
    Ok(())
}

/// Handle the `analyze` command
pub fn handle_analyze(session: &mut Session, model: &str, json: bool) -> Result<(), CliError> {
    let analysis = analyze_model(&mut session.cache, model)?;
    if json {
        let body = serde_json::to_string_pretty(&analysis).map_err(ExportError::from)?;
        println!("{}", body);
    } else {
        print!("{}", format_analysis(&analysis));
    }
    Ok(())
}

/// Handle the `sample` command
pub fn handle_sample(
    session: &mut Session,
    model: &str,
    expand: bool,
    depth: u32,
    refresh: bool,
) -> Result<(), CliError> {
    session.require_model(model)?;
    let options = SampleOptions::default()
        .with_cache(cache_options(refresh))
        .with_expand_relations(expand)
        .with_max_depth(depth);
    let record = session.cache.sample_record(model, options);
    print!("{}", format_record(model, &record));
    Ok(())
}
