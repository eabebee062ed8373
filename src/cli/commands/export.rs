//! Export commands

use std::path::Path;

use tracing::info;

use super::{Session, emit};
use crate::cli::error::CliError;
use crate::export::{
    ComponentGenerator, DiagramExporter, DiagramFormat, DiagramStyle, ExportResult,
    MobileAnalyzer, PackageExporter, PromptBuilder, PromptOptions, SchemaExportOptions,
    SchemaExporter,
};

/// Handle `export-schema`
pub fn handle_export_schema(
    session: &mut Session,
    options: SchemaExportOptions,
    format: &str,
    output: Option<&Path>,
) -> Result<(), CliError> {
    session.require_selection()?;
    let export = SchemaExporter::new(options).export(&mut session.cache, &session.selection);
    emit(&export.render(format)?, output)
}

/// Handle `llm-prompt`
pub fn handle_llm_prompt(
    session: &mut Session,
    options: PromptOptions,
    output: Option<&Path>,
) -> Result<(), CliError> {
    session.require_selection()?;
    let prompt = PromptBuilder::new(options).llm_prompt(&mut session.cache, &session.selection);
    emit(&ExportResult::new(prompt, "markdown"), output)
}

/// Handle `mobile-prompt`
pub fn handle_mobile_prompt(
    session: &mut Session,
    options: PromptOptions,
    output: Option<&Path>,
) -> Result<(), CliError> {
    session.require_selection()?;
    let prompt = PromptBuilder::new(options).mobile_prompt(&mut session.cache, &session.selection);
    emit(&ExportResult::new(prompt, "markdown"), output)
}

/// Handle `mobile-analysis` (JSON report)
pub fn handle_mobile_analysis(session: &mut Session, output: Option<&Path>) -> Result<(), CliError> {
    session.require_selection()?;
    let analysis = MobileAnalyzer::new().analyze(&mut session.cache, &session.selection);
    let body = serde_json::to_string_pretty(&analysis).map_err(crate::export::ExportError::from)?;
    emit(&ExportResult::new(body, "json"), output)
}

/// Handle `api-summary` (Markdown)
pub fn handle_api_summary(session: &mut Session, output: Option<&Path>) -> Result<(), CliError> {
    session.require_selection()?;
    let summary = MobileAnalyzer::new()
        .analyze(&mut session.cache, &session.selection)
        .endpoint_summary();
    emit(&ExportResult::new(summary, "markdown"), output)
}

/// Handle `component`
pub fn handle_component(
    session: &mut Session,
    model: &str,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let source = ComponentGenerator::new().for_model(&mut session.cache, &session.selection, model)?;
    info!("Generated details screen for {}", model);
    emit(&ExportResult::new(source, "jsx"), output)
}

/// Handle `package`
pub fn handle_package(
    session: &mut Session,
    model: &str,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let package = PackageExporter::new().export(&mut session.cache, &session.selection, model)?;
    emit(&package.render()?, output)
}

/// Handle `diagram`
pub fn handle_diagram(
    session: &mut Session,
    model: &str,
    depth: u32,
    format: DiagramFormat,
    style: DiagramStyle,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let result = DiagramExporter::new(format)
        .with_style(style)
        .export(&mut session.cache, model, depth)?;
    emit(&result, output)
}
