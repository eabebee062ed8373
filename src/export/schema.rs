//! Schema export
//!
//! Exports the selected models, and related models up to a configurable depth, as a
//! JSON or YAML document of annotated fields plus a flat list of relationship edges.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::timezone::{TimezoneGuidance, is_timezone_field};
use super::{ExportError, ExportResult};
use crate::analysis::analyze_model;
use crate::cache::MetadataCache;
use crate::client::SchemaClient;
use crate::models::{FieldSchema, ModelInfo, RelationKind, SelectionOption, is_internal_field};
use crate::selection::Selection;
use crate::storage::StorageBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaExportOptions {
    /// Number of BFS levels: 1 exports only the selected models
    pub depth: u32,
    pub include_relationships: bool,
    /// Drop timezone fields entirely
    pub exclude_timezone: bool,
    /// Flag timezone fields and attach timezone guidance
    pub timezone_handling: bool,
    /// Stamp the export with its creation time
    pub timestamp: bool,
}

impl Default for SchemaExportOptions {
    fn default() -> Self {
        Self {
            depth: 1,
            include_relationships: true,
            exclude_timezone: false,
            timezone_handling: false,
            timestamp: false,
        }
    }
}

impl SchemaExportOptions {
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_relationships(mut self, include: bool) -> Self {
        self.include_relationships = include;
        self
    }

    pub fn with_exclude_timezone(mut self, exclude: bool) -> Self {
        self.exclude_timezone = exclude;
        self
    }

    pub fn with_timezone_handling(mut self, handling: bool) -> Self {
        self.timezone_handling = handling;
        self
    }

    pub fn with_timestamp(mut self, timestamp: bool) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedField {
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub required: bool,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<SelectionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Value>,
    pub store: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_timezone: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub transient: bool,
    pub fields: BTreeMap<String, ExportedField>,
}

/// Directed relationship between two exported models
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEdge {
    pub from_model: String,
    pub to_model: String,
    pub field: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation_field: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaExport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub models: BTreeMap<String, ExportedModel>,
    pub relationships: Vec<RelationshipEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone_handling: Option<TimezoneGuidance>,
}

impl SchemaExport {
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String, ExportError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Render as `json` or `yaml` (`yml`); an empty export renders as empty content
    pub fn render(&self, format: &str) -> Result<ExportResult, ExportError> {
        let yaml = match format {
            "json" => false,
            "yaml" | "yml" => true,
            other => {
                return Err(ExportError::InvalidFormat(format!(
                    "{} (expected json or yaml)",
                    other
                )));
            }
        };
        if self.is_empty() {
            return Ok(ExportResult::new("", format));
        }
        let content = if yaml { self.to_yaml()? } else { self.to_json()? };
        Ok(ExportResult::new(content, format))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaExporter {
    options: SchemaExportOptions,
}

impl SchemaExporter {
    pub fn new(options: SchemaExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SchemaExportOptions {
        &self.options
    }

    /// Export the selection. Models are visited breadth-first, each at most once.
    pub fn export<C, S>(&self, cache: &mut MetadataCache<C, S>, selection: &Selection) -> SchemaExport
    where
        C: SchemaClient,
        S: StorageBackend,
    {
        if selection.is_empty() {
            warn!("No models selected for export");
            return SchemaExport::default();
        }

        let mut export = SchemaExport::default();
        let mut processed: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<(String, u32)> = VecDeque::new();
        if self.options.depth > 0 {
            queue.extend(selection.selected_models().map(|m| (m.to_string(), 1)));
        }

        while let Some((model, level)) = queue.pop_front() {
            if !processed.insert(model.clone()) {
                continue;
            }

            let analysis = match analyze_model(cache, &model) {
                Ok(analysis) => analysis,
                Err(e) => {
                    warn!("Skipping {} in schema export: {}", model, e);
                    continue;
                }
            };

            let info = cache.model_info(&model);
            let exported = self.export_model(&model, &analysis.fields, selection, info);
            export.models.insert(model.clone(), exported);

            if !self.options.include_relationships {
                continue;
            }
            for (kind, relationship) in analysis.relationships.iter() {
                export.relationships.push(RelationshipEdge {
                    from_model: model.clone(),
                    to_model: relationship.model.clone(),
                    field: relationship.field.clone(),
                    kind,
                    label: relationship.label.clone(),
                    required: relationship.required,
                    relation_field: relationship.relation_field.clone(),
                });
                if level < self.options.depth && !processed.contains(&relationship.model) {
                    debug!("Queueing {} (level {})", relationship.model, level + 1);
                    queue.push_back((relationship.model.clone(), level + 1));
                }
            }
        }

        if self.options.timezone_handling {
            export.timezone_handling = Some(TimezoneGuidance::default());
        }
        if self.options.timestamp {
            export.generated_at = Some(Utc::now());
        }

        info!(
            "Exported {} models with {} relationships",
            export.models.len(),
            export.relationships.len()
        );
        export
    }

    fn export_model(
        &self,
        model: &str,
        fields: &FieldSchema,
        selection: &Selection,
        info: Option<ModelInfo>,
    ) -> ExportedModel {
        let wanted = selection.effective_fields(model, fields);
        let mut exported = BTreeMap::new();

        for (name, field) in fields {
            if !wanted.contains(name) || is_internal_field(name) {
                continue;
            }
            if field.computed && !field.is_stored() {
                continue;
            }
            let timezone = is_timezone_field(name, field);
            if timezone && self.options.exclude_timezone {
                continue;
            }

            let relation = field.relation();
            exported.insert(
                name.clone(),
                ExportedField {
                    field_type: field.type_name().to_string(),
                    label: field.label_or(name).to_string(),
                    required: field.required,
                    readonly: field.readonly,
                    help: field.help.clone(),
                    selection: field.selection_options().to_vec(),
                    relation: relation.map(|r| r.model.clone()),
                    domain: relation.and_then(|r| r.domain.clone()),
                    store: field.is_stored(),
                    is_timezone: timezone && self.options.timezone_handling,
                },
            );
        }

        ExportedModel {
            description: info.as_ref().and_then(|i| i.description.clone()),
            transient: info.is_some_and(|i| i.is_transient),
            fields: exported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemorySchemaClient;
    use crate::models::{Field, ScalarType};
    use tempfile::TempDir;

    fn client() -> InMemorySchemaClient {
        let mut partner = FieldSchema::new();
        partner.insert(
            "name".to_string(),
            Field::scalar(ScalarType::Char).with_required(true),
        );
        partner.insert("_secret".to_string(), Field::scalar(ScalarType::Char));
        partner.insert(
            "display_name".to_string(),
            Field::scalar(ScalarType::Char).with_computed(true),
        );
        partner.insert(
            "tz".to_string(),
            Field::selection(vec![SelectionOption::new("Europe/Brussels", "Europe/Brussels")])
                .with_label("Timezone"),
        );
        partner.insert(
            "country_id".to_string(),
            Field::many2one("res.country").with_label("Country"),
        );

        let mut country = FieldSchema::new();
        country.insert(
            "name".to_string(),
            Field::scalar(ScalarType::Char).with_required(true),
        );
        country.insert("currency_id".to_string(), Field::many2one("res.currency"));

        let mut currency = FieldSchema::new();
        currency.insert("name".to_string(), Field::scalar(ScalarType::Char));

        InMemorySchemaClient::default()
            .with_model(ModelInfo::new("res.partner").with_description("Contact"), partner)
            .with_model(ModelInfo::new("res.country"), country)
            .with_model(ModelInfo::new("res.currency"), currency)
    }

    fn selection(cache: &mut MetadataCache<InMemorySchemaClient>) -> Selection {
        let known = cache.model_names(Default::default());
        let mut selection = Selection::new();
        selection.select_model("res.partner", &known);
        selection
    }

    #[test]
    fn test_field_filters() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();
        let selection = selection(&mut cache);

        let export = SchemaExporter::default().export(&mut cache, &selection);
        let partner = &export.models["res.partner"];

        assert!(partner.fields.contains_key("name"));
        assert!(partner.fields.contains_key("tz"));
        assert!(!partner.fields.contains_key("_secret"));
        assert!(!partner.fields.contains_key("display_name"));
        assert_eq!(partner.description.as_deref(), Some("Contact"));
        assert_eq!(export.models.len(), 1);
        assert_eq!(export.relationships.len(), 1);
        assert_eq!(export.relationships[0].to_model, "res.country");
    }

    #[test]
    fn test_timezone_options() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();
        let selection = selection(&mut cache);

        let excluded = SchemaExporter::new(
            SchemaExportOptions::default()
                .with_exclude_timezone(true)
                .with_timezone_handling(true),
        )
        .export(&mut cache, &selection);
        assert!(!excluded.models["res.partner"].fields.contains_key("tz"));

        let flagged = SchemaExporter::new(SchemaExportOptions::default().with_timezone_handling(true))
            .export(&mut cache, &selection);
        assert!(flagged.models["res.partner"].fields["tz"].is_timezone);
        assert!(!flagged.models["res.partner"].fields["name"].is_timezone);
        assert!(flagged.timezone_handling.is_some());
    }

    #[test]
    fn test_depth_follows_relationships() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();
        let selection = selection(&mut cache);

        let export = SchemaExporter::new(SchemaExportOptions::default().with_depth(2))
            .export(&mut cache, &selection);
        let models: Vec<&String> = export.models.keys().collect();
        assert_eq!(models, vec!["res.country", "res.partner"]);

        let export = SchemaExporter::new(SchemaExportOptions::default().with_depth(3))
            .export(&mut cache, &selection);
        assert_eq!(export.models.len(), 3);
        assert_eq!(export.relationships.len(), 2);
    }

    #[test]
    fn test_empty_selection_exports_nothing() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();

        let export = SchemaExporter::default().export(&mut cache, &Selection::new());
        assert!(export.is_empty());
        assert!(export.render("json").unwrap().is_empty());
        assert!(matches!(export.render("xml"), Err(ExportError::InvalidFormat(_))));
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();
        let selection = selection(&mut cache);

        let export = SchemaExporter::new(SchemaExportOptions::default().with_timezone_handling(true))
            .export(&mut cache, &selection);
        let value: Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();

        assert_eq!(value["relationships"][0]["fromModel"], "res.partner");
        assert_eq!(value["relationships"][0]["type"], "many2one");
        assert_eq!(value["models"]["res.partner"]["fields"]["tz"]["isTimezone"], true);
        assert!(value["timezoneHandling"]["commonIssues"].is_array());
    }
}
