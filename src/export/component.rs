//! React Native details screen generation
//!
//! Renders a details screen for one model: fetches a record through the REST API and
//! shows every selected field with a type-specific row and an icon.

use serde::Serialize;
use tracing::debug;

use super::{ExportError, component_name};
use crate::cache::{CacheOptions, MetadataCache};
use crate::client::SchemaClient;
use crate::models::{Field, FieldSchema, FieldType, SelectionOption, is_internal_field};
use crate::selection::Selection;
use crate::storage::StorageBackend;

const DETAILS_SCREEN_TEMPLATE: &str = include_str!("templates/details_screen.jsx");

const ROW_INDENT: &str = "\n        ";

/// Field description the component generator works from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMeta {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<SelectionOption>,
}

impl FieldMeta {
    pub fn from_field(name: &str, field: &Field) -> Self {
        Self {
            name: name.to_string(),
            label: field.label_or(name).to_string(),
            field_type: field.field_type(),
            required: field.required,
            readonly: field.readonly,
            relation: field.related_model().map(str::to_string),
            help: field.help.clone(),
            selection: field.selection_options().to_vec(),
        }
    }
}

/// Metadata of the selected, non-internal fields of `model`, in name order
pub fn field_metadata(model: &str, schema: &FieldSchema, selection: &Selection) -> Vec<FieldMeta> {
    let wanted = selection.effective_fields(model, schema);
    schema
        .iter()
        .filter(|(name, _)| wanted.contains(*name) && !is_internal_field(name))
        .map(|(name, field)| FieldMeta::from_field(name, field))
        .collect()
}

/// Ionicons name for a field; name hints win over the field type
pub fn icon_for(name: &str, field_type: FieldType) -> &'static str {
    const NAME_HINTS: [(&[&str], &str); 10] = [
        (&["name"], "person-outline"),
        (&["email"], "mail-outline"),
        (&["phone", "mobile"], "call-outline"),
        (&["address", "street"], "home-outline"),
        (&["city"], "business-outline"),
        (&["country", "state"], "flag-outline"),
        (&["zip", "postal"], "mail-outline"),
        (&["date", "time"], "calendar-outline"),
        (&["image", "photo"], "image-outline"),
        (&["active"], "checkmark-circle-outline"),
    ];

    let lowered = name.to_lowercase();
    if let Some((_, icon)) = NAME_HINTS
        .iter()
        .find(|(hints, _)| hints.iter().any(|hint| lowered.contains(hint)))
    {
        return icon;
    }
    if lowered.contains("description") || lowered.contains("note") {
        return "document-text-outline";
    }

    match field_type {
        FieldType::Many2one => "link-outline",
        FieldType::One2many | FieldType::Many2many => "list-outline",
        FieldType::Boolean => "checkmark-outline",
        FieldType::Date | FieldType::Datetime => "calendar-outline",
        FieldType::Binary => "document-attach-outline",
        FieldType::Html => "code-outline",
        FieldType::Text => "document-text-outline",
        FieldType::Selection => "options-outline",
        FieldType::Integer | FieldType::Float | FieldType::Monetary => "calculator-outline",
        _ => "information-circle-outline",
    }
}

/// Label as JSX text; labels with markup characters become a string expression
fn jsx_text(label: &str) -> String {
    if label.contains(['{', '}', '<', '>', '&', '"', '\'', '\\', '\n']) {
        let literal = serde_json::to_string(label).unwrap_or_else(|_| "\"\"".to_string());
        format!("{{{literal}}}")
    } else {
        label.to_string()
    }
}

fn info_row(icon: &str, label: &str, value: &str) -> String {
    format!(
        r##"<View style={{styles.infoRow}}>
            <Ionicons name="{icon}" size={{20}} color="#333" style={{styles.infoIcon}} />
            <Text style={{styles.infoLabel}}>{label}</Text>
            <Text style={{styles.infoValue}}>{value}</Text>
          </View>"##
    )
}

fn info_block(icon: &str, label: &str, value: &str) -> String {
    format!(
        r##"<View style={{styles.infoBlock}}>
            <View style={{styles.infoBlockHeader}}>
              <Ionicons name="{icon}" size={{20}} color="#333" style={{styles.infoIcon}} />
              <Text style={{styles.infoBlockLabel}}>{label}</Text>
            </View>
            <Text style={{styles.infoBlockText}}>{value}</Text>
          </View>"##
    )
}

fn when(condition: &str, body: String) -> String {
    format!("{{{condition} && (\n          {body}\n        )}}")
}

/// JSX row for one field; `None` for the record id
pub fn field_row(meta: &FieldMeta) -> Option<String> {
    if meta.name == "id" {
        return None;
    }

    let name = &meta.name;
    let value = format!("record.{name}");
    let icon = icon_for(name, meta.field_type);
    let label = jsx_text(&meta.label);
    let label = label.as_str();

    let row = match meta.field_type {
        FieldType::Many2one => when(
            &value,
            info_row(icon, label, &format!("{{{value} ? {value}[1] : 'Not specified'}}")),
        ),
        FieldType::One2many | FieldType::Many2many => when(
            &value,
            info_row(icon, label, &format!("{{{value}.length + ' items'}}")),
        ),
        FieldType::Boolean => info_row(icon, label, &format!("{{{value} ? 'Yes' : 'No'}}")),
        FieldType::Date | FieldType::Datetime => {
            when(&value, info_row(icon, label, &format!("{{formatDate({value})}}")))
        }
        FieldType::Binary => when(&value, info_row(icon, label, "[Binary data]")),
        FieldType::Html => when(&value, info_block(icon, label, "[HTML content]")),
        FieldType::Text => when(&value, info_block(icon, label, &format!("{{{value}}}"))),
        FieldType::Selection => when(
            &value,
            info_row(
                icon,
                label,
                &format!(
                    "{{{value}.replace(/_/g, ' ').charAt(0).toUpperCase() + {value}.replace(/_/g, ' ').slice(1)}}"
                ),
            ),
        ),
        _ => when(
            &format!("{value} !== undefined && {value} !== false"),
            info_row(icon, label, &format!("{{{value}}}")),
        ),
    };
    Some(row)
}

#[derive(Debug, Clone, Default)]
pub struct ComponentGenerator;

impl ComponentGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Details screen source for `model` showing `fields`
    pub fn generate(&self, model: &str, fields: &[FieldMeta]) -> String {
        let component = component_name(model);
        let file_name = model.replace('.', "_").to_lowercase();
        let field_list = fields
            .iter()
            .map(|f| format!("'{}'", f.name))
            .collect::<Vec<_>>()
            .join(",\n        ");
        let field_rows = fields
            .iter()
            .filter_map(field_row)
            .collect::<Vec<_>>()
            .join(ROW_INDENT);

        debug!("Generating {}DetailsScreen with {} fields", component, fields.len());

        DETAILS_SCREEN_TEMPLATE
            .trim_end()
            .replace("__COMPONENT__", &component)
            .replace("__FILE_NAME__", &file_name)
            .replace("__MODEL__", model)
            .replace("__FIELD_LIST__", &field_list)
            .replace("__FIELD_ROWS__", &field_rows)
    }

    /// Details screen for `model` from its cached schema and the current field selection
    pub fn for_model<C, S>(
        &self,
        cache: &mut MetadataCache<C, S>,
        selection: &Selection,
        model: &str,
    ) -> Result<String, ExportError>
    where
        C: SchemaClient,
        S: StorageBackend,
    {
        let schema = cache.fields(model, CacheOptions::default());
        if schema.is_empty() {
            if cache.is_known_model(model) {
                return Err(ExportError::SchemaUnavailable(model.to_string()));
            }
            return Err(ExportError::ModelNotFound(model.to_string()));
        }
        Ok(self.generate(model, &field_metadata(model, &schema, selection)))
    }
}
