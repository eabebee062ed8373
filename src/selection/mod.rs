//! Selection model
//!
//! Tracks which models, and which fields of each model, an export covers. A model may
//! have selected fields without being selected itself; fields are kept for when it is
//! selected again. Required fields can never be removed from a model's field set.

pub mod picker;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{FieldSchema, is_internal_field};

pub use picker::{FieldPicker, PickerEvent, PickerItem, PickerOutcome};

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result of [`Selection::toggle_field`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldToggle {
    Added,
    Removed,
    /// The field is required and stays selected
    RequiredKept,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    selected_models: BTreeSet<String>,
    #[serde(default)]
    selected_fields: BTreeMap<String, BTreeSet<String>>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a selection saved with [`Selection::save`]; a missing file yields an empty selection
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SelectionError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            SelectionError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            SelectionError::SerializationError(format!("Invalid selection {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SelectionError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SelectionError::SerializationError(e.to_string()))?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                SelectionError::IoError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            SelectionError::IoError(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    /// Select a model. Unknown models are rejected with a warning; returns whether the
    /// selection changed.
    pub fn select_model(&mut self, model: &str, known_models: &[String]) -> bool {
        if !known_models.iter().any(|known| known == model) {
            warn!("Model {} not found", model);
            return false;
        }
        let added = self.selected_models.insert(model.to_string());
        if added {
            info!("Selected model {}", model);
        }
        added
    }

    /// Deselect a model, keeping its field selection; returns whether it was selected
    pub fn deselect_model(&mut self, model: &str) -> bool {
        let removed = self.selected_models.remove(model);
        if removed {
            info!("Deselected model {}", model);
        } else {
            warn!("Model {} is not selected", model);
        }
        removed
    }

    /// Drop every selected model and field
    pub fn clear(&mut self) {
        self.selected_models.clear();
        self.selected_fields.clear();
    }

    pub fn is_model_selected(&self, model: &str) -> bool {
        self.selected_models.contains(model)
    }

    /// Selected models in name order
    pub fn selected_models(&self) -> impl Iterator<Item = &str> {
        self.selected_models.iter().map(String::as_str)
    }

    pub fn model_count(&self) -> usize {
        self.selected_models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_models.is_empty()
    }

    /// Explicitly selected fields of a model (empty when none were chosen)
    pub fn selected_fields(&self, model: &str) -> Option<&BTreeSet<String>> {
        self.selected_fields.get(model)
    }

    /// Add a field, or remove it unless it is required
    pub fn toggle_field(&mut self, model: &str, field: &str, schema: &FieldSchema) -> FieldToggle {
        self.ensure_required_fields(model, schema);
        let required = schema.get(field).is_some_and(|f| f.required);
        let fields = self.selected_fields.entry(model.to_string()).or_default();

        if fields.contains(field) {
            if required {
                warn!("Cannot remove required field {} of {}", field, model);
                return FieldToggle::RequiredKept;
            }
            fields.remove(field);
            FieldToggle::Removed
        } else {
            fields.insert(field.to_string());
            FieldToggle::Added
        }
    }

    /// Replace the model's field set with `fields` plus every required field
    pub fn set_fields<I, S>(&mut self, model: &str, fields: I, schema: &FieldSchema)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected: BTreeSet<String> = fields.into_iter().map(Into::into).collect();
        selected.extend(required_fields(schema));
        self.selected_fields.insert(model.to_string(), selected);
    }

    /// Select every field of the model's schema
    pub fn select_all_fields(&mut self, model: &str, schema: &FieldSchema) {
        self.selected_fields
            .insert(model.to_string(), schema.keys().cloned().collect());
    }

    /// Deselect every field except the required ones
    pub fn select_no_fields(&mut self, model: &str, schema: &FieldSchema) {
        self.selected_fields
            .insert(model.to_string(), required_fields(schema).collect());
    }

    /// Add the model's required fields to its field set; done whenever fields are inspected
    pub fn ensure_required_fields(&mut self, model: &str, schema: &FieldSchema) {
        self.selected_fields
            .entry(model.to_string())
            .or_default()
            .extend(required_fields(schema));
    }

    /// Fields an export covers: the explicit set plus required fields when non-empty,
    /// else every non-internal field
    pub fn effective_fields(&self, model: &str, schema: &FieldSchema) -> BTreeSet<String> {
        match self.selected_fields.get(model) {
            Some(fields) if !fields.is_empty() => {
                let mut fields = fields.clone();
                fields.extend(required_fields(schema));
                fields
            }
            _ => schema
                .keys()
                .filter(|name| !is_internal_field(name))
                .cloned()
                .collect(),
        }
    }
}

fn required_fields(schema: &FieldSchema) -> impl Iterator<Item = String> + '_ {
    schema
        .iter()
        .filter(|(_, field)| field.required)
        .map(|(name, _)| name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, ScalarType};
    use tempfile::TempDir;

    fn schema() -> FieldSchema {
        let mut fields = FieldSchema::new();
        fields.insert(
            "name".to_string(),
            Field::scalar(ScalarType::Char).with_required(true),
        );
        fields.insert("email".to_string(), Field::scalar(ScalarType::Char));
        fields.insert("__last_update".to_string(), Field::scalar(ScalarType::Datetime));
        fields
    }

    fn known() -> Vec<String> {
        vec!["res.partner".to_string(), "res.country".to_string()]
    }

    #[test]
    fn test_unknown_model_is_not_selected() {
        let mut selection = Selection::new();
        assert!(!selection.select_model("res.unknown", &known()));
        assert!(selection.is_empty());
        assert!(selection.select_model("res.partner", &known()));
        assert!(!selection.select_model("res.partner", &known()));
        assert_eq!(selection.model_count(), 1);
    }

    #[test]
    fn test_deselect_keeps_fields() {
        let mut selection = Selection::new();
        selection.select_model("res.partner", &known());
        selection.toggle_field("res.partner", "email", &schema());

        assert!(selection.deselect_model("res.partner"));
        assert!(!selection.deselect_model("res.partner"));
        assert!(selection.selected_fields("res.partner").unwrap().contains("email"));
    }

    #[test]
    fn test_required_field_cannot_be_toggled_off() {
        let mut selection = Selection::new();
        let schema = schema();
        selection.ensure_required_fields("res.partner", &schema);

        assert_eq!(
            selection.toggle_field("res.partner", "name", &schema),
            FieldToggle::RequiredKept
        );
        assert!(selection.selected_fields("res.partner").unwrap().contains("name"));

        assert_eq!(
            selection.toggle_field("res.partner", "email", &schema),
            FieldToggle::Added
        );
        assert_eq!(
            selection.toggle_field("res.partner", "email", &schema),
            FieldToggle::Removed
        );
    }

    #[test]
    fn test_toggle_on_fresh_model_keeps_required() {
        let mut selection = Selection::new();
        let schema = schema();
        selection.select_model("res.partner", &known());

        assert_eq!(
            selection.toggle_field("res.partner", "email", &schema),
            FieldToggle::Added
        );

        let explicit = selection.selected_fields("res.partner").unwrap();
        assert!(explicit.contains("name"));
        let fields = selection.effective_fields("res.partner", &schema);
        assert_eq!(fields.into_iter().collect::<Vec<_>>(), vec!["email", "name"]);
    }

    #[test]
    fn test_effective_fields_add_required_to_explicit_set() {
        let json = r#"{"selectedModels": ["res.partner"], "selectedFields": {"res.partner": ["email"]}}"#;
        let selection: Selection = serde_json::from_str(json).unwrap();

        let fields = selection.effective_fields("res.partner", &schema());
        assert!(fields.contains("name"));
        assert!(fields.contains("email"));
    }

    #[test]
    fn test_select_none_keeps_required() {
        let mut selection = Selection::new();
        let schema = schema();
        selection.select_all_fields("res.partner", &schema);
        assert_eq!(selection.selected_fields("res.partner").unwrap().len(), 3);

        selection.select_no_fields("res.partner", &schema);
        let fields: Vec<&String> = selection.selected_fields("res.partner").unwrap().iter().collect();
        assert_eq!(fields, vec!["name"]);
    }

    #[test]
    fn test_default_fields_exclude_internal() {
        let selection = Selection::new();
        let fields = selection.effective_fields("res.partner", &schema());
        assert!(fields.contains("name"));
        assert!(fields.contains("email"));
        assert!(!fields.contains("__last_update"));
    }

    #[test]
    fn test_set_fields_adds_required() {
        let mut selection = Selection::new();
        selection.set_fields("res.partner", ["email"], &schema());
        let fields = selection.effective_fields("res.partner", &schema());
        assert_eq!(fields.len(), 2);
        assert!(fields.contains("name"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("selection.json");

        let mut selection = Selection::new();
        selection.select_model("res.partner", &known());
        selection.ensure_required_fields("res.partner", &schema());
        selection.save(&path).unwrap();

        assert_eq!(Selection::load(&path).unwrap(), selection);
        assert!(Selection::load(temp.path().join("missing.json")).unwrap().is_empty());
    }
}
