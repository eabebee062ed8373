//! Model analysis
//!
//! Summarizes a model's field schema: type histogram, notable field subsets and
//! relationships bucketed by relation kind.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::{CacheOptions, MetadataCache};
use crate::client::SchemaClient;
use crate::models::{FieldSchema, FieldType, RelationKind};
use crate::storage::StorageBackend;

/// Bookkeeping fields most models carry
pub const COMMON_FIELDS: [&str; 6] = [
    "name",
    "active",
    "create_date",
    "write_date",
    "create_uid",
    "write_uid",
];

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    #[error("No field schema available for model: {0}")]
    SchemaUnavailable(String),
}

/// One outgoing relationship of a model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRef {
    pub field: String,
    /// Related model
    pub model: String,
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation_field: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Relationships {
    pub many2one: Vec<RelationshipRef>,
    pub one2many: Vec<RelationshipRef>,
    pub many2many: Vec<RelationshipRef>,
}

impl Relationships {
    pub fn bucket(&self, kind: RelationKind) -> &[RelationshipRef] {
        match kind {
            RelationKind::Many2one => &self.many2one,
            RelationKind::One2many => &self.one2many,
            RelationKind::Many2many => &self.many2many,
        }
    }

    fn bucket_mut(&mut self, kind: RelationKind) -> &mut Vec<RelationshipRef> {
        match kind {
            RelationKind::Many2one => &mut self.many2one,
            RelationKind::One2many => &mut self.one2many,
            RelationKind::Many2many => &mut self.many2many,
        }
    }

    /// All relationships, many2one first, then one2many, then many2many
    pub fn iter(&self) -> impl Iterator<Item = (RelationKind, &RelationshipRef)> {
        [
            RelationKind::Many2one,
            RelationKind::One2many,
            RelationKind::Many2many,
        ]
        .into_iter()
        .flat_map(move |kind| self.bucket(kind).iter().map(move |r| (kind, r)))
    }

    pub fn len(&self) -> usize {
        self.many2one.len() + self.one2many.len() + self.many2many.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAnalysis {
    pub model: String,
    pub field_count: usize,
    pub field_types: BTreeMap<FieldType, usize>,
    pub relationships: Relationships,
    pub required_fields: Vec<String>,
    /// Members of [`COMMON_FIELDS`] present on the model
    pub common_fields: Vec<String>,
    pub computed_fields: Vec<String>,
    /// Indexed fields and fields with a custom search method
    pub search_fields: Vec<String>,
    pub fields: FieldSchema,
}

/// Analyze an already fetched field schema
pub fn analyze_fields(model: &str, fields: &FieldSchema) -> ModelAnalysis {
    let mut field_types = BTreeMap::new();
    let mut relationships = Relationships::default();
    let mut required_fields = Vec::new();
    let mut computed_fields = Vec::new();
    let mut search_fields = Vec::new();

    for (name, field) in fields {
        *field_types.entry(field.field_type()).or_insert(0) += 1;

        if let Some(relation) = field.relation() {
            relationships.bucket_mut(relation.kind).push(RelationshipRef {
                field: name.clone(),
                model: relation.model.clone(),
                label: field.label_or(name).to_string(),
                required: field.required,
                relation_field: relation.inverse_field.clone(),
            });
        }
        if field.required {
            required_fields.push(name.clone());
        }
        if field.computed {
            computed_fields.push(name.clone());
        }
        if field.indexed || field.custom_search {
            search_fields.push(name.clone());
        }
    }

    let common_fields = COMMON_FIELDS
        .iter()
        .filter(|name| fields.contains_key(**name))
        .map(|name| name.to_string())
        .collect();

    ModelAnalysis {
        model: model.to_string(),
        field_count: fields.len(),
        field_types,
        relationships,
        required_fields,
        common_fields,
        computed_fields,
        search_fields,
        fields: fields.clone(),
    }
}

/// Analyze a model through the cache.
///
/// Fails with [`AnalysisError::ModelNotFound`] when the model catalog is available and
/// does not list `model`, and with [`AnalysisError::SchemaUnavailable`] when no fields
/// could be obtained.
pub fn analyze_model<C, S>(
    cache: &mut MetadataCache<C, S>,
    model: &str,
) -> Result<ModelAnalysis, AnalysisError>
where
    C: SchemaClient,
    S: StorageBackend,
{
    let names = cache.model_names(CacheOptions::default());
    if !names.is_empty() && !names.iter().any(|name| name == model) {
        return Err(AnalysisError::ModelNotFound(model.to_string()));
    }

    let fields = cache.fields(model, CacheOptions::default());
    if fields.is_empty() {
        return Err(AnalysisError::SchemaUnavailable(model.to_string()));
    }

    Ok(analyze_fields(model, &fields))
}
