//! Field metadata model
//!
//! A field's kind is a tagged union: relation attributes only exist on relational
//! fields and selection options only on selection fields. The wire format stays the
//! flat attribute map the remote `/fields/{model}` endpoint returns.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de::{default_true, is_false, non_empty_string, optional_truthy, truthy};

/// Field name → field metadata for one model
pub type FieldSchema = BTreeMap<String, Field>;

/// Fields whose name starts with this prefix are internal and never exported
pub const INTERNAL_FIELD_PREFIX: &str = "_";

/// Check whether a field name denotes an internal field
pub fn is_internal_field(name: &str) -> bool {
    name.starts_with(INTERNAL_FIELD_PREFIX)
}

/// Flat field type, used for histograms and type dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Char,
    Text,
    Html,
    Integer,
    Float,
    Monetary,
    Boolean,
    Date,
    Datetime,
    Binary,
    Selection,
    Many2one,
    One2many,
    Many2many,
    Unknown,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Char => "char",
            FieldType::Text => "text",
            FieldType::Html => "html",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Monetary => "monetary",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Binary => "binary",
            FieldType::Selection => "selection",
            FieldType::Many2one => "many2one",
            FieldType::One2many => "one2many",
            FieldType::Many2many => "many2many",
            FieldType::Unknown => "unknown",
        }
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            FieldType::Many2one | FieldType::One2many | FieldType::Many2many
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-relational, non-selection field types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarType {
    Char,
    Text,
    Html,
    Integer,
    Float,
    Monetary,
    Boolean,
    Date,
    Datetime,
    Binary,
    /// Any type this crate has no dedicated handling for; keeps the remote type name
    Unknown(String),
}

impl ScalarType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "char" => ScalarType::Char,
            "text" => ScalarType::Text,
            "html" => ScalarType::Html,
            "integer" => ScalarType::Integer,
            "float" => ScalarType::Float,
            "monetary" => ScalarType::Monetary,
            "boolean" => ScalarType::Boolean,
            "date" => ScalarType::Date,
            "datetime" => ScalarType::Datetime,
            "binary" => ScalarType::Binary,
            other => ScalarType::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ScalarType::Char => "char",
            ScalarType::Text => "text",
            ScalarType::Html => "html",
            ScalarType::Integer => "integer",
            ScalarType::Float => "float",
            ScalarType::Monetary => "monetary",
            ScalarType::Boolean => "boolean",
            ScalarType::Date => "date",
            ScalarType::Datetime => "datetime",
            ScalarType::Binary => "binary",
            ScalarType::Unknown(name) => name,
        }
    }

    fn field_type(&self) -> FieldType {
        match self {
            ScalarType::Char => FieldType::Char,
            ScalarType::Text => FieldType::Text,
            ScalarType::Html => FieldType::Html,
            ScalarType::Integer => FieldType::Integer,
            ScalarType::Float => FieldType::Float,
            ScalarType::Monetary => FieldType::Monetary,
            ScalarType::Boolean => FieldType::Boolean,
            ScalarType::Date => FieldType::Date,
            ScalarType::Datetime => FieldType::Datetime,
            ScalarType::Binary => FieldType::Binary,
            ScalarType::Unknown(_) => FieldType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Many2one,
    One2many,
    Many2many,
}

impl RelationKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "many2one" => Some(RelationKind::Many2one),
            "one2many" => Some(RelationKind::One2many),
            "many2many" => Some(RelationKind::Many2many),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.field_type().as_str()
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            RelationKind::Many2one => FieldType::Many2one,
            RelationKind::One2many => FieldType::One2many,
            RelationKind::Many2many => FieldType::Many2many,
        }
    }

    /// True for one2many and many2many, whose values are id lists
    pub fn is_to_many(&self) -> bool {
        !matches!(self, RelationKind::Many2one)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a relational field
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub kind: RelationKind,
    /// Related model name
    pub model: String,
    /// Inverse field on the related model (one2many only, usually)
    pub inverse_field: Option<String>,
    pub domain: Option<Value>,
}

/// One allowed value of a selection field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Value, Value)", into = "(String, String)")]
pub struct SelectionOption {
    pub value: String,
    pub label: String,
}

impl SelectionOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl From<(Value, Value)> for SelectionOption {
    fn from((value, label): (Value, Value)) -> Self {
        Self {
            value: value_to_text(value),
            label: value_to_text(label),
        }
    }
}

impl From<SelectionOption> for (String, String) {
    fn from(option: SelectionOption) -> Self {
        (option.value, option.label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarType),
    Selection(Vec<SelectionOption>),
    Relational(Relation),
}

/// Metadata of a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawField", into = "RawField")]
pub struct Field {
    pub kind: FieldKind,
    /// Human-readable label (`string` on the wire)
    pub label: Option<String>,
    pub required: bool,
    pub readonly: bool,
    pub help: Option<String>,
    /// Explicit storage flag; `None` when the remote did not report it
    pub store: Option<bool>,
    pub computed: bool,
    pub indexed: bool,
    /// The field declares a custom search method
    pub custom_search: bool,
    pub searchable: bool,
    pub sortable: bool,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            label: None,
            required: false,
            readonly: false,
            help: None,
            store: None,
            computed: false,
            indexed: false,
            custom_search: false,
            searchable: true,
            sortable: true,
        }
    }

    pub fn scalar(scalar: ScalarType) -> Self {
        Self::new(FieldKind::Scalar(scalar))
    }

    pub fn selection(options: Vec<SelectionOption>) -> Self {
        Self::new(FieldKind::Selection(options))
    }

    pub fn relational(kind: RelationKind, model: impl Into<String>) -> Self {
        Self::new(FieldKind::Relational(Relation {
            kind,
            model: model.into(),
            inverse_field: None,
            domain: None,
        }))
    }

    pub fn many2one(model: impl Into<String>) -> Self {
        Self::relational(RelationKind::Many2one, model)
    }

    pub fn one2many(model: impl Into<String>, inverse_field: impl Into<String>) -> Self {
        let mut field = Self::relational(RelationKind::One2many, model);
        if let FieldKind::Relational(relation) = &mut field.kind {
            relation.inverse_field = Some(inverse_field.into());
        }
        field
    }

    pub fn many2many(model: impl Into<String>) -> Self {
        Self::relational(RelationKind::Many2many, model)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_computed(mut self, computed: bool) -> Self {
        self.computed = computed;
        self
    }

    pub fn with_store(mut self, store: bool) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    pub fn field_type(&self) -> FieldType {
        match &self.kind {
            FieldKind::Scalar(scalar) => scalar.field_type(),
            FieldKind::Selection(_) => FieldType::Selection,
            FieldKind::Relational(relation) => relation.kind.field_type(),
        }
    }

    /// Type name as reported by the remote (unknown types keep their own name)
    pub fn type_name(&self) -> &str {
        match &self.kind {
            FieldKind::Scalar(scalar) => scalar.name(),
            FieldKind::Selection(_) => FieldType::Selection.as_str(),
            FieldKind::Relational(relation) => relation.kind.as_str(),
        }
    }

    pub fn relation(&self) -> Option<&Relation> {
        match &self.kind {
            FieldKind::Relational(relation) => Some(relation),
            _ => None,
        }
    }

    pub fn related_model(&self) -> Option<&str> {
        self.relation().map(|r| r.model.as_str())
    }

    pub fn is_relational(&self) -> bool {
        self.relation().is_some()
    }

    pub fn selection_options(&self) -> &[SelectionOption] {
        match &self.kind {
            FieldKind::Selection(options) => options,
            _ => &[],
        }
    }

    /// Whether the field is persisted; computed fields are non-stored unless stated otherwise
    pub fn is_stored(&self) -> bool {
        self.store.unwrap_or(!self.computed)
    }

    /// Label, falling back to the field name
    pub fn label_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(name)
    }
}

/// Wire representation of a field
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawField {
    #[serde(rename = "type", default)]
    field_type: String,
    #[serde(default, deserialize_with = "non_empty_string", skip_serializing_if = "Option::is_none")]
    string: Option<String>,
    #[serde(default, deserialize_with = "truthy")]
    required: bool,
    #[serde(default, deserialize_with = "truthy")]
    readonly: bool,
    #[serde(default, deserialize_with = "non_empty_string", skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    #[serde(default, deserialize_with = "optional_truthy", skip_serializing_if = "Option::is_none")]
    store: Option<bool>,
    #[serde(default, deserialize_with = "truthy", skip_serializing_if = "is_false")]
    compute: bool,
    #[serde(default, deserialize_with = "truthy", skip_serializing_if = "is_false")]
    index: bool,
    #[serde(default, deserialize_with = "truthy", skip_serializing_if = "is_false")]
    search: bool,
    #[serde(default = "default_true", deserialize_with = "truthy")]
    searchable: bool,
    #[serde(default = "default_true", deserialize_with = "truthy")]
    sortable: bool,
    #[serde(default, deserialize_with = "non_empty_string", skip_serializing_if = "Option::is_none")]
    relation: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string", skip_serializing_if = "Option::is_none")]
    relation_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selection: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    domain: Option<Value>,
}

impl From<RawField> for Field {
    fn from(raw: RawField) -> Self {
        let kind = match (RelationKind::from_name(&raw.field_type), raw.relation) {
            (Some(kind), Some(model)) => FieldKind::Relational(Relation {
                kind,
                model,
                inverse_field: raw.relation_field,
                domain: raw.domain.filter(|d| !matches!(d, Value::Null | Value::Bool(false))),
            }),
            // A relational type without a target cannot be followed
            (Some(_), None) => FieldKind::Scalar(ScalarType::Unknown(raw.field_type.clone())),
            (None, _) if raw.field_type == "selection" => {
                let options = raw
                    .selection
                    .and_then(|v| serde_json::from_value::<Vec<SelectionOption>>(v).ok())
                    .unwrap_or_default();
                FieldKind::Selection(options)
            }
            (None, _) => FieldKind::Scalar(ScalarType::from_name(&raw.field_type)),
        };

        Field {
            kind,
            label: raw.string,
            required: raw.required,
            readonly: raw.readonly,
            help: raw.help,
            store: raw.store,
            computed: raw.compute,
            indexed: raw.index,
            custom_search: raw.search,
            searchable: raw.searchable,
            sortable: raw.sortable,
        }
    }
}

impl From<Field> for RawField {
    fn from(field: Field) -> Self {
        let field_type = field.type_name().to_string();
        let (relation, relation_field, selection, domain) = match field.kind {
            FieldKind::Scalar(_) => (None, None, None, None),
            FieldKind::Selection(options) => {
                let pairs = options
                    .into_iter()
                    .map(|o| Value::Array(vec![Value::String(o.value), Value::String(o.label)]))
                    .collect();
                (None, None, Some(Value::Array(pairs)), None)
            }
            FieldKind::Relational(relation) => (
                Some(relation.model),
                relation.inverse_field,
                None,
                relation.domain,
            ),
        };

        RawField {
            field_type,
            string: field.label,
            required: field.required,
            readonly: field.readonly,
            help: field.help,
            store: field.store,
            compute: field.computed,
            index: field.indexed,
            search: field.custom_search,
            searchable: field.searchable,
            sortable: field.sortable,
            relation,
            relation_field,
            selection,
            domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_many2one_field() {
        let field: Field = serde_json::from_value(json!({
            "type": "many2one",
            "string": "Country",
            "relation": "res.country",
            "required": false,
            "help": false,
        }))
        .unwrap();

        assert_eq!(field.field_type(), FieldType::Many2one);
        assert_eq!(field.related_model(), Some("res.country"));
        assert_eq!(field.label.as_deref(), Some("Country"));
        assert_eq!(field.help, None);
    }

    #[test]
    fn test_relational_without_relation_degrades_to_unknown() {
        let field: Field = serde_json::from_value(json!({"type": "many2one"})).unwrap();
        assert_eq!(field.field_type(), FieldType::Unknown);
        assert!(!field.is_relational());
        assert_eq!(field.type_name(), "many2one");
    }

    #[test]
    fn test_relation_ignored_on_scalar() {
        let field: Field =
            serde_json::from_value(json!({"type": "char", "relation": "res.country"})).unwrap();
        assert_eq!(field.related_model(), None);
    }

    #[test]
    fn test_selection_options_parsed_in_order() {
        let field: Field = serde_json::from_value(json!({
            "type": "selection",
            "selection": [["draft", "Draft"], ["done", "Done"], [3, "Three"]],
        }))
        .unwrap();

        let options = field.selection_options();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0], SelectionOption::new("draft", "Draft"));
        assert_eq!(options[2].value, "3");
    }

    #[test]
    fn test_compute_method_name_marks_computed() {
        let field: Field =
            serde_json::from_value(json!({"type": "char", "compute": "_compute_display_name"}))
                .unwrap();
        assert!(field.computed);
        assert!(!field.is_stored());

        let stored: Field = serde_json::from_value(
            json!({"type": "char", "compute": "_compute_x", "store": true}),
        )
        .unwrap();
        assert!(stored.is_stored());
    }

    #[test]
    fn test_wire_shape_survives_reserialization() {
        let field = Field::one2many("res.partner", "parent_id")
            .with_label("Contacts")
            .with_required(true);
        let value = serde_json::to_value(&field).unwrap();

        assert_eq!(value["type"], "one2many");
        assert_eq!(value["string"], "Contacts");
        assert_eq!(value["relation_field"], "parent_id");

        let back: Field = serde_json::from_value(value).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn test_unknown_type_keeps_name() {
        let field: Field = serde_json::from_value(json!({"type": "properties"})).unwrap();
        assert_eq!(field.field_type(), FieldType::Unknown);
        assert_eq!(field.type_name(), "properties");
    }
}
