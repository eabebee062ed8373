//! In-memory schema client
//!
//! Serves a static [`Catalog`] of models, field schemas and records. Used for offline
//! exploration of a dumped catalog file and as the test double for the cache and
//! exporters. Every call is recorded so callers can assert how often the remote side
//! was hit.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ClientError, ClientResult, SchemaClient, SearchQuery};
use crate::models::{FieldSchema, ModelInfo, Record};

/// Static snapshot of the remote metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSchema>,
    #[serde(default)]
    pub records: BTreeMap<String, Vec<Record>>,
}

#[derive(Debug, Default)]
pub struct InMemorySchemaClient {
    catalog: Catalog,
    failing_models: BTreeSet<String>,
    offline: bool,
    calls: RefCell<Vec<String>>,
}

impl InMemorySchemaClient {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::IoError(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        let catalog: Catalog = serde_json::from_str(&content).map_err(|e| {
            ClientError::InvalidResponse(format!("Invalid catalog {}: {}", path.display(), e))
        })?;
        Ok(Self::new(catalog))
    }

    /// Add a model with its field schema
    pub fn with_model(mut self, info: ModelInfo, fields: FieldSchema) -> Self {
        self.catalog.fields.insert(info.model.clone(), fields);
        self.catalog.models.push(info);
        self
    }

    pub fn with_records(mut self, model: impl Into<String>, records: Vec<Record>) -> Self {
        self.catalog.records.insert(model.into(), records);
        self
    }

    /// Make every call concerning `model` fail with a network error
    pub fn with_failing_model(mut self, model: impl Into<String>) -> Self {
        self.failing_models.insert(model.into());
        self
    }

    /// Make every call fail with a network error
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Change the served snapshot, e.g. to simulate a schema change on the server
    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Calls made so far, formatted as `operation` or `operation:model`
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of calls whose log entry starts with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record_call(&self, call: String, model: Option<&str>) -> ClientResult<()> {
        self.calls.borrow_mut().push(call);
        if self.offline {
            return Err(ClientError::NetworkError("client is offline".to_string()));
        }
        if let Some(model) = model
            && self.failing_models.contains(model)
        {
            return Err(ClientError::NetworkError(format!(
                "connection reset while reading {}",
                model
            )));
        }
        Ok(())
    }
}

fn matches_term(record: &Record, term: &Value) -> ClientResult<bool> {
    let (field, operator, operand) = match term.as_array().map(Vec::as_slice) {
        Some([Value::String(field), Value::String(op), operand]) => (field, op.as_str(), operand),
        // "&", "|" and other prefix operators are not supported; AND is implicit
        _ => {
            return Err(ClientError::InvalidResponse(format!(
                "Unsupported domain term: {}",
                term
            )));
        }
    };

    let value = record.get(field).unwrap_or(&Value::Null);
    let contains = |list: &Value| list.as_array().is_some_and(|items| items.contains(value));

    match operator {
        "=" => Ok(value == operand),
        "!=" => Ok(value != operand),
        "in" => Ok(contains(operand)),
        "not in" => Ok(!contains(operand)),
        other => Err(ClientError::InvalidResponse(format!(
            "Unsupported domain operator: {}",
            other
        ))),
    }
}

fn record_id(record: &Record) -> i64 {
    record.get("id").and_then(Value::as_i64).unwrap_or_default()
}

impl SchemaClient for InMemorySchemaClient {
    fn list_model_names(&self) -> ClientResult<Vec<String>> {
        self.record_call("list_model_names".to_string(), None)?;
        let mut names: Vec<String> = self.catalog.models.iter().map(|m| m.model.clone()).collect();
        for model in self.catalog.fields.keys() {
            if !names.contains(model) {
                names.push(model.clone());
            }
        }
        Ok(names)
    }

    fn list_models_info(&self) -> ClientResult<Vec<ModelInfo>> {
        self.record_call("list_models_info".to_string(), None)?;
        Ok(self.catalog.models.clone())
    }

    fn field_schema(&self, model: &str) -> ClientResult<FieldSchema> {
        self.record_call(format!("field_schema:{}", model), Some(model))?;
        self.catalog
            .fields
            .get(model)
            .cloned()
            .ok_or_else(|| ClientError::UnknownModel(model.to_string()))
    }

    fn search_read(&self, model: &str, query: &SearchQuery) -> ClientResult<Vec<Record>> {
        self.record_call(format!("search_read:{}", model), Some(model))?;
        if !self.catalog.fields.contains_key(model) {
            return Err(ClientError::UnknownModel(model.to_string()));
        }

        let mut matched = Vec::new();
        for record in self.catalog.records.get(model).into_iter().flatten() {
            let mut keep = true;
            for term in &query.domain {
                if !matches_term(record, term)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                matched.push(record.clone());
            }
        }

        match query.order.as_deref().map(str::trim) {
            Some("id desc") => matched.sort_by_key(|r| std::cmp::Reverse(record_id(r))),
            Some("id") | Some("id asc") => matched.sort_by_key(record_id),
            _ => {}
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        if let Some(fields) = &query.fields {
            for record in &mut matched {
                record.retain(|key, _| key == "id" || fields.iter().any(|f| f == key));
            }
        }

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, ScalarType};
    use serde_json::json;

    fn client() -> InMemorySchemaClient {
        let mut fields = FieldSchema::new();
        fields.insert("name".to_string(), Field::scalar(ScalarType::Char));
        let records = vec![
            json!({"id": 1, "name": "One", "email": "one@example.com"}),
            json!({"id": 2, "name": "Two", "email": "two@example.com"}),
            json!({"id": 3, "name": "Three", "email": false}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();

        InMemorySchemaClient::default()
            .with_model(ModelInfo::new("res.partner"), fields)
            .with_records("res.partner", records)
    }

    #[test]
    fn test_latest_record_first() {
        let client = client();
        let query = SearchQuery::new().with_limit(1).with_order("id desc");
        let records = client.search_read("res.partner", &query).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], json!(3));
    }

    #[test]
    fn test_domain_and_projection() {
        let client = client();
        let query = SearchQuery::by_ids(&[1, 3]).with_fields(["name"]);
        let records = client.search_read("res.partner", &query).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.contains_key("email")));
        assert!(records.iter().all(|r| r.contains_key("id")));
    }

    #[test]
    fn test_failures_and_call_log() {
        let client = client().with_failing_model("res.partner");
        assert!(client.field_schema("res.partner").is_err());
        assert!(matches!(
            client.field_schema("res.users"),
            Err(ClientError::UnknownModel(_))
        ));
        assert_eq!(client.call_count("field_schema"), 2);
        assert_eq!(client.calls()[0], "field_schema:res.partner");
    }
}
