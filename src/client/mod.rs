//! Remote schema client
//!
//! The explorer talks to the ERP through the [`SchemaClient`] trait. Implementations:
//! - `RestSchemaClient`: the REST API (`/api/v2/...`) over blocking HTTP
//! - `InMemorySchemaClient`: a static catalog, loaded from a JSON file or built in code

use serde::Serialize;
use serde_json::{Value, json};

use crate::models::{FieldSchema, ModelInfo, Record};

pub mod memory;
#[cfg(feature = "api-backend")]
pub mod rest;

pub use memory::{Catalog, InMemorySchemaClient};
#[cfg(feature = "api-backend")]
pub use rest::{Auth, RestSchemaClient};

/// Errors raised by schema clients
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Request failed with status {status}: {message}")]
    StatusError { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("IO error: {0}")]
    IoError(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Parameters of a `search_read` call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchQuery {
    pub domain: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a single record by id
    pub fn by_id(id: i64) -> Self {
        Self::new().with_domain(vec![json!(["id", "=", id])])
    }

    /// Match any of the given ids
    pub fn by_ids(ids: &[i64]) -> Self {
        Self::new().with_domain(vec![json!(["id", "in", ids])])
    }

    pub fn with_domain(mut self, domain: Vec<Value>) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }
}

/// Access to the remote model metadata and records
pub trait SchemaClient {
    /// Names of every model
    fn list_model_names(&self) -> ClientResult<Vec<String>>;

    /// Catalog entries of every model
    fn list_models_info(&self) -> ClientResult<Vec<ModelInfo>>;

    /// Field schema of one model
    fn field_schema(&self, model: &str) -> ClientResult<FieldSchema>;

    /// Filtered read of records
    fn search_read(&self, model: &str, query: &SearchQuery) -> ClientResult<Vec<Record>>;
}

impl<T: SchemaClient + ?Sized> SchemaClient for Box<T> {
    fn list_model_names(&self) -> ClientResult<Vec<String>> {
        (**self).list_model_names()
    }

    fn list_models_info(&self) -> ClientResult<Vec<ModelInfo>> {
        (**self).list_models_info()
    }

    fn field_schema(&self, model: &str) -> ClientResult<FieldSchema> {
        (**self).field_schema(model)
    }

    fn search_read(&self, model: &str, query: &SearchQuery) -> ClientResult<Vec<Record>> {
        (**self).search_read(model, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_body_shape() {
        let query = SearchQuery::by_ids(&[4, 5])
            .with_fields(["name", "display_name"])
            .with_limit(5);
        let body = serde_json::to_value(&query).unwrap();

        assert_eq!(body["domain"], json!([["id", "in", [4, 5]]]));
        assert_eq!(body["fields"], json!(["name", "display_name"]));
        assert_eq!(body["limit"], json!(5));
        assert!(body.get("order").is_none());
    }
}
