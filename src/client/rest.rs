//! REST schema client
//!
//! Implements SchemaClient against the ERP's REST API (`<url>/api/v2`), using
//! blocking HTTP requests. Authentication is either HTTP Basic or a bearer token.

use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{ClientError, ClientResult, SchemaClient, SearchQuery};
use crate::models::{FieldSchema, ModelInfo, Record};

/// Path prefix of the REST API
pub const API_PREFIX: &str = "/api/v2";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials sent with every request
#[derive(Debug, Clone)]
pub enum Auth {
    None,
    Basic { username: String, password: String },
    Bearer(String),
}

pub struct RestSchemaClient {
    base_url: String,
    database: Option<String>,
    auth: Auth,
    client: Client,
}

impl RestSchemaClient {
    /// Create a client for the server at `base_url` (without the `/api/v2` suffix)
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use model_explorer_sdk::client::{Auth, RestSchemaClient};
    ///
    /// let client = RestSchemaClient::new(
    ///     "https://erp.example.com",
    ///     Auth::Basic { username: "admin".into(), password: "admin".into() },
    /// )
    /// .unwrap()
    /// .with_database("production");
    /// ```
    pub fn new(base_url: impl Into<String>, auth: Auth) -> ClientResult<Self> {
        Self::with_timeout(base_url, auth, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        auth: Auth,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            database: None,
            auth,
            client,
        })
    }

    /// Select the database on multi-database servers
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}{}", self.base_url, API_PREFIX, path);
        let mut request = self.client.request(method, &url);

        if let Some(ref db) = self.database {
            request = request.query(&[("db", db)]);
        }

        match &self.auth {
            Auth::None => request,
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
            Auth::Bearer(token) => request.bearer_auth(token),
        }
    }

    fn send(&self, request: RequestBuilder, what: &str) -> ClientResult<Response> {
        let response = request
            .send()
            .map_err(|e| ClientError::NetworkError(format!("Failed to {}: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(ClientError::StatusError {
                status: status.as_u16(),
                message: format!("{} failed: {}", what, message.trim()),
            });
        }

        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> ClientResult<T> {
        debug!("GET {}{}", API_PREFIX, path);
        let response = self.send(self.build_request(Method::GET, path), what)?;
        response
            .json()
            .map_err(|e| ClientError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }

    /// Check that the API answers; returns its version document
    pub fn check_api(&self) -> ClientResult<Value> {
        self.get_json("", "check API availability")
    }
}

impl SchemaClient for RestSchemaClient {
    fn list_model_names(&self) -> ClientResult<Vec<String>> {
        self.get_json("/model_names", "list model names")
    }

    fn list_models_info(&self) -> ClientResult<Vec<ModelInfo>> {
        self.get_json("/models", "list models")
    }

    fn field_schema(&self, model: &str) -> ClientResult<FieldSchema> {
        let path = format!("/fields/{}", urlencoding::encode(model));
        self.get_json(&path, &format!("get fields for {}", model))
    }

    fn search_read(&self, model: &str, query: &SearchQuery) -> ClientResult<Vec<Record>> {
        let path = format!("/search_read/{}", urlencoding::encode(model));
        let what = format!("read records of {}", model);
        debug!("POST {}{}", API_PREFIX, path);

        let request = self.build_request(Method::POST, &path).json(query);
        let response = self.send(request, &what)?;
        response
            .json()
            .map_err(|e| ClientError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }
}
