//! Mobile app analysis
//!
//! Classifies the fields of the selected models for a mobile client, derives the REST
//! endpoints the app needs, detects known multi-model workflows and attaches generic
//! recommendations. Also renders the API endpoint summary.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use super::markdown::pipe_table;
use super::timezone::{MOBILE_TIMEZONE_RECOMMENDATIONS, mentions_timezone};
use crate::cache::{CacheOptions, MetadataCache};
use crate::client::SchemaClient;
use crate::models::{Field, FieldType, is_internal_field};
use crate::selection::Selection;
use crate::storage::StorageBackend;

/// Fields shown in list and header views even when optional
pub const KEY_FIELD_NAMES: [&str; 5] = ["name", "display_name", "state", "date", "create_date"];

/// OAuth2 token path of the REST API
pub const OAUTH2_TOKEN_PATH: &str = "/api/v2/authentication/oauth2/token";

const OFFLINE_SUPPORT: [&str; 4] = [
    "Implement local storage for frequently accessed data",
    "Queue API operations when offline",
    "Use optimistic UI updates with background synchronization",
    "Store user preferences and settings locally",
];

const PERFORMANCE: [&str; 5] = [
    "Request only necessary fields in API calls",
    "Implement pagination for large data sets",
    "Lazy load images and heavy content",
    "Cache responses for frequently accessed data",
    "Use compression for network requests where supported",
];

const UX: [&str; 5] = [
    "Show loading states for all network operations",
    "Implement pull-to-refresh for content lists",
    "Provide offline indicators when network is unavailable",
    "Use appropriate input types for different field types",
    "Validate input on the client before sending to the server",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub method: String,
    pub path: String,
    pub purpose: String,
    /// Model the endpoint operates on
    pub model: String,
}

impl Endpoint {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        purpose: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            purpose: purpose.into(),
            model: model.into(),
        }
    }
}

/// List, detail, create and update endpoints every model gets
fn standard_endpoints(model: &str) -> Vec<Endpoint> {
    vec![
        Endpoint::new("GET", format!("/search_read/{}", model), "List view", model),
        Endpoint::new("GET", format!("/read/{}", model), "Detail view", model),
        Endpoint::new("POST", format!("/create/{}", model), "Create record", model),
        Endpoint::new("PUT", format!("/write/{}", model), "Update record", model),
    ]
}

/// Model-specific endpoints added on top of the standard four
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    extras: BTreeMap<String, Vec<Endpoint>>,
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::empty().with_endpoint(Endpoint::new(
            "POST",
            "/call/hr.employee/attendance_manual",
            "Check in/out",
            "hr.employee",
        ))
    }
}

impl EndpointRegistry {
    pub fn empty() -> Self {
        Self {
            extras: BTreeMap::new(),
        }
    }

    /// Register an extra endpoint for `endpoint.model`
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.extras
            .entry(endpoint.model.clone())
            .or_default()
            .push(endpoint);
        self
    }

    pub fn extras_for(&self, model: &str) -> &[Endpoint] {
        self.extras.get(model).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A multi-model flow, detected when all of its models are selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workflow {
    pub name: String,
    pub models: Vec<String>,
    pub endpoints: Vec<Endpoint>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, models: &[&str], endpoints: Vec<Endpoint>) -> Self {
        Self {
            name: name.into(),
            models: models.iter().map(|m| m.to_string()).collect(),
            endpoints,
        }
    }

    fn applies_to(&self, selected: &BTreeSet<&str>) -> bool {
        self.models.iter().all(|m| selected.contains(m.as_str()))
    }
}

fn default_workflows() -> Vec<Workflow> {
    vec![
        Workflow::new(
            "Check In/Out",
            &["hr.employee", "hr.attendance"],
            vec![
                Endpoint::new("GET", "/search_read/hr.employee", "Find employee", "hr.employee"),
                Endpoint::new(
                    "POST",
                    "/call/hr.employee/attendance_manual",
                    "Check in/out",
                    "hr.employee",
                ),
            ],
        ),
        Workflow::new(
            "Timesheet Recording",
            &["hr.employee", "project.task", "account.analytic.line"],
            vec![
                Endpoint::new("GET", "/search_read/project.task", "List tasks", "project.task"),
                Endpoint::new(
                    "POST",
                    "/create/account.analytic.line",
                    "Create timesheet entry",
                    "account.analytic.line",
                ),
            ],
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MobileField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub required: bool,
}

impl MobileField {
    fn from_field(name: &str, field: &Field) -> Self {
        Self {
            name: name.to_string(),
            field_type: field.type_name().to_string(),
            label: field.label_or(name).to_string(),
            required: field.required,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileModelAnalysis {
    pub key_fields: Vec<MobileField>,
    /// Binary and HTML fields, expensive to transfer and render
    pub heavy_fields: Vec<MobileField>,
    pub timezone_fields: Vec<MobileField>,
    pub required_endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub offline_support: Vec<String>,
    pub performance: Vec<String>,
    pub ux: Vec<String>,
    /// Only present when a selected model has timezone fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone_handling: Option<Vec<String>>,
}

impl Recommendations {
    /// Titled categories, timezone handling excluded
    pub fn categories(&self) -> [(&'static str, &[String]); 3] {
        [
            ("Offline Support", &self.offline_support),
            ("Performance", &self.performance),
            ("UX", &self.ux),
        ]
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileAnalysis {
    pub models: BTreeMap<String, MobileModelAnalysis>,
    pub api_endpoints: Vec<Endpoint>,
    pub key_workflows: Vec<Workflow>,
    pub recommendations: Recommendations,
}

impl MobileAnalysis {
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn has_timezone_fields(&self) -> bool {
        self.models.values().any(|m| !m.timezone_fields.is_empty())
    }

    /// Markdown summary of the endpoints, grouped by model
    pub fn endpoint_summary(&self) -> String {
        if self.is_empty() {
            warn!("No models selected for API endpoint summary");
            return String::new();
        }

        let mut summary = String::new();
        summary.push_str("# API Endpoints for Mobile App\n\n");
        summary.push_str(
            "This document outlines the API endpoints required for the mobile application.\n\n",
        );

        summary.push_str("## Authentication\n\n");
        summary.push_str("The API supports the following authentication methods:\n\n");
        summary.push_str("- **Basic Authentication**: Username and password\n");
        summary.push_str(
            "- **OAuth2**: Authorization code, implicit, password, and client credentials flows\n\n",
        );
        summary.push_str("### OAuth2 Token Endpoint\n\n");
        summary.push_str(&format!("```\n{}\n```\n\n", OAUTH2_TOKEN_PATH));

        summary.push_str("## Model Endpoints\n\n");
        let mut groups: Vec<(&str, Vec<&Endpoint>)> = Vec::new();
        for endpoint in &self.api_endpoints {
            match groups.iter_mut().find(|(model, _)| *model == endpoint.model) {
                Some((_, endpoints)) => endpoints.push(endpoint),
                None => groups.push((&endpoint.model, vec![endpoint])),
            }
        }
        for (model, endpoints) in groups {
            summary.push_str(&format!("### {}\n\n", model));
            summary.push_str(&endpoint_table(endpoints));
            summary.push_str("\n\n");
        }

        if !self.key_workflows.is_empty() {
            summary.push_str("## Key Workflows\n\n");
            for workflow in &self.key_workflows {
                summary.push_str(&format!("### {}\n", workflow.name));
                summary.push_str(&format!(
                    "Models involved: {}\n\n",
                    workflow.models.join(", ")
                ));
                summary.push_str("API Sequence:\n");
                summary.push_str(&endpoint_table(workflow.endpoints.iter()));
                summary.push_str("\n\n");
            }
        }

        summary
    }
}

fn endpoint_table<'a>(endpoints: impl IntoIterator<Item = &'a Endpoint>) -> String {
    let rows: Vec<Vec<&str>> = endpoints
        .into_iter()
        .map(|e| vec![e.method.as_str(), e.path.as_str(), e.purpose.as_str()])
        .collect();
    pipe_table(&["Method", "Path", "Purpose"], &rows)
}

#[derive(Debug, Clone)]
pub struct MobileAnalyzer {
    registry: EndpointRegistry,
    workflows: Vec<Workflow>,
}

impl Default for MobileAnalyzer {
    fn default() -> Self {
        Self {
            registry: EndpointRegistry::default(),
            workflows: default_workflows(),
        }
    }
}

impl MobileAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(mut self, registry: EndpointRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_workflow(mut self, workflow: Workflow) -> Self {
        self.workflows.push(workflow);
        self
    }

    pub fn analyze<C, S>(&self, cache: &mut MetadataCache<C, S>, selection: &Selection) -> MobileAnalysis
    where
        C: SchemaClient,
        S: StorageBackend,
    {
        if selection.is_empty() {
            warn!("No models selected for mobile app analysis");
            return MobileAnalysis::default();
        }

        let mut analysis = MobileAnalysis::default();

        for model in selection.selected_models() {
            let fields = cache.fields(model, CacheOptions::default());
            if fields.is_empty() {
                debug!("Skipping {} in mobile analysis: no fields", model);
                continue;
            }

            let wanted = selection.effective_fields(model, &fields);
            let mut result = MobileModelAnalysis::default();

            for (name, field) in &fields {
                if !wanted.contains(name) || is_internal_field(name) {
                    continue;
                }
                if KEY_FIELD_NAMES.contains(&name.as_str()) || field.required {
                    result.key_fields.push(MobileField::from_field(name, field));
                }
                if matches!(field.field_type(), FieldType::Binary | FieldType::Html) {
                    result.heavy_fields.push(MobileField::from_field(name, field));
                }
                if mentions_timezone(name, field) {
                    result.timezone_fields.push(MobileField::from_field(name, field));
                }
            }

            result.required_endpoints = standard_endpoints(model);
            result
                .required_endpoints
                .extend(self.registry.extras_for(model).iter().cloned());

            analysis
                .api_endpoints
                .extend(result.required_endpoints.iter().cloned());
            analysis.models.insert(model.to_string(), result);
        }

        let selected: BTreeSet<&str> = selection.selected_models().collect();
        analysis.key_workflows = self
            .workflows
            .iter()
            .filter(|w| w.applies_to(&selected))
            .cloned()
            .collect();

        analysis.recommendations = Recommendations {
            offline_support: owned(&OFFLINE_SUPPORT),
            performance: owned(&PERFORMANCE),
            ux: owned(&UX),
            timezone_handling: None,
        };
        if analysis.has_timezone_fields() {
            analysis.recommendations.timezone_handling = Some(owned(&MOBILE_TIMEZONE_RECOMMENDATIONS));
        }

        analysis
    }
}
