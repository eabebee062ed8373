//! LLM prompt generation
//!
//! Both prompts are plain Markdown assembled from the schema export, the mobile analysis
//! and cached sample records. Output is reproducible byte-for-byte for the same
//! selection, cache contents and options.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use super::component::{ComponentGenerator, field_metadata};
use super::markdown::{json_block, pipe_table, yes_no};
use super::mobile::{MobileAnalysis, MobileAnalyzer};
use super::schema::{SchemaExport, SchemaExportOptions, SchemaExporter};
use crate::cache::{CacheOptions, MetadataCache, SampleOptions};
use crate::client::SchemaClient;
use crate::selection::Selection;
use crate::storage::StorageBackend;

/// Relationship depth the development prompt covers
pub const PROMPT_SCHEMA_DEPTH: u32 = 2;

const REACT_NATIVE_TIMEZONE_EXAMPLE: &str = r#"```javascript
// Using date-fns-tz for timezone handling in React Native
import { format, utcToZonedTime, zonedTimeToUtc } from 'date-fns-tz';

// Convert UTC time from server to local time for display
const displayLocalTime = (utcTimeString, userTimezone) => {
  const utcDate = new Date(utcTimeString);
  const userDate = utcToZonedTime(utcDate, userTimezone);
  return format(userDate, 'yyyy-MM-dd HH:mm:ss', { timeZone: userTimezone });
};

// Convert local time back to UTC for sending to server
const convertToUTC = (localTimeString, userTimezone) => {
  const localDate = new Date(localTimeString);
  const utcDate = zonedTimeToUtc(localDate, userTimezone);
  return utcDate.toISOString();
};
```

"#;

const FLUTTER_TIMEZONE_EXAMPLE: &str = r#"```dart
// Using timezone package for Flutter
import 'package:timezone/timezone.dart' as tz;
import 'package:timezone/data/latest.dart' as tz_data;

// Initialize timezone data
void initializeTimeZones() {
  tz_data.initializeTimeZones();
}

// Convert UTC time from server to local time for display
String displayLocalTime(String utcTimeString, String userTimezone) {
  final utcTime = DateTime.parse(utcTimeString);
  final location = tz.getLocation(userTimezone);
  final localTime = tz.TZDateTime.from(utcTime, location);
  return '${localTime.year}-${localTime.month}-${localTime.day} ${localTime.hour}:${localTime.minute}:${localTime.second}';
}
```

"#;

/// Target mobile framework
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Framework {
    #[default]
    ReactNative,
    Flutter,
    Other(String),
}

impl Framework {
    pub fn as_str(&self) -> &str {
        match self {
            Framework::ReactNative => "react-native",
            Framework::Flutter => "flutter",
            Framework::Other(name) => name,
        }
    }

    /// Human readable platform name
    pub fn display_name(&self) -> String {
        match self {
            Framework::ReactNative => "React Native".to_string(),
            Framework::Flutter => "Flutter".to_string(),
            Framework::Other(name) => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }

    fn timezone_example(&self) -> Option<&'static str> {
        match self {
            Framework::ReactNative => Some(REACT_NATIVE_TIMEZONE_EXAMPLE),
            Framework::Flutter => Some(FLUTTER_TIMEZONE_EXAMPLE),
            Framework::Other(_) => None,
        }
    }
}

impl FromStr for Framework {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "react-native" | "react_native" | "reactnative" => Framework::ReactNative,
            "flutter" => Framework::Flutter,
            other => Framework::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptOptions {
    pub app_description: Option<String>,
    pub exclude_timezone: bool,
    pub timezone_handling: bool,
    pub framework: Framework,
}

impl PromptOptions {
    pub fn with_app_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.app_description = (!description.trim().is_empty()).then_some(description);
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

    pub fn with_framework(mut self, framework: Framework) -> Self {
        self.framework = framework;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    options: PromptOptions,
    analyzer: MobileAnalyzer,
}

impl PromptBuilder {
    pub fn new(options: PromptOptions) -> Self {
        Self {
            options,
            analyzer: MobileAnalyzer::default(),
        }
    }

    pub fn with_analyzer(mut self, analyzer: MobileAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn options(&self) -> &PromptOptions {
        &self.options
    }

    fn push_app_description(&self, prompt: &mut String) {
        if let Some(description) = &self.options.app_description {
            prompt.push_str(&format!("## App Description\n{}\n\n", description));
        }
    }

    /// Prompt asking for an ERP application built on the selected models
    pub fn llm_prompt<C, S>(&self, cache: &mut MetadataCache<C, S>, selection: &Selection) -> String
    where
        C: SchemaClient,
        S: StorageBackend,
    {
        if selection.is_empty() {
            warn!("No models selected for export");
            return String::new();
        }

        let export_options = SchemaExportOptions::default()
            .with_depth(PROMPT_SCHEMA_DEPTH)
            .with_relationships(true)
            .with_exclude_timezone(self.options.exclude_timezone)
            .with_timezone_handling(self.options.timezone_handling);
        let export = SchemaExporter::new(export_options).export(cache, selection);

        let mut prompt = String::from("# Odoo App Development Specification\n\n");
        self.push_app_description(&mut prompt);

        prompt.push_str("## Database Schema\n\n");
        prompt.push_str(
            "I need to develop an Odoo application with the following models and relationships:\n\n",
        );
        push_models(&mut prompt, &export);
        push_relationships(&mut prompt, &export);

        if self.options.timezone_handling
            && let Some(guidance) = &export.timezone_handling
        {
            prompt.push_str("## Timezone Handling\n\n");
            prompt.push_str(
                "This application involves date/time operations which require careful timezone handling:\n\n",
            );
            prompt.push_str("### Timezone Recommendations\n\n");
            push_bullets(&mut prompt, &guidance.recommendations);
            prompt.push_str("### Common Timezone Issues\n\n");
            push_bullets(&mut prompt, &guidance.common_issues);
        }

        prompt.push_str("## Sample Records\n\n");
        prompt.push_str("Here are sample records for the selected models:\n\n");
        for model in export.models.keys() {
            let sample = cache.sample_record(model, SampleOptions::default());
            if !sample.is_empty() {
                prompt.push_str(&format!("### {}\n\n", model));
                prompt.push_str(&json_block(&sample));
                prompt.push('\n');
            }
        }

        prompt.push_str("## Task\n\n");
        prompt.push_str(
            "Based on the above schema, please help me develop an Odoo application with the following components:\n\n",
        );
        prompt.push_str("1. Model definitions with appropriate fields and methods\n");
        prompt.push_str("2. View definitions (form, tree, search)\n");
        prompt.push_str("3. Menu items and actions\n");
        prompt.push_str("4. Basic business logic\n");
        prompt.push_str("5. Security rules\n\n");
        prompt.push_str(
            "Please provide the code in a way that follows Odoo best practices and conventions.\n",
        );

        prompt
    }

    /// Prompt asking for a mobile client of the REST API
    pub fn mobile_prompt<C, S>(&self, cache: &mut MetadataCache<C, S>, selection: &Selection) -> String
    where
        C: SchemaClient,
        S: StorageBackend,
    {
        if selection.is_empty() {
            warn!("No models selected for export");
            return String::new();
        }

        let analysis = self.analyzer.analyze(cache, selection);
        let framework = &self.options.framework;

        let mut prompt = String::from("# Odoo Mobile App Development Specification\n\n");
        self.push_app_description(&mut prompt);

        prompt.push_str("## Target Platform\n");
        prompt.push_str(&format!(
            "The mobile app will be built using {}.\n\n",
            framework.display_name()
        ));

        prompt.push_str("## Odoo REST API Integration\n\n");
        prompt.push_str("The app will connect to an Odoo REST API with the following endpoints:\n\n");
        prompt.push_str("### Required API Endpoints\n\n");
        for endpoint in &analysis.api_endpoints {
            prompt.push_str(&format!("- **{} {}**\n", endpoint.method, endpoint.path));
            prompt.push_str(&format!("  - Purpose: {}\n", endpoint.purpose));
            prompt.push_str(&format!("  - Model: {}\n\n", endpoint.model));
        }

        if !analysis.key_workflows.is_empty() {
            prompt.push_str("### Key Mobile Workflows\n\n");
            for workflow in &analysis.key_workflows {
                prompt.push_str(&format!("#### {}\n", workflow.name));
                prompt.push_str(&format!("Models involved: {}\n\n", workflow.models.join(", ")));
                prompt.push_str("API sequence:\n");
                for (step, endpoint) in workflow.endpoints.iter().enumerate() {
                    prompt.push_str(&format!(
                        "{}. {} {} - {}\n",
                        step + 1,
                        endpoint.method,
                        endpoint.path,
                        endpoint.purpose
                    ));
                }
                prompt.push('\n');
            }
        }

        push_mobile_fields(&mut prompt, cache, &analysis);

        prompt.push_str("## Recommended App Structure\n\n");
        prompt.push_str("The mobile app should have the following structure:\n\n");
        prompt.push_str("1. **Authentication Module** - Login with Odoo credentials\n");
        prompt.push_str("2. **API Service Layer** - Handle REST API communication\n");
        prompt.push_str("3. **Data Models** - TypeScript/Dart interfaces for Odoo models\n");
        prompt.push_str("4. **UI Components** - Reusable components for common patterns\n");
        prompt.push_str("5. **Screens** - Main app screens based on workflows\n");
        prompt.push_str("6. **State Management** - Global state for app data\n");
        prompt.push_str("7. **Offline Support** - Local storage for offline operations\n\n");

        if self.options.timezone_handling
            && let Some(recommendations) = &analysis.recommendations.timezone_handling
        {
            self.push_mobile_timezone(&mut prompt, &analysis, recommendations);
        }

        for (category, recommendations) in analysis.recommendations.categories() {
            prompt.push_str(&format!("## {} Recommendations\n\n", category));
            push_bullets(&mut prompt, recommendations);
        }

        prompt.push_str("## Task\n\n");
        prompt.push_str("Please help me build this mobile app by providing:\n\n");
        prompt.push_str(&format!("1. Initial project setup for {}\n", framework));
        prompt.push_str("2. API service implementation for the required endpoints\n");
        prompt.push_str("3. TypeScript/Dart interfaces for the Odoo models\n");
        prompt.push_str("4. UI components for common Odoo patterns\n");
        prompt.push_str("5. Example screen implementations for key workflows\n");

        if *framework == Framework::ReactNative {
            let generator = ComponentGenerator::new();
            for model in selection.selected_models() {
                let schema = cache.fields(model, CacheOptions::default());
                let fields = field_metadata(model, &schema, selection);
                if fields.is_empty() {
                    continue;
                }
                prompt.push_str(&format!(
                    "\n\n## Sample React Native Component for {}\n\n",
                    model
                ));
                prompt.push_str("```jsx\n");
                prompt.push_str(&generator.generate(model, &fields));
                prompt.push_str("\n```\n");
                break;
            }
        }

        prompt
    }

    fn push_mobile_timezone(
        &self,
        prompt: &mut String,
        analysis: &MobileAnalysis,
        recommendations: &[String],
    ) {
        prompt.push_str("## Timezone Handling\n\n");
        prompt.push_str(
            "This mobile app involves date/time operations which require careful timezone handling:\n\n",
        );
        prompt.push_str("### Timezone Recommendations\n\n");
        push_bullets(prompt, recommendations);

        if analysis.has_timezone_fields() {
            prompt.push_str("### Timezone Fields\n\n");
            for (model, result) in &analysis.models {
                if result.timezone_fields.is_empty() {
                    continue;
                }
                prompt.push_str(&format!("#### {}\n", model));
                for field in &result.timezone_fields {
                    prompt.push_str(&format!("- `{}`: {}\n", field.name, field.label));
                }
                prompt.push('\n');
            }
        }

        if let Some(example) = self.options.framework.timezone_example() {
            prompt.push_str("### Example Timezone Handling Code\n\n");
            prompt.push_str(example);
        }
    }
}

fn push_bullets(prompt: &mut String, items: &[String]) {
    for item in items {
        prompt.push_str(&format!("- {}\n", item));
    }
    prompt.push('\n');
}

fn push_models(prompt: &mut String, export: &SchemaExport) {
    prompt.push_str("### Models\n\n");
    for (model, exported) in &export.models {
        prompt.push_str(&format!("#### {}\n", model));
        if let Some(description) = &exported.description {
            prompt.push_str(&format!("Description: {}\n", description));
        }
        if exported.transient {
            prompt.push_str("Type: Transient Model (Wizard)\n");
        }
        prompt.push_str("\nFields:\n");

        let rows: Vec<Vec<String>> = exported
            .fields
            .iter()
            .map(|(name, field)| {
                let field_type = match &field.relation {
                    Some(relation) => format!("{} -> {}", field.field_type, relation),
                    None => field.field_type.clone(),
                };
                vec![
                    name.clone(),
                    field_type,
                    field.label.clone(),
                    yes_no(field.required).to_string(),
                    yes_no(field.readonly).to_string(),
                    field.help.clone().unwrap_or_default(),
                ]
            })
            .collect();
        prompt.push_str(&pipe_table(
            &["Field Name", "Type", "Label", "Required", "Readonly", "Help"],
            &rows,
        ));
        prompt.push_str("\n\n");
    }
}

fn push_relationships(prompt: &mut String, export: &SchemaExport) {
    if export.relationships.is_empty() {
        return;
    }
    prompt.push_str("### Relationships\n\n");
    let rows: Vec<Vec<&str>> = export
        .relationships
        .iter()
        .map(|edge| {
            vec![
                edge.from_model.as_str(),
                edge.kind.as_str(),
                edge.to_model.as_str(),
                edge.field.as_str(),
                edge.label.as_str(),
                yes_no(edge.required),
            ]
        })
        .collect();
    prompt.push_str(&pipe_table(
        &["From Model", "Relationship", "To Model", "Field", "Label", "Required"],
        &rows,
    ));
    prompt.push_str("\n\n");
}

fn push_mobile_fields<C, S>(prompt: &mut String, cache: &mut MetadataCache<C, S>, analysis: &MobileAnalysis)
where
    C: SchemaClient,
    S: StorageBackend,
{
    prompt.push_str("### Model Fields for Mobile UI\n\n");
    for (model, result) in &analysis.models {
        prompt.push_str(&format!("#### {}\n\n", model));

        if !result.key_fields.is_empty() {
            prompt.push_str("Key fields for display:\n");
            let rows: Vec<Vec<&str>> = result
                .key_fields
                .iter()
                .map(|f| {
                    vec![
                        f.name.as_str(),
                        f.field_type.as_str(),
                        f.label.as_str(),
                        yes_no(f.required),
                    ]
                })
                .collect();
            prompt.push_str(&pipe_table(&["Field Name", "Type", "Label", "Required"], &rows));
            prompt.push_str("\n\n");
        }

        if !result.heavy_fields.is_empty() {
            prompt.push_str("⚠️ **Fields to handle with care** (potentially heavy data):\n");
            for field in &result.heavy_fields {
                prompt.push_str(&format!(
                    "- `{}` ({}): {}\n",
                    field.name, field.field_type, field.label
                ));
            }
            prompt.push('\n');
        }

        let sample = cache.sample_record(model, SampleOptions::default());
        if !sample.is_empty() {
            prompt.push_str("Sample Record:\n");
            prompt.push_str(&json_block(&sample));
            prompt.push('\n');
        }
    }
}
