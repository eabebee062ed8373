//! Mobile app development package
//!
//! A single JSON document bundling everything needed to start a mobile screen for one
//! model: field list, relationships, a sample record, the generated details screen,
//! navigator and list screen sample code, and field-specific notes.

use serde::Serialize;
use tracing::info;

use super::component::{ComponentGenerator, field_metadata};
use super::{ExportError, ExportResult, component_name};
use crate::analysis::analyze_model;
use crate::cache::{MetadataCache, SampleOptions};
use crate::client::SchemaClient;
use crate::models::{FieldType, RelationKind, Record};
use crate::selection::Selection;
use crate::storage::StorageBackend;

const NAVIGATOR_TEMPLATE: &str = r#"import { NavigationContainer } from '@react-navigation/native';
import { createStackNavigator } from '@react-navigation/stack';
import __COMPONENT__ListScreen from './__COMPONENT__ListScreen';
import __COMPONENT__DetailsScreen from './__COMPONENT__DetailsScreen';

const Stack = createStackNavigator();

function App() {
  return (
    <NavigationContainer>
      <Stack.Navigator>
        <Stack.Screen name="__COMPONENT__List" component={__COMPONENT__ListScreen} />
        <Stack.Screen name="__COMPONENT__Details" component={__COMPONENT__DetailsScreen} />
      </Stack.Navigator>
    </NavigationContainer>
  );
}
export default App;"#;

const LIST_SCREEN_TEMPLATE: &str = r#"import React from 'react';
import {
  FlatList,
  TouchableOpacity,
  Text,
  StyleSheet
} from 'react-native';

const __COMPONENT__ListScreen = ({ navigation }) => {
  const __ITEMS__ = [
    __SAMPLE__,
    // Add more records as needed
  ];
  return (
    <FlatList
      data={__ITEMS__}
      renderItem={({ item }) => (
        <TouchableOpacity
          style={styles.item}
          onPress={() => navigation.navigate('__COMPONENT__Details', { record: item })}>
          <Text style={styles.itemText}>{item.name || item.display_name || `Record #${item.id}`}</Text>
        </TouchableOpacity>
      )}
      keyExtractor={(item) => item.id.toString()}
    />
  );
};

const styles = StyleSheet.create({
  item: {
    padding: 15,
    borderBottomWidth: 1,
    borderBottomColor: '#eee',
  },
  itemText: {
    fontSize: 16,
  },
});

export default __COMPONENT__ListScreen;"#;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    pub required: bool,
    pub relation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageRelationship {
    pub from_model: String,
    pub to_model: String,
    pub field: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenCode {
    pub navigator: String,
    pub list_screen: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MobileDevPackage {
    pub model: String,
    pub fields: Vec<PackageField>,
    pub relationships: Vec<PackageRelationship>,
    pub sample_record: Record,
    pub react_native_component: String,
    /// Instructions for the screens the package does not generate
    pub next_steps: ScreenCode,
    pub sample_code: ScreenCode,
    pub notes: Vec<String>,
}

impl MobileDevPackage {
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render(&self) -> Result<ExportResult, ExportError> {
        Ok(ExportResult::new(self.to_json()?, "json"))
    }
}

/// Note for a field whose type needs special care on mobile
fn field_note(field: &PackageField) -> Option<String> {
    match field.field_type {
        FieldType::Many2one => Some(format!(
            "Check for False in {} to avoid 'bool object is not subscriptable' errors.",
            field.name
        )),
        FieldType::Binary => Some(format!(
            "Optimize {} (binary) to prevent performance issues on mobile.",
            field.name
        )),
        FieldType::One2many | FieldType::Many2many => Some(format!(
            "Limit the number of records fetched for {} to avoid overloading the UI.",
            field.name
        )),
        _ => None,
    }
}

fn list_variable(model: &str) -> String {
    let last = model.rsplit('.').next().unwrap_or(model);
    format!("{}s", last)
}

fn indent_json(record: &Record) -> String {
    let body = serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string());
    body.lines().collect::<Vec<_>>().join("\n    ")
}

#[derive(Debug, Clone, Default)]
pub struct PackageExporter {
    generator: ComponentGenerator,
}

impl PackageExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export<C, S>(
        &self,
        cache: &mut MetadataCache<C, S>,
        selection: &Selection,
        model: &str,
    ) -> Result<MobileDevPackage, ExportError>
    where
        C: SchemaClient,
        S: StorageBackend,
    {
        if !cache.is_known_model(model) {
            return Err(ExportError::ModelNotFound(model.to_string()));
        }
        let analysis = analyze_model(cache, model)?;

        let metadata = field_metadata(model, &analysis.fields, selection);
        let fields: Vec<PackageField> = metadata
            .iter()
            .map(|meta| PackageField {
                name: meta.name.clone(),
                field_type: meta.field_type,
                label: meta.label.clone(),
                required: meta.required,
                relation: meta.relation.clone().unwrap_or_default(),
            })
            .collect();

        let relationships = analysis
            .relationships
            .iter()
            .map(|(kind, relationship)| PackageRelationship {
                from_model: model.to_string(),
                to_model: relationship.model.clone(),
                field: relationship.field.clone(),
                kind,
                label: relationship.label.clone(),
            })
            .collect();

        let sample_record = cache.sample_record(model, SampleOptions::default());
        let component = component_name(model);

        let sample_code = ScreenCode {
            navigator: NAVIGATOR_TEMPLATE.replace("__COMPONENT__", &component),
            list_screen: LIST_SCREEN_TEMPLATE
                .replace("__COMPONENT__", &component)
                .replace("__ITEMS__", &list_variable(model))
                .replace("__SAMPLE__", &indent_json(&sample_record)),
        };
        let next_steps = ScreenCode {
            navigator: "Set up a stack navigator using react-navigation to link the list and details screens.".to_string(),
            list_screen: format!(
                "Create a list screen with FlatList to display {} records and navigate to the details screen.",
                model
            ),
        };

        let notes = fields.iter().filter_map(field_note).collect();

        info!("Built mobile development package for {}", model);
        Ok(MobileDevPackage {
            model: model.to_string(),
            react_native_component: self.generator.generate(model, &metadata),
            fields,
            relationships,
            sample_record,
            next_steps,
            sample_code,
            notes,
        })
    }
}
