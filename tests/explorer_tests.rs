//! End-to-end tests: catalog file -> cache -> selection -> exports

use std::path::Path;

use model_explorer_sdk::export::{
    DiagramExporter, DiagramFormat, PackageExporter, PromptBuilder, PromptOptions,
    SchemaExportOptions, SchemaExporter,
};
use model_explorer_sdk::{
    CacheOptions, InMemorySchemaClient, MetadataCache, SampleOptions, Selection,
};
use serde_json::{Value, json};
use tempfile::TempDir;

/// Catalog in the wire format the REST endpoints return
fn catalog_json() -> Value {
    json!({
        "models": [
            {"model": "res.partner", "info": {"string": "Contact"}, "transient": false},
            {"model": "res.country", "info": {"string": "Country"}, "transient": false},
            {"model": "res.partner.category", "info": {"string": "Partner Tags"}},
            {"model": "base.import.wizard", "info": {"string": false}, "transient": true}
        ],
        "fields": {
            "res.partner": {
                "id": {"type": "integer", "string": "ID", "readonly": true},
                "name": {"type": "char", "string": "Name", "required": true},
                "email": {"type": "char", "string": "Email", "help": false},
                "tz": {
                    "type": "selection",
                    "string": "Timezone",
                    "selection": [["Europe/Brussels", "Europe/Brussels"], ["UTC", "UTC"]]
                },
                "country_id": {"type": "many2one", "string": "Country", "relation": "res.country"},
                "category_id": {
                    "type": "many2many",
                    "string": "Tags",
                    "relation": "res.partner.category"
                },
                "display_name": {"type": "char", "string": "Display Name", "compute": "_compute_display_name"}
            },
            "res.country": {
                "id": {"type": "integer", "string": "ID"},
                "name": {"type": "char", "string": "Country Name", "required": true},
                "code": {"type": "char", "string": "Country Code"}
            },
            "res.partner.category": {
                "id": {"type": "integer", "string": "ID"},
                "name": {"type": "char", "string": "Tag Name", "required": true}
            }
        },
        "records": {
            "res.partner": [
                {
                    "id": 7,
                    "name": "Azure Interior",
                    "email": "azure@example.com",
                    "tz": "Europe/Brussels",
                    "country_id": [21, "Belgium"],
                    "category_id": [3]
                }
            ],
            "res.country": [
                {"id": 21, "name": "Belgium", "display_name": "Belgium", "code": "BE"}
            ],
            "res.partner.category": [
                {"id": 3, "name": "Vendor", "display_name": "Vendor"}
            ]
        }
    })
}

fn write_catalog(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("catalog.json");
    std::fs::write(&path, serde_json::to_string_pretty(&catalog_json()).unwrap()).unwrap();
    path
}

fn open_cache(temp: &TempDir) -> MetadataCache<InMemorySchemaClient> {
    let client = InMemorySchemaClient::from_file(write_catalog(temp.path())).unwrap();
    MetadataCache::open_dir(client, temp.path().join("cache")).unwrap()
}

fn partner_selection(cache: &mut MetadataCache<InMemorySchemaClient>) -> Selection {
    let known = cache.model_names(CacheOptions::default());
    let mut selection = Selection::new();
    assert!(selection.select_model("res.partner", &known));
    selection
}

mod cache_tests {
    use super::*;

    #[test]
    fn test_model_catalog_from_file() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);

        let names = cache.model_names(CacheOptions::default());
        assert_eq!(names.len(), 4);
        assert!(cache.is_transient("base.import.wizard"));
        assert_eq!(cache.model_description("base.import.wizard"), None);
        assert_eq!(
            cache.search_models("partner"),
            vec!["res.partner".to_string(), "res.partner.category".to_string()]
        );
    }

    #[test]
    fn test_repeated_lookups_hit_remote_once() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);

        let first = cache.fields("res.partner", CacheOptions::default());
        let second = cache.fields("res.partner", CacheOptions::default());

        assert_eq!(first, second);
        assert_eq!(cache.client().call_count("field_schema"), 1);
    }

    #[test]
    fn test_refresh_refetches() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);

        cache.fields("res.partner", CacheOptions::default());
        cache.fields("res.partner", CacheOptions::refresh());

        assert_eq!(cache.client().call_count("field_schema"), 2);
    }

    #[test]
    fn test_persisted_entries_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);
        let fields = cache.fields("res.partner", CacheOptions::default());
        cache.model_names(CacheOptions::default());
        cache.close();

        let client = InMemorySchemaClient::from_file(temp.path().join("catalog.json"))
            .unwrap()
            .offline();
        let mut reopened = MetadataCache::open_dir(client, temp.path().join("cache")).unwrap();

        assert_eq!(reopened.fields("res.partner", CacheOptions::default()), fields);
        assert_eq!(reopened.model_names(CacheOptions::default()).len(), 4);
        assert!(reopened.stats().disk_hits >= 2);
        assert_eq!(reopened.stats().remote_fetches, 0);
    }

    #[test]
    fn test_sample_expands_relations() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);

        let record = cache.sample_record("res.partner", SampleOptions::default());

        assert_eq!(record["id"], 7);
        assert_eq!(record["country_id_expanded"]["name"], "Belgium");
        assert_eq!(record["category_id_expanded"][0]["name"], "Vendor");
    }

    #[test]
    fn test_sample_without_expansion() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);

        let options = SampleOptions::default().with_expand_relations(false);
        let record = cache.sample_record("res.partner", options);

        assert_eq!(record["country_id"], json!([21, "Belgium"]));
        assert!(!record.contains_key("country_id_expanded"));
    }

    #[test]
    fn test_clear_drops_persisted_entries() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);
        cache.fields("res.partner", CacheOptions::default());

        assert!(temp.path().join("cache/fields/res_partner.json").exists());

        cache.clear().unwrap();
        assert!(!temp.path().join("cache/fields/res_partner.json").exists());

        // The model catalog is reloaded right away
        assert_eq!(cache.client().call_count("list_model_names"), 1);
        assert_eq!(cache.client().call_count("list_models_info"), 1);
        assert!(temp.path().join("cache/modelNames.json").exists());
        assert!(temp.path().join("cache/modelsInfo.json").exists());

        cache.fields("res.partner", CacheOptions::default());
        assert_eq!(cache.client().call_count("field_schema"), 2);
    }
}

mod export_tests {
    use super::*;

    #[test]
    fn test_depth_one_export_keeps_edges_to_unexported_models() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);
        let selection = partner_selection(&mut cache);

        let export = SchemaExporter::new(SchemaExportOptions::default()).export(&mut cache, &selection);

        assert_eq!(export.models.keys().collect::<Vec<_>>(), vec!["res.partner"]);
        let partner = &export.models["res.partner"];
        assert!(partner.fields.contains_key("name"));
        assert!(!partner.fields.contains_key("display_name"));

        let country = export
            .relationships
            .iter()
            .find(|edge| edge.field == "country_id")
            .unwrap();
        assert_eq!(country.to_model, "res.country");
        assert_eq!(country.label, "Country");
    }

    #[test]
    fn test_toggled_field_export_keeps_required_fields() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);
        let mut selection = partner_selection(&mut cache);
        let schema = cache.fields("res.partner", CacheOptions::default());

        selection.toggle_field("res.partner", "email", &schema);
        let export = SchemaExporter::default().export(&mut cache, &selection);

        let fields: Vec<&String> = export.models["res.partner"].fields.keys().collect();
        assert_eq!(fields, vec!["email", "name"]);
    }

    #[test]
    fn test_depth_two_export_follows_edges() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);
        let selection = partner_selection(&mut cache);

        let export = SchemaExporter::new(SchemaExportOptions::default().with_depth(2))
            .export(&mut cache, &selection);

        assert_eq!(
            export.models.keys().collect::<Vec<_>>(),
            vec!["res.country", "res.partner", "res.partner.category"]
        );
    }

    #[test]
    fn test_yaml_and_json_describe_the_same_export() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);
        let selection = partner_selection(&mut cache);

        let export = SchemaExporter::default().export(&mut cache, &selection);
        let from_json: Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();
        let from_yaml: Value = serde_yaml::from_str(&export.to_yaml().unwrap()).unwrap();

        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let first = {
            let temp = TempDir::new().unwrap();
            let mut cache = open_cache(&temp);
            let selection = partner_selection(&mut cache);
            PromptBuilder::new(PromptOptions::default()).llm_prompt(&mut cache, &selection)
        };
        let second = {
            let temp = TempDir::new().unwrap();
            let mut cache = open_cache(&temp);
            let selection = partner_selection(&mut cache);
            PromptBuilder::new(PromptOptions::default()).llm_prompt(&mut cache, &selection)
        };

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_selection_produces_nothing() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);
        let selection = Selection::new();

        let export = SchemaExporter::default().export(&mut cache, &selection);
        assert!(export.is_empty());

        let result = export.render("json").unwrap();
        assert!(result.write_to(temp.path().join("schema.json")).is_err());
        assert!(!temp.path().join("schema.json").exists());
    }

    #[test]
    fn test_mobile_prompt_mentions_timezone_fields() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);
        let selection = partner_selection(&mut cache);

        let prompt = PromptBuilder::new(PromptOptions::default().with_timezone_handling(true))
            .mobile_prompt(&mut cache, &selection);

        assert!(prompt.contains("res.partner"));
        assert!(prompt.contains("tz"));
    }

    #[test]
    fn test_package_and_diagram_for_partner() {
        let temp = TempDir::new().unwrap();
        let mut cache = open_cache(&temp);
        let selection = partner_selection(&mut cache);

        let package = PackageExporter::new()
            .export(&mut cache, &selection, "res.partner")
            .unwrap();
        assert_eq!(package.model, "res.partner");
        assert_eq!(package.sample_record["name"], "Azure Interior");

        let diagram = DiagramExporter::new(DiagramFormat::Mermaid)
            .export(&mut cache, "res.partner", 1)
            .unwrap();
        assert!(diagram.content.contains("res_partner -->|country_id| res_country"));
        assert!(diagram.content.contains("res_partner <-->|category_id| res_partner_category"));
    }
}
