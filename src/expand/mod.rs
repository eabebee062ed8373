//! Relation expansion for sampled records
//!
//! Replaces bare relation values with readable detail under `<field>_expanded`:
//! a many2one becomes the related record's essential fields, a one2many/many2many
//! becomes a short list of the first related records. Expansion is a single level;
//! `depth` only gates whether it happens at all.

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheOptions, MetadataCache};
use crate::client::{ClientResult, SchemaClient, SearchQuery};
use crate::models::record::{is_empty_value, many2one_id, relation_ids};
use crate::models::{Record, Relation, RelationKind, expanded_key};
use crate::storage::StorageBackend;

/// Upper bound on related records fetched for one to-many field
pub const MAX_EXPANDED_RECORDS: usize = 5;

/// Fields always read for a many2one target, besides its required fields
pub const ESSENTIAL_FIELDS: [&str; 2] = ["name", "display_name"];

#[derive(Debug, Clone)]
pub struct RelationExpander {
    max_related_records: usize,
}

impl Default for RelationExpander {
    fn default() -> Self {
        Self {
            max_related_records: MAX_EXPANDED_RECORDS,
        }
    }
}

impl RelationExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower the number of related records read per to-many field (never above 5)
    pub fn with_max_related_records(mut self, max: usize) -> Self {
        self.max_related_records = max.min(MAX_EXPANDED_RECORDS);
        self
    }

    /// Expand `relation_fields` of `record`, a record of `model`.
    ///
    /// Returns the record unchanged when `depth_remaining` is 0 or there is nothing to
    /// expand. A field whose expansion fails is logged and left unexpanded.
    pub fn expand<C, S>(
        &self,
        cache: &mut MetadataCache<C, S>,
        mut record: Record,
        model: &str,
        relation_fields: &[String],
        depth_remaining: u32,
    ) -> Record
    where
        C: SchemaClient,
        S: StorageBackend,
    {
        if depth_remaining == 0 || relation_fields.is_empty() {
            return record;
        }

        let schema = cache.fields(model, CacheOptions::default());

        for name in relation_fields {
            let Some(relation) = schema.get(name).and_then(|field| field.relation()) else {
                debug!("Skipping {}.{}: not a relation field", model, name);
                continue;
            };
            let Some(value) = record.get(name) else {
                continue;
            };
            if is_empty_value(value) {
                continue;
            }

            let expanded = match relation.kind {
                RelationKind::Many2one => match many2one_id(value) {
                    Some(id) => self.expand_many2one(cache, relation, id),
                    None => Ok(None),
                },
                RelationKind::One2many | RelationKind::Many2many => {
                    let ids = relation_ids(value);
                    self.expand_to_many(cache, relation, &ids)
                }
            };

            match expanded {
                Ok(Some(value)) => {
                    record.insert(expanded_key(name), value);
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to expand {}.{}: {}", model, name, e),
            }
        }

        record
    }

    fn expand_many2one<C, S>(
        &self,
        cache: &mut MetadataCache<C, S>,
        relation: &Relation,
        id: i64,
    ) -> ClientResult<Option<Value>>
    where
        C: SchemaClient,
        S: StorageBackend,
    {
        let related = cache.fields(&relation.model, CacheOptions::default());

        let mut wanted: Vec<String> = ESSENTIAL_FIELDS.iter().map(|f| f.to_string()).collect();
        for (name, field) in &related {
            if field.required && !wanted.contains(name) {
                wanted.push(name.clone());
            }
        }

        let query = SearchQuery::by_id(id).with_fields(wanted).with_limit(1);
        let records = cache.read_records(&relation.model, &query)?;
        Ok(records.into_iter().next().map(Value::Object))
    }

    fn expand_to_many<C, S>(
        &self,
        cache: &mut MetadataCache<C, S>,
        relation: &Relation,
        ids: &[i64],
    ) -> ClientResult<Option<Value>>
    where
        C: SchemaClient,
        S: StorageBackend,
    {
        let ids = &ids[..ids.len().min(self.max_related_records)];
        if ids.is_empty() {
            return Ok(None);
        }

        let query = SearchQuery::by_ids(ids).with_limit(ids.len());
        let mut records = cache.read_records(&relation.model, &query)?;
        if records.is_empty() {
            return Ok(None);
        }

        // Keep the order of the ids in the source record
        records.sort_by_key(|r| {
            let id = r.get("id").and_then(Value::as_i64);
            ids.iter()
                .position(|candidate| Some(*candidate) == id)
                .unwrap_or(usize::MAX)
        });

        Ok(Some(Value::Array(
            records.into_iter().map(Value::Object).collect(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemorySchemaClient;
    use crate::models::{Field, FieldSchema, ModelInfo, ScalarType};
    use serde_json::json;
    use tempfile::TempDir;

    fn object(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn client() -> InMemorySchemaClient {
        let mut partner = FieldSchema::new();
        partner.insert("name".to_string(), Field::scalar(ScalarType::Char));
        partner.insert("country_id".to_string(), Field::many2one("res.country"));
        partner.insert("category_id".to_string(), Field::many2many("res.partner.category"));

        let mut country = FieldSchema::new();
        country.insert("name".to_string(), Field::scalar(ScalarType::Char).with_required(true));
        country.insert("code".to_string(), Field::scalar(ScalarType::Char).with_required(true));
        country.insert("phone_code".to_string(), Field::scalar(ScalarType::Integer));

        let mut category = FieldSchema::new();
        category.insert("name".to_string(), Field::scalar(ScalarType::Char));

        let categories = (1..=8)
            .map(|id| object(json!({"id": id, "name": format!("Tag {}", id)})))
            .collect();

        InMemorySchemaClient::default()
            .with_model(ModelInfo::new("res.partner"), partner)
            .with_model(ModelInfo::new("res.country"), country)
            .with_model(ModelInfo::new("res.partner.category"), category)
            .with_records(
                "res.country",
                vec![object(json!({
                    "id": 12, "name": "Belgium", "display_name": "Belgium",
                    "code": "BE", "phone_code": 32
                }))],
            )
            .with_records("res.partner.category", categories)
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_depth_zero_is_identity() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();
        let record = object(json!({"id": 1, "country_id": [12, "Belgium"]}));

        let expanded = RelationExpander::new().expand(
            &mut cache,
            record.clone(),
            "res.partner",
            &fields(&["country_id"]),
            0,
        );

        assert_eq!(expanded, record);
        assert!(cache.client().calls().is_empty());
    }

    #[test]
    fn test_many2one_reads_essential_and_required_fields() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();
        let record = object(json!({"id": 1, "country_id": [12, "Belgium"]}));

        let expanded = RelationExpander::new().expand(
            &mut cache,
            record,
            "res.partner",
            &fields(&["country_id"]),
            1,
        );

        assert_eq!(
            expanded["country_id_expanded"],
            json!({"id": 12, "name": "Belgium", "display_name": "Belgium", "code": "BE"})
        );
    }

    #[test]
    fn test_to_many_truncated_to_first_five_in_order() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();
        let record = object(json!({"id": 1, "category_id": [8, 3, 1, 7, 2, 5, 6]}));

        let expanded = RelationExpander::new().expand(
            &mut cache,
            record,
            "res.partner",
            &fields(&["category_id"]),
            1,
        );

        let ids: Vec<i64> = expanded["category_id_expanded"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![8, 3, 1, 7, 2]);
    }

    #[test]
    fn test_failing_relation_is_skipped() {
        let temp = TempDir::new().unwrap();
        let client = client().with_failing_model("res.country");
        let mut cache = MetadataCache::open_dir(client, temp.path()).unwrap();
        let record = object(json!({
            "id": 1,
            "country_id": [12, "Belgium"],
            "category_id": [1, 2]
        }));

        let expanded = RelationExpander::new().expand(
            &mut cache,
            record,
            "res.partner",
            &fields(&["country_id", "category_id"]),
            1,
        );

        assert!(!expanded.contains_key("country_id_expanded"));
        assert_eq!(expanded["category_id_expanded"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_values_are_not_expanded() {
        let temp = TempDir::new().unwrap();
        let mut cache = MetadataCache::open_dir(client(), temp.path()).unwrap();
        let record = object(json!({"id": 1, "country_id": false, "category_id": []}));

        let expanded = RelationExpander::new().expand(
            &mut cache,
            record.clone(),
            "res.partner",
            &fields(&["country_id", "category_id"]),
            1,
        );

        assert_eq!(expanded, record);
        assert_eq!(cache.client().call_count("search_read"), 0);
    }
}
