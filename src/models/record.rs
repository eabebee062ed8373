//! Record values and helpers for reading relation values out of them

use serde_json::{Map, Value};

/// One record as returned by `search_read`
pub type Record = Map<String, Value>;

/// Suffix of the key an expanded relation is stored under
pub const EXPANDED_SUFFIX: &str = "_expanded";

pub fn expanded_key(field: &str) -> String {
    format!("{}{}", field, EXPANDED_SUFFIX)
}

/// Whether a field value carries nothing to follow (`false`, `null`, empty list)
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Id of a many2one value, reported either as `[id, display_name]` or a bare id
pub fn many2one_id(value: &Value) -> Option<i64> {
    match value {
        Value::Array(items) => items.first().and_then(Value::as_i64),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

/// Ids of a one2many/many2many value, in their original order
pub fn relation_ids(value: &Value) -> Vec<i64> {
    match value {
        Value::Array(items) => items.iter().filter_map(Value::as_i64).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_many2one_id_shapes() {
        assert_eq!(many2one_id(&json!([12, "Belgium"])), Some(12));
        assert_eq!(many2one_id(&json!(7)), Some(7));
        assert_eq!(many2one_id(&json!(false)), None);
    }

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&json!(false)));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!([1])));
        assert_eq!(expanded_key("country_id"), "country_id_expanded");
    }
}
