//! Models module
//!
//! Defines the metadata structures the explorer works with: field schemas, model
//! catalog entries and sampled records.

mod de;
pub mod field;
pub mod model_info;
pub mod record;

pub use field::{
    Field, FieldKind, FieldSchema, FieldType, INTERNAL_FIELD_PREFIX, Relation, RelationKind,
    ScalarType, SelectionOption, is_internal_field,
};
pub use model_info::ModelInfo;
pub use record::{EXPANDED_SUFFIX, Record, expanded_key};
