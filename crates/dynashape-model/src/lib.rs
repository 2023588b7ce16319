//! Model types for dynashape.
//!
//! This crate provides the schema tree, concrete attribute values, and the
//! table/index definitions the shape engine consumes. All types are plain
//! serde-derived values so table definitions can be loaded from JSON.
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod error;
pub mod schema;
pub mod types;

pub use attribute_value::AttributeValue;
pub use error::ErrorKind;
pub use schema::{Field, RecordKey, Schema, SetKind, TemplatePart};
pub use types::{
    IndexDefinition, KeyDefinition, KeySchemaElement, KeyType, Projection, ProjectionType,
    ReturnValue, Select, TableDefinition,
};
