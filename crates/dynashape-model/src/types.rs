//! Table, key and index definitions consumed by the shape engine.
//!
//! Structs that mirror the store's wire format use `#[serde(rename_all = "PascalCase")]`.
//! Enum variants use idiomatic Rust `PascalCase` naming with `#[serde(rename)]`
//! attributes to map to the `SCREAMING_SNAKE_CASE` wire format.

use serde::{Deserialize, Serialize};

use crate::schema::Schema;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Key type within a key schema element.
///
/// `Hash` denotes the partition key; `Range` denotes the sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Partition key.
    #[serde(rename = "HASH")]
    Hash,
    /// Sort key.
    #[serde(rename = "RANGE")]
    Range,
}

impl KeyType {
    /// Returns the wire-format string representation of this key type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hash => "HASH",
            Self::Range => "RANGE",
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Projection type for secondary indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectionType {
    /// All attributes from the table are projected into the index.
    #[default]
    #[serde(rename = "ALL")]
    All,
    /// Only the index and primary keys are projected.
    #[serde(rename = "KEYS_ONLY")]
    KeysOnly,
    /// Only specified non-key attributes are projected alongside keys.
    #[serde(rename = "INCLUDE")]
    Include,
}

impl ProjectionType {
    /// Returns the wire-format string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::KeysOnly => "KEYS_ONLY",
            Self::Include => "INCLUDE",
        }
    }
}

impl std::fmt::Display for ProjectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Determines what values are returned by write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReturnValue {
    /// Nothing is returned.
    #[default]
    #[serde(rename = "NONE")]
    None,
    /// Returns all attributes of the item as they appeared before the operation.
    #[serde(rename = "ALL_OLD")]
    AllOld,
    /// Returns only the updated attributes as they appeared before the operation.
    #[serde(rename = "UPDATED_OLD")]
    UpdatedOld,
    /// Returns all attributes of the item as they appear after the operation.
    #[serde(rename = "ALL_NEW")]
    AllNew,
    /// Returns only the updated attributes as they appear after the operation.
    #[serde(rename = "UPDATED_NEW")]
    UpdatedNew,
}

impl ReturnValue {
    /// Returns the wire-format string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::AllOld => "ALL_OLD",
            Self::UpdatedOld => "UPDATED_OLD",
            Self::AllNew => "ALL_NEW",
            Self::UpdatedNew => "UPDATED_NEW",
        }
    }
}

impl std::fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes to retrieve in a `Query` or `Scan` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Select {
    /// All attributes of the item.
    #[default]
    #[serde(rename = "ALL_ATTRIBUTES")]
    AllAttributes,
    /// All projected attributes (for index queries).
    #[serde(rename = "ALL_PROJECTED_ATTRIBUTES")]
    AllProjectedAttributes,
    /// Only the attributes specified in `ProjectionExpression`.
    #[serde(rename = "SPECIFIC_ATTRIBUTES")]
    SpecificAttributes,
    /// Only the count of matching items (no item data).
    #[serde(rename = "COUNT")]
    Count,
}

impl Select {
    /// Returns the wire-format string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllAttributes => "ALL_ATTRIBUTES",
            Self::AllProjectedAttributes => "ALL_PROJECTED_ATTRIBUTES",
            Self::SpecificAttributes => "SPECIFIC_ATTRIBUTES",
            Self::Count => "COUNT",
        }
    }
}

impl std::fmt::Display for Select {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Structs - Keys
// ---------------------------------------------------------------------------

/// An element of the key schema for a table or index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    /// The name of the key attribute.
    pub attribute_name: String,
    /// The role of the attribute in the key schema (`HASH` or `RANGE`).
    pub key_type: KeyType,
}

/// Partition and optional sort key field names of a table or index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyDefinition {
    /// Partition (HASH) key field.
    pub partition_key: String,
    /// Sort (RANGE) key field.
    pub sort_key: Option<String>,
}

impl KeyDefinition {
    /// Build from a wire-format key schema. Returns `None` when no `HASH`
    /// element is present.
    #[must_use]
    pub fn from_key_schema(elements: &[KeySchemaElement]) -> Option<Self> {
        let partition_key = elements
            .iter()
            .find(|e| e.key_type == KeyType::Hash)?
            .attribute_name
            .clone();
        let sort_key = elements
            .iter()
            .find(|e| e.key_type == KeyType::Range)
            .map(|e| e.attribute_name.clone());
        Some(Self {
            partition_key,
            sort_key,
        })
    }

    /// Key field names in partition-then-sort order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.partition_key.as_str()).chain(self.sort_key.as_deref())
    }

    /// Returns `true` if `name` is one of the key fields.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields().any(|f| f == name)
    }
}

// ---------------------------------------------------------------------------
// Structs - Indexes and tables
// ---------------------------------------------------------------------------

/// Controls which attributes are copied (projected) from the base table
/// into the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Projection {
    /// The set of attributes projected into the index.
    #[serde(default)]
    pub projection_type: ProjectionType,
    /// The non-key attributes to project when `projection_type` is `INCLUDE`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_key_attributes: Vec<String>,
}

/// A secondary index definition (global or local).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexDefinition {
    /// The name of the index.
    pub index_name: String,
    /// The key schema for this index (partition key, optional sort key).
    pub key_schema: Vec<KeySchemaElement>,
    /// The attributes projected into this index.
    #[serde(default)]
    pub projection: Projection,
}

/// Everything the engine needs to know about a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDefinition {
    /// The name of the table.
    pub table_name: String,
    /// Item schema; usually a union of variants sharing key field names.
    pub schema: Schema,
    /// The table's key schema.
    pub key_schema: Vec<KeySchemaElement>,
    /// Global secondary indexes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_secondary_indexes: Vec<IndexDefinition>,
    /// Local secondary indexes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_secondary_indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    /// Find a global or local secondary index by name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexDefinition> {
        self.global_secondary_indexes
            .iter()
            .chain(&self.local_secondary_indexes)
            .find(|i| i.index_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_build_key_definition_from_key_schema() {
        let elements = vec![
            KeySchemaElement {
                attribute_name: "sk".to_owned(),
                key_type: KeyType::Range,
            },
            KeySchemaElement {
                attribute_name: "pk".to_owned(),
                key_type: KeyType::Hash,
            },
        ];
        let key = KeyDefinition::from_key_schema(&elements).unwrap();
        assert_eq!(key.partition_key, "pk");
        assert_eq!(key.sort_key.as_deref(), Some("sk"));
        assert_eq!(key.fields().collect::<Vec<_>>(), vec!["pk", "sk"]);
        assert!(key.contains("sk"));
        assert!(!key.contains("data"));
    }

    #[test]
    fn test_should_reject_key_schema_without_hash() {
        let elements = vec![KeySchemaElement {
            attribute_name: "sk".to_owned(),
            key_type: KeyType::Range,
        }];
        assert!(KeyDefinition::from_key_schema(&elements).is_none());
    }

    #[test]
    fn test_should_deserialize_table_definition() {
        let json = r#"{
            "TableName": "app",
            "Schema": {"type": "object", "fields": [{"name": "pk", "schema": {"type": "string"}}]},
            "KeySchema": [{"AttributeName": "pk", "KeyType": "HASH"}],
            "GlobalSecondaryIndexes": [{
                "IndexName": "byEmail",
                "KeySchema": [{"AttributeName": "email", "KeyType": "HASH"}],
                "Projection": {"ProjectionType": "INCLUDE", "NonKeyAttributes": ["name"]}
            }]
        }"#;
        let table: TableDefinition = serde_json::from_str(json).unwrap();
        let index = table.index("byEmail").unwrap();
        assert_eq!(index.projection.projection_type, ProjectionType::Include);
        assert_eq!(index.projection.non_key_attributes, vec!["name".to_owned()]);
        assert!(table.index("missing").is_none());
    }

    #[test]
    fn test_should_serialize_return_value_wire_names() {
        let json = serde_json::to_string(&ReturnValue::UpdatedNew).unwrap();
        assert_eq!(json, r#""UPDATED_NEW""#);
        assert_eq!(Select::Count.to_string(), "COUNT");
    }
}
