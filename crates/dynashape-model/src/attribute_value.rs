//! The store's `AttributeValue` type with custom serialization.
//!
//! `AttributeValue` is a tagged union where exactly one variant is present.
//! The JSON wire format uses single-key objects like `{"S": "hello"}`.
//!
//! Concrete values describe themselves as schemas: [`AttributeValue::literal_schema`]
//! keeps scalars exact (used for key and filter values), [`AttributeValue::widened_schema`]
//! widens them to their base types (used for update values).

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::schema::{Field, Schema, SetKind};

/// A concrete attribute value.
///
/// Represented as a tagged union where exactly one variant is present.
/// Numbers are always string-encoded to preserve arbitrary precision.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// String value.
    S(String),
    /// Number value (string-encoded for arbitrary precision).
    N(String),
    /// Binary value (base64-encoded in JSON).
    B(bytes::Bytes),
    /// String Set.
    Ss(Vec<String>),
    /// Number Set (string-encoded).
    Ns(Vec<String>),
    /// Binary Set (base64-encoded in JSON).
    Bs(Vec<bytes::Bytes>),
    /// Boolean value.
    Bool(bool),
    /// Null value.
    Null(bool),
    /// List of attribute values.
    L(Vec<AttributeValue>),
    /// Map of attribute values.
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Describe this value as an exact schema: strings, numbers and booleans
    /// become literals, lists become tuples, maps become objects.
    #[must_use]
    pub fn literal_schema(&self) -> Schema {
        match self {
            Self::S(s) => Schema::string_literal(s.clone()),
            Self::N(n) => Schema::number_literal(n.clone()),
            Self::Bool(b) => Schema::BooleanLiteral { value: *b },
            Self::L(items) => Schema::tuple(items.iter().map(Self::literal_schema).collect()),
            Self::M(m) => object_schema(m, Self::literal_schema),
            other => other.widened_schema(),
        }
    }

    /// Describe this value by its base types: `string`, `number`, `T[]`
    /// with `T` the union of element types, and objects of required fields.
    #[must_use]
    pub fn widened_schema(&self) -> Schema {
        match self {
            Self::S(_) => Schema::String,
            Self::N(_) => Schema::Number,
            Self::B(_) => Schema::Binary,
            Self::Ss(_) => Schema::set(SetKind::String),
            Self::Ns(_) => Schema::set(SetKind::Number),
            Self::Bs(_) => Schema::set(SetKind::Binary),
            Self::Bool(_) => Schema::Boolean,
            Self::Null(_) => Schema::Null,
            Self::L(items) => Schema::array(Schema::union(items.iter().map(Self::widened_schema))),
            Self::M(m) => object_schema(m, Self::widened_schema),
        }
    }
}

/// Object schema with fields in key order, so the result is deterministic.
fn object_schema(
    map: &HashMap<String, AttributeValue>,
    describe: fn(&AttributeValue) -> Schema,
) -> Schema {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    Schema::object(
        keys.into_iter()
            .map(|k| Field::required(k.clone(), describe(&map[k])))
            .collect(),
    )
}

impl Eq for AttributeValue {}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::S(s) => map.serialize_entry("S", s)?,
            Self::N(n) => map.serialize_entry("N", n)?,
            Self::B(b) => {
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(b);
                map.serialize_entry("B", &encoded)?;
            }
            Self::Ss(v) => map.serialize_entry("SS", v)?,
            Self::Ns(v) => map.serialize_entry("NS", v)?,
            Self::Bs(v) => {
                use base64::Engine;
                let encoded: Vec<String> = v
                    .iter()
                    .map(|b| base64::engine::general_purpose::STANDARD.encode(b))
                    .collect();
                map.serialize_entry("BS", &encoded)?;
            }
            Self::Bool(b) => map.serialize_entry("BOOL", b)?,
            Self::Null(b) => map.serialize_entry("NULL", b)?,
            Self::L(list) => map.serialize_entry("L", list)?,
            Self::M(m) => map.serialize_entry("M", m)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributeValueVisitor)
    }
}

struct AttributeValueVisitor;

impl<'de> Visitor<'de> for AttributeValueVisitor {
    type Value = AttributeValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a DynamoDB AttributeValue object with exactly one type key")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let Some(key) = map.next_key::<String>()? else {
            return Err(de::Error::custom(
                "AttributeValue must have exactly one key",
            ));
        };

        let value = match key.as_str() {
            "S" => AttributeValue::S(map.next_value()?),
            "N" => AttributeValue::N(map.next_value()?),
            "B" => {
                use base64::Engine;
                let encoded: String = map.next_value()?;
                let decoded = base64::engine::general_purpose::STANDARD
                    .decode(&encoded)
                    .map_err(de::Error::custom)?;
                AttributeValue::B(bytes::Bytes::from(decoded))
            }
            "SS" => AttributeValue::Ss(map.next_value()?),
            "NS" => AttributeValue::Ns(map.next_value()?),
            "BS" => {
                use base64::Engine;
                let encoded: Vec<String> = map.next_value()?;
                let decoded: Result<Vec<bytes::Bytes>, _> = encoded
                    .iter()
                    .map(|e| {
                        base64::engine::general_purpose::STANDARD
                            .decode(e)
                            .map(bytes::Bytes::from)
                    })
                    .collect();
                AttributeValue::Bs(decoded.map_err(de::Error::custom)?)
            }
            "BOOL" => AttributeValue::Bool(map.next_value()?),
            "NULL" => AttributeValue::Null(map.next_value()?),
            "L" => AttributeValue::L(map.next_value()?),
            "M" => AttributeValue::M(map.next_value()?),
            other => {
                return Err(de::Error::unknown_field(
                    other,
                    &["S", "N", "B", "SS", "NS", "BS", "BOOL", "NULL", "L", "M"],
                ));
            }
        };

        Ok(value)
    }
}
