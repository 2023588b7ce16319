//! Per-table shape computation for the store's item operations.
//!
//! A [`Table`] wraps a [`TableDefinition`] and answers, for each request,
//! the shape of what the operation returns. Every operation runs in the
//! same order:
//!
//! 1. tokenize and parse every expression of the request (structural errors),
//! 2. validate placeholder usage across all of them at once,
//! 3. run the engine: key narrowing, index projection, filter narrowing,
//!    projection or update analysis.
//!
//! Results are memoized per request when [`EngineConfig::cache_results`] is
//! set.

use std::collections::BTreeMap;

use dashmap::DashMap;
use dynashape_model::{
    AttributeValue, IndexDefinition, KeyDefinition, ReturnValue, Schema, Select, TableDefinition,
};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::ShapeError;
use crate::expression::{
    DocumentPath, NameMap, Token, UpdateExpr, ValueMap, parse_condition_tokens,
    parse_projection, parse_update, split_conditions, tokenize, validate_placeholders,
};
use crate::key_condition::{
    KeyCondition, KeyConstraint, apply_index_projection, extract_key_tokens, narrow,
    narrow_by_filter, narrow_to_index,
};
use crate::projection::{ProjectionStruct, project};
use crate::update::analyze_update;

/// Describe concrete attribute values as exact literal schemas.
///
/// Suited to key conditions and filters, where the exact value narrows the
/// item variants. SET values must match the target's declared type, so use
/// [`widened_values`] for update expressions.
#[must_use]
pub fn literal_values(values: &BTreeMap<String, AttributeValue>) -> ValueMap {
    values
        .iter()
        .map(|(token, value)| (token.clone(), value.literal_schema()))
        .collect()
}

/// Describe concrete attribute values by their base types (`"a"` is
/// `string`, `[1, 2]` is `number[]`).
#[must_use]
pub fn widened_values(values: &BTreeMap<String, AttributeValue>) -> ValueMap {
    values
        .iter()
        .map(|(token, value)| (token.clone(), value.widened_schema()))
        .collect()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Shape request for `GetItem`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemRequest {
    /// The primary key of the item.
    pub key: BTreeMap<String, AttributeValue>,
    /// Attributes to retrieve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,
    /// Substitution tokens for attribute names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_names: NameMap,
}

/// Shape request for `PutItem`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemRequest {
    /// Condition that must hold for the put to succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// Substitution tokens for attribute names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_names: NameMap,
    /// Substitution tokens for attribute values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_values: ValueMap,
    /// `NONE` or `ALL_OLD`.
    #[serde(default)]
    pub return_values: ReturnValue,
}

/// Shape request for `DeleteItem`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemRequest {
    /// The primary key of the item.
    pub key: BTreeMap<String, AttributeValue>,
    /// Condition that must hold for the delete to succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// Substitution tokens for attribute names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_names: NameMap,
    /// Substitution tokens for attribute values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_values: ValueMap,
    /// `NONE` or `ALL_OLD`.
    #[serde(default)]
    pub return_values: ReturnValue,
}

/// Shape request for `UpdateItem`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemRequest {
    /// The primary key of the item.
    pub key: BTreeMap<String, AttributeValue>,
    /// The update to apply.
    pub update_expression: String,
    /// Condition that must hold for the update to succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// Substitution tokens for attribute names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_names: NameMap,
    /// Substitution tokens for attribute values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_values: ValueMap,
    /// Which attributes to return.
    #[serde(default)]
    pub return_values: ReturnValue,
}

/// Shape request for `Query`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryRequest {
    /// Secondary index to query instead of the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    /// Condition on the table or index key.
    pub key_condition_expression: String,
    /// Condition applied to matching items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    /// Attributes to retrieve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,
    /// Substitution tokens for attribute names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_names: NameMap,
    /// Substitution tokens for attribute values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_values: ValueMap,
    /// What to return for each item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Select>,
}

/// Shape request for `Scan`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanRequest {
    /// Secondary index to scan instead of the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    /// Condition applied to every item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    /// Attributes to retrieve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,
    /// Substitution tokens for attribute names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_names: NameMap,
    /// Substitution tokens for attribute values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_values: ValueMap,
    /// What to return for each item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Select>,
}

// ---------------------------------------------------------------------------
// Expression collection
// ---------------------------------------------------------------------------

/// Parses a request's expressions and remembers their tokens so placeholder
/// usage can be checked across all of them.
#[derive(Debug, Default)]
struct Expressions {
    streams: Vec<Vec<Token>>,
}

impl Expressions {
    fn condition(&mut self, expr: &str) -> Result<Vec<Token>, ShapeError> {
        let tokens = tokenize(expr)?;
        parse_condition_tokens(&tokens)?;
        self.streams.push(tokens.clone());
        Ok(tokens)
    }

    fn key_condition(&mut self, expr: &str) -> Result<Vec<Token>, ShapeError> {
        let tokens = tokenize(expr)?;
        for part in split_conditions(&tokens)? {
            parse_condition_tokens(&part)?;
        }
        self.streams.push(tokens.clone());
        Ok(tokens)
    }

    fn projection(&mut self, expr: &str) -> Result<Vec<DocumentPath>, ShapeError> {
        let paths = parse_projection(expr)?;
        self.streams.push(tokenize(expr)?);
        Ok(paths)
    }

    fn update(&mut self, expr: &str) -> Result<UpdateExpr, ShapeError> {
        let update = parse_update(expr)?;
        self.streams.push(tokenize(expr)?);
        Ok(update)
    }

    fn validate(&self, names: &NameMap, values: &ValueMap) -> Result<(), ShapeError> {
        validate_placeholders(self.streams.iter().map(Vec::as_slice), names, values)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

type CachedShape = Result<Option<Schema>, ShapeError>;

/// Shape engine bound to one table definition.
#[derive(Debug)]
pub struct Table {
    definition: TableDefinition,
    key: KeyDefinition,
    config: EngineConfig,
    cache: DashMap<String, CachedShape>,
}

impl Table {
    /// Bind a table definition.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::InvalidRequest`] when the key schema has no
    /// `HASH` element.
    pub fn new(definition: TableDefinition, config: EngineConfig) -> Result<Self, ShapeError> {
        let key = KeyDefinition::from_key_schema(&definition.key_schema).ok_or_else(|| {
            ShapeError::invalid_request(format!(
                "table {} has no HASH key",
                definition.table_name
            ))
        })?;
        Ok(Self {
            definition,
            key,
            config,
            cache: DashMap::new(),
        })
    }

    /// The bound table definition.
    #[must_use]
    pub fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    /// The table's primary key.
    #[must_use]
    pub fn key(&self) -> &KeyDefinition {
        &self.key
    }

    /// Shape of the item `GetItem` returns, `| undefined` for a missing item.
    pub fn get_item(&self, request: &GetItemRequest) -> Result<Schema, ShapeError> {
        self.cached("GetItem", request, || {
            let mut exprs = Expressions::default();
            let paths = request
                .projection_expression
                .as_deref()
                .map(|p| exprs.projection(p))
                .transpose()?;
            exprs.validate(&request.expression_attribute_names, &ValueMap::new())?;

            let item = self.narrow_by_key(&request.key)?;
            let item = self.apply_projection(
                &item,
                paths.as_deref(),
                &request.expression_attribute_names,
            )?;
            Ok(Some(item.or_undefined()))
        })
        .map(|shape| shape.unwrap_or(Schema::Undefined))
    }

    /// Shape of the attributes `PutItem` returns.
    pub fn put_item(&self, request: &PutItemRequest) -> Result<Option<Schema>, ShapeError> {
        self.cached("PutItem", request, || {
            let mut exprs = Expressions::default();
            if let Some(condition) = &request.condition_expression {
                exprs.condition(condition)?;
            }
            exprs.validate(
                &request.expression_attribute_names,
                &request.expression_attribute_values,
            )?;
            old_item_shape(&self.definition.schema, request.return_values)
        })
    }

    /// Shape of the attributes `DeleteItem` returns.
    pub fn delete_item(&self, request: &DeleteItemRequest) -> Result<Option<Schema>, ShapeError> {
        self.cached("DeleteItem", request, || {
            let mut exprs = Expressions::default();
            if let Some(condition) = &request.condition_expression {
                exprs.condition(condition)?;
            }
            exprs.validate(
                &request.expression_attribute_names,
                &request.expression_attribute_values,
            )?;
            let item = self.narrow_by_key(&request.key)?;
            old_item_shape(&item, request.return_values)
        })
    }

    /// Shape of the attributes `UpdateItem` returns for its `ReturnValues`.
    pub fn update_item(&self, request: &UpdateItemRequest) -> Result<Option<Schema>, ShapeError> {
        self.cached("UpdateItem", request, || {
            let mut exprs = Expressions::default();
            let update = exprs.update(&request.update_expression)?;
            if let Some(condition) = &request.condition_expression {
                exprs.condition(condition)?;
            }
            let names = &request.expression_attribute_names;
            let values = &request.expression_attribute_values;
            exprs.validate(names, values)?;

            let item = self.narrow_by_key(&request.key)?;
            let analysis = analyze_update(&item, &update, names, values, &self.config)?;
            Ok(analysis.return_shape(&item, request.return_values))
        })
    }

    /// Shape of each item `Query` returns, or `None` for `Select: COUNT`.
    pub fn query(&self, request: &QueryRequest) -> Result<Option<Schema>, ShapeError> {
        self.cached("Query", request, || {
            let index = self.index(request.index_name.as_deref())?;
            let mut exprs = Expressions::default();
            let key_tokens = exprs.key_condition(&request.key_condition_expression)?;
            let filter = request
                .filter_expression
                .as_deref()
                .map(|f| exprs.condition(f))
                .transpose()?;
            let paths = request
                .projection_expression
                .as_deref()
                .map(|p| exprs.projection(p))
                .transpose()?;
            let names = &request.expression_attribute_names;
            let values = &request.expression_attribute_values;
            exprs.validate(names, values)?;

            let key = extract_key_tokens(&key_tokens, names, values)?;
            let item = match index {
                Some((index, index_key)) => {
                    let item = narrow(&self.definition.schema, &key, &index_key)?;
                    apply_index_projection(&item, &self.key, index)
                }
                None => narrow(&self.definition.schema, &key, &self.key)?,
            };
            self.finish_read(item, filter.as_deref(), paths.as_deref(), request.select, names, values)
        })
    }

    /// Shape of each item `Scan` returns, or `None` for `Select: COUNT`.
    pub fn scan(&self, request: &ScanRequest) -> Result<Option<Schema>, ShapeError> {
        self.cached("Scan", request, || {
            let index = self.index(request.index_name.as_deref())?;
            let mut exprs = Expressions::default();
            let filter = request
                .filter_expression
                .as_deref()
                .map(|f| exprs.condition(f))
                .transpose()?;
            let paths = request
                .projection_expression
                .as_deref()
                .map(|p| exprs.projection(p))
                .transpose()?;
            let names = &request.expression_attribute_names;
            let values = &request.expression_attribute_values;
            exprs.validate(names, values)?;

            let item = match index {
                Some((index, index_key)) => apply_index_projection(
                    &narrow_to_index(&self.definition.schema, &index_key),
                    &self.key,
                    index,
                ),
                None => self.definition.schema.clone(),
            };
            self.finish_read(item, filter.as_deref(), paths.as_deref(), request.select, names, values)
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn cached<R: Serialize>(
        &self,
        operation: &str,
        request: &R,
        compute: impl FnOnce() -> CachedShape,
    ) -> CachedShape {
        let signature = if self.config.cache_results {
            serde_json::to_string(request)
                .ok()
                .map(|body| format!("{operation}:{body}"))
        } else {
            None
        };
        let Some(signature) = signature else {
            return compute();
        };
        if let Some(hit) = self.cache.get(&signature) {
            tracing::debug!(table = %self.definition.table_name, operation, "shape cache hit");
            return hit.clone();
        }
        tracing::debug!(table = %self.definition.table_name, operation, "computing shape");
        let result = compute();
        self.cache.insert(signature, result.clone());
        result
    }

    fn index(
        &self,
        name: Option<&str>,
    ) -> Result<Option<(&IndexDefinition, KeyDefinition)>, ShapeError> {
        let Some(name) = name else {
            return Ok(None);
        };
        let index = self.definition.index(name).ok_or_else(|| {
            ShapeError::invalid_request(format!(
                "table {} has no index named {name}",
                self.definition.table_name
            ))
        })?;
        let key = KeyDefinition::from_key_schema(&index.key_schema).ok_or_else(|| {
            ShapeError::invalid_request(format!("index {name} has no HASH key"))
        })?;
        Ok(Some((index, key)))
    }

    /// Narrow the table schema by a full primary key.
    fn narrow_by_key(&self, key: &BTreeMap<String, AttributeValue>) -> Result<Schema, ShapeError> {
        let given: Vec<&str> = key.keys().map(String::as_str).collect();
        let expected: Vec<&str> = self.key.fields().collect();
        if given.len() != expected.len() || !given.iter().all(|f| self.key.contains(f)) {
            return Err(ShapeError::no_matching_key(format!(
                "key must name exactly the key attributes {}, got {}",
                expected.join(", "),
                given.join(", ")
            )));
        }
        let condition = KeyCondition {
            constraints: key
                .iter()
                .map(|(field, value)| {
                    (field.clone(), KeyConstraint::Equals(value.literal_schema()))
                })
                .collect(),
        };
        narrow(&self.definition.schema, &condition, &self.key)
    }

    fn finish_read(
        &self,
        item: Schema,
        filter: Option<&[Token]>,
        paths: Option<&[DocumentPath]>,
        select: Option<Select>,
        names: &NameMap,
        values: &ValueMap,
    ) -> CachedShape {
        let item = match filter {
            Some(tokens) => narrow_by_filter(&item, tokens, names, values)?,
            None => item,
        };
        if select == Some(Select::Count) {
            return Ok(None);
        }
        self.apply_projection(&item, paths, names).map(Some)
    }

    fn apply_projection(
        &self,
        item: &Schema,
        paths: Option<&[DocumentPath]>,
        names: &NameMap,
    ) -> Result<Schema, ShapeError> {
        let Some(paths) = paths else {
            return Ok(item.clone());
        };
        let resolved = paths
            .iter()
            .map(|p| p.resolve(names))
            .collect::<Result<Vec<_>, _>>()?;
        let selection = ProjectionStruct::build(&resolved);
        Ok(project(item, &selection, &self.config.project_options(false)))
    }
}

fn old_item_shape(item: &Schema, return_values: ReturnValue) -> CachedShape {
    match return_values {
        ReturnValue::None => Ok(None),
        ReturnValue::AllOld => Ok(Some(item.clone().or_undefined())),
        other => Err(ShapeError::invalid_request(format!(
            "ReturnValues {other} is not valid for this operation; use NONE or ALL_OLD"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use dynashape_model::{
        ErrorKind, Field, IndexDefinition, KeySchemaElement, KeyType, Projection, ProjectionType,
        TemplatePart,
    };

    use super::*;

    fn key_element(name: &str, key_type: KeyType) -> KeySchemaElement {
        KeySchemaElement {
            attribute_name: name.to_owned(),
            key_type,
        }
    }

    fn definition() -> TableDefinition {
        let user = Schema::template(vec![
            TemplatePart::Literal("USER#".to_owned()),
            TemplatePart::String,
        ]);
        TableDefinition {
            table_name: "app".to_owned(),
            schema: Schema::union([
                Schema::object(vec![
                    Field::required("pk", user.clone()),
                    Field::required("sk", Schema::string_literal("PROFILE")),
                    Field::required("email", Schema::String),
                    Field::optional("nickname", Schema::String),
                ]),
                Schema::object(vec![
                    Field::required("pk", user),
                    Field::required(
                        "sk",
                        Schema::template(vec![
                            TemplatePart::Literal("ORDER#".to_owned()),
                            TemplatePart::String,
                        ]),
                    ),
                    Field::required("total", Schema::Number),
                    Field::optional("status", Schema::String),
                    Field::optional("gsi1pk", Schema::String),
                ]),
            ]),
            key_schema: vec![
                key_element("pk", KeyType::Hash),
                key_element("sk", KeyType::Range),
            ],
            global_secondary_indexes: vec![IndexDefinition {
                index_name: "gsi1".to_owned(),
                key_schema: vec![key_element("gsi1pk", KeyType::Hash)],
                projection: Projection {
                    projection_type: ProjectionType::KeysOnly,
                    non_key_attributes: Vec::new(),
                },
            }],
            local_secondary_indexes: Vec::new(),
        }
    }

    fn table() -> Table {
        Table::new(definition(), EngineConfig::default()).unwrap()
    }

    fn key(pk: &str, sk: &str) -> BTreeMap<String, AttributeValue> {
        BTreeMap::from([
            ("pk".to_owned(), AttributeValue::S(pk.to_owned())),
            ("sk".to_owned(), AttributeValue::S(sk.to_owned())),
        ])
    }

    fn field_names(schema: &Schema) -> Vec<String> {
        match schema {
            Schema::Object { fields } => fields.iter().map(|f| f.name.clone()).collect(),
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn test_should_reject_table_without_hash_key() {
        let mut definition = definition();
        definition.key_schema.retain(|k| k.key_type == KeyType::Range);
        let err = Table::new(definition, EngineConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_should_get_item_narrowed_by_key() {
        let shape = table()
            .get_item(&GetItemRequest {
                key: key("USER#1", "PROFILE"),
                projection_expression: Some("email, #n".to_owned()),
                expression_attribute_names: NameMap::from([(
                    "#n".to_owned(),
                    "nickname".to_owned(),
                )]),
            })
            .unwrap();
        assert!(shape.is_possibly_undefined());
        let item = shape.without_undefined();
        assert_eq!(field_names(&item), vec!["email", "nickname"]);
    }

    #[test]
    fn test_should_reject_partial_key() {
        let mut request = GetItemRequest {
            key: key("USER#1", "PROFILE"),
            ..GetItemRequest::default()
        };
        request.key.remove("sk");
        let err = table().get_item(&request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatchingKey);
    }

    #[test]
    fn test_should_report_structural_errors_before_placeholders() {
        let err = table()
            .get_item(&GetItemRequest {
                key: key("USER#1", "PROFILE"),
                projection_expression: Some("a[0".to_owned()),
                expression_attribute_names: NameMap::from([(
                    "#unused".to_owned(),
                    "x".to_owned(),
                )]),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralParse);
    }

    #[test]
    fn test_should_validate_placeholders_across_expressions() {
        let err = table()
            .update_item(&UpdateItemRequest {
                key: key("USER#1", "PROFILE"),
                update_expression: "SET email = :e".to_owned(),
                condition_expression: Some("attribute_exists(pk)".to_owned()),
                expression_attribute_values: ValueMap::from([
                    (":e".to_owned(), Schema::String),
                    (":spare".to_owned(), Schema::String),
                ]),
                ..UpdateItemRequest::default()
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedPlaceholder);
    }

    #[test]
    fn test_should_shape_update_return_values() {
        let request = UpdateItemRequest {
            key: key("USER#1", "PROFILE"),
            update_expression: "SET email = :e REMOVE nickname".to_owned(),
            expression_attribute_values: ValueMap::from([(":e".to_owned(), Schema::String)]),
            return_values: ReturnValue::UpdatedNew,
            ..UpdateItemRequest::default()
        };
        let shape = table().update_item(&request).unwrap().unwrap();
        assert_eq!(field_names(&shape), vec!["email"]);

        let none = table()
            .update_item(&UpdateItemRequest {
                return_values: ReturnValue::None,
                ..request
            })
            .unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn test_should_only_allow_none_or_all_old_for_put_and_delete() {
        let table = table();
        let put = table
            .put_item(&PutItemRequest {
                return_values: ReturnValue::AllOld,
                ..PutItemRequest::default()
            })
            .unwrap()
            .unwrap();
        assert!(put.is_possibly_undefined());
        assert_eq!(put.without_undefined().members().len(), 2);

        let err = table
            .delete_item(&DeleteItemRequest {
                key: key("USER#1", "PROFILE"),
                return_values: ReturnValue::AllNew,
                ..DeleteItemRequest::default()
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_should_query_with_prefix_and_filter() {
        let shape = table()
            .query(&QueryRequest {
                key_condition_expression: "pk = :pk AND begins_with(sk, :prefix)".to_owned(),
                filter_expression: Some("total > :min".to_owned()),
                projection_expression: Some("sk, total".to_owned()),
                expression_attribute_values: ValueMap::from([
                    (":pk".to_owned(), Schema::string_literal("USER#1")),
                    (":prefix".to_owned(), Schema::string_literal("ORDER#")),
                    (":min".to_owned(), Schema::number_literal("10")),
                ]),
                ..QueryRequest::default()
            })
            .unwrap()
            .unwrap();
        assert_eq!(field_names(&shape), vec!["sk", "total"]);
    }

    #[test]
    fn test_should_return_nothing_for_count_queries() {
        let shape = table()
            .query(&QueryRequest {
                key_condition_expression: "pk = :pk".to_owned(),
                expression_attribute_values: ValueMap::from([(
                    ":pk".to_owned(),
                    Schema::string_literal("USER#1"),
                )]),
                select: Some(Select::Count),
                ..QueryRequest::default()
            })
            .unwrap();
        assert_eq!(shape, None);
    }

    #[test]
    fn test_should_query_keys_only_index() {
        let shape = table()
            .query(&QueryRequest {
                index_name: Some("gsi1".to_owned()),
                key_condition_expression: "gsi1pk = :g".to_owned(),
                expression_attribute_values: ValueMap::from([(
                    ":g".to_owned(),
                    Schema::string_literal("STATUS#open"),
                )]),
                ..QueryRequest::default()
            })
            .unwrap()
            .unwrap();
        assert_eq!(field_names(&shape), vec!["pk", "sk", "gsi1pk"]);
    }

    #[test]
    fn test_should_reject_unknown_index() {
        let err = table()
            .scan(&ScanRequest {
                index_name: Some("missing".to_owned()),
                ..ScanRequest::default()
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_should_scan_sparse_index() {
        let shape = table()
            .scan(&ScanRequest {
                index_name: Some("gsi1".to_owned()),
                ..ScanRequest::default()
            })
            .unwrap()
            .unwrap();
        assert_eq!(field_names(&shape), vec!["pk", "sk", "gsi1pk"]);
    }

    #[test]
    fn test_should_cache_results_per_request() {
        let table = table();
        let request = ScanRequest {
            projection_expression: Some("pk".to_owned()),
            ..ScanRequest::default()
        };
        let first = table.scan(&request).unwrap();
        assert_eq!(table.cache.len(), 1);
        let second = table.scan(&request).unwrap();
        assert_eq!(first, second);
        assert_eq!(table.cache.len(), 1);

        let uncached = Table::new(
            definition(),
            EngineConfig {
                cache_results: false,
                ..EngineConfig::default()
            },
        )
        .unwrap();
        uncached.scan(&request).unwrap();
        assert!(uncached.cache.is_empty());
    }

    #[test]
    fn test_should_describe_attribute_values_as_literals() {
        let values = literal_values(&BTreeMap::from([(
            ":pk".to_owned(),
            AttributeValue::S("USER#1".to_owned()),
        )]));
        assert_eq!(values[":pk"], Schema::string_literal("USER#1"));
    }

    #[test]
    fn test_should_set_from_widened_attribute_values() {
        let concrete = BTreeMap::from([(":v".to_owned(), AttributeValue::N("5".to_owned()))]);
        let request = UpdateItemRequest {
            key: key("USER#1", "ORDER#1"),
            update_expression: "SET total = :v".to_owned(),
            expression_attribute_values: widened_values(&concrete),
            return_values: ReturnValue::UpdatedNew,
            ..UpdateItemRequest::default()
        };
        let shape = table().update_item(&request).unwrap().unwrap();
        assert_eq!(
            shape,
            Schema::object(vec![Field::required("total", Schema::Number)])
        );

        let err = table()
            .update_item(&UpdateItemRequest {
                expression_attribute_values: literal_values(&concrete),
                ..request
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
    }
}
