//! Update expression checks and return-value shapes for `UpdateItem`.

#[cfg(test)]
mod tests {
    use dynashape_core::{EngineConfig, ShapeError, Table, UpdateItemRequest};
    use dynashape_model::{ErrorKind, Schema};
    use serde_json::json;

    use crate::{from_json, schema, table, table_with};

    fn accounts() -> Table {
        table(accounts_definition())
    }

    fn accounts_definition() -> serde_json::Value {
        json!({
            "TableName": "accounts",
            "KeySchema": [{"AttributeName": "pk", "KeyType": "HASH"}],
            "Schema": {
                "type": "object",
                "fields": [
                    {"name": "pk", "schema": {"type": "string"}},
                    {"name": "age", "schema": {"type": "number"}},
                    {"name": "nick", "schema": {"type": "string"}, "optional": true},
                    {"name": "arr", "schema": {"type": "array", "element": {"type": "number"}}},
                    {"name": "tags", "schema": {"type": "set", "element": "string"}},
                    {"name": "title", "schema": {"type": "string"}}
                ]
            }
        })
    }

    fn update(body: serde_json::Value) -> Result<Option<Schema>, ShapeError> {
        let mut body = body;
        body["Key"] = json!({"pk": {"S": "acct-1"}});
        let request: UpdateItemRequest = from_json(body);
        accounts().update_item(&request)
    }

    #[test]
    fn test_should_collapse_list_after_index_remove() {
        let shape = update(json!({
            "UpdateExpression": "REMOVE arr[2]",
            "ReturnValues": "UPDATED_NEW"
        }))
        .unwrap();
        assert_eq!(
            shape,
            Some(schema(json!({
                "type": "object",
                "fields": [{
                    "name": "arr",
                    "schema": {"type": "array", "element": {"type": "number"}},
                    "optional": true
                }]
            })))
        );
    }

    #[test]
    fn test_should_remove_only_the_named_key() {
        let old = update(json!({
            "UpdateExpression": "REMOVE nick",
            "ReturnValues": "UPDATED_OLD"
        }))
        .unwrap();
        assert_eq!(
            old,
            Some(schema(json!({
                "type": "union",
                "variants": [
                    {"type": "object", "fields": [
                        {"name": "nick", "schema": {"type": "string"}, "optional": true}
                    ]},
                    {"type": "undefined"}
                ]
            })))
        );

        let new = update(json!({
            "UpdateExpression": "REMOVE nick",
            "ReturnValues": "UPDATED_NEW"
        }))
        .unwrap();
        assert_eq!(new, Some(Schema::Undefined));
    }

    #[test]
    fn test_should_reject_remove_of_required_field() {
        let err = update(json!({"UpdateExpression": "REMOVE title"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTarget);
    }

    #[test]
    fn test_should_reject_add_to_plain_string() {
        let err = update(json!({
            "UpdateExpression": "ADD title :x",
            "ExpressionAttributeValues": {":x": {"type": "number"}}
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTarget);
        assert!(err.to_validation_message().starts_with("InvalidTargetError: "));
    }

    #[test]
    fn test_should_accept_add_and_delete_on_sets() {
        let shape = update(json!({
            "UpdateExpression": "ADD tags :more, age :one DELETE tags :less",
            "ExpressionAttributeValues": {
                ":more": {"type": "set", "element": "string"},
                ":less": {"type": "set", "element": "string"},
                ":one": {"type": "numberLiteral", "value": "1"}
            },
            "ReturnValues": "UPDATED_NEW"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(
            shape,
            schema(json!({
                "type": "object",
                "fields": [
                    {"name": "age", "schema": {"type": "number"}},
                    {"name": "tags", "schema": {"type": "set", "element": "string"}}
                ]
            }))
        );
    }

    #[test]
    fn test_should_report_set_mismatch_with_path() {
        let err = update(json!({
            "UpdateExpression": "SET #a = :s",
            "ExpressionAttributeNames": {"#a": "age"},
            "ExpressionAttributeValues": {":s": {"type": "string"}}
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
        assert!(err.to_string().contains("age"));
    }

    #[test]
    fn test_should_shape_arithmetic_and_if_not_exists() {
        let shape = update(json!({
            "UpdateExpression": "SET age = age + :one, nick = if_not_exists(nick, :n)",
            "ExpressionAttributeValues": {
                ":one": {"type": "number"},
                ":n": {"type": "string"}
            },
            "ReturnValues": "UPDATED_NEW"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(
            shape,
            schema(json!({
                "type": "object",
                "fields": [
                    {"name": "age", "schema": {"type": "number"}},
                    {"name": "nick", "schema": {"type": "string"}}
                ]
            }))
        );
    }

    #[test]
    fn test_should_return_whole_item_for_all_values() {
        let all_new = update(json!({
            "UpdateExpression": "SET title = :t",
            "ExpressionAttributeValues": {":t": {"type": "string"}},
            "ReturnValues": "ALL_NEW"
        }))
        .unwrap()
        .unwrap();
        assert!(!all_new.is_possibly_undefined());

        let all_old = update(json!({
            "UpdateExpression": "SET title = :t",
            "ExpressionAttributeValues": {":t": {"type": "string"}},
            "ReturnValues": "ALL_OLD"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(all_old, all_new.or_undefined());
    }

    #[test]
    fn test_should_compute_identical_shapes_without_cache() {
        let run = || {
            let uncached = table_with(
                accounts_definition(),
                EngineConfig {
                    cache_results: false,
                    ..EngineConfig::default()
                },
            );
            let request: UpdateItemRequest = from_json(json!({
                "Key": {"pk": {"S": "acct-1"}},
                "UpdateExpression": "SET age = age + :one REMOVE nick, arr[0] ADD tags :t",
                "ExpressionAttributeValues": {
                    ":one": {"type": "numberLiteral", "value": "1"},
                    ":t": {"type": "set", "element": "string"}
                },
                "ReturnValues": "UPDATED_OLD"
            }));
            uncached.update_item(&request).unwrap()
        };
        let first = run();
        assert!(first.is_some());
        assert_eq!(first, run());
    }

    #[test]
    fn test_should_validate_placeholders_before_schema_checks() {
        let err = update(json!({
            "UpdateExpression": "ADD title :x",
            "ExpressionAttributeValues": {":x": {"type": "number"}, ":y": {"type": "number"}}
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedPlaceholder);
    }
}
