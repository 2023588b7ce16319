//! Projection expression shapes for `GetItem` and `Scan`.

#[cfg(test)]
mod tests {
    use dynashape_core::{EngineConfig, GetItemRequest, ScanRequest};
    use dynashape_model::{ErrorKind, Schema};
    use serde_json::json;

    use crate::{from_json, schema, table, table_with};

    fn profiles() -> serde_json::Value {
        json!({
            "TableName": "profiles",
            "KeySchema": [{"AttributeName": "pk", "KeyType": "HASH"}],
            "Schema": {
                "type": "object",
                "fields": [
                    {"name": "pk", "schema": {"type": "string"}},
                    {"name": "a", "schema": {
                        "type": "object",
                        "fields": [
                            {"name": "b", "schema": {"type": "number"}},
                            {"name": "c", "schema": {"type": "string"}, "optional": true}
                        ]
                    }},
                    {"name": "t", "schema": {
                        "type": "tuple",
                        "elements": [{"type": "string"}, {"type": "number"}],
                        "rest": {"type": "boolean"}
                    }},
                    {"name": "pair", "schema": {
                        "type": "tuple",
                        "elements": [{"type": "string"}, {"type": "number"}]
                    }},
                    {"name": "scores", "schema": {"type": "array", "element": {"type": "number"}}},
                    {"name": "meta", "schema": {
                        "type": "record", "key": "string", "value": {"type": "string"}
                    }}
                ]
            }
        })
    }

    fn scan(projection: &str) -> Schema {
        table(profiles())
            .scan(&ScanRequest {
                projection_expression: Some(projection.to_owned()),
                ..ScanRequest::default()
            })
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_should_project_nested_required_field() {
        assert_eq!(
            scan("a.b"),
            schema(json!({
                "type": "object",
                "fields": [{"name": "a", "schema": {
                    "type": "object",
                    "fields": [{"name": "b", "schema": {"type": "number"}}]
                }}]
            }))
        );
    }

    #[test]
    fn test_should_let_parent_selection_absorb_child() {
        assert_eq!(scan("a.c, a"), scan("a"));
    }

    #[test]
    fn test_should_collapse_rest_tuple_positions() {
        assert_eq!(
            scan("t[3]"),
            schema(json!({
                "type": "object",
                "fields": [{
                    "name": "t",
                    "schema": {"type": "array", "element": {"type": "boolean"}},
                    "optional": true
                }]
            }))
        );
    }

    #[test]
    fn test_should_keep_fixed_tuple_positions() {
        assert_eq!(
            scan("pair[1]"),
            schema(json!({
                "type": "object",
                "fields": [{
                    "name": "pair",
                    "schema": {"type": "tuple", "elements": [{"type": "number"}]}
                }]
            }))
        );
    }

    #[test]
    fn test_should_honor_strict_index_access() {
        let strict = scan("scores[0]");
        let relaxed = table_with(
            profiles(),
            EngineConfig {
                strict_index_access: false,
                ..EngineConfig::default()
            },
        )
        .scan(&ScanRequest {
            projection_expression: Some("scores[0]".to_owned()),
            ..ScanRequest::default()
        })
        .unwrap()
        .unwrap();

        let scores = |shape: &Schema| match shape {
            Schema::Object { fields } => fields[0].optional,
            other => panic!("expected an object, got {other}"),
        };
        assert!(scores(&strict));
        assert!(!scores(&relaxed));
    }

    #[test]
    fn test_should_make_record_keys_optional() {
        assert_eq!(
            scan("meta.color"),
            schema(json!({
                "type": "object",
                "fields": [{"name": "meta", "optional": true, "schema": {
                    "type": "object",
                    "fields": [{"name": "color", "schema": {"type": "string"}, "optional": true}]
                }}]
            }))
        );
    }

    #[test]
    fn test_should_get_item_with_placeholder_names() {
        let request: GetItemRequest = from_json(json!({
            "Key": {"pk": {"S": "p1"}},
            "ProjectionExpression": "#a.#b",
            "ExpressionAttributeNames": {"#a": "a", "#b": "b"}
        }));
        let shape = table(profiles()).get_item(&request).unwrap();
        assert_eq!(shape, scan("a.b").or_undefined());
    }

    #[test]
    fn test_should_reject_unused_and_undeclared_names() {
        let table = table(profiles());
        let unused: GetItemRequest = from_json(json!({
            "Key": {"pk": {"S": "p1"}},
            "ProjectionExpression": "a",
            "ExpressionAttributeNames": {"#a": "a"}
        }));
        let err = table.get_item(&unused).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedPlaceholder);
        assert!(err.to_string().contains("#a"));

        let undeclared: GetItemRequest = from_json(json!({
            "Key": {"pk": {"S": "p1"}},
            "ProjectionExpression": "#missing"
        }));
        let err = table.get_item(&undeclared).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedPlaceholder);
    }

    #[test]
    fn test_should_report_unbalanced_brackets() {
        let err = table(profiles())
            .scan(&ScanRequest {
                projection_expression: Some("scores[0".to_owned()),
                ..ScanRequest::default()
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralParse);
    }
}
