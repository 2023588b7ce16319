//! Key narrowing, index projection and filter narrowing for `Query` and `Scan`.

#[cfg(test)]
mod tests {
    use dynashape_core::{QueryRequest, ScanRequest, ShapeError, Table};
    use dynashape_model::{ErrorKind, Schema};
    use serde_json::json;

    use crate::{from_json, table};

    fn single_table() -> Table {
        table(json!({
            "TableName": "app",
            "KeySchema": [
                {"AttributeName": "pk", "KeyType": "HASH"},
                {"AttributeName": "sk", "KeyType": "RANGE"}
            ],
            "GlobalSecondaryIndexes": [{
                "IndexName": "by-status",
                "KeySchema": [{"AttributeName": "status", "KeyType": "HASH"}],
                "Projection": {"ProjectionType": "INCLUDE", "NonKeyAttributes": ["total"]}
            }],
            "Schema": {
                "type": "union",
                "variants": [
                    {"type": "object", "fields": [
                        {"name": "pk", "schema": {"type": "template", "parts": [{"literal": "USER#"}, "string"]}},
                        {"name": "sk", "schema": {"type": "stringLiteral", "value": "PROFILE"}},
                        {"name": "email", "schema": {"type": "string"}}
                    ]},
                    {"type": "object", "fields": [
                        {"name": "pk", "schema": {"type": "template", "parts": [{"literal": "USER#"}, "string"]}},
                        {"name": "sk", "schema": {"type": "template", "parts": [{"literal": "ORDER#"}, "number"]}},
                        {"name": "total", "schema": {"type": "number"}},
                        {"name": "note", "schema": {"type": "string"}, "optional": true},
                        {"name": "status", "schema": {"type": "string"}, "optional": true}
                    ]}
                ]
            }
        }))
    }

    fn query(body: serde_json::Value) -> Result<Option<Schema>, ShapeError> {
        let request: QueryRequest = from_json(body);
        single_table().query(&request)
    }

    fn field_names(shape: &Schema) -> Vec<Vec<String>> {
        shape
            .members()
            .into_iter()
            .map(|member| match member {
                Schema::Object { fields } => fields.iter().map(|f| f.name.clone()).collect(),
                other => panic!("expected an object, got {other}"),
            })
            .collect()
    }

    #[test]
    fn test_should_narrow_by_string_between_bounds() {
        let shape = query(json!({
            "KeyConditionExpression": "pk = :pk AND sk BETWEEN :lo AND :hi",
            "ExpressionAttributeValues": {
                ":pk": {"type": "stringLiteral", "value": "USER#1"},
                ":lo": {"type": "stringLiteral", "value": "ORDER#2020"},
                ":hi": {"type": "stringLiteral", "value": "ORDER#2021"}
            }
        }))
        .unwrap()
        .unwrap();
        assert_eq!(
            field_names(&shape),
            vec![vec!["pk", "sk", "total", "note", "status"]]
        );
    }

    #[test]
    fn test_should_keep_every_variant_for_partition_only() {
        let shape = query(json!({
            "KeyConditionExpression": "#pk = :pk",
            "ExpressionAttributeNames": {"#pk": "pk"},
            "ExpressionAttributeValues": {":pk": {"type": "stringLiteral", "value": "USER#1"}}
        }))
        .unwrap()
        .unwrap();
        assert_eq!(shape.members().len(), 2);
    }

    #[test]
    fn test_should_fail_when_no_variant_matches() {
        let err = query(json!({
            "KeyConditionExpression": "pk = :pk",
            "ExpressionAttributeValues": {":pk": {"type": "stringLiteral", "value": "TEAM#1"}}
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatchingKey);
    }

    #[test]
    fn test_should_require_partition_key_equality() {
        let err = query(json!({
            "KeyConditionExpression": "begins_with(pk, :p)",
            "ExpressionAttributeValues": {":p": {"type": "stringLiteral", "value": "USER#"}}
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatchingKey);

        let err = query(json!({
            "KeyConditionExpression": "pk = :pk AND email = :e",
            "ExpressionAttributeValues": {
                ":pk": {"type": "stringLiteral", "value": "USER#1"},
                ":e": {"type": "string"}
            }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatchingKey);
    }

    #[test]
    fn test_should_reject_or_in_key_condition() {
        let err = query(json!({
            "KeyConditionExpression": "pk = :pk OR sk = :sk",
            "ExpressionAttributeValues": {
                ":pk": {"type": "stringLiteral", "value": "USER#1"},
                ":sk": {"type": "stringLiteral", "value": "PROFILE"}
            }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralParse);
    }

    #[test]
    fn test_should_apply_include_index_projection() {
        let shape = query(json!({
            "IndexName": "by-status",
            "KeyConditionExpression": "#s = :s",
            "ExpressionAttributeNames": {"#s": "status"},
            "ExpressionAttributeValues": {":s": {"type": "stringLiteral", "value": "OPEN"}}
        }))
        .unwrap()
        .unwrap();
        assert_eq!(
            field_names(&shape),
            vec![vec!["pk", "sk", "total", "status"]]
        );
    }

    #[test]
    fn test_should_narrow_by_filter_then_project() {
        let shape = query(json!({
            "KeyConditionExpression": "pk = :pk",
            "FilterExpression": "sk = :profile AND attribute_exists(email)",
            "ProjectionExpression": "email",
            "ExpressionAttributeValues": {
                ":pk": {"type": "stringLiteral", "value": "USER#1"},
                ":profile": {"type": "stringLiteral", "value": "PROFILE"}
            }
        }))
        .unwrap()
        .unwrap();
        assert_eq!(field_names(&shape), vec![vec!["email"]]);
    }

    #[test]
    fn test_should_count_without_item_shape() {
        let shape = query(json!({
            "KeyConditionExpression": "pk = :pk",
            "ExpressionAttributeValues": {":pk": {"type": "stringLiteral", "value": "USER#1"}},
            "Select": "COUNT"
        }))
        .unwrap();
        assert_eq!(shape, None);
    }

    #[test]
    fn test_should_scan_with_filter_prefix() {
        let request: ScanRequest = from_json(json!({
            "FilterExpression": "begins_with(sk, :order)",
            "ExpressionAttributeValues": {":order": {"type": "stringLiteral", "value": "ORDER#1"}}
        }));
        let shape = single_table().scan(&request).unwrap().unwrap();
        assert_eq!(shape.members().len(), 1);
    }
}
