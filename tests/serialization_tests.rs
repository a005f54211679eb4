// tests/serialization_tests.rs

mod common;

use common::{Company, CompanyDto, companies, ids};
use query_spec::{
    ComparisonType, EngineConfig, FilterDocument, InMemoryQueryable, LogicalOperator, Query,
    QueryDocument, QueryError, SortDirection, Value,
};
use serde_json::json;

fn full_query() -> Query<Company, CompanyDto> {
    let mut query = Query::<Company, CompanyDto>::new();
    query
        .filter_mut()
        .add("Revenue", 1000, ComparisonType::GreaterThan)
        .add_with_operator("Name", "acme", ComparisonType::Contains, LogicalOperator::Or)
        .add_expression("Address.City == 'Berlin'", LogicalOperator::And);
    query
        .sort_mut()
        .order_by_descending("Revenue")
        .then_by("Id")
        .unwrap();
    query
        .select_mut()
        .select("Id")
        .then_select_as("Name", "CompanyName")
        .unwrap();
    query.search_mut().add("Name", "e");
    query
        .include_mut()
        .include("Employees")
        .then_include("Address")
        .unwrap();
    query.skip(1).take(10).as_no_tracking(true);
    query
}

fn from_json_err(json: &str) -> QueryError {
    match Query::<Company>::from_json(json) {
        Ok(query) => panic!("expected {json} to fail, got {query:?}"),
        Err(e) => e,
    }
}

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn test_full_query_round_trip() {
    let query = full_query();
    let json = query.to_json().unwrap();
    let restored = Query::<Company, CompanyDto>::from_json(&json).unwrap();
    assert_eq!(restored, query);

    // Both produce the same results
    let config = EngineConfig::default();
    let expected = query
        .compile(&config)
        .unwrap()
        .execute(InMemoryQueryable::new(companies()))
        .unwrap();
    let actual = restored
        .compile(&config)
        .unwrap()
        .execute(InMemoryQueryable::new(companies()))
        .unwrap();
    assert_eq!(actual, expected);
}

#[test]
fn test_criteria_sort_and_paging_round_trip() {
    let mut query = Query::<Company>::new();
    query
        .filter_mut()
        .add("Name", "Acme", ComparisonType::StartsWith)
        .add_with_operator("Id", 3, ComparisonType::LessOrEqual, LogicalOperator::Or);
    query.sort_mut().order_by_descending("Name");
    query.skip(10).take(5);

    let restored = Query::<Company>::from_json(&query.to_json().unwrap()).unwrap();
    assert_eq!(restored, query);

    let entries = restored.filter_builder().unwrap().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].logical_operator_to_next(), LogicalOperator::Or);
    assert_eq!(restored.sort_builder().unwrap().len(), 1);
    assert_eq!(restored.skip_count(), Some(10));
    assert_eq!(restored.take_count(), Some(5));
}

#[test]
fn test_serde_impls_delegate_to_documents() {
    let query = full_query();
    let json = serde_json::to_string(&query).unwrap();
    assert_eq!(json, query.to_json().unwrap());

    let restored: Query<Company, CompanyDto> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, query);
}

#[test]
fn test_pretty_output_parses_to_the_same_document() {
    let query = full_query();
    let pretty: QueryDocument = serde_json::from_str(&query.to_json_pretty().unwrap()).unwrap();
    assert_eq!(pretty, query.to_document().unwrap());
}

// ============================================================================
// Wire Format
// ============================================================================

#[test]
fn test_empty_query_writes_only_flags() {
    let json = Query::<Company>::new().to_json().unwrap();
    assert_eq!(
        json,
        r#"{"asNoTracking":false,"asSplitQuery":false,"ignoreQueryFilters":false}"#
    );
}

#[test]
fn test_field_names_are_camel_case() {
    let value = serde_json::to_value(full_query().to_document().unwrap()).unwrap();

    assert_eq!(
        value["filters"][0],
        json!({
            "propertyPath": "Revenue",
            "value": 1000,
            "comparisonType": "GreaterThan",
            "logicalOperator": "And",
        })
    );
    assert_eq!(
        value["filters"][2],
        json!({ "expression": "Address.City == 'Berlin'", "logicalOperator": "And" })
    );
    assert_eq!(
        value["sorts"],
        json!([
            { "propertyPath": "Revenue", "direction": "Descending" },
            { "propertyPath": "Id", "direction": "Ascending" },
        ])
    );
    assert_eq!(
        value["selects"][1],
        json!({ "assignor": "Name", "assignee": "CompanyName" })
    );
    assert_eq!(
        value["searches"],
        json!([{ "propertyPath": "Name", "searchTerm": "e" }])
    );
    assert_eq!(
        value["includes"],
        json!([
            { "navigationPath": "Employees", "isChained": false },
            { "navigationPath": "Address", "isChained": true },
        ])
    );
    assert_eq!(value["skip"], 1);
    assert_eq!(value["take"], 10);
    assert_eq!(value["asNoTracking"], true);
    assert_eq!(value["asSplitQuery"], false);
}

#[test]
fn test_coerced_values_are_written_in_json_form() {
    let mut query = Query::<Company>::new();
    query
        .filter_mut()
        .add("Rating", 4, ComparisonType::GreaterOrEqual)
        .add("Founded", "2000-01-01", ComparisonType::LessThan)
        .add("Status", "closed", ComparisonType::EqualTo);

    let document = query.to_document().unwrap();
    let values: Vec<Value> = document
        .filters
        .iter()
        .map(|filter| match filter {
            FilterDocument::Criteria { value, .. } => value.clone(),
            other => panic!("Expected criteria, got {:?}", other),
        })
        .collect();
    assert_eq!(values[0], Value::Float(4.0));
    assert!(matches!(values[1], Value::DateTime(_)));
    assert_eq!(values[2], Value::String("Closed".into()));

    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(json["filters"][1]["value"], "2000-01-01T00:00:00+00:00");
}

#[test]
fn test_missing_optional_fields_take_defaults() {
    let query = Query::<Company>::from_json(
        r#"{
            "filters": [{ "propertyPath": "ParentName", "comparisonType": "EqualTo" }],
            "sorts": [{ "propertyPath": "Id" }]
        }"#,
    )
    .unwrap();

    let sort = &query.sort_builder().unwrap().entries()[0];
    assert_eq!(sort.direction, SortDirection::Ascending);
    assert_eq!(query.skip_count(), None);
    assert!(!query.is_no_tracking());

    // A missing value is null
    let results = query
        .compile(&EngineConfig::default())
        .unwrap()
        .execute(InMemoryQueryable::new(companies()))
        .unwrap();
    assert_eq!(ids(&results), vec![1, 3, 5]);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_predicate_entries_cannot_be_serialized() {
    let mut query = Query::<Company>::new();
    query
        .filter_mut()
        .add_predicate("even ids", |c| c.id % 2 == 0, LogicalOperator::And);

    match query.to_json() {
        Err(QueryError::Serialization(message)) => assert!(message.contains("even ids")),
        other => panic!("expected serialization error, got {other:?}"),
    }
    assert!(serde_json::to_string(&query).is_err());
}

#[test]
fn test_unknown_paths_fail_deserialization() {
    let test_cases = vec![
        (
            r#"{"filters":[{"propertyPath":"Nope","value":1,"comparisonType":"EqualTo"}]}"#,
            "Nope",
        ),
        (r#"{"sorts":[{"propertyPath":"Address.Zip"}]}"#, "Zip"),
        (
            r#"{"searches":[{"propertyPath":"Missing","searchTerm":"x"}]}"#,
            "Missing",
        ),
        (
            r#"{"includes":[{"navigationPath":"Offices"}]}"#,
            "Offices",
        ),
    ];

    for (input, expected) in test_cases {
        match from_json_err(input) {
            QueryError::MemberNotFound { segment, .. } => {
                assert_eq!(segment, expected, "Failed for input: {}", input)
            }
            other => panic!("Expected member not found, got {} for input: {}", other, input),
        }
    }
}

#[test]
fn test_blank_criteria_path_fails_deserialization() {
    let err = from_json_err(r#"{"filters":[{"propertyPath":"  ","value":1,"comparisonType":"EqualTo"}]}"#);
    assert!(matches!(err, QueryError::MemberNotFound { ref segment, .. } if segment.is_empty()));
}

#[test]
fn test_chained_include_without_include_fails() {
    let err = from_json_err(r#"{"includes":[{"navigationPath":"Address","isChained":true}]}"#);
    assert!(matches!(err, QueryError::UsageOrder(_)));
}

#[test]
fn test_invalid_content_fails_deserialization() {
    let test_cases = vec![
        r#"{"filters":[{"propertyPath":"Active","value":"x","comparisonType":"Contains"}]}"#,
        r#"{"filters":[{"propertyPath":"Id","value":"abc","comparisonType":"EqualTo"}]}"#,
        r#"{"filters":[{"expression":"Id >"}]}"#,
        r#"{"filters":[{"propertyPath":"Id","comparisonType":"Like"}]}"#,
        r#"{"skip":-1}"#,
        "not json",
    ];

    for input in test_cases {
        assert!(Query::<Company>::from_json(input).is_err(), "Failed for input: {}", input);
    }
}

#[test]
fn test_serde_error_carries_query_error_message() {
    let err = serde_json::from_str::<Query<Company>>(
        r#"{"filters":[{"propertyPath":"Nope","value":1,"comparisonType":"EqualTo"}]}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Member 'Nope' not found on type 'Company'"));
}

#[test]
fn test_select_assignee_checked_against_result_type() {
    let err = match Query::<Company, CompanyDto>::from_json(
        r#"{"selects":[{"assignor":"Name","assignee":"Title"}]}"#,
    ) {
        Ok(query) => panic!("expected failure, got {query:?}"),
        Err(e) => e,
    };
    match err {
        QueryError::MemberNotFound { type_name, segment } => {
            assert_eq!(type_name, "CompanyDto");
            assert_eq!(segment, "Title");
        }
        other => panic!("unexpected error: {other}"),
    }
}
