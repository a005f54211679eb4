// tests/builder_tests.rs

mod common;

use common::{Company, CompanyDto, companies, ids};
use query_spec::{
    ComparisonType, EngineConfig, EntityFilterBuilder, FilterEntry, IncludeBuilder,
    LogicalOperator, MemberPath, PropertyKind, QueryError, QuerySelectBuilder, SortDirection,
    SortOrderBuilder, SqlLikeSearchCriteriaBuilder, StringComparison, Value,
};

fn config() -> EngineConfig {
    EngineConfig::default()
}

fn filtered(builder: &EntityFilterBuilder<Company>) -> Vec<i64> {
    let predicate = builder.build(&config()).unwrap().expect("filter has entries");
    let matched: Vec<Company> = companies().into_iter().filter(|c| predicate.matches(c)).collect();
    ids(&matched)
}

fn sorted(builder: &SortOrderBuilder<Company>) -> Vec<i64> {
    let order = builder.build(&config()).unwrap().expect("sort has entries");
    let mut all = companies();
    all.sort_by(|a, b| order.compare(a, b));
    ids(&all)
}

// ============================================================================
// EntityFilterBuilder
// ============================================================================

#[test]
fn test_filter_criteria_combine_with_and_by_default() {
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter
        .add("Active", true, ComparisonType::EqualTo)
        .add("Revenue", 1000, ComparisonType::GreaterThan);
    assert_eq!(filtered(&filter), vec![1, 4]);
}

#[test]
fn test_equality_criteria_selects_the_matching_row() {
    let sample = vec![
        Company {
            id: 1,
            name: "Company 1".into(),
            ..Company::default()
        },
        Company {
            id: 2,
            name: "Company 2".into(),
            ..Company::default()
        },
    ];

    let mut filter = EntityFilterBuilder::<Company>::new();
    filter.add("Name", "Company 2", ComparisonType::EqualTo);
    let predicate = filter.build(&config()).unwrap().unwrap();

    let matched: Vec<Company> = sample.into_iter().filter(|c| predicate.matches(c)).collect();
    assert_eq!(ids(&matched), vec![2]);
}

#[test]
fn test_filter_folds_strictly_left_to_right() {
    // (Id == 1 || Id == 3) && Active, not Id == 1 || (Id == 3 && Active)
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter
        .add_with_operator("Id", 1, ComparisonType::EqualTo, LogicalOperator::Or)
        .add_with_operator("Id", 3, ComparisonType::EqualTo, LogicalOperator::And)
        .add("Active", true, ComparisonType::EqualTo);
    assert_eq!(filtered(&filter), vec![1]);

    let predicate = filter.build(&config()).unwrap().unwrap();
    assert_eq!(
        predicate.to_string(),
        "(((Id == 1) || (Id == 3)) && (Active == true))"
    );
}

#[test]
fn test_last_operator_is_ignored() {
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter.add_with_operator("Id", 2, ComparisonType::EqualTo, LogicalOperator::Or);
    assert_eq!(filtered(&filter), vec![2]);
}

#[test]
fn test_substring_comparisons() {
    let test_cases = vec![
        (ComparisonType::Contains, "me", vec![1, 4]),
        (ComparisonType::StartsWith, "Acme", vec![1]),
        (ComparisonType::EndsWith, "ella", vec![5]),
    ];

    for (comparison, value, expected) in test_cases {
        let mut filter = EntityFilterBuilder::<Company>::new();
        filter.add("Name", value, comparison);
        assert_eq!(filtered(&filter), expected, "Failed for {:?}", comparison);
    }
}

#[test]
fn test_substring_comparison_honors_configuration() {
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter.add("Name", "ACME", ComparisonType::StartsWith);

    let config = config().with_string_comparison(StringComparison::OrdinalIgnoreCase);
    let predicate = filter.build(&config).unwrap().unwrap();
    let matched: Vec<Company> = companies().into_iter().filter(|c| predicate.matches(c)).collect();
    assert_eq!(ids(&matched), vec![1, 4]);
}

#[test]
fn test_values_are_coerced_when_added() {
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter
        .add("Id", "4", ComparisonType::EqualTo)
        .add("Founded", "2015-01-01", ComparisonType::EqualTo)
        .add("Status", "active", ComparisonType::EqualTo);

    match &filter.entries()[0] {
        FilterEntry::Criteria(criteria) => {
            assert_eq!(criteria.value, Value::Integer(4));
            assert_eq!(criteria.property_type, Some(PropertyKind::Integer));
        }
        other => panic!("unexpected entry {other:?}"),
    }
    match &filter.entries()[2] {
        FilterEntry::Criteria(criteria) => assert_eq!(criteria.value, Value::from("Active")),
        other => panic!("unexpected entry {other:?}"),
    }
    assert_eq!(filtered(&filter), vec![4]);
}

#[test]
fn test_unresolvable_criteria_are_kept_until_build() {
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter.add("Nope", 1, ComparisonType::EqualTo);
    assert_eq!(filter.len(), 1);

    match filter.entries()[0] {
        FilterEntry::Criteria(ref criteria) => assert_eq!(criteria.property_type, None),
        ref other => panic!("unexpected entry {other:?}"),
    }
    assert!(matches!(
        filter.build(&config()),
        Err(QueryError::MemberNotFound { .. })
    ));
}

#[test]
fn test_blank_property_names_are_ignored() {
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter
        .add("", 1, ComparisonType::EqualTo)
        .add("   ", 1, ComparisonType::EqualTo)
        .add_member(None, 1, ComparisonType::EqualTo, LogicalOperator::And);
    assert!(filter.is_empty());
    assert!(filter.build(&config()).unwrap().is_none());
}

#[test]
fn test_typed_member_selector() {
    let city = MemberPath::<Company>::new("Address.City").unwrap();
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter.add_member(Some(&city), "Berlin", ComparisonType::EqualTo, LogicalOperator::And);
    assert_eq!(filtered(&filter), vec![1, 5]);

    assert!(MemberPath::<Company>::new("Address.Street").is_err());
}

#[test]
fn test_invalid_comparisons_for_property_kind() {
    let test_cases = vec![
        ("Id", Value::Integer(1), ComparisonType::Contains),
        ("Name", Value::from("a"), ComparisonType::GreaterThan),
        ("Active", Value::Boolean(true), ComparisonType::NotEqualTo),
        ("Status", Value::from("Active"), ComparisonType::LessThan),
        ("Address", Value::Null, ComparisonType::EqualTo),
    ];

    for (path, value, comparison) in test_cases {
        let mut filter = EntityFilterBuilder::<Company>::new();
        filter.add(path, value, comparison);
        assert!(
            matches!(filter.build(&config()), Err(QueryError::InvalidComparison { .. })),
            "Failed for {} {:?}",
            path,
            comparison
        );
    }
}

#[test]
fn test_uncoercible_values_fail_at_build() {
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter.add("Revenue", "lots", ComparisonType::GreaterThan);
    assert!(matches!(
        filter.build(&config()),
        Err(QueryError::TypeCoercion { .. })
    ));
}

#[test]
fn test_mixed_entry_kinds() {
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter
        .add_expression("Revenue > 1000 || Id == 2", LogicalOperator::And)
        .add_predicate("odd id", |c: &Company| c.id % 2 == 1, LogicalOperator::Or)
        .add("Name", "Globex", ComparisonType::EqualTo);
    // ((Revenue > 1000 || Id == 2) && odd) || Name == Globex
    assert_eq!(filtered(&filter), vec![1, 2, 3]);

    let predicate = filter.build(&config()).unwrap().unwrap();
    assert!(predicate.expression().has_custom());
    assert!(predicate.to_string().contains("<odd id>"));
}

#[test]
fn test_expression_entries_are_parsed_at_build() {
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter.add_expression("Id >", LogicalOperator::And);
    assert_eq!(filter.len(), 1);
    assert!(matches!(filter.build(&config()), Err(QueryError::Parse(_))));
}

#[test]
fn test_filter_clear() {
    let mut filter = EntityFilterBuilder::<Company>::new();
    filter.add("Id", 1, ComparisonType::EqualTo);
    filter.clear();
    assert!(filter.is_empty());
}

// ============================================================================
// SortOrderBuilder
// ============================================================================

#[test]
fn test_sort_primary_and_tie_breakers() {
    let mut sort = SortOrderBuilder::<Company>::new();
    sort.order_by_descending("Revenue")
        .then_by("Name")
        .unwrap();
    // 1500.50 ties between "Acme Corp" and "Initech"
    assert_eq!(sorted(&sort), vec![4, 1, 3, 2, 5]);

    let entries = sort.entries();
    assert!(entries[0].is_first);
    assert_eq!(entries[0].direction, SortDirection::Descending);
    assert!(!entries[1].is_first);
}

#[test]
fn test_sort_ascending_then_descending() {
    let mut sample: Vec<Company> = [(1, "b"), (2, "a"), (3, "b"), (4, "a")]
        .into_iter()
        .map(|(id, name)| Company {
            id,
            name: name.into(),
            ..Company::default()
        })
        .collect();

    let mut sort = SortOrderBuilder::<Company>::new();
    sort.add("Name", SortDirection::Ascending)
        .add("Id", SortDirection::Descending);
    let order = sort.build(&config()).unwrap().unwrap();
    sample.sort_by(|a, b| order.compare(a, b));
    assert_eq!(ids(&sample), vec![4, 2, 3, 1]);
}

#[test]
fn test_sort_by_nested_member_puts_nulls_first() {
    let mut sort = SortOrderBuilder::<Company>::new();
    sort.order_by("Address.City").then_by_descending("Id").unwrap();
    assert_eq!(sorted(&sort), vec![3, 4, 5, 1, 2]);
}

#[test]
fn test_sort_is_stable_for_equal_keys() {
    let mut sort = SortOrderBuilder::<Company>::new();
    sort.order_by("Status");
    assert_eq!(sorted(&sort), vec![1, 4, 5, 3, 2]);
}

#[test]
fn test_then_by_requires_order_by() {
    let mut sort = SortOrderBuilder::<Company>::new();
    assert!(matches!(sort.then_by("Name"), Err(QueryError::UsageOrder(_))));
    assert!(matches!(
        sort.then_by_descending("Name"),
        Err(QueryError::UsageOrder(_))
    ));
    assert!(sort.is_empty());
}

#[test]
fn test_order_by_restarts_the_ordering() {
    let mut sort = SortOrderBuilder::<Company>::new();
    sort.order_by("Name").then_by("Id").unwrap();
    sort.order_by_descending("Id");
    assert_eq!(sort.len(), 1);
    assert_eq!(sorted(&sort), vec![5, 4, 3, 2, 1]);
}

#[test]
fn test_sort_on_navigation_fails_at_build() {
    for path in ["Employees", "Address"] {
        let mut sort = SortOrderBuilder::<Company>::new();
        sort.order_by(path);
        match sort.build(&config()) {
            Err(QueryError::InvalidComparison { comparison, .. }) => {
                assert_eq!(comparison, "OrderBy", "Failed for path: {}", path)
            }
            other => panic!("Expected invalid comparison for {}, got {:?}", path, other),
        }
    }

    // Scalars reached through a navigation still sort
    let mut sort = SortOrderBuilder::<Company>::new();
    sort.order_by("Address.City");
    assert!(sort.build(&config()).unwrap().is_some());
}

#[test]
fn test_sort_on_unknown_member_fails_at_build() {
    let mut sort = SortOrderBuilder::<Company>::new();
    sort.order_by("Nope");
    assert!(matches!(
        sort.build(&config()),
        Err(QueryError::MemberNotFound { .. })
    ));
}

// ============================================================================
// QuerySelectBuilder
// ============================================================================

#[test]
fn test_select_projects_onto_result_type() {
    let mut select = QuerySelectBuilder::<Company, CompanyDto>::new();
    select
        .select("Id")
        .then_select_as("Name", "CompanyName")
        .unwrap()
        .then_select_as("Address.City", "City")
        .unwrap();

    let projection = select.build(&config()).unwrap().unwrap();
    let results: Vec<CompanyDto> = companies()
        .iter()
        .map(|c| projection.project(c).unwrap())
        .collect();

    assert_eq!(
        results[0],
        CompanyDto {
            id: 1,
            company_name: "Acme Corp".into(),
            city: Some("Berlin".into()),
        }
    );
    assert_eq!(results[2].city, None);
}

#[test]
fn test_select_restarts_and_then_select_requires_select() {
    let mut select = QuerySelectBuilder::<Company, CompanyDto>::new();
    assert!(matches!(select.then_select("Id"), Err(QueryError::UsageOrder(_))));

    select.select("Id").then_select("Name").unwrap_or_else(|e| panic!("{e}"));
    select.select_as("Name", "CompanyName");
    assert_eq!(select.len(), 1);
    assert!(!select.entries()[0].is_pass_through());
}

#[test]
fn test_select_type_checks_assignments() {
    let mut select = QuerySelectBuilder::<Company, CompanyDto>::new();
    select.select_as("Revenue", "CompanyName");
    assert!(matches!(
        select.build(&config()),
        Err(QueryError::TypeCoercion { .. })
    ));

    let mut select = QuerySelectBuilder::<Company, CompanyDto>::new();
    select.select("Name");
    assert!(matches!(
        select.build(&config()),
        Err(QueryError::MemberNotFound { .. })
    ));
}

#[test]
fn test_empty_select_builds_nothing() {
    let select = QuerySelectBuilder::<Company, CompanyDto>::new();
    assert!(select.build(&config()).unwrap().is_none());
}

// ============================================================================
// SqlLikeSearchCriteriaBuilder
// ============================================================================

#[test]
fn test_search_terms_combine_with_or() {
    let mut search = SqlLikeSearchCriteriaBuilder::<Company>::new();
    search.add("Name", "tech").add("Address.City", "ost");

    let predicate = search.build(&config()).unwrap().unwrap();
    let matched: Vec<Company> = companies().into_iter().filter(|c| predicate.matches(c)).collect();
    assert_eq!(ids(&matched), vec![2, 3]);
}

#[test]
fn test_search_wildcards_and_case() {
    let mut search = SqlLikeSearchCriteriaBuilder::<Company>::new();
    search.add("Name", "A_m");

    let ordinal = search.build(&config()).unwrap().unwrap();
    let folded = search
        .build(&config().with_string_comparison(StringComparison::OrdinalIgnoreCase))
        .unwrap()
        .unwrap();

    let count = |p: &query_spec::Predicate<Company>| companies().iter().filter(|c| p.matches(c)).count();
    // "Acme Corp" only; "acme industries" needs case folding
    assert_eq!(count(&ordinal), 1);
    assert_eq!(count(&folded), 2);
}

#[test]
fn test_search_terms_are_trimmed() {
    let mut search = SqlLikeSearchCriteriaBuilder::<Company>::new();
    search.add("Name", "  acme ");
    assert_eq!(search.entries()[0].search_term, "acme");

    let predicate = search.build(&config()).unwrap().unwrap();
    let matched: Vec<Company> = companies().into_iter().filter(|c| predicate.matches(c)).collect();
    assert_eq!(ids(&matched), vec![4]);
}

#[test]
fn test_blank_search_terms_are_skipped() {
    let mut search = SqlLikeSearchCriteriaBuilder::<Company>::new();
    search.add("Name", "").add("Name", "  ");
    assert!(search.is_empty());
    assert!(search.build(&config()).unwrap().is_none());
}

#[test]
fn test_search_requires_string_members() {
    let mut search = SqlLikeSearchCriteriaBuilder::<Company>::new();
    search.add("Id", "1");
    assert!(matches!(
        search.build(&config()),
        Err(QueryError::InvalidComparison { .. })
    ));
}

#[test]
fn test_search_by_typed_member() {
    let name = MemberPath::<Company>::new("Name").unwrap();
    let mut search = SqlLikeSearchCriteriaBuilder::<Company>::new();
    search.add_member(&name, "rell");
    assert_eq!(search.entries()[0].property_path, "Name");
}

// ============================================================================
// IncludeBuilder
// ============================================================================

#[test]
fn test_include_paths() {
    let mut include = IncludeBuilder::<Company>::new();
    include.include("Address");
    include.include("Employees").then_include("Address").unwrap();

    assert_eq!(
        include.build(&config()).unwrap(),
        vec!["Address".to_string(), "Employees.Address".to_string()]
    );
    assert!(include.entries()[2].is_chained);
}

#[test]
fn test_then_include_requires_include() {
    let mut include = IncludeBuilder::<Company>::new();
    assert!(matches!(
        include.then_include("Address"),
        Err(QueryError::UsageOrder(_))
    ));
}

#[test]
fn test_include_rejects_non_navigations() {
    let mut include = IncludeBuilder::<Company>::new();
    include.include("Name");
    match include.build(&config()) {
        Err(QueryError::MemberNotFound { type_name, segment }) => {
            assert_eq!(type_name, "Company");
            assert_eq!(segment, "Name");
        }
        other => panic!("Expected member not found, got {:?}", other),
    }

    let mut include = IncludeBuilder::<Company>::new();
    include.include("Address.City");
    assert!(matches!(
        include.build(&config()),
        Err(QueryError::MemberNotFound { ref segment, .. }) if segment == "City"
    ));

    let mut include = IncludeBuilder::<Company>::new();
    include.include("Employees").then_include("Manager").unwrap();
    assert!(matches!(
        include.build(&config()),
        Err(QueryError::MemberNotFound { .. })
    ));
}
