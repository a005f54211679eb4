//! JSON boundary of query specifications.
//!
//! A [`Query`] is written as a [`QueryDocument`]: property paths, literal
//! values, and flags, all plain data. Reading a document back rebuilds the
//! query for the statically known `T` and `R` and re-resolves every path
//! against them, so a path that does not exist fails deserialization
//! instead of being dropped.
//!
//! ```json
//! {
//!   "filters": [
//!     { "propertyPath": "Name", "value": "Acme", "comparisonType": "Contains", "logicalOperator": "And" },
//!     { "expression": "Revenue > 1000 || !Active" }
//!   ],
//!   "sorts": [{ "propertyPath": "Name", "direction": "Ascending" }],
//!   "skip": 10,
//!   "take": 5
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
use tracing::debug;

use crate::{
    builders::FilterEntry,
    config::EngineConfig,
    criteria::{
        ComparisonType, IncludeDirective, LogicalOperator, SearchCriteria, SelectDescriptor,
        SortDirection,
    },
    entity::Entity,
    error::{QueryError, Result},
    query::Query,
    value::Value,
};

/// Wire form of a query specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<SortDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selects: Vec<SelectDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub searches: Vec<SearchCriteria>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<IncludeDirective>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<usize>,
    #[serde(default)]
    pub as_no_tracking: bool,
    #[serde(default)]
    pub as_split_query: bool,
    #[serde(default)]
    pub ignore_query_filters: bool,
}

/// A filter entry: either a criteria or filter-expression text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum FilterDocument {
    Criteria {
        property_path: String,
        #[serde(default)]
        value: Value,
        comparison_type: ComparisonType,
        #[serde(default)]
        logical_operator: LogicalOperator,
    },
    Expression {
        expression: String,
        #[serde(default)]
        logical_operator: LogicalOperator,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortDocument {
    pub property_path: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl<T: Entity, R: Entity> Query<T, R> {
    /// Converts the query to its wire form.
    ///
    /// Fails when the filter holds a predicate closure, which has no wire form.
    pub fn to_document(&self) -> Result<QueryDocument> {
        let filters = self
            .filter_builder()
            .map(|builder| builder.entries())
            .unwrap_or_default()
            .iter()
            .map(|entry| match entry {
                FilterEntry::Criteria(criteria) => Ok(FilterDocument::Criteria {
                    property_path: criteria.property_path.clone(),
                    value: criteria.value.clone(),
                    comparison_type: criteria.comparison_type,
                    logical_operator: criteria.logical_operator_to_next,
                }),
                FilterEntry::Expression {
                    text,
                    logical_operator_to_next,
                } => Ok(FilterDocument::Expression {
                    expression: text.clone(),
                    logical_operator: *logical_operator_to_next,
                }),
                FilterEntry::Predicate { predicate, .. } => Err(QueryError::Serialization(
                    format!("filter predicate '{}' cannot be serialized", predicate.name()),
                )),
            })
            .collect::<Result<Vec<_>>>()?;

        let sorts = self
            .sort_builder()
            .map(|builder| builder.entries())
            .unwrap_or_default()
            .iter()
            .map(|sort| SortDocument {
                property_path: sort.property_path.clone(),
                direction: sort.direction,
            })
            .collect();

        Ok(QueryDocument {
            filters,
            sorts,
            selects: self
                .select_builder()
                .map(|builder| builder.entries().to_vec())
                .unwrap_or_default(),
            searches: self
                .search_builder()
                .map(|builder| builder.entries().to_vec())
                .unwrap_or_default(),
            includes: self
                .include_builder()
                .map(|builder| builder.entries().to_vec())
                .unwrap_or_default(),
            skip: self.skip_count(),
            take: self.take_count(),
            as_no_tracking: self.is_no_tracking(),
            as_split_query: self.is_split_query(),
            ignore_query_filters: self.ignores_query_filters(),
        })
    }

    /// Rebuilds a query from its wire form and validates it against `T` and `R`.
    pub fn from_document(document: QueryDocument) -> Result<Self> {
        let mut query = Query::<T, R>::new();

        for filter in document.filters {
            match filter {
                FilterDocument::Criteria {
                    property_path,
                    value,
                    comparison_type,
                    logical_operator,
                } => {
                    if property_path.trim().is_empty() {
                        return Err(QueryError::member_not_found(T::entity_type().name(), ""));
                    }
                    query.filter_mut().add_with_operator(
                        &property_path,
                        value,
                        comparison_type,
                        logical_operator,
                    );
                }
                FilterDocument::Expression {
                    expression,
                    logical_operator,
                } => {
                    query
                        .filter_mut()
                        .add_expression(&expression, logical_operator);
                }
            }
        }

        for sort in &document.sorts {
            query.sort_mut().add(&sort.property_path, sort.direction);
        }
        for select in document.selects {
            query.select_mut().push(select);
        }
        for search in &document.searches {
            query
                .search_mut()
                .add(&search.property_path, &search.search_term);
        }
        for include in &document.includes {
            if include.is_chained {
                query.include_mut().then_include(&include.navigation_path)?;
            } else {
                query.include_mut().include(&include.navigation_path);
            }
        }

        if let Some(skip) = document.skip {
            query.skip(skip);
        }
        if let Some(take) = document.take {
            query.take(take);
        }
        query
            .as_no_tracking(document.as_no_tracking)
            .as_split_query(document.as_split_query)
            .ignore_query_filters(document.ignore_query_filters);

        query.validate(&EngineConfig::default())?;
        debug!(entity = T::entity_type().name(), "deserialized query");
        Ok(query)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_document()?)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document()?)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: QueryDocument = serde_json::from_str(json)?;
        Query::from_document(document)
    }
}

impl<T: Entity, R: Entity> Serialize for Query<T, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_document()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de, T: Entity, R: Entity> Deserialize<'de> for Query<T, R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let document = QueryDocument::deserialize(deserializer)?;
        Query::from_document(document).map_err(de::Error::custom)
    }
}
