//! Declarative query criteria.
//!
//! These are the plain, serializable building blocks accumulated by the
//! builders and carried over the JSON boundary. They hold property paths as
//! strings; nothing here is resolved or compiled.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{entity::PropertyKind, value::Value};

/// Comparison vocabulary of filter criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonType {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Contains,
    StartsWith,
    EndsWith,
}

impl ComparisonType {
    pub const RELATIONAL: &'static [ComparisonType] = &[
        ComparisonType::EqualTo,
        ComparisonType::NotEqualTo,
        ComparisonType::GreaterThan,
        ComparisonType::GreaterOrEqual,
        ComparisonType::LessThan,
        ComparisonType::LessOrEqual,
    ];

    pub const TEXTUAL: &'static [ComparisonType] = &[
        ComparisonType::EqualTo,
        ComparisonType::NotEqualTo,
        ComparisonType::Contains,
        ComparisonType::StartsWith,
        ComparisonType::EndsWith,
    ];

    pub const EQUALITY: &'static [ComparisonType] = &[ComparisonType::EqualTo];

    pub fn is_substring(self) -> bool {
        matches!(
            self,
            ComparisonType::Contains | ComparisonType::StartsWith | ComparisonType::EndsWith
        )
    }
}

impl fmt::Display for ComparisonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a criteria combines with the entry that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// A single declarative filter condition.
///
/// `property_type` is the resolved kind of `property_path` when it could be
/// resolved at the time the criteria was added; it is not part of the wire
/// format and is recomputed on deserialization.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub property_type: Option<PropertyKind>,
    pub property_path: String,
    pub value: Value,
    pub comparison_type: ComparisonType,
    pub logical_operator_to_next: LogicalOperator,
}

impl FilterCriteria {
    pub fn new(
        property_path: impl Into<String>,
        value: impl Into<Value>,
        comparison_type: ComparisonType,
    ) -> Self {
        FilterCriteria {
            property_type: None,
            property_path: property_path.into(),
            value: value.into(),
            comparison_type,
            logical_operator_to_next: LogicalOperator::And,
        }
    }

    pub fn with_operator(mut self, operator: LogicalOperator) -> Self {
        self.logical_operator_to_next = operator;
        self
    }
}

/// A single ordering key. The first entry of a list is the primary order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriteria {
    pub property_path: String,
    pub direction: SortDirection,
    pub is_first: bool,
}

/// Maps a member of the source entity onto a property of the result type.
///
/// A pass-through descriptor has the same path on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectDescriptor {
    pub assignor: String,
    pub assignee: String,
}

impl SelectDescriptor {
    pub fn new(assignor: impl Into<String>, assignee: impl Into<String>) -> Self {
        SelectDescriptor {
            assignor: assignor.into(),
            assignee: assignee.into(),
        }
    }

    pub fn pass_through(path: impl Into<String>) -> Self {
        let path = path.into();
        SelectDescriptor {
            assignor: path.clone(),
            assignee: path,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        self.assignor == self.assignee
    }
}

/// A navigation to load alongside the entity.
///
/// A chained directive is relative to the directive right before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeDirective {
    pub navigation_path: String,
    #[serde(default)]
    pub is_chained: bool,
}

/// A free-text search term applied to one string member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub property_path: String,
    pub search_term: String,
}

impl PropertyKind {
    /// The comparison types a filter criteria may use against this kind.
    ///
    /// Numeric and date kinds allow equality and relational comparisons;
    /// strings allow equality and substring matching; booleans and enums
    /// allow `EqualTo` only. Navigations allow nothing.
    pub fn valid_comparison_operators(&self) -> &'static [ComparisonType] {
        match self {
            PropertyKind::Integer
            | PropertyKind::Float
            | PropertyKind::Decimal
            | PropertyKind::DateTime => ComparisonType::RELATIONAL,
            PropertyKind::String => ComparisonType::TEXTUAL,
            PropertyKind::Boolean | PropertyKind::Enum(_) => ComparisonType::EQUALITY,
            PropertyKind::Entity(_) | PropertyKind::Collection(_) => &[],
        }
    }
}
