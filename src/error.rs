use thiserror::Error;

use crate::{lexer::LexError, parser::ParseError};

/// Errors raised while building, compiling, or materializing a query.
///
/// Everything except [`QueryError::Materialization`] is raised synchronously
/// at build/compile time; evaluators never produce these.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Invalid character or malformed literal in a filter expression
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Grammar violation in a filter expression
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A member path segment does not exist on the given type
    #[error("Member '{segment}' not found on type '{type_name}'")]
    MemberNotFound { type_name: String, segment: String },

    /// A literal cannot be converted to the target property type
    #[error("Cannot coerce {literal} to {expected_type}")]
    TypeCoercion {
        expected_type: String,
        literal: String,
    },

    /// A method call outside the supported whitelist
    #[error("Unsupported method '{name}'")]
    UnsupportedMethod { name: String },

    /// A comparison that is not valid for the resolved property type
    #[error("Comparison '{comparison}' is not valid for property type '{property_type}'")]
    InvalidComparison {
        comparison: String,
        property_type: String,
    },

    /// A chained builder call without its primary call
    #[error("Usage error: {0}")]
    UsageOrder(String),

    /// JSON boundary failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failure while producing results from a queryable sequence
    #[error("Materialization error: {0}")]
    Materialization(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<serde_json::Error> for QueryError {
    fn from(e: serde_json::Error) -> Self {
        QueryError::Serialization(e.to_string())
    }
}

impl QueryError {
    pub(crate) fn member_not_found(type_name: impl Into<String>, segment: impl Into<String>) -> Self {
        QueryError::MemberNotFound {
            type_name: type_name.into(),
            segment: segment.into(),
        }
    }

    pub(crate) fn coercion(expected_type: impl Into<String>, literal: impl Into<String>) -> Self {
        QueryError::TypeCoercion {
            expected_type: expected_type.into(),
            literal: literal.into(),
        }
    }

    pub(crate) fn invalid_comparison(
        comparison: impl Into<String>,
        property_type: impl Into<String>,
    ) -> Self {
        QueryError::InvalidComparison {
            comparison: comparison.into(),
            property_type: property_type.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
