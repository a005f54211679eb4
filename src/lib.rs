//! Declarative query specifications.
//!
//! A [`Query`] collects filter criteria, filter-expression text, sort keys,
//! projections, search terms, includes, paging, and provider hints through
//! typed builders. [`Query::compile`] resolves every member path against the
//! entity metadata and produces a [`CompiledQuery`], which the
//! [`SpecificationEvaluator`] applies to any [`Queryable`] sequence in a
//! fixed stage order.
//!
//! ```
//! use query_spec::{ComparisonType, EngineConfig, InMemoryQueryable, Query};
//! # use std::sync::LazyLock;
//! # use query_spec::{Entity, EntityType, PropertyKind, Record, RecordExt, Value};
//! # #[derive(Clone)]
//! # struct City { name: String, population: i64 }
//! # static CITY: LazyLock<EntityType> = LazyLock::new(|| {
//! #     EntityType::new("City")
//! #         .with_property("Name", PropertyKind::String)
//! #         .with_property("Population", PropertyKind::Integer)
//! # });
//! # impl Entity for City {
//! #     fn entity_type() -> &'static EntityType { &CITY }
//! #     fn get(&self, property: &str) -> Option<Value> {
//! #         match property {
//! #             "Name" => Some(self.name.clone().into()),
//! #             "Population" => Some(self.population.into()),
//! #             _ => None,
//! #         }
//! #     }
//! #     fn from_record(record: &Record) -> query_spec::Result<Self> {
//! #         Ok(City {
//! #             name: record.value_of("Name").unwrap_or_default(),
//! #             population: record.value_of("Population").unwrap_or_default(),
//! #         })
//! #     }
//! # }
//! let cities = vec![
//!     City { name: "Oslo".into(), population: 700_000 },
//!     City { name: "Bergen".into(), population: 290_000 },
//!     City { name: "Odda".into(), population: 7_000 },
//! ];
//!
//! let mut query = Query::<City>::new();
//! query.filter_mut().add("Name", "O", ComparisonType::StartsWith);
//! query.filter_mut().add_expression("Population > 10000", Default::default());
//! query.sort_mut().order_by("Name");
//!
//! let compiled = query.compile(&EngineConfig::default())?;
//! let found = compiled.execute(InMemoryQueryable::new(cities))?;
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].name, "Oslo");
//! # Ok::<(), query_spec::QueryError>(())
//! ```

pub mod ast;
pub mod builders;
pub mod compiler;
pub mod config;
pub mod criteria;
pub mod entity;
pub mod error;
pub mod evaluators;
pub mod expression;
pub mod lexer;
pub mod logging;
pub mod member;
pub mod parser;
pub mod printer;
pub mod query;
pub mod queryable;
pub mod serialization;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{AstNode, BinaryOperator, Operator, Token, TokenKind, UnaryOperator};
pub use builders::{
    EntityFilterBuilder, FilterEntry, IncludeBuilder, QuerySelectBuilder, SortOrderBuilder,
    SqlLikeSearchCriteriaBuilder,
};
pub use compiler::ExpressionCompiler;
pub use config::{EngineConfig, StringComparison};
pub use criteria::{
    ComparisonType, FilterCriteria, IncludeDirective, LogicalOperator, SearchCriteria,
    SelectDescriptor, SortCriteria, SortDirection,
};
pub use entity::{Entity, EntityRef, EntityType, PropertyInfo, PropertyKind};
pub use error::{QueryError, Result};
pub use evaluators::{Evaluated, Evaluator, SpecificationEvaluator};
pub use expression::{Expression, LikePattern, Predicate, Projection, SortKey, SortOrder};
pub use lexer::{LexError, Lexer};
pub use member::{MemberAccessor, MemberPath};
pub use parser::{ParseError, Parser};
pub use query::{CompiledQuery, PostProcessor, Query};
pub use queryable::{InMemoryQueryable, QueryHints, Queryable};
pub use serialization::{FilterDocument, QueryDocument, SortDocument};
pub use value::{FromValue, Record, RecordExt, Value};

/// Parses filter-expression text into a syntax tree.
pub fn parse_filter(text: &str) -> Result<AstNode> {
    Ok(Parser::new(Lexer::new(text))?.parse()?)
}

/// Parses and compiles filter-expression text against `T` with the default
/// configuration.
pub fn compile_filter<T: Entity>(text: &str) -> Result<Predicate<T>> {
    ExpressionCompiler::new(&EngineConfig::default()).compile_text::<T>(text)
}
