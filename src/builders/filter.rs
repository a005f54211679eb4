use std::fmt;

use tracing::{debug, warn};

use crate::{
    compiler::{ExpressionCompiler, coerce, fold},
    config::EngineConfig,
    criteria::{ComparisonType, FilterCriteria, LogicalOperator},
    entity::{Entity, PropertyKind},
    error::Result,
    expression::{Expression, NamedPredicate, Predicate},
    member::{self, MemberPath},
    value::Value,
};

/// One entry of a filter: a criteria, filter-expression text, or a closure.
///
/// Each entry carries the operator joining it to the entry after it.
pub enum FilterEntry<T> {
    Criteria(FilterCriteria),
    Expression {
        text: String,
        logical_operator_to_next: LogicalOperator,
    },
    Predicate {
        predicate: NamedPredicate<T>,
        logical_operator_to_next: LogicalOperator,
    },
}

impl<T> FilterEntry<T> {
    pub fn logical_operator_to_next(&self) -> LogicalOperator {
        match self {
            FilterEntry::Criteria(criteria) => criteria.logical_operator_to_next,
            FilterEntry::Expression {
                logical_operator_to_next,
                ..
            }
            | FilterEntry::Predicate {
                logical_operator_to_next,
                ..
            } => *logical_operator_to_next,
        }
    }
}

impl<T> Clone for FilterEntry<T> {
    fn clone(&self) -> Self {
        match self {
            FilterEntry::Criteria(criteria) => FilterEntry::Criteria(criteria.clone()),
            FilterEntry::Expression {
                text,
                logical_operator_to_next,
            } => FilterEntry::Expression {
                text: text.clone(),
                logical_operator_to_next: *logical_operator_to_next,
            },
            FilterEntry::Predicate {
                predicate,
                logical_operator_to_next,
            } => FilterEntry::Predicate {
                predicate: predicate.clone(),
                logical_operator_to_next: *logical_operator_to_next,
            },
        }
    }
}

impl<T> PartialEq for FilterEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FilterEntry::Criteria(a), FilterEntry::Criteria(b)) => a == b,
            (
                FilterEntry::Expression {
                    text,
                    logical_operator_to_next,
                },
                FilterEntry::Expression {
                    text: text2,
                    logical_operator_to_next: op2,
                },
            ) => text == text2 && logical_operator_to_next == op2,
            (
                FilterEntry::Predicate {
                    predicate,
                    logical_operator_to_next,
                },
                FilterEntry::Predicate {
                    predicate: predicate2,
                    logical_operator_to_next: op2,
                },
            ) => predicate == predicate2 && logical_operator_to_next == op2,
            _ => false,
        }
    }
}

impl<T> fmt::Debug for FilterEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterEntry::Criteria(criteria) => fmt::Debug::fmt(criteria, f),
            FilterEntry::Expression {
                text,
                logical_operator_to_next,
            } => write!(f, "Expression({text:?}, {logical_operator_to_next:?})"),
            FilterEntry::Predicate {
                predicate,
                logical_operator_to_next,
            } => write!(f, "{predicate:?} {logical_operator_to_next:?}"),
        }
    }
}

/// Accumulates filter entries that fold into one predicate.
///
/// Entries combine strictly left to right using each entry's operator, with
/// no precedence between `And` and `Or`: `[a Or, b And, c]` is `(a || b) && c`.
/// Group conditions by writing them as one expression entry instead.
///
/// A blank property name (or a `None` member) is ignored rather than
/// rejected, so callers can add optional conditions without branching.
pub struct EntityFilterBuilder<T> {
    entries: Vec<FilterEntry<T>>,
}

impl<T> Default for EntityFilterBuilder<T> {
    fn default() -> Self {
        EntityFilterBuilder {
            entries: Vec::new(),
        }
    }
}

impl<T> Clone for EntityFilterBuilder<T> {
    fn clone(&self) -> Self {
        EntityFilterBuilder {
            entries: self.entries.clone(),
        }
    }
}

impl<T> PartialEq for EntityFilterBuilder<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T> fmt::Debug for EntityFilterBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityFilterBuilder")
            .field("entries", &self.entries)
            .finish()
    }
}

impl<T: Entity> EntityFilterBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path <comparison> value`, joined to the next entry with `And`.
    pub fn add(
        &mut self,
        path: &str,
        value: impl Into<Value>,
        comparison: ComparisonType,
    ) -> &mut Self {
        self.add_with_operator(path, value, comparison, LogicalOperator::And)
    }

    pub fn add_with_operator(
        &mut self,
        path: &str,
        value: impl Into<Value>,
        comparison: ComparisonType,
        operator: LogicalOperator,
    ) -> &mut Self {
        if path.trim().is_empty() {
            warn!(?comparison, "ignoring filter criteria with a blank property name");
            return self;
        }

        let mut criteria = FilterCriteria::new(path.trim(), value, comparison).with_operator(operator);

        // Resolution and coercion failures are reported by `build`
        if let Ok(accessor) = member::resolve::<T>(&criteria.property_path) {
            let (target, nullable) = if comparison.is_substring() {
                (&PropertyKind::String, false)
            } else {
                (accessor.kind(), accessor.is_nullable())
            };
            if let Ok(coerced) = coerce(&criteria.value, target, nullable) {
                criteria.value = coerced;
            }
            criteria.property_type = Some(accessor.kind().clone());
        }

        self.entries.push(FilterEntry::Criteria(criteria));
        self
    }

    /// Adds a condition on a typed member selector; `None` is ignored.
    pub fn add_member(
        &mut self,
        member: Option<&MemberPath<T>>,
        value: impl Into<Value>,
        comparison: ComparisonType,
        operator: LogicalOperator,
    ) -> &mut Self {
        match member {
            Some(member) => self.add_with_operator(member.path(), value, comparison, operator),
            None => {
                warn!(?comparison, "ignoring filter criteria without a member");
                self
            }
        }
    }

    /// Adds a filter expression in the text grammar, e.g. `Id > 10 && Active`.
    ///
    /// The text is parsed when the builder is built.
    pub fn add_expression(&mut self, text: &str, operator: LogicalOperator) -> &mut Self {
        self.entries.push(FilterEntry::Expression {
            text: text.to_string(),
            logical_operator_to_next: operator,
        });
        self
    }

    /// Adds an arbitrary predicate closure.
    ///
    /// A query holding one cannot be serialized.
    pub fn add_predicate(
        &mut self,
        name: &str,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
        operator: LogicalOperator,
    ) -> &mut Self {
        self.entries.push(FilterEntry::Predicate {
            predicate: NamedPredicate::new(name, predicate),
            logical_operator_to_next: operator,
        });
        self
    }

    pub fn entries(&self) -> &[FilterEntry<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) -> &mut Self {
        self.entries.clear();
        self
    }

    /// Compiles all entries into one predicate; `None` when empty.
    pub fn build(&self, config: &EngineConfig) -> Result<Option<Predicate<T>>> {
        let compiler = ExpressionCompiler::new(config);
        let parts = self
            .entries
            .iter()
            .map(|entry| {
                let expression = match entry {
                    FilterEntry::Criteria(criteria) => compiler.compile_criteria::<T>(criteria)?,
                    FilterEntry::Expression { text, .. } => {
                        compiler.compile_text::<T>(text)?.into_expression()
                    }
                    FilterEntry::Predicate { predicate, .. } => {
                        Expression::Custom(predicate.clone())
                    }
                };
                Ok((expression, entry.logical_operator_to_next()))
            })
            .collect::<Result<Vec<_>>>()?;

        let predicate = fold(parts).map(Predicate::new);
        if let Some(predicate) = &predicate {
            debug!(entity = T::entity_type().name(), %predicate, "built filter");
        }
        Ok(predicate)
    }
}
