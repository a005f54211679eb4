use tracing::trace;

use super::Evaluator;
use crate::{entity::Entity, query::CompiledQuery, queryable::Queryable};

/// Applies the composite filter predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhereEvaluator;

impl Evaluator for WhereEvaluator {
    fn name(&self) -> &'static str {
        "where"
    }

    fn evaluate<T: Entity, R: Entity, Q: Queryable<T>>(
        &self,
        query: Q,
        spec: &CompiledQuery<T, R>,
    ) -> Q {
        match spec.filter() {
            Some(predicate) => {
                trace!(evaluator = self.name(), %predicate, "applying filter");
                query.filter(predicate.clone())
            }
            None => query,
        }
    }
}

/// Applies the search predicate as a filter stage of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchEvaluator;

impl Evaluator for SearchEvaluator {
    fn name(&self) -> &'static str {
        "search"
    }

    fn evaluate<T: Entity, R: Entity, Q: Queryable<T>>(
        &self,
        query: Q,
        spec: &CompiledQuery<T, R>,
    ) -> Q {
        match spec.search() {
            Some(predicate) => {
                trace!(evaluator = self.name(), %predicate, "applying search");
                query.filter(predicate.clone())
            }
            None => query,
        }
    }
}
