use tracing::trace;

use super::Evaluator;
use crate::{entity::Entity, query::CompiledQuery, queryable::Queryable};

/// Adds the query's navigation includes in declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeEvaluator;

impl Evaluator for IncludeEvaluator {
    fn name(&self) -> &'static str {
        "include"
    }

    fn evaluate<T: Entity, R: Entity, Q: Queryable<T>>(
        &self,
        query: Q,
        spec: &CompiledQuery<T, R>,
    ) -> Q {
        spec.includes().iter().fold(query, |query, path| {
            trace!(evaluator = self.name(), path = %path, "including navigation");
            query.include(path)
        })
    }
}
