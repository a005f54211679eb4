use tracing::trace;

use super::Evaluator;
use crate::{entity::Entity, query::CompiledQuery, queryable::Queryable};

/// Applies skip, then take.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationEvaluator;

impl Evaluator for PaginationEvaluator {
    fn name(&self) -> &'static str {
        "pagination"
    }

    fn evaluate<T: Entity, R: Entity, Q: Queryable<T>>(
        &self,
        query: Q,
        spec: &CompiledQuery<T, R>,
    ) -> Q {
        let query = match spec.skip() {
            Some(count) => {
                trace!(evaluator = self.name(), skip = count);
                query.skip(count)
            }
            None => query,
        };
        match spec.take() {
            Some(count) => {
                trace!(evaluator = self.name(), take = count);
                query.take(count)
            }
            None => query,
        }
    }
}
