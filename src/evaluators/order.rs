use tracing::trace;

use super::Evaluator;
use crate::{entity::Entity, query::CompiledQuery, queryable::Queryable};

/// Orders by the primary key, then by each tie-breaker.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderEvaluator;

impl Evaluator for OrderEvaluator {
    fn name(&self) -> &'static str {
        "order"
    }

    fn evaluate<T: Entity, R: Entity, Q: Queryable<T>>(
        &self,
        query: Q,
        spec: &CompiledQuery<T, R>,
    ) -> Q {
        let Some(order) = spec.sort() else {
            return query;
        };
        trace!(evaluator = self.name(), ?order, "applying sort order");

        let mut keys = order.keys().iter().cloned();
        let Some(primary) = keys.next() else {
            return query;
        };
        keys.fold(query.order_by(primary), |query, key| query.then_by(key))
    }
}
