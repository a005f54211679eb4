use tracing::trace;

use crate::{entity::Entity, query::CompiledQuery, queryable::Queryable};

use super::Evaluated;

/// Projects the sequence onto the result type.
///
/// Always the last stage. Without a compiled select the sequence is handed
/// back untouched; `Query::compile` guarantees that only happens when the
/// result type is the entity type.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionEvaluator;

impl ProjectionEvaluator {
    pub const NAME: &'static str = "projection";

    pub fn evaluate<T, R, Q>(
        &self,
        query: Q,
        spec: &CompiledQuery<T, R>,
    ) -> Evaluated<Q, Q::Projected<R>>
    where
        T: Entity,
        R: Entity,
        Q: Queryable<T>,
    {
        match spec.projection() {
            Some(projection) => {
                trace!(evaluator = Self::NAME, ?projection, "applying projection");
                Evaluated::Projected(query.select(projection.clone()))
            }
            None => Evaluated::Entities(query),
        }
    }
}
