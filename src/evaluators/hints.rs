use tracing::trace;

use super::Evaluator;
use crate::{entity::Entity, query::CompiledQuery, queryable::Queryable};

/// Marks the sequence read-only when the query asks for no tracking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsNoTrackingEvaluator;

impl Evaluator for AsNoTrackingEvaluator {
    fn name(&self) -> &'static str {
        "as_no_tracking"
    }

    fn evaluate<T: Entity, R: Entity, Q: Queryable<T>>(
        &self,
        query: Q,
        spec: &CompiledQuery<T, R>,
    ) -> Q {
        if !spec.as_no_tracking() {
            return query;
        }
        trace!(evaluator = self.name(), "applying hint");
        query.as_no_tracking()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AsSplitQueryEvaluator;

impl Evaluator for AsSplitQueryEvaluator {
    fn name(&self) -> &'static str {
        "as_split_query"
    }

    fn evaluate<T: Entity, R: Entity, Q: Queryable<T>>(
        &self,
        query: Q,
        spec: &CompiledQuery<T, R>,
    ) -> Q {
        if !spec.as_split_query() {
            return query;
        }
        trace!(evaluator = self.name(), "applying hint");
        query.as_split_query()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreQueryFiltersEvaluator;

impl Evaluator for IgnoreQueryFiltersEvaluator {
    fn name(&self) -> &'static str {
        "ignore_query_filters"
    }

    fn evaluate<T: Entity, R: Entity, Q: Queryable<T>>(
        &self,
        query: Q,
        spec: &CompiledQuery<T, R>,
    ) -> Q {
        if !spec.ignore_query_filters() {
            return query;
        }
        trace!(evaluator = self.name(), "applying hint");
        query.ignore_query_filters()
    }
}
