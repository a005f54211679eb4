//! The evaluator pipeline.
//!
//! Each evaluator translates one part of a [`CompiledQuery`] into operations
//! on a [`Queryable`]. Evaluators hold no state, never materialize the
//! sequence, and pass it through untouched when their part is absent.
//! [`SpecificationEvaluator`] applies them in a fixed order: hints and
//! includes first, then filtering, searching, and sorting, then paging, and
//! the projection last since it changes the element type.

mod filter;
mod hints;
mod include;
mod order;
mod paging;
mod projection;

pub use filter::{SearchEvaluator, WhereEvaluator};
pub use hints::{AsNoTrackingEvaluator, AsSplitQueryEvaluator, IgnoreQueryFiltersEvaluator};
pub use include::IncludeEvaluator;
pub use order::OrderEvaluator;
pub use paging::PaginationEvaluator;
pub use projection::ProjectionEvaluator;

use crate::{entity::Entity, query::CompiledQuery, queryable::Queryable};

/// A single-responsibility, element-type-preserving pipeline stage.
pub trait Evaluator {
    fn name(&self) -> &'static str;

    fn evaluate<T: Entity, R: Entity, Q: Queryable<T>>(
        &self,
        query: Q,
        spec: &CompiledQuery<T, R>,
    ) -> Q;
}

/// A sequence that has been through the pipeline.
///
/// `Entities` is the untouched entity sequence of a query without a select;
/// `Projected` is the sequence after the provider's `select`.
#[derive(Debug)]
pub enum Evaluated<Q, P> {
    Entities(Q),
    Projected(P),
}

impl<Q, P> Evaluated<Q, P> {
    pub fn is_projected(&self) -> bool {
        matches!(self, Evaluated::Projected(_))
    }

    pub fn into_entities(self) -> Option<Q> {
        match self {
            Evaluated::Entities(entities) => Some(entities),
            Evaluated::Projected(_) => None,
        }
    }

    pub fn into_projected(self) -> Option<P> {
        match self {
            Evaluated::Entities(_) => None,
            Evaluated::Projected(projected) => Some(projected),
        }
    }
}

/// Applies every evaluator to a sequence in the fixed pipeline order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecificationEvaluator {
    no_tracking: AsNoTrackingEvaluator,
    split_query: AsSplitQueryEvaluator,
    include: IncludeEvaluator,
    ignore_query_filters: IgnoreQueryFiltersEvaluator,
    filter: WhereEvaluator,
    search: SearchEvaluator,
    order: OrderEvaluator,
    paging: PaginationEvaluator,
    projection: ProjectionEvaluator,
}

impl SpecificationEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the stages in the order they run
    pub fn stages(&self) -> [&'static str; 9] {
        [
            self.no_tracking.name(),
            self.split_query.name(),
            self.include.name(),
            self.ignore_query_filters.name(),
            self.filter.name(),
            self.search.name(),
            self.order.name(),
            self.paging.name(),
            ProjectionEvaluator::NAME,
        ]
    }

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
        let query = self.no_tracking.evaluate(query, spec);
        let query = self.split_query.evaluate(query, spec);
        let query = self.include.evaluate(query, spec);
        let query = self.ignore_query_filters.evaluate(query, spec);
        let query = self.filter.evaluate(query, spec);
        let query = self.search.evaluate(query, spec);
        let query = self.order.evaluate(query, spec);
        let query = self.paging.evaluate(query, spec);
        self.projection.evaluate(query, spec)
    }
}
