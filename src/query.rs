//! The query specification aggregate.

use std::{
    any::{Any, TypeId},
    fmt,
    sync::Arc,
};

use tracing::debug;

use crate::{
    builders::{
        EntityFilterBuilder, IncludeBuilder, QuerySelectBuilder, SortOrderBuilder,
        SqlLikeSearchCriteriaBuilder,
    },
    config::EngineConfig,
    entity::Entity,
    error::{QueryError, Result},
    evaluators::{Evaluated, SpecificationEvaluator},
    expression::{Predicate, Projection, SortOrder},
    queryable::Queryable,
};

/// Transform applied to the materialized results.
pub type PostProcessor<R> = Arc<dyn Fn(Vec<R>) -> Vec<R> + Send + Sync>;

/// A declarative query over `T` producing `R`.
///
/// Holds at most one of each builder, created on first use, plus paging,
/// provider hints, and an optional post-processing transform. A query is
/// built by one caller through `&mut self` and then compiled; compiling does
/// not consume or change it.
///
/// # Examples
///
/// ```text
/// let mut query = Query::<Company>::new();
/// query.filter_mut().add("Name", "Acme", ComparisonType::Contains);
/// query.sort_mut().order_by("Name");
/// query.skip(10).take(5);
///
/// let page = query.compile(&EngineConfig::default())?.execute(InMemoryQueryable::new(companies))?;
/// ```
pub struct Query<T, R = T> {
    filter: Option<EntityFilterBuilder<T>>,
    sort: Option<SortOrderBuilder<T>>,
    select: Option<QuerySelectBuilder<T, R>>,
    search: Option<SqlLikeSearchCriteriaBuilder<T>>,
    include: Option<IncludeBuilder<T>>,
    skip: Option<usize>,
    take: Option<usize>,
    as_no_tracking: bool,
    as_split_query: bool,
    ignore_query_filters: bool,
    post_processing: Option<PostProcessor<R>>,
}

impl<T, R> Default for Query<T, R> {
    fn default() -> Self {
        Query {
            filter: None,
            sort: None,
            select: None,
            search: None,
            include: None,
            skip: None,
            take: None,
            as_no_tracking: false,
            as_split_query: false,
            ignore_query_filters: false,
            post_processing: None,
        }
    }
}

impl<T: Entity, R: Entity> Query<T, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_mut(&mut self) -> &mut EntityFilterBuilder<T> {
        self.filter.get_or_insert_with(EntityFilterBuilder::default)
    }

    pub fn sort_mut(&mut self) -> &mut SortOrderBuilder<T> {
        self.sort.get_or_insert_with(SortOrderBuilder::default)
    }

    pub fn select_mut(&mut self) -> &mut QuerySelectBuilder<T, R> {
        self.select.get_or_insert_with(QuerySelectBuilder::default)
    }

    pub fn search_mut(&mut self) -> &mut SqlLikeSearchCriteriaBuilder<T> {
        self.search.get_or_insert_with(SqlLikeSearchCriteriaBuilder::default)
    }

    pub fn include_mut(&mut self) -> &mut IncludeBuilder<T> {
        self.include.get_or_insert_with(IncludeBuilder::default)
    }

    pub fn filter_builder(&self) -> Option<&EntityFilterBuilder<T>> {
        self.filter.as_ref()
    }

    pub fn sort_builder(&self) -> Option<&SortOrderBuilder<T>> {
        self.sort.as_ref()
    }

    pub fn select_builder(&self) -> Option<&QuerySelectBuilder<T, R>> {
        self.select.as_ref()
    }

    pub fn search_builder(&self) -> Option<&SqlLikeSearchCriteriaBuilder<T>> {
        self.search.as_ref()
    }

    pub fn include_builder(&self) -> Option<&IncludeBuilder<T>> {
        self.include.as_ref()
    }

    pub fn skip(&mut self, count: usize) -> &mut Self {
        self.skip = Some(count);
        self
    }

    pub fn take(&mut self, count: usize) -> &mut Self {
        self.take = Some(count);
        self
    }

    pub fn skip_count(&self) -> Option<usize> {
        self.skip
    }

    pub fn take_count(&self) -> Option<usize> {
        self.take
    }

    pub fn as_no_tracking(&mut self, enabled: bool) -> &mut Self {
        self.as_no_tracking = enabled;
        self
    }

    pub fn as_split_query(&mut self, enabled: bool) -> &mut Self {
        self.as_split_query = enabled;
        self
    }

    pub fn ignore_query_filters(&mut self, enabled: bool) -> &mut Self {
        self.ignore_query_filters = enabled;
        self
    }

    pub fn is_no_tracking(&self) -> bool {
        self.as_no_tracking
    }

    pub fn is_split_query(&self) -> bool {
        self.as_split_query
    }

    pub fn ignores_query_filters(&self) -> bool {
        self.ignore_query_filters
    }

    /// Sets a transform run on the results after materialization.
    pub fn post_process(
        &mut self,
        transform: impl Fn(Vec<R>) -> Vec<R> + Send + Sync + 'static,
    ) -> &mut Self {
        self.post_processing = Some(Arc::new(transform));
        self
    }

    pub fn has_post_processing(&self) -> bool {
        self.post_processing.is_some()
    }

    /// Drops every builder, paging value, hint, and the post-processing step.
    pub fn clear(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// Compiles every part of the query against `T` (and `R`).
    ///
    /// Fails when `R` differs from `T` and nothing was selected, since there
    /// would be no way to produce an `R`.
    pub fn compile(&self, config: &EngineConfig) -> Result<CompiledQuery<T, R>> {
        let compiled = self.compile_parts(config)?;
        if compiled.projection.is_none() && TypeId::of::<T>() != TypeId::of::<R>() {
            return Err(QueryError::UsageOrder(format!(
                "a query producing {} from {} needs a select",
                R::entity_type().name(),
                T::entity_type().name()
            )));
        }

        let CompiledParts {
            filter,
            search,
            sort,
            projection,
            includes,
        } = compiled;
        debug!(
            entity = T::entity_type().name(),
            result = R::entity_type().name(),
            has_filter = filter.is_some(),
            has_search = search.is_some(),
            has_sort = sort.is_some(),
            includes = includes.len(),
            skip = ?self.skip,
            take = ?self.take,
            "compiled query"
        );

        Ok(CompiledQuery {
            filter,
            search,
            sort,
            projection,
            includes,
            skip: self.skip,
            take: self.take,
            as_no_tracking: self.as_no_tracking,
            as_split_query: self.as_split_query,
            ignore_query_filters: self.ignore_query_filters,
            post_processing: self.post_processing.clone(),
        })
    }

    /// Checks that every path, literal, and chain in the query is valid.
    pub fn validate(&self, config: &EngineConfig) -> Result<()> {
        self.compile_parts(config).map(|_| ())
    }

    fn compile_parts(&self, config: &EngineConfig) -> Result<CompiledParts<T, R>> {
        let filter = match &self.filter {
            Some(builder) => builder.build(config)?,
            None => None,
        };
        let search = match &self.search {
            Some(builder) => builder.build(config)?,
            None => None,
        };
        let sort = match &self.sort {
            Some(builder) => builder.build(config)?,
            None => None,
        };
        let projection = match &self.select {
            Some(builder) => builder.build(config)?,
            None => None,
        };
        let includes = match &self.include {
            Some(builder) => builder.build(config)?,
            None => Vec::new(),
        };
        Ok(CompiledParts {
            filter,
            search,
            sort,
            projection,
            includes,
        })
    }
}

struct CompiledParts<T, R> {
    filter: Option<Predicate<T>>,
    search: Option<Predicate<T>>,
    sort: Option<SortOrder<T>>,
    projection: Option<Projection<T, R>>,
    includes: Vec<String>,
}

impl<T, R> Clone for Query<T, R> {
    fn clone(&self) -> Self {
        Query {
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            select: self.select.clone(),
            search: self.search.clone(),
            include: self.include.clone(),
            skip: self.skip,
            take: self.take,
            as_no_tracking: self.as_no_tracking,
            as_split_query: self.as_split_query,
            ignore_query_filters: self.ignore_query_filters,
            post_processing: self.post_processing.clone(),
        }
    }
}

/// Equality of the declarative parts; the post-processing closure is ignored.
impl<T, R> PartialEq for Query<T, R> {
    fn eq(&self, other: &Self) -> bool {
        self.filter == other.filter
            && self.sort == other.sort
            && self.select == other.select
            && self.search == other.search
            && self.include == other.include
            && self.skip == other.skip
            && self.take == other.take
            && self.as_no_tracking == other.as_no_tracking
            && self.as_split_query == other.as_split_query
            && self.ignore_query_filters == other.ignore_query_filters
    }
}

impl<T, R> fmt::Debug for Query<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("select", &self.select)
            .field("search", &self.search)
            .field("include", &self.include)
            .field("skip", &self.skip)
            .field("take", &self.take)
            .field("as_no_tracking", &self.as_no_tracking)
            .field("as_split_query", &self.as_split_query)
            .field("ignore_query_filters", &self.ignore_query_filters)
            .field("post_processing", &self.post_processing.is_some())
            .finish()
    }
}

/// A query bound to its entity types, ready to apply to sequences.
///
/// Immutable and shareable across threads; applying it any number of times
/// never changes it.
pub struct CompiledQuery<T, R = T> {
    pub(crate) filter: Option<Predicate<T>>,
    pub(crate) search: Option<Predicate<T>>,
    pub(crate) sort: Option<SortOrder<T>>,
    pub(crate) projection: Option<Projection<T, R>>,
    pub(crate) includes: Vec<String>,
    pub(crate) skip: Option<usize>,
    pub(crate) take: Option<usize>,
    pub(crate) as_no_tracking: bool,
    pub(crate) as_split_query: bool,
    pub(crate) ignore_query_filters: bool,
    pub(crate) post_processing: Option<PostProcessor<R>>,
}

impl<T, R> CompiledQuery<T, R> {
    pub fn filter(&self) -> Option<&Predicate<T>> {
        self.filter.as_ref()
    }

    pub fn search(&self) -> Option<&Predicate<T>> {
        self.search.as_ref()
    }

    pub fn sort(&self) -> Option<&SortOrder<T>> {
        self.sort.as_ref()
    }

    /// The compiled select; `None` means entities are returned whole.
    pub fn projection(&self) -> Option<&Projection<T, R>> {
        self.projection.as_ref()
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn skip(&self) -> Option<usize> {
        self.skip
    }

    pub fn take(&self) -> Option<usize> {
        self.take
    }

    pub fn as_no_tracking(&self) -> bool {
        self.as_no_tracking
    }

    pub fn as_split_query(&self) -> bool {
        self.as_split_query
    }

    pub fn ignore_query_filters(&self) -> bool {
        self.ignore_query_filters
    }
}

impl<T: Entity, R: Entity> CompiledQuery<T, R> {
    /// Runs the evaluator pipeline over `source` without materializing it.
    pub fn apply<Q: Queryable<T>>(&self, source: Q) -> Evaluated<Q, Q::Projected<R>> {
        self.apply_with(&SpecificationEvaluator::default(), source)
    }

    pub fn apply_with<Q: Queryable<T>>(
        &self,
        evaluator: &SpecificationEvaluator,
        source: Q,
    ) -> Evaluated<Q, Q::Projected<R>> {
        evaluator.evaluate(source, self)
    }

    /// Applies the query, materializes the results, and post-processes them.
    pub fn execute<Q: Queryable<T>>(&self, source: Q) -> Result<Vec<R>> {
        let results = match self.apply(source) {
            Evaluated::Entities(entities) => as_results(entities.to_list()?)?,
            Evaluated::Projected(projected) => projected.to_list()?,
        };
        Ok(self.post_process(results))
    }

    pub async fn execute_async<Q>(&self, source: Q) -> Result<Vec<R>>
    where
        Q: Queryable<T> + Send,
        Q::Projected<R>: Send,
    {
        let results = match self.apply(source) {
            Evaluated::Entities(entities) => as_results(entities.to_list_async().await?)?,
            Evaluated::Projected(projected) => projected.to_list_async().await?,
        };
        Ok(self.post_process(results))
    }

    fn post_process(&self, results: Vec<R>) -> Vec<R> {
        match &self.post_processing {
            Some(transform) => transform(results),
            None => results,
        }
    }
}

/// Hands back unprojected entities as results; only valid when `R` is `T`.
fn as_results<T: Entity, R: Entity>(entities: Vec<T>) -> Result<Vec<R>> {
    let entities: Box<dyn Any> = Box::new(entities);
    entities
        .downcast::<Vec<R>>()
        .map(|results| *results)
        .map_err(|_| {
            QueryError::Materialization(format!(
                "Query over '{}' has no select but returns '{}'",
                T::entity_type().name(),
                R::entity_type().name()
            ))
        })
}

impl<T, R> Clone for CompiledQuery<T, R> {
    fn clone(&self) -> Self {
        CompiledQuery {
            filter: self.filter.clone(),
            search: self.search.clone(),
            sort: self.sort.clone(),
            projection: self.projection.clone(),
            includes: self.includes.clone(),
            skip: self.skip,
            take: self.take,
            as_no_tracking: self.as_no_tracking,
            as_split_query: self.as_split_query,
            ignore_query_filters: self.ignore_query_filters,
            post_processing: self.post_processing.clone(),
        }
    }
}

/// Structural equality; post-processing steps are equal when they are the same closure.
impl<T, R> PartialEq for CompiledQuery<T, R> {
    fn eq(&self, other: &Self) -> bool {
        let same_post_processing = match (&self.post_processing, &other.post_processing) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.filter == other.filter
            && self.search == other.search
            && self.sort == other.sort
            && self.projection == other.projection
            && self.includes == other.includes
            && self.skip == other.skip
            && self.take == other.take
            && self.as_no_tracking == other.as_no_tracking
            && self.as_split_query == other.as_split_query
            && self.ignore_query_filters == other.ignore_query_filters
            && same_post_processing
    }
}

impl<T, R> fmt::Debug for CompiledQuery<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("filter", &self.filter)
            .field("search", &self.search)
            .field("sort", &self.sort)
            .field("projection", &self.projection)
            .field("includes", &self.includes)
            .field("skip", &self.skip)
            .field("take", &self.take)
            .field("as_no_tracking", &self.as_no_tracking)
            .field("as_split_query", &self.as_split_query)
            .field("ignore_query_filters", &self.ignore_query_filters)
            .finish()
    }
}
