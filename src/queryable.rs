//! The queryable-sequence contract and an in-memory provider.
//!
//! A [`Queryable`] records operations without running them; only `to_list`
//! (or `to_list_async`) materializes results. Providers backed by a remote
//! store implement the same trait and translate the compiled artifacts into
//! their own query language.

use std::{fmt, future::Future};

use tracing::trace;

use crate::{
    entity::Entity,
    error::Result,
    expression::{Predicate, Projection, SortKey, SortOrder},
};

/// A lazily evaluated, composable sequence of `T`.
pub trait Queryable<T: Entity>: Sized {
    /// The sequence produced by a projection onto `R`
    type Projected<R: Entity>: Queryable<R>;

    fn filter(self, predicate: Predicate<T>) -> Self;

    /// Starts a new ordering with `key` as the primary key.
    fn order_by(self, key: SortKey<T>) -> Self;

    /// Adds a tie-breaker to the current ordering.
    fn then_by(self, key: SortKey<T>) -> Self;

    fn skip(self, count: usize) -> Self;

    fn take(self, count: usize) -> Self;

    /// Loads the navigation at `path` along with each element.
    fn include(self, path: &str) -> Self;

    /// Read-only hint: results will not be tracked for changes.
    fn as_no_tracking(self) -> Self;

    /// Hint to load collection navigations with separate queries.
    fn as_split_query(self) -> Self;

    /// Disables the provider's global query filters for this sequence.
    fn ignore_query_filters(self) -> Self;

    fn select<R: Entity>(self, projection: Projection<T, R>) -> Self::Projected<R>;

    /// Runs the sequence and collects the results.
    fn to_list(self) -> Result<Vec<T>>;

    /// Asynchronous materialization; providers without async I/O run `to_list`.
    fn to_list_async(self) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        Self: Send,
    {
        async move { self.to_list() }
    }
}

/// Provider hints recorded on a sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryHints {
    pub no_tracking: bool,
    pub split_query: bool,
    pub ignore_query_filters: bool,
}

type Loader<T> = Box<dyn FnOnce() -> Result<Vec<T>> + Send>;

enum Source<T> {
    Items(Vec<T>),
    Deferred(Loader<T>),
}

enum Stage<T> {
    Filter(Predicate<T>),
    Order(SortOrder<T>),
    Skip(usize),
    Take(usize),
}

/// A [`Queryable`] over an in-memory collection.
///
/// Stages run in the order they were added when the sequence is
/// materialized. Global query filters registered with
/// [`with_query_filter`](Self::with_query_filter) run first unless
/// [`Queryable::ignore_query_filters`] was called. Includes and hints have
/// no effect in memory; they are recorded for inspection.
pub struct InMemoryQueryable<T> {
    source: Source<T>,
    query_filters: Vec<Predicate<T>>,
    stages: Vec<Stage<T>>,
    includes: Vec<String>,
    hints: QueryHints,
}

impl<T: Entity> InMemoryQueryable<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self::from_source(Source::Items(items))
    }

    fn from_source(source: Source<T>) -> Self {
        InMemoryQueryable {
            source,
            query_filters: Vec::new(),
            stages: Vec::new(),
            includes: Vec::new(),
            hints: QueryHints::default(),
        }
    }

    /// Registers a filter applied to every materialization of this sequence,
    /// like a provider-level global query filter.
    pub fn with_query_filter(mut self, predicate: Predicate<T>) -> Self {
        self.query_filters.push(predicate);
        self
    }

    pub fn hints(&self) -> QueryHints {
        self.hints
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// Number of pending stages (filters, orderings, skip and take)
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    fn load(self) -> Result<Vec<T>> {
        let InMemoryQueryable {
            source,
            query_filters,
            stages,
            hints,
            ..
        } = self;

        let mut items = match source {
            Source::Items(items) => items,
            Source::Deferred(loader) => loader()?,
        };

        if !hints.ignore_query_filters {
            for filter in &query_filters {
                items.retain(|item| filter.matches(item));
            }
        }

        for stage in stages {
            match stage {
                Stage::Filter(predicate) => items.retain(|item| predicate.matches(item)),
                Stage::Order(order) => items.sort_by(|a, b| order.compare(a, b)),
                Stage::Skip(count) => {
                    items.drain(..count.min(items.len()));
                }
                Stage::Take(count) => items.truncate(count),
            }
        }

        trace!(
            entity = T::entity_type().name(),
            count = items.len(),
            "materialized in-memory sequence"
        );
        Ok(items)
    }
}

impl<T: Entity> Queryable<T> for InMemoryQueryable<T> {
    type Projected<R: Entity> = InMemoryQueryable<R>;

    fn filter(mut self, predicate: Predicate<T>) -> Self {
        self.stages.push(Stage::Filter(predicate));
        self
    }

    fn order_by(mut self, key: SortKey<T>) -> Self {
        self.stages.push(Stage::Order(SortOrder::new(key)));
        self
    }

    fn then_by(mut self, key: SortKey<T>) -> Self {
        match self.stages.pop() {
            Some(Stage::Order(order)) => self.stages.push(Stage::Order(order.then(key))),
            other => {
                self.stages.extend(other);
                self.stages.push(Stage::Order(SortOrder::new(key)));
            }
        }
        self
    }

    fn skip(mut self, count: usize) -> Self {
        self.stages.push(Stage::Skip(count));
        self
    }

    fn take(mut self, count: usize) -> Self {
        self.stages.push(Stage::Take(count));
        self
    }

    fn include(mut self, path: &str) -> Self {
        self.includes.push(path.to_string());
        self
    }

    fn as_no_tracking(mut self) -> Self {
        self.hints.no_tracking = true;
        self
    }

    fn as_split_query(mut self) -> Self {
        self.hints.split_query = true;
        self
    }

    fn ignore_query_filters(mut self) -> Self {
        self.hints.ignore_query_filters = true;
        self
    }

    fn select<R: Entity>(self, projection: Projection<T, R>) -> InMemoryQueryable<R> {
        let hints = self.hints;
        let includes = self.includes.clone();
        let loader: Loader<R> = Box::new(move || {
            self.load()?
                .iter()
                .map(|item| projection.project(item))
                .collect()
        });

        let mut projected = InMemoryQueryable::from_source(Source::Deferred(loader));
        projected.hints = hints;
        projected.includes = includes;
        projected
    }

    fn to_list(self) -> Result<Vec<T>> {
        self.load()
    }
}

impl<T: Entity> From<Vec<T>> for InMemoryQueryable<T> {
    fn from(items: Vec<T>) -> Self {
        InMemoryQueryable::new(items)
    }
}

impl<T> fmt::Debug for InMemoryQueryable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::Items(items) => format!("{} items", items.len()),
            Source::Deferred(_) => "deferred".to_string(),
        };
        f.debug_struct("InMemoryQueryable")
            .field("source", &source)
            .field("query_filters", &self.query_filters.len())
            .field("stages", &self.stages.len())
            .field("includes", &self.includes)
            .field("hints", &self.hints)
            .finish()
    }
}
