use std::marker::PhantomData;

use crate::{
    compiler::ExpressionCompiler,
    config::EngineConfig,
    criteria::{SortCriteria, SortDirection},
    entity::Entity,
    error::{QueryError, Result},
    expression::SortOrder,
};

/// Accumulates ordering keys.
///
/// The first entry is the primary order; every later entry breaks ties of
/// the ones before it.
///
/// # Examples
///
/// ```text
/// let mut sort = SortOrderBuilder::<Company>::new();
/// sort.order_by("Name").then_by_descending("Id")?;
/// ```
pub struct SortOrderBuilder<T> {
    entries: Vec<SortCriteria>,
    _entity: PhantomData<fn() -> T>,
}

entry_builder_traits!(SortOrderBuilder<T>);

impl<T> SortOrderBuilder<T> {
    /// Appends a key: primary when the builder is empty, secondary otherwise.
    pub fn add(&mut self, path: &str, direction: SortDirection) -> &mut Self {
        let is_first = self.entries.is_empty();
        self.entries.push(SortCriteria {
            property_path: path.trim().to_string(),
            direction,
            is_first,
        });
        self
    }

    /// Starts a new ordering, discarding any previous keys.
    pub fn order_by(&mut self, path: &str) -> &mut Self {
        self.entries.clear();
        self.add(path, SortDirection::Ascending)
    }

    pub fn order_by_descending(&mut self, path: &str) -> &mut Self {
        self.entries.clear();
        self.add(path, SortDirection::Descending)
    }

    pub fn then_by(&mut self, path: &str) -> Result<&mut Self> {
        self.chain(path, SortDirection::Ascending)
    }

    pub fn then_by_descending(&mut self, path: &str) -> Result<&mut Self> {
        self.chain(path, SortDirection::Descending)
    }

    fn chain(&mut self, path: &str, direction: SortDirection) -> Result<&mut Self> {
        if self.entries.is_empty() {
            return Err(QueryError::UsageOrder(format!(
                "then_by('{path}') requires a preceding order_by"
            )));
        }
        Ok(self.add(path, direction))
    }

    pub fn entries(&self) -> &[SortCriteria] {
        &self.entries
    }
}

impl<T: Entity> SortOrderBuilder<T> {
    pub fn build(&self, config: &EngineConfig) -> Result<Option<SortOrder<T>>> {
        ExpressionCompiler::new(config).compile_sort(&self.entries)
    }
}
