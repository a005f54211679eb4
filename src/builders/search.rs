use std::marker::PhantomData;

use tracing::warn;

use crate::{
    compiler::ExpressionCompiler,
    config::EngineConfig,
    criteria::SearchCriteria,
    entity::Entity,
    error::Result,
    expression::Predicate,
    member::MemberPath,
};

/// Accumulates free-text search terms.
///
/// All terms combine with OR into one predicate that matches when any
/// searched member contains its term (SQL `LIKE '%term%'`). Blank terms are
/// skipped so callers can pass user input through unconditionally.
pub struct SqlLikeSearchCriteriaBuilder<T> {
    entries: Vec<SearchCriteria>,
    _entity: PhantomData<fn() -> T>,
}

entry_builder_traits!(SqlLikeSearchCriteriaBuilder<T>);

impl<T> SqlLikeSearchCriteriaBuilder<T> {
    pub fn add(&mut self, path: &str, search_term: &str) -> &mut Self {
        if search_term.trim().is_empty() {
            warn!(path, "skipping blank search term");
            return self;
        }
        self.entries.push(SearchCriteria {
            property_path: path.trim().to_string(),
            search_term: search_term.trim().to_string(),
        });
        self
    }

    pub fn add_member(&mut self, member: &MemberPath<T>, search_term: &str) -> &mut Self {
        self.add(member.path(), search_term)
    }

    pub fn entries(&self) -> &[SearchCriteria] {
        &self.entries
    }
}

impl<T: Entity> SqlLikeSearchCriteriaBuilder<T> {
    pub fn build(&self, config: &EngineConfig) -> Result<Option<Predicate<T>>> {
        ExpressionCompiler::new(config).compile_search(&self.entries)
    }
}
