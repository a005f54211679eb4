use std::marker::PhantomData;

use crate::{
    compiler::ExpressionCompiler,
    config::EngineConfig,
    criteria::SelectDescriptor,
    entity::Entity,
    error::{QueryError, Result},
    expression::Projection,
};

/// Accumulates the members a query projects from `T` onto `R`.
///
/// `select` copies a member to the property of the same path on `R`;
/// `select_as` copies it to a differently named property.
pub struct QuerySelectBuilder<T, R> {
    entries: Vec<SelectDescriptor>,
    _entity: PhantomData<fn() -> (T, R)>,
}

entry_builder_traits!(QuerySelectBuilder<T, R>);

impl<T, R> QuerySelectBuilder<T, R> {
    /// Starts a new projection with a pass-through member.
    pub fn select(&mut self, path: &str) -> &mut Self {
        self.entries.clear();
        self.entries.push(SelectDescriptor::pass_through(path.trim()));
        self
    }

    /// Starts a new projection mapping `assignor` on `T` to `assignee` on `R`.
    pub fn select_as(&mut self, assignor: &str, assignee: &str) -> &mut Self {
        self.entries.clear();
        self.entries
            .push(SelectDescriptor::new(assignor.trim(), assignee.trim()));
        self
    }

    pub fn then_select(&mut self, path: &str) -> Result<&mut Self> {
        self.chain(SelectDescriptor::pass_through(path.trim()))
    }

    pub fn then_select_as(&mut self, assignor: &str, assignee: &str) -> Result<&mut Self> {
        self.chain(SelectDescriptor::new(assignor.trim(), assignee.trim()))
    }

    /// Appends a descriptor as-is (used when reading the wire format).
    pub fn push(&mut self, descriptor: SelectDescriptor) -> &mut Self {
        self.entries.push(descriptor);
        self
    }

    fn chain(&mut self, descriptor: SelectDescriptor) -> Result<&mut Self> {
        if self.entries.is_empty() {
            return Err(QueryError::UsageOrder(format!(
                "then_select('{}') requires a preceding select",
                descriptor.assignor
            )));
        }
        self.entries.push(descriptor);
        Ok(self)
    }

    pub fn entries(&self) -> &[SelectDescriptor] {
        &self.entries
    }
}

impl<T: Entity, R: Entity> QuerySelectBuilder<T, R> {
    /// Compiles the projection; `None` when nothing was selected.
    pub fn build(&self, config: &EngineConfig) -> Result<Option<Projection<T, R>>> {
        ExpressionCompiler::new(config).compile_projection(&self.entries)
    }
}
