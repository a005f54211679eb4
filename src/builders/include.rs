use std::marker::PhantomData;

use crate::{
    compiler::ExpressionCompiler,
    config::EngineConfig,
    criteria::IncludeDirective,
    entity::Entity,
    error::{QueryError, Result},
};

/// Accumulates navigations to load with the entity.
///
/// `then_include` continues from the navigation named just before it, so
/// `include("Employees").then_include("Address")` loads `Employees.Address`.
pub struct IncludeBuilder<T> {
    entries: Vec<IncludeDirective>,
    _entity: PhantomData<fn() -> T>,
}

entry_builder_traits!(IncludeBuilder<T>);

impl<T> IncludeBuilder<T> {
    pub fn include(&mut self, path: &str) -> &mut Self {
        self.entries.push(IncludeDirective {
            navigation_path: path.trim().to_string(),
            is_chained: false,
        });
        self
    }

    pub fn then_include(&mut self, path: &str) -> Result<&mut Self> {
        if self.entries.is_empty() {
            return Err(QueryError::UsageOrder(format!(
                "then_include('{path}') requires a preceding include"
            )));
        }
        self.entries.push(IncludeDirective {
            navigation_path: path.trim().to_string(),
            is_chained: true,
        });
        Ok(self)
    }

    pub fn entries(&self) -> &[IncludeDirective] {
        &self.entries
    }
}

impl<T: Entity> IncludeBuilder<T> {
    /// Resolves the directives into full navigation paths, in declaration order.
    pub fn build(&self, config: &EngineConfig) -> Result<Vec<String>> {
        ExpressionCompiler::new(config).compile_includes::<T>(&self.entries)
    }
}
