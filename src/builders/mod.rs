//! Fluent accumulators of declarative criteria.
//!
//! Builders only collect plain criteria; nothing is resolved or validated
//! until `build` compiles the entries against the entity type. Calls that
//! continue a chain (`then_by`, `then_select`, `then_include`) return a
//! [`QueryError::UsageOrder`](crate::QueryError::UsageOrder) when the chain
//! has not been started.

/// Implements `Default`, `Clone`, `PartialEq` and `Debug` for a builder that
/// holds `entries` plus a `_entity` type marker, without bounds on the
/// marker's type parameters.
macro_rules! entry_builder_traits {
    ($builder:ident < $($param:ident),+ >) => {
        impl<$($param),+> Default for $builder<$($param),+> {
            fn default() -> Self {
                $builder {
                    entries: Vec::new(),
                    _entity: std::marker::PhantomData,
                }
            }
        }

        impl<$($param),+> Clone for $builder<$($param),+> {
            fn clone(&self) -> Self {
                $builder {
                    entries: self.entries.clone(),
                    _entity: std::marker::PhantomData,
                }
            }
        }

        impl<$($param),+> PartialEq for $builder<$($param),+> {
            fn eq(&self, other: &Self) -> bool {
                self.entries == other.entries
            }
        }

        impl<$($param),+> std::fmt::Debug for $builder<$($param),+> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($builder))
                    .field("entries", &self.entries)
                    .finish()
            }
        }

        impl<$($param),+> $builder<$($param),+> {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn len(&self) -> usize {
                self.entries.len()
            }

            pub fn is_empty(&self) -> bool {
                self.entries.is_empty()
            }

            /// Removes every entry
            pub fn clear(&mut self) -> &mut Self {
                self.entries.clear();
                self
            }
        }
    };
}

mod filter;
mod include;
mod search;
mod select;
mod sort;

pub use filter::{EntityFilterBuilder, FilterEntry};
pub use include::IncludeBuilder;
pub use search::SqlLikeSearchCriteriaBuilder;
pub use select::QuerySelectBuilder;
pub use sort::SortOrderBuilder;
