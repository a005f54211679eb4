//! Member path resolution.
//!
//! A member path is a dotted chain of property names (`Address.City`).
//! Resolution walks [`EntityType`] metadata segment by segment; resolved
//! accessors for entity types are kept in a process-wide cache keyed by
//! `(TypeId, path)` since entity metadata never changes at runtime.

use std::{
    any::TypeId,
    fmt,
    marker::PhantomData,
    sync::{Arc, LazyLock},
};

use dashmap::DashMap;
use tracing::trace;

use crate::{
    entity::{Entity, EntityType, PropertyKind},
    error::{QueryError, Result},
    value::Value,
};

static ACCESSORS: LazyLock<DashMap<(TypeId, String), Arc<MemberAccessor>>> =
    LazyLock::new(DashMap::new);

/// A resolved member path: reads one (possibly nested) property of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccessor {
    root: &'static str,
    path: String,
    segments: Vec<&'static str>,
    kind: PropertyKind,
    nullable: bool,
}

impl MemberAccessor {
    /// Name of the entity type the path starts from
    pub fn root(&self) -> &'static str {
        self.root
    }

    /// The canonical dotted path
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[&'static str] {
        &self.segments
    }

    /// Declared kind of the final segment
    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    /// True when any segment along the path may be `null`
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Reads the member from an entity. A `null` navigation yields `Null`.
    pub fn read<T: Entity>(&self, entity: &T) -> Value {
        let mut segments = self.segments.iter();
        let Some(first) = segments.next() else {
            return Value::Null;
        };
        let mut current = entity.get(first).unwrap_or(Value::Null);
        for segment in segments {
            current = match current {
                Value::Record(mut record) => record.remove(*segment).unwrap_or(Value::Null),
                _ => return Value::Null,
            };
        }
        current
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').map(str::trim)
}

/// Resolves `path` against an entity type's metadata, bypassing the cache.
pub fn resolve_in(entity_type: &EntityType, path: &str) -> Result<MemberAccessor> {
    let mut current = entity_type;
    let mut segments = Vec::new();
    let mut nullable = false;
    let mut kind = None;

    for segment in split_path(path) {
        if let Some(previous) = &kind {
            current = match previous {
                PropertyKind::Entity(target) => target.get(),
                other => return Err(QueryError::member_not_found(other.to_string(), segment)),
            };
        }
        let property = current
            .property(segment)
            .ok_or_else(|| QueryError::member_not_found(current.name(), segment))?;
        segments.push(property.name());
        nullable |= property.is_nullable();
        kind = Some(property.kind().clone());
    }

    let kind = kind.ok_or_else(|| QueryError::member_not_found(entity_type.name(), path))?;
    Ok(MemberAccessor {
        root: entity_type.name(),
        path: segments.join("."),
        segments,
        kind,
        nullable,
    })
}

/// Resolves `path` against `T`, consulting the process-wide cache first.
pub fn resolve<T: Entity>(path: &str) -> Result<Arc<MemberAccessor>> {
    let key = (TypeId::of::<T>(), path.to_string());
    if let Some(hit) = ACCESSORS.get(&key) {
        return Ok(Arc::clone(hit.value()));
    }

    let accessor = Arc::new(resolve_in(T::entity_type(), path)?);
    trace!(entity = T::entity_type().name(), path, "resolved member path");
    ACCESSORS.insert(key, Arc::clone(&accessor));
    Ok(accessor)
}

/// Resolves a navigation path (reference or collection segments only) and
/// returns the entity type it ends on.
pub fn resolve_navigation(
    entity_type: &'static EntityType,
    path: &str,
) -> Result<&'static EntityType> {
    let mut current = entity_type;
    for segment in split_path(path) {
        let property = current
            .property(segment)
            .ok_or_else(|| QueryError::member_not_found(current.name(), segment))?;
        // Scalars are not navigations, so they are not found here either
        current = property
            .kind()
            .target_entity()
            .ok_or_else(|| QueryError::member_not_found(current.name(), segment))?;
    }
    Ok(current)
}

/// A validated member selector on `T`.
///
/// The typed counterpart of a property-name string: holding one proves the
/// path exists on `T`.
pub struct MemberPath<T> {
    accessor: Arc<MemberAccessor>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> MemberPath<T> {
    pub fn new(path: &str) -> Result<Self> {
        Ok(MemberPath {
            accessor: resolve::<T>(path)?,
            _entity: PhantomData,
        })
    }

    pub fn read(&self, entity: &T) -> Value {
        self.accessor.read(entity)
    }
}

impl<T> MemberPath<T> {
    pub fn path(&self) -> &str {
        self.accessor.path()
    }

    pub fn kind(&self) -> &PropertyKind {
        self.accessor.kind()
    }

    pub fn accessor(&self) -> &Arc<MemberAccessor> {
        &self.accessor
    }
}

impl<T> Clone for MemberPath<T> {
    fn clone(&self) -> Self {
        MemberPath {
            accessor: Arc::clone(&self.accessor),
            _entity: PhantomData,
        }
    }
}

impl<T> PartialEq for MemberPath<T> {
    fn eq(&self, other: &Self) -> bool {
        self.accessor == other.accessor
    }
}

impl<T> fmt::Debug for MemberPath<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberPath({}.{})", self.accessor.root, self.accessor.path)
    }
}
