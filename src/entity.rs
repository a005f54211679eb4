//! Entity metadata.
//!
//! Rust has no runtime reflection, so every queryable type describes itself
//! through an [`EntityType`]: its name and the kind of each public property.
//! Member paths arriving as text or JSON are resolved against this metadata.

use std::fmt;

use crate::{
    criteria::ComparisonType,
    error::Result,
    member,
    value::{Record, Value},
};

/// A type that can be filtered, sorted, and projected by the query engine.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use query_spec::{Entity, EntityType, PropertyKind, Record, RecordExt, Value};
///
/// #[derive(Clone)]
/// struct Tag {
///     label: String,
/// }
///
/// static TAG: LazyLock<EntityType> =
///     LazyLock::new(|| EntityType::new("Tag").with_property("Label", PropertyKind::String));
///
/// impl Entity for Tag {
///     fn entity_type() -> &'static EntityType {
///         &TAG
///     }
///
///     fn get(&self, property: &str) -> Option<Value> {
///         match property {
///             "Label" => Some(self.label.clone().into()),
///             _ => None,
///         }
///     }
///
///     fn from_record(record: &Record) -> query_spec::Result<Self> {
///         Ok(Tag { label: record.value_of("Label").unwrap_or_default() })
///     }
/// }
///
/// assert_eq!(Tag::entity_type().name(), "Tag");
/// ```
pub trait Entity: Clone + Send + Sync + 'static {
    /// Property metadata of this type
    fn entity_type() -> &'static EntityType;

    /// Reads a property by its declared name.
    ///
    /// Reference navigations return [`Value::Record`], collections
    /// [`Value::List`], and absent optional values [`Value::Null`].
    fn get(&self, property: &str) -> Option<Value>;

    /// Builds an instance from property values, as produced by a projection.
    ///
    /// Properties missing from `record` take their default.
    fn from_record(record: &Record) -> Result<Self>;

    /// All declared properties as a record
    fn to_record(&self) -> Record {
        Self::entity_type()
            .properties()
            .iter()
            .filter_map(|p| self.get(p.name()).map(|v| (p.name().to_string(), v)))
            .collect()
    }
}

/// Lazily resolved reference to another entity's metadata.
///
/// Holds a function rather than the metadata itself so self-referencing and
/// mutually referencing types can be declared in statics.
#[derive(Clone, Copy)]
pub struct EntityRef(fn() -> &'static EntityType);

impl EntityRef {
    pub fn of<E: Entity>() -> Self {
        EntityRef(E::entity_type)
    }

    pub fn get(&self) -> &'static EntityType {
        (self.0)()
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.get(), other.get())
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef({})", self.get().name())
    }
}

/// Declared type of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Boolean,
    Integer,
    Float,
    Decimal,
    String,
    DateTime,
    /// Enumeration, with its variant names in declaration order
    Enum(&'static [&'static str]),
    /// Reference navigation to another entity
    Entity(EntityRef),
    /// Collection navigation
    Collection(Box<PropertyKind>),
}

impl PropertyKind {
    pub fn entity<E: Entity>() -> Self {
        PropertyKind::Entity(EntityRef::of::<E>())
    }

    pub fn collection_of<E: Entity>() -> Self {
        PropertyKind::Collection(Box::new(PropertyKind::entity::<E>()))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PropertyKind::Integer | PropertyKind::Float | PropertyKind::Decimal
        )
    }

    /// Numeric and date kinds, the ones relational operators apply to
    pub fn is_orderable(&self) -> bool {
        self.is_numeric() || matches!(self, PropertyKind::DateTime)
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self, PropertyKind::Entity(_) | PropertyKind::Collection(_))
    }

    /// The entity a navigation leads to, looking through collections.
    pub fn target_entity(&self) -> Option<&'static EntityType> {
        match self {
            PropertyKind::Entity(target) => Some(target.get()),
            PropertyKind::Collection(inner) => inner.target_entity(),
            _ => None,
        }
    }

    /// Whether a value of kind `source` can be assigned to this kind.
    pub fn accepts(&self, source: &PropertyKind) -> bool {
        match (self, source) {
            (PropertyKind::Float, PropertyKind::Integer)
            | (PropertyKind::Decimal, PropertyKind::Integer)
            | (PropertyKind::Float, PropertyKind::Decimal)
            | (PropertyKind::Decimal, PropertyKind::Float) => true,
            (PropertyKind::String, PropertyKind::Enum(_)) => true,
            (target, source) => target == source,
        }
    }

    /// Whether two kinds can be compared with each other.
    pub fn comparable_with(&self, other: &PropertyKind) -> bool {
        (self.is_numeric() && other.is_numeric()) || self.accepts(other) || other.accepts(self)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Boolean => write!(f, "Boolean"),
            PropertyKind::Integer => write!(f, "Integer"),
            PropertyKind::Float => write!(f, "Float"),
            PropertyKind::Decimal => write!(f, "Decimal"),
            PropertyKind::String => write!(f, "String"),
            PropertyKind::DateTime => write!(f, "DateTime"),
            PropertyKind::Enum(variants) => write!(f, "Enum({})", variants.join("|")),
            PropertyKind::Entity(target) => write!(f, "{}", target.get().name()),
            PropertyKind::Collection(inner) => write!(f, "Collection<{inner}>"),
        }
    }
}

/// Metadata of one public property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    name: &'static str,
    kind: PropertyKind,
    nullable: bool,
}

impl PropertyInfo {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// Property metadata of an entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityType {
    name: &'static str,
    properties: Vec<PropertyInfo>,
}

impl EntityType {
    pub fn new(name: &'static str) -> Self {
        EntityType {
            name,
            properties: Vec::new(),
        }
    }

    /// Declares a required property
    pub fn with_property(mut self, name: &'static str, kind: PropertyKind) -> Self {
        self.properties.push(PropertyInfo {
            name,
            kind,
            nullable: false,
        });
        self
    }

    /// Declares a property that may hold `null`
    pub fn with_nullable_property(mut self, name: &'static str, kind: PropertyKind) -> Self {
        self.properties.push(PropertyInfo {
            name,
            kind,
            nullable: true,
        });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    /// Looks up a property by its exact name.
    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// The comparison types valid for the property at `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use query_spec::{ComparisonType, EntityType, PropertyKind};
    ///
    /// let company = EntityType::new("Company")
    ///     .with_property("Id", PropertyKind::Integer)
    ///     .with_property("Name", PropertyKind::String);
    ///
    /// let ops = company.valid_comparison_operators("Name").unwrap();
    /// assert!(ops.contains(&ComparisonType::Contains));
    /// assert!(!ops.contains(&ComparisonType::GreaterThan));
    /// ```
    pub fn valid_comparison_operators(&self, path: &str) -> Result<&'static [ComparisonType]> {
        let accessor = member::resolve_in(self, path)?;
        Ok(accessor.kind().valid_comparison_operators())
    }
}
