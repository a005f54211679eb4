//! Compiled, executable query artifacts.
//!
//! Everything the compiler produces is plain data bound to an entity type:
//! expression trees over resolved members, sort keys, and projections. They
//! evaluate against entities directly and compare structurally, so compiling
//! the same declarative input twice yields equal artifacts.

use std::{cmp::Ordering, fmt, marker::PhantomData, sync::Arc};

use regex::Regex;

use crate::{
    ast::BinaryOperator,
    config::StringComparison,
    criteria::{ComparisonType, LogicalOperator, SortDirection},
    entity::Entity,
    error::{QueryError, Result},
    member::{MemberAccessor, MemberPath},
    value::{Record, Value},
};

/// Equality and relational comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl CompareOp {
    pub fn from_binary(op: BinaryOperator) -> Option<Self> {
        match op {
            BinaryOperator::Equal => Some(CompareOp::Equal),
            BinaryOperator::NotEqual => Some(CompareOp::NotEqual),
            BinaryOperator::GreaterThan => Some(CompareOp::GreaterThan),
            BinaryOperator::GreaterOrEqual => Some(CompareOp::GreaterOrEqual),
            BinaryOperator::LessThan => Some(CompareOp::LessThan),
            BinaryOperator::LessOrEqual => Some(CompareOp::LessOrEqual),
            BinaryOperator::And | BinaryOperator::Or => None,
        }
    }

    pub fn from_comparison(comparison: ComparisonType) -> Option<Self> {
        match comparison {
            ComparisonType::EqualTo => Some(CompareOp::Equal),
            ComparisonType::NotEqualTo => Some(CompareOp::NotEqual),
            ComparisonType::GreaterThan => Some(CompareOp::GreaterThan),
            ComparisonType::GreaterOrEqual => Some(CompareOp::GreaterOrEqual),
            ComparisonType::LessThan => Some(CompareOp::LessThan),
            ComparisonType::LessOrEqual => Some(CompareOp::LessOrEqual),
            _ => None,
        }
    }

    pub fn is_relational(self) -> bool {
        !matches!(self, CompareOp::Equal | CompareOp::NotEqual)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterOrEqual => ">=",
            CompareOp::LessThan => "<",
            CompareOp::LessOrEqual => "<=",
        }
    }

    /// `null == null` holds; any relational comparison involving `null` is false.
    pub fn apply(self, left: &Value, right: &Value) -> bool {
        match self {
            CompareOp::Equal => left == right,
            CompareOp::NotEqual => left != right,
            _ if left.is_null() || right.is_null() => false,
            _ => match left.compare(right) {
                Some(ordering) => match self {
                    CompareOp::GreaterThan => ordering == Ordering::Greater,
                    CompareOp::GreaterOrEqual => ordering != Ordering::Less,
                    CompareOp::LessThan => ordering == Ordering::Less,
                    CompareOp::LessOrEqual => ordering != Ordering::Greater,
                    CompareOp::Equal | CompareOp::NotEqual => false,
                },
                None => false,
            },
        }
    }
}

/// Substring predicates available on string members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringMethod {
    Contains,
    StartsWith,
    EndsWith,
}

impl StringMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Contains" => Some(StringMethod::Contains),
            "StartsWith" => Some(StringMethod::StartsWith),
            "EndsWith" => Some(StringMethod::EndsWith),
            _ => None,
        }
    }

    pub fn from_comparison(comparison: ComparisonType) -> Option<Self> {
        match comparison {
            ComparisonType::Contains => Some(StringMethod::Contains),
            ComparisonType::StartsWith => Some(StringMethod::StartsWith),
            ComparisonType::EndsWith => Some(StringMethod::EndsWith),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StringMethod::Contains => "Contains",
            StringMethod::StartsWith => "StartsWith",
            StringMethod::EndsWith => "EndsWith",
        }
    }

    pub fn apply(self, haystack: &str, needle: &str, comparison: StringComparison) -> bool {
        if comparison.ignores_case() {
            return self.apply(
                &haystack.to_lowercase(),
                &needle.to_lowercase(),
                StringComparison::Ordinal,
            );
        }
        match self {
            StringMethod::Contains => haystack.contains(needle),
            StringMethod::StartsWith => haystack.starts_with(needle),
            StringMethod::EndsWith => haystack.ends_with(needle),
        }
    }
}

/// A SQL LIKE pattern (`%` any run, `_` any single character).
#[derive(Clone)]
pub struct LikePattern {
    pattern: String,
    comparison: StringComparison,
    regex: Regex,
}

impl LikePattern {
    pub fn new(pattern: &str, comparison: StringComparison) -> Result<Self> {
        let mut source = String::from(if comparison.ignores_case() {
            "(?is)^"
        } else {
            "(?s)^"
        });
        for ch in pattern.chars() {
            match ch {
                '%' => source.push_str(".*"),
                '_' => source.push('.'),
                other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        source.push('$');

        let regex = Regex::new(&source)
            .map_err(|_| QueryError::coercion("LIKE pattern", Value::from(pattern).to_string()))?;
        Ok(LikePattern {
            pattern: pattern.to_string(),
            comparison,
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.comparison == other.comparison
    }
}

impl fmt::Debug for LikePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LikePattern")
            .field("pattern", &self.pattern)
            .field("comparison", &self.comparison)
            .finish()
    }
}

/// A caller-supplied predicate closure, identified by name.
///
/// Two named predicates are equal when their names are.
pub struct NamedPredicate<T> {
    name: String,
    func: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> NamedPredicate<T> {
    pub fn new(name: impl Into<String>, func: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        NamedPredicate {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, entity: &T) -> bool {
        (self.func)(entity)
    }
}

impl<T> Clone for NamedPredicate<T> {
    fn clone(&self) -> Self {
        NamedPredicate {
            name: self.name.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<T> PartialEq for NamedPredicate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> fmt::Debug for NamedPredicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamedPredicate({})", self.name)
    }
}

/// Executable expression tree over entities of type `T`.
pub enum Expression<T> {
    Constant(Value),
    Member(MemberPath<T>),
    Not(Box<Expression<T>>),
    Compare {
        op: CompareOp,
        left: Box<Expression<T>>,
        right: Box<Expression<T>>,
    },
    Logical {
        op: LogicalOperator,
        left: Box<Expression<T>>,
        right: Box<Expression<T>>,
    },
    StringMatch {
        method: StringMethod,
        target: Box<Expression<T>>,
        argument: Box<Expression<T>>,
        comparison: StringComparison,
    },
    Like {
        target: Box<Expression<T>>,
        pattern: LikePattern,
    },
    Custom(NamedPredicate<T>),
}

impl<T: Entity> Expression<T> {
    pub fn evaluate(&self, entity: &T) -> Value {
        match self {
            Expression::Constant(value) => value.clone(),
            Expression::Member(member) => member.read(entity),
            Expression::Not(operand) => match operand.evaluate(entity).as_bool() {
                Some(b) => Value::Boolean(!b),
                None => Value::Null,
            },
            Expression::Compare { op, left, right } => {
                Value::Boolean(op.apply(&left.evaluate(entity), &right.evaluate(entity)))
            }
            Expression::Logical { op, left, right } => {
                let left = left.evaluate(entity).as_bool() == Some(true);
                let result = match op {
                    LogicalOperator::And => left && right.evaluate(entity).as_bool() == Some(true),
                    LogicalOperator::Or => left || right.evaluate(entity).as_bool() == Some(true),
                };
                Value::Boolean(result)
            }
            Expression::StringMatch {
                method,
                target,
                argument,
                comparison,
            } => {
                let matched = match (target.evaluate(entity), argument.evaluate(entity)) {
                    (Value::String(haystack), Value::String(needle)) => {
                        method.apply(&haystack, &needle, *comparison)
                    }
                    _ => false,
                };
                Value::Boolean(matched)
            }
            Expression::Like { target, pattern } => {
                let matched = target
                    .evaluate(entity)
                    .as_str()
                    .is_some_and(|text| pattern.is_match(text));
                Value::Boolean(matched)
            }
            Expression::Custom(predicate) => Value::Boolean(predicate.call(entity)),
        }
    }
}

impl<T> Expression<T> {
    pub fn logical(op: LogicalOperator, left: Expression<T>, right: Expression<T>) -> Self {
        Expression::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// True when the tree contains a closure and so has no textual form.
    pub fn has_custom(&self) -> bool {
        match self {
            Expression::Custom(_) => true,
            Expression::Constant(_) | Expression::Member(_) => false,
            Expression::Not(operand) => operand.has_custom(),
            Expression::Compare { left, right, .. } | Expression::Logical { left, right, .. } => {
                left.has_custom() || right.has_custom()
            }
            Expression::StringMatch {
                target, argument, ..
            } => target.has_custom() || argument.has_custom(),
            Expression::Like { target, .. } => target.has_custom(),
        }
    }
}

impl<T> Clone for Expression<T> {
    fn clone(&self) -> Self {
        match self {
            Expression::Constant(value) => Expression::Constant(value.clone()),
            Expression::Member(member) => Expression::Member(member.clone()),
            Expression::Not(operand) => Expression::Not(operand.clone()),
            Expression::Compare { op, left, right } => Expression::Compare {
                op: *op,
                left: left.clone(),
                right: right.clone(),
            },
            Expression::Logical { op, left, right } => Expression::Logical {
                op: *op,
                left: left.clone(),
                right: right.clone(),
            },
            Expression::StringMatch {
                method,
                target,
                argument,
                comparison,
            } => Expression::StringMatch {
                method: *method,
                target: target.clone(),
                argument: argument.clone(),
                comparison: *comparison,
            },
            Expression::Like { target, pattern } => Expression::Like {
                target: target.clone(),
                pattern: pattern.clone(),
            },
            Expression::Custom(predicate) => Expression::Custom(predicate.clone()),
        }
    }
}

impl<T> PartialEq for Expression<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expression::Constant(a), Expression::Constant(b)) => a == b,
            (Expression::Member(a), Expression::Member(b)) => a == b,
            (Expression::Not(a), Expression::Not(b)) => a == b,
            (
                Expression::Compare { op, left, right },
                Expression::Compare {
                    op: op2,
                    left: left2,
                    right: right2,
                },
            ) => op == op2 && left == left2 && right == right2,
            (
                Expression::Logical { op, left, right },
                Expression::Logical {
                    op: op2,
                    left: left2,
                    right: right2,
                },
            ) => op == op2 && left == left2 && right == right2,
            (
                Expression::StringMatch {
                    method,
                    target,
                    argument,
                    comparison,
                },
                Expression::StringMatch {
                    method: method2,
                    target: target2,
                    argument: argument2,
                    comparison: comparison2,
                },
            ) => {
                method == method2
                    && target == target2
                    && argument == argument2
                    && comparison == comparison2
            }
            (
                Expression::Like { target, pattern },
                Expression::Like {
                    target: target2,
                    pattern: pattern2,
                },
            ) => target == target2 && pattern == pattern2,
            (Expression::Custom(a), Expression::Custom(b)) => a == b,
            _ => false,
        }
    }
}

/// Text form in the filter grammar (closures print as `<name>`).
impl<T> fmt::Display for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(value) => write!(f, "{value}"),
            Expression::Member(member) => write!(f, "{}", member.path()),
            Expression::Not(operand) => write!(f, "!{operand}"),
            Expression::Compare { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            Expression::Logical { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            Expression::StringMatch {
                method,
                target,
                argument,
                ..
            } => write!(f, "{target}.{}({argument})", method.name()),
            Expression::Like { target, pattern } => {
                write!(f, "{target} LIKE {}", Value::from(pattern.pattern()))
            }
            Expression::Custom(predicate) => write!(f, "<{}>", predicate.name()),
        }
    }
}

impl<T> fmt::Debug for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expression({self})")
    }
}

/// A boolean expression used as a filter.
pub struct Predicate<T> {
    expression: Expression<T>,
}

impl<T> Predicate<T> {
    pub fn new(expression: Expression<T>) -> Self {
        Predicate { expression }
    }

    /// Wraps a closure; the name stands in for it in comparisons and logs.
    pub fn from_fn(
        name: impl Into<String>,
        func: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Predicate::new(Expression::Custom(NamedPredicate::new(name, func)))
    }

    pub fn expression(&self) -> &Expression<T> {
        &self.expression
    }

    pub fn into_expression(self) -> Expression<T> {
        self.expression
    }

    pub fn and(self, other: Predicate<T>) -> Self {
        Predicate::new(Expression::logical(
            LogicalOperator::And,
            self.expression,
            other.expression,
        ))
    }

    pub fn or(self, other: Predicate<T>) -> Self {
        Predicate::new(Expression::logical(
            LogicalOperator::Or,
            self.expression,
            other.expression,
        ))
    }
}

impl<T: Entity> Predicate<T> {
    pub fn matches(&self, entity: &T) -> bool {
        self.expression.evaluate(entity).as_bool() == Some(true)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Predicate::new(self.expression.clone())
    }
}

impl<T> PartialEq for Predicate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.expression)
    }
}

impl<T> fmt::Display for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expression, f)
    }
}

/// One ordering key: a member and a direction.
pub struct SortKey<T> {
    member: MemberPath<T>,
    direction: SortDirection,
}

impl<T> SortKey<T> {
    pub fn new(member: MemberPath<T>, direction: SortDirection) -> Self {
        SortKey { member, direction }
    }

    pub fn member(&self) -> &MemberPath<T> {
        &self.member
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

impl<T: Entity> SortKey<T> {
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        let ordering = self.member.read(a).sort_cmp(&self.member.read(b));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl<T> Clone for SortKey<T> {
    fn clone(&self) -> Self {
        SortKey::new(self.member.clone(), self.direction)
    }
}

impl<T> PartialEq for SortKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.member == other.member && self.direction == other.direction
    }
}

impl<T> fmt::Debug for SortKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SortKey({} {:?})", self.member.path(), self.direction)
    }
}

/// A primary sort key followed by tie-breakers, in order.
pub struct SortOrder<T> {
    keys: Vec<SortKey<T>>,
}

impl<T> SortOrder<T> {
    pub fn new(primary: SortKey<T>) -> Self {
        SortOrder {
            keys: vec![primary],
        }
    }

    pub fn then(mut self, key: SortKey<T>) -> Self {
        self.keys.push(key);
        self
    }

    pub fn keys(&self) -> &[SortKey<T>] {
        &self.keys
    }
}

impl<T: Entity> SortOrder<T> {
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.keys
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl<T> Clone for SortOrder<T> {
    fn clone(&self) -> Self {
        SortOrder {
            keys: self.keys.clone(),
        }
    }
}

impl<T> PartialEq for SortOrder<T> {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}

impl<T> fmt::Debug for SortOrder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.keys).finish()
    }
}

/// Copies one source member into one (possibly nested) result property.
pub struct ProjectionBinding<T> {
    source: MemberPath<T>,
    target: Arc<MemberAccessor>,
}

impl<T> ProjectionBinding<T> {
    pub fn new(source: MemberPath<T>, target: Arc<MemberAccessor>) -> Self {
        ProjectionBinding { source, target }
    }

    pub fn source(&self) -> &MemberPath<T> {
        &self.source
    }

    pub fn target_path(&self) -> &str {
        self.target.path()
    }
}

impl<T> Clone for ProjectionBinding<T> {
    fn clone(&self) -> Self {
        ProjectionBinding::new(self.source.clone(), Arc::clone(&self.target))
    }
}

impl<T> PartialEq for ProjectionBinding<T> {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.target == other.target
    }
}

impl<T> fmt::Debug for ProjectionBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source.path(), self.target.path())
    }
}

/// Maps entities of `T` onto results of `R`, one binding per selected member.
pub struct Projection<T, R> {
    bindings: Vec<ProjectionBinding<T>>,
    _result: PhantomData<fn() -> R>,
}

impl<T, R> Projection<T, R> {
    pub fn members(bindings: Vec<ProjectionBinding<T>>) -> Self {
        Projection {
            bindings,
            _result: PhantomData,
        }
    }

    pub fn bindings(&self) -> &[ProjectionBinding<T>] {
        &self.bindings
    }
}

impl<T: Entity, R: Entity> Projection<T, R> {
    pub fn project(&self, entity: &T) -> Result<R> {
        let mut record = Record::new();
        for binding in &self.bindings {
            insert_at(
                &mut record,
                binding.target.segments(),
                binding.source.read(entity),
            );
        }
        R::from_record(&record)
    }
}

fn insert_at(record: &mut Record, segments: &[&'static str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            record.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let entry = record
                .entry(first.to_string())
                .or_insert_with(|| Value::Record(Record::new()));
            if !matches!(entry, Value::Record(_)) {
                *entry = Value::Record(Record::new());
            }
            if let Value::Record(inner) = entry {
                insert_at(inner, rest, value);
            }
        }
    }
}

impl<T, R> Clone for Projection<T, R> {
    fn clone(&self) -> Self {
        Projection::members(self.bindings.clone())
    }
}

impl<T, R> PartialEq for Projection<T, R> {
    fn eq(&self, other: &Self) -> bool {
        self.bindings == other.bindings
    }
}

impl<T, R> fmt::Debug for Projection<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.bindings).finish()
    }
}
