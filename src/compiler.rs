//! Compilation of filter expressions and declarative criteria.
//!
//! The compiler binds untyped input (an [`AstNode`], criteria lists) to an
//! entity type `T`: member paths are resolved against `T`'s metadata and
//! literals are coerced to the kind of the member they are compared with.
//! Every error surfaces here, before a query ever runs.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    ast::{AstNode, BinaryOperator, UnaryOperator},
    config::EngineConfig,
    criteria::{
        FilterCriteria, IncludeDirective, LogicalOperator, SearchCriteria, SelectDescriptor,
        SortCriteria,
    },
    entity::{Entity, PropertyKind},
    error::{QueryError, Result},
    expression::{
        CompareOp, Expression, LikePattern, Predicate, Projection, ProjectionBinding, SortKey,
        SortOrder, StringMethod,
    },
    lexer::Lexer,
    member::{self, MemberPath},
    parser::Parser,
    printer::to_normalized,
    value::Value,
};

/// What the compiler knows statically about a compiled sub-expression.
enum Shape {
    /// Result of a comparison, logical operation, or method call
    Boolean,
    Member { kind: PropertyKind, nullable: bool },
    Literal(Value),
}

impl Shape {
    fn is_boolean(&self) -> bool {
        match self {
            Shape::Boolean => true,
            Shape::Member { kind, .. } => *kind == PropertyKind::Boolean,
            Shape::Literal(value) => matches!(value, Value::Boolean(_)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Shape::Boolean => PropertyKind::Boolean.to_string(),
            Shape::Member { kind, .. } => kind.to_string(),
            Shape::Literal(value) => value.type_name().to_string(),
        }
    }
}

struct Typed<T> {
    expression: Expression<T>,
    shape: Shape,
}

/// Compiles filter text, ASTs, and criteria into executable artifacts.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionCompiler<'c> {
    config: &'c EngineConfig,
}

impl<'c> ExpressionCompiler<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        ExpressionCompiler { config }
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Parses filter text and compiles it against `T`.
    pub fn compile_text<T: Entity>(&self, text: &str) -> Result<Predicate<T>> {
        debug!(entity = T::entity_type().name(), text, "compiling filter expression");
        let ast = Parser::new(Lexer::new(text))?
            .with_max_depth(self.config.max_expression_depth)
            .parse()?;
        self.compile_predicate(&ast)
    }

    /// Compiles a parsed filter expression against `T`.
    ///
    /// The expression as a whole must be boolean.
    pub fn compile_predicate<T: Entity>(&self, ast: &AstNode) -> Result<Predicate<T>> {
        let typed = self.compile_node::<T>(ast)?;
        if !typed.shape.is_boolean() {
            return Err(QueryError::coercion("Boolean", to_normalized(ast)));
        }
        debug!(
            entity = T::entity_type().name(),
            predicate = %typed.expression,
            "compiled filter expression"
        );
        Ok(Predicate::new(typed.expression))
    }

    fn compile_node<T: Entity>(&self, node: &AstNode) -> Result<Typed<T>> {
        match node {
            AstNode::Constant { value } => Ok(Typed {
                expression: Expression::Constant(value.clone()),
                shape: Shape::Literal(value.clone()),
            }),
            AstNode::Member { path } => {
                let member = MemberPath::<T>::new(&path.join("."))?;
                let shape = Shape::Member {
                    kind: member.kind().clone(),
                    nullable: member.accessor().is_nullable(),
                };
                Ok(Typed {
                    expression: Expression::Member(member),
                    shape,
                })
            }
            AstNode::Unary {
                operator: UnaryOperator::Not,
                operand,
            } => {
                let operand = self.require_boolean::<T>(operand)?;
                Ok(Typed {
                    expression: Expression::Not(Box::new(operand)),
                    shape: Shape::Boolean,
                })
            }
            AstNode::Binary {
                operator,
                left,
                right,
            } => match operator {
                BinaryOperator::And | BinaryOperator::Or => {
                    let op = if *operator == BinaryOperator::And {
                        LogicalOperator::And
                    } else {
                        LogicalOperator::Or
                    };
                    let left = self.require_boolean::<T>(left)?;
                    let right = self.require_boolean::<T>(right)?;
                    Ok(Typed {
                        expression: Expression::logical(op, left, right),
                        shape: Shape::Boolean,
                    })
                }
                comparison => self.compile_comparison(*comparison, left, right),
            },
            AstNode::MethodCall {
                target,
                method_name,
                arguments,
            } => self.compile_method(target.as_deref(), method_name, arguments),
        }
    }

    fn require_boolean<T: Entity>(&self, node: &AstNode) -> Result<Expression<T>> {
        let typed = self.compile_node::<T>(node)?;
        if typed.shape.is_boolean() {
            Ok(typed.expression)
        } else {
            Err(QueryError::coercion("Boolean", to_normalized(node)))
        }
    }

    fn compile_comparison<T: Entity>(
        &self,
        operator: BinaryOperator,
        left_node: &AstNode,
        right_node: &AstNode,
    ) -> Result<Typed<T>> {
        let op = CompareOp::from_binary(operator)
            .ok_or_else(|| QueryError::invalid_comparison(operator.symbol(), "Boolean"))?;
        let left = self.compile_node::<T>(left_node)?;
        let right = self.compile_node::<T>(right_node)?;

        let (left, right) = match (left.shape, right.shape) {
            (Shape::Boolean, other) | (other, Shape::Boolean) => {
                if op.is_relational() {
                    return Err(QueryError::invalid_comparison(op.symbol(), "Boolean"));
                }
                if !other.is_boolean() {
                    return Err(QueryError::coercion(
                        "Boolean",
                        to_normalized(&AstNode::binary(
                            operator,
                            left_node.clone(),
                            right_node.clone(),
                        )),
                    ));
                }
                (left.expression, right.expression)
            }
            (Shape::Member { kind, nullable }, Shape::Literal(value)) => {
                check_operator(op, &kind)?;
                let value = coerce(&value, &kind, nullable)?;
                (left.expression, Expression::Constant(value))
            }
            (Shape::Literal(value), Shape::Member { kind, nullable }) => {
                check_operator(op, &kind)?;
                let value = coerce(&value, &kind, nullable)?;
                (Expression::Constant(value), right.expression)
            }
            (Shape::Member { kind: a, .. }, Shape::Member { kind: b, .. }) => {
                check_operator(op, &a)?;
                if !a.comparable_with(&b) {
                    return Err(QueryError::invalid_comparison(
                        op.symbol(),
                        format!("{a} and {b}"),
                    ));
                }
                (left.expression, right.expression)
            }
            (Shape::Literal(a), Shape::Literal(b)) => {
                if op.is_relational() && !a.is_null() && !b.is_null() && a.compare(&b).is_none() {
                    return Err(QueryError::invalid_comparison(
                        op.symbol(),
                        format!("{} and {}", a.type_name(), b.type_name()),
                    ));
                }
                (left.expression, right.expression)
            }
        };

        Ok(Typed {
            expression: Expression::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            shape: Shape::Boolean,
        })
    }

    fn compile_method<T: Entity>(
        &self,
        target: Option<&AstNode>,
        name: &str,
        arguments: &[AstNode],
    ) -> Result<Typed<T>> {
        let method = StringMethod::from_name(name).ok_or_else(|| QueryError::UnsupportedMethod {
            name: name.to_string(),
        })?;
        let target = target.ok_or_else(|| QueryError::invalid_comparison(name, "<none>"))?;
        let [argument] = arguments else {
            return Err(QueryError::UnsupportedMethod {
                name: format!("{name}/{}", arguments.len()),
            });
        };

        let target = self.compile_node::<T>(target)?;
        match &target.shape {
            Shape::Member {
                kind: PropertyKind::String,
                ..
            } => {}
            other => return Err(QueryError::invalid_comparison(name, other.describe())),
        }

        let compiled = self.compile_node::<T>(argument)?;
        let argument = match compiled.shape {
            Shape::Literal(value) => Expression::Constant(coerce(&value, &PropertyKind::String, false)?),
            Shape::Member {
                kind: PropertyKind::String,
                ..
            } => compiled.expression,
            _ => return Err(QueryError::coercion("String", to_normalized(argument))),
        };

        Ok(Typed {
            expression: Expression::StringMatch {
                method,
                target: Box::new(target.expression),
                argument: Box::new(argument),
                comparison: self.config.string_comparison,
            },
            shape: Shape::Boolean,
        })
    }

    /// Compiles one criteria into a boolean expression.
    pub fn compile_criteria<T: Entity>(&self, criteria: &FilterCriteria) -> Result<Expression<T>> {
        let member = MemberPath::<T>::new(&criteria.property_path)?;
        let kind = member.kind().clone();
        let comparison = criteria.comparison_type;

        if !kind.valid_comparison_operators().contains(&comparison) {
            return Err(QueryError::invalid_comparison(
                comparison.to_string(),
                kind.to_string(),
            ));
        }

        if let Some(method) = StringMethod::from_comparison(comparison) {
            let needle = coerce(&criteria.value, &PropertyKind::String, false)?;
            return Ok(Expression::StringMatch {
                method,
                target: Box::new(Expression::Member(member)),
                argument: Box::new(Expression::Constant(needle)),
                comparison: self.config.string_comparison,
            });
        }

        let op = CompareOp::from_comparison(comparison).ok_or_else(|| {
            QueryError::invalid_comparison(comparison.to_string(), kind.to_string())
        })?;
        let value = coerce(&criteria.value, &kind, member.accessor().is_nullable())?;
        Ok(Expression::Compare {
            op,
            left: Box::new(Expression::Member(member)),
            right: Box::new(Expression::Constant(value)),
        })
    }

    /// Compiles sort criteria in list order; the first entry is the primary key.
    pub fn compile_sort<T: Entity>(&self, criteria: &[SortCriteria]) -> Result<Option<SortOrder<T>>> {
        let mut order: Option<SortOrder<T>> = None;
        for entry in criteria {
            let member = MemberPath::<T>::new(&entry.property_path)?;
            if member.kind().is_navigation() {
                return Err(QueryError::invalid_comparison(
                    "OrderBy",
                    member.kind().to_string(),
                ));
            }
            let key = SortKey::new(member, entry.direction);
            order = Some(match order {
                None => SortOrder::new(key),
                Some(order) => order.then(key),
            });
        }
        Ok(order)
    }

    /// Compiles select descriptors into a projection from `T` onto `R`.
    ///
    /// Assignors resolve against `T`, assignees against `R`.
    pub fn compile_projection<T: Entity, R: Entity>(
        &self,
        descriptors: &[SelectDescriptor],
    ) -> Result<Option<Projection<T, R>>> {
        if descriptors.is_empty() {
            return Ok(None);
        }

        let bindings = descriptors
            .iter()
            .map(|descriptor| {
                let source = MemberPath::<T>::new(&descriptor.assignor)?;
                let target = member::resolve::<R>(&descriptor.assignee)?;
                if !target.kind().accepts(source.kind()) {
                    return Err(QueryError::coercion(
                        target.kind().to_string(),
                        descriptor.assignor.clone(),
                    ));
                }
                Ok(ProjectionBinding::new(source, target))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            source = T::entity_type().name(),
            result = R::entity_type().name(),
            bindings = bindings.len(),
            "compiled projection"
        );
        Ok(Some(Projection::members(bindings)))
    }

    /// Compiles search terms into one OR-combined LIKE `%term%` predicate.
    pub fn compile_search<T: Entity>(&self, criteria: &[SearchCriteria]) -> Result<Option<Predicate<T>>> {
        let mut parts = Vec::new();
        for entry in criteria.iter().filter(|c| !c.search_term.trim().is_empty()) {
            let member = MemberPath::<T>::new(&entry.property_path)?;
            if *member.kind() != PropertyKind::String {
                return Err(QueryError::invalid_comparison("Like", member.kind().to_string()));
            }
            let pattern = LikePattern::new(
                &format!("%{}%", entry.search_term.trim()),
                self.config.string_comparison,
            )?;
            parts.push((
                Expression::Like {
                    target: Box::new(Expression::Member(member)),
                    pattern,
                },
                LogicalOperator::Or,
            ));
        }
        Ok(fold(parts).map(Predicate::new))
    }

    /// Resolves include directives into full navigation paths.
    ///
    /// A chained directive extends the path emitted for the directive before
    /// it and replaces that path.
    pub fn compile_includes<T: Entity>(&self, directives: &[IncludeDirective]) -> Result<Vec<String>> {
        let mut paths: Vec<String> = Vec::new();
        for directive in directives {
            let path = if directive.is_chained {
                let previous = paths.pop().ok_or_else(|| {
                    QueryError::UsageOrder(format!(
                        "then_include('{}') requires a preceding include",
                        directive.navigation_path
                    ))
                })?;
                format!("{previous}.{}", directive.navigation_path.trim())
            } else {
                directive.navigation_path.trim().to_string()
            };
            member::resolve_navigation(T::entity_type(), &path)?;
            paths.push(path);
        }
        Ok(paths)
    }
}

/// Folds expressions strictly left to right: `((e1 op1 e2) op2 e3)`.
///
/// Each entry's operator joins it to the entry after it, so the last entry's
/// operator is unused.
pub fn fold<T>(parts: Vec<(Expression<T>, LogicalOperator)>) -> Option<Expression<T>> {
    let mut parts = parts.into_iter();
    let (mut folded, mut operator) = parts.next()?;
    for (expression, next_operator) in parts {
        folded = Expression::logical(operator, folded, expression);
        operator = next_operator;
    }
    Some(folded)
}

fn check_operator(op: CompareOp, kind: &PropertyKind) -> Result<()> {
    if kind.is_navigation() || (op.is_relational() && !kind.is_orderable()) {
        return Err(QueryError::invalid_comparison(op.symbol(), kind.to_string()));
    }
    Ok(())
}

/// Converts a literal to the declared kind of a property.
///
/// `null` is accepted only when `nullable` is set.
pub fn coerce(value: &Value, kind: &PropertyKind, nullable: bool) -> Result<Value> {
    let failure = || QueryError::coercion(kind.to_string(), value.to_string());
    if value.is_null() {
        return if nullable { Ok(Value::Null) } else { Err(failure()) };
    }

    let coerced = match (kind, value) {
        (PropertyKind::Boolean, Value::Boolean(_)) => Some(value.clone()),
        (PropertyKind::Boolean, Value::String(text)) => {
            match text.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            }
        }
        (PropertyKind::Integer, Value::String(text)) => text.trim().parse().ok().map(Value::Integer),
        (PropertyKind::Integer, other) => other.as_int().map(Value::Integer),
        (PropertyKind::Float, Value::String(text)) => text.trim().parse().ok().map(Value::Float),
        (PropertyKind::Float, other) => other.as_float().map(Value::Float),
        (PropertyKind::Decimal, Value::String(text)) => {
            Decimal::from_str(text.trim()).ok().map(Value::Decimal)
        }
        (PropertyKind::Decimal, other) => other.as_decimal().map(Value::Decimal),
        (PropertyKind::String, Value::String(_)) => Some(value.clone()),
        (PropertyKind::DateTime, Value::DateTime(_)) => Some(value.clone()),
        (PropertyKind::DateTime, Value::String(text)) => parse_datetime(text).map(Value::DateTime),
        (PropertyKind::Enum(variants), Value::String(text)) => variants
            .iter()
            .find(|variant| **variant == text.as_str())
            .or_else(|| variants.iter().find(|variant| variant.eq_ignore_ascii_case(text)))
            .map(|variant| Value::String(variant.to_string())),
        (PropertyKind::Enum(variants), Value::Integer(ordinal)) => usize::try_from(*ordinal)
            .ok()
            .and_then(|index| variants.get(index))
            .map(|variant| Value::String(variant.to_string())),
        _ => None,
    };

    coerced.ok_or_else(failure)
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
