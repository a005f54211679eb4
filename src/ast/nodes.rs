use serde::Serialize;

use crate::{
    ast::{BinaryOperator, UnaryOperator},
    value::Value,
};

/// Syntax tree node of a parsed filter expression.
///
/// The tree is immutable and owns its children; it carries no type
/// information. Member paths are resolved only when the tree is compiled
/// against an entity type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AstNode {
    /// Binary operation (logical, equality, relational)
    ///
    /// # Examples
    /// ```text
    /// Id > 10
    /// Active && Id > 10
    /// ```
    Binary {
        operator: BinaryOperator,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },

    /// Unary operation
    ///
    /// # Example
    /// ```text
    /// !Active
    /// ```
    Unary {
        operator: UnaryOperator,
        operand: Box<AstNode>,
    },

    /// Member access path
    ///
    /// # Examples
    /// ```text
    /// Name            // path: ["Name"]
    /// Address.City    // path: ["Address", "City"]
    /// ```
    Member { path: Vec<String> },

    /// Method call
    ///
    /// The target is the member chain before the method name; a bare call
    /// such as `Contains("x")` has no target.
    ///
    /// # Example
    /// ```text
    /// Address.City.StartsWith("Ber")
    /// ```
    MethodCall {
        target: Option<Box<AstNode>>,
        method_name: String,
        arguments: Vec<AstNode>,
    },

    /// Literal value
    Constant { value: Value },
}

impl AstNode {
    pub fn member<S: Into<String>>(path: impl IntoIterator<Item = S>) -> Self {
        AstNode::Member {
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        AstNode::Constant {
            value: value.into(),
        }
    }

    pub fn binary(operator: BinaryOperator, left: AstNode, right: AstNode) -> Self {
        AstNode::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: AstNode) -> Self {
        AstNode::Unary {
            operator: UnaryOperator::Not,
            operand: Box::new(operand),
        }
    }

    /// Number of nodes on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        match self {
            AstNode::Binary { left, right, .. } => 1 + left.depth().max(right.depth()),
            AstNode::Unary { operand, .. } => 1 + operand.depth(),
            AstNode::MethodCall {
                target, arguments, ..
            } => {
                let target_depth = target.as_ref().map_or(0, |t| t.depth());
                let args_depth = arguments.iter().map(AstNode::depth).max().unwrap_or(0);
                1 + target_depth.max(args_depth)
            }
            AstNode::Member { .. } | AstNode::Constant { .. } => 1,
        }
    }
}
