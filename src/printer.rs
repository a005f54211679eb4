//! Normalized text output for filter expression trees.
//!
//! The normalized form parenthesizes every binary operation, so it does not
//! depend on precedence and reparses to the same tree:
//!
//! ```
//! use query_spec::printer::to_normalized;
//! use query_spec::{Lexer, Parser};
//!
//! let ast = Parser::new(Lexer::new("a == 1 || b == 2 && c == 3"))
//!     .unwrap()
//!     .parse()
//!     .unwrap();
//! assert_eq!(to_normalized(&ast), "((a == 1) || ((b == 2) && (c == 3)))");
//! ```

use std::fmt;

use crate::ast::AstNode;

pub struct ExpressionPrinter {
    spaced: bool,
}

impl ExpressionPrinter {
    /// `spaced` puts blanks around binary operators and after argument commas.
    pub fn new(spaced: bool) -> Self {
        ExpressionPrinter { spaced }
    }

    pub fn print(&self, node: &AstNode) -> String {
        let mut out = String::new();
        self.print_node(node, &mut out);
        out
    }

    fn print_node(&self, node: &AstNode, out: &mut String) {
        match node {
            AstNode::Binary {
                operator,
                left,
                right,
            } => {
                out.push('(');
                self.print_node(left, out);
                if self.spaced {
                    out.push(' ');
                    out.push_str(operator.symbol());
                    out.push(' ');
                } else {
                    out.push_str(operator.symbol());
                }
                self.print_node(right, out);
                out.push(')');
            }
            AstNode::Unary { operator, operand } => {
                out.push_str(&operator.to_string());
                self.print_node(operand, out);
            }
            AstNode::Member { path } => out.push_str(&path.join(".")),
            AstNode::MethodCall {
                target,
                method_name,
                arguments,
            } => {
                if let Some(target) = target {
                    self.print_node(target, out);
                    out.push('.');
                }
                out.push_str(method_name);
                out.push('(');
                let separator = if self.spaced { ", " } else { "," };
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        out.push_str(separator);
                    }
                    self.print_node(argument, out);
                }
                out.push(')');
            }
            AstNode::Constant { value } => out.push_str(&value.to_string()),
        }
    }
}

/// Normalized, human-readable form
pub fn to_normalized(node: &AstNode) -> String {
    ExpressionPrinter::new(true).print(node)
}

/// Normalized form without optional whitespace
pub fn to_compact(node: &AstNode) -> String {
    ExpressionPrinter::new(false).print(node)
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_normalized(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOperator;

    #[test]
    fn method_calls_keep_their_target() {
        let call = AstNode::MethodCall {
            target: Some(Box::new(AstNode::member(["Address", "City"]))),
            method_name: "StartsWith".into(),
            arguments: vec![AstNode::constant("Ber")],
        };
        assert_eq!(to_normalized(&call), "Address.City.StartsWith(\"Ber\")");
    }

    #[test]
    fn compact_form_drops_blanks() {
        let node = AstNode::not(AstNode::binary(
            BinaryOperator::GreaterThan,
            AstNode::member(["Id"]),
            AstNode::constant(-3),
        ));
        assert_eq!(to_compact(&node), "!(Id>-3)");
        assert_eq!(node.to_string(), "!(Id > -3)");
    }
}
