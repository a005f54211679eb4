use std::fmt;

use serde::Serialize;

use super::tokens::Operator;

/// Binary operators, in the order of their precedence levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    // Logical
    /// Logical OR (`||`)
    Or,
    /// Logical AND (`&&`)
    And,

    // Equality
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,

    // Relational
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterOrEqual,
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessOrEqual,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessOrEqual => "<=",
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::Or | BinaryOperator::And)
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOperator::GreaterThan
                | BinaryOperator::GreaterOrEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessOrEqual
        )
    }

    /// Maps an operator token to the binary operator it denotes.
    pub fn from_token(op: Operator) -> Option<Self> {
        match op {
            Operator::Or => Some(BinaryOperator::Or),
            Operator::And => Some(BinaryOperator::And),
            Operator::EqEq => Some(BinaryOperator::Equal),
            Operator::NotEq => Some(BinaryOperator::NotEqual),
            Operator::Gt => Some(BinaryOperator::GreaterThan),
            Operator::GtEq => Some(BinaryOperator::GreaterOrEqual),
            Operator::Lt => Some(BinaryOperator::LessThan),
            Operator::LtEq => Some(BinaryOperator::LessOrEqual),
            Operator::Not => None,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOperator {
    /// Logical NOT (`!`)
    Not,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Not => f.write_str("!"),
        }
    }
}
