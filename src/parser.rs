use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{AstNode, BinaryOperator, Operator, Token, TokenKind, UnaryOperator},
    lexer::{LexError, Lexer},
    value::Value,
};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Nesting limit used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A grammar violation, carrying the offending token.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at position {position} (found {token})")]
pub struct ParseError {
    pub message: String,
    pub token: String,
    pub position: usize,
}

impl ParseError {
    fn at(token: &Token, message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            token: token.to_string(),
            position: token.position,
        }
    }
}

/// Precedence-climbing parser for filter expressions.
///
/// Levels from lowest to highest: `||`, `&&`, equality, relational, unary `!`,
/// primary. Each binary level is left-associative.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    end: Token,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, LexError> {
        let tokens = lexer.tokenize()?;
        let end = tokens
            .last()
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::EndOfInput, "", 0));
        Ok(Parser {
            tokens,
            position: 0,
            end,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Limits how deeply the tree may nest: binary operators, parentheses, `!`
    /// and call arguments each count as a level.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.end)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().is(kind)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("Expected {what}")))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::at(self.current(), message)
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.error(format!(
                "Expression nests deeper than {} levels",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Returns the binary operator at the cursor if it belongs to `level`.
    fn binary_operator(&self, level: &[BinaryOperator]) -> Option<BinaryOperator> {
        match self.current().kind {
            TokenKind::Operator(op) => {
                BinaryOperator::from_token(op).filter(|binary| level.contains(binary))
            }
            _ => None,
        }
    }

    fn parse_level(
        &mut self,
        level: &[BinaryOperator],
        next: fn(&mut Self) -> Result<AstNode, ParseError>,
    ) -> Result<AstNode, ParseError> {
        let mut left = next(self)?;

        // Each fold deepens the left spine by one level
        let mut folds = 0;
        while let Some(operator) = self.binary_operator(level) {
            self.enter()?;
            folds += 1;
            self.advance();
            let right = next(self)?;
            left = AstNode::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth -= folds;
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<AstNode, ParseError> {
        self.parse_level(&[BinaryOperator::Or], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<AstNode, ParseError> {
        self.parse_level(&[BinaryOperator::And], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<AstNode, ParseError> {
        self.parse_level(
            &[BinaryOperator::Equal, BinaryOperator::NotEqual],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> Result<AstNode, ParseError> {
        self.parse_level(
            &[
                BinaryOperator::GreaterThan,
                BinaryOperator::GreaterOrEqual,
                BinaryOperator::LessThan,
                BinaryOperator::LessOrEqual,
            ],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        if self.check(TokenKind::Operator(Operator::Not)) {
            self.advance();
            self.enter()?;
            let operand = self.parse_unary()?;
            self.leave();
            return Ok(AstNode::Unary {
                operator: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    /// Parse primary expressions: literals, member paths, calls, `(expr)`
    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        match self.current().kind {
            TokenKind::OpenParen => {
                self.advance();
                self.enter()?;
                let expr = self.parse_expression()?;
                self.leave();
                self.expect(TokenKind::CloseParen, "')'")?;
                Ok(expr)
            }
            TokenKind::Identifier => self.parse_member_or_call(),
            TokenKind::StringLiteral => {
                let token = self.advance();
                Ok(AstNode::Constant {
                    value: Value::String(token.text),
                })
            }
            TokenKind::NumberLiteral => {
                let token = self.advance();
                let value = parse_number(&token)?;
                Ok(AstNode::Constant { value })
            }
            TokenKind::BooleanLiteral => {
                let token = self.advance();
                Ok(AstNode::Constant {
                    value: Value::Boolean(token.text == "true"),
                })
            }
            TokenKind::NullLiteral => {
                self.advance();
                Ok(AstNode::Constant { value: Value::Null })
            }
            TokenKind::EndOfInput => Err(self.error("Unexpected end of input")),
            _ => Err(self.error("Unexpected token")),
        }
    }

    /// Parse an identifier chain, optionally ending in a call
    fn parse_member_or_call(&mut self) -> Result<AstNode, ParseError> {
        let mut path = vec![self.advance().text];

        while self.check(TokenKind::Dot) {
            self.advance();
            let segment = self.expect(TokenKind::Identifier, "identifier after '.'")?;
            path.push(segment.text);
        }

        if !self.check(TokenKind::OpenParen) {
            return Ok(AstNode::Member { path });
        }

        self.advance();
        self.enter()?;
        let mut arguments = Vec::new();
        if !self.check(TokenKind::CloseParen) {
            loop {
                arguments.push(self.parse_expression()?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.leave();
        self.expect(TokenKind::CloseParen, "')' after arguments")?;

        // The method name is the last segment; everything before it is the target
        let method_name = path.pop().unwrap_or_default();
        let target = if path.is_empty() {
            None
        } else {
            Some(Box::new(AstNode::Member { path }))
        };

        Ok(AstNode::MethodCall {
            target,
            method_name,
            arguments,
        })
    }

    pub fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        self.parse_or()
    }

    /// Parses a complete expression; trailing tokens are an error.
    pub fn parse(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_expression()?;
        if !self.check(TokenKind::EndOfInput) {
            return Err(self.error("Unexpected token at end"));
        }
        debug!(depth = expr.depth(), "parsed filter expression");
        Ok(expr)
    }
}

fn parse_number(token: &Token) -> Result<Value, ParseError> {
    if !token.text.contains('.')
        && let Ok(n) = token.text.parse::<i64>()
    {
        return Ok(Value::Integer(n));
    }
    Decimal::from_str(&token.text)
        .map(Value::Decimal)
        .map_err(|_| ParseError::at(token, "Invalid number literal"))
}
