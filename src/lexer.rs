use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::ast::{Operator, Token, TokenKind};

/// Errors raised while tokenizing a filter expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { position: usize, character: char },

    #[error("Unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("Invalid escape sequence '\\{character}' at position {position}")]
    InvalidEscape { position: usize, character: char },

    #[error("Invalid number '{text}' at position {position}")]
    InvalidNumber { position: usize, text: String },
}

impl LexError {
    pub fn position(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::InvalidNumber { position, .. } => *position,
        }
    }
}

/// Tokenizer for filter expressions.
///
/// Produces tokens on demand; as an [`Iterator`] it yields every token up to
/// and including [`TokenKind::EndOfInput`] (or the first error) and then
/// stops. [`Lexer::reset`] restarts from the beginning.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    finished: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            finished: false,
        }
    }

    /// Rewinds to the start of the input
    pub fn reset(&mut self) {
        self.position = 0;
        self.finished = false;
    }

    /// Collects the remaining tokens, ending with `EndOfInput`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        self.by_ref().collect()
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance();

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(character) => {
                            return Err(LexError::InvalidEscape {
                                position: self.position - 1,
                                character,
                            });
                        }
                        None => return Err(LexError::UnterminatedString { position: start }),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_number(&mut self) -> Result<String, LexError> {
        let start = self.position;
        let mut number = String::new();
        let mut is_fraction = false;

        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_fraction
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_fraction = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let valid = if is_fraction {
            Decimal::from_str(&number).is_ok()
        } else {
            number.parse::<i64>().is_ok() || Decimal::from_str(&number).is_ok()
        };
        if valid {
            Ok(number)
        } else {
            Err(LexError::InvalidNumber {
                position: start,
                text: number,
            })
        }
    }

    fn operator(&mut self, op: Operator) -> Token {
        let start = self.position;
        let width = op.symbol().len();
        for _ in 0..width {
            self.advance();
        }
        Token::new(TokenKind::Operator(op), op.symbol(), start)
    }

    fn single(&mut self, kind: TokenKind, ch: char) -> Token {
        let start = self.position;
        self.advance();
        Token::new(kind, ch.to_string(), start)
    }

    fn unexpected(&self, character: char) -> LexError {
        LexError::UnexpectedCharacter {
            position: self.position,
            character,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.position;

        match self.current_char() {
            None => Ok(Token::new(TokenKind::EndOfInput, "", start)),
            Some('(') => Ok(self.single(TokenKind::OpenParen, '(')),
            Some(')') => Ok(self.single(TokenKind::CloseParen, ')')),
            Some('.') => Ok(self.single(TokenKind::Dot, '.')),
            Some(',') => Ok(self.single(TokenKind::Comma, ',')),
            Some('|') => {
                if self.peek_char(1) == Some('|') {
                    Ok(self.operator(Operator::Or))
                } else {
                    Err(self.unexpected('|'))
                }
            }
            Some('&') => {
                if self.peek_char(1) == Some('&') {
                    Ok(self.operator(Operator::And))
                } else {
                    Err(self.unexpected('&'))
                }
            }
            Some('=') => {
                if self.peek_char(1) == Some('=') {
                    Ok(self.operator(Operator::EqEq))
                } else {
                    Err(self.unexpected('='))
                }
            }
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    Ok(self.operator(Operator::NotEq))
                } else {
                    Ok(self.operator(Operator::Not))
                }
            }
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    Ok(self.operator(Operator::GtEq))
                } else {
                    Ok(self.operator(Operator::Gt))
                }
            }
            Some('<') => {
                if self.peek_char(1) == Some('=') {
                    Ok(self.operator(Operator::LtEq))
                } else {
                    Ok(self.operator(Operator::Lt))
                }
            }
            Some(quote @ ('"' | '\'')) => {
                let content = self.read_string(quote)?;
                Ok(Token::new(TokenKind::StringLiteral, content, start))
            }
            Some('-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                let number = self.read_number()?;
                Ok(Token::new(TokenKind::NumberLiteral, number, start))
            }
            Some(ch) if ch.is_ascii_digit() => {
                let number = self.read_number()?;
                Ok(Token::new(TokenKind::NumberLiteral, number, start))
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();
                let kind = match ident.as_str() {
                    "true" | "false" => TokenKind::BooleanLiteral,
                    "null" => TokenKind::NullLiteral,
                    _ => TokenKind::Identifier,
                };
                Ok(Token::new(kind, ident, start))
            }
            Some(ch) => Err(self.unexpected(ch)),
        }
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if matches!(&token, Ok(t) if t.is(TokenKind::EndOfInput)) || token.is_err() {
            self.finished = true;
        }
        Some(token)
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("true false null truthy");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::BooleanLiteral);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::BooleanLiteral);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::NullLiteral);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndOfInput);
}

#[test]
fn test_member_path() {
    let kinds: Vec<TokenKind> = Lexer::new("Address.City != 'Oslo'")
        .map(|t| t.unwrap().kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Operator(Operator::NotEq),
            TokenKind::StringLiteral,
            TokenKind::EndOfInput,
        ]
    );
}
