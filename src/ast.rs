//! # Filter Expression Language - Abstract Syntax Tree
//!
//! This module defines the tokens and syntax tree of the textual filter
//! language, a small predicate grammar over entity members.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[nodes]** - The closed set of syntax tree nodes produced by the parser
//! - **[operators]** - Binary and unary operators with their precedence
//!
//! ## Quick Start
//!
//! ```text
//! Name.StartsWith("Acme") && (Revenue >= 1000.50 || Status == "Active")
//! ```
//!
//! ## Grammar
//!
//! ```text
//! expr    := or
//! or      := and ('||' and)*
//! and     := eq ('&&' eq)*
//! eq      := rel (('==' | '!=') rel)*
//! rel     := unary (('<' | '<=' | '>' | '>=') unary)*
//! unary   := '!' unary | primary
//! primary := '(' expr ')' | path | path '(' args? ')' | literal
//! path    := identifier ('.' identifier)*
//! args    := expr (',' expr)*
//! literal := string | number | 'true' | 'false' | 'null'
//! ```
//!
//! Every binary level is left-associative. Member access dots are separate
//! tokens; the parser folds `a.b.c` into one [`AstNode::Member`] path.
pub mod nodes;
pub mod operators;
pub mod tokens;

pub use nodes::AstNode;
pub use operators::{BinaryOperator, UnaryOperator};
pub use tokens::{Operator, Token, TokenKind};
