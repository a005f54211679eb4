use std::fmt;

/// Operator tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Logical OR (`||`)
    Or,
    /// Logical AND (`&&`)
    And,
    /// Equality (`==`)
    EqEq,
    /// Inequality (`!=`)
    NotEq,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    GtEq,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    LtEq,
    /// Logical NOT (`!`)
    Not,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Or => "||",
            Operator::And => "&&",
            Operator::EqEq => "==",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Member name segment
    ///
    /// Starts with a letter or underscore, followed by letters, digits, or
    /// underscores. Dots between segments are separate [`TokenKind::Dot`] tokens.
    ///
    /// # Examples
    /// ```text
    /// Name
    /// _internal
    /// Address2
    /// ```
    Identifier,

    /// One of `|| && == != > >= < <= !`
    Operator(Operator),

    /// Quoted string; the token text is the unescaped content
    ///
    /// # Examples
    /// ```text
    /// "Company 1"
    /// 'it\'s'
    /// ```
    StringLiteral,

    /// Integer or decimal number, optionally negative
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -7
    /// 1000.50
    /// ```
    NumberLiteral,

    /// `true` or `false`
    BooleanLiteral,

    /// `null`
    NullLiteral,

    OpenParen,

    CloseParen,

    /// Member access or method call separator
    Dot,

    /// Argument separator
    Comma,

    /// End of input, always the last token
    EndOfInput,
}

/// A lexical token with its source position (character offset).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::EndOfInput => write!(f, "<end of input>"),
            TokenKind::StringLiteral => write!(f, "\"{}\"", self.text),
            _ => write!(f, "{}", self.text),
        }
    }
}
