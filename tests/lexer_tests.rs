// tests/lexer_tests.rs

use query_spec::ast::{Operator, TokenKind};
use query_spec::lexer::{LexError, Lexer};

fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::new(input).map(|t| t.unwrap().kind).collect()
}

// ============================================================================
// Operators and Punctuation
// ============================================================================

#[test]
fn test_operator_tokens() {
    let test_cases = vec![
        ("||", Operator::Or),
        ("&&", Operator::And),
        ("==", Operator::EqEq),
        ("!=", Operator::NotEq),
        (">", Operator::Gt),
        (">=", Operator::GtEq),
        ("<", Operator::Lt),
        ("<=", Operator::LtEq),
        ("!", Operator::Not),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Operator(expected), "Failed for input: {}", input);
        assert_eq!(token.text, input);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndOfInput);
    }
}

#[test]
fn test_punctuation_tokens() {
    assert_eq!(
        kinds("( ) . ,"),
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Dot,
            TokenKind::Comma,
            TokenKind::EndOfInput,
        ]
    );
}

#[test]
fn test_two_char_vs_single_char() {
    assert_eq!(
        kinds("<= < >= >"),
        vec![
            TokenKind::Operator(Operator::LtEq),
            TokenKind::Operator(Operator::Lt),
            TokenKind::Operator(Operator::GtEq),
            TokenKind::Operator(Operator::Gt),
            TokenKind::EndOfInput,
        ]
    );

    // `!` directly before a member stays a unary operator
    assert_eq!(
        kinds("!Active"),
        vec![
            TokenKind::Operator(Operator::Not),
            TokenKind::Identifier,
            TokenKind::EndOfInput,
        ]
    );
}

#[test]
fn test_single_ampersand_is_invalid() {
    let err = Lexer::new("a & b").tokenize().unwrap_err();
    assert_eq!(
        err,
        LexError::UnexpectedCharacter {
            position: 2,
            character: '&'
        }
    );
}

#[test]
fn test_bare_equals_is_invalid() {
    let err = Lexer::new("Id = 1").tokenize().unwrap_err();
    assert_eq!(err.position(), 3);
    assert!(err.to_string().contains("Unexpected character '='"));
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_string_literals() {
    let test_cases = vec![
        (r#""Company 1""#, "Company 1"),
        ("'single'", "single"),
        (r#""say \"hi\"""#, "say \"hi\""),
        (r"'it\'s'", "it's"),
        (r#""tab\there""#, "tab\there"),
        (r#""back\\slash""#, "back\\slash"),
        (r#""""#, ""),
    ];

    for (input, expected) in test_cases {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token.kind, TokenKind::StringLiteral, "Failed for input: {}", input);
        assert_eq!(token.text, expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_unterminated_string() {
    let err = Lexer::new("Name == \"Acme").tokenize().unwrap_err();
    assert_eq!(err, LexError::UnterminatedString { position: 8 });
}

#[test]
fn test_invalid_escape() {
    let err = Lexer::new(r#""a\qb""#).tokenize().unwrap_err();
    assert_eq!(
        err,
        LexError::InvalidEscape {
            position: 2,
            character: 'q'
        }
    );
}

#[test]
fn test_number_literals() {
    let test_cases = vec!["42", "0", "-7", "1000.50", "-0.25"];

    for input in test_cases {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token.kind, TokenKind::NumberLiteral, "Failed for input: {}", input);
        assert_eq!(token.text, input);
    }
}

#[test]
fn test_number_followed_by_dot_method() {
    // A dot not followed by a digit ends the number
    assert_eq!(
        kinds("12.Foo"),
        vec![
            TokenKind::NumberLiteral,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::EndOfInput,
        ]
    );
}

#[test]
fn test_number_out_of_range() {
    let err = Lexer::new("99999999999999999999999999999999999")
        .tokenize()
        .unwrap_err();
    assert!(matches!(err, LexError::InvalidNumber { position: 0, .. }));
}

#[test]
fn test_keywords_vs_identifiers() {
    let test_cases = vec![
        ("true", TokenKind::BooleanLiteral),
        ("false", TokenKind::BooleanLiteral),
        ("null", TokenKind::NullLiteral),
        ("truth", TokenKind::Identifier),
        ("nullable", TokenKind::Identifier),
        ("_internal", TokenKind::Identifier),
        ("Address2", TokenKind::Identifier),
    ];

    for (input, expected) in test_cases {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token.kind, expected, "Failed for input: {}", input);
        assert_eq!(token.text, input);
    }
}

// ============================================================================
// Positions and Iteration
// ============================================================================

#[test]
fn test_token_positions() {
    let tokens = Lexer::new("Id  >= 10").tokenize().unwrap();
    let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 4, 7, 9]);
}

#[test]
fn test_positions_count_characters() {
    let tokens = Lexer::new("'Zürich' == City").tokenize().unwrap();
    assert_eq!(tokens[0].text, "Zürich");
    assert_eq!(tokens[1].position, 9);
    assert_eq!(tokens[2].position, 12);
}

#[test]
fn test_end_of_input_repeats() {
    let mut lexer = Lexer::new("a");
    lexer.next_token().unwrap();
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndOfInput);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndOfInput);
}

#[test]
fn test_iterator_stops_after_error() {
    let results: Vec<_> = Lexer::new("a # b").collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn test_reset_restarts_tokenizing() {
    let mut lexer = Lexer::new("Name == 'x'");
    let first = lexer.tokenize().unwrap();
    assert!(lexer.next().is_none());

    lexer.reset();
    let second = lexer.tokenize().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_input() {
    assert_eq!(kinds(""), vec![TokenKind::EndOfInput]);
    assert_eq!(kinds("   \t\n"), vec![TokenKind::EndOfInput]);
}
