//! Syntax checks and token dumps for filter expressions

use tracing::debug;

use super::CliError;
use crate::{
    AstNode, Lexer, Parser, Token,
    config::EngineConfig,
    printer::{to_compact, to_normalized},
};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Filter expression text
    pub expression: String,
    /// Emit the syntax tree as JSON instead of the normalized text
    pub json: bool,
}

/// Result of a successful check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutput {
    pub ast: AstNode,
    pub normalized: String,
    pub compact: String,
}

impl CheckOutput {
    /// Renders the output for the terminal.
    pub fn render(&self, json: bool) -> Result<String, CliError> {
        if json {
            Ok(serde_json::to_string_pretty(&self.ast)?)
        } else {
            Ok(self.normalized.clone())
        }
    }
}

/// Parses the expression with the configured nesting limit.
pub fn execute_check(options: &CheckOptions, config: &EngineConfig) -> Result<CheckOutput, CliError> {
    let expression = options.expression.trim();
    if expression.is_empty() {
        return Err(CliError::NoInput);
    }

    let ast = Parser::new(Lexer::new(expression))?
        .with_max_depth(config.max_expression_depth)
        .parse()?;
    debug!(depth = ast.depth(), "expression parsed");

    Ok(CheckOutput {
        normalized: to_normalized(&ast),
        compact: to_compact(&ast),
        ast,
    })
}

/// Tokenizes the expression, ending with the end-of-input token.
pub fn execute_tokens(expression: &str) -> Result<Vec<Token>, CliError> {
    Ok(Lexer::new(expression).tokenize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenKind;

    fn check(expression: &str) -> Result<CheckOutput, CliError> {
        let options = CheckOptions {
            expression: expression.to_string(),
            json: false,
        };
        execute_check(&options, &EngineConfig::default())
    }

    #[test]
    fn check_prints_normalized_form() {
        let output = check("a == 1 || b").unwrap();
        assert_eq!(output.normalized, "((a == 1) || b)");
        assert_eq!(output.compact, "((a==1)||b)");
    }

    #[test]
    fn check_rejects_blank_input() {
        assert!(matches!(check("   "), Err(CliError::NoInput)));
    }

    #[test]
    fn check_reports_syntax_errors() {
        let err = check("Id >").unwrap_err();
        assert!(err.to_string().contains("position"));
    }

    #[test]
    fn json_output_tags_nodes() {
        let output = check("!Active").unwrap();
        let json = output.render(true).unwrap();
        assert!(json.contains("\"node\": \"unary\""));
    }

    #[test]
    fn tokens_end_with_end_of_input() {
        let tokens = execute_tokens("Name == 'x'").unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(tokens[3].is(TokenKind::EndOfInput));
    }
}
