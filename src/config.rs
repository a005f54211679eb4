//! Engine configuration.
//!
//! Values are layered: built-in defaults, then an optional file (TOML, JSON,
//! or any format the `config` crate recognizes by extension), then
//! `QUERYSPEC_*` environment variables.
//!
//! ```toml
//! string_comparison = "ordinal_ignore_case"
//! max_expression_depth = 32
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::Result, parser::DEFAULT_MAX_DEPTH};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "QUERYSPEC";

/// How `Contains`, `StartsWith`, `EndsWith` and LIKE searches compare text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringComparison {
    /// Exact, case-sensitive character comparison
    #[default]
    Ordinal,
    /// Case-insensitive comparison (Unicode lowercase folding)
    OrdinalIgnoreCase,
}

impl StringComparison {
    pub fn ignores_case(self) -> bool {
        matches!(self, StringComparison::OrdinalIgnoreCase)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub string_comparison: StringComparison,
    /// Deepest nesting of parentheses, `!` and call arguments the parser accepts
    pub max_expression_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            string_comparison: StringComparison::default(),
            max_expression_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn with_string_comparison(mut self, string_comparison: StringComparison) -> Self {
        self.string_comparison = string_comparison;
        self
    }

    pub fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }

    /// Loads configuration from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let loaded: EngineConfig = settings.try_deserialize()?;
        debug!(
            string_comparison = ?loaded.string_comparison,
            max_expression_depth = loaded.max_expression_depth,
            "loaded engine configuration"
        );
        Ok(loaded)
    }
}
