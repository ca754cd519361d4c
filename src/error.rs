//! Error types for the haggle automation

use thiserror::Error;

/// Failure while parsing or evaluating a price formula
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Empty expression")]
    Empty,

    #[error("Unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Trailing input after complete expression")]
    TrailingInput,

    #[error("Unbalanced parenthesis at position {0}")]
    UnbalancedParen(usize),

    #[error("Unterminated placeholder starting at position {0}")]
    UnterminatedPlaceholder(usize),

    #[error("Unresolved placeholder: {0}")]
    UnresolvedPlaceholder(String),

    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("Result is not a finite number")]
    NonFinite,
}

/// Main error type for the haggle automation
#[derive(Error, Debug)]
pub enum HaggleError {
    // Navigation errors
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Window closed unexpectedly: {0}")]
    WindowClosed(String),

    // Session errors
    #[error("Session refresh failed: {0}")]
    SessionRefresh(String),

    #[error("Reroll stalled: counter was {before}, still {observed} after timeout")]
    Stall { before: u32, observed: u32 },

    // Valuation errors
    #[error("Formula for {name} ({expression}) failed: {source}")]
    Formula {
        name: String,
        expression: String,
        #[source]
        source: FormulaError,
    },

    // Control errors
    #[error("Cycle cancelled by operator")]
    Cancelled,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HaggleError {
    /// Operator aborts unwind like failures but are not failures
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HaggleError::Cancelled)
    }

    /// The UI was left somewhere navigation could not get out of
    pub fn is_navigation_failure(&self) -> bool {
        matches!(self, HaggleError::Navigation(_) | HaggleError::WindowClosed(_))
    }
}

/// Result type alias for haggle operations
pub type Result<T> = std::result::Result<T, HaggleError>;
