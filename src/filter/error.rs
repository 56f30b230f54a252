use std::time::Duration;
use thiserror::Error;

/// Errors raised while turning filter text into a predicate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Filter must start with '(' and end with ')': {filter}")]
    MissingEnclosingParentheses { filter: String },

    #[error("Filter must have the same number of '(' and ')': {filter}")]
    UnbalancedParentheses { filter: String },

    #[error("Filter format is not correct: [{filter}]")]
    Malformed { filter: String },

    #[error("Unknown property '{property}' in filter [{filter}]")]
    UnknownProperty { property: String, filter: String },

    #[error("Filter groups cannot be resolved to a single predicate: [{filter}]")]
    Unresolvable { filter: String },

    #[error("Filter nesting exceeds {max_depth} groups: [{filter}]")]
    TooDeep { max_depth: usize, filter: String },
}

impl FilterError {
    /// The filter text the error was raised for
    pub fn filter(&self) -> &str {
        match self {
            FilterError::MissingEnclosingParentheses { filter }
            | FilterError::UnbalancedParentheses { filter }
            | FilterError::Malformed { filter }
            | FilterError::UnknownProperty { filter, .. }
            | FilterError::Unresolvable { filter }
            | FilterError::TooDeep { filter, .. } => filter,
        }
    }
}

/// Errors raised while evaluating a compiled predicate against a record
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Cannot convert '{value}' of '{field}' to a decimal number")]
    Conversion { field: String, value: String },

    #[error("Matching '{pattern}' exceeded its {budget:?} budget")]
    MatchTimeout { pattern: String, budget: Duration },

    #[error("Invalid like pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl EvalError {
    /// Timeouts are recoverable: callers may read them as "no match"
    pub fn is_timeout(&self) -> bool {
        matches!(self, EvalError::MatchTimeout { .. })
    }
}
