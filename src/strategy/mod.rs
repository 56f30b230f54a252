//! Pluggable matching strategies.
//!
//! `=` comparisons with a wildcard go through a [`LikeStrategy`]; `~=`
//! comparisons go through an [`ApproximateStrategy`]. Each strategy also
//! publishes a [`StrategyDescriptor`] so a query provider can lower the call
//! into its own language instead of evaluating it in process.

mod approximate;
mod like;

pub use approximate::{DefaultApproximate, Locale};
pub use like::{DEFAULT_LIKE_TIMEOUT, DefaultLike};

use crate::filter::EvalError;
use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

static SLOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\d+)\}").expect("valid slot regex"));

/// Callable reference plus an invocation pattern with positional slots
/// (`{0}` for the property side, `{1}` for the literal side)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyDescriptor {
    pub function: String,
    pub pattern: String,
}

impl StrategyDescriptor {
    pub fn new(function: impl Into<String>, slots: usize) -> Self {
        let function = function.into();
        let arguments: Vec<String> = (0..slots).map(|i| format!("{{{i}}}")).collect();
        let pattern = format!("{}({})", function, arguments.join(", "));
        Self { function, pattern }
    }

    /// Substitute operands into the positional slots
    pub fn render(&self, operands: &[&str]) -> String {
        SLOT_RE
            .replace_all(&self.pattern, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| operands.get(i))
                    .map_or_else(|| caps[0].to_string(), |operand| operand.to_string())
            })
            .into_owned()
    }
}

/// Wildcard matching of a subject against a store-side pattern
/// (`%` any run, `_` one character)
pub trait LikeStrategy: Send + Sync + fmt::Debug {
    fn descriptor(&self) -> StrategyDescriptor;

    fn is_like(&self, subject: &str, pattern: &str) -> Result<bool, EvalError>;
}

/// Phonetic coding; two values are approximately equal when their codes are
pub trait ApproximateStrategy: Send + Sync + fmt::Debug {
    fn descriptor(&self) -> StrategyDescriptor;

    fn encode(&self, value: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_pattern_has_positional_slots() {
        let descriptor = StrategyDescriptor::new("store::like", 2);
        assert_eq!(descriptor.pattern, "store::like({0}, {1})");
        assert_eq!(
            descriptor.render(&["m.Sn", "\"v%\""]),
            "store::like(m.Sn, \"v%\")"
        );
    }

    #[test]
    fn test_default_descriptors_name_their_functions() {
        let like = DefaultLike::default().descriptor();
        assert!(like.function.ends_with("DefaultLike::is_like"));
        assert_eq!(like.pattern, format!("{}({{0}}, {{1}})", like.function));

        let approximate = DefaultApproximate::default().descriptor();
        assert!(approximate.function.ends_with("DefaultApproximate::encode"));
        assert_eq!(approximate.pattern, format!("{}({{0}})", approximate.function));
    }
}
