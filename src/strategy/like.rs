use super::{LikeStrategy, StrategyDescriptor};
use crate::filter::EvalError;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Time budget for a single like match
pub const DEFAULT_LIKE_TIMEOUT: Duration = Duration::from_secs(1);

const CACHE_CAPACITY: usize = 256;
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Wildcard matcher translating store wildcards into an anchored,
/// case-insensitive regex.
///
/// The time budget covers the match alone, not compiling the pattern. It is
/// checked once the match returns and does not abort it; the `regex` matcher
/// runs in linear time, so an over-budget match still finishes.
#[derive(Debug)]
pub struct DefaultLike {
    timeout: Duration,
    cache: RwLock<HashMap<String, Regex>>,
}

impl Default for DefaultLike {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_LIKE_TIMEOUT)
    }
}

impl DefaultLike {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Translate a store pattern into regex syntax: everything is escaped,
    /// then `_` matches one character and `%` any run.
    pub fn to_regex(pattern: &str) -> String {
        let mut translated = String::with_capacity(pattern.len() + 16);
        let mut buf = [0u8; 4];
        for c in pattern.chars() {
            match c {
                '_' => translated.push('.'),
                '%' => translated.push_str(".*"),
                other => translated.push_str(&regex::escape(other.encode_utf8(&mut buf))),
            }
        }
        format!(r"(?is)\A{translated}\s*\z")
    }

    fn compiled(&self, pattern: &str) -> Result<Regex, EvalError> {
        if let Some(regex) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pattern)
        {
            return Ok(regex.clone());
        }

        let regex = RegexBuilder::new(&Self::to_regex(pattern))
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|source| EvalError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.len() >= CACHE_CAPACITY {
            cache.clear();
        }
        cache.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }
}

impl LikeStrategy for DefaultLike {
    fn descriptor(&self) -> StrategyDescriptor {
        StrategyDescriptor::new(format!("{}::DefaultLike::is_like", module_path!()), 2)
    }

    fn is_like(&self, subject: &str, pattern: &str) -> Result<bool, EvalError> {
        if subject.is_empty() || pattern.is_empty() {
            return Ok(false);
        }

        if subject.to_lowercase() == pattern.to_lowercase() {
            return Ok(true);
        }

        let regex = self.compiled(pattern)?;
        let started = Instant::now();
        let matched = regex.is_match(subject);
        let elapsed = started.elapsed();

        if elapsed >= self.timeout {
            log::warn!(
                "like match of '{}' took {:?}, over its {:?} budget",
                pattern,
                elapsed,
                self.timeout
            );
            return Err(EvalError::MatchTimeout {
                pattern: pattern.to_string(),
                budget: self.timeout,
            });
        }

        Ok(matched)
    }
}
