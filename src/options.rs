//! Matching strategies and flags shared by every compilation.
//!
//! [`Options`] is an immutable value built with a fluent builder. A
//! process-wide snapshot is kept for callers that do not pass options
//! explicitly: every compile reads one `Arc<Options>` and writers replace the
//! whole snapshot, so a compile never sees half of a reconfiguration.

use crate::strategy::{
    ApproximateStrategy, DefaultApproximate, DefaultLike, LikeStrategy, StrategyDescriptor,
};
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

#[derive(Clone)]
pub struct Options {
    like: Arc<dyn LikeStrategy>,
    approximate: Arc<dyn ApproximateStrategy>,
    case_insensitive_store: bool,
    namespaces: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            like: Arc::new(DefaultLike::default()),
            approximate: Arc::new(DefaultApproximate::default()),
            case_insensitive_store: false,
            namespaces: Vec::new(),
        }
        .add_namespaces([default_namespace()])
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("like", &self.like.descriptor().function)
            .field("approximate", &self.approximate.descriptor().function)
            .field("case_insensitive_store", &self.case_insensitive_store)
            .field("namespaces", &self.namespaces)
            .finish()
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_like(mut self, like: impl LikeStrategy + 'static) -> Self {
        self.like = Arc::new(like);
        self
    }

    pub fn with_approximate(mut self, approximate: impl ApproximateStrategy + 'static) -> Self {
        self.approximate = Arc::new(approximate);
        self
    }

    /// The target store already compares text ignoring case, so equality
    /// comparisons are emitted without lower-casing the field
    pub fn case_insensitive_store(mut self) -> Self {
        self.case_insensitive_store = true;
        self
    }

    /// Extra context a provider needs to lower strategy calls (module paths,
    /// schema names). Duplicates are skipped.
    pub fn add_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for namespace in namespaces {
            let namespace = namespace.into();
            if !self.namespaces.contains(&namespace) {
                self.namespaces.push(namespace);
            }
        }
        self
    }

    pub fn like(&self) -> &dyn LikeStrategy {
        self.like.as_ref()
    }

    pub fn approximate(&self) -> &dyn ApproximateStrategy {
        self.approximate.as_ref()
    }

    pub fn like_descriptor(&self) -> StrategyDescriptor {
        self.like.descriptor()
    }

    pub fn approximate_descriptor(&self) -> StrategyDescriptor {
        self.approximate.descriptor()
    }

    pub fn is_case_insensitive_store(&self) -> bool {
        self.case_insensitive_store
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }
}

fn default_namespace() -> String {
    format!("{}::strategy", env!("CARGO_CRATE_NAME"))
}

static GLOBAL: LazyLock<RwLock<Arc<Options>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Options::default())));

/// Snapshot of the process-wide options
pub fn current() -> Arc<Options> {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Rebuild the process-wide options from the current snapshot.
///
/// The write lock is held while `configure` runs, so concurrent
/// reconfigurations are applied one after the other.
pub fn configure<F>(configure: F) -> Arc<Options>
where
    F: FnOnce(Options) -> Options,
{
    let mut global = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    let updated = Arc::new(configure(global.as_ref().clone()));
    *global = Arc::clone(&updated);
    log::debug!("process-wide filter options replaced: {:?}", updated);
    updated
}

/// Replace the process-wide options as a unit
pub fn replace(options: Options) -> Arc<Options> {
    configure(|_| options)
}

/// Restore the defaults, mainly for test isolation
pub fn reset() {
    replace(Options::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Locale;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(!options.is_case_insensitive_store());
        assert!(
            options
                .like_descriptor()
                .function
                .ends_with("DefaultLike::is_like")
        );
        assert!(
            options
                .approximate_descriptor()
                .function
                .ends_with("DefaultApproximate::encode")
        );
        assert_eq!(options.namespaces(), ["ldap_predicate::strategy"]);
    }

    #[test]
    fn test_builder_replaces_strategies_and_flags() {
        let options = Options::new()
            .with_approximate(DefaultApproximate::new(Locale::French))
            .case_insensitive_store()
            .add_namespaces(["store::functions", "ldap_predicate::strategy"]);

        assert!(options.is_case_insensitive_store());
        assert_eq!(options.approximate().encode("Bs"), "B800");
        assert_eq!(
            options.namespaces(),
            ["ldap_predicate::strategy", "store::functions"]
        );
    }
}
