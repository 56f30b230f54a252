use crate::options::Options;
use crate::strategy::{DefaultApproximate, DefaultLike, Locale};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// File form of [`Options`]; strategies themselves are not configurable from
/// a file, only the parameters of the default ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// The store compares text ignoring case already
    pub case_insensitive_store: bool,
    /// Locale tag for the phonetic coder; the process locale when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub like_timeout_ms: u64,
    /// Extra context handed to query providers
    pub namespaces: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            case_insensitive_store: false,
            locale: None,
            like_timeout_ms: 1000,
            namespaces: Vec::new(),
        }
    }
}

impl FilterConfig {
    pub fn locale(&self) -> Locale {
        self.locale
            .as_deref()
            .map(Locale::from_tag)
            .unwrap_or_else(Locale::current)
    }

    pub fn to_options(&self) -> Options {
        let mut options = Options::default()
            .with_like(DefaultLike::with_timeout(Duration::from_millis(
                self.like_timeout_ms,
            )))
            .with_approximate(DefaultApproximate::new(self.locale()))
            .add_namespaces(self.namespaces.iter().cloned());
        if self.case_insensitive_store {
            options = options.case_insensitive_store();
        }
        options
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FilterConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<FilterConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<FilterConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static FilterConfig {
    static DEFAULT_CONFIG: LazyLock<FilterConfig> = LazyLock::new(FilterConfig::default);
    &DEFAULT_CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: FilterConfig = toml::from_str("locale = \"fr-FR\"").unwrap();
        assert_eq!(config.locale(), Locale::French);
        assert_eq!(config.like_timeout_ms, 1000);
        assert!(!config.case_insensitive_store);
    }

    #[test]
    fn test_to_options_applies_every_setting() {
        let config = FilterConfig {
            case_insensitive_store: true,
            locale: Some("fr_FR.UTF-8".to_string()),
            like_timeout_ms: 250,
            namespaces: vec!["store::functions".to_string()],
        };
        let options = config.to_options();

        assert!(options.is_case_insensitive_store());
        assert_eq!(options.approximate().encode("cs"), "C800");
        assert!(options.namespaces().contains(&"store::functions".to_string()));
    }

    #[test]
    fn test_load_reports_parse_errors_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "like_timeout_ms = \"soon\"").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = load_config(Some(Path::new("/nonexistent/ldap-predicate.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
