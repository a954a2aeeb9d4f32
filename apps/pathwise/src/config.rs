//! # Configuration
//!
//! Optional `pathwise.toml` read at startup.
//!
//! ```toml
//! [log]
//! format = "json"
//! filter = "pathwise=debug"
//!
//! [assessment]
//! questions_to_ask = 5
//! ```
//!
//! Every key is optional. `PATHWISE_LOG_FORMAT` and `RUST_LOG` override the
//! `[log]` table when set.

use pathwise_core::primitives::QUESTIONS_PER_ASSESSMENT;
use pathwise_core::{AssessmentPolicy, PathwiseError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "pathwise.toml";

/// Filter used when neither `RUST_LOG` nor the config file sets one.
pub const DEFAULT_LOG_FILTER: &str = "pathwise=info,pathwise_core=warn";

/// Filter selected by `--verbose`.
pub const VERBOSE_LOG_FILTER: &str = "pathwise=debug,pathwise_core=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse `PATHWISE_LOG_FORMAT`; anything but `json` is text.
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl LogConfig {
    /// Filter directive in effect: a non-empty `RUST_LOG` wins, then
    /// `--verbose`, then the configured filter.
    #[must_use]
    pub fn filter_directive(&self, rust_log: Option<&str>, verbose: bool) -> String {
        match rust_log.map(str::trim) {
            Some(directive) if !directive.is_empty() => directive.to_string(),
            _ if verbose => VERBOSE_LOG_FILTER.to_string(),
            _ => self.filter.clone(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub questions_to_ask: usize,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            questions_to_ask: QUESTIONS_PER_ASSESSMENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub assessment: AssessmentConfig,
}

impl AppConfig {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, `pathwise.toml` in the
    /// working directory is used if present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, PathwiseError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, PathwiseError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PathwiseError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, PathwiseError> {
        let config: Self =
            toml::from_str(content).map_err(|e| PathwiseError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), PathwiseError> {
        if self.assessment.questions_to_ask == 0 {
            return Err(PathwiseError::Config(
                "assessment.questions_to_ask must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Assessment rules derived from the `[assessment]` table.
    #[must_use]
    pub fn assessment_policy(&self) -> AssessmentPolicy {
        AssessmentPolicy::new(self.assessment.questions_to_ask)
    }
}
