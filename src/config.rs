//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Resolution depth used when nothing else is configured.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Environment variable overriding [`DEFAULT_MAX_DEPTH`].
pub const MAX_DEPTH_ENV: &str = "PINEQL_MAX_DEPTH";

/// Configuration for a [`Pine`](crate::Pine) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PineConfig {
    /// Deepest reference nesting that gets resolved. Deeper selections are
    /// dropped silently, never reported as errors.
    pub max_depth: usize,
}

impl Default for PineConfig {
    fn default() -> Self {
        Self {
            max_depth: std::env::var(MAX_DEPTH_ENV)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_DEPTH),
        }
    }
}

impl PineConfig {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Load from YAML. Missing keys take their defaults.
    ///
    /// ```yaml
    /// max_depth: 4
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
