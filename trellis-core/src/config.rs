//! Runtime configuration.
//!
//! Configuration is plain data. Hosts usually build it in code, but it can
//! also be loaded from JSON so that embedding applications can keep it next
//! to their own settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse runtime config: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("runtime config validation failed: {message}")]
    Validation { message: String },
}

/// What the scheduler does after an effect callback or cleanup panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectPanicPolicy {
    /// Finish the drain, notify the host, and return `HookError::EffectPanicked`.
    #[default]
    Report,

    /// Finish the drain, notify the host, then re-raise the first panic.
    ///
    /// A runtime dropped while that panic unwinds skips its teardown
    /// cleanups. Catch the panic and call `Runtime::shutdown` to run them.
    Resume,
}

/// Settings for a [`Runtime`](crate::tree::Runtime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound on flushes performed by `run_until_idle`.
    pub max_render_passes: usize,

    /// How panics raised inside effects are surfaced.
    pub effect_panics: EffectPanicPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_render_passes: 32,
            effect_panics: EffectPanicPolicy::Report,
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_render_passes == 0 {
            return Err(ConfigError::Validation {
                message: "max_render_passes must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
