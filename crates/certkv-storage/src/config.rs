use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a [`MemoryStorage`](crate::MemoryStorage) backend.
///
/// Every field has a default, so an empty TOML document is a valid config:
///
/// ```toml
/// module_id = "caddy.storage.memory"
/// lock_timeout_secs = 30
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStorageConfig {
    /// Identifier the backend reports to a host module registry.
    pub module_id: String,
    /// Upper bound on any single lock or unlock wait, in seconds.
    ///
    /// Applied on top of the caller's own cancellation. `None` leaves waits
    /// bounded only by the caller.
    pub lock_timeout_secs: Option<u64>,
}

impl MemoryStorageConfig {
    /// The module identifier used when none is configured.
    pub const DEFAULT_MODULE_ID: &'static str = "caddy.storage.memory";

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check field values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module_id.trim().is_empty() {
            return Err(ConfigError::Invalid("module_id must not be empty".into()));
        }
        if self.lock_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "lock_timeout_secs must be positive; omit it to disable".into(),
            ));
        }
        Ok(())
    }

    /// The configured lock timeout.
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for MemoryStorageConfig {
    fn default() -> Self {
        Self {
            module_id: Self::DEFAULT_MODULE_ID.to_string(),
            lock_timeout_secs: None,
        }
    }
}
