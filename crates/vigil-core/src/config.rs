//! Store configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file path. None = in-memory (tests and dry runs).
    pub path: Option<String>,
    /// SQLite busy handler window in milliseconds. Default: 5000.
    pub busy_timeout_ms: Option<u32>,
    /// Sleep between statement-level contention retries, in milliseconds.
    /// Default: 10.
    pub retry_interval_ms: Option<u64>,
    /// Retry budget for the give-up runner variant. Default: 64.
    pub give_up_retries: Option<u32>,
}

impl StoreConfig {
    /// Parse from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Returns the effective busy handler window, defaulting to 5000ms.
    pub fn effective_busy_timeout_ms(&self) -> u32 {
        self.busy_timeout_ms.unwrap_or(5_000)
    }

    /// Returns the effective retry sleep, defaulting to 10ms.
    pub fn effective_retry_interval_ms(&self) -> u64 {
        self.retry_interval_ms.unwrap_or(10)
    }

    /// Returns the effective give-up retry budget, defaulting to 64.
    pub fn effective_give_up_retries(&self) -> u32 {
        self.give_up_retries.unwrap_or(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_absent() {
        let config = StoreConfig::from_toml("").unwrap();
        assert_eq!(config.effective_busy_timeout_ms(), 5_000);
        assert_eq!(config.effective_retry_interval_ms(), 10);
        assert_eq!(config.effective_give_up_retries(), 64);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = StoreConfig::from_toml(
            "path = \"/var/lib/vigil/tasks.db\"\nbusy_timeout_ms = 250\n",
        )
        .unwrap();
        assert_eq!(config.path.as_deref(), Some("/var/lib/vigil/tasks.db"));
        assert_eq!(config.effective_busy_timeout_ms(), 250);
    }
}
