//! `[save]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [save]
//! enabled = true          # Periodic autosave
//! interval_secs = 30      # Autosave period
//! dir = ".folio/pages"    # Where page snapshots are written
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Page persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub dir: PathBuf,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            dir: PathBuf::from(".folio/pages"),
        }
    }
}

impl SaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.enabled && self.interval_secs == 0 {
            diag.error_with_hint(
                "save.interval_secs",
                "must be greater than 0",
                "set `enabled = false` to turn autosave off",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_save_config_defaults() {
        let config = test_parse_config("");
        assert!(config.save.enabled);
        assert_eq!(config.save.interval().as_secs(), 30);
    }

    #[test]
    fn test_zero_interval_only_checked_when_enabled() {
        let config = test_parse_config("[save]\nenabled = false\ninterval_secs = 0");
        let mut diag = ConfigDiagnostics::new();
        config.save.validate(&mut diag);
        assert!(diag.is_empty());

        let config = test_parse_config("[save]\ninterval_secs = 0");
        config.save.validate(&mut diag);
        assert_eq!(diag.errors().len(), 1);
    }
}
