//! pingu.toml configuration parser.
//!
//! Every field is optional; command-line flags override whatever the file
//! provides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::ArchivePolicy;
use crate::window::InvalidWindowPolicy;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "PINGU_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinguConfig {
    pub check: Option<CheckConfig>,
    pub retry: Option<RetryConfig>,
    pub alert: Option<AlertConfig>,
    pub email: Option<EmailConfig>,
    pub store: Option<StoreConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckConfig {
    pub expect_status: Option<u16>,
    pub expect_content: Option<String>,
    pub ignore_periods: Option<Vec<String>>,
    pub invalid_window: Option<InvalidWindowPolicy>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    pub retries: Option<u32>,
    pub increment: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Consecutive failures required before an alert is sent.
    pub threshold: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    pub enabled: Option<bool>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub dir: Option<PathBuf>,
    pub archive_policy: Option<ArchivePolicy>,
}

impl PinguConfig {
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Load the explicit file if given, else the file named by `PINGU_CONFIG`,
    /// else an empty config.
    pub fn load(explicit: Option<&Path>) -> CoreResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::from_file(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn check(&self) -> CheckConfig {
        self.check.clone().unwrap_or_default()
    }

    pub fn retry(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn alert(&self) -> AlertConfig {
        self.alert.clone().unwrap_or_default()
    }

    pub fn email(&self) -> EmailConfig {
        self.email.clone().unwrap_or_default()
    }

    pub fn store(&self) -> StoreConfig {
        self.store.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let config: PinguConfig = toml::from_str("").unwrap();
        assert!(config.check.is_none());
        assert_eq!(config.retry().retries, None);
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
[check]
expect_status = 204
expect_content = "ok"
ignore_periods = ["SAT 22:00 - SUN 01:00"]
invalid_window = "ignore"
timeout_secs = 5

[retry]
retries = 3
increment = 2

[alert]
threshold = 4

[email]
enabled = true
host = "smtp.example.com"
port = 2525
from = "pingu@example.com"
to = "ops@example.com;dev@example.com"

[store]
dir = "/var/lib/pingu"
archive_policy = "own-status"
"#;
        let config: PinguConfig = toml::from_str(toml_str).unwrap();
        let check = config.check();
        assert_eq!(check.expect_status, Some(204));
        assert_eq!(check.invalid_window, Some(InvalidWindowPolicy::Ignore));
        assert_eq!(check.ignore_periods.unwrap().len(), 1);
        assert_eq!(config.retry().increment, Some(2));
        assert_eq!(config.alert().threshold, Some(4));
        assert_eq!(config.email().port, Some(2525));
        assert_eq!(config.store().archive_policy, Some(ArchivePolicy::OwnStatus));
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pingu.toml");
        std::fs::write(&path, "[retry]\nretries = \"many\"\n").unwrap();

        let err = PinguConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse { .. }));
        assert!(err.to_string().contains("pingu.toml"));

        let missing = PinguConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, CoreError::ConfigRead { .. }));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pingu.toml");
        std::fs::write(&path, "[alert]\nthreshold = 2\n").unwrap();

        let config = PinguConfig::load(Some(&path)).unwrap();
        assert_eq!(config.alert().threshold, Some(2));
    }
}
