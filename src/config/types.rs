// config/types.rs
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::error::{Error, Result};

fn default_rotation_threshold_hours() -> u32 {
    720
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Root directory of the file secret store. `~` is expanded.
    pub store_dir: String,
    pub namespace: String,
    /// Client certificates with less validity left than this get rotated.
    #[serde(default = "default_rotation_threshold_hours")]
    pub rotation_threshold_hours: u32,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub debug: bool,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            store_dir: "~/.kube/secrets".to_string(),
            namespace: "default".to_string(),
            rotation_threshold_hours: default_rotation_threshold_hours(),
            log_file: None,
            debug: false,
        }
    }
}

impl IssuerConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&config_str)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let config_str = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, config_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_dir.trim().is_empty() {
            return Err(Error::Config("store_dir must not be empty".to_string()));
        }
        if self.namespace.trim().is_empty() {
            return Err(Error::Config("namespace must not be empty".to_string()));
        }
        if self.rotation_threshold_hours == 0 {
            return Err(Error::Config(
                "rotation_threshold_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store_dir).to_string())
    }

    pub fn rotation_threshold(&self) -> Duration {
        Duration::hours(i64::from(self.rotation_threshold_hours))
    }
}
