//! TOML config file adapter.
//!
//! Implements [`ConfigPort`] on a single file.  Values are validated on
//! both load and save: an invalid file is rejected rather than patched up.

use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::SystemConfig;
use crate::error::ConfigError;

pub struct TomlConfigFile {
    path: PathBuf,
}

impl TomlConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for TomlConfigFile {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(self.path.display().to_string()),
            _ => ConfigError::Io(e.to_string()),
        })?;
        let config: SystemConfig =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        info!("Config loaded from {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text =
            toml::to_string_pretty(config).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        std::fs::write(&self.path, text).map_err(|e| ConfigError::Io(e.to_string()))?;
        info!("Config written to {}", self.path.display());
        Ok(())
    }
}
