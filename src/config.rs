use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ssh_config::{self, expand_tilde};
use crate::ssh_service::TerminalProgram;

/// Overrides the settings directory. Used by tests and portable setups.
pub const CONFIG_DIR_ENV: &str = "SSHM_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "sshm.toml";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Root SSH config file. `~` is expanded when used.
    #[serde(default = "default_ssh_config_path")]
    pub ssh_config_path: String,
    #[serde(default)]
    pub default_terminal: TerminalProgram,
    /// Editor for the TUI; falls back to $VISUAL, $EDITOR, then vi.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

fn default_ssh_config_path() -> String {
    "~/.ssh/config".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ssh_config_path: default_ssh_config_path(),
            default_terminal: TerminalProgram::default(),
            editor: None,
        }
    }
}

impl AppConfig {
    pub fn ssh_config_path(&self) -> PathBuf {
        if self.ssh_config_path.trim().is_empty() {
            return ssh_config::default_ssh_config_path();
        }
        expand_tilde(self.ssh_config_path.trim())
    }

    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| std::env::var("VISUAL").ok().filter(|e| !e.is_empty()))
            .or_else(|| std::env::var("EDITOR").ok().filter(|e| !e.is_empty()))
            .unwrap_or_else(|| "vi".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .context("Could not find config directory")?
                .join("sshm"),
        };
        Self::with_dir(config_dir)
    }

    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_dir = config_dir.into();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }

        let config_file = config_dir.join(CONFIG_FILE_NAME);
        Ok(Self {
            config_dir,
            config_file,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_file
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        // If config file doesn't exist, create it with default values
        if !self.config_file.exists() {
            let default_config = AppConfig::default();
            self.save_config(&default_config)?;
            return Ok(default_config);
        }

        let content =
            fs::read_to_string(&self.config_file).context("Failed to read config file")?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", self.config_file))?;

        Ok(config)
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.config_file, toml).context("Failed to write config file")?;
        tracing::debug!("Wrote settings to {:?}", self.config_file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path().join("sshm")).unwrap();

        let config = manager.load_config().unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(manager.config_path().exists());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path()).unwrap();
        let config = AppConfig {
            ssh_config_path: "/etc/ssh/custom".to_string(),
            default_terminal: TerminalProgram::Inline,
            editor: Some("nano".to_string()),
        };

        manager.save_config(&config).unwrap();

        assert_eq!(manager.load_config().unwrap(), config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path()).unwrap();
        fs::write(manager.config_path(), "default_terminal = \"warp\"\n").unwrap();

        let config = manager.load_config().unwrap();

        assert_eq!(config.default_terminal, TerminalProgram::Warp);
        assert_eq!(config.ssh_config_path, "~/.ssh/config");
        assert_eq!(config.editor, None);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path()).unwrap();
        fs::write(manager.config_path(), "default_terminal = \"telnet\"\n").unwrap();

        assert!(manager.load_config().is_err());
    }

    #[test]
    fn test_explicit_editor_wins() {
        let config = AppConfig {
            editor: Some("hx".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.editor_command(), "hx");
    }
}
