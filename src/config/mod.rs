use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Notify when the daemon re-asserts the preferred input (or fails to).
    pub show_restore_actions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// How long a newly connected device counts as "recently added".
    pub recency_window_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            show_restore_actions: true,
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            recency_window_ms: 2000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            notifications: NotificationConfig::default(),
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = match config_path {
            Some(path) => PathBuf::from(path),
            None => Self::default_config_path()?,
        };

        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            info!("Configuration file not found, creating default configuration");
            return Self::create_default_config(&path);
        }

        let config_content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    pub fn save(&self, config_path: Option<&str>) -> Result<()> {
        let path = match config_path {
            Some(path) => PathBuf::from(path),
            None => Self::default_config_path()?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(&path, config_content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    pub fn recency_window(&self) -> Duration {
        Duration::from_millis(self.reconcile.recency_window_ms)
    }

    fn default_config_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to get home directory")?;

        Ok(home_dir.join(".config/sticky-mic/config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<Self> {
        let config = Config::default();

        // Missing or read-only config locations fall back to in-memory defaults
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(
                    "Could not create config directory {}: {}. Using default config without saving.",
                    parent.display(),
                    e
                );
                return Ok(config);
            }
        }

        if let Err(e) = config.save(path.to_str()) {
            warn!(
                "Could not save default config to {}: {}. Using default config.",
                path.display(),
                e
            );
            return Ok(config);
        }

        info!("Created default configuration file: {}", path.display());
        Ok(config)
    }
}
