use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The persisted preference pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub preferred_device_uid: Option<String>,

    #[serde(default)]
    pub hide_status_icon: bool,
}

/// Gateway over the external preference storage. Injected into the reconcile
/// engine and the menu-building callers so tests can substitute an in-memory
/// store.
pub trait PreferenceStore: Send {
    fn preferred_device_uid(&self) -> Option<String>;

    /// `None` clears the preference (the "None (allow automatic)" selection).
    fn set_preferred_device_uid(&mut self, uid: Option<&str>) -> Result<()>;

    fn hide_status_icon(&self) -> bool;

    fn set_hide_status_icon(&mut self, hide: bool) -> Result<()>;

    /// Re-read from the backing storage, e.g. on SIGHUP. Stores without a
    /// backing file keep their state.
    fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Production store backed by a TOML file under the user's config directory.
pub struct TomlPreferenceStore {
    path: PathBuf,
    state: Preferences,
}

impl TomlPreferenceStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let state = Self::read_state(&path)?;
        Ok(Self { path, state })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home_dir.join(".config/sticky-mic/preferences.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_state(path: &Path) -> Result<Preferences> {
        if !path.exists() {
            debug!(
                "Preference file not found at {}, starting with defaults",
                path.display()
            );
            return Ok(Preferences::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preference file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse preference file: {}", path.display()))
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preference directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(&self.state).context("Failed to serialize preferences")?;

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write preference file: {}", self.path.display()))?;

        debug!("Preferences saved to: {}", self.path.display());
        Ok(())
    }
}

impl PreferenceStore for TomlPreferenceStore {
    fn preferred_device_uid(&self) -> Option<String> {
        self.state.preferred_device_uid.clone()
    }

    fn set_preferred_device_uid(&mut self, uid: Option<&str>) -> Result<()> {
        self.state.preferred_device_uid = uid.map(str::to_string);
        self.save()
    }

    fn hide_status_icon(&self) -> bool {
        self.state.hide_status_icon
    }

    fn set_hide_status_icon(&mut self, hide: bool) -> Result<()> {
        self.state.hide_status_icon = hide;
        self.save()
    }

    fn reload(&mut self) -> Result<()> {
        match Self::read_state(&self.path) {
            Ok(state) => {
                if state != self.state {
                    info!("Preferences reloaded from: {}", self.path.display());
                }
                self.state = state;
                Ok(())
            }
            Err(e) => {
                warn!("Keeping current preferences, reload failed: {e:#}");
                Err(e)
            }
        }
    }
}
