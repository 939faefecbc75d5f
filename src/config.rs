use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::{dlog_debug, Error, Result};

/// Default settle delay before a scheduled auto-navigation fires, in
/// milliseconds.
pub const DEFAULT_ADVANCE_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Automatically navigate to the next ready task after a completion.
    #[serde(default = "default_auto_advance")]
    pub auto_advance: bool,
    /// Delay before the scheduled navigation fires, letting the UI settle.
    #[serde(default = "default_advance_delay_ms")]
    pub advance_delay_ms: u64,
    /// Override for the workflow data directory.
    pub data_dir: Option<String>,
}

fn default_auto_advance() -> bool {
    true
}

fn default_advance_delay_ms() -> u64 {
    DEFAULT_ADVANCE_DELAY_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_advance: true,
            advance_delay_ms: DEFAULT_ADVANCE_DELAY_MS,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn dayflow_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".dayflow"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::dayflow_dir()?.join("dayflow.toml"))
    }

    pub fn workflows_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(expand_tilde(dir)),
            None => Ok(Self::dayflow_dir()?.join("workflows")),
        }
    }

    pub fn advance_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.advance_delay_ms)
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        dlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            dlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(&path)?)?;
        dlog_debug!(
            "Config loaded: auto_advance={}, advance_delay_ms={}, data_dir={:?}",
            config.auto_advance,
            config.advance_delay_ms,
            config.data_dir
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let dayflow_dir = Self::dayflow_dir()?;
        dlog_debug!("Config::save dayflow_dir={}", dayflow_dir.display());
        if !dayflow_dir.exists() {
            dlog_debug!("Creating dayflow directory");
            fs::create_dir_all(&dayflow_dir)?;
        }
        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?)?;
        dlog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        let dayflow_dir = Self::dayflow_dir()?;
        let workflows_dir = self.workflows_dir()?;
        dlog_debug!(
            "Config::ensure_dirs dayflow={} workflows={}",
            dayflow_dir.display(),
            workflows_dir.display()
        );
        if !dayflow_dir.exists() {
            fs::create_dir_all(&dayflow_dir)?;
        }
        if !workflows_dir.exists() {
            fs::create_dir_all(&workflows_dir)?;
        }
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
