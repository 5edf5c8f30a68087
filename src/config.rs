//! Configuration management
//!
//! Config file is stored next to the executable as `dragoonplot.toml`.
//! It holds the last used port, plot settings, per-channel display
//! settings and command buttons.

use crate::commands::CommandButton;
use crate::constants::{DEFAULT_BAUD_RATE, DEFAULT_TIME_WINDOW, MAX_TIME_WINDOW, MIN_TIME_WINDOW};
use crate::error::{PlotError, Result};
use crate::store::ChannelConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name looked up next to the executable
pub const CONFIG_FILE_NAME: &str = "dragoonplot.toml";

// =============================================================================
// Application Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub plot: PlotConfig,
    pub channels: Vec<ChannelConfig>,
    pub buttons: Vec<CommandButton>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port used last time (empty = none)
    pub last_port: String,
    pub last_baud: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            last_port: String::new(),
            last_baud: DEFAULT_BAUD_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Visible time span in seconds
    pub time_window: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            time_window: DEFAULT_TIME_WINDOW,
        }
    }
}

impl PlotConfig {
    /// Set the window, clamped to the supported range
    pub fn set_time_window(&mut self, seconds: f64) {
        self.time_window = clamp_time_window(seconds);
    }
}

/// Clamp to `MIN_TIME_WINDOW..=MAX_TIME_WINDOW`; NaN becomes the default
pub fn clamp_time_window(seconds: f64) -> f64 {
    if seconds.is_nan() {
        return DEFAULT_TIME_WINDOW;
    }
    seconds.clamp(MIN_TIME_WINDOW, MAX_TIME_WINDOW)
}

impl AppConfig {
    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.serial.last_baud == 0 {
            return Err(PlotError::ConfigValidation {
                field: "serial.last_baud",
                reason: "must be non-zero".into(),
            });
        }
        let window = self.plot.time_window;
        if !(MIN_TIME_WINDOW..=MAX_TIME_WINDOW).contains(&window) {
            return Err(PlotError::ConfigValidation {
                field: "plot.time_window",
                reason: format!(
                    "{} outside {}..={} seconds",
                    window, MIN_TIME_WINDOW, MAX_TIME_WINDOW
                ),
            });
        }
        Ok(())
    }

    /// Replace discovered buttons, keeping user-defined ones
    pub fn merge_discovered(&mut self, discovered: Vec<CommandButton>) {
        if discovered.is_empty() {
            return;
        }
        self.buttons.retain(|b| b.category.is_none());
        self.buttons.extend(discovered);
    }
}

// =============================================================================
// File access
// =============================================================================

/// Config path next to the executable, or in the working directory when
/// the executable path is unavailable
pub fn default_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Load config from file; missing or invalid files yield defaults
pub fn load(path: &Path) -> AppConfig {
    if !path.exists() {
        debug!("No config at {:?}, using defaults", path);
        return AppConfig::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read config {:?}: {}, using defaults", path, e);
            return AppConfig::default();
        }
    };

    let mut config: AppConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Config parse error in {:?}: {}, using defaults", path, e);
            return AppConfig::default();
        }
    };

    if let Err(e) = config.validate() {
        warn!("{} in {:?}, using default for that field", e, path);
        if config.serial.last_baud == 0 {
            config.serial.last_baud = DEFAULT_BAUD_RATE;
        }
        config.plot.set_time_window(config.plot.time_window);
    }
    config
}

/// Save config to file
pub fn save(path: &Path, config: &AppConfig) -> Result<()> {
    let content = toml::to_string_pretty(config).map_err(|e| PlotError::ConfigFormat {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(path, content).map_err(|e| PlotError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!("Config saved to {:?}", path);
    Ok(())
}
