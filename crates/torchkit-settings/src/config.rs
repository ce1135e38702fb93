//! Configuration for TorchKit
//!
//! Configuration is organized into sections:
//! - Machine parameters (travel limits, speeds, ramps, dwell)
//! - Script execution (timeouts, cycle pause, tick rate)
//! - Connection settings (port, baud rate, emulation)
//!
//! Files are JSON or TOML, chosen by extension. Missing sections and keys
//! fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SettingsError, SettingsResult};

/// Machine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Travel along X in mm
    pub width: f64,
    /// Travel along Y in mm
    pub height: f64,
    /// Initial maximum speed in mm/s
    pub max_speed: f64,
    /// Speed restored by an emergency stop in mm/s
    pub default_speed: f64,
    /// Positioning speed of the auto sequence in mm/s
    pub fast_speed: f64,
    /// Seconds from rest to full speed
    pub accel_time: f64,
    /// Seconds from full speed to rest
    pub decel_time: f64,
    /// Arrival threshold in mm
    pub stop_radius: f64,
    /// Dwell at each cut waypoint in seconds
    pub dwell: f64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 900.0,
            max_speed: 100.0,
            default_speed: 100.0,
            fast_speed: 300.0,
            accel_time: 0.25,
            decel_time: 0.25,
            stop_radius: 1.0,
            dwell: 3.0,
        }
    }
}

/// Script execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Seconds a GO may take before the script fails
    pub movement_timeout: f64,
    /// Default CYCLE dwell in seconds
    pub default_cycle_pause: f64,
    /// Simulation ticks per second
    pub tick_rate_hz: u32,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            movement_timeout: 60.0,
            default_cycle_pause: 0.5,
            tick_rate_hz: 60,
        }
    }
}

impl ScriptSettings {
    /// Seconds per tick
    pub fn tick_period(&self) -> f64 {
        1.0 / f64::from(self.tick_rate_hz.max(1))
    }
}

/// Connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial port, `None` to pick at run time
    pub port: Option<String>,
    /// Baud rate for the serial link
    pub baud_rate: u32,
    /// Read timeout in milliseconds
    pub timeout_ms: u64,
    /// Emulate the controller instead of opening a port
    pub mock: bool,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
            timeout_ms: 100,
            mock: true,
        }
    }
}

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(ConfigFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(ConfigFormat::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Machine parameters
    pub machine: MachineSettings,
    /// Script execution
    pub script: ScriptSettings,
    /// Controller link
    pub connection: ConnectionSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| {
            SettingsError::SaveError(format!("{}: {}", path.display(), e))
        })?;

        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Load from `path` if it exists, otherwise return the defaults
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let machine = &self.machine;
        positive("machine.width", machine.width)?;
        positive("machine.height", machine.height)?;
        positive("machine.max_speed", machine.max_speed)?;
        positive("machine.default_speed", machine.default_speed)?;
        positive("machine.fast_speed", machine.fast_speed)?;
        non_negative("machine.accel_time", machine.accel_time)?;
        non_negative("machine.decel_time", machine.decel_time)?;
        positive("machine.stop_radius", machine.stop_radius)?;
        non_negative("machine.dwell", machine.dwell)?;

        positive("script.movement_timeout", self.script.movement_timeout)?;
        non_negative("script.default_cycle_pause", self.script.default_cycle_pause)?;
        if self.script.tick_rate_hz == 0 {
            return Err(SettingsError::invalid("script.tick_rate_hz", "must be > 0"));
        }

        if self.connection.baud_rate == 0 {
            return Err(SettingsError::invalid("connection.baud_rate", "must be > 0"));
        }
        if self.connection.timeout_ms == 0 {
            return Err(SettingsError::invalid("connection.timeout_ms", "must be > 0"));
        }
        if !self.connection.mock && self.connection.port.as_deref().map_or(true, str::is_empty) {
            return Err(SettingsError::invalid(
                "connection.port",
                "required unless mock is enabled",
            ));
        }

        Ok(())
    }
}

fn positive(key: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::invalid(key, format!("must be > 0, got {}", value)))
    }
}

fn non_negative(key: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::invalid(key, format!("must be >= 0, got {}", value)))
    }
}

/// Platform config directory for TorchKit, e.g. `~/.config/torchkit`
pub fn config_dir() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("torchkit"))
        .ok_or_else(|| SettingsError::ConfigDirectory("no config directory on this platform".to_string()))
}

/// Default config file location
pub fn default_config_path() -> SettingsResult<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
