//! TorchKit Settings Crate
//!
//! Handles application configuration and its persistence.

pub mod config;
pub mod error;

pub use config::{
    config_dir, default_config_path, Config, ConfigFormat, ConnectionSettings, MachineSettings,
    ScriptSettings,
};
pub use error::{SettingsError, SettingsResult};
