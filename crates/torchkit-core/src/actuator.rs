//! Motion actuator interface
//!
//! The carriage controller accepts short text tokens: direction (`f`, `b`,
//! `u`, `d`), stop (`s`), speed (`v<N>`) and torch ignition (`M3`/`M5`).
//! The link is fire-and-forget, so the trait has no acknowledgement path.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scale between logical mm/s and the controller's speed units.
pub const SPEED_SCALE: f64 = 0.8;

/// Highest speed (mm/s) the controller accepts before scaling.
pub const MAX_COMMAND_SPEED: f64 = 500.0;

/// A single command token for the carriage controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActuatorCommand {
    /// Advance along the dominant X axis (`f`)
    Forward,
    /// Retreat along the dominant X axis (`b`)
    Back,
    /// Move up when Y is the dominant axis (`u`)
    Up,
    /// Move down when Y is the dominant axis (`d`)
    Down,
    /// Stop all motion (`s`)
    Stop,
    /// Set speed in controller units (`v<N>`)
    Speed(u32),
    /// Ignite the torch (`M3`)
    TorchOn,
    /// Extinguish the torch (`M5`)
    TorchOff,
}

impl ActuatorCommand {
    /// Build a speed command from a logical speed in mm/s.
    ///
    /// The speed is clamped to `[0, MAX_COMMAND_SPEED]` and scaled by
    /// [`SPEED_SCALE`], e.g. 100 mm/s becomes `v80`.
    pub fn speed(mm_per_sec: f64) -> Self {
        let clamped = if mm_per_sec.is_finite() {
            mm_per_sec.clamp(0.0, MAX_COMMAND_SPEED)
        } else {
            0.0
        };
        ActuatorCommand::Speed((clamped * SPEED_SCALE).round() as u32)
    }

    /// Convert controller speed units back to mm/s.
    pub fn units_to_speed(units: u32) -> f64 {
        f64::from(units) / SPEED_SCALE
    }

    /// Torch command for the requested state
    pub fn torch(on: bool) -> Self {
        if on {
            ActuatorCommand::TorchOn
        } else {
            ActuatorCommand::TorchOff
        }
    }

    /// Whether this command starts carriage motion
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            ActuatorCommand::Forward
                | ActuatorCommand::Back
                | ActuatorCommand::Up
                | ActuatorCommand::Down
        )
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorCommand::Forward => write!(f, "f"),
            ActuatorCommand::Back => write!(f, "b"),
            ActuatorCommand::Up => write!(f, "u"),
            ActuatorCommand::Down => write!(f, "d"),
            ActuatorCommand::Stop => write!(f, "s"),
            ActuatorCommand::Speed(units) => write!(f, "v{}", units),
            ActuatorCommand::TorchOn => write!(f, "M3"),
            ActuatorCommand::TorchOff => write!(f, "M5"),
        }
    }
}

/// Sink for actuator commands
///
/// Implementations must not block the tick loop; serial implementations
/// hand the command to a writer thread and return immediately.
pub trait Actuator: Send {
    /// Send one command to the carriage controller
    fn send(&mut self, command: ActuatorCommand);

    /// Short name for logging
    fn name(&self) -> &str {
        "actuator"
    }
}

/// Actuator that discards every command
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpActuator;

impl Actuator for NoOpActuator {
    fn send(&mut self, command: ActuatorCommand) {
        tracing::trace!("Discarding actuator command {}", command);
    }

    fn name(&self) -> &str {
        "noop"
    }
}
