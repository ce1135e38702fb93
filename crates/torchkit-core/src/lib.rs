//! # TorchKit Core
//!
//! Core types, traits, and utilities shared by the TorchKit crates.
//! Provides the actuator seam, the motion-control seam used by the script
//! interpreter, the dwell/shuttle helpers, error types, and the event bus.

pub mod actuator;
pub mod error;
pub mod event_bus;
pub mod motion;
pub mod sequence;

pub use actuator::{Actuator, ActuatorCommand, NoOpActuator, MAX_COMMAND_SPEED, SPEED_SCALE};
pub use error::{ConnectionError, Error, MotionError, Result, ScriptError};
pub use motion::MotionControl;
pub use sequence::{Dwell, DwellTick, Leg, LegKind, Shuttle};

// Re-export event bus for convenience
pub use event_bus::{
    ActuatorEvent, AppEvent, EventBus, EventBusConfig, EventBusError, EventCategory, EventFilter,
    MotionEvent, ScriptEvent, SpeedSource, SubscriptionId,
};

/// 2D vector type used for positions, velocities and waypoints (millimetres).
pub use glam::DVec2;
