//! # TorchKit
//!
//! Operator console core for a two-axis torch carriage.
//!
//! ## Architecture
//!
//! TorchKit is organized as a workspace with multiple crates:
//!
//! 1. **torchkit-core** - Actuator protocol, errors, event bus, shared dwell/shuttle helper
//! 2. **torchkit-motion** - Motion controller, kinematics, auto sequence, spray calculator
//! 3. **torchkit-script** - Script parser, command queue, interpreter, preview
//! 4. **torchkit-communication** - Serial link and emulated controller
//! 5. **torchkit-settings** - Configuration files
//! 6. **torchkit** - The [`Console`] that ties them together, plus a headless runner

pub mod console;

pub use console::{interpreter_config, motion_config, Console};

pub use torchkit_core::{
    Actuator, ActuatorCommand, AppEvent, ConnectionError, Error, EventBus, EventBusConfig,
    EventCategory, EventFilter, MotionControl, MotionError, MotionEvent, Result, ScriptError,
    ScriptEvent,
};

pub use torchkit_motion::{
    JogDirection, MotionConfig, MotionController, SequencePhase, SprayProfile, Waypoint,
};

pub use torchkit_script::{
    help_text, preview_points, validate_script, Interpreter, InterpreterConfig,
    InterpreterState, ScriptFailure, ScriptPreview,
};

pub use torchkit_communication::{list_ports, LinkParams, MockActuator, SerialLink};

pub use torchkit_settings::{default_config_path, Config};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
