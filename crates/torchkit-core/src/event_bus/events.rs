//! Event type definitions for the event bus.
//!
//! Events are grouped by the component that raises them and are cloneable
//! and serializable so they can be logged or replayed.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Root event enum for all console events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Carriage motion and waypoint sequence events
    Motion(MotionEvent),
    /// Script interpreter events
    Script(ScriptEvent),
    /// Serial link and controller events
    Actuator(ActuatorEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Motion(_) => EventCategory::Motion,
            AppEvent::Script(_) => EventCategory::Script,
            AppEvent::Actuator(_) => EventCategory::Actuator,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Motion(e) => e.description(),
            AppEvent::Script(e) => e.description(),
            AppEvent::Actuator(e) => e.description(),
        }
    }

    /// Serialize the event as a single JSON line
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Motion controller events.
    Motion,
    /// Script interpreter events.
    Script,
    /// Actuator link events.
    Actuator,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Motion => write!(f, "Motion"),
            EventCategory::Script => write!(f, "Script"),
            EventCategory::Actuator => write!(f, "Actuator"),
        }
    }
}

/// Where a speed value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedSource {
    /// Set locally by a script, the operator or the auto sequence
    Commanded,
    /// Reported back by the carriage controller
    Reported,
}

/// Motion controller events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionEvent {
    /// Carriage position changed.
    PositionChanged {
        /// Position in machine coordinates (mm).
        machine: DVec2,
        /// Position relative to the work offset (mm).
        work: DVec2,
    },
    /// Maximum travel speed changed.
    SpeedChanged {
        /// New speed in mm/s.
        speed: f64,
        /// Origin of the change.
        source: SpeedSource,
    },
    /// Seconds left in the auto-sequence dwell.
    PauseCountdown {
        /// Remaining seconds.
        remaining: f64,
    },
    /// The waypoint sequence returned home.
    SequenceFinished,
    /// Torch ignition state changed.
    TorchChanged {
        /// Whether the torch is lit.
        on: bool,
    },
    /// A sought target was reached.
    TargetReached {
        /// Arrival position in work coordinates (mm).
        position: DVec2,
    },
    /// Operator pause engaged or released.
    ManualPauseChanged {
        /// Whether motion is now paused.
        paused: bool,
    },
    /// Emergency stop performed.
    EmergencyStop,
}

impl MotionEvent {
    fn description(&self) -> String {
        match self {
            MotionEvent::PositionChanged { work, .. } => {
                format!("Position X:{:.1} Y:{:.1}", work.x, work.y)
            }
            MotionEvent::SpeedChanged { speed, source } => {
                format!("Speed {:.1} mm/s ({:?})", speed, source)
            }
            MotionEvent::PauseCountdown { remaining } => format!("Pause: {:.1}s", remaining),
            MotionEvent::SequenceFinished => "Sequence finished".to_string(),
            MotionEvent::TorchChanged { on } => {
                format!("Torch {}", if *on { "on" } else { "off" })
            }
            MotionEvent::TargetReached { position } => {
                format!("Reached X:{:.1} Y:{:.1}", position.x, position.y)
            }
            MotionEvent::ManualPauseChanged { paused } => {
                format!("Manual pause {}", if *paused { "engaged" } else { "released" })
            }
            MotionEvent::EmergencyStop => "Emergency stop".to_string(),
        }
    }
}

/// Script interpreter events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptEvent {
    /// Interpreter state transition.
    StateChanged {
        /// Previous state name.
        from: String,
        /// New state name.
        to: String,
    },
    /// A command was dequeued and dispatched.
    CommandStarted {
        /// Command text as queued.
        text: String,
        /// 1-based script line, absent for injected commands.
        source_line: Option<usize>,
    },
    /// A command was pushed to the front of the queue.
    CommandInjected {
        /// Command text as queued.
        text: String,
    },
    /// Execution halted on an error.
    Failed {
        /// Error message.
        message: String,
        /// Command text that failed.
        command: String,
    },
    /// Queue drained without error.
    Completed {
        /// Number of commands dispatched.
        executed: usize,
    },
}

impl ScriptEvent {
    fn description(&self) -> String {
        match self {
            ScriptEvent::StateChanged { from, to } => format!("Script {} -> {}", from, to),
            ScriptEvent::CommandStarted { text, source_line } => match source_line {
                Some(line) => format!("Line {}: {}", line, text),
                None => format!("Injected: {}", text),
            },
            ScriptEvent::CommandInjected { text } => format!("Queued first: {}", text),
            ScriptEvent::Failed { message, command } => {
                format!("Script failed at '{}': {}", command, message)
            }
            ScriptEvent::Completed { executed } => {
                format!("Script completed ({} commands)", executed)
            }
        }
    }
}

/// Serial link events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActuatorEvent {
    /// Link opened.
    Connected {
        /// Port name.
        port: String,
    },
    /// Link closed.
    Disconnected {
        /// Port name.
        port: String,
        /// Why the link went away.
        reason: String,
    },
    /// A command token was written.
    CommandSent {
        /// Token text, e.g. `v80`.
        token: String,
    },
    /// The controller reported its speed.
    SpeedReported {
        /// Reported speed in mm/s.
        speed: f64,
    },
}

impl ActuatorEvent {
    fn description(&self) -> String {
        match self {
            ActuatorEvent::Connected { port } => format!("Connected to {}", port),
            ActuatorEvent::Disconnected { port, reason } => {
                format!("Disconnected from {}: {}", port, reason)
            }
            ActuatorEvent::CommandSent { token } => format!("Sent {}", token),
            ActuatorEvent::SpeedReported { speed } => format!("Controller speed {:.1} mm/s", speed),
        }
    }
}
