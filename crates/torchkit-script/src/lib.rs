//! # TorchKit Script
//!
//! Line-oriented cycle scripting for the torch carriage.
//!
//! ```text
//! START
//! SPEED(80)
//! GO(100, 0)
//! FIRE(1)
//! CYCLE(100, 0, 400, 0, 5, 1.5)
//! FIRE(0)
//! END
//! ```
//!
//! Scripts are split into a [`CommandQueue`] and executed one command per
//! tick by the [`Interpreter`], which drives any [`torchkit_core::MotionControl`].

pub mod help;
pub mod interpreter;
pub mod parser;
pub mod preview;
pub mod queue;

pub use help::{help_for, help_text, HelpEntry};
pub use interpreter::{Interpreter, InterpreterConfig, InterpreterState, ScriptFailure};
pub use parser::{parse_command, validate_script, Command, CycleSpec, LineDiagnostic};
pub use preview::{preview_points, PreviewKind, PreviewPoint, ScriptPreview};
pub use queue::{CommandQueue, QueuedCommand};
