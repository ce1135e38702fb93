//! # TorchKit Motion
//!
//! Open-loop motion model of the torch carriage: kinematics, the tick-driven
//! controller with its trapezoidal approach profile, manual jog input, the
//! three-waypoint auto sequence and the spray-speed calculator.

pub mod auto_sequence;
pub mod calculator;
pub mod controller;
pub mod input;
pub mod kinematics;

pub use auto_sequence::{AutoSequence, SequenceAction, SequencePhase, TransitSpeed, Waypoint};
pub use calculator::SprayProfile;
pub use controller::{MotionConfig, MotionController};
pub use input::{JogDirection, ManualInput};
pub use kinematics::KinematicRates;
