//! # TorchKit Communication
//!
//! Transport between the console and the carriage controller: the text token
//! protocol, a threaded serial link and an emulated controller for running
//! without hardware.

pub mod mock;
pub mod protocol;
pub mod serial;

pub use mock::MockActuator;
pub use protocol::{decode_report, encode, ControllerReport, LineBuffer};
pub use serial::{
    is_controller_port, list_ports, LinkParams, LinkStats, SerialActuator, SerialLink,
    SerialPortInfo, DEFAULT_BAUD_RATE, SUPPORTED_BAUD_RATES,
};
