//! Error handling for TorchKit
//!
//! Provides the error types for each layer of the console:
//! - Motion errors (rejected machine parameters)
//! - Script errors (parsing, argument validation, movement timeouts)
//! - Connection errors (serial link to the carriage controller)
//!
//! All error types use `thiserror` for ergonomic error handling.
//! Out-of-range motion targets are not errors: they are clamped to the
//! machine travel limits by the motion controller.

use thiserror::Error;

/// Motion error type
///
/// Raised when a machine parameter is unusable, e.g. a non-positive
/// workpiece diameter handed to the spray-speed calculator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// A parameter was non-finite or outside its domain
    #[error("Invalid {name}: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Script error type
///
/// Raised while parsing or executing a single script command. A script error
/// never corrupts the commands that are still queued behind it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// The line contained no command keyword
    #[error("Empty command")]
    EmptyCommand,

    /// The command keyword is not part of the script language
    #[error("Unknown command: {command}")]
    UnknownCommand {
        /// The unrecognised keyword, upper-cased.
        command: String,
    },

    /// A numeric argument could not be parsed
    #[error("Invalid number '{value}'")]
    InvalidNumber {
        /// The offending argument text.
        value: String,
    },

    /// The command received the wrong number of arguments
    #[error("{command} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        /// The command keyword.
        command: String,
        /// Human readable description of the accepted counts.
        expected: &'static str,
        /// Number of arguments actually supplied.
        actual: usize,
    },

    /// An argument parsed but its value is not usable
    #[error("Invalid argument for {command}: {reason}")]
    InvalidArgument {
        /// The command keyword.
        command: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The carriage never reported arrival within the wait budget
    #[error("Movement timeout after {seconds}s")]
    MovementTimeout {
        /// The wait budget in seconds of simulated time.
        seconds: f64,
    },

    /// The requested operation is not allowed in the current interpreter state
    #[error("Cannot {action} while interpreter is {state}")]
    InvalidState {
        /// The attempted operation.
        action: &'static str,
        /// The interpreter state at the time.
        state: String,
    },
}

impl ScriptError {
    /// Check if this error came from parsing a command line
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ScriptError::EmptyCommand
                | ScriptError::UnknownCommand { .. }
                | ScriptError::InvalidNumber { .. }
                | ScriptError::ArgumentCount { .. }
                | ScriptError::InvalidArgument { .. }
        )
    }
}

/// Connection error type
///
/// Represents errors on the serial link to the carriage controller.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// Port not found
    #[error("Port not found: {port}")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Baud rate not supported
    #[error("Baud rate {baud} not supported")]
    UnsupportedBaudRate {
        /// The unsupported baud rate.
        baud: u32,
    },

    /// Port enumeration failed
    #[error("Failed to enumerate ports: {reason}")]
    Enumeration {
        /// The reason enumeration failed.
        reason: String,
    },

    /// The link is closed
    #[error("Link closed: {port}")]
    Closed {
        /// The port whose link was closed.
        port: String,
    },
}

/// Main error type for TorchKit
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Motion error
    #[error(transparent)]
    Motion(#[from] MotionError),

    /// Script error
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a movement timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Script(ScriptError::MovementTimeout { .. }))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
