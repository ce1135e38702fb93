//! Wire protocol
//!
//! Outbound commands are single tokens terminated by `\n`. The only inbound
//! message the controller sends is a speed report, `v<N>`, in controller units.

use torchkit_core::ActuatorCommand;

/// Terminator appended to every outbound token
pub const LINE_TERMINATOR: char = '\n';

/// A message received from the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerReport {
    /// Current speed in mm/s
    Speed(f64),
}

/// Encode a command as a wire line
pub fn encode(command: ActuatorCommand) -> String {
    let mut line = command.to_string();
    line.push(LINE_TERMINATOR);
    line
}

/// Decode one inbound line, `None` for anything unrecognised
pub fn decode_report(line: &str) -> Option<ControllerReport> {
    let units = line.trim().strip_prefix('v')?;
    let units: u32 = units.parse().ok()?;
    Some(ControllerReport::Speed(ActuatorCommand::units_to_speed(units)))
}

/// Splits a byte stream into lines
///
/// Accepts `\n` and `\r\n` endings; partial lines are kept until the rest
/// arrives. Invalid UTF-8 is replaced rather than dropped.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and collect every completed, non-empty line
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                let line = String::from_utf8_lossy(&self.pending).trim().to_string();
                self.pending.clear();
                if !line.is_empty() {
                    lines.push(line);
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Bytes received since the last line ending
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
