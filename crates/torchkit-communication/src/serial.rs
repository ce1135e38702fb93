//! Serial link to the carriage controller
//!
//! Provides port discovery and a fire-and-forget link:
//! - commands go through a channel to a writer thread, so the tick loop
//!   never blocks on the port
//! - a reader thread splits inbound bytes into lines and decodes speed reports
//!
//! The controller expects 8N1 framing without flow control.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use torchkit_core::{
    Actuator, ActuatorCommand, ActuatorEvent, AppEvent, ConnectionError, EventBus,
};

use crate::protocol::{decode_report, encode, ControllerReport, LineBuffer};

/// Baud rates offered to the operator
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

/// Baud rate used when none is configured
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// USB vendor/product IDs if applicable
    pub usb_ids: Option<(u16, u16)>,
}

/// List serial ports that look like a carriage controller
///
/// Filters to the patterns USB-serial boards show up as:
/// - Windows: COM* (e.g., COM1, COM3)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>, ConnectionError> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        ConnectionError::Enumeration {
            reason: e.to_string(),
        }
    })?;

    Ok(ports
        .iter()
        .filter(|port| is_controller_port(&port.port_name))
        .map(|port| {
            let (manufacturer, usb_ids) = match &port.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    (usb.manufacturer.clone(), Some((usb.vid, usb.pid)))
                }
                _ => (None, None),
            };
            SerialPortInfo {
                port_name: port.port_name.clone(),
                description: port_description(port),
                manufacturer,
                usb_ids,
            }
        })
        .collect())
}

/// Check if a port name matches the patterns USB-serial controllers use
pub fn is_controller_port(port_name: &str) -> bool {
    if let Some(number) = port_name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }

    port_name.starts_with("/dev/ttyUSB")
        || port_name.starts_with("/dev/ttyACM")
        || port_name.starts_with("/dev/cu.usbserial-")
        || port_name.starts_with("/dev/cu.usbmodem")
}

fn port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb) => format!(
            "USB {} {}",
            usb.manufacturer.as_deref().unwrap_or("Device"),
            usb.product.as_deref().unwrap_or("Serial Port")
        ),
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Parameters for opening a link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkParams {
    /// Port name
    pub port: String,
    /// Baud rate, one of [`SUPPORTED_BAUD_RATES`]
    pub baud_rate: u32,
    /// Read timeout; also bounds how long `close` waits for the reader
    pub timeout: Duration,
}

impl LinkParams {
    /// Parameters with the default baud rate and a 100 ms read timeout
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(100),
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject an empty port name or an unsupported baud rate
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.port.trim().is_empty() {
            return Err(ConnectionError::PortNotFound {
                port: self.port.clone(),
            });
        }
        if !SUPPORTED_BAUD_RATES.contains(&self.baud_rate) {
            return Err(ConnectionError::UnsupportedBaudRate {
                baud: self.baud_rate,
            });
        }
        Ok(())
    }
}

/// Traffic counters shared with the link threads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Commands written
    pub sent: u64,
    /// Reports decoded
    pub received: u64,
    /// Failed writes
    pub write_errors: u64,
    /// Most recent I/O failure
    pub last_error: Option<String>,
}

enum Outbound {
    Command(ActuatorCommand),
    Shutdown,
}

/// An open link to the controller
pub struct SerialLink {
    port: String,
    commands: mpsc::Sender<Outbound>,
    reports: mpsc::Receiver<ControllerReport>,
    stats: Arc<Mutex<LinkStats>>,
    running: Arc<AtomicBool>,
    writer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
    events: Arc<EventBus>,
}

impl SerialLink {
    /// Open a serial port and start the link threads
    pub fn open(params: &LinkParams, events: Arc<EventBus>) -> Result<Self, ConnectionError> {
        params.validate()?;

        let port = serialport::new(&params.port, params.baud_rate)
            .timeout(params.timeout)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                match e.kind {
                    serialport::ErrorKind::NoDevice => ConnectionError::PortNotFound {
                        port: params.port.clone(),
                    },
                    _ => ConnectionError::FailedToOpen {
                        port: params.port.clone(),
                        reason: e.to_string(),
                    },
                }
            })?;

        let reader = port.try_clone().map_err(|e| ConnectionError::FailedToOpen {
            port: params.port.clone(),
            reason: e.to_string(),
        })?;

        tracing::info!("Opened {} at {} baud", params.port, params.baud_rate);
        Ok(Self::from_streams(params.port.clone(), reader, port, events))
    }

    /// Run the link over arbitrary streams
    ///
    /// The reader should return `TimedOut` periodically so `close` can stop
    /// it; end of stream also stops it.
    pub fn from_streams<R, W>(port: impl Into<String>, reader: R, writer: W, events: Arc<EventBus>) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let port = port.into();
        let (command_tx, command_rx) = mpsc::channel();
        let (report_tx, report_rx) = mpsc::channel();
        let stats = Arc::new(Mutex::new(LinkStats::default()));
        let running = Arc::new(AtomicBool::new(true));

        events
            .publish(AppEvent::Actuator(ActuatorEvent::Connected { port: port.clone() }))
            .ok();

        let writer = {
            let stats = Arc::clone(&stats);
            let events = Arc::clone(&events);
            thread::spawn(move || write_loop(writer, command_rx, stats, events))
        };
        let reader = {
            let stats = Arc::clone(&stats);
            let events = Arc::clone(&events);
            let running = Arc::clone(&running);
            let port = port.clone();
            thread::spawn(move || read_loop(port, reader, report_tx, running, stats, events))
        };

        Self {
            port,
            commands: command_tx,
            reports: report_rx,
            stats,
            running,
            writer: Some(writer),
            reader: Some(reader),
            events,
        }
    }

    /// An actuator that sends through this link
    pub fn actuator(&self) -> SerialActuator {
        SerialActuator {
            port: self.port.clone(),
            commands: self.commands.clone(),
        }
    }

    /// Reports decoded since the last poll
    pub fn poll_reports(&self) -> Vec<ControllerReport> {
        self.reports.try_iter().collect()
    }

    /// Port name
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Snapshot of the traffic counters
    pub fn stats(&self) -> LinkStats {
        self.stats.lock().clone()
    }

    /// Whether the threads are still running
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Flush queued commands and stop both threads
    ///
    /// Actuators handed out earlier log a warning for anything sent after this.
    pub fn close(&mut self) {
        let Some(writer) = self.writer.take() else {
            return;
        };

        self.commands.send(Outbound::Shutdown).ok();
        self.running.store(false, Ordering::SeqCst);
        if writer.join().is_err() {
            tracing::error!("Writer thread for {} panicked", self.port);
        }
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                tracing::error!("Reader thread for {} panicked", self.port);
            }
        }

        tracing::info!("Closed {}", self.port);
        self.events
            .publish(AppEvent::Actuator(ActuatorEvent::Disconnected {
                port: self.port.clone(),
                reason: "closed".to_string(),
            }))
            .ok();
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("port", &self.port)
            .field("open", &self.is_open())
            .field("stats", &self.stats())
            .finish()
    }
}

fn write_loop<W: Write>(
    mut writer: W,
    commands: mpsc::Receiver<Outbound>,
    stats: Arc<Mutex<LinkStats>>,
    events: Arc<EventBus>,
) {
    while let Ok(Outbound::Command(command)) = commands.recv() {
        let line = encode(command);
        match writer.write_all(line.as_bytes()).and_then(|_| writer.flush()) {
            Ok(()) => {
                stats.lock().sent += 1;
                tracing::trace!("Sent {}", command);
                events
                    .publish(AppEvent::Actuator(ActuatorEvent::CommandSent {
                        token: command.to_string(),
                    }))
                    .ok();
            }
            Err(e) => {
                tracing::warn!("Write of {} failed: {}", command, e);
                let mut stats = stats.lock();
                stats.write_errors += 1;
                stats.last_error = Some(e.to_string());
            }
        }
    }
}

fn read_loop<R: Read>(
    port: String,
    mut reader: R,
    reports: mpsc::Sender<ControllerReport>,
    running: Arc<AtomicBool>,
    stats: Arc<Mutex<LinkStats>>,
    events: Arc<EventBus>,
) {
    let mut lines = LineBuffer::new();
    let mut buf = [0u8; 256];

    while running.load(Ordering::SeqCst) {
        let n = match reader.read(&mut buf) {
            Ok(0) => {
                tracing::debug!("End of stream on {}", port);
                break;
            }
            Ok(n) => n,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                continue
            }
            Err(e) => {
                tracing::warn!("Read from {} failed: {}", port, e);
                stats.lock().last_error = Some(e.to_string());
                events
                    .publish(AppEvent::Actuator(ActuatorEvent::Disconnected {
                        port: port.clone(),
                        reason: e.to_string(),
                    }))
                    .ok();
                break;
            }
        };

        for line in lines.push(&buf[..n]) {
            match decode_report(&line) {
                Some(report) => {
                    stats.lock().received += 1;
                    let ControllerReport::Speed(speed) = report;
                    events
                        .publish(AppEvent::Actuator(ActuatorEvent::SpeedReported { speed }))
                        .ok();
                    if reports.send(report).is_err() {
                        return;
                    }
                }
                None => tracing::debug!("Ignoring line from {}: {}", port, line),
            }
        }
    }
}

/// Actuator half of a [`SerialLink`]
#[derive(Clone)]
pub struct SerialActuator {
    port: String,
    commands: mpsc::Sender<Outbound>,
}

impl Actuator for SerialActuator {
    fn send(&mut self, command: ActuatorCommand) {
        if self.commands.send(Outbound::Command(command)).is_err() {
            tracing::warn!("Dropping {}: link to {} is closed", command, self.port);
        }
    }

    fn name(&self) -> &str {
        &self.port
    }
}
