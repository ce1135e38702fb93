//! Emulated controller
//!
//! Stands in for the serial link when no hardware is attached. Commands are
//! logged and recorded so callers can inspect what would have been sent.

use std::sync::Arc;

use parking_lot::Mutex;
use torchkit_core::{Actuator, ActuatorCommand, ActuatorEvent, AppEvent, EventBus};

/// Actuator that records commands instead of writing them
#[derive(Debug, Clone, Default)]
pub struct MockActuator {
    sent: Arc<Mutex<Vec<ActuatorCommand>>>,
    events: Option<Arc<EventBus>>,
}

impl MockActuator {
    /// Create a silent mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that publishes `CommandSent` like a real link
    pub fn with_events(events: Arc<EventBus>) -> Self {
        Self {
            sent: Arc::default(),
            events: Some(events),
        }
    }

    /// Handle to the recorded commands, shared with clones
    pub fn log(&self) -> Arc<Mutex<Vec<ActuatorCommand>>> {
        Arc::clone(&self.sent)
    }

    /// Commands recorded so far
    pub fn sent(&self) -> Vec<ActuatorCommand> {
        self.sent.lock().clone()
    }

    /// Drain the recorded commands
    pub fn take(&self) -> Vec<ActuatorCommand> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl Actuator for MockActuator {
    fn send(&mut self, command: ActuatorCommand) {
        tracing::debug!("[mock] {}", command);
        self.sent.lock().push(command);
        if let Some(events) = &self.events {
            events
                .publish(AppEvent::Actuator(ActuatorEvent::CommandSent {
                    token: command.to_string(),
                }))
                .ok();
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
