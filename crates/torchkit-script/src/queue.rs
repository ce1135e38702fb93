//! Command queue
//!
//! Raw command lines waiting to run, each remembering the script line it
//! came from. Lines are parsed lazily at dispatch so a malformed line only
//! fails when it is reached.

use std::collections::VecDeque;

use crate::parser::script_lines;

/// A command line waiting in the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    /// Raw command text
    pub text: String,
    /// 1-based script line, `None` for injected commands
    pub source_line: Option<usize>,
}

impl QueuedCommand {
    /// A command loaded from a script line
    pub fn from_line(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            source_line: Some(line),
        }
    }

    /// A command synthesized at run time
    pub fn injected(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_line: None,
        }
    }
}

/// FIFO of pending commands with priority insertion at the head
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    items: VecDeque<QueuedCommand>,
}

impl CommandQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from script text, skipping blank and comment lines
    pub fn from_script(script: &str) -> Self {
        Self {
            items: script_lines(script)
                .map(|(line, text)| QueuedCommand::from_line(text, line))
                .collect(),
        }
    }

    /// Append a command
    pub fn push_back(&mut self, command: QueuedCommand) {
        self.items.push_back(command);
    }

    /// Insert a command so it runs next
    pub fn push_front(&mut self, command: QueuedCommand) {
        self.items.push_front(command);
    }

    /// Take the next command
    pub fn pop_front(&mut self) -> Option<QueuedCommand> {
        self.items.pop_front()
    }

    /// The next command without removing it
    pub fn peek(&self) -> Option<&QueuedCommand> {
        self.items.front()
    }

    /// Drop every pending command
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of pending commands
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pending commands in execution order
    pub fn iter(&self) -> impl Iterator<Item = &QueuedCommand> {
        self.items.iter()
    }
}
