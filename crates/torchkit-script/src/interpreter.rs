//! Tick-driven script interpreter
//!
//! The interpreter makes at most one unit of progress per tick, checked in
//! this order:
//!
//! 1. a pending `PAUSE` counts down; on expiry the pause hook runs
//! 2. a pending `GO` waits for arrival or times out
//! 3. the next queued command is parsed and dispatched
//!
//! `CYCLE` is replayed lazily: each completed move pushes a `PAUSE` to the
//! head of the queue and each completed pause pushes the next `GO`, so a
//! large repeat count never materializes in the queue.

use std::fmt;
use std::sync::Arc;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use torchkit_core::{
    AppEvent, Dwell, DwellTick, EventBus, MotionControl, ScriptError, ScriptEvent, Shuttle,
};

use crate::parser::{parse_command, Command, CycleSpec};
use crate::queue::{CommandQueue, QueuedCommand};

/// Interpreter lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpreterState {
    /// Nothing loaded or the script finished
    Idle,
    /// Executing commands
    Running,
    /// Suspended by the operator
    Paused,
    /// Halted on a failure until hard reset
    Error,
}

impl fmt::Display for InterpreterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpreterState::Idle => write!(f, "Idle"),
            InterpreterState::Running => write!(f, "Running"),
            InterpreterState::Paused => write!(f, "Paused"),
            InterpreterState::Error => write!(f, "Error"),
        }
    }
}

/// Interpreter tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Seconds a `GO` may take before the script fails
    pub movement_timeout: f64,
    /// Dwell used by `CYCLE` when the script gives none
    pub default_cycle_pause: f64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            movement_timeout: 60.0,
            default_cycle_pause: 0.5,
        }
    }
}

/// Why and where the script halted
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptFailure {
    /// The failure
    pub error: ScriptError,
    /// Text of the offending command
    pub command: String,
    /// Script line of the offending command, if it came from the script
    pub source_line: Option<usize>,
}

impl fmt::Display for ScriptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source_line {
            Some(line) => write!(f, "{} (line {}: {})", self.error, line, self.command),
            None => write!(f, "{} ({})", self.error, self.command),
        }
    }
}

#[derive(Debug, Clone)]
struct CycleReplay {
    shuttle: Shuttle,
    pause: f64,
}

#[derive(Debug, Clone)]
struct MovementWait {
    remaining: f64,
    command: QueuedCommand,
}

/// The script interpreter
#[derive(Debug)]
pub struct Interpreter {
    config: InterpreterConfig,
    state: InterpreterState,
    queue: CommandQueue,
    delay: Dwell,
    movement: Option<MovementWait>,
    replay: Option<CycleReplay>,
    failure: Option<ScriptFailure>,
    executed: usize,
    events: Arc<EventBus>,
}

impl Interpreter {
    /// Create an idle interpreter
    pub fn new(config: InterpreterConfig, events: Arc<EventBus>) -> Self {
        Self {
            config,
            state: InterpreterState::Idle,
            queue: CommandQueue::new(),
            delay: Dwell::new(),
            movement: None,
            replay: None,
            failure: None,
            executed: 0,
            events,
        }
    }

    /// Load a script and start running it
    ///
    /// Returns the number of queued commands. Only allowed from `Idle`; an
    /// empty script leaves the interpreter idle.
    pub fn run(&mut self, script: &str) -> Result<usize, ScriptError> {
        if self.state != InterpreterState::Idle {
            return Err(ScriptError::InvalidState {
                action: "run a script",
                state: self.state.to_string(),
            });
        }

        self.queue = CommandQueue::from_script(script);
        self.delay.cancel();
        self.movement = None;
        self.replay = None;
        self.failure = None;
        self.executed = 0;

        let queued = self.queue.len();
        if queued == 0 {
            tracing::info!("Script has no commands");
            return Ok(0);
        }

        tracing::info!("Running script with {} command(s)", queued);
        self.set_state(InterpreterState::Running);
        Ok(queued)
    }

    /// Advance by `dt` seconds
    pub fn tick(&mut self, motion: &mut dyn MotionControl, dt: f64) {
        if self.state != InterpreterState::Running {
            return;
        }

        match self.delay.tick(dt) {
            DwellTick::Waiting(_) => return,
            DwellTick::Elapsed => {
                self.on_pause_finished();
                return;
            }
            DwellTick::Idle => {}
        }

        if let Some(mut wait) = self.movement.take() {
            wait.remaining -= dt;
            if !motion.is_seeking_target() {
                self.on_movement_finished();
            } else if wait.remaining <= 0.0 {
                let error = ScriptError::MovementTimeout {
                    seconds: self.config.movement_timeout,
                };
                self.fail(error, &wait.command);
            } else {
                self.movement = Some(wait);
            }
            return;
        }

        self.dispatch_next(motion);
    }

    /// Suspend a running script or resume a paused one
    ///
    /// The carriage is held with the manual pause while suspended.
    pub fn toggle_pause(&mut self, motion: &mut dyn MotionControl) -> Result<(), ScriptError> {
        match self.state {
            InterpreterState::Running => {
                self.set_state(InterpreterState::Paused);
                motion.set_manual_pause(true);
                Ok(())
            }
            InterpreterState::Paused => {
                self.set_state(InterpreterState::Running);
                motion.set_manual_pause(false);
                Ok(())
            }
            state => Err(ScriptError::InvalidState {
                action: "toggle pause",
                state: state.to_string(),
            }),
        }
    }

    /// Drop everything and return to `Idle`, stopping the carriage
    pub fn hard_reset(&mut self, motion: &mut dyn MotionControl) {
        tracing::info!("Hard reset");
        self.queue.clear();
        self.replay = None;
        self.delay.cancel();
        self.movement = None;
        self.failure = None;
        self.set_state(InterpreterState::Idle);

        motion.stop_auto_movement();
        motion.set_manual_pause(false);
    }

    /// Insert a command at the head of the queue
    pub fn push_priority(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!("Injecting {}", text);
        self.events
            .publish(AppEvent::Script(ScriptEvent::CommandInjected { text: text.clone() }))
            .ok();
        self.queue.push_front(QueuedCommand::injected(text));
    }

    fn dispatch_next(&mut self, motion: &mut dyn MotionControl) {
        let Some(command) = self.queue.pop_front() else {
            self.finish();
            return;
        };

        self.executed += 1;
        tracing::debug!("Executing {}", command.text);
        self.events
            .publish(AppEvent::Script(ScriptEvent::CommandStarted {
                text: command.text.clone(),
                source_line: command.source_line,
            }))
            .ok();

        let result = parse_command(&command.text).map(|parsed| self.execute(parsed, &command, motion));
        if let Err(error) = result {
            self.fail(error, &command);
        }
    }

    fn execute(&mut self, command: Command, queued: &QueuedCommand, motion: &mut dyn MotionControl) {
        match command {
            Command::Speed(speed) => motion.set_speed(speed),
            Command::Go { x, y } => {
                let y = y.unwrap_or_else(|| motion.work_position().y);
                motion.move_to_work(DVec2::new(x, y));
                self.movement = Some(MovementWait {
                    remaining: self.config.movement_timeout,
                    command: queued.clone(),
                });
            }
            Command::Pause(seconds) => self.delay.start(seconds),
            Command::Cycle(spec) => self.start_cycle(spec),
            Command::Fire(on) => motion.set_torch(on),
            Command::Start => {}
            Command::End => {
                self.queue.clear();
                self.replay = None;
                self.finish();
            }
        }
    }

    fn start_cycle(&mut self, spec: CycleSpec) {
        if spec.count == 0 {
            tracing::debug!("CYCLE with no passes ignored");
            return;
        }

        let pause = spec.pause.unwrap_or(self.config.default_cycle_pause);
        tracing::info!(
            "Cycle between ({}, {}) and ({}, {}), {} pass(es), {}s pause",
            spec.a.x,
            spec.a.y,
            spec.b.x,
            spec.b.y,
            spec.count,
            pause
        );
        self.replay = Some(CycleReplay {
            shuttle: Shuttle::new(spec.a, spec.b, spec.count),
            pause,
        });
        self.push_priority(go_to(spec.a));
    }

    fn on_movement_finished(&mut self) {
        if let Some(pause) = self.replay.as_ref().map(|replay| replay.pause) {
            self.push_priority(Command::Pause(pause).to_string());
        }
    }

    fn on_pause_finished(&mut self) {
        let Some(replay) = self.replay.as_mut() else {
            return;
        };

        match replay.shuttle.next_leg() {
            Some(leg) => self.push_priority(go_to(leg.target)),
            None => {
                tracing::info!("Cycle complete ({} passes)", replay.shuttle.passes());
                self.replay = None;
            }
        }
    }

    fn finish(&mut self) {
        tracing::info!("Script finished after {} command(s)", self.executed);
        self.set_state(InterpreterState::Idle);
        self.events
            .publish(AppEvent::Script(ScriptEvent::Completed {
                executed: self.executed,
            }))
            .ok();
    }

    fn fail(&mut self, error: ScriptError, command: &QueuedCommand) {
        tracing::error!("Script halted at '{}': {}", command.text, error);
        self.events
            .publish(AppEvent::Script(ScriptEvent::Failed {
                message: error.to_string(),
                command: command.text.clone(),
            }))
            .ok();
        self.failure = Some(ScriptFailure {
            error,
            command: command.text.clone(),
            source_line: command.source_line,
        });
        self.set_state(InterpreterState::Error);
    }

    fn set_state(&mut self, state: InterpreterState) {
        if self.state == state {
            return;
        }
        tracing::debug!("Interpreter {} -> {}", self.state, state);
        self.events
            .publish(AppEvent::Script(ScriptEvent::StateChanged {
                from: self.state.to_string(),
                to: state.to_string(),
            }))
            .ok();
        self.state = state;
    }

    /// Current state
    pub fn state(&self) -> InterpreterState {
        self.state
    }

    /// The failure that put the interpreter in `Error`
    pub fn failure(&self) -> Option<&ScriptFailure> {
        self.failure.as_ref()
    }

    /// Commands still waiting, in execution order
    pub fn pending(&self) -> impl Iterator<Item = &QueuedCommand> {
        self.queue.iter()
    }

    /// Number of commands still waiting
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Seconds left on the current `PAUSE`
    pub fn pending_delay(&self) -> f64 {
        self.delay.remaining()
    }

    /// Whether a `GO` is waiting for arrival
    pub fn is_awaiting_movement(&self) -> bool {
        self.movement.is_some()
    }

    /// Whether a `CYCLE` replay is in progress
    pub fn is_cycle_active(&self) -> bool {
        self.replay.is_some()
    }

    /// Commands dispatched since the script started
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Active tuning
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }
}

fn go_to(point: DVec2) -> String {
    Command::Go {
        x: point.x,
        y: Some(point.y),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct StubMotion {
        position: DVec2,
        seeking: bool,
        paused: bool,
    }

    impl MotionControl for StubMotion {
        fn set_speed(&mut self, _speed: f64) {}
        fn move_to_work(&mut self, target: DVec2) {
            self.position = target;
            self.seeking = true;
        }
        fn set_torch(&mut self, _on: bool) {}
        fn set_manual_pause(&mut self, paused: bool) {
            self.paused = paused;
        }
        fn stop_auto_movement(&mut self) {
            self.seeking = false;
        }
        fn is_seeking_target(&self) -> bool {
            self.seeking
        }
        fn work_position(&self) -> DVec2 {
            self.position
        }
    }

    fn interpreter() -> Interpreter {
        Interpreter::new(InterpreterConfig::default(), Arc::new(EventBus::new()))
    }

    #[test]
    fn test_run_rejected_unless_idle() {
        let mut interp = interpreter();
        assert_eq!(interp.run("PAUSE(1)"), Ok(1));
        assert!(matches!(
            interp.run("PAUSE(1)"),
            Err(ScriptError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_empty_script_stays_idle() {
        let mut interp = interpreter();
        assert_eq!(interp.run("// nothing\n\n"), Ok(0));
        assert_eq!(interp.state(), InterpreterState::Idle);
    }

    #[test]
    fn test_go_keeps_current_y() {
        let mut interp = interpreter();
        let mut motion = StubMotion {
            position: DVec2::new(5.0, 42.0),
            ..Default::default()
        };
        interp.run("GO(10)").expect("runs");
        interp.tick(&mut motion, 0.1);
        assert_eq!(motion.position, DVec2::new(10.0, 42.0));
        assert!(interp.is_awaiting_movement());
    }

    #[test]
    fn test_toggle_pause() {
        let mut interp = interpreter();
        let mut motion = StubMotion::default();
        assert!(interp.toggle_pause(&mut motion).is_err());

        interp.run("PAUSE(10)").expect("runs");
        interp.toggle_pause(&mut motion).expect("pauses");
        assert_eq!(interp.state(), InterpreterState::Paused);
        assert!(motion.paused);

        interp.tick(&mut motion, 1.0);
        assert_eq!(interp.pending_len(), 1);

        interp.toggle_pause(&mut motion).expect("resumes");
        assert_eq!(interp.state(), InterpreterState::Running);
        assert!(!motion.paused);
    }

    #[test]
    fn test_zero_pause_does_not_stall() {
        let mut interp = interpreter();
        let mut motion = StubMotion::default();
        interp.run("PAUSE(0)\nEND").expect("runs");
        for _ in 0..3 {
            interp.tick(&mut motion, 0.1);
        }
        assert_eq!(interp.state(), InterpreterState::Idle);
    }

    #[test]
    fn test_failure_display() {
        let failure = ScriptFailure {
            error: ScriptError::UnknownCommand {
                command: "BOGUS".to_string(),
            },
            command: "BOGUS()".to_string(),
            source_line: Some(3),
        };
        assert_eq!(
            failure.to_string(),
            "Unknown command: BOGUS (line 3: BOGUS())"
        );
    }
}
