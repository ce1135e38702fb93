//! Operator console
//!
//! Owns the motion controller, the script interpreter and the event bus, and
//! advances them together once per frame. The interpreter ticks first so a
//! command dispatched this frame moves the carriage in the same frame.

use std::sync::Arc;

use glam::DVec2;
use torchkit_communication::ControllerReport;
use torchkit_core::{Actuator, Error, EventBus, ScriptError};
use torchkit_motion::{MotionConfig, MotionController, Waypoint};
use torchkit_script::{Interpreter, InterpreterConfig, InterpreterState, ScriptPreview};
use torchkit_settings::{Config, MachineSettings, ScriptSettings};

/// Motion parameters from the machine settings
pub fn motion_config(machine: &MachineSettings) -> MotionConfig {
    MotionConfig {
        bounds: DVec2::new(machine.width, machine.height),
        max_speed: machine.max_speed,
        accel_time: machine.accel_time,
        decel_time: machine.decel_time,
        stop_radius: machine.stop_radius,
        fast_speed: machine.fast_speed,
        default_speed: machine.default_speed,
        dwell: machine.dwell,
    }
}

/// Interpreter tuning from the script settings
pub fn interpreter_config(script: &ScriptSettings) -> InterpreterConfig {
    InterpreterConfig {
        movement_timeout: script.movement_timeout,
        default_cycle_pause: script.default_cycle_pause,
    }
}

/// Controller, interpreter and waypoint store driven by one clock
pub struct Console {
    controller: MotionController,
    interpreter: Interpreter,
    events: Arc<EventBus>,
    waypoints: [Option<DVec2>; 3],
    elapsed: f64,
}

impl Console {
    /// Build a console from a loaded configuration
    pub fn new(config: &Config, actuator: Box<dyn Actuator>, events: Arc<EventBus>) -> Self {
        tracing::info!(
            "Console on {} ({}x{} mm)",
            actuator.name(),
            config.machine.width,
            config.machine.height
        );
        Self {
            controller: MotionController::new(
                motion_config(&config.machine),
                actuator,
                Arc::clone(&events),
            ),
            interpreter: Interpreter::new(interpreter_config(&config.script), Arc::clone(&events)),
            events,
            waypoints: [None; 3],
            elapsed: 0.0,
        }
    }

    /// Advance the interpreter and then the carriage by `dt` seconds
    pub fn tick(&mut self, dt: f64) {
        self.interpreter.tick(&mut self.controller, dt);
        self.controller.tick(dt);
        self.elapsed += dt;
    }

    /// Tick until the interpreter leaves `Running` or `limit` seconds pass
    ///
    /// Returns the simulated time spent.
    pub fn run_until_settled(&mut self, dt: f64, limit: f64) -> f64 {
        let start = self.elapsed;
        while self.interpreter.state() == InterpreterState::Running
            && self.elapsed - start < limit
        {
            self.tick(dt);
        }
        self.elapsed - start
    }

    /// Load and start a script
    pub fn run_script(&mut self, script: &str) -> Result<usize, ScriptError> {
        self.interpreter.run(script)
    }

    /// Pause or resume the running script
    pub fn toggle_script_pause(&mut self) -> Result<(), ScriptError> {
        self.interpreter.toggle_pause(&mut self.controller)
    }

    /// Abort the script and stop the carriage
    pub fn hard_reset(&mut self) {
        self.interpreter.hard_reset(&mut self.controller);
    }

    /// Abort everything and restore the safe speed
    pub fn emergency_stop(&mut self) {
        self.interpreter.hard_reset(&mut self.controller);
        self.controller.emergency_stop();
    }

    /// Remember the carriage's current work position as a waypoint
    pub fn save_waypoint(&mut self, waypoint: Waypoint) -> DVec2 {
        let position = self.controller.work_position();
        self.set_waypoint(waypoint, position);
        position
    }

    /// Set a waypoint explicitly, in work coordinates
    pub fn set_waypoint(&mut self, waypoint: Waypoint, position: DVec2) {
        tracing::info!(
            "Waypoint {:?} set to ({:.1}, {:.1})",
            waypoint,
            position.x,
            position.y
        );
        self.waypoints[waypoint as usize] = Some(position);
    }

    /// A stored waypoint
    pub fn waypoint(&self, waypoint: Waypoint) -> Option<DVec2> {
        self.waypoints[waypoint as usize]
    }

    /// Start the three-waypoint auto sequence with the stored waypoints
    pub fn start_sequence(&mut self, cycles: u32) -> Result<(), Error> {
        let [Some(home), Some(start), Some(end)] = self.waypoints else {
            return Err(Error::other("All three waypoints must be set"));
        };
        self.controller.start_auto_sequence([home, start, end], cycles);
        Ok(())
    }

    /// Feed a report received over the serial link
    pub fn handle_report(&mut self, report: ControllerReport) {
        match report {
            ControllerReport::Speed(speed) => self.controller.handle_actuator_report(speed),
        }
    }

    /// Waypoints of `script` in machine coordinates at the current work offset
    pub fn preview(&self, script: &str) -> ScriptPreview {
        ScriptPreview::build(script, self.controller.work_offset())
    }

    /// The motion controller
    pub fn controller(&self) -> &MotionController {
        &self.controller
    }

    /// The motion controller, for jog input and manual commands
    pub fn controller_mut(&mut self) -> &mut MotionController {
        &mut self.controller
    }

    /// The script interpreter
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// The shared event bus
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Simulated seconds since the console was created
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("controller", &self.controller)
            .field("interpreter", &self.interpreter.state())
            .field("waypoints", &self.waypoints)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}
