//! Carriage motion controller
//!
//! Open-loop model of the carriage. Every tick integrates a velocity that
//! chases either the active target (trapezoidal approach) or the manual jog
//! input, and emits actuator tokens when the intent changes: a direction on
//! a new target, `s` on arrival or pause, `v<N>` on a speed change.

use std::sync::Arc;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use torchkit_core::{
    Actuator, ActuatorCommand, AppEvent, EventBus, MotionControl, MotionEvent, SpeedSource,
};

use crate::auto_sequence::{AutoSequence, SequenceAction, SequencePhase, TransitSpeed};
use crate::input::{JogDirection, ManualInput};
use crate::kinematics::{self, KinematicRates};

/// Speeds closer than this are considered equal by `set_speed`
const SPEED_TOLERANCE: f64 = 1e-3;

/// Positions closer than this do not raise a position change
const POSITION_TOLERANCE: f64 = 1e-9;

/// Machine parameters for the motion controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Travel limits in mm; positions are clamped to `[0, bounds]`
    pub bounds: DVec2,
    /// Initial maximum speed (mm/s)
    pub max_speed: f64,
    /// Time to reach `max_speed` from rest (s)
    pub accel_time: f64,
    /// Time to stop from `max_speed` (s)
    pub decel_time: f64,
    /// Arrival threshold (mm)
    pub stop_radius: f64,
    /// Positioning speed used by the auto sequence (mm/s)
    pub fast_speed: f64,
    /// Safe speed restored by an emergency stop (mm/s)
    pub default_speed: f64,
    /// Dwell at each cut waypoint (s)
    pub dwell: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            bounds: DVec2::new(1600.0, 900.0),
            max_speed: 100.0,
            accel_time: 0.25,
            decel_time: 0.25,
            stop_radius: 1.0,
            fast_speed: 300.0,
            default_speed: 100.0,
            dwell: 3.0,
        }
    }
}

/// The carriage motion controller
pub struct MotionController {
    config: MotionConfig,
    max_speed: f64,
    rates: KinematicRates,
    position: DVec2,
    velocity: DVec2,
    work_offset: DVec2,
    target: Option<DVec2>,
    seeking: bool,
    manual_pause: bool,
    torch_on: bool,
    input: ManualInput,
    jog_token: Option<ActuatorCommand>,
    sequence: AutoSequence,
    base_speed: f64,
    reported_speed: Option<f64>,
    actuator: Box<dyn Actuator>,
    events: Arc<EventBus>,
}

impl MotionController {
    /// Create a controller parked at the machine origin
    pub fn new(config: MotionConfig, actuator: Box<dyn Actuator>, events: Arc<EventBus>) -> Self {
        let max_speed = config.max_speed.max(0.0);
        let rates = KinematicRates::new(max_speed, config.accel_time, config.decel_time);
        let mut sequence = AutoSequence::default();
        sequence.set_dwell_duration(config.dwell);

        Self {
            max_speed,
            rates,
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            work_offset: DVec2::ZERO,
            target: None,
            seeking: false,
            manual_pause: false,
            torch_on: false,
            input: ManualInput::default(),
            jog_token: None,
            sequence,
            base_speed: max_speed,
            reported_speed: None,
            actuator,
            events,
            config,
        }
    }

    /// Advance the simulation by `dt` seconds
    pub fn tick(&mut self, dt: f64) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }

        if self.manual_pause {
            self.velocity = DVec2::ZERO;
            return;
        }

        if self.sequence.is_dwelling() {
            let action = self.sequence.tick(dt);
            self.apply_sequence_action(action);
            return;
        }

        let (target_velocity, rate) = if self.seeking {
            let Some(target) = self.target else {
                self.seeking = false;
                return;
            };
            let diff = target - self.position;
            let dist = diff.length();

            if dist < self.config.stop_radius {
                self.set_position(target);
                self.velocity = DVec2::ZERO;
                self.arrive();
                return;
            }

            let target_speed = self
                .max_speed
                .min(kinematics::permitted_speed(self.rates.decel, dist));
            let rate = if target_speed < self.max_speed {
                self.rates.decel
            } else {
                self.rates.accel
            };
            (diff / dist * target_speed, rate)
        } else if !self.sequence.is_active() {
            let input = self.input.vector();
            self.update_jog_token(input);
            if input.length_squared() > 0.0 {
                (input * self.max_speed, self.rates.accel)
            } else {
                (DVec2::ZERO, self.rates.decel)
            }
        } else {
            (DVec2::ZERO, self.rates.decel)
        };

        self.velocity = kinematics::move_toward(self.velocity, target_velocity, rate * dt);
        self.set_position(self.position + self.velocity * dt);
    }

    /// Seek a target in machine coordinates
    ///
    /// The target is clamped to the travel limits. While the manual pause is
    /// engaged the target is only recorded; releasing the pause starts it.
    pub fn move_to(&mut self, target: DVec2) {
        let clamped = kinematics::clamp_to_bounds(target, self.config.bounds);
        if clamped != target {
            tracing::warn!(
                "Target ({:.1}, {:.1}) clamped to ({:.1}, {:.1})",
                target.x,
                target.y,
                clamped.x,
                clamped.y
            );
        }

        self.target = Some(clamped);
        self.seeking = true;
        tracing::debug!("Seeking ({:.1}, {:.1})", clamped.x, clamped.y);

        if !self.manual_pause {
            self.send_direction(clamped);
        }
    }

    /// Seek a target given relative to the work offset
    pub fn move_to_work(&mut self, target: DVec2) {
        self.move_to(target + self.work_offset);
    }

    /// Abandon the current target and stop the carriage
    ///
    /// While the auto sequence runs this counts as reaching the waypoint.
    pub fn stop_auto_movement(&mut self) {
        if !self.seeking {
            return;
        }
        self.seeking = false;
        self.target = None;
        self.send(ActuatorCommand::Stop);

        if self.sequence.is_active() {
            let action = self.sequence.on_arrival();
            self.apply_sequence_action(action);
        }
    }

    /// Change the maximum travel speed (mm/s)
    pub fn set_speed(&mut self, speed: f64) {
        if !speed.is_finite() {
            tracing::warn!("Ignoring non-finite speed {}", speed);
            return;
        }
        let speed = speed.max(0.0);
        if (speed - self.max_speed).abs() < SPEED_TOLERANCE {
            return;
        }

        self.max_speed = speed;
        self.rates = KinematicRates::new(speed, self.config.accel_time, self.config.decel_time);
        tracing::debug!("Speed set to {:.1} mm/s", speed);

        self.publish(MotionEvent::SpeedChanged {
            speed,
            source: SpeedSource::Commanded,
        });
        self.send(ActuatorCommand::speed(speed));
    }

    /// Change the ramp times and recompute the rates
    pub fn set_ramp_times(&mut self, accel_time: f64, decel_time: f64) {
        self.config.accel_time = accel_time;
        self.config.decel_time = decel_time;
        self.rates = KinematicRates::new(self.max_speed, accel_time, decel_time);
    }

    /// Engage or release the operator pause
    pub fn set_manual_pause(&mut self, paused: bool) {
        if paused == self.manual_pause {
            return;
        }
        self.manual_pause = paused;
        tracing::info!("Manual pause {}", if paused { "engaged" } else { "released" });

        if paused {
            self.velocity = DVec2::ZERO;
            self.jog_token = None;
            self.send(ActuatorCommand::Stop);
        } else if let (true, Some(target)) = (self.seeking, self.target) {
            self.send_direction(target);
        }

        self.publish(MotionEvent::ManualPauseChanged { paused });
    }

    /// Ignite or extinguish the torch
    pub fn set_torch(&mut self, on: bool) {
        self.torch_on = on;
        self.publish(MotionEvent::TorchChanged { on });
        self.send(ActuatorCommand::torch(on));
    }

    /// Make the current position the work origin
    pub fn set_zero(&mut self) {
        self.work_offset = self.position;
        tracing::info!(
            "Work offset set to ({:.1}, {:.1})",
            self.work_offset.x,
            self.work_offset.y
        );
        self.publish_position();
    }

    /// Stop everything and restore the safe default speed
    pub fn emergency_stop(&mut self) {
        tracing::warn!("Emergency stop");
        self.reset_sequence_state();
        self.velocity = DVec2::ZERO;
        self.target = None;
        self.input.clear();
        self.jog_token = None;
        self.set_speed(self.config.default_speed);
        self.publish(MotionEvent::EmergencyStop);
    }

    /// Cancel the auto sequence, any dwell, the target and the manual pause
    pub fn reset_sequence_state(&mut self) {
        self.sequence.cancel();
        self.seeking = false;
        if self.manual_pause {
            self.manual_pause = false;
            self.publish(MotionEvent::ManualPauseChanged { paused: false });
        }
        self.send(ActuatorCommand::Stop);
    }

    /// Run the three-waypoint cycle
    ///
    /// `points` are P0 (home), P1 (start of cut) and P2 (end of cut) in work
    /// coordinates. The current speed becomes the working speed; transit to
    /// the first waypoint uses the fast speed.
    pub fn start_auto_sequence(&mut self, points: [DVec2; 3], cycles: u32) {
        self.reset_sequence_state();

        let bounds = self.config.bounds;
        let machine = points.map(|p| kinematics::clamp_to_bounds(p + self.work_offset, bounds));
        self.base_speed = self.max_speed;

        let at_home = self.position.distance(machine[0]) < self.config.stop_radius;
        let action = self
            .sequence
            .start(machine, cycles, self.config.dwell, at_home);
        self.apply_sequence_action(action);
    }

    /// Set the dwell used at the cut waypoints
    pub fn set_dwell_duration(&mut self, seconds: f64) {
        self.config.dwell = seconds.max(0.0);
        self.sequence.set_dwell_duration(self.config.dwell);
    }

    /// Set the keyboard jog axis
    pub fn set_axis_input(&mut self, axis: DVec2) {
        self.input.set_axis(axis);
    }

    /// Press or release a jog button
    pub fn set_jog_button(&mut self, direction: JogDirection, held: bool) {
        self.input.set_button(direction, held);
    }

    /// Feed a speed report received from the controller
    pub fn handle_actuator_report(&mut self, speed: f64) {
        tracing::debug!("Controller reports {:.1} mm/s", speed);
        self.reported_speed = Some(speed);
        self.publish(MotionEvent::SpeedChanged {
            speed,
            source: SpeedSource::Reported,
        });
    }

    fn arrive(&mut self) {
        let work = self.position - self.work_offset;
        tracing::debug!("Target reached at ({:.1}, {:.1})", work.x, work.y);
        self.publish(MotionEvent::TargetReached { position: work });
        self.stop_auto_movement();
    }

    fn apply_sequence_action(&mut self, action: SequenceAction) {
        match action {
            SequenceAction::None => {}
            SequenceAction::MoveTo { target, speed } => {
                let speed = match speed {
                    TransitSpeed::Fast => self.config.fast_speed,
                    TransitSpeed::Base => self.base_speed,
                };
                self.set_speed(speed);
                self.move_to(target);
            }
            SequenceAction::Countdown(remaining) => {
                self.publish(MotionEvent::PauseCountdown {
                    remaining: remaining.max(0.0),
                });
            }
            SequenceAction::Finished => {
                self.publish(MotionEvent::SequenceFinished);
            }
        }
    }

    fn update_jog_token(&mut self, input: DVec2) {
        let token = kinematics::dominant_direction(DVec2::ZERO, input);
        if token == self.jog_token {
            return;
        }
        match token {
            Some(command) => self.send(command),
            None => self.send(ActuatorCommand::Stop),
        }
        self.jog_token = token;
    }

    fn send_direction(&mut self, target: DVec2) {
        if let Some(command) = kinematics::dominant_direction(self.position, target) {
            self.send(command);
        }
    }

    fn set_position(&mut self, position: DVec2) {
        let clamped = kinematics::clamp_to_bounds(position, self.config.bounds);
        if clamped.abs_diff_eq(self.position, POSITION_TOLERANCE) {
            return;
        }
        self.position = clamped;
        self.publish_position();
    }

    fn publish_position(&self) {
        self.publish(MotionEvent::PositionChanged {
            machine: self.position,
            work: self.position - self.work_offset,
        });
    }

    fn publish(&self, event: MotionEvent) {
        self.events.publish(AppEvent::Motion(event)).ok();
    }

    fn send(&mut self, command: ActuatorCommand) {
        tracing::trace!("-> {} {}", self.actuator.name(), command);
        self.actuator.send(command);
    }

    /// Position in machine coordinates (mm)
    pub fn position(&self) -> DVec2 {
        self.position
    }

    /// Position relative to the work offset (mm)
    pub fn work_position(&self) -> DVec2 {
        self.position - self.work_offset
    }

    /// Current velocity (mm/s)
    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    /// Current scalar speed (mm/s)
    pub fn current_speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Maximum travel speed (mm/s)
    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// Last speed reported by the controller, if any
    pub fn reported_speed(&self) -> Option<f64> {
        self.reported_speed
    }

    /// Active acceleration and deceleration rates
    pub fn rates(&self) -> KinematicRates {
        self.rates
    }

    /// The recorded target in machine coordinates
    pub fn target(&self) -> Option<DVec2> {
        self.target
    }

    /// Whether a target is being sought
    pub fn is_seeking_target(&self) -> bool {
        self.seeking
    }

    /// Whether the operator pause is engaged
    pub fn is_manual_paused(&self) -> bool {
        self.manual_pause
    }

    /// Whether the torch is lit
    pub fn is_torch_on(&self) -> bool {
        self.torch_on
    }

    /// The work origin in machine coordinates
    pub fn work_offset(&self) -> DVec2 {
        self.work_offset
    }

    /// Whether the auto sequence is running
    pub fn is_sequence_active(&self) -> bool {
        self.sequence.is_active()
    }

    /// Phase of the auto sequence
    pub fn sequence_phase(&self) -> SequencePhase {
        self.sequence.phase()
    }

    /// Cycles the auto sequence still has to cut
    pub fn cycles_remaining(&self) -> u32 {
        self.sequence.cycles_remaining()
    }

    /// Active machine parameters
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }
}

impl std::fmt::Debug for MotionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionController")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("target", &self.target)
            .field("seeking", &self.seeking)
            .field("manual_pause", &self.manual_pause)
            .field("max_speed", &self.max_speed)
            .field("actuator", &self.actuator.name())
            .finish()
    }
}

impl MotionControl for MotionController {
    fn set_speed(&mut self, speed: f64) {
        MotionController::set_speed(self, speed);
    }

    fn move_to_work(&mut self, target: DVec2) {
        MotionController::move_to_work(self, target);
    }

    fn set_torch(&mut self, on: bool) {
        MotionController::set_torch(self, on);
    }

    fn set_manual_pause(&mut self, paused: bool) {
        MotionController::set_manual_pause(self, paused);
    }

    fn stop_auto_movement(&mut self) {
        MotionController::stop_auto_movement(self);
    }

    fn is_seeking_target(&self) -> bool {
        self.seeking
    }

    fn work_position(&self) -> DVec2 {
        MotionController::work_position(self)
    }
}
