//! Kinematics model
//!
//! Pure functions behind the trapezoidal velocity profile. All lengths are
//! millimetres, speeds mm/s and rates mm/s².

use glam::DVec2;
use serde::{Deserialize, Serialize};
use torchkit_core::ActuatorCommand;

/// Distances below this are treated as no movement when picking a direction
const DIRECTION_EPSILON: f64 = 1e-6;

/// Acceleration and deceleration rates derived from a speed and ramp times
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicRates {
    /// Rate used while speeding up (mm/s²)
    pub accel: f64,
    /// Rate used while slowing down (mm/s²)
    pub decel: f64,
}

impl KinematicRates {
    /// Derive rates so that `max_speed` is reached in `accel_time` and shed in `decel_time`.
    pub fn new(max_speed: f64, accel_time: f64, decel_time: f64) -> Self {
        Self {
            accel: ramp_rate(max_speed, accel_time),
            decel: ramp_rate(max_speed, decel_time),
        }
    }
}

/// Rate that covers `max_speed` in `ramp_time`
///
/// A non-positive ramp time means "as fast as possible", modelled as ten
/// times the speed per second.
pub fn ramp_rate(max_speed: f64, ramp_time: f64) -> f64 {
    if ramp_time > 0.0 {
        max_speed / ramp_time
    } else {
        max_speed * 10.0
    }
}

/// Distance needed to stop from `speed` at `decel`
pub fn stopping_distance(speed: f64, decel: f64) -> f64 {
    if decel <= 0.0 {
        return f64::INFINITY;
    }
    speed * speed / (2.0 * decel)
}

/// Highest speed from which the carriage can still stop within `distance`
pub fn permitted_speed(decel: f64, distance: f64) -> f64 {
    (2.0 * decel.max(0.0) * distance.max(0.0)).sqrt()
}

/// Step `from` toward `to` by at most `max_delta`, never overshooting
pub fn move_toward(from: DVec2, to: DVec2, max_delta: f64) -> DVec2 {
    let delta = to - from;
    let len = delta.length();
    if len <= max_delta || len < f64::EPSILON {
        to
    } else {
        from + delta / len * max_delta
    }
}

/// Clamp a machine position to the travel rectangle `[0, bounds]`
pub fn clamp_to_bounds(position: DVec2, bounds: DVec2) -> DVec2 {
    position.clamp(DVec2::ZERO, bounds.max(DVec2::ZERO))
}

/// Direction token for travelling from `from` to `to`
///
/// The dominant axis decides: X gives `f`/`b`, Y gives `u`/`d`. Returns
/// `None` when the two points coincide.
pub fn dominant_direction(from: DVec2, to: DVec2) -> Option<ActuatorCommand> {
    let diff = to - from;
    if diff.x.abs() >= diff.y.abs() {
        if diff.x.abs() < DIRECTION_EPSILON {
            None
        } else if diff.x > 0.0 {
            Some(ActuatorCommand::Forward)
        } else {
            Some(ActuatorCommand::Back)
        }
    } else if diff.y > 0.0 {
        Some(ActuatorCommand::Up)
    } else {
        Some(ActuatorCommand::Down)
    }
}

/// Ideal travel time for a rest-to-rest move along a straight line
///
/// Short moves never reach `max_speed` and follow a triangular profile.
pub fn profile_duration(distance: f64, max_speed: f64, rates: KinematicRates) -> f64 {
    if distance <= 0.0 {
        return 0.0;
    }
    if max_speed <= 0.0 || rates.accel <= 0.0 || rates.decel <= 0.0 {
        return f64::INFINITY;
    }

    let ramp_up = stopping_distance(max_speed, rates.accel);
    let ramp_down = stopping_distance(max_speed, rates.decel);
    if ramp_up + ramp_down <= distance {
        let cruise = distance - ramp_up - ramp_down;
        max_speed / rates.accel + cruise / max_speed + max_speed / rates.decel
    } else {
        // Peak speed where the two ramps meet
        let peak = (2.0 * distance * rates.accel * rates.decel / (rates.accel + rates.decel)).sqrt();
        peak / rates.accel + peak / rates.decel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let rates = KinematicRates::new(100.0, 0.25, 0.5);
        assert!((rates.accel - 400.0).abs() < 1e-9);
        assert!((rates.decel - 200.0).abs() < 1e-9);

        let instant = KinematicRates::new(100.0, 0.0, -1.0);
        assert!((instant.accel - 1000.0).abs() < 1e-9);
        assert!((instant.decel - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_stopping_distance_matches_permitted_speed() {
        assert!((stopping_distance(100.0, 400.0) - 12.5).abs() < 1e-9);
        assert!((permitted_speed(400.0, 12.5) - 100.0).abs() < 1e-9);
        assert_eq!(permitted_speed(400.0, -3.0), 0.0);
    }

    #[test]
    fn test_move_toward_does_not_overshoot() {
        let v = move_toward(DVec2::ZERO, DVec2::new(10.0, 0.0), 4.0);
        assert_eq!(v, DVec2::new(4.0, 0.0));

        let v = move_toward(DVec2::new(9.0, 0.0), DVec2::new(10.0, 0.0), 4.0);
        assert_eq!(v, DVec2::new(10.0, 0.0));
    }

    #[test]
    fn test_clamp() {
        let bounds = DVec2::new(1600.0, 900.0);
        assert_eq!(
            clamp_to_bounds(DVec2::new(-5.0, 1000.0), bounds),
            DVec2::new(0.0, 900.0)
        );
    }

    #[test]
    fn test_dominant_direction() {
        let origin = DVec2::new(50.0, 50.0);
        assert_eq!(
            dominant_direction(origin, DVec2::new(80.0, 60.0)),
            Some(ActuatorCommand::Forward)
        );
        assert_eq!(
            dominant_direction(origin, DVec2::new(20.0, 40.0)),
            Some(ActuatorCommand::Back)
        );
        assert_eq!(
            dominant_direction(origin, DVec2::new(55.0, 90.0)),
            Some(ActuatorCommand::Up)
        );
        assert_eq!(
            dominant_direction(origin, DVec2::new(45.0, 0.0)),
            Some(ActuatorCommand::Down)
        );
        assert_eq!(dominant_direction(origin, origin), None);
    }

    #[test]
    fn test_profile_duration() {
        let rates = KinematicRates::new(100.0, 0.25, 0.25);
        assert!((profile_duration(100.0, 100.0, rates) - 1.25).abs() < 1e-9);

        // 10 mm never reaches cruise: peak = sqrt(400 * 10) = 63.2 mm/s
        let short = profile_duration(10.0, 100.0, rates);
        assert!((short - 2.0 * (4000.0f64).sqrt() / 400.0).abs() < 1e-9);
        assert_eq!(profile_duration(0.0, 100.0, rates), 0.0);
    }
}
