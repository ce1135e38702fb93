//! Spray-speed calculator
//!
//! Derives the carriage traverse speed for coating a rotating cylindrical
//! workpiece: the piece turns with a fixed surface speed and the carriage
//! advances one spray step per revolution.

use serde::{Deserialize, Serialize};
use torchkit_core::MotionError;

/// Surface speed of the rotating workpiece (mm/s)
pub const SURFACE_SPEED: f64 = 200.0;

/// Carriage advance per revolution (mm)
pub const SPRAY_STEP: f64 = 20.0;

/// Revolutions shorter than this are rejected
const MIN_REVOLUTION_TIME: f64 = 0.001;

/// Result of a spray-speed calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SprayProfile {
    /// Workpiece circumference (mm), absent for the RPM-based calculation
    pub circumference: Option<f64>,
    /// Time for one revolution (s)
    pub revolution_time: f64,
    /// Workpiece revolutions per minute
    pub rpm: f64,
    /// Carriage traverse speed (mm/s)
    pub traverse_speed: f64,
}

impl SprayProfile {
    /// Calculate from the workpiece diameter (mm)
    pub fn from_diameter(diameter: f64) -> Result<Self, MotionError> {
        if !diameter.is_finite() || diameter <= 0.0 {
            return Err(MotionError::InvalidParameter {
                name: "diameter",
                value: diameter,
            });
        }

        let circumference = diameter * std::f64::consts::PI;
        let revolution_time = circumference / SURFACE_SPEED;
        if revolution_time <= MIN_REVOLUTION_TIME {
            return Err(MotionError::InvalidParameter {
                name: "diameter",
                value: diameter,
            });
        }

        Ok(Self {
            circumference: Some(circumference),
            revolution_time,
            rpm: 60.0 / revolution_time,
            traverse_speed: SPRAY_STEP / revolution_time,
        })
    }

    /// Calculate from a measured spindle speed
    pub fn from_rpm(rpm: f64) -> Result<Self, MotionError> {
        if !rpm.is_finite() || rpm <= 0.0 {
            return Err(MotionError::InvalidParameter {
                name: "rpm",
                value: rpm,
            });
        }

        let revolution_time = 60.0 / rpm;
        Ok(Self {
            circumference: None,
            revolution_time,
            rpm,
            traverse_speed: SPRAY_STEP / revolution_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_diameter() {
        // 100 mm piece: C = 314.16, t = 1.571 s, 38.2 rpm, 12.73 mm/s
        let profile = SprayProfile::from_diameter(100.0).expect("valid diameter");
        assert!((profile.circumference.unwrap_or_default() - 314.159).abs() < 1e-3);
        assert!((profile.revolution_time - 1.5708).abs() < 1e-4);
        assert!((profile.rpm - 38.197).abs() < 1e-3);
        assert!((profile.traverse_speed - 12.732).abs() < 1e-3);
    }

    #[test]
    fn test_from_rpm_matches_diameter() {
        let by_diameter = SprayProfile::from_diameter(80.0).expect("valid diameter");
        let by_rpm = SprayProfile::from_rpm(by_diameter.rpm).expect("valid rpm");
        assert!((by_rpm.traverse_speed - by_diameter.traverse_speed).abs() < 1e-9);
        assert!(by_rpm.circumference.is_none());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(SprayProfile::from_diameter(0.0).is_err());
        assert!(SprayProfile::from_diameter(f64::NAN).is_err());
        assert!(SprayProfile::from_diameter(1e-6).is_err());
        assert_eq!(
            SprayProfile::from_rpm(-5.0),
            Err(MotionError::InvalidParameter {
                name: "rpm",
                value: -5.0
            })
        );
    }
}
