//! Motion control seam between the script interpreter and the carriage
//!
//! The interpreter only mutates the carriage through these operations and
//! only reads `is_seeking_target` / `work_position` to evaluate its waits,
//! so either side can be exercised without the other.

use glam::DVec2;

/// Public operations of a motion controller as seen by a script
pub trait MotionControl {
    /// Set the maximum travel speed in mm/s
    fn set_speed(&mut self, speed: f64);

    /// Seek a target given in work coordinates
    fn move_to_work(&mut self, target: DVec2);

    /// Ignite or extinguish the torch
    fn set_torch(&mut self, on: bool);

    /// Engage or release the manual pause
    fn set_manual_pause(&mut self, paused: bool);

    /// Abandon the current target and stop the carriage
    fn stop_auto_movement(&mut self);

    /// Whether a target is still being sought
    fn is_seeking_target(&self) -> bool;

    /// Current position relative to the work offset
    fn work_position(&self) -> DVec2;
}
