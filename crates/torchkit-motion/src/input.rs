//! Manual jog input
//!
//! Two sources feed manual motion: a continuous keyboard axis and the
//! on-screen jog buttons. They are summed and limited to unit length so a
//! diagonal is never faster than a single axis.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A jog button direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JogDirection {
    /// Towards smaller X
    Left,
    /// Towards larger X
    Right,
    /// Towards larger Y
    Up,
    /// Towards smaller Y
    Down,
}

impl JogDirection {
    fn unit(self) -> DVec2 {
        match self {
            JogDirection::Left => DVec2::NEG_X,
            JogDirection::Right => DVec2::X,
            JogDirection::Up => DVec2::Y,
            JogDirection::Down => DVec2::NEG_Y,
        }
    }
}

/// Current manual input state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualInput {
    axis: DVec2,
    buttons: [bool; 4],
}

impl ManualInput {
    /// Set the keyboard axis, each component in `[-1, 1]`
    pub fn set_axis(&mut self, axis: DVec2) {
        self.axis = if axis.is_finite() {
            axis.clamp(DVec2::NEG_ONE, DVec2::ONE)
        } else {
            DVec2::ZERO
        };
    }

    /// Mark a jog button as held or released
    pub fn set_button(&mut self, direction: JogDirection, held: bool) {
        self.buttons[direction as usize] = held;
    }

    /// Release every button and zero the axis
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Combined input with magnitude at most 1
    pub fn vector(&self) -> DVec2 {
        let buttons = [
            JogDirection::Left,
            JogDirection::Right,
            JogDirection::Up,
            JogDirection::Down,
        ]
        .into_iter()
        .filter(|d| self.buttons[*d as usize])
        .fold(DVec2::ZERO, |acc, d| acc + d.unit());

        (self.axis + buttons).clamp_length_max(1.0)
    }

    /// Whether any input is active
    pub fn is_active(&self) -> bool {
        self.vector().length_squared() > 0.0
    }
}
