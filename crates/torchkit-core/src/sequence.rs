//! Dwell-then-move helpers shared by the waypoint auto sequence and the
//! script `CYCLE` replay.
//!
//! Both automations are the same state machine: wait for a dwell to elapse,
//! then move to the next point of a small fixed rotation. [`Dwell`] is the
//! countdown half and [`Shuttle`] is the rotation half. Neither materializes
//! the whole route, so repeat counts can be arbitrarily large.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Result of advancing a [`Dwell`] by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DwellTick {
    /// No dwell is armed
    Idle,
    /// Still waiting, with the remaining seconds
    Waiting(f64),
    /// The dwell elapsed on this tick and is now disarmed
    Elapsed,
}

/// A cancellable countdown measured in seconds of simulated time
///
/// A dwell armed with zero seconds still reports `Elapsed` on the next tick,
/// so a zero-length pause behaves like any other pause.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dwell {
    remaining: Option<f64>,
}

impl Dwell {
    /// Create a disarmed dwell
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the dwell; negative durations are treated as zero
    pub fn start(&mut self, seconds: f64) {
        self.remaining = Some(seconds.max(0.0));
    }

    /// Disarm without elapsing
    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    /// Whether the dwell is armed
    pub fn is_active(&self) -> bool {
        self.remaining.is_some()
    }

    /// Remaining seconds, zero when disarmed
    pub fn remaining(&self) -> f64 {
        self.remaining.unwrap_or(0.0)
    }

    /// Count down by `dt` seconds
    pub fn tick(&mut self, dt: f64) -> DwellTick {
        match self.remaining {
            None => DwellTick::Idle,
            Some(remaining) => {
                let left = remaining - dt;
                if left <= 0.0 {
                    self.remaining = None;
                    DwellTick::Elapsed
                } else {
                    self.remaining = Some(left);
                    DwellTick::Waiting(left)
                }
            }
        }
    }
}

/// Which way a shuttle leg travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegKind {
    /// From the near point to the far point
    Out,
    /// From the far point back to the near point
    Back,
    /// Final leg to the home point after the passes are used up
    Home,
}

/// One move produced by a [`Shuttle`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    /// Destination in work coordinates
    pub target: DVec2,
    /// Direction of travel
    pub kind: LegKind,
    /// Shuttle step that produced the leg (1-based, home repeats the last step)
    pub step: usize,
}

/// Alternates between a near and a far point for a fixed number of passes
///
/// A pass is one out-and-back trip, so `passes` yields `2 × passes` legs:
/// odd steps go to the far point, even steps return to the near point.
/// An optional home point adds one final leg after the last pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Shuttle {
    near: DVec2,
    far: DVec2,
    home: Option<DVec2>,
    passes: u32,
    step: usize,
}

impl Shuttle {
    /// Create a shuttle between `near` and `far`
    pub fn new(near: DVec2, far: DVec2, passes: u32) -> Self {
        Self {
            near,
            far,
            home: None,
            passes,
            step: 0,
        }
    }

    /// Add a home point visited once after the last pass
    pub fn with_home(mut self, home: DVec2) -> Self {
        self.home = Some(home);
        self
    }

    /// The near (entry) point
    pub fn near(&self) -> DVec2 {
        self.near
    }

    /// The far point
    pub fn far(&self) -> DVec2 {
        self.far
    }

    /// Number of out-and-back passes
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Legs produced so far, not counting the home leg
    pub fn step(&self) -> usize {
        self.step
    }

    /// Total number of alternating legs
    pub fn total_steps(&self) -> usize {
        self.passes as usize * 2
    }

    /// Whether no legs remain, including the home leg
    pub fn is_exhausted(&self) -> bool {
        self.step >= self.total_steps() && self.home.is_none()
    }

    /// Produce the next leg, or `None` once the rotation is exhausted
    pub fn next_leg(&mut self) -> Option<Leg> {
        if self.step < self.total_steps() {
            self.step += 1;
            let (target, kind) = if self.step % 2 == 1 {
                (self.far, LegKind::Out)
            } else {
                (self.near, LegKind::Back)
            };
            return Some(Leg {
                target,
                kind,
                step: self.step,
            });
        }

        self.home.take().map(|target| Leg {
            target,
            kind: LegKind::Home,
            step: self.step,
        })
    }
}
