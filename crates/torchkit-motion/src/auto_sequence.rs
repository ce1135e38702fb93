//! Waypoint auto sequence
//!
//! Drives the carriage through home (P0), start of cut (P1) and end of cut
//! (P2) for a number of cycles, dwelling at each cut waypoint:
//!
//! ```text
//! P0 -> P1 -> dwell -> P2 -> dwell -> P1 -> ... -> P1 -> dwell -> P0
//! ```
//!
//! The sequence only decides *what* to do next; the controller performs the
//! moves and reports arrivals back through [`AutoSequence::on_arrival`].

use glam::DVec2;
use serde::{Deserialize, Serialize};
use torchkit_core::{Dwell, DwellTick, LegKind, Shuttle};

/// Index of the waypoint the sequence is heading for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waypoint {
    /// P0, parking position
    Home = 0,
    /// P1, where the cut begins
    CutStart = 1,
    /// P2, where the cut ends
    CutEnd = 2,
}

impl From<LegKind> for Waypoint {
    fn from(kind: LegKind) -> Self {
        match kind {
            LegKind::Out => Waypoint::CutEnd,
            LegKind::Back => Waypoint::CutStart,
            LegKind::Home => Waypoint::Home,
        }
    }
}

/// Observable phase of the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencePhase {
    /// Not running
    Idle,
    /// Travelling to P0
    MovingToHome,
    /// Travelling to P1
    MovingToCutStart,
    /// Travelling to P2
    MovingToCutEnd,
    /// Dwelling at a waypoint before the next leg
    Dwelling,
}

/// Which configured speed a move should use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitSpeed {
    /// Fast positioning speed
    Fast,
    /// The working speed in effect when the sequence started
    Base,
}

/// What the controller should do after feeding the sequence an input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequenceAction {
    /// Nothing to do
    None,
    /// Seek a machine position at the given speed
    MoveTo {
        /// Machine coordinates (mm)
        target: DVec2,
        /// Speed selection
        speed: TransitSpeed,
    },
    /// A dwell is counting down
    Countdown(f64),
    /// The sequence returned home and ended
    Finished,
}

/// Three-waypoint cycle automation
#[derive(Debug, Clone)]
pub struct AutoSequence {
    points: [DVec2; 3],
    shuttle: Shuttle,
    heading: Waypoint,
    cycles_remaining: u32,
    dwell: Dwell,
    dwell_duration: f64,
    after_dwell: Option<(DVec2, Waypoint)>,
    active: bool,
}

impl Default for AutoSequence {
    fn default() -> Self {
        Self {
            points: [DVec2::ZERO; 3],
            shuttle: Shuttle::new(DVec2::ZERO, DVec2::ZERO, 0),
            heading: Waypoint::Home,
            cycles_remaining: 0,
            dwell: Dwell::new(),
            dwell_duration: 0.0,
            after_dwell: None,
            active: false,
        }
    }
}

impl AutoSequence {
    /// Begin a new run
    ///
    /// `points` are machine coordinates for P0, P1 and P2. When `at_home`
    /// is set the carriage is already parked on P0 and goes straight to P1.
    pub fn start(
        &mut self,
        points: [DVec2; 3],
        cycles: u32,
        dwell_seconds: f64,
        at_home: bool,
    ) -> SequenceAction {
        self.cancel();
        self.points = points;
        self.shuttle = Shuttle::new(points[1], points[2], cycles).with_home(points[0]);
        self.cycles_remaining = cycles;
        self.dwell_duration = dwell_seconds.max(0.0);
        self.active = true;

        self.heading = if at_home {
            Waypoint::CutStart
        } else {
            Waypoint::Home
        };
        tracing::info!(
            "Auto sequence started: {} cycle(s), heading to {:?}",
            cycles,
            self.heading
        );

        SequenceAction::MoveTo {
            target: self.points[self.heading as usize],
            speed: TransitSpeed::Fast,
        }
    }

    /// Abort the run, dropping any pending dwell
    pub fn cancel(&mut self) {
        if self.active {
            tracing::debug!("Auto sequence cancelled");
        }
        self.active = false;
        self.dwell.cancel();
        self.after_dwell = None;
    }

    /// Handle the carriage arriving at (or abandoning) the current target
    pub fn on_arrival(&mut self) -> SequenceAction {
        if !self.active || self.dwell.is_active() {
            return SequenceAction::None;
        }

        match self.heading {
            Waypoint::Home => {
                if self.cycles_remaining > 0 {
                    self.heading = Waypoint::CutStart;
                    SequenceAction::MoveTo {
                        target: self.points[Waypoint::CutStart as usize],
                        speed: TransitSpeed::Base,
                    }
                } else {
                    self.active = false;
                    tracing::info!("Auto sequence finished");
                    SequenceAction::Finished
                }
            }
            Waypoint::CutStart => self.dwell_then_next_leg(),
            Waypoint::CutEnd => {
                self.cycles_remaining = self.cycles_remaining.saturating_sub(1);
                tracing::debug!("Cut complete, {} cycle(s) left", self.cycles_remaining);
                self.dwell_then_next_leg()
            }
        }
    }

    /// Advance the dwell countdown
    pub fn tick(&mut self, dt: f64) -> SequenceAction {
        if !self.active {
            return SequenceAction::None;
        }

        match self.dwell.tick(dt) {
            DwellTick::Idle => SequenceAction::None,
            DwellTick::Waiting(remaining) => SequenceAction::Countdown(remaining),
            DwellTick::Elapsed => match self.after_dwell.take() {
                Some((target, heading)) => {
                    self.heading = heading;
                    SequenceAction::MoveTo {
                        target,
                        speed: TransitSpeed::Base,
                    }
                }
                None => SequenceAction::None,
            },
        }
    }

    fn dwell_then_next_leg(&mut self) -> SequenceAction {
        match self.shuttle.next_leg() {
            Some(leg) => {
                self.after_dwell = Some((leg.target, Waypoint::from(leg.kind)));
                self.dwell.start(self.dwell_duration);
                SequenceAction::Countdown(self.dwell_duration)
            }
            None => {
                self.active = false;
                SequenceAction::Finished
            }
        }
    }

    /// Whether a run is in progress
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the carriage is dwelling at a waypoint
    pub fn is_dwelling(&self) -> bool {
        self.active && self.dwell.is_active()
    }

    /// Cycles that have not reached P2 yet
    pub fn cycles_remaining(&self) -> u32 {
        self.cycles_remaining
    }

    /// Waypoint currently being sought
    pub fn heading(&self) -> Waypoint {
        self.heading
    }

    /// Current phase, for status displays
    pub fn phase(&self) -> SequencePhase {
        if !self.active {
            SequencePhase::Idle
        } else if self.dwell.is_active() {
            SequencePhase::Dwelling
        } else {
            match self.heading {
                Waypoint::Home => SequencePhase::MovingToHome,
                Waypoint::CutStart => SequencePhase::MovingToCutStart,
                Waypoint::CutEnd => SequencePhase::MovingToCutEnd,
            }
        }
    }

    /// Dwell length used at P1 and P2
    pub fn set_dwell_duration(&mut self, seconds: f64) {
        self.dwell_duration = seconds.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P0: DVec2 = DVec2::new(0.0, 0.0);
    const P1: DVec2 = DVec2::new(100.0, 0.0);
    const P2: DVec2 = DVec2::new(300.0, 0.0);

    fn expect_move(action: SequenceAction) -> (DVec2, TransitSpeed) {
        match action {
            SequenceAction::MoveTo { target, speed } => (target, speed),
            other => panic!("expected a move, got {:?}", other),
        }
    }

    fn finish_dwell(seq: &mut AutoSequence) -> SequenceAction {
        loop {
            match seq.tick(0.5) {
                SequenceAction::Countdown(_) => continue,
                other => return other,
            }
        }
    }

    #[test]
    fn test_start_away_from_home() {
        let mut seq = AutoSequence::default();
        let (target, speed) = expect_move(seq.start([P0, P1, P2], 1, 1.0, false));
        assert_eq!(target, P0);
        assert_eq!(speed, TransitSpeed::Fast);
        assert_eq!(seq.phase(), SequencePhase::MovingToHome);

        let (target, speed) = expect_move(seq.on_arrival());
        assert_eq!(target, P1);
        assert_eq!(speed, TransitSpeed::Base);
    }

    #[test]
    fn test_full_single_cycle() {
        let mut seq = AutoSequence::default();
        let (target, _) = expect_move(seq.start([P0, P1, P2], 1, 1.0, true));
        assert_eq!(target, P1);

        assert_eq!(seq.on_arrival(), SequenceAction::Countdown(1.0));
        assert_eq!(seq.phase(), SequencePhase::Dwelling);
        let (target, _) = expect_move(finish_dwell(&mut seq));
        assert_eq!(target, P2);
        assert_eq!(seq.heading(), Waypoint::CutEnd);

        assert_eq!(seq.on_arrival(), SequenceAction::Countdown(1.0));
        assert_eq!(seq.cycles_remaining(), 0);
        let (target, _) = expect_move(finish_dwell(&mut seq));
        assert_eq!(target, P1);

        assert_eq!(seq.on_arrival(), SequenceAction::Countdown(1.0));
        let (target, _) = expect_move(finish_dwell(&mut seq));
        assert_eq!(target, P0);
        assert_eq!(seq.heading(), Waypoint::Home);

        assert_eq!(seq.on_arrival(), SequenceAction::Finished);
        assert!(!seq.is_active());
    }

    #[test]
    fn test_zero_cycles_returns_home() {
        let mut seq = AutoSequence::default();
        expect_move(seq.start([P0, P1, P2], 0, 0.0, false));
        assert_eq!(seq.on_arrival(), SequenceAction::Finished);

        let (target, _) = expect_move(seq.start([P0, P1, P2], 0, 0.0, true));
        assert_eq!(target, P1);
        assert_eq!(seq.on_arrival(), SequenceAction::Countdown(0.0));
        let (target, _) = expect_move(seq.tick(0.016));
        assert_eq!(target, P0);
    }

    #[test]
    fn test_arrival_during_dwell_is_ignored() {
        let mut seq = AutoSequence::default();
        expect_move(seq.start([P0, P1, P2], 2, 3.0, true));
        seq.on_arrival();
        assert_eq!(seq.on_arrival(), SequenceAction::None);
        assert!(seq.is_dwelling());
    }

    #[test]
    fn test_cancel_mid_dwell() {
        let mut seq = AutoSequence::default();
        expect_move(seq.start([P0, P1, P2], 2, 3.0, true));
        seq.on_arrival();
        seq.cancel();
        assert_eq!(seq.tick(5.0), SequenceAction::None);
        assert_eq!(seq.phase(), SequencePhase::Idle);
    }
}
