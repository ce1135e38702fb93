use std::sync::Arc;

use glam::DVec2;
use proptest::prelude::*;
use torchkit_core::{EventBus, NoOpActuator};
use torchkit_motion::{MotionConfig, MotionController};

const DT: f64 = 0.01;

fn controller_with_speed(speed: f64) -> MotionController {
    let config = MotionConfig {
        max_speed: speed,
        ..MotionConfig::default()
    };
    MotionController::new(config, Box::new(NoOpActuator), Arc::new(EventBus::new()))
}

fn ticks_until_arrival(controller: &mut MotionController, max_ticks: usize) -> Option<usize> {
    for i in 0..max_ticks {
        if !controller.is_seeking_target() {
            return Some(i);
        }
        controller.tick(DT);
    }
    None
}

#[test]
fn test_reference_move_takes_about_one_and_a_quarter_seconds() {
    let mut controller = controller_with_speed(100.0);
    controller.move_to(DVec2::new(100.0, 0.0));

    let ticks = ticks_until_arrival(&mut controller, 1_000).expect("arrives");
    let seconds = ticks as f64 * DT;
    assert!(
        (1.0..=1.4).contains(&seconds),
        "travel took {:.2}s",
        seconds
    );
    assert_eq!(controller.position(), DVec2::new(100.0, 0.0));
    assert_eq!(controller.velocity(), DVec2::ZERO);
}

#[test]
fn test_peak_speed_never_exceeds_max() {
    let mut controller = controller_with_speed(100.0);
    controller.move_to(DVec2::new(800.0, 300.0));

    let mut peak: f64 = 0.0;
    for _ in 0..2_000 {
        controller.tick(DT);
        peak = peak.max(controller.current_speed());
    }
    assert!(peak <= 100.0 + 1e-9);
    assert!(peak > 99.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn targets_stay_within_travel_limits(x in -5_000.0f64..5_000.0, y in -5_000.0f64..5_000.0) {
        let mut controller = controller_with_speed(100.0);
        controller.move_to(DVec2::new(x, y));
        let target = controller.target().expect("target recorded");
        prop_assert!((0.0..=1600.0).contains(&target.x));
        prop_assert!((0.0..=900.0).contains(&target.y));
    }

    #[test]
    fn position_never_leaves_travel_limits(
        x in -500.0f64..2_500.0,
        y in -500.0f64..1_500.0,
        ticks in 1usize..400,
    ) {
        let mut controller = controller_with_speed(300.0);
        controller.move_to(DVec2::new(x, y));
        for _ in 0..ticks {
            controller.tick(DT);
            let p = controller.position();
            prop_assert!((0.0..=1600.0).contains(&p.x));
            prop_assert!((0.0..=900.0).contains(&p.y));
        }
    }

    #[test]
    fn reachable_targets_converge(
        x in 0.0f64..1_600.0,
        y in 0.0f64..900.0,
        speed in 20.0f64..300.0,
    ) {
        let mut controller = controller_with_speed(speed);
        let target = DVec2::new(x, y);
        controller.move_to(target);

        let ticks = ticks_until_arrival(&mut controller, 20_000);
        prop_assert!(ticks.is_some());
        prop_assert!(controller.position().distance(target) < 1.0);
        prop_assert_eq!(controller.velocity(), DVec2::ZERO);
    }

    #[test]
    fn manual_pause_stops_on_next_tick(ticks in 1usize..200, speed in 10.0f64..500.0) {
        let mut controller = controller_with_speed(speed);
        controller.move_to(DVec2::new(1_500.0, 800.0));
        for _ in 0..ticks {
            controller.tick(DT);
        }

        controller.set_manual_pause(true);
        controller.tick(DT);
        prop_assert_eq!(controller.velocity(), DVec2::ZERO);
    }

    #[test]
    fn set_zero_makes_work_position_origin(x in 0.0f64..1_600.0, y in 0.0f64..900.0) {
        let mut controller = controller_with_speed(300.0);
        controller.move_to(DVec2::new(x, y));
        ticks_until_arrival(&mut controller, 20_000);

        controller.set_zero();
        prop_assert!(controller.work_position().length() < 1e-9);
    }
}
