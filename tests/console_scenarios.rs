use std::sync::Arc;

use glam::DVec2;
use parking_lot::Mutex;
use torchkit::{
    ActuatorCommand, AppEvent, Config, Console, EventBus, EventCategory, EventFilter,
    InterpreterState, MockActuator, MotionEvent, Waypoint,
};

const DT: f64 = 0.01;

struct Harness {
    console: Console,
    mock: MockActuator,
    arrivals: Arc<Mutex<Vec<DVec2>>>,
}

fn harness(config: &Config) -> Harness {
    let bus = Arc::new(EventBus::new());
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&arrivals);
    bus.subscribe(
        EventFilter::Categories(vec![EventCategory::Motion]),
        move |event| {
            if let AppEvent::Motion(MotionEvent::TargetReached { position }) = event {
                sink.lock().push(position);
            }
        },
    );

    let mock = MockActuator::new();
    Harness {
        console: Console::new(config, Box::new(mock.clone()), bus),
        mock,
        arrivals,
    }
}

#[test]
fn test_go_pause_end_on_reference_machine() {
    let mut h = harness(&Config::default());
    assert_eq!(h.console.run_script("GO(100,0)\nPAUSE(1)\nEND"), Ok(3));

    let mut travel = None;
    while h.console.interpreter().state() == InterpreterState::Running
        && h.console.elapsed() < 10.0
    {
        h.console.tick(DT);
        if travel.is_none() && !h.arrivals.lock().is_empty() {
            travel = Some(h.console.elapsed());
        }
    }

    let travel = travel.expect("carriage arrived");
    assert!((1.0..=1.4).contains(&travel), "travel took {:.2}s", travel);

    let total = h.console.elapsed();
    let pause = total - travel;
    assert!((1.0..=1.1).contains(&pause), "pause took {:.2}s", pause);

    assert_eq!(h.console.interpreter().state(), InterpreterState::Idle);
    assert_eq!(h.console.controller().position(), DVec2::new(100.0, 0.0));
}

#[test]
fn test_script_tokens_reach_the_controller_in_order() {
    let mut h = harness(&Config::default());
    h.console
        .run_script("SPEED(50)\nFIRE(1)\nGO(50, 0)\nFIRE(0)\nEND")
        .expect("runs");
    h.console.run_until_settled(DT, 10.0);

    assert_eq!(
        h.mock.sent(),
        vec![
            ActuatorCommand::speed(50.0),
            ActuatorCommand::TorchOn,
            ActuatorCommand::Forward,
            ActuatorCommand::Stop,
            ActuatorCommand::TorchOff,
        ]
    );
    assert!(!h.console.controller().is_torch_on());
}

#[test]
fn test_cycle_shuttles_the_real_controller() {
    let mut h = harness(&Config::default());
    h.console
        .run_script("SPEED(200)\nCYCLE(0, 0, 100, 0, 2, 0.1)\nEND")
        .expect("runs");
    let spent = h.console.run_until_settled(DT, 30.0);
    assert!(spent < 30.0);

    let a = DVec2::ZERO;
    let b = DVec2::new(100.0, 0.0);
    assert_eq!(*h.arrivals.lock(), vec![a, b, a, b, a]);
    assert_eq!(h.console.interpreter().state(), InterpreterState::Idle);
}

#[test]
fn test_out_of_range_targets_are_clamped_not_errors() {
    let mut h = harness(&Config::default());
    h.console.run_script("SPEED(300)\nGO(5000, -20)").expect("runs");
    h.console.run_until_settled(DT, 60.0);

    assert_eq!(h.console.interpreter().state(), InterpreterState::Idle);
    assert_eq!(
        h.console.controller().position(),
        DVec2::new(1600.0, 0.0)
    );
}

#[test]
fn test_emergency_stop_aborts_script() {
    let mut h = harness(&Config::default());
    h.console.run_script("GO(800, 0)\nFIRE(1)").expect("runs");
    for _ in 0..50 {
        h.console.tick(DT);
    }

    h.console.emergency_stop();
    for _ in 0..100 {
        h.console.tick(DT);
    }

    assert_eq!(h.console.interpreter().state(), InterpreterState::Idle);
    assert!(!h.console.controller().is_seeking_target());
    assert!(!h.mock.sent().contains(&ActuatorCommand::TorchOn));
}

#[test]
fn test_auto_sequence_from_saved_waypoints() {
    let mut config = Config::default();
    config.machine.dwell = 0.2;
    let mut h = harness(&config);

    h.console.set_waypoint(Waypoint::Home, DVec2::new(5.0, 0.0));
    h.console.set_waypoint(Waypoint::CutStart, DVec2::new(30.0, 0.0));
    h.console.set_waypoint(Waypoint::CutEnd, DVec2::new(90.0, 0.0));
    h.console.start_sequence(1).expect("waypoints set");

    for _ in 0..2_000 {
        h.console.tick(DT);
    }

    assert!(!h.console.controller().is_sequence_active());
    assert_eq!(
        *h.arrivals.lock(),
        vec![
            DVec2::new(5.0, 0.0),
            DVec2::new(30.0, 0.0),
            DVec2::new(90.0, 0.0),
            DVec2::new(30.0, 0.0),
            DVec2::new(5.0, 0.0),
        ]
    );
}
