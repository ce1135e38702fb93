use std::sync::Arc;

use glam::DVec2;
use parking_lot::Mutex;
use torchkit_core::{
    AppEvent, EventBus, EventCategory, EventFilter, MotionControl, ScriptError, ScriptEvent,
};
use torchkit_script::{Interpreter, InterpreterConfig, InterpreterState};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Speed(f64),
    Move(DVec2),
    Torch(bool),
    Pause(bool),
    Stop,
}

/// Carriage double that arrives instantly unless told otherwise
struct FakeCarriage {
    calls: Arc<Mutex<Vec<Call>>>,
    position: DVec2,
    seeking: bool,
    arrives: bool,
}

impl FakeCarriage {
    fn new(arrives: bool) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            position: DVec2::ZERO,
            seeking: false,
            arrives,
        }
    }

    fn settle(&mut self) {
        if self.arrives {
            self.seeking = false;
        }
    }

    fn moves(&self) -> Vec<DVec2> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Move(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl MotionControl for FakeCarriage {
    fn set_speed(&mut self, speed: f64) {
        self.calls.lock().push(Call::Speed(speed));
    }

    fn move_to_work(&mut self, target: DVec2) {
        self.calls.lock().push(Call::Move(target));
        self.position = target;
        self.seeking = true;
    }

    fn set_torch(&mut self, on: bool) {
        self.calls.lock().push(Call::Torch(on));
    }

    fn set_manual_pause(&mut self, paused: bool) {
        self.calls.lock().push(Call::Pause(paused));
    }

    fn stop_auto_movement(&mut self) {
        self.calls.lock().push(Call::Stop);
        self.seeking = false;
    }

    fn is_seeking_target(&self) -> bool {
        self.seeking
    }

    fn work_position(&self) -> DVec2 {
        self.position
    }
}

struct Rig {
    interpreter: Interpreter,
    carriage: FakeCarriage,
    events: Arc<Mutex<Vec<ScriptEvent>>>,
}

fn rig(config: InterpreterConfig, arrives: bool) -> Rig {
    let bus = Arc::new(EventBus::new());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    bus.subscribe(
        EventFilter::Categories(vec![EventCategory::Script]),
        move |event| {
            if let AppEvent::Script(script) = event {
                sink.lock().push(script);
            }
        },
    );
    Rig {
        interpreter: Interpreter::new(config, bus),
        carriage: FakeCarriage::new(arrives),
        events,
    }
}

fn step(rig: &mut Rig, ticks: usize, dt: f64) {
    for _ in 0..ticks {
        rig.interpreter.tick(&mut rig.carriage, dt);
        rig.carriage.settle();
    }
}

#[test]
fn test_cycle_replays_six_alternations() {
    let mut rig = rig(InterpreterConfig::default(), true);
    rig.interpreter.run("CYCLE(0,0,100,0,3)").expect("runs");
    step(&mut rig, 400, 0.1);

    let a = DVec2::new(0.0, 0.0);
    let b = DVec2::new(100.0, 0.0);
    assert_eq!(rig.carriage.moves(), vec![a, b, a, b, a, b, a]);

    let injected: Vec<String> = rig
        .events
        .lock()
        .iter()
        .filter_map(|e| match e {
            ScriptEvent::CommandInjected { text } => Some(text.clone()),
            _ => None,
        })
        .collect();
    let gos = injected.iter().filter(|t| t.starts_with("GO")).count();
    let pauses = injected.iter().filter(|t| t.starts_with("PAUSE")).count();
    // the first GO(A) comes from the CYCLE itself
    assert_eq!(gos, 7);
    assert_eq!(pauses, 7);
    assert!(injected.iter().all(|t| t != "PAUSE(0)"));

    assert!(!rig.interpreter.is_cycle_active());
    assert_eq!(rig.interpreter.state(), InterpreterState::Idle);
}

#[test]
fn test_cycle_runs_before_following_lines() {
    let mut rig = rig(InterpreterConfig::default(), true);
    rig.interpreter
        .run("CYCLE(10, 20, 1, 0)\nGO(300, 300)")
        .expect("runs");
    step(&mut rig, 100, 0.1);

    assert_eq!(
        rig.carriage.moves(),
        vec![
            DVec2::new(10.0, 0.0),
            DVec2::new(20.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(300.0, 300.0),
        ]
    );
}

#[test]
fn test_zero_count_cycle_is_a_no_op() {
    let mut rig = rig(InterpreterConfig::default(), true);
    rig.interpreter.run("CYCLE(0, 100, 0)\nEND").expect("runs");
    step(&mut rig, 10, 0.1);

    assert!(rig.carriage.moves().is_empty());
    assert_eq!(rig.interpreter.state(), InterpreterState::Idle);
}

#[test]
fn test_error_halts_and_preserves_queue() {
    let mut rig = rig(InterpreterConfig::default(), true);
    rig.interpreter
        .run("GO(10)\nBOGUS(1)\nGO(20)")
        .expect("runs");
    step(&mut rig, 20, 0.1);

    assert_eq!(rig.interpreter.state(), InterpreterState::Error);
    assert_eq!(rig.carriage.moves(), vec![DVec2::new(10.0, 0.0)]);

    let failure = rig.interpreter.failure().expect("failure recorded");
    assert_eq!(failure.command, "BOGUS(1)");
    assert_eq!(failure.source_line, Some(2));
    assert!(matches!(failure.error, ScriptError::UnknownCommand { .. }));

    let pending: Vec<&str> = rig
        .interpreter
        .pending()
        .map(|c| c.text.as_str())
        .collect();
    assert_eq!(pending, vec!["GO(20)"]);

    assert!(rig
        .events
        .lock()
        .iter()
        .any(|e| matches!(e, ScriptEvent::Failed { command, .. } if command == "BOGUS(1)")));
}

#[test]
fn test_movement_timeout() {
    let config = InterpreterConfig {
        movement_timeout: 1.0,
        ..InterpreterConfig::default()
    };
    let mut rig = rig(config, false);
    rig.interpreter.run("GO(10, 20)\nFIRE(1)").expect("runs");

    step(&mut rig, 5, 0.1);
    assert_eq!(rig.interpreter.state(), InterpreterState::Running);
    assert!(rig.interpreter.is_awaiting_movement());

    step(&mut rig, 15, 0.1);
    assert_eq!(rig.interpreter.state(), InterpreterState::Error);
    let failure = rig.interpreter.failure().expect("failure recorded");
    assert!(matches!(failure.error, ScriptError::MovementTimeout { .. }));
    assert_eq!(failure.command, "GO(10, 20)");
    assert!(!rig.carriage.calls.lock().contains(&Call::Torch(true)));
}

#[test]
fn test_toggle_pause_holds_carriage() {
    let mut rig = rig(InterpreterConfig::default(), true);
    rig.interpreter.run("PAUSE(1)\nFIRE(1)").expect("runs");
    step(&mut rig, 2, 0.1);

    rig.interpreter
        .toggle_pause(&mut rig.carriage)
        .expect("pauses");
    step(&mut rig, 50, 0.1);
    assert_eq!(rig.interpreter.state(), InterpreterState::Paused);
    assert!(rig.interpreter.pending_delay() > 0.5);

    rig.interpreter
        .toggle_pause(&mut rig.carriage)
        .expect("resumes");
    step(&mut rig, 15, 0.1);

    let calls = rig.carriage.calls.lock().clone();
    assert_eq!(
        calls,
        vec![Call::Pause(true), Call::Pause(false), Call::Torch(true)]
    );
    assert_eq!(rig.interpreter.state(), InterpreterState::Idle);
}

#[test]
fn test_hard_reset_recovers_from_error() {
    let mut rig = rig(InterpreterConfig::default(), true);
    rig.interpreter.run("SPEED(-1)\nGO(5)").expect("runs");
    step(&mut rig, 2, 0.1);
    assert_eq!(rig.interpreter.state(), InterpreterState::Error);
    assert!(rig.interpreter.run("GO(1)").is_err());
    assert!(rig.interpreter.toggle_pause(&mut rig.carriage).is_err());

    rig.interpreter.hard_reset(&mut rig.carriage);
    assert_eq!(rig.interpreter.state(), InterpreterState::Idle);
    assert_eq!(rig.interpreter.pending_len(), 0);
    assert!(rig.interpreter.failure().is_none());
    {
        let calls = rig.carriage.calls.lock();
        assert!(calls.ends_with(&[Call::Stop, Call::Pause(false)]));
    }

    assert_eq!(rig.interpreter.run("SPEED(50)"), Ok(1));
    step(&mut rig, 3, 0.1);
    assert!(rig.carriage.calls.lock().contains(&Call::Speed(50.0)));
}

#[test]
fn test_end_drops_remaining_commands() {
    let mut rig = rig(InterpreterConfig::default(), true);
    rig.interpreter
        .run("START\nPAUSE(0.2)\nEND\nGO(50)")
        .expect("runs");
    step(&mut rig, 20, 0.1);

    assert_eq!(rig.interpreter.state(), InterpreterState::Idle);
    assert!(rig.carriage.moves().is_empty());
    assert_eq!(rig.interpreter.pending_len(), 0);

    let events = rig.events.lock();
    assert!(events
        .iter()
        .any(|e| matches!(e, ScriptEvent::Completed { executed: 3 })));
}

#[test]
fn test_command_started_reports_source_lines() {
    let mut rig = rig(InterpreterConfig::default(), true);
    rig.interpreter
        .run("// header\nSPEED(40)\n\nFIRE(0)")
        .expect("runs");
    step(&mut rig, 5, 0.1);

    let lines: Vec<Option<usize>> = rig
        .events
        .lock()
        .iter()
        .filter_map(|e| match e {
            ScriptEvent::CommandStarted { source_line, .. } => Some(*source_line),
            _ => None,
        })
        .collect();
    assert_eq!(lines, vec![Some(2), Some(4)]);
}
