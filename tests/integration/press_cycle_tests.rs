//! End-to-end press cycle scenarios.
//!
//! Drives the real `PressService` + `InputBank` over simulated lines, with
//! recording relay/display adapters.  Buttons and sensors are pull-up
//! active-low: driving a line low "presses" it.

use std::sync::Arc;

use presa::adapters::hardware::SimLine;
use presa::app::events::AppEvent;
use presa::app::service::PressService;
use presa::app::status::{apply_pull_config, status_snapshot};
use presa::config::PressConfig;
use presa::error::DiagnosticCode;
use presa::fsm::StateId;
use presa::io::inputs::{self, InputBank};
use presa::io::line::Pull;

use crate::mock_hw::{RecordingDisplay, RecordingRelays, RelayCall, VecSink};

const TICK_MS: u64 = 100;

struct PressRig {
    service: PressService,
    bank: InputBank,
    lines: Vec<(&'static str, Arc<SimLine>)>,
    relays: RecordingRelays,
    display: RecordingDisplay,
    sink: VecSink,
    now_ms: u64,
}

impl PressRig {
    fn new() -> Self {
        let mut bank = InputBank::new();
        let mut lines = Vec::new();
        for (i, name) in inputs::CONTROL_INPUTS.iter().copied().enumerate() {
            let sim = Arc::new(SimLine::new(i as i32));
            sim.set_raw_level(true); // pull-up idle: electrically high
            bank.add(name, sim.clone(), Pull::Up).unwrap();
            lines.push((name, sim));
        }

        let mut service = PressService::new(PressConfig::default());
        let mut sink = VecSink::new();
        service.start(&mut sink);

        Self {
            service,
            bank,
            lines,
            relays: RecordingRelays::new(),
            display: RecordingDisplay::new(),
            sink,
            now_ms: 0,
        }
    }

    fn line(&self, name: &str) -> &Arc<SimLine> {
        &self
            .lines
            .iter()
            .find(|(n, _)| *n == name)
            .expect("known input")
            .1
    }

    /// Activate an input (drive the pulled-up line low).
    fn press(&mut self, name: &str) {
        self.line(name).set_raw_level(false);
    }

    /// Deactivate an input.
    fn release(&mut self, name: &str) {
        self.line(name).set_raw_level(true);
    }

    fn tick(&mut self) {
        self.now_ms += TICK_MS;
        self.service.tick(
            &mut self.bank,
            &mut self.relays,
            &mut self.display,
            &mut self.sink,
            self.now_ms,
        );
    }

    fn tick_for(&mut self, duration_ms: u64) {
        for _ in 0..duration_ms / TICK_MS {
            self.tick();
        }
    }

    /// Tick until the machine reaches `target` (bounded).
    fn tick_until(&mut self, target: StateId, max_ticks: usize) {
        for _ in 0..max_ticks {
            if self.state() == target {
                return;
            }
            self.tick();
        }
        panic!("never reached {:?}, stuck in {:?}", target, self.state());
    }

    fn state(&self) -> StateId {
        self.service.state()
    }

    /// INIT → STARTUP_CHECK → IDLE with clear interlocks.
    fn boot_to_idle(&mut self) {
        self.tick();
        self.tick();
        assert_eq!(self.state(), StateId::Idle);
    }

    /// Run the automatic sequence up to WAIT_FOR_FILL.
    fn run_to_wait_for_fill(&mut self) {
        self.boot_to_idle();
        self.press(inputs::START_BTN);
        self.tick();
        assert_eq!(self.state(), StateId::MotorWarmup);
        assert!(self.relays.motor_on());
        self.release(inputs::START_BTN);

        let warmup = self.service.config().motor_warmup_ms;
        self.tick_for(warmup + TICK_MS);
        assert_eq!(self.state(), StateId::MoveUp);

        self.press(inputs::PRESS_TOP_SENSOR);
        self.tick();
        assert_eq!(self.state(), StateId::WaitForFill);
    }
}

// ── Boot & startup checks ─────────────────────────────────────

#[test]
fn boot_reaches_idle_with_status_led_on() {
    let mut rig = PressRig::new();
    rig.boot_to_idle();
    assert_eq!(rig.relays.status_led(), Some(true));
    assert_eq!(
        rig.display.notified,
        vec![StateId::StartupCheck, StateId::Idle]
    );
}

#[test]
fn boot_with_open_door_lands_in_error() {
    let mut rig = PressRig::new();
    rig.press(inputs::DOOR_OPEN_SENSOR);
    rig.tick();
    rig.tick();
    assert_eq!(rig.state(), StateId::Error);
    assert!(!rig.relays.anything_energized());
    assert_eq!(rig.relays.status_led(), Some(false));
}

// ── Full automatic cycle ──────────────────────────────────────

#[test]
fn full_press_cycle_completes_and_counts() {
    let mut rig = PressRig::new();
    rig.run_to_wait_for_fill();

    // Operator closes the door (already closed) and confirms.
    rig.press(inputs::START_BTN);
    rig.tick();
    assert_eq!(rig.state(), StateId::FastDown);
    rig.release(inputs::START_BTN);
    rig.release(inputs::PRESS_TOP_SENSOR);

    // Ram reaches the bottom sensor.
    rig.press(inputs::PRESS_BOTTOM_SENSOR);
    rig.tick();
    assert_eq!(rig.state(), StateId::SlowDownHighForce);

    // High-force pulse engages after the pause.
    let pause = rig.service.config().slow_down_pause_ms;
    rig.tick_for(pause + TICK_MS);
    let cmds = rig.relays.last_commands().unwrap();
    assert!(cmds.high_force && cmds.down_fast);

    // Bottom held for the full hold window -> PRESS_FULL -> IDLE.
    let hold = rig.service.config().full_press_hold_ms;
    rig.tick_until(StateId::PressFull, (hold / TICK_MS) as usize + 4);
    rig.tick();
    assert_eq!(rig.state(), StateId::Idle);

    assert_eq!(rig.service.cycle_count(), 1);
    assert!(rig.relays.door_on());
    assert!(!rig.relays.motor_on());
    assert!(
        rig.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::CycleCompleted(1)))
    );
    // The display heard about every stage of the cycle.
    for state in [
        StateId::FastDown,
        StateId::SlowDownHighForce,
        StateId::PressFull,
        StateId::Idle,
    ] {
        assert!(
            rig.display.notified.contains(&state),
            "display never notified of {:?}",
            state
        );
    }
}

// ── Interlocks ────────────────────────────────────────────────

#[test]
fn estop_during_fast_down_cuts_relays_before_error_notification() {
    let mut rig = PressRig::new();
    rig.run_to_wait_for_fill();
    rig.press(inputs::START_BTN);
    rig.tick();
    assert_eq!(rig.state(), StateId::FastDown);

    rig.relays.calls.clear();
    rig.display.notified.clear();
    rig.press(inputs::EMERGENCY_STOP_BTN);
    rig.tick();

    assert_eq!(rig.state(), StateId::Error);
    assert!(!rig.relays.anything_energized());
    // Relays were cut before the display heard about the transition: the
    // first relay call of the tick is the all-off, and it happened while the
    // display log was still empty.
    assert_eq!(rig.relays.calls.first(), Some(&RelayCall::AllOff));
    assert_eq!(rig.display.notified, vec![StateId::Error]);
}

#[test]
fn door_open_during_descent_forces_error_and_recovery_works() {
    let mut rig = PressRig::new();
    rig.run_to_wait_for_fill();
    rig.press(inputs::START_BTN);
    rig.tick();
    rig.release(inputs::START_BTN);
    assert_eq!(rig.state(), StateId::FastDown);

    rig.press(inputs::DOOR_OPEN_SENSOR);
    rig.tick();
    rig.tick();
    assert_eq!(rig.state(), StateId::Error);
    assert!(!rig.relays.anything_energized());

    // Closing the door clears the interlock; the machine walks back to IDLE.
    rig.release(inputs::DOOR_OPEN_SENSOR);
    rig.tick();
    rig.tick();
    assert_eq!(rig.state(), StateId::Idle);
    assert!(rig.sink.events.iter().any(|e| matches!(e, AppEvent::FaultCleared)));
}

#[test]
fn move_up_timeout_reports_diagnostic_through_snapshot() {
    let mut rig = PressRig::new();
    rig.boot_to_idle();
    rig.press(inputs::START_BTN);
    rig.tick();
    rig.release(inputs::START_BTN);

    let warmup = rig.service.config().motor_warmup_ms;
    let timeout = rig.service.config().move_up_timeout_ms;
    rig.tick_for(warmup + TICK_MS);
    assert_eq!(rig.state(), StateId::MoveUp);

    // Top sensor never fires.
    rig.tick_for(timeout + TICK_MS);
    assert_eq!(rig.state(), StateId::Error);
    assert_eq!(rig.service.error_code(), Some(DiagnosticCode::MoveUpTimeout));

    let snap = status_snapshot(&rig.service, &rig.bank).unwrap();
    assert_eq!(snap.state, "ERROR");
    assert_eq!(snap.error_code, Some("MOVE_UP_TIMEOUT"));
}

// ── Web surface ───────────────────────────────────────────────

#[test]
fn snapshot_tracks_live_inputs_and_outputs() {
    let mut rig = PressRig::new();
    rig.boot_to_idle();
    rig.press(inputs::START_BTN);
    rig.tick();

    let snap = status_snapshot(&rig.service, &rig.bank).unwrap();
    assert_eq!(snap.state, "MOTOR_WARMUP");
    assert!(snap.outputs.motor);
    assert!(snap.inputs.start_btn);
    assert_eq!(snap.input_config.start_btn, "up");
}

#[test]
fn polarity_reconfiguration_flips_control_semantics() {
    let mut rig = PressRig::new();
    rig.boot_to_idle();

    // Reconfigure the start button to pull-down (active-high).
    let body = serde_json::json!({ "start_btn": "down" });
    let report = apply_pull_config(&mut rig.bank, body.as_object().unwrap());
    assert!(report.is_ok());

    // The line still sits electrically high, which now reads as "pressed".
    rig.tick();
    assert_eq!(rig.state(), StateId::MotorWarmup);
}

#[test]
fn bad_config_batch_is_reported_but_does_not_disturb_control() {
    let mut rig = PressRig::new();
    rig.boot_to_idle();

    let body = serde_json::json!({ "start_btn": "diagonal", "not_an_input": "up" });
    let report = apply_pull_config(&mut rig.bank, body.as_object().unwrap());
    assert_eq!(report.applied, 0);
    assert_eq!(report.rejected.len(), 2);

    rig.tick();
    assert_eq!(rig.state(), StateId::Idle);
    assert_eq!(rig.bank.pull_of(inputs::START_BTN).unwrap(), Pull::Up);
}
