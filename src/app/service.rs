//! Application service — the hexagonal core.
//!
//! [`PressService`] owns the FSM, the interlock supervisor, and the shared
//! context.  All I/O flows through port traits injected at the call site,
//! making the entire service testable with mock adapters.
//!
//! ```text
//!   InputPort ──▶ ┌──────────────────────────┐ ──▶ DisplaySink
//!                 │       PressService        │ ──▶ EventSink
//!   RelayPort ◀── │  FSM · Interlocks         │
//!                 └──────────────────────────┘
//! ```
//!
//! ## Fail-safe ordering
//!
//! Every path into `Error` — handler-decided, interlock-forced, or a
//! contained tick fault — zeroes the relay commands and writes them to the
//! hardware *before* the display sink or event sink hears about the
//! transition.
//!
//! ## Fault containment
//!
//! Any `Err` raised while evaluating a tick is contained at tick
//! granularity: diagnostic code `SYSTEM_ERROR`, relays de-energized, forced
//! `Error`.  The control loop itself never stops running.

use log::error;

use crate::config::PressConfig;
use crate::error::DiagnosticCode;
use crate::fsm::context::{PressContext, RelayCommands};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId, Transition};
use crate::safety::InterlockSupervisor;

use super::events::AppEvent;
use super::ports::{DisplaySink, EventSink, InputPort, RelayPort};

// ───────────────────────────────────────────────────────────────
// PressService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct PressService {
    fsm: Fsm,
    ctx: PressContext,
    interlocks: InterlockSupervisor,
}

impl PressService {
    /// Construct the service from configuration, starting in `INIT`.
    pub fn new(config: PressConfig) -> Self {
        let ctx = PressContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Init);
        Self {
            fsm,
            ctx,
            interlocks: InterlockSupervisor::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce startup.  Call once before the first `tick()`.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle:
    /// sample inputs → FSM tick → interlocks → apply outputs → notify.
    pub fn tick(
        &mut self,
        inputs: &mut impl InputPort,
        relays: &mut impl RelayPort,
        display: &mut impl DisplaySink,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) {
        let prev_state = self.fsm.current_state();
        let prev_faults = self.ctx.fault_flags;
        let prev_cycles = self.ctx.cycle_count;

        // 1. One consistent snapshot per tick.  A sampling failure is the
        //    contained-fault path: the tick converts it into ERROR and the
        //    loop keeps running.
        let snapshot = match inputs.sample() {
            Ok(snap) => snap,
            Err(e) => {
                error!("control tick: input sampling failed: {e}");
                self.contain_fault(relays, display, sink);
                return;
            }
        };
        self.ctx.now_ms = now_ms;
        self.ctx.inputs = snapshot;

        // A tick produces at most one handler transition plus at most one
        // forced interlock transition.
        let mut transitions: heapless::Vec<Transition, 2> = heapless::Vec::new();

        // 2. FSM tick (pure state logic).
        if let Some(t) = self.fsm.tick(&mut self.ctx) {
            let _ = transitions.push(t);
        }

        // 3. Global interlocks, evaluated against the pre-tick state and
        //    able to override whatever the handlers decided.
        let faults = self.interlocks.evaluate(&snapshot, prev_state);
        self.ctx.fault_flags = faults;
        if faults != 0 && self.fsm.current_state() != StateId::Error {
            self.ctx.relays.stop_all();
            relays.all_off();
            if let Some(t) = self.fsm.force_transition(StateId::Error, &mut self.ctx) {
                let _ = transitions.push(t);
            }
        }

        // 4. Apply outputs — always before any notification side effect.
        relays.apply(&self.ctx.relays);
        relays.set_status_led(self.ctx.status_led);

        // 5. Notify.
        for t in &transitions {
            display.notify(t.to);
            sink.emit(&AppEvent::StateChanged {
                from: t.from,
                to: t.to,
            });
            if t.to == StateId::Error {
                if let Some(code) = self.ctx.error_code {
                    sink.emit(&AppEvent::DiagnosticRaised(code));
                }
            }
        }
        if self.ctx.cycle_count != prev_cycles {
            sink.emit(&AppEvent::CycleCompleted(self.ctx.cycle_count));
        }
        if faults != 0 && prev_faults == 0 {
            sink.emit(&AppEvent::FaultDetected(faults));
        } else if faults == 0 && prev_faults != 0 {
            sink.emit(&AppEvent::FaultCleared);
        }
    }

    // ── Status accessors (read by the web snapshot) ───────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn cycle_count(&self) -> u32 {
        self.ctx.cycle_count
    }

    pub fn error_code(&self) -> Option<DiagnosticCode> {
        self.ctx.error_code
    }

    pub fn relay_commands(&self) -> RelayCommands {
        self.ctx.relays
    }

    pub fn fault_flags(&self) -> u8 {
        self.ctx.fault_flags
    }

    pub fn config(&self) -> &PressConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Tick-granularity containment for unexpected faults: relays off first,
    /// then the forced transition and its notifications.
    fn contain_fault(
        &mut self,
        relays: &mut impl RelayPort,
        display: &mut impl DisplaySink,
        sink: &mut impl EventSink,
    ) {
        self.ctx.error_code = Some(DiagnosticCode::SystemError);
        self.ctx.relays.stop_all();
        relays.all_off();
        let forced = self.fsm.force_transition(StateId::Error, &mut self.ctx);
        relays.set_status_led(self.ctx.status_led);
        if let Some(t) = forced {
            display.notify(t.to);
            sink.emit(&AppEvent::StateChanged {
                from: t.from,
                to: t.to,
            });
            sink.emit(&AppEvent::DiagnosticRaised(DiagnosticCode::SystemError));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, PinError};
    use crate::fsm::context::InputSnapshot;
    use std::cell::RefCell;
    use std::rc::Rc;

    // ── Recording mocks ───────────────────────────────────────
    //
    // Relay and display mocks share one call log so tests can assert on the
    // relative order of hardware writes and notifications.

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Apply(RelayCommands),
        Led(bool),
        AllOff,
        Notify(StateId),
    }

    type CallLog = Rc<RefCell<Vec<Call>>>;

    struct ScriptedInputs {
        snap: InputSnapshot,
        fail: bool,
    }

    impl InputPort for ScriptedInputs {
        fn sample(&mut self) -> crate::error::Result<InputSnapshot> {
            if self.fail {
                Err(Error::Pin(PinError::ReadFailed))
            } else {
                Ok(self.snap)
            }
        }
    }

    struct RecordingRelays(CallLog);

    impl RelayPort for RecordingRelays {
        fn apply(&mut self, relays: &RelayCommands) {
            self.0.borrow_mut().push(Call::Apply(*relays));
        }
        fn set_status_led(&mut self, on: bool) {
            self.0.borrow_mut().push(Call::Led(on));
        }
        fn all_off(&mut self) {
            self.0.borrow_mut().push(Call::AllOff);
        }
    }

    struct RecordingDisplay(CallLog);

    impl DisplaySink for RecordingDisplay {
        fn notify(&mut self, state: StateId) {
            self.0.borrow_mut().push(Call::Notify(state));
        }
    }

    #[derive(Default)]
    struct VecSink(Vec<AppEvent>);

    impl EventSink for VecSink {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(event.clone());
        }
    }

    struct Rig {
        service: PressService,
        inputs: ScriptedInputs,
        relays: RecordingRelays,
        display: RecordingDisplay,
        sink: VecSink,
        log: CallLog,
        now_ms: u64,
    }

    impl Rig {
        fn new() -> Self {
            let log: CallLog = Rc::new(RefCell::new(Vec::new()));
            let mut service = PressService::new(PressConfig::default());
            let mut sink = VecSink::default();
            service.start(&mut sink);
            Self {
                service,
                inputs: ScriptedInputs {
                    snap: InputSnapshot::default(),
                    fail: false,
                },
                relays: RecordingRelays(Rc::clone(&log)),
                display: RecordingDisplay(Rc::clone(&log)),
                sink,
                log,
                now_ms: 0,
            }
        }

        fn tick(&mut self) {
            self.now_ms += 100;
            self.service.tick(
                &mut self.inputs,
                &mut self.relays,
                &mut self.display,
                &mut self.sink,
                self.now_ms,
            );
        }
    }

    #[test]
    fn start_emits_started_event() {
        let rig = Rig::new();
        assert!(matches!(rig.sink.0[0], AppEvent::Started(StateId::Init)));
    }

    #[test]
    fn boot_sequence_reaches_idle_and_notifies_display() {
        let mut rig = Rig::new();
        rig.tick();
        rig.tick();
        assert_eq!(rig.service.state(), StateId::Idle);
        let notifies: Vec<_> = rig
            .log
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Notify(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(notifies, vec![StateId::StartupCheck, StateId::Idle]);
    }

    #[test]
    fn estop_forces_error_with_relays_off_before_notification() {
        let mut rig = Rig::new();
        rig.tick();
        rig.tick();
        rig.inputs.snap.start = true;
        rig.tick();
        assert_eq!(rig.service.state(), StateId::MotorWarmup);
        assert!(rig.service.relay_commands().motor);

        rig.log.borrow_mut().clear();
        rig.inputs.snap.emergency_stop = true;
        rig.tick();

        assert_eq!(rig.service.state(), StateId::Error);
        assert!(!rig.service.relay_commands().any_energized());

        let log = rig.log.borrow();
        let first_off = log
            .iter()
            .position(|c| matches!(c, Call::AllOff))
            .expect("relays must be cut");
        let notify = log
            .iter()
            .position(|c| matches!(c, Call::Notify(StateId::Error)))
            .expect("display must hear about the error");
        assert!(
            first_off < notify,
            "relays must be de-energized before the display notification"
        );
    }

    #[test]
    fn estop_raises_then_clears_fault_events() {
        let mut rig = Rig::new();
        rig.tick();
        rig.tick();

        rig.inputs.snap.emergency_stop = true;
        rig.tick();
        assert!(
            rig.sink
                .0
                .iter()
                .any(|e| matches!(e, AppEvent::FaultDetected(_)))
        );

        rig.inputs.snap.emergency_stop = false;
        rig.tick();
        assert!(rig.sink.0.iter().any(|e| matches!(e, AppEvent::FaultCleared)));
        // ERROR's own handler walks back to IDLE once interlocks clear.
        assert_eq!(rig.service.state(), StateId::Idle);
    }

    #[test]
    fn sampling_failure_is_contained_as_system_error() {
        let mut rig = Rig::new();
        rig.tick();
        rig.tick();
        assert_eq!(rig.service.state(), StateId::Idle);

        rig.inputs.fail = true;
        rig.tick();
        assert_eq!(rig.service.state(), StateId::Error);
        assert_eq!(rig.service.error_code(), Some(DiagnosticCode::SystemError));
        assert!(
            rig.sink
                .0
                .iter()
                .any(|e| matches!(e, AppEvent::DiagnosticRaised(DiagnosticCode::SystemError)))
        );

        // The loop keeps running; recovery works once sampling resumes.
        rig.inputs.fail = false;
        rig.tick();
        assert_eq!(rig.service.state(), StateId::Idle);
        assert_eq!(rig.service.error_code(), None);
    }

    #[test]
    fn door_open_midcycle_forces_error_but_not_in_idle() {
        let mut rig = Rig::new();
        rig.tick();
        rig.tick();

        // Door open while idle: no fault.
        rig.inputs.snap.door_open = true;
        rig.tick();
        assert_eq!(rig.service.state(), StateId::Idle);

        rig.inputs.snap.door_open = false;
        rig.inputs.snap.start = true;
        rig.tick();
        assert_eq!(rig.service.state(), StateId::MotorWarmup);
        rig.inputs.snap.start = false;

        // Door opens during warm-up: next tick faults.
        rig.inputs.snap.door_open = true;
        rig.tick();
        rig.tick();
        assert_eq!(rig.service.state(), StateId::Error);
    }
}
