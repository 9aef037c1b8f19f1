//! Mock hardware adapters for integration tests.
//!
//! Records every relay write and display notification so tests can assert
//! on the full command history without touching real GPIO registers.

use presa::app::events::AppEvent;
use presa::app::ports::{DisplaySink, EventSink, RelayPort};
use presa::fsm::StateId;
use presa::fsm::context::RelayCommands;

// ── Relay call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCall {
    Apply(RelayCommands),
    StatusLed(bool),
    AllOff,
}

// ── RecordingRelays ───────────────────────────────────────────

#[derive(Default)]
pub struct RecordingRelays {
    pub calls: Vec<RelayCall>,
}

#[allow(dead_code)]
impl RecordingRelays {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently applied command set (AllOff counts as all-off).
    pub fn last_commands(&self) -> Option<RelayCommands> {
        self.calls.iter().rev().find_map(|c| match c {
            RelayCall::Apply(cmds) => Some(*cmds),
            RelayCall::AllOff => Some(RelayCommands::all_off()),
            RelayCall::StatusLed(_) => None,
        })
    }

    pub fn motor_on(&self) -> bool {
        self.last_commands().is_some_and(|c| c.motor)
    }

    pub fn door_on(&self) -> bool {
        self.last_commands().is_some_and(|c| c.door)
    }

    pub fn anything_energized(&self) -> bool {
        self.last_commands().is_some_and(|c| c.any_energized())
    }

    pub fn status_led(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            RelayCall::StatusLed(on) => Some(*on),
            _ => None,
        })
    }
}

impl RelayPort for RecordingRelays {
    fn apply(&mut self, relays: &RelayCommands) {
        self.calls.push(RelayCall::Apply(*relays));
    }

    fn set_status_led(&mut self, on: bool) {
        self.calls.push(RelayCall::StatusLed(on));
    }

    fn all_off(&mut self) {
        self.calls.push(RelayCall::AllOff);
    }
}

// ── RecordingDisplay ──────────────────────────────────────────

#[derive(Default)]
pub struct RecordingDisplay {
    pub notified: Vec<StateId>,
}

#[allow(dead_code)]
impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<StateId> {
        self.notified.last().copied()
    }
}

impl DisplaySink for RecordingDisplay {
    fn notify(&mut self, state: StateId) {
        self.notified.push(state);
    }
}

// ── VecSink ───────────────────────────────────────────────────

#[derive(Default)]
pub struct VecSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for VecSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
