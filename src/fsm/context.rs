//! Shared mutable context threaded through every FSM handler.
//!
//! `PressContext` is the single struct that state handlers read from and
//! write to: the per-tick input snapshot, the relay command outputs, the
//! named process deadlines, configuration, and accumulated interlock faults.
//! Relay commands persist across ticks — a handler that energizes the motor
//! leaves it energized until some later handler de-energizes it, exactly as
//! the physical relays behave.

use crate::config::PressConfig;
use crate::error::DiagnosticCode;
use crate::fsm::StateId;

// ---------------------------------------------------------------------------
// Input snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// One consistent sampling of every control input, taken once per tick.
/// All values are active-sense booleans (pull polarity already folded in).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    /// Cycle start button.
    pub start: bool,
    /// Manual jog-up button.
    pub manual_up: bool,
    /// Manual jog-down button.
    pub manual_down: bool,
    /// Emergency-stop engaged.
    pub emergency_stop: bool,
    /// Ram at top position.
    pub top: bool,
    /// Ram at bottom position.
    pub bottom: bool,
    /// Safety door open.
    pub door_open: bool,
}

// ---------------------------------------------------------------------------
// Relay commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Commanded level of every relay output.  Mirrors the physical contactor
/// bank; `true` = energized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayCommands {
    /// Motor-pump contactor.
    pub motor: bool,
    /// Automatic door actuator.
    pub door: bool,
    /// Descent valve 12MB1 (fast down; held during high-force press).
    pub down_fast: bool,
    /// Ascent valve 12MB2.
    pub up_main: bool,
    /// High-force valve 13MB1.
    pub high_force: bool,
    /// Ascent valve 13MB2.
    pub up_aux: bool,
}

impl RelayCommands {
    /// Every relay de-energized — the fail-safe resting state.
    pub const fn all_off() -> Self {
        Self {
            motor: false,
            door: false,
            down_fast: false,
            up_main: false,
            high_force: false,
            up_aux: false,
        }
    }

    /// De-energize everything in place.
    pub fn stop_all(&mut self) {
        *self = Self::all_off();
    }

    /// Command fast downward motion (motor state untouched).
    pub fn command_fast_down(&mut self) {
        self.down_fast = true;
        self.up_main = false;
        self.high_force = false;
        self.up_aux = false;
    }

    /// Command upward motion (motor state untouched).
    pub fn command_up(&mut self) {
        self.down_fast = false;
        self.up_main = true;
        self.high_force = false;
        self.up_aux = true;
    }

    /// True if any output is energized.
    pub fn any_energized(&self) -> bool {
        self.motor || self.door || self.down_fast || self.up_main || self.high_force || self.up_aux
    }
}

// ---------------------------------------------------------------------------
// Deadlines
// ---------------------------------------------------------------------------

/// An absolute point in monotonic time, or disarmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<u64>);

impl Deadline {
    pub const fn disarmed() -> Self {
        Self(None)
    }

    /// Arm (or re-arm) at the given absolute monotonic millisecond.
    pub fn arm(&mut self, at_ms: u64) {
        self.0 = Some(at_ms);
    }

    pub fn disarm(&mut self) {
        self.0 = None;
    }

    pub fn is_armed(&self) -> bool {
        self.0.is_some()
    }

    /// Armed and reached.  A disarmed deadline never expires.
    pub fn expired(&self, now_ms: u64) -> bool {
        self.0.is_some_and(|at| now_ms >= at)
    }
}

/// The named process timers.  Mutated only by state handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timers {
    /// Motor warm-up complete.
    pub motor_warmup: Deadline,
    /// Fast-descent fallback cutoff.
    pub fast_down: Deadline,
    /// Next high-force (re-)assertion.
    pub slow_down_transition: Deadline,
    /// Top sensor must trigger before this.
    pub move_up_timeout: Deadline,
    /// Continuous bottom-hold completes the press at this point.
    pub full_press: Deadline,
    /// Whole-cycle budget.
    pub cycle_timeout: Deadline,
}

// ---------------------------------------------------------------------------
// PressContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
#[derive(Clone)]
pub struct PressContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,
    /// Monotonic time of the current tick (milliseconds since boot).
    pub now_ms: u64,

    // -- Inputs --
    /// Latest input snapshot.  Written by the service before each FSM tick.
    pub inputs: InputSnapshot,

    // -- Outputs --
    /// Relay commands, persistent across ticks.
    pub relays: RelayCommands,
    /// Panel status indicator (not part of the relay bank; survives
    /// `RelayCommands::stop_all`).
    pub status_led: bool,

    // -- Process bookkeeping --
    pub timers: Timers,
    /// Diagnostic tag for the most recent error entry.
    pub error_code: Option<DiagnosticCode>,
    /// Completed press cycles since boot.
    pub cycle_count: u32,
    /// State active before the most recent transition.
    pub last_state: Option<StateId>,

    // -- Configuration --
    pub config: PressConfig,

    // -- Safety --
    /// Interlock fault bitmask (see `InterlockFault::mask()`).  Written by
    /// the interlock supervisor, exposed through the status snapshot.
    pub fault_flags: u8,
}

impl PressContext {
    /// Create a new context with the given configuration.
    pub fn new(config: PressConfig) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            now_ms: 0,
            inputs: InputSnapshot::default(),
            relays: RelayCommands::all_off(),
            status_led: false,
            timers: Timers::default(),
            error_code: None,
            cycle_count: 0,
            last_state: None,
            config,
            fault_flags: 0,
        }
    }

    /// Returns `true` if **any** interlock fault is active.
    pub fn has_faults(&self) -> bool {
        self.fault_flags != 0
    }
}
