//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern: a fixed table of state descriptors, each a
//! row of plain `fn` pointers — no closures, no `dyn`, no heap.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StateTable                                                 │
//! │  ┌──────────────────┬───────────┬──────────┬─────────────┐  │
//! │  │ StateId           │ on_enter  │ on_exit  │ on_update   │  │
//! │  ├──────────────────┼───────────┼──────────┼─────────────┤  │
//! │  │ Init              │ …         │ …        │ fn -> next  │  │
//! │  │ …                 │           │          │             │  │
//! │  │ Error             │ fn(ctx)   │ fn(ctx)  │ fn -> next  │  │
//! │  └──────────────────┴───────────┴──────────┴─────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.  If it
//! returns `Some(next_id)`, the engine runs `on_exit`, updates the pointer,
//! runs `on_enter`, and reports the [`Transition`] to the caller — the
//! service uses that report to notify the display sink exactly once per
//! transition.  The engine is the only mutator of the current state.

pub mod context;
pub mod states;

use context::PressContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all press process states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Init = 0,
    StartupCheck = 1,
    MotorWarmup = 2,
    Idle = 3,
    WaitForFill = 4,
    FastDown = 5,
    SlowDownHighForce = 6,
    MoveUp = 7,
    PressFull = 8,
    ManualUp = 9,
    ManualDown = 10,
    Error = 11,
}

impl StateId {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 12;

    /// Convert a `u8` index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Error` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Init,
            1 => Self::StartupCheck,
            2 => Self::MotorWarmup,
            3 => Self::Idle,
            4 => Self::WaitForFill,
            5 => Self::FastDown,
            6 => Self::SlowDownHighForce,
            7 => Self::MoveUp,
            8 => Self::PressFull,
            9 => Self::ManualUp,
            10 => Self::ManualDown,
            11 => Self::Error,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Error
            }
        }
    }

    /// Canonical uppercase name, used in logs and the status snapshot.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::StartupCheck => "STARTUP_CHECK",
            Self::MotorWarmup => "MOTOR_WARMUP",
            Self::Idle => "IDLE",
            Self::WaitForFill => "WAIT_FOR_FILL",
            Self::FastDown => "FAST_DOWN",
            Self::SlowDownHighForce => "SLOW_DOWN_HIGH_FORCE",
            Self::MoveUp => "MOVE_UP",
            Self::PressFull => "PRESS_FULL",
            Self::ManualUp => "MANUAL_UP",
            Self::ManualDown => "MANUAL_DOWN",
            Self::Error => "ERROR",
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut PressContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut PressContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

/// A completed state change, reported to the caller for display/event
/// notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]) and threads a mutable
/// [`PressContext`] through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Monotonically increasing tick counter (wraps at u64::MAX).
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut PressContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    /// 3. Report the transition, if one occurred.
    pub fn tick(&mut self, ctx: &mut PressContext) -> Option<Transition> {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx);

        next.and_then(|next_id| self.transition(next_id, ctx))
    }

    /// Force an immediate transition (used by the interlock supervisor to
    /// jump to `Error` regardless of what `on_update` returned).  Forcing
    /// the current state is a no-op.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut PressContext) -> Option<Transition> {
        if next as usize != self.current {
            self.transition(next, ctx)
        } else {
            None
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// How many ticks the FSM has been in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut PressContext) -> Option<Transition> {
        let from = self.current_state();
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;
        ctx.last_state = Some(from);

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }

        Some(Transition { from, to: next_id })
    }
}

#[cfg(test)]
mod tests {
    use super::context::PressContext;
    use super::*;
    use crate::config::PressConfig;

    fn make_ctx() -> PressContext {
        PressContext::new(PressConfig::default())
    }

    fn make_fsm() -> Fsm {
        Fsm::new(states::build_state_table(), StateId::Init)
    }

    #[test]
    fn starts_in_init() {
        let fsm = make_fsm();
        assert_eq!(fsm.current_state(), StateId::Init);
    }

    #[test]
    fn init_is_a_single_pass() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        let t = fsm.tick(&mut ctx).expect("INIT must transition");
        assert_eq!(t.from, StateId::Init);
        assert_eq!(t.to, StateId::StartupCheck);
        assert!(ctx.status_led);
        assert!(!ctx.relays.any_energized());
    }

    #[test]
    fn tick_reports_transition_and_records_last_state() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        let _ = fsm.tick(&mut ctx);
        assert_eq!(ctx.last_state, Some(StateId::Init));
        assert_eq!(fsm.ticks_in_current_state(), 0);
    }

    #[test]
    fn force_transition_to_current_state_is_noop() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        assert!(fsm.force_transition(StateId::Init, &mut ctx).is_none());
        let t = fsm.force_transition(StateId::Error, &mut ctx);
        assert_eq!(
            t,
            Some(Transition {
                from: StateId::Init,
                to: StateId::Error
            })
        );
        assert!(fsm.force_transition(StateId::Error, &mut ctx).is_none());
    }

    #[test]
    fn forced_error_entry_kills_all_relays() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        ctx.relays.motor = true;
        ctx.relays.command_fast_down();
        let _ = fsm.force_transition(StateId::Error, &mut ctx);
        assert!(!ctx.relays.any_energized());
        assert!(!ctx.status_led);
    }

    #[test]
    fn state_id_from_index_roundtrip() {
        for i in 0..StateId::COUNT {
            let id = StateId::from_index(i);
            assert_eq!(id as usize, i);
        }
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn state_id_from_invalid_index_returns_error() {
        let id = StateId::from_index(99);
        assert_eq!(id, StateId::Error);
    }
}
