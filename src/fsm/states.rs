//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.  Handlers are pure functions of the context (state,
//! input snapshot, timers, clock): given identical contexts they produce
//! identical relay commands and transitions.
//!
//! ```text
//!  INIT ─▶ STARTUP_CHECK ─▶ IDLE ──[start]──▶ MOTOR_WARMUP ─▶ MOVE_UP
//!                            │ ▲                                 │
//!                     [jog] ▼ │                          [top sensor]
//!                 MANUAL_UP/DOWN                                ▼
//!                                                        WAIT_FOR_FILL
//!    IDLE ◀── PRESS_FULL ◀── SLOW_DOWN_HIGH_FORCE ◀── FAST_DOWN ◀┘
//!                 [bottom held]            [bottom / timeout]
//!
//!  Any state ──[e-stop / door / timeout]──▶ ERROR ──[interlocks clear]──▶ IDLE
//! ```

use super::context::PressContext;
use super::{StateDescriptor, StateId};
use crate::error::DiagnosticCode;
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Init
        StateDescriptor {
            id: StateId::Init,
            name: "INIT",
            on_enter: None,
            on_exit: None,
            on_update: init_update,
        },
        // Index 1 — StartupCheck
        StateDescriptor {
            id: StateId::StartupCheck,
            name: "STARTUP_CHECK",
            on_enter: None,
            on_exit: None,
            on_update: startup_check_update,
        },
        // Index 2 — MotorWarmup
        StateDescriptor {
            id: StateId::MotorWarmup,
            name: "MOTOR_WARMUP",
            on_enter: None,
            on_exit: None,
            on_update: motor_warmup_update,
        },
        // Index 3 — Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "IDLE",
            on_enter: None,
            on_exit: None,
            on_update: idle_update,
        },
        // Index 4 — WaitForFill
        StateDescriptor {
            id: StateId::WaitForFill,
            name: "WAIT_FOR_FILL",
            on_enter: None,
            on_exit: None,
            on_update: wait_for_fill_update,
        },
        // Index 5 — FastDown
        StateDescriptor {
            id: StateId::FastDown,
            name: "FAST_DOWN",
            on_enter: None,
            on_exit: None,
            on_update: fast_down_update,
        },
        // Index 6 — SlowDownHighForce
        StateDescriptor {
            id: StateId::SlowDownHighForce,
            name: "SLOW_DOWN_HIGH_FORCE",
            on_enter: None,
            on_exit: None,
            on_update: slow_down_update,
        },
        // Index 7 — MoveUp
        StateDescriptor {
            id: StateId::MoveUp,
            name: "MOVE_UP",
            on_enter: None,
            on_exit: None,
            on_update: move_up_update,
        },
        // Index 8 — PressFull
        StateDescriptor {
            id: StateId::PressFull,
            name: "PRESS_FULL",
            on_enter: None,
            on_exit: None,
            on_update: press_full_update,
        },
        // Index 9 — ManualUp
        StateDescriptor {
            id: StateId::ManualUp,
            name: "MANUAL_UP",
            on_enter: None,
            on_exit: None,
            on_update: manual_up_update,
        },
        // Index 10 — ManualDown
        StateDescriptor {
            id: StateId::ManualDown,
            name: "MANUAL_DOWN",
            on_enter: None,
            on_exit: None,
            on_update: manual_down_update,
        },
        // Index 11 — Error
        StateDescriptor {
            id: StateId::Error,
            name: "ERROR",
            on_enter: Some(error_enter),
            on_exit: Some(error_exit),
            on_update: error_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  INIT — single-pass hardware reset
// ═══════════════════════════════════════════════════════════════════════════

fn init_update(ctx: &mut PressContext) -> Option<StateId> {
    ctx.relays.stop_all();
    ctx.status_led = true;
    Some(StateId::StartupCheck)
}

// ═══════════════════════════════════════════════════════════════════════════
//  STARTUP_CHECK — refuse to go operational with an open interlock
// ═══════════════════════════════════════════════════════════════════════════

fn startup_check_update(ctx: &mut PressContext) -> Option<StateId> {
    if ctx.inputs.door_open || ctx.inputs.emergency_stop {
        Some(StateId::Error)
    } else {
        Some(StateId::Idle)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE — waiting for the operator
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(ctx: &mut PressContext) -> Option<StateId> {
    let mut next = None;

    if ctx.inputs.start && !ctx.inputs.emergency_stop {
        ctx.relays.motor = true;
        ctx.timers
            .motor_warmup
            .arm(ctx.now_ms + ctx.config.motor_warmup_ms);
        info!("IDLE: start pressed, motor warming up");
        next = Some(StateId::MotorWarmup);
    }

    // Manual jog is checked independently of the start branch and wins if
    // both are requested in the same tick.
    if ctx.inputs.manual_up {
        next = Some(StateId::ManualUp);
    } else if ctx.inputs.manual_down {
        next = Some(StateId::ManualDown);
    }

    next
}

// ═══════════════════════════════════════════════════════════════════════════
//  MOTOR_WARMUP — let the pump build pressure before the first move
// ═══════════════════════════════════════════════════════════════════════════

fn motor_warmup_update(ctx: &mut PressContext) -> Option<StateId> {
    if ctx.timers.motor_warmup.expired(ctx.now_ms) {
        ctx.relays.command_up();
        ctx.timers
            .move_up_timeout
            .arm(ctx.now_ms + ctx.config.move_up_timeout_ms);
        return Some(StateId::MoveUp);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  MOVE_UP — raise the ram to the loading position
// ═══════════════════════════════════════════════════════════════════════════

fn move_up_update(ctx: &mut PressContext) -> Option<StateId> {
    if ctx.inputs.top {
        return Some(StateId::WaitForFill);
    }
    if ctx.timers.move_up_timeout.expired(ctx.now_ms) {
        warn!("MOVE_UP: top sensor never triggered");
        ctx.error_code = Some(DiagnosticCode::MoveUpTimeout);
        return Some(StateId::Error);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAIT_FOR_FILL — operator loads the chamber, closes the door, confirms
// ═══════════════════════════════════════════════════════════════════════════

fn wait_for_fill_update(ctx: &mut PressContext) -> Option<StateId> {
    if !ctx.inputs.door_open && ctx.inputs.start {
        ctx.timers
            .cycle_timeout
            .arm(ctx.now_ms + ctx.config.cycle_timeout_ms);
        ctx.relays.command_fast_down();
        ctx.timers
            .fast_down
            .arm(ctx.now_ms + ctx.config.fast_down_timeout_ms);
        info!("WAIT_FOR_FILL: cycle started, descending");
        return Some(StateId::FastDown);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  FAST_DOWN — rapid descent until the bottom sensor (or fallback timeout)
// ═══════════════════════════════════════════════════════════════════════════

fn fast_down_update(ctx: &mut PressContext) -> Option<StateId> {
    // Timeout fallback takes the same path as the sensor.
    if ctx.inputs.bottom || ctx.timers.fast_down.expired(ctx.now_ms) {
        ctx.relays.down_fast = false;
        ctx.timers
            .slow_down_transition
            .arm(ctx.now_ms + ctx.config.slow_down_pause_ms);
        // Fresh hold window per cycle: the full-press timer arms on first
        // bottom detection inside SLOW_DOWN_HIGH_FORCE.
        ctx.timers.full_press.disarm();
        return Some(StateId::SlowDownHighForce);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SLOW_DOWN_HIGH_FORCE — pulsed high-force pressing until the hold completes
// ═══════════════════════════════════════════════════════════════════════════

fn slow_down_update(ctx: &mut PressContext) -> Option<StateId> {
    // Maintained pulsing of the high-force valve: each expiry re-asserts the
    // outputs and re-arms the pulse deadline.
    if ctx.timers.slow_down_transition.expired(ctx.now_ms) {
        ctx.relays.high_force = true;
        ctx.timers
            .slow_down_transition
            .arm(ctx.now_ms + ctx.config.high_force_pulse_ms);
        ctx.relays.down_fast = true;
    }

    // Continuous bottom-sensor hold completes the press.
    if ctx.inputs.bottom {
        if !ctx.timers.full_press.is_armed() {
            ctx.timers
                .full_press
                .arm(ctx.now_ms + ctx.config.full_press_hold_ms);
        } else if ctx.timers.full_press.expired(ctx.now_ms) {
            return Some(StateId::PressFull);
        }
    } else {
        ctx.timers.full_press.disarm();
    }

    if ctx.timers.cycle_timeout.expired(ctx.now_ms) {
        warn!("SLOW_DOWN_HIGH_FORCE: cycle budget exhausted");
        ctx.error_code = Some(DiagnosticCode::CycleTimeout);
        return Some(StateId::Error);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PRESS_FULL — cycle complete, release the work piece
// ═══════════════════════════════════════════════════════════════════════════

fn press_full_update(ctx: &mut PressContext) -> Option<StateId> {
    ctx.relays.stop_all();
    ctx.relays.door = true;
    ctx.cycle_count += 1;
    info!("PRESS_FULL: cycle {} complete, door opening", ctx.cycle_count);
    Some(StateId::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  MANUAL_UP / MANUAL_DOWN — operator jog, re-applied every tick
// ═══════════════════════════════════════════════════════════════════════════

fn manual_up_update(ctx: &mut PressContext) -> Option<StateId> {
    if ctx.inputs.manual_up && !ctx.inputs.emergency_stop {
        ctx.relays.motor = true;
        ctx.relays.command_up();
        None
    } else {
        ctx.relays.stop_all();
        Some(StateId::Idle)
    }
}

fn manual_down_update(ctx: &mut PressContext) -> Option<StateId> {
    if ctx.inputs.manual_down && !ctx.inputs.emergency_stop {
        ctx.relays.motor = true;
        ctx.relays.command_fast_down();
        None
    } else {
        ctx.relays.stop_all();
        Some(StateId::Idle)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR — fail-safe hold until every interlock clears
// ═══════════════════════════════════════════════════════════════════════════

fn error_enter(ctx: &mut PressContext) {
    // De-energizing the relay bank is the first side effect of every error
    // entry, before any notification happens.
    ctx.relays.stop_all();
    ctx.status_led = false;
    warn!(
        "ERROR: all relays de-energized, code={}",
        ctx.error_code.map_or("none", DiagnosticCode::as_str)
    );
}

fn error_exit(ctx: &mut PressContext) {
    ctx.status_led = true;
    info!("ERROR: interlocks clear, resuming normal operation");
}

fn error_update(ctx: &mut PressContext) -> Option<StateId> {
    // Re-assert the safe outputs every tick while faulted.
    ctx.relays.stop_all();
    ctx.status_led = false;

    if !ctx.inputs.emergency_stop && !ctx.inputs.door_open {
        ctx.error_code = None;
        return Some(StateId::Idle);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════
