//! Interlock supervisor.
//!
//! The supervisor runs **every tick after the FSM handlers** and accumulates
//! a fault bitmask from the physical interlocks.  The service forces the FSM
//! to `Error` while the mask is non-zero, de-energizing the relay bank first.
//!
//! ## Fault lifecycle
//!
//! 1. A condition triggers a fault (e-stop engaged, door opened mid-motion).
//! 2. The supervisor sets the corresponding bit.
//! 3. The service zeroes the relay outputs and forces `Error`.
//! 4. Each tick, the supervisor re-evaluates.  When the physical condition
//!    resolves, the bit clears.
//! 5. With the mask at zero, the `Error` state's own update handler walks
//!    the machine back to `Idle`.
//!
//! Multiple simultaneous faults are tracked individually: the system does
//! not leave `Error` until *every* interlock is released.

use crate::error::InterlockFault;
use crate::fsm::StateId;
use crate::fsm::context::InputSnapshot;
use log::{error, info};

/// States in which an open door is acceptable (the ram is not moving under
/// power, or the machine is already latched in a safe state).
const DOOR_EXEMPT_STATES: [StateId; 6] = [
    StateId::Init,
    StateId::StartupCheck,
    StateId::Idle,
    StateId::ManualUp,
    StateId::ManualDown,
    StateId::Error,
];

/// Interlock supervisor.
pub struct InterlockSupervisor {
    /// Latched fault bitmask.
    faults: u8,
}

impl InterlockSupervisor {
    pub fn new() -> Self {
        Self { faults: 0 }
    }

    /// Evaluate the interlocks against the tick's input snapshot.
    ///
    /// `state` is the state the tick's handlers ran in (pre-transition): a
    /// door opening in the same tick the machine leaves `Idle` is charged to
    /// `Idle` and only faults on the next tick.
    pub fn evaluate(&mut self, snap: &InputSnapshot, state: StateId) -> u8 {
        // ── Emergency stop: unconditional ────────────────────────
        self.eval_fault(InterlockFault::EmergencyStop, snap.emergency_stop);

        // ── Door: only while the ram moves under automatic control ──
        let door_matters = !DOOR_EXEMPT_STATES.contains(&state);
        self.eval_fault(InterlockFault::DoorOpen, snap.door_open && door_matters);

        self.faults
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// True if **any** fault is active.
    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: InterlockFault) -> bool {
        self.faults & fault.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: InterlockFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("INTERLOCK FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("INTERLOCK FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
