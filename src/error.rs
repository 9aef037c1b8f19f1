//! Unified error types for the Presa firmware.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the top-level control loop's error handling uniform.
//! All variants are `Copy` so they can be cheaply passed through the interlock
//! supervisor and FSM without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A pin could not be read, written, or looked up.
    Pin(PinError),
    /// A safety interlock was violated.
    Interlock(InterlockFault),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or a capacity was exceeded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "pin: {e}"),
            Self::Interlock(e) => write!(f, "interlock: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Pin errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinError {
    /// GPIO level read returned an error.
    ReadFailed,
    /// GPIO level write returned an error.
    WriteFailed,
    /// Pull resistor reconfiguration failed at the hardware layer.
    PullConfigFailed,
    /// Lookup for a pin name that was never registered.
    UnknownPin,
    /// Lookup for a group name that was never created.
    UnknownGroup,
    /// A fixed-capacity pin table is full.
    TableFull,
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "level read failed"),
            Self::WriteFailed => write!(f, "level write failed"),
            Self::PullConfigFailed => write!(f, "pull reconfiguration failed"),
            Self::UnknownPin => write!(f, "unknown pin name"),
            Self::UnknownGroup => write!(f, "unknown pin group"),
            Self::TableFull => write!(f, "pin table full"),
        }
    }
}

impl std::error::Error for PinError {}

impl From<PinError> for Error {
    fn from(e: PinError) -> Self {
        Self::Pin(e)
    }
}

// ---------------------------------------------------------------------------
// Interlock faults
// ---------------------------------------------------------------------------

/// Interlock faults are a special category: they force an immediate transition
/// to the ERROR state and de-energize every relay output.  They are accumulated
/// in a bitfield by the interlock supervisor so that multiple simultaneous
/// faults can be tracked and individually cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InterlockFault {
    /// Emergency-stop button is engaged.
    EmergencyStop = 0b0000_0001,
    /// Safety door is open while the press is in a motion state.
    DoorOpen = 0b0000_0010,
}

impl InterlockFault {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for InterlockFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmergencyStop => write!(f, "emergency stop engaged"),
            Self::DoorOpen => write!(f, "door open during motion"),
        }
    }
}

impl std::error::Error for InterlockFault {}

impl From<InterlockFault> for Error {
    fn from(e: InterlockFault) -> Self {
        Self::Interlock(e)
    }
}

// ---------------------------------------------------------------------------
// Diagnostic codes
// ---------------------------------------------------------------------------

/// Diagnostic tag recorded when the FSM enters the ERROR state for a reason
/// that is not directly visible on an input (a timeout or a contained fault).
/// Remains readable for display/telemetry until the next error entry
/// overwrites it; cleared on recovery back to IDLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCode {
    /// Top-position sensor never triggered within the move-up window.
    MoveUpTimeout,
    /// A full press cycle exceeded its overall time budget.
    CycleTimeout,
    /// A fault was raised while evaluating a control tick and contained there.
    SystemError,
}

impl DiagnosticCode {
    /// Stable string form used by the web status snapshot.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MoveUpTimeout => "MOVE_UP_TIMEOUT",
            Self::CycleTimeout => "CYCLE_TIMEOUT",
            Self::SystemError => "SYSTEM_ERROR",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
