//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PressService (domain)
//! ```
//!
//! Driven adapters (input bank, relay bank, display, event sinks) implement
//! these traits.  The [`PressService`](super::service::PressService) consumes
//! them via generics, so the domain core never touches hardware directly.

use crate::error::Result;
use crate::fsm::StateId;
use crate::fsm::context::{InputSnapshot, RelayCommands};

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per tick to obtain a single
/// consistent snapshot of every control input.
pub trait InputPort {
    fn sample(&mut self) -> Result<InputSnapshot>;
}

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive the relay bank and the
/// panel status indicator.
pub trait RelayPort {
    /// Apply the full command set to the physical outputs.
    fn apply(&mut self, relays: &RelayCommands);

    /// Drive the panel status indicator.
    fn set_status_led(&mut self, on: bool);

    /// De-energize every relay immediately.
    fn all_off(&mut self) {
        self.apply(&RelayCommands::all_off());
    }
}

// ───────────────────────────────────────────────────────────────
// Display sink (driven adapter: domain → operator display)
// ───────────────────────────────────────────────────────────────

/// Receives one notification per state transition.  The core supplies only
/// the logical state; formatting and multiplexing belong to the adapter.
pub trait DisplaySink {
    fn notify(&mut self, state: StateId);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, web
/// event stream, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
