//! Pin abstraction and edge monitoring.
//!
//! Layered by composition rather than inheritance:
//!
//! ```text
//!   Line (raw level access, Arc-shared, ISR-safe reads)
//!     └── LogicalPin (inversion decorator — callers only see logical levels)
//!           └── EdgeTriggeredPin (debounce + edge classification + callbacks)
//!                 └── BoardIo (groups, polled list, pending drain, monitor loop)
//! ```
//!
//! The one genuinely concurrent producer in the system is the hardware
//! interrupt.  Its entire footprint is confined to [`edge::IrqHandle::fire`]:
//! a level read, a single-slot atomic latch store, and a pending-flag store.
//! Everything else — debounce bookkeeping, callback dispatch, group tables —
//! is written only by the cooperative monitor task.

pub mod edge;
pub mod inputs;
pub mod line;
pub mod pin;
pub mod registry;

pub use edge::{Edge, EdgeCallback, EdgeEvent, EdgeKind, EdgeTriggeredPin, IrqHandle, MonitorMode};
pub use inputs::InputBank;
pub use line::{Direction, Line, Pull, SharedLine};
pub use pin::LogicalPin;
pub use registry::{BoardIo, BoardPin};
