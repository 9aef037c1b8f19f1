//! Edge-triggered pin: debounce, edge classification, and callback dispatch.
//!
//! Two mutually exclusive detection strategies, fixed at construction:
//!
//! - **Polled** — the monitor loop calls [`EdgeTriggeredPin::poll`] every
//!   cycle; change detection, debounce, and callback dispatch all happen
//!   synchronously in task context.
//! - **Interrupt** — a hardware edge runs [`IrqHandle::fire`], which does the
//!   minimum possible work (latch the logical level, mark the pin pending)
//!   and nothing else.  The monitor loop later drains pending pins through
//!   [`EdgeTriggeredPin::process_latched`], where the full debounce/dispatch
//!   logic runs in task context.
//!
//! ## ISR / task handoff
//!
//! The interrupt producer writes exactly two atomics: the single-slot value
//! latch and the pending flag.  Both use release stores; the consumer takes
//! them with acquire swaps.  Debounce bookkeeping (`last_value`,
//! `last_trigger_ms`) is written only by the monitor task, which never runs
//! concurrently with itself, so those fields need no synchronisation at all.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use log::info;

use crate::error::PinError;
use crate::io::line::SharedLine;
use crate::io::pin::LogicalPin;

/// Maximum callbacks per edge direction on a single pin.
const MAX_CALLBACKS: usize = 4;

/// Sentinel for an empty latch slot (levels are stored as 0/1).
const LATCH_EMPTY: u8 = u8::MAX;

// ---------------------------------------------------------------------------
// Edge classification
// ---------------------------------------------------------------------------

/// A logical value transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// false -> true.
    Rising,
    /// true -> false.
    Falling,
}

/// Which edge(s) a callback registers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Rising,
    Falling,
    Both,
}

/// Detection strategy, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorMode {
    /// Hardware interrupt latches the value; the monitor loop drains it.
    Interrupt,
    /// The monitor loop samples the pin every cycle.
    Polled,
}

/// Payload handed to edge callbacks.
#[derive(Debug, Clone, Copy)]
pub struct EdgeEvent {
    /// Hardware line identifier of the pin that triggered.
    pub line: i32,
    /// Classified edge direction.
    pub edge: Edge,
    /// Monotonic timestamp (ms) the edge was accepted at.
    pub at_ms: u64,
}

/// Edge callback.  Plain `fn` pointers — no closures, no heap — so they can
/// be compared for removal and dispatched without dynamic allocation.
pub type EdgeCallback = fn(&EdgeEvent);

// ---------------------------------------------------------------------------
// ISR latch
// ---------------------------------------------------------------------------

/// Single-slot value latch plus pending flag, shared between the interrupt
/// producer and the monitor-task consumer.
///
/// The slot is non-empty only between an interrupt firing and the next drain:
/// written exactly once per interrupt, swapped out exactly once per drain.
/// Re-marking an already-pending pin before a drain is idempotent.
struct IrqLatch {
    latched: AtomicU8,
    pending: AtomicBool,
}

impl IrqLatch {
    fn new() -> Self {
        Self {
            latched: AtomicU8::new(LATCH_EMPTY),
            pending: AtomicBool::new(false),
        }
    }

    /// Producer side.  Interrupt context: store-only, never blocks.
    fn capture(&self, level: bool) {
        self.latched.store(u8::from(level), Ordering::Release);
        self.pending.store(true, Ordering::Release);
    }

    /// Consumer side: read-and-clear the latched level.
    fn take_level(&self) -> Option<bool> {
        match self.latched.swap(LATCH_EMPTY, Ordering::AcqRel) {
            LATCH_EMPTY => None,
            v => Some(v != 0),
        }
    }

    /// Consumer side: test-and-clear the pending flag.
    fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

/// Handle owned by the hardware ISR glue for one interrupt-mode pin.
///
/// [`fire`](Self::fire) is the entire interrupt-context footprint of the
/// system: one level read and two atomic stores.
#[derive(Clone)]
pub struct IrqHandle {
    line: SharedLine,
    inverted: bool,
    latch: Arc<IrqLatch>,
}

impl IrqHandle {
    /// Called from the hardware edge interrupt.  Captures the current
    /// *logical* value into the latch and marks the pin pending.  No
    /// debounce, no callbacks, no allocation.
    pub fn fire(&self) {
        if let Ok(raw) = self.line.level() {
            self.latch.capture(raw != self.inverted);
        }
    }
}

// ---------------------------------------------------------------------------
// EdgeTriggeredPin
// ---------------------------------------------------------------------------

/// A logical pin with edge detection, optional debounce, and ordered
/// rising/falling callback lists.
pub struct EdgeTriggeredPin {
    pin: LogicalPin,
    mode: MonitorMode,
    /// Debounce window in milliseconds.  0 disables debouncing.
    debounce_ms: u32,
    /// Last *accepted* logical value.  A transition suppressed by debounce
    /// deliberately does not update this, so the next comparison still runs
    /// against the pre-transition baseline.
    last_value: bool,
    /// Timestamp (ms) of the last accepted transition.
    last_trigger_ms: u64,
    /// Present only in interrupt mode.
    latch: Option<Arc<IrqLatch>>,
    rising: heapless::Vec<EdgeCallback, MAX_CALLBACKS>,
    falling: heapless::Vec<EdgeCallback, MAX_CALLBACKS>,
}

impl EdgeTriggeredPin {
    /// Construct a polled-strategy pin.  Reads the line once to seed the
    /// last-accepted value.
    pub fn polled(pin: LogicalPin, debounce_ms: u32) -> Result<Self, PinError> {
        Self::new(pin, debounce_ms, MonitorMode::Polled)
    }

    /// Construct an interrupt-strategy pin.  The caller must register the
    /// [`IrqHandle`] (via [`irq_handle`](Self::irq_handle)) with the hardware
    /// interrupt for this line.
    pub fn interrupt(pin: LogicalPin, debounce_ms: u32) -> Result<Self, PinError> {
        Self::new(pin, debounce_ms, MonitorMode::Interrupt)
    }

    fn new(pin: LogicalPin, debounce_ms: u32, mode: MonitorMode) -> Result<Self, PinError> {
        let initial = pin.value()?;
        let latch = match mode {
            MonitorMode::Interrupt => Some(Arc::new(IrqLatch::new())),
            MonitorMode::Polled => None,
        };
        Ok(Self {
            pin,
            mode,
            debounce_ms,
            last_value: initial,
            last_trigger_ms: 0,
            latch,
            rising: heapless::Vec::new(),
            falling: heapless::Vec::new(),
        })
    }

    pub fn mode(&self) -> MonitorMode {
        self.mode
    }

    pub fn pin(&self) -> &LogicalPin {
        &self.pin
    }

    /// Hardware line identifier.
    pub fn id(&self) -> i32 {
        self.pin.id()
    }

    /// Last accepted logical value.
    pub fn last_value(&self) -> bool {
        self.last_value
    }

    /// ISR handle for an interrupt-mode pin; `None` for polled pins.
    pub fn irq_handle(&self) -> Option<IrqHandle> {
        self.latch.as_ref().map(|latch| IrqHandle {
            line: Arc::clone(self.pin.line()),
            inverted: self.pin.is_inverted(),
            latch: Arc::clone(latch),
        })
    }

    // ── Callback registration ─────────────────────────────────

    /// Register `cb` for the given edge kind(s).  Callbacks fire in
    /// registration order.  Returns the callback to permit fluent use.
    /// Registration beyond capacity is logged and dropped.
    pub fn add_callback(&mut self, kind: EdgeKind, cb: EdgeCallback) -> EdgeCallback {
        if matches!(kind, EdgeKind::Rising | EdgeKind::Both) && self.rising.push(cb).is_err() {
            info!("edge: rising callback list full on line {}", self.id());
        }
        if matches!(kind, EdgeKind::Falling | EdgeKind::Both) && self.falling.push(cb).is_err() {
            info!("edge: falling callback list full on line {}", self.id());
        }
        cb
    }

    /// Remove `cb` from both edge lists.  No error if absent.
    pub fn remove_callback(&mut self, cb: EdgeCallback) {
        self.rising.retain(|existing| !core::ptr::fn_addr_eq(*existing, cb));
        self.falling.retain(|existing| !core::ptr::fn_addr_eq(*existing, cb));
    }

    // ── Polled strategy ───────────────────────────────────────

    /// Sample the pin and dispatch on an accepted edge.  Called by the
    /// monitor loop for every polled pin, once per monitoring cycle.
    pub fn poll(&mut self, now_ms: u64) -> Result<(), PinError> {
        let current = self.pin.value()?;
        if current != self.last_value && self.debounce_passed(now_ms) {
            self.accept(current, now_ms);
        }
        Ok(())
    }

    // ── Interrupt strategy (deferred half) ────────────────────

    /// Consume the pending flag.  At most one drain per interrupt burst.
    pub(crate) fn take_pending(&self) -> bool {
        self.latch.as_ref().is_some_and(|l| l.take_pending())
    }

    /// Deferred processing for an interrupt-latched edge.
    ///
    /// Re-reads the current logical value and dispatches only if it still
    /// matches the latched value *and* differs from the last accepted value
    /// — a level that bounced back between the interrupt and this drain is
    /// rejected as stale.  The debounce comparison is stamped at drain time
    /// (not interrupt time); under scheduler jitter this can diverge from
    /// the polled path for identical hardware events, and that asymmetry is
    /// intentional and kept.
    pub(crate) fn process_latched(&mut self, now_ms: u64) -> Result<(), PinError> {
        let Some(latched) = self.latch.as_ref().and_then(|l| l.take_level()) else {
            return Ok(());
        };
        let current = self.pin.value()?;
        if current == latched && current != self.last_value && self.debounce_passed(now_ms) {
            self.accept(current, now_ms);
        }
        Ok(())
    }

    // ── Internal ──────────────────────────────────────────────

    fn debounce_passed(&self, now_ms: u64) -> bool {
        self.debounce_ms == 0
            || now_ms.wrapping_sub(self.last_trigger_ms) >= u64::from(self.debounce_ms)
    }

    /// Record an accepted transition and invoke the matching callbacks.
    fn accept(&mut self, current: bool, now_ms: u64) {
        let edge = if current { Edge::Rising } else { Edge::Falling };
        let event = EdgeEvent {
            line: self.id(),
            edge,
            at_ms: now_ms,
        };
        let callbacks = match edge {
            Edge::Rising => &self.rising,
            Edge::Falling => &self.falling,
        };
        for cb in callbacks {
            cb(&event);
        }
        self.last_trigger_ms = now_ms;
        self.last_value = current;
    }
}
