//! Pin registry and monitoring loop.
//!
//! [`BoardIo`] owns every pin on the board, organised into named groups
//! (`input`, `output`, plus any the caller creates), and runs the edge
//! monitoring loop:
//!
//! ```text
//!   every 10 ms:
//!     drain_pending()          interrupt-latched pins, priority first
//!     poll each polled pin     registration order
//! ```
//!
//! The registry is the sole writer of per-pin debounce bookkeeping; the
//! interrupt producer only ever touches a pin's latch and pending flag.
//! Pending state is instance-owned (one flag per interrupt pin), never a
//! process-wide collection.

use embassy_time::Timer;
use log::{info, warn};

use crate::error::{Error, PinError};
use crate::io::edge::{EdgeTriggeredPin, MonitorMode};
use crate::io::pin::LogicalPin;

/// Standard group for sensor/button inputs.
pub const INPUT_GROUP: &str = "input";
/// Standard group for relay/indicator outputs.
pub const OUTPUT_GROUP: &str = "output";

const MAX_GROUPS: usize = 4;
const MAX_PINS_PER_GROUP: usize = 16;
const MAX_EDGE_PINS: usize = 16;

/// A pin handed to [`BoardIo::add_pin`].
pub enum BoardPin {
    Plain(LogicalPin),
    Edge(EdgeTriggeredPin),
}

/// Reference stored inside a group: plain pins are owned in place, edge pins
/// live in the registry's arena so the monitor loop can iterate them without
/// walking groups.
enum PinRef {
    Plain(LogicalPin),
    Edge(usize),
}

/// A named, fixed mapping from role name to pin.  Populated at startup,
/// immutable thereafter.
struct PinGroup {
    name: &'static str,
    entries: heapless::Vec<(&'static str, PinRef), MAX_PINS_PER_GROUP>,
}

impl PinGroup {
    fn find(&self, pin_name: &str) -> Result<&PinRef, PinError> {
        self.entries
            .iter()
            .find(|(n, _)| *n == pin_name)
            .map(|(_, p)| p)
            .ok_or(PinError::UnknownPin)
    }
}

/// Process-wide I/O manager.
pub struct BoardIo {
    groups: heapless::Vec<PinGroup, MAX_GROUPS>,
    edge_pins: heapless::Vec<EdgeTriggeredPin, MAX_EDGE_PINS>,
    /// Indices into `edge_pins`, in registration order.
    polled: heapless::Vec<usize, MAX_EDGE_PINS>,
    /// Indices of interrupt-mode pins, checked for pending latches each drain.
    irq: heapless::Vec<usize, MAX_EDGE_PINS>,
}

impl BoardIo {
    /// Create a registry with the standard `input` and `output` groups.
    pub fn new() -> Self {
        let mut io = Self {
            groups: heapless::Vec::new(),
            edge_pins: heapless::Vec::new(),
            polled: heapless::Vec::new(),
            irq: heapless::Vec::new(),
        };
        // Capacity is MAX_GROUPS >= 2; these cannot fail.
        let _ = io.create_group(INPUT_GROUP);
        let _ = io.create_group(OUTPUT_GROUP);
        io
    }

    /// Create an additional named group.
    pub fn create_group(&mut self, name: &'static str) -> crate::error::Result<()> {
        if self.groups.iter().any(|g| g.name == name) {
            return Err(Error::Config("duplicate pin group"));
        }
        self.groups
            .push(PinGroup {
                name,
                entries: heapless::Vec::new(),
            })
            .map_err(|_| Error::Config("pin group table full"))
    }

    /// Register a pin under `group`/`name`.
    ///
    /// Edge pins are routed to exactly one monitoring list by their fixed
    /// mode: polled pins join the poll list, interrupt pins join the drain
    /// list.  A pin can never end up in both.
    pub fn add_pin(
        &mut self,
        group: &str,
        name: &'static str,
        pin: BoardPin,
    ) -> crate::error::Result<()> {
        // Validate the group before touching the monitoring lists so a bad
        // group name cannot leave an orphan entry behind.
        if !self.groups.iter().any(|g| g.name == group) {
            return Err(Error::Pin(PinError::UnknownGroup));
        }
        let pin_ref = match pin {
            BoardPin::Plain(p) => PinRef::Plain(p),
            BoardPin::Edge(e) => {
                let idx = self.edge_pins.len();
                let mode = e.mode();
                self.edge_pins.push(e).map_err(|_| PinError::TableFull)?;
                match mode {
                    MonitorMode::Polled => {
                        self.polled.push(idx).map_err(|_| PinError::TableFull)?;
                    }
                    MonitorMode::Interrupt => {
                        self.irq.push(idx).map_err(|_| PinError::TableFull)?;
                    }
                }
                PinRef::Edge(idx)
            }
        };

        let grp = self
            .groups
            .iter_mut()
            .find(|g| g.name == group)
            .ok_or(PinError::UnknownGroup)?;
        grp.entries
            .push((name, pin_ref))
            .map_err(|_| Error::Pin(PinError::TableFull))?;
        info!("io: registered pin '{}/{}'", group, name);
        Ok(())
    }

    // ── Checked lookups ───────────────────────────────────────

    fn group(&self, group: &str) -> Result<&PinGroup, PinError> {
        self.groups
            .iter()
            .find(|g| g.name == group)
            .ok_or(PinError::UnknownGroup)
    }

    /// Look up a plain (non-edge) pin.
    pub fn plain(&self, group: &str, name: &str) -> Result<&LogicalPin, PinError> {
        match self.group(group)?.find(name)? {
            PinRef::Plain(p) => Ok(p),
            PinRef::Edge(idx) => Ok(self.edge_pins[*idx].pin()),
        }
    }

    /// Look up an edge-triggered pin.
    pub fn edge_pin(&self, group: &str, name: &str) -> Result<&EdgeTriggeredPin, PinError> {
        match self.group(group)?.find(name)? {
            PinRef::Edge(idx) => Ok(&self.edge_pins[*idx]),
            PinRef::Plain(_) => Err(PinError::UnknownPin),
        }
    }

    /// Mutable lookup, used for callback registration at wiring time.
    pub fn edge_pin_mut(
        &mut self,
        group: &str,
        name: &str,
    ) -> Result<&mut EdgeTriggeredPin, PinError> {
        let idx = match self.group(group)?.find(name)? {
            PinRef::Edge(idx) => *idx,
            PinRef::Plain(_) => return Err(PinError::UnknownPin),
        };
        Ok(&mut self.edge_pins[idx])
    }

    /// Number of pins in the polled monitoring list.
    pub fn polled_len(&self) -> usize {
        self.polled.len()
    }

    /// Number of interrupt-mode pins awaiting drain checks.
    pub fn irq_len(&self) -> usize {
        self.irq.len()
    }

    // ── Monitoring ────────────────────────────────────────────

    /// Drain interrupt-latched edges.  Each pending pin is processed at most
    /// once per drain; ordering across pins is unspecified.
    pub fn drain_pending(&mut self, now_ms: u64) {
        for &idx in &self.irq {
            let pin = &mut self.edge_pins[idx];
            if pin.take_pending() {
                if let Err(e) = pin.process_latched(now_ms) {
                    warn!("io: drain failed on line {}: {}", pin.id(), e);
                }
            }
        }
    }

    /// Run the polled handler on every polled pin, in registration order.
    pub fn poll_monitored(&mut self, now_ms: u64) {
        for &idx in &self.polled {
            let pin = &mut self.edge_pins[idx];
            if let Err(e) = pin.poll(now_ms) {
                warn!("io: poll failed on line {}: {}", pin.id(), e);
            }
        }
    }

    /// One monitoring cycle: interrupt-sourced events first, then the poll
    /// list.
    pub fn service(&mut self, now_ms: u64) {
        self.drain_pending(now_ms);
        self.poll_monitored(now_ms);
    }

    /// Perpetual monitoring task.  Yields once per `period_ms` cycle; this
    /// task is the only writer of edge-pin bookkeeping.
    pub async fn monitor_loop(&mut self, period_ms: u32, now_ms: impl Fn() -> u64) -> ! {
        info!(
            "io: monitor loop up ({} polled, {} interrupt, {} ms period)",
            self.polled.len(),
            self.irq.len(),
            period_ms
        );
        loop {
            self.service(now_ms());
            Timer::after_millis(u64::from(period_ms)).await;
        }
    }
}
