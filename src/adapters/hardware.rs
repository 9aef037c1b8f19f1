//! Hardware adapter — concrete [`Line`] implementations and the relay bank.
//!
//! This is the only module (together with `drivers::hw_init`) that touches
//! actual GPIO registers.  On non-espidf targets, [`SimLine`] provides an
//! in-memory line for host tests and simulation.

use std::sync::Arc;

use log::error;

use crate::app::ports::RelayPort;
use crate::error::PinError;
use crate::fsm::context::RelayCommands;
use crate::io::line::{Line, Pull, SharedLine};
use crate::io::pin::LogicalPin;

// ───────────────────────────────────────────────────────────────
// ESP-IDF line
// ───────────────────────────────────────────────────────────────

/// A GPIO line on the ESP32-S3, accessed through the raw register helpers in
/// `drivers::hw_init`.  Level reads are plain register reads and safe from
/// interrupt context.
#[cfg(target_os = "espidf")]
pub struct EspLine {
    gpio: i32,
}

#[cfg(target_os = "espidf")]
impl EspLine {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

#[cfg(target_os = "espidf")]
impl Line for EspLine {
    fn id(&self) -> i32 {
        self.gpio
    }

    fn level(&self) -> Result<bool, PinError> {
        Ok(crate::drivers::hw_init::gpio_read(self.gpio))
    }

    fn set_level(&self, high: bool) -> Result<(), PinError> {
        crate::drivers::hw_init::gpio_write(self.gpio, high);
        Ok(())
    }

    fn set_pull(&self, pull: Pull) -> Result<(), PinError> {
        crate::drivers::hw_init::gpio_set_pull(self.gpio, pull)
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation line (host targets)
// ───────────────────────────────────────────────────────────────

/// In-memory line for host tests: the electrical level and pull config are
/// plain atomics so test code and "ISR" code can poke them freely.
#[cfg(not(target_os = "espidf"))]
pub struct SimLine {
    gpio: i32,
    level: std::sync::atomic::AtomicBool,
    /// Encoded `Pull` (0 = none, 1 = up, 2 = down).
    pull: std::sync::atomic::AtomicU8,
}

#[cfg(not(target_os = "espidf"))]
impl SimLine {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            level: std::sync::atomic::AtomicBool::new(false),
            pull: std::sync::atomic::AtomicU8::new(0),
        }
    }

    /// Test hook: drive the electrical level.
    pub fn set_raw_level(&self, high: bool) {
        self.level.store(high, std::sync::atomic::Ordering::SeqCst);
    }

    /// Test hook: read the electrical level back.
    pub fn raw_level(&self) -> bool {
        self.level.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Test hook: the last applied pull configuration.
    pub fn current_pull(&self) -> Pull {
        match self.pull.load(std::sync::atomic::Ordering::SeqCst) {
            1 => Pull::Up,
            2 => Pull::Down,
            _ => Pull::None,
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Line for SimLine {
    fn id(&self) -> i32 {
        self.gpio
    }

    fn level(&self) -> Result<bool, PinError> {
        Ok(self.raw_level())
    }

    fn set_level(&self, high: bool) -> Result<(), PinError> {
        self.set_raw_level(high);
        Ok(())
    }

    fn set_pull(&self, pull: Pull) -> Result<(), PinError> {
        let encoded = match pull {
            Pull::None => 0,
            Pull::Up => 1,
            Pull::Down => 2,
        };
        self.pull.store(encoded, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

/// Construct a shared line for the given GPIO, picking the platform
/// implementation.
pub fn board_line(gpio: i32) -> SharedLine {
    #[cfg(target_os = "espidf")]
    {
        Arc::new(EspLine::new(gpio))
    }
    #[cfg(not(target_os = "espidf"))]
    {
        Arc::new(SimLine::new(gpio))
    }
}

// ───────────────────────────────────────────────────────────────
// Relay bank
// ───────────────────────────────────────────────────────────────

/// The six process relays plus the panel status LED, behind [`RelayPort`].
///
/// Write failures are logged, never propagated: by the time the service is
/// applying outputs, a failing relay write must not stop the loop from
/// de-energizing the remaining outputs.
pub struct RelayBank {
    pub motor: LogicalPin,
    pub door: LogicalPin,
    pub down_fast: LogicalPin,
    pub up_main: LogicalPin,
    pub high_force: LogicalPin,
    pub up_aux: LogicalPin,
    pub status_led: LogicalPin,
}

impl RelayBank {
    fn drive(pin: &LogicalPin, on: bool) {
        if let Err(e) = pin.set_value(on) {
            error!("relay: write failed on line {}: {}", pin.id(), e);
        }
    }
}

impl RelayPort for RelayBank {
    fn apply(&mut self, relays: &RelayCommands) {
        Self::drive(&self.motor, relays.motor);
        Self::drive(&self.door, relays.door);
        Self::drive(&self.down_fast, relays.down_fast);
        Self::drive(&self.up_main, relays.up_main);
        Self::drive(&self.high_force, relays.high_force);
        Self::drive(&self.up_aux, relays.up_aux);
    }

    fn set_status_led(&mut self, on: bool) {
        Self::drive(&self.status_led, on);
    }
}
