//! Logical pin — inversion decorator over a shared hardware line.
//!
//! Callers of [`LogicalPin::value`] always see the *logical* level: an
//! active-low button constructed with `inverted = true` reads `true` while
//! held.  No caller above this layer ever sees a raw electrical level.

use crate::error::PinError;
use crate::io::line::{Direction, Pull, SharedLine};

/// A digital line with fixed direction and optional value inversion.
#[derive(Clone)]
pub struct LogicalPin {
    line: SharedLine,
    direction: Direction,
    inverted: bool,
}

impl core::fmt::Debug for LogicalPin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LogicalPin")
            .field("id", &self.line.id())
            .field("direction", &self.direction)
            .field("inverted", &self.inverted)
            .finish()
    }
}

impl LogicalPin {
    /// Configure `line` as an input with the given pull and inversion.
    pub fn input(line: SharedLine, pull: Pull, inverted: bool) -> Result<Self, PinError> {
        line.set_pull(pull)?;
        Ok(Self {
            line,
            direction: Direction::Input,
            inverted,
        })
    }

    /// Configure `line` as an output, driven to the logical-off level.
    pub fn output(line: SharedLine) -> Result<Self, PinError> {
        let pin = Self {
            line,
            direction: Direction::Output,
            inverted: false,
        };
        pin.set_value(false)?;
        Ok(pin)
    }

    /// Current logical (post-inversion) level.
    pub fn value(&self) -> Result<bool, PinError> {
        let raw = self.line.level()?;
        Ok(raw != self.inverted)
    }

    /// Drive the line so it reads back as `logical`.
    pub fn set_value(&self, logical: bool) -> Result<(), PinError> {
        self.line.set_level(logical != self.inverted)
    }

    /// The underlying shared line.
    pub fn line(&self) -> &SharedLine {
        &self.line
    }

    /// Hardware line identifier.
    pub fn id(&self) -> i32 {
        self.line.id()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::hardware::SimLine;
    use std::sync::Arc;

    #[test]
    fn value_is_logical_not_electrical() {
        let sim = Arc::new(SimLine::new(7));
        let pin = LogicalPin::input(sim.clone(), Pull::Up, true).unwrap();

        // Electrically high (pulled up, button released) -> logically false.
        sim.set_raw_level(true);
        assert!(!pin.value().unwrap());

        // Electrically low (button pressed) -> logically true.
        sim.set_raw_level(false);
        assert!(pin.value().unwrap());
    }

    #[test]
    fn non_inverted_passes_through() {
        let sim = Arc::new(SimLine::new(3));
        let pin = LogicalPin::input(sim.clone(), Pull::Down, false).unwrap();
        sim.set_raw_level(true);
        assert!(pin.value().unwrap());
        sim.set_raw_level(false);
        assert!(!pin.value().unwrap());
    }

    #[test]
    fn output_starts_off() {
        let sim = Arc::new(SimLine::new(12));
        sim.set_raw_level(true);
        let pin = LogicalPin::output(sim.clone()).unwrap();
        assert!(!pin.value().unwrap());
        pin.set_value(true).unwrap();
        assert!(sim.raw_level());
    }

    #[test]
    fn input_applies_pull_at_construction() {
        let sim = Arc::new(SimLine::new(4));
        let _pin = LogicalPin::input(sim.clone(), Pull::Down, false).unwrap();
        assert_eq!(sim.current_pull(), Pull::Down);
    }
}
