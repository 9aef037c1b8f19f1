//! Input bank — active-sense sampling and pull-polarity reconfiguration.
//!
//! Every control input is read through [`InputBank::active`], which folds the
//! configured pull polarity into an *active* boolean: a pull-up input is
//! active when electrically low, a pull-down input when electrically high.
//! The web configuration API changes polarities through
//! [`InputBank::set_pull`]; this bank is the only conduit between that API
//! and the control logic.

use log::info;

use crate::error::{Error, PinError};
use crate::fsm::context::InputSnapshot;
use crate::io::line::{Pull, SharedLine};

/// Role names for the press control inputs.  The web API addresses inputs by
/// these names; [`InputBank::snapshot`] samples them for the control loop.
pub const START_BTN: &str = "start_btn";
pub const MANUAL_UP_BTN: &str = "manual_up_btn";
pub const MANUAL_DOWN_BTN: &str = "manual_down_btn";
pub const EMERGENCY_STOP_BTN: &str = "emergency_stop_btn";
pub const PRESS_TOP_SENSOR: &str = "press_top_sensor";
pub const PRESS_BOTTOM_SENSOR: &str = "press_bottom_sensor";
pub const DOOR_OPEN_SENSOR: &str = "door_open_sensor";

/// The seven control inputs, in snapshot order.
pub const CONTROL_INPUTS: [&str; 7] = [
    START_BTN,
    MANUAL_UP_BTN,
    MANUAL_DOWN_BTN,
    EMERGENCY_STOP_BTN,
    PRESS_TOP_SENSOR,
    PRESS_BOTTOM_SENSOR,
    DOOR_OPEN_SENSOR,
];

const MAX_INPUTS: usize = 16;

struct InputEntry {
    name: &'static str,
    line: SharedLine,
    pull: Pull,
}

/// Named input table with per-input pull polarity.
pub struct InputBank {
    entries: heapless::Vec<InputEntry, MAX_INPUTS>,
}

impl InputBank {
    pub fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    /// Register an input under `name` with its initial pull, applying the
    /// pull to the hardware line.
    pub fn add(&mut self, name: &'static str, line: SharedLine, pull: Pull) -> crate::error::Result<()> {
        if self.entries.iter().any(|e| e.name == name) {
            return Err(Error::Config("duplicate input name"));
        }
        line.set_pull(pull)?;
        self.entries
            .push(InputEntry { name, line, pull })
            .map_err(|_| Error::Pin(PinError::TableFull))
    }

    fn entry(&self, name: &str) -> Result<&InputEntry, PinError> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or(PinError::UnknownPin)
    }

    /// Active-sense state of `name`, respecting its pull polarity.
    pub fn active(&self, name: &str) -> Result<bool, PinError> {
        let entry = self.entry(name)?;
        let level = entry.line.level()?;
        Ok(match entry.pull {
            Pull::Up => !level,
            // Floating inputs are treated like pull-down: active-high.
            Pull::Down | Pull::None => level,
        })
    }

    /// Reconfigure the pull polarity of `name`.  The line itself never
    /// changes, only its sensing polarity.
    pub fn set_pull(&mut self, name: &str, pull: Pull) -> Result<(), PinError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or(PinError::UnknownPin)?;
        entry.line.set_pull(pull)?;
        entry.pull = pull;
        info!("inputs: '{}' polarity set to {}", name, pull.as_arg());
        Ok(())
    }

    /// Current pull polarity of `name`.
    pub fn pull_of(&self, name: &str) -> Result<Pull, PinError> {
        Ok(self.entry(name)?.pull)
    }

    /// Registered input names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    /// Sample the seven control inputs into one consistent snapshot.
    pub fn snapshot(&self) -> Result<InputSnapshot, PinError> {
        Ok(InputSnapshot {
            start: self.active(START_BTN)?,
            manual_up: self.active(MANUAL_UP_BTN)?,
            manual_down: self.active(MANUAL_DOWN_BTN)?,
            emergency_stop: self.active(EMERGENCY_STOP_BTN)?,
            top: self.active(PRESS_TOP_SENSOR)?,
            bottom: self.active(PRESS_BOTTOM_SENSOR)?,
            door_open: self.active(DOOR_OPEN_SENSOR)?,
        })
    }
}

impl crate::app::ports::InputPort for InputBank {
    fn sample(&mut self) -> crate::error::Result<InputSnapshot> {
        Ok(self.snapshot()?)
    }
}
