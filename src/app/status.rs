//! Web interface surface: the status snapshot and the inbound
//! pull-polarity configuration batch.
//!
//! The HTTP server itself lives outside this crate; it consumes exactly two
//! operations here:
//!
//! - [`status_snapshot`] — an internally-consistent, serializable view of
//!   the controller (state, cycle count, relay levels, input levels, input
//!   polarities).  All values come from a single sampling pass.
//! - [`apply_pull_config`] — a batch of `input name -> "up" | "down"`
//!   changes.  Entries are applied independently: a bad name or polarity
//!   rejects that entry and is reported, while the rest still apply.

use serde::Serialize;

use crate::error::Result;
use crate::io::inputs::{
    DOOR_OPEN_SENSOR, EMERGENCY_STOP_BTN, MANUAL_DOWN_BTN, MANUAL_UP_BTN, PRESS_BOTTOM_SENSOR,
    PRESS_TOP_SENSOR, START_BTN,
};
use crate::io::line::Pull;
use crate::io::InputBank;

use super::service::PressService;

// ───────────────────────────────────────────────────────────────
// Status snapshot
// ───────────────────────────────────────────────────────────────

/// Commanded relay output levels.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutputStatus {
    pub motor: bool,
    pub door: bool,
    pub down_fast: bool,
    pub up_main: bool,
    pub high_force: bool,
    pub up_aux: bool,
}

/// Active-sense input levels.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InputStatus {
    pub start_btn: bool,
    pub manual_up_btn: bool,
    pub manual_down_btn: bool,
    pub emergency_stop_btn: bool,
    pub press_top_sensor: bool,
    pub press_bottom_sensor: bool,
    pub door_open_sensor: bool,
}

/// Configured pull polarity per input (`"up"` / `"down"`).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InputConfigStatus {
    pub start_btn: &'static str,
    pub manual_up_btn: &'static str,
    pub manual_down_btn: &'static str,
    pub emergency_stop_btn: &'static str,
    pub press_top_sensor: &'static str,
    pub press_bottom_sensor: &'static str,
    pub door_open_sensor: &'static str,
}

/// The complete status view served at `/api/status` by the external web
/// server.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub state: &'static str,
    pub cycle_count: u32,
    pub error_code: Option<&'static str>,
    pub outputs: OutputStatus,
    pub inputs: InputStatus,
    pub input_config: InputConfigStatus,
}

/// Build a status snapshot from the service and input bank in one pass.
pub fn status_snapshot(service: &PressService, bank: &InputBank) -> Result<StatusSnapshot> {
    let relays = service.relay_commands();
    Ok(StatusSnapshot {
        state: service.state().name(),
        cycle_count: service.cycle_count(),
        error_code: service.error_code().map(|c| c.as_str()),
        outputs: OutputStatus {
            motor: relays.motor,
            door: relays.door,
            down_fast: relays.down_fast,
            up_main: relays.up_main,
            high_force: relays.high_force,
            up_aux: relays.up_aux,
        },
        inputs: InputStatus {
            start_btn: bank.active(START_BTN)?,
            manual_up_btn: bank.active(MANUAL_UP_BTN)?,
            manual_down_btn: bank.active(MANUAL_DOWN_BTN)?,
            emergency_stop_btn: bank.active(EMERGENCY_STOP_BTN)?,
            press_top_sensor: bank.active(PRESS_TOP_SENSOR)?,
            press_bottom_sensor: bank.active(PRESS_BOTTOM_SENSOR)?,
            door_open_sensor: bank.active(DOOR_OPEN_SENSOR)?,
        },
        input_config: InputConfigStatus {
            start_btn: bank.pull_of(START_BTN)?.as_arg(),
            manual_up_btn: bank.pull_of(MANUAL_UP_BTN)?.as_arg(),
            manual_down_btn: bank.pull_of(MANUAL_DOWN_BTN)?.as_arg(),
            emergency_stop_btn: bank.pull_of(EMERGENCY_STOP_BTN)?.as_arg(),
            press_top_sensor: bank.pull_of(PRESS_TOP_SENSOR)?.as_arg(),
            press_bottom_sensor: bank.pull_of(PRESS_BOTTOM_SENSOR)?.as_arg(),
            door_open_sensor: bank.pull_of(DOOR_OPEN_SENSOR)?.as_arg(),
        },
    })
}

// ───────────────────────────────────────────────────────────────
// Configuration batch
// ───────────────────────────────────────────────────────────────

/// Outcome of one configuration batch.  Failures are per-entry, never
/// silently swallowed: partial application is permitted and reported.
#[derive(Debug, Default)]
pub struct ConfigReport {
    /// Entries applied successfully.
    pub applied: u32,
    /// Names of entries that were rejected, with the reason.
    pub rejected: Vec<(String, &'static str)>,
}

impl ConfigReport {
    /// True if every entry in the batch applied.
    pub fn is_ok(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Apply a `name -> polarity` batch from the web configuration endpoint.
pub fn apply_pull_config(
    bank: &mut InputBank,
    changes: &serde_json::Map<String, serde_json::Value>,
) -> ConfigReport {
    let mut report = ConfigReport::default();
    for (name, value) in changes {
        let Some(arg) = value.as_str() else {
            report.rejected.push((name.clone(), "polarity must be a string"));
            continue;
        };
        let Some(pull) = Pull::from_arg(arg) else {
            report.rejected.push((name.clone(), "unknown polarity"));
            continue;
        };
        match bank.set_pull(name, pull) {
            Ok(()) => report.applied += 1,
            Err(_) => report.rejected.push((name.clone(), "unknown input")),
        }
    }
    report
}
