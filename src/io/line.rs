//! Raw hardware line access.
//!
//! [`Line`] is the lowest layer of the pin stack: direct electrical level
//! access with no inversion, debounce, or polarity interpretation.  Concrete
//! implementations live in `adapters::hardware` (`EspLine` for ESP-IDF GPIO,
//! `SimLine` for host-side tests).  Lines are shared as `Arc<dyn Line>` so a
//! single physical line can back a logical pin, an input-bank entry, and an
//! ISR handle at the same time.

use std::sync::Arc;

use crate::error::PinError;

/// Pull resistor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// Floating input / push-pull output.
    None,
    /// Internal pull-up; inputs wired this way are active-low.
    Up,
    /// Internal pull-down; inputs wired this way are active-high.
    Down,
}

impl Pull {
    /// Parse the wire form used by the web configuration API.
    /// Only `"up"` and `"down"` are valid polarities for an input.
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }

    /// Wire form for the web status snapshot.
    pub const fn as_arg(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Line direction, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// A single digital hardware line.
///
/// All methods take `&self`: implementations are internally atomic register
/// (or register-like) accesses.  `level()` must be callable from interrupt
/// context — no blocking, no allocation.
pub trait Line: Send + Sync {
    /// Hardware line identifier (GPIO number).
    fn id(&self) -> i32;

    /// Raw electrical level: `true` = high.
    fn level(&self) -> Result<bool, PinError>;

    /// Drive the line to the given electrical level.
    fn set_level(&self, high: bool) -> Result<(), PinError>;

    /// Reconfigure the pull resistor.  The line identity is unchanged.
    fn set_pull(&self, pull: Pull) -> Result<(), PinError>;
}

/// Shared handle to a hardware line.
pub type SharedLine = Arc<dyn Line>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_arg_roundtrip() {
        assert_eq!(Pull::from_arg("up"), Some(Pull::Up));
        assert_eq!(Pull::from_arg("down"), Some(Pull::Down));
        assert_eq!(Pull::from_arg("sideways"), None);
        assert_eq!(Pull::from_arg(""), None);
        assert_eq!(Pull::Up.as_arg(), "up");
        assert_eq!(Pull::Down.as_arg(), "down");
    }
}
