//! System configuration parameters
//!
//! All tunable parameters for the Presa press controller: process timing
//! windows, loop periods, input debounce, and the SoftAP credentials the
//! external web UI connects through.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PressConfig {
    // --- Process timing ---
    /// Motor warm-up before the first upward move (milliseconds)
    pub motor_warmup_ms: u64,
    /// Time budget for reaching the top-position sensor (milliseconds)
    pub move_up_timeout_ms: u64,
    /// Fast-descent fallback window before slow/high-force takes over (milliseconds)
    pub fast_down_timeout_ms: u64,
    /// Pause between fast-down cutoff and the first high-force assertion (milliseconds)
    pub slow_down_pause_ms: u64,
    /// Re-assertion period of the high-force output while pressing (milliseconds)
    pub high_force_pulse_ms: u64,
    /// Continuous bottom-sensor hold required to declare a full press (milliseconds)
    pub full_press_hold_ms: u64,
    /// Overall budget for one automatic press cycle (milliseconds)
    pub cycle_timeout_ms: u64,

    // --- Loop periods ---
    /// Edge-monitoring loop period (milliseconds)
    pub monitor_interval_ms: u32,
    /// Control loop period (milliseconds)
    pub control_loop_interval_ms: u32,

    // --- Inputs ---
    /// Debounce window applied to operator buttons (milliseconds, 0 = disabled)
    pub button_debounce_ms: u32,

    // --- Network ---
    /// SoftAP SSID the web UI connects to
    pub ap_ssid: heapless::String<32>,
    /// SoftAP WPA2 passphrase
    pub ap_password: heapless::String<64>,
}

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            // Process timing
            motor_warmup_ms: 5_000,
            move_up_timeout_ms: 15_000,
            fast_down_timeout_ms: 15_000,
            slow_down_pause_ms: 2_000,
            high_force_pulse_ms: 1_000,
            full_press_hold_ms: 10_000,
            cycle_timeout_ms: 60_000,

            // Loop periods
            monitor_interval_ms: 10,    // 100 Hz edge monitoring
            control_loop_interval_ms: 100, // 10 Hz process control

            // Inputs
            button_debounce_ms: 50,

            // Network
            ap_ssid: heapless::String::try_from("Presa_Control").unwrap_or_default(),
            ap_password: heapless::String::try_from("presa123").unwrap_or_default(),
        }
    }
}
