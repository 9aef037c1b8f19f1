//! GPIO pin assignments for the Presa press controller main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Output relays
// ---------------------------------------------------------------------------

/// Relay 1: motor-pump contactor.
pub const RELAY_MOTOR_GPIO: i32 = 13;
/// Relay 2: automatic door actuator.
pub const RELAY_DOOR_GPIO: i32 = 12;
/// Relay 3: descent valve 12MB1 (fast down; held during high-force press).
pub const RELAY_DOWN_FAST_GPIO: i32 = 28;
/// Relay 4: ascent valve 12MB2.
pub const RELAY_UP_MAIN_GPIO: i32 = 27;
/// Relay 5: high-force valve 13MB1.
pub const RELAY_HIGH_FORCE_GPIO: i32 = 26;
/// Relay 6: ascent valve 13MB2.
pub const RELAY_UP_AUX_GPIO: i32 = 19;
/// Relay 7: reserve (unpopulated on rev B boards).
pub const RELAY_RESERVE1_GPIO: i32 = 17;
/// Relay 8: reserve.
pub const RELAY_RESERVE2_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Input signals (pull-up by default; polarity reconfigurable via the web API)
// ---------------------------------------------------------------------------

/// Cycle start push-button.
pub const START_BTN_GPIO: i32 = 18;
/// Manual jog up push-button.
pub const MANUAL_UP_BTN_GPIO: i32 = 20;
/// Manual jog down push-button.
pub const MANUAL_DOWN_BTN_GPIO: i32 = 21;
/// Emergency-stop mushroom button (NC loop).
pub const EMERGENCY_STOP_GPIO: i32 = 22;
/// Ram top-position inductive sensor.
pub const PRESS_TOP_SENSOR_GPIO: i32 = 3;
/// Ram bottom-position inductive sensor.
pub const PRESS_BOTTOM_SENSOR_GPIO: i32 = 4;
/// Door-open reed sensor.
pub const DOOR_OPEN_SENSOR_GPIO: i32 = 5;

/// Reserve inputs, broken out on the terminal block.
pub const RESERVE_INPUT_GPIOS: [i32; 5] = [6, 7, 8, 14, 15];

// ---------------------------------------------------------------------------
// Status indicator
// ---------------------------------------------------------------------------

/// Panel status LED: on = controller healthy, off = fault.
pub const STATUS_LED_GPIO: i32 = 25;

// ---------------------------------------------------------------------------
// 7-segment display (74HC595 shift-register pair, common cathode)
// ---------------------------------------------------------------------------

pub const DISPLAY_DATA_GPIO: i32 = 11;
pub const DISPLAY_CLOCK_GPIO: i32 = 10;
pub const DISPLAY_LATCH_GPIO: i32 = 9;
