//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions and the GPIO ISR service using raw ESP-IDF sys
//! calls.  Called once from `main()` before the executor starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::error::PinError;
use crate::io::line::Pull;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrAlreadyRegistered,
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrAlreadyRegistered => write!(f, "e-stop ISR handle already registered"),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the executor starts;
    // single-threaded.
    unsafe {
        init_gpio_inputs()?;
        init_gpio_outputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    let mut input_pins = vec![
        pins::START_BTN_GPIO,
        pins::MANUAL_UP_BTN_GPIO,
        pins::MANUAL_DOWN_BTN_GPIO,
        pins::PRESS_TOP_SENSOR_GPIO,
        pins::PRESS_BOTTOM_SENSOR_GPIO,
        pins::DOOR_OPEN_SENSOR_GPIO,
    ];
    input_pins.extend_from_slice(&pins::RESERVE_INPUT_GPIOS);

    for &pin in &input_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    // E-stop fires an interrupt on any edge; everything else is polled.
    let estop_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::EMERGENCY_STOP_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    let ret = unsafe { gpio_config(&estop_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from any context,
    // including ISRs.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let output_pins = [
        pins::RELAY_MOTOR_GPIO,
        pins::RELAY_DOOR_GPIO,
        pins::RELAY_DOWN_FAST_GPIO,
        pins::RELAY_UP_MAIN_GPIO,
        pins::RELAY_HIGH_FORCE_GPIO,
        pins::RELAY_UP_AUX_GPIO,
        pins::RELAY_RESERVE1_GPIO,
        pins::RELAY_RESERVE2_GPIO,
        pins::STATUS_LED_GPIO,
        pins::DISPLAY_DATA_GPIO,
        pins::DISPLAY_CLOCK_GPIO,
        pins::DISPLAY_LATCH_GPIO,
    ];

    for &pin in &output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        // Relays land de-energized before the control loop ever runs.
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: GPIO outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio_outputs().
    unsafe {
        gpio_set_level(pin, if high { 1 } else { 0 });
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── Pull reconfiguration ──────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_set_pull(pin: i32, pull: Pull) -> Result<(), PinError> {
    let mode = match pull {
        Pull::None => gpio_pull_mode_t_GPIO_FLOATING,
        Pull::Up => gpio_pull_mode_t_GPIO_PULLUP_ONLY,
        Pull::Down => gpio_pull_mode_t_GPIO_PULLDOWN_ONLY,
    };
    // SAFETY: gpio_set_pull_mode only touches the pad's pull registers on an
    // already-configured pin.
    let ret = unsafe { gpio_set_pull_mode(pin, mode) };
    if ret == ESP_OK as i32 {
        Ok(())
    } else {
        Err(PinError::PullConfigFailed)
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_set_pull(_pin: i32, _pull: Pull) -> Result<(), PinError> {
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

use crate::io::edge::IrqHandle;
use std::sync::OnceLock;

/// The e-stop pin's ISR handle.  Written once during wiring, read by the
/// interrupt handler for the rest of the process lifetime.
static ESTOP_IRQ: OnceLock<IrqHandle> = OnceLock::new();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn estop_gpio_isr(_arg: *mut core::ffi::c_void) {
    // Minimum possible ISR: latch the logical level, mark the pin pending.
    if let Some(handle) = ESTOP_IRQ.get() {
        handle.fire();
    }
}

/// Install the GPIO ISR service and attach the e-stop edge handler.
/// Call after `init_peripherals()` and before the executor starts.
#[cfg(target_os = "espidf")]
pub fn init_isr_service(estop: IrqHandle) -> Result<(), HwInitError> {
    ESTOP_IRQ
        .set(estop)
        .map_err(|_| HwInitError::IsrAlreadyRegistered)?;

    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).  The handler registered
    // below only performs the lock-free latch store.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        gpio_isr_handler_add(
            pins::EMERGENCY_STOP_GPIO,
            Some(estop_gpio_isr),
            core::ptr::null_mut(),
        );
        gpio_intr_enable(pins::EMERGENCY_STOP_GPIO);

        info!("hw_init: ISR service installed (e-stop)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service(estop: IrqHandle) -> Result<(), HwInitError> {
    ESTOP_IRQ
        .set(estop)
        .map_err(|_| HwInitError::IsrAlreadyRegistered)?;
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
