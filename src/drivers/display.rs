//! 7-segment display sink.
//!
//! A pair of cascaded 74HC595 shift registers drive a 4-digit common-cathode
//! module: first byte selects the digit, second byte carries the segments.
//! The display task multiplexes continuously; the control loop only hands it
//! the logical state through an embassy-sync [`Signal`].
//!
//! The core never formats text — [`state_text`] is this adapter's own
//! mapping from process state to a 4-character label.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use log::warn;

use crate::app::ports::DisplaySink;
use crate::error::PinError;
use crate::fsm::StateId;
use crate::io::pin::LogicalPin;

/// Segment codes for the digits 0–F.
const SEG8: [u8; 16] = [
    0x5F, 0x42, 0x9B, 0xD3, 0xC6, 0xD5, 0xDD, 0x43, 0xDF, 0xD7, 0xCF, 0xDC, 0x1D, 0xDA, 0x9D, 0x8D,
];

/// Digit-select patterns (1st .. 4th digit).
const DIGIT_SELECT: [u8; 4] = [0xFE, 0xFD, 0xFB, 0xF7];

/// Multiplex refresh period.
const REFRESH_MS: u64 = 2;

/// 4-character label shown for each process state.
pub fn state_text(state: StateId) -> &'static str {
    match state {
        StateId::Init => "INIT",
        StateId::Idle => " IDL",
        StateId::Error => "ERR ",
        StateId::FastDown => "FDWN",
        StateId::MoveUp => " UP ",
        StateId::PressFull => "FULL",
        _ => "    ",
    }
}

/// Segment pattern for one character.  Unmapped characters render blank.
fn glyph(c: char) -> u8 {
    match c {
        ' ' => 0x00,
        '0'..='9' => SEG8[c as usize - '0' as usize],
        'I' => 0x06,
        'N' => 0x76,
        'T' => 0x71,
        'D' => 0x5E,
        'L' => 0x38,
        'E' => 0x79,
        'R' => 0x5E,
        'F' => 0x71,
        'U' => 0x3F,
        'P' => 0x73,
        _ => 0x00,
    }
}

// ───────────────────────────────────────────────────────────────
// Shift-register driver
// ───────────────────────────────────────────────────────────────

/// Bit-banged dual-74HC595 driver.
pub struct SevenSegDisplay {
    data: LogicalPin,
    clock: LogicalPin,
    latch: LogicalPin,
}

impl SevenSegDisplay {
    pub fn new(data: LogicalPin, clock: LogicalPin, latch: LogicalPin) -> Result<Self, PinError> {
        latch.set_value(true)?;
        clock.set_value(true)?;
        data.set_value(true)?;
        Ok(Self { data, clock, latch })
    }

    /// Shift one byte out MSB-first.
    fn send_byte(&self, mut byte: u8) -> Result<(), PinError> {
        for _ in 0..8 {
            self.data.set_value(byte & 0x80 != 0)?;
            byte <<= 1;
            self.clock.set_value(false)?;
            self.clock.set_value(true)?;
        }
        Ok(())
    }

    /// Write one digit: select pattern, then segment pattern, then latch.
    fn write_digit(&self, select: u8, segments: u8) -> Result<(), PinError> {
        self.send_byte(select)?;
        self.send_byte(segments)?;
        self.latch.set_value(false)?;
        self.latch.set_value(true)
    }

    /// One multiplex pass over all four digits of `text`.
    pub fn render(&self, text: &str) -> Result<(), PinError> {
        let mut chars = text.chars();
        for select in DIGIT_SELECT {
            let c = chars.next().unwrap_or(' ');
            self.write_digit(select, glyph(c))?;
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Signal bridge and refresh task
// ───────────────────────────────────────────────────────────────

/// Cross-task state notification channel.
pub type DisplaySignal = Signal<CriticalSectionRawMutex, StateId>;

/// [`DisplaySink`] implementation handed to the control loop: each state
/// transition overwrites the signal, the refresh task picks it up at its
/// next pass.
pub struct SignalDisplaySink {
    signal: &'static DisplaySignal,
}

impl SignalDisplaySink {
    pub fn new(signal: &'static DisplaySignal) -> Self {
        Self { signal }
    }
}

impl DisplaySink for SignalDisplaySink {
    fn notify(&mut self, state: StateId) {
        self.signal.signal(state);
    }
}

/// Perpetual display refresh task.  Multiplexes the current label and swaps
/// it whenever the control loop signals a transition.
pub async fn display_loop(signal: &'static DisplaySignal, display: SevenSegDisplay) -> ! {
    let mut text = state_text(StateId::Init);
    loop {
        if let Some(state) = signal.try_take() {
            text = state_text(state);
        }
        if let Err(e) = display.render(text) {
            warn!("display: render failed: {}", e);
        }
        Timer::after_millis(REFRESH_MS).await;
    }
}
