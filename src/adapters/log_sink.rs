//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to the
//! ESP-IDF logger (which goes to UART / USB-CDC in production).  The web
//! event-stream adapter implements the same trait on the server side.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state.name());
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::FaultDetected(flags) => {
                warn!("FAULT | detected, flags=0b{:08b}", flags);
            }
            AppEvent::FaultCleared => {
                info!("FAULT | all cleared");
            }
            AppEvent::CycleCompleted(count) => {
                info!("CYCLE | completed, total={}", count);
            }
            AppEvent::DiagnosticRaised(code) => {
                warn!("DIAG  | {}", code);
            }
        }
    }
}
