//! Application core — pure domain logic, zero I/O.
//!
//! The service consumes hardware through port traits and is fully testable
//! with mock adapters; the web/status surface is a thin, serializable view
//! over it.

pub mod events;
pub mod ports;
pub mod service;
pub mod status;
