//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the business rules for the Sol-Mate monitor: pump
//! hysteresis, alert policy, and orchestration of the modem dialog.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
