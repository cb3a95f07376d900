//! Sol-Mate bilge monitor firmware library.
//!
//! Exposes the domain core, drivers and adapters for the binary and for
//! integration testing.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module; host builds get
//! simulation stubs.

#![deny(unused_must_use)]

pub mod alert;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod modem;
pub mod phone;
pub mod pins;

pub mod adapters;
pub mod drivers;
pub mod sensors;
