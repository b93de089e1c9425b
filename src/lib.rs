//! RoomLogger firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod gateway;
pub mod pins;
pub mod scheduler;
pub mod store;

// Hardware-facing modules compile on the host through cfg-gated
// simulation paths inside each module.
pub mod adapters;
pub mod drivers;
pub mod sensors;
