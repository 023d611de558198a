//! Laminator firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod power;
pub mod safety;
pub mod scheduler;
pub mod storage;

// ESP-IDF-facing modules; host builds get simulation stubs.
pub mod adapters;
pub mod drivers;
pub mod pins;
pub mod sensors;

// Host tests link the std critical-section implementation for the
// embassy-sync mutexes.
#[cfg(test)]
use critical_section as _;
