//! Application core: pure domain logic, zero I/O.
//!
//! This module wires the laminator's control components into one coarse
//! cycle: safety evaluation, roll and heater state machines, alerts and
//! parameter commands.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
