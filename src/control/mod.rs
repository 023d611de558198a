//! Control components evaluated once per coarse cycle.
//!
//! Order within a cycle is fixed: [`roll`] → [`heater`] → [`alerts`].  All
//! three read and write the shared [`context::ControlContext`].

pub mod alerts;
pub mod context;
pub mod heater;
pub mod pid;
pub mod roll;
