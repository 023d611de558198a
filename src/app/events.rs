//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  The log adapter prints
//! them; tests record them.

use crate::app::ports::ConfigError;
use crate::control::alerts::Alert;
use crate::control::context::Direction;
use crate::control::heater::HeaterMode;
use crate::control::pid::PidTerms;
use crate::safety::SafetyTransition;
use crate::storage::DefaultsUsed;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Boot finished.  Carries which parameter blocks were reset.
    Started(DefaultsUsed),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// Sensor fault bitmask changed (0 = healthy).
    SensorFaults(u8),

    /// Auto-power-off warning, activation or cancellation.
    PowerOff(SafetyTransition),

    /// An alert fired.
    Alert(Alert),

    /// Operating parameters were written to EEPROM.
    ParamsSaved,

    /// New calibration points were stored and applied.
    CalibrationApplied,

    /// A save was refused or failed.
    SaveFailed(ConfigError),
}

/// A point-in-time telemetry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryData {
    pub filtered: u16,
    pub celsius: i16,
    pub setpoint_c: u16,
    pub heater_mode: HeaterMode,
    pub heater_duty: u8,
    pub pid: PidTerms,
    pub motor: Direction,
    pub cycle_active: bool,
    pub auto_power_off: bool,
    pub sensor_faults: u8,
}
