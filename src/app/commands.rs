//! Inbound commands to the application service.
//!
//! These are issued by the menu collaborator (front-panel navigation) and
//! interpreted by the [`AppService`](super::service::AppService).  Values
//! outside their documented range are clamped into it, never rejected.

/// Which calibration reference a [`AppCommand::SetCalibrationPoint`] sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationSlot {
    Low,
    High,
}

/// Commands that the menu can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Change the heater setpoint (°C).
    SetSetpoint(u16),

    /// Change the number of passes in cycle rolling.
    SetRollCycles(u8),

    /// Enable or mute non-safety sounds.
    SetSound(bool),

    /// Auto-power-off timeout in minutes (0 disables).
    SetPowerOffTimeout(u8),

    /// Persist the operating parameters now.
    SaveParams,

    /// Enter the calibration procedure.
    BeginCalibration,

    /// Record the current raw reading as the given reference temperature.
    SetCalibrationPoint { slot: CalibrationSlot, celsius: u16 },

    /// Persist the recorded points and apply them.
    EndCalibration,
}
