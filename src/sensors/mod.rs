//! Temperature sensing boundary.
//!
//! The [`frontend`] oversamples the thermistor ADC and hands the control
//! core a [`TemperatureSnapshot`] each coarse cycle through
//! [`SensorPort`](crate::app::ports::SensorPort).  This module owns the
//! shared vocabulary for that hand-off and the two-point calibration
//! mapping derived from [`CalibrationParams`](crate::config::CalibrationParams).

pub mod calibration;
pub mod frontend;

use crate::error::SensorFault;

/// The filtered reading is the sum of this many raw conversions.
pub const OVERSAMPLE_FACTOR: u16 = 5;

/// Sensor health bitset built from [`SensorFault`] masks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorStatus(u8);

impl SensorStatus {
    pub const OK: Self = Self(0);

    pub fn from_faults(faults: &[SensorFault]) -> Self {
        Self(faults.iter().fold(0, |acc, f| acc | f.mask()))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn has(self, fault: SensorFault) -> bool {
        self.0 & fault.mask() != 0
    }

    /// True if any fault is reported.
    pub fn is_error(self) -> bool {
        self.0 != 0
    }
}

/// One coarse cycle's worth of temperature data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemperatureSnapshot {
    /// Oversampled, filtered reading (`OVERSAMPLE_FACTOR` × raw).
    pub filtered: u16,
    /// Calibrated temperature (°C).
    pub celsius: i16,
    /// Sensor health.
    pub status: SensorStatus,
}
