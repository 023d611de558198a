//! Persisted operating and calibration parameters
//!
//! Both records live in EEPROM (see [`crate::storage`]) and are loaded once
//! at boot.  The menu collaborator mutates [`OperatingParams`] through
//! [`AppCommand`](crate::app::commands::AppCommand)s; the calibration
//! procedure is the only writer of [`CalibrationParams`].

use serde::{Deserialize, Serialize};

// --- Limits ---

/// Lowest selectable setpoint (°C).
pub const MIN_SET_TEMP: u16 = 20;
/// Highest selectable setpoint (°C).  Selecting it runs the heater
/// unregulated at full power (calibration use).
pub const MAX_SET_TEMP: u16 = 200;
/// Longest auto-power-off timeout (minutes).  0 disables the feature.
pub const MAX_POWEROFF_TIMEOUT: u8 = 120;
/// Largest roll-cycle count the menu can select.
pub const MAX_ROLL_CYCLES: u8 = 99;
/// Highest raw ADC reading the sensor front-end can produce.
pub const MAX_RAW_READING: u16 = 1023;

/// User-facing operating parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingParams {
    /// Heater setpoint (°C), `MIN_SET_TEMP..=MAX_SET_TEMP`.
    pub setpoint_c: u16,
    /// Number of back-and-forth passes in cycle rolling mode.
    pub roll_cycles: u8,
    /// Audible feedback enabled.  Safety alarms ignore this.
    pub sound_enabled: bool,
    /// Auto-power-off timeout in minutes, 0 = disabled.
    pub power_off_timeout_min: u8,
}

impl Default for OperatingParams {
    fn default() -> Self {
        Self {
            setpoint_c: 50,
            roll_cycles: 10,
            sound_enabled: true,
            power_off_timeout_min: 30,
        }
    }
}

impl OperatingParams {
    /// Range-check every field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(MIN_SET_TEMP..=MAX_SET_TEMP).contains(&self.setpoint_c) {
            return Err("setpoint_c out of range");
        }
        if !(1..=MAX_ROLL_CYCLES).contains(&self.roll_cycles) {
            return Err("roll_cycles must be 1..=MAX_ROLL_CYCLES");
        }
        if self.power_off_timeout_min > MAX_POWEROFF_TIMEOUT {
            return Err("power_off_timeout_min exceeds MAX_POWEROFF_TIMEOUT");
        }
        Ok(())
    }
}

/// One calibration reference: a Celsius temperature and the raw sensor
/// reading observed at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub celsius: u16,
    pub raw: u16,
}

/// Two-point sensor calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationParams {
    pub low: CalibrationPoint,
    pub high: CalibrationPoint,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            low: CalibrationPoint {
                celsius: 25,
                raw: 164,
            },
            high: CalibrationPoint {
                celsius: 145,
                raw: 433,
            },
        }
    }
}

impl CalibrationParams {
    /// Both points must be distinct and ordered, otherwise the linear
    /// mapping degenerates.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.high.celsius <= self.low.celsius {
            return Err("calibration points must be ordered by temperature");
        }
        if self.high.raw <= self.low.raw {
            return Err("calibration raw readings must increase with temperature");
        }
        if self.high.raw > MAX_RAW_READING {
            return Err("calibration raw reading exceeds ADC range");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(OperatingParams::default().validate().is_ok());
        assert!(CalibrationParams::default().validate().is_ok());
    }

    #[test]
    fn setpoint_bounds_enforced() {
        let mut p = OperatingParams::default();
        p.setpoint_c = MIN_SET_TEMP - 1;
        assert!(p.validate().is_err());
        p.setpoint_c = MAX_SET_TEMP;
        assert!(p.validate().is_ok());
        p.setpoint_c = MAX_SET_TEMP + 1;
        assert!(p.validate().is_err());
    }

    #[test]
    fn zero_timeout_means_disabled_and_is_valid() {
        let p = OperatingParams {
            power_off_timeout_min: 0,
            ..OperatingParams::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn swapped_calibration_points_rejected() {
        let d = CalibrationParams::default();
        let swapped = CalibrationParams {
            low: d.high,
            high: d.low,
        };
        assert!(swapped.validate().is_err());
    }

    #[test]
    fn postcard_roundtrip() {
        let p = OperatingParams::default();
        let mut buf = [0u8; 16];
        let used = postcard::to_slice(&p, &mut buf).unwrap();
        let p2: OperatingParams = postcard::from_bytes(used).unwrap();
        assert_eq!(p, p2);
    }
}
