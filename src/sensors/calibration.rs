//! Two-point linear calibration between Celsius and raw ADC readings.
//!
//! Both directions interpolate between the stored points and extrapolate
//! beyond them.  Integer arithmetic rounds to nearest.

use crate::config::CalibrationParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoPointCalibration {
    c1: i32,
    r1: i32,
    dc: i32,
    dr: i32,
}

impl TwoPointCalibration {
    /// Derive the mapping.  Callers validate the params first; a
    /// degenerate pair falls back to a unit slope instead of dividing by zero.
    pub fn from_params(params: &CalibrationParams) -> Self {
        let c1 = i32::from(params.low.celsius);
        let r1 = i32::from(params.low.raw);
        let dc = i32::from(params.high.celsius) - c1;
        let dr = i32::from(params.high.raw) - r1;
        if dc == 0 || dr == 0 {
            return Self { c1, r1, dc: 1, dr: 1 };
        }
        Self { c1, r1, dc, dr }
    }

    /// Raw reading expected at `celsius`, saturated to `u16`.
    pub fn celsius_to_raw(&self, celsius: i32) -> u16 {
        let raw = self.r1 + div_round((celsius - self.c1) * self.dr, self.dc);
        raw.clamp(0, i32::from(u16::MAX)) as u16
    }

    /// Temperature (°C) corresponding to a raw reading.
    pub fn raw_to_celsius(&self, raw: u16) -> i16 {
        let c = self.c1 + div_round((i32::from(raw) - self.r1) * self.dc, self.dr);
        c.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
    }
}

/// Integer division rounding half away from zero.
fn div_round(num: i32, den: i32) -> i32 {
    let q = num / den;
    let r = num % den;
    if 2 * r.abs() >= den.abs() {
        if (num < 0) == (den < 0) { q + 1 } else { q - 1 }
    } else {
        q
    }
}
