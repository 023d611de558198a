//! Thermistor front-end: oversampling, smoothing and rail-fault detection.
//!
//! Each coarse cycle the adapter takes [`OVERSAMPLE_FACTOR`] raw conversions
//! and feeds their sum to [`TemperatureFrontEnd::push`], which returns the
//! snapshot handed to the control core.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`read_raw_sum`] reads the thermistor channel via the
//! oneshot API (initialised by hw_init).
//! On host/test: it reads a static `AtomicU16` set by [`sim_set_raw`].

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use super::calibration::TwoPointCalibration;
use super::{OVERSAMPLE_FACTOR, SensorStatus, TemperatureSnapshot};
use crate::config::{CalibrationParams, MAX_RAW_READING};
use crate::error::SensorFault;

/// Average raw reading at or above which the thermistor is open.
pub const NO_SENSOR_RAW: u16 = MAX_RAW_READING - 8;
/// Average raw reading at or below which the thermistor is shorted.
pub const SHORTED_RAW: u16 = 8;
/// Smoothing shift: each push moves the filter 1/4 of the way.
const FILTER_SHIFT: u32 = 2;

#[cfg(not(target_os = "espidf"))]
static SIM_RAW: AtomicU16 = AtomicU16::new(164);

/// Set the raw reading the host build "converts".
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_raw(raw: u16) {
    SIM_RAW.store(raw, Ordering::Relaxed);
}

/// Sum of `OVERSAMPLE_FACTOR` conversions, or `None` if any failed.
#[cfg(target_os = "espidf")]
pub fn read_raw_sum() -> Option<u16> {
    let mut sum = 0u16;
    for _ in 0..OVERSAMPLE_FACTOR {
        sum = sum.saturating_add(crate::drivers::hw_init::temp_adc_read()?);
    }
    Some(sum)
}

#[cfg(not(target_os = "espidf"))]
pub fn read_raw_sum() -> Option<u16> {
    Some(SIM_RAW.load(Ordering::Relaxed).saturating_mul(OVERSAMPLE_FACTOR))
}

pub struct TemperatureFrontEnd {
    calibration: TwoPointCalibration,
    /// Filter state, `OVERSAMPLE_FACTOR` × raw, scaled by `1 << FILTER_SHIFT`.
    acc: u32,
    primed: bool,
}

impl TemperatureFrontEnd {
    pub fn new(calibration: &CalibrationParams) -> Self {
        Self {
            calibration: TwoPointCalibration::from_params(calibration),
            acc: 0,
            primed: false,
        }
    }

    /// Swap in a new calibration after the calibration procedure.
    pub fn set_calibration(&mut self, calibration: &CalibrationParams) {
        self.calibration = TwoPointCalibration::from_params(calibration);
    }

    /// Feed one oversampled sum.  `None` means the conversion failed and is
    /// reported as a missing sensor.
    pub fn push(&mut self, raw_sum: Option<u16>) -> TemperatureSnapshot {
        let Some(sum) = raw_sum else {
            return self.snapshot(SensorStatus::from_faults(&[SensorFault::NoSensor]));
        };
        let sample = u32::from(sum) << FILTER_SHIFT;
        if self.primed {
            self.acc = self.acc - (self.acc >> FILTER_SHIFT) + (sample >> FILTER_SHIFT);
        } else {
            self.acc = sample;
            self.primed = true;
        }

        let average = sum / OVERSAMPLE_FACTOR;
        let status = if average >= NO_SENSOR_RAW {
            SensorStatus::from_faults(&[SensorFault::NoSensor])
        } else if average <= SHORTED_RAW {
            SensorStatus::from_faults(&[SensorFault::Shorted])
        } else {
            SensorStatus::OK
        };
        self.snapshot(status)
    }

    fn snapshot(&self, status: SensorStatus) -> TemperatureSnapshot {
        let filtered = (self.acc >> FILTER_SHIFT).min(u32::from(u16::MAX)) as u16;
        TemperatureSnapshot {
            filtered,
            celsius: self.calibration.raw_to_celsius(filtered / OVERSAMPLE_FACTOR),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe() -> TemperatureFrontEnd {
        TemperatureFrontEnd::new(&CalibrationParams::default())
    }

    #[test]
    fn first_sample_primes_the_filter() {
        let mut fe = fe();
        let snap = fe.push(Some(433 * OVERSAMPLE_FACTOR));
        assert_eq!(snap.filtered, 433 * OVERSAMPLE_FACTOR);
        assert_eq!(snap.celsius, 145);
        assert!(!snap.status.is_error());
    }

    #[test]
    fn filter_converges_on_step() {
        let mut fe = fe();
        fe.push(Some(164 * OVERSAMPLE_FACTOR));
        let first = fe.push(Some(433 * OVERSAMPLE_FACTOR));
        assert!(first.filtered > 164 * OVERSAMPLE_FACTOR);
        assert!(first.filtered < 433 * OVERSAMPLE_FACTOR);
        let mut last = first;
        for _ in 0..60 {
            last = fe.push(Some(433 * OVERSAMPLE_FACTOR));
        }
        assert!(last.celsius >= 144);
    }

    #[test]
    fn rails_report_faults() {
        let mut fe = fe();
        let open = fe.push(Some(MAX_RAW_READING * OVERSAMPLE_FACTOR));
        assert!(open.status.has(SensorFault::NoSensor));
        let short = fe.push(Some(0));
        assert!(short.status.has(SensorFault::Shorted));
        let failed = fe.push(None);
        assert!(failed.status.has(SensorFault::NoSensor));
    }
}
