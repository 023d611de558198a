//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | adc={} T={}\u{00b0}C sp={}\u{00b0}C | heater={:?} {}% \
                     (p={} i={} d={}) | motor={:?}{} | apo={} faults=0b{:02b}",
                    t.filtered,
                    t.celsius,
                    t.setpoint_c,
                    t.heater_mode,
                    t.heater_duty,
                    t.pid.p,
                    t.pid.i,
                    t.pid.d,
                    t.motor,
                    if t.cycle_active { " cycling" } else { "" },
                    t.auto_power_off,
                    t.sensor_faults,
                );
            }
            AppEvent::Started(defaults) => {
                info!("START | defaults_used=0b{:02b}", defaults.bits());
            }
            AppEvent::SensorFaults(0) => {
                info!("FAULT | all cleared");
            }
            AppEvent::SensorFaults(flags) => {
                warn!("FAULT | flags=0b{:02b}", flags);
            }
            AppEvent::PowerOff(transition) => {
                info!("APO | {:?}", transition);
            }
            AppEvent::Alert(alert) => {
                warn!("ALERT | {:?}", alert);
            }
            AppEvent::ParamsSaved => {
                info!("PARAMS | saved");
            }
            AppEvent::CalibrationApplied => {
                info!("PARAMS | calibration applied");
            }
            AppEvent::SaveFailed(e) => {
                warn!("PARAMS | save failed: {}", e);
            }
        }
    }
}
