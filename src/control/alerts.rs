//! Alert engine: setpoint proximity and heating-while-off detection.
//!
//! Runs last in the coarse cycle.  Safety alarms are forced through the
//! user's mute setting; the proximity tone is not.

use log::{error, info, warn};

use super::context::ControlContext;
use crate::drivers::melodies;
use crate::drivers::sound::SoundRequest;
use crate::scheduler::TimerFlags;

/// Half-width (°C) of the "temperature reached" band.
pub const ALERT_RANGE: i32 = 3;
/// Extra half-width while inside the band.
pub const ALERT_HYSTERESIS: i32 = 2;
/// Rise (°C) over the captured reference that counts as heating while off.
pub const SAFE_TEMP_INTERVAL: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    SensorFault,
    TemperatureReached,
    ThermalAnomaly,
}

impl Alert {
    pub fn sound(self) -> SoundRequest {
        match self {
            Self::SensorFault => melodies::SENSOR_FAULT,
            Self::TemperatureReached => melodies::TEMPERATURE_REACHED,
            Self::ThermalAnomaly => melodies::THERMAL_ANOMALY,
        }
    }

    /// Played even when sound is disabled.
    pub fn is_forced(self) -> bool {
        !matches!(self, Self::TemperatureReached)
    }
}

pub struct AlertEngine {
    /// Inside the proximity band (band is widened).
    in_band: bool,
    /// Lowest temperature seen since the heater was last on.
    reference: i32,
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertEngine {
    pub fn new() -> Self {
        Self {
            in_band: false,
            reference: i32::MAX,
        }
    }

    pub fn update(&mut self, ctx: &ControlContext) -> Option<Alert> {
        let ten_seconds = ctx.flags.contains(TimerFlags::TEN_SECONDS);

        if ctx.sensor_error {
            return ten_seconds.then(|| {
                error!("alert: sensor fault");
                Alert::SensorFault
            });
        }

        let celsius = i32::from(ctx.celsius);
        let mut alert = None;

        // ── Proximity ─────────────────────────────────────────────
        let setpoint = i32::from(ctx.params.setpoint_c);
        let range = if self.in_band {
            ALERT_RANGE + ALERT_HYSTERESIS
        } else {
            ALERT_RANGE
        };
        if celsius > setpoint - range && celsius < setpoint + range {
            if !self.in_band && ctx.heater_enabled {
                info!("alert: setpoint {} reached", setpoint);
                alert = Some(Alert::TemperatureReached);
            }
            self.in_band = true;
        } else {
            self.in_band = false;
        }

        // ── Heating while off ─────────────────────────────────────
        if ctx.heater_enabled || ctx.calibrating {
            self.reference = celsius;
        } else if ten_seconds {
            if celsius < self.reference {
                self.reference = celsius;
            } else if celsius >= self.reference.saturating_add(SAFE_TEMP_INTERVAL) {
                warn!(
                    "alert: temperature {} rising with heater off (ref {})",
                    celsius, self.reference
                );
                alert = Some(Alert::ThermalAnomaly);
            }
        }

        alert
    }
}
