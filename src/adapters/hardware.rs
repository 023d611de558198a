//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the thermistor front-end, the button debouncer and the actuator
//! drivers, exposing them through [`SensorPort`], [`ButtonPort`] and
//! [`ActuatorPort`].  Driver errors are logged and never reach the domain;
//! the next cycle re-applies the same command.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{ActuatorPort, ButtonPort, SensorPort};
use crate::config::CalibrationParams;
use crate::control::context::{ButtonEdges, ButtonSet, Direction, LedSet};
use crate::drivers::button::ButtonDebouncer;
use crate::drivers::heater::HeaterDriver;
use crate::drivers::hw_init;
use crate::drivers::motor::MotorDriver;
use crate::pins;
use crate::sensors::TemperatureSnapshot;
use crate::sensors::frontend::{self, TemperatureFrontEnd};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<M1, M2, H> {
    frontend: TemperatureFrontEnd,
    buttons: ButtonDebouncer,
    motor: MotorDriver<M1, M2>,
    heater: HeaterDriver<H>,
    leds: LedSet,
}

impl<M1, M2, H, E> HardwareAdapter<M1, M2, H>
where
    M1: OutputPin<Error = E>,
    M2: OutputPin<Error = E>,
    H: SetDutyCycle,
{
    pub fn new(
        calibration: &CalibrationParams,
        motor: MotorDriver<M1, M2>,
        heater: HeaterDriver<H>,
    ) -> Self {
        Self {
            frontend: TemperatureFrontEnd::new(calibration),
            buttons: ButtonDebouncer::new(),
            motor,
            heater,
            leds: LedSet::NONE,
        }
    }

    /// Apply a freshly stored calibration to the Celsius conversion.
    pub fn set_calibration(&mut self, calibration: &CalibrationParams) {
        self.frontend.set_calibration(calibration);
    }

    pub fn motor_direction(&self) -> Direction {
        self.motor.direction()
    }

    pub fn heater_duty(&self) -> u8 {
        self.heater.duty()
    }

    pub fn leds(&self) -> LedSet {
        self.leds
    }

    #[cfg(target_os = "espidf")]
    fn raw_buttons() -> ButtonSet {
        crate::drivers::button::read_raw()
    }

    #[cfg(not(target_os = "espidf"))]
    fn raw_buttons() -> ButtonSet {
        ButtonSet::NONE
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<M1, M2, H, E> SensorPort for HardwareAdapter<M1, M2, H>
where
    M1: OutputPin<Error = E>,
    M2: OutputPin<Error = E>,
    H: SetDutyCycle,
{
    fn read_temperature(&mut self) -> TemperatureSnapshot {
        self.frontend.push(frontend::read_raw_sum())
    }
}

// ── ButtonPort implementation ─────────────────────────────────

impl<M1, M2, H, E> ButtonPort for HardwareAdapter<M1, M2, H>
where
    M1: OutputPin<Error = E>,
    M2: OutputPin<Error = E>,
    H: SetDutyCycle,
{
    fn poll(&mut self) -> ButtonEdges {
        self.buttons.sample(Self::raw_buttons())
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<M1, M2, H, E> ActuatorPort for HardwareAdapter<M1, M2, H>
where
    M1: OutputPin<Error = E>,
    M2: OutputPin<Error = E>,
    E: core::fmt::Debug,
    H: SetDutyCycle,
{
    fn set_motor(&mut self, direction: Direction) {
        if let Err(e) = self.motor.set(direction) {
            warn!("motor: set {:?} failed: {:?}", direction, e);
        }
    }

    fn set_heater_duty(&mut self, duty: u8) {
        if duty == self.heater.duty() {
            return;
        }
        if let Err(e) = self.heater.set_duty(duty) {
            warn!("heater: set duty {}% failed: {:?}", duty, e);
        }
    }

    fn set_leds(&mut self, leds: LedSet) {
        if leds == self.leds {
            return;
        }
        self.leds = leds;
        hw_init::gpio_write(pins::LED_HEATER_GPIO, leds.contains(LedSet::HEATER));
        hw_init::gpio_write(pins::LED_FORWARD_GPIO, leds.contains(LedSet::FORWARD));
        hw_init::gpio_write(pins::LED_REVERSE_GPIO, leds.contains(LedSet::REVERSE));
    }

    fn all_off(&mut self) {
        if let Err(e) = self.heater.off() {
            warn!("heater: off failed: {:?}", e);
        }
        if let Err(e) = self.motor.stop() {
            warn!("motor: stop failed: {:?}", e);
        }
        self.set_leds(LedSet::NONE);
    }
}
