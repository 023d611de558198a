//! Heater power driver.
//!
//! Wraps any embedded-hal PWM channel.  The PWM period should be long
//! relative to the mains half-cycle so a zero-cross solid-state relay sees
//! whole half-waves.

use embedded_hal::pwm::SetDutyCycle;

pub struct HeaterDriver<P> {
    pwm: P,
    duty: u8,
}

impl<P: SetDutyCycle> HeaterDriver<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, duty: 0 }
    }

    /// Set duty in percent (clamped to 100).
    pub fn set_duty(&mut self, percent: u8) -> Result<(), P::Error> {
        let percent = percent.min(100);
        self.pwm.set_duty_cycle_percent(percent)?;
        self.duty = percent;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), P::Error> {
        self.pwm.set_duty_cycle_fully_off()?;
        self.duty = 0;
        Ok(())
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }
}
