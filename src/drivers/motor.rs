//! Roller motor driver (two-input H-bridge).
//!
//! | Direction | IN1 | IN2 |
//! |-----------|-----|-----|
//! | Stopped   | low | low |
//! | Forward   | high| low |
//! | Reverse   | low | high|
//!
//! Both inputs are driven low before the new pair is applied, so the
//! bridge never sees both high during a reversal.

use embedded_hal::digital::OutputPin;

use crate::control::context::Direction;

pub struct MotorDriver<P1, P2> {
    in1: P1,
    in2: P2,
    direction: Direction,
}

impl<P1, P2, E> MotorDriver<P1, P2>
where
    P1: OutputPin<Error = E>,
    P2: OutputPin<Error = E>,
{
    pub fn new(in1: P1, in2: P2) -> Self {
        Self {
            in1,
            in2,
            direction: Direction::Stopped,
        }
    }

    pub fn set(&mut self, direction: Direction) -> Result<(), E> {
        if direction == self.direction {
            return Ok(());
        }
        self.in1.set_low()?;
        self.in2.set_low()?;
        // Record the coast state first so a failed write below is retried.
        self.direction = Direction::Stopped;
        match direction {
            Direction::Stopped => {}
            Direction::Forward => self.in1.set_high()?,
            Direction::Reverse => self.in2.set_high()?,
        }
        self.direction = direction;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), E> {
        self.set(Direction::Stopped)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}
