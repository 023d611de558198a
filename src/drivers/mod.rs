//! Actuator drivers, the button debouncer, the tone sequencer and the 1 ms
//! tick.

pub mod button;
pub mod heater;
pub mod hw_init;
pub mod hw_timer;
pub mod melodies;
pub mod motor;
pub mod sound;
pub mod watchdog;
