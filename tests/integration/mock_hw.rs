//! Mock hardware adapter for integration tests.
//!
//! Plays back scripted button edges and a settable temperature, and
//! records every actuator call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.

use std::collections::VecDeque;

use laminator::adapters::eeprom::EepromImage;
use laminator::app::events::AppEvent;
use laminator::app::ports::{
    ActuatorPort, ButtonPort, EventSink, SensorPort, StorageError, StoragePort,
};
use laminator::config::CalibrationParams;
use laminator::control::context::{ButtonEdges, ButtonSet, Direction, LedSet};
use laminator::drivers::sound::SoundHandoff;
use laminator::error::SensorFault;
use laminator::sensors::calibration::TwoPointCalibration;
use laminator::sensors::{OVERSAMPLE_FACTOR, SensorStatus, TemperatureSnapshot};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    SetMotor(Direction),
    SetHeaterDuty(u8),
    SetLeds(LedSet),
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub snapshot: TemperatureSnapshot,
    pub buttons: VecDeque<ButtonEdges>,
    calibration: TwoPointCalibration,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        let mut hw = Self {
            calls: Vec::new(),
            snapshot: TemperatureSnapshot::default(),
            buttons: VecDeque::new(),
            calibration: TwoPointCalibration::from_params(&CalibrationParams::default()),
        };
        hw.set_celsius(25);
        hw
    }

    /// Present a healthy reading at `celsius` under the default calibration.
    pub fn set_celsius(&mut self, celsius: i16) {
        let raw = self.calibration.celsius_to_raw(i32::from(celsius));
        self.snapshot = TemperatureSnapshot {
            filtered: raw * OVERSAMPLE_FACTOR,
            celsius,
            status: SensorStatus::OK,
        };
    }

    /// Present a raw reading (for calibration tests).
    pub fn set_raw(&mut self, raw: u16) {
        self.snapshot.filtered = raw * OVERSAMPLE_FACTOR;
        self.snapshot.celsius = self.calibration.raw_to_celsius(raw);
    }

    pub fn set_fault(&mut self, fault: Option<SensorFault>) {
        self.snapshot.status = match fault {
            Some(f) => SensorStatus::from_faults(&[f]),
            None => SensorStatus::OK,
        };
    }

    /// Queue button edges for the next poll.
    pub fn push_buttons(&mut self, edges: ButtonEdges) {
        self.buttons.push_back(edges);
    }

    pub fn press(&mut self, buttons: ButtonSet) {
        self.push_buttons(ButtonEdges {
            pressed: buttons,
            held: buttons,
            ..ButtonEdges::default()
        });
    }

    pub fn short_release(&mut self, buttons: ButtonSet) {
        self.push_buttons(ButtonEdges {
            released_short: buttons,
            ..ButtonEdges::default()
        });
    }

    pub fn motor(&self) -> Direction {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetMotor(d) => Some(*d),
                ActuatorCall::AllOff => Some(Direction::Stopped),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn heater_duty(&self) -> u8 {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetHeaterDuty(d) => Some(*d),
                ActuatorCall::AllOff => Some(0),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn leds(&self) -> LedSet {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetLeds(l) => Some(*l),
                ActuatorCall::AllOff => Some(LedSet::NONE),
                _ => None,
            })
            .unwrap_or_default()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_temperature(&mut self) -> TemperatureSnapshot {
        self.snapshot
    }
}

impl ButtonPort for MockHardware {
    fn poll(&mut self) -> ButtonEdges {
        self.buttons.pop_front().unwrap_or_default()
    }
}

impl ActuatorPort for MockHardware {
    fn set_motor(&mut self, direction: Direction) {
        self.calls.push(ActuatorCall::SetMotor(direction));
    }

    fn set_heater_duty(&mut self, duty: u8) {
        self.calls.push(ActuatorCall::SetHeaterDuty(duty));
    }

    fn set_leds(&mut self, leds: LedSet) {
        self.calls.push(ActuatorCall::SetLeds(leds));
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── Storage doubles ───────────────────────────────────────────

/// EEPROM image that counts written bytes.
#[derive(Default)]
pub struct CountingEeprom {
    pub image: EepromImage,
    pub bytes_written: usize,
}

impl StoragePort for CountingEeprom {
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        self.image.read(addr, buf)
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        self.bytes_written += data.len();
        self.image.write(addr, data)
    }
}

/// A device that fails every access.
pub struct DeadEeprom;

impl StoragePort for DeadEeprom {
    fn read(&self, _addr: usize, _buf: &mut [u8]) -> Result<(), StorageError> {
        Err(StorageError::IoError)
    }

    fn write(&mut self, _addr: usize, _data: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::IoError)
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

/// A fresh sound mailbox per test.
pub fn leak_handoff() -> &'static SoundHandoff {
    Box::leak(Box::new(SoundHandoff::new()))
}
