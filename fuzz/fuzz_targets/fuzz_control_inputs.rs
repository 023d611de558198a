//! Fuzz target: coarse-cycle control under arbitrary inputs
//!
//! Each input byte drives one coarse cycle: the low five bits are the
//! buttons pressed, the high bits pick a temperature and a sensor fault.
//! Verifies after every cycle:
//! - Heater duty stays within 0..=100 and is 0 while the heater is off
//! - Forward and reverse commanded together leave the motor stopped
//! - A sensor fault never leaves the heater enabled
//!
//! cargo fuzz run fuzz_control_inputs

#![no_main]

use critical_section as _;
use laminator::app::ports::{ActuatorPort, ButtonPort, EventSink, SensorPort};
use laminator::app::events::AppEvent;
use laminator::app::service::AppService;
use laminator::control::context::{ButtonEdges, ButtonSet, Direction, LedSet};
use laminator::control::heater::HeaterMode;
use laminator::drivers::sound::SoundHandoff;
use laminator::error::SensorFault;
use laminator::sensors::{OVERSAMPLE_FACTOR, SensorStatus, TemperatureSnapshot};
use laminator::storage::LoadedParams;
use libfuzzer_sys::fuzz_target;

static SOUND: SoundHandoff = SoundHandoff::new();

#[derive(Default)]
struct Rig {
    edges: ButtonEdges,
    snapshot: TemperatureSnapshot,
    motor: Direction,
    duty: u8,
}

impl SensorPort for Rig {
    fn read_temperature(&mut self) -> TemperatureSnapshot {
        self.snapshot
    }
}

impl ButtonPort for Rig {
    fn poll(&mut self) -> ButtonEdges {
        self.edges
    }
}

impl ActuatorPort for Rig {
    fn set_motor(&mut self, direction: Direction) {
        self.motor = direction;
    }
    fn set_heater_duty(&mut self, duty: u8) {
        self.duty = duty;
    }
    fn set_leds(&mut self, _leds: LedSet) {}
    fn all_off(&mut self) {
        self.motor = Direction::Stopped;
        self.duty = 0;
    }
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fn buttons(bits: u8) -> ButtonSet {
    let mut set = ButtonSet::NONE;
    for (i, b) in ButtonSet::ALL.iter().enumerate() {
        if bits & (1 << i) != 0 {
            set.insert(*b);
        }
    }
    set
}

fuzz_target!(|data: &[u8]| {
    let mut app = AppService::new(LoadedParams::defaults(), &SOUND);
    let mut rig = Rig::default();
    let mut sink = NullSink;
    app.start(&mut rig, &mut sink);

    for &byte in data {
        let pressed = buttons(byte);
        rig.edges = ButtonEdges {
            pressed,
            held: pressed,
            ..ButtonEdges::default()
        };
        let raw = 100 + u16::from(byte >> 5) * 60;
        let fault = match byte >> 5 {
            0 => Some(SensorFault::Shorted),
            7 => Some(SensorFault::NoSensor),
            _ => None,
        };
        rig.snapshot = TemperatureSnapshot {
            filtered: raw * OVERSAMPLE_FACTOR,
            celsius: app.context().calibration.raw_to_celsius(raw),
            status: fault.map_or(SensorStatus::OK, |f| SensorStatus::from_faults(&[f])),
        };

        app.tick(&mut rig, &mut sink);

        assert!(rig.duty <= 100);
        if app.heater().mode() == HeaterMode::Disabled {
            assert_eq!(rig.duty, 0);
        }
        if pressed.contains(ButtonSet::FORWARD | ButtonSet::REVERSE) {
            assert_eq!(rig.motor, Direction::Stopped);
        }
        if fault.is_some() {
            assert_eq!(app.heater().mode(), HeaterMode::Disabled);
        }
        let _ = SOUND.take();
    }
});
