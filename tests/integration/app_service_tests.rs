//! Integration tests for the AppService → control components → actuators
//! pipeline.
//!
//! These run on the host (x86_64) and drive whole coarse cycles through
//! mock ports, checking what reaches the actuators, the event sink and the
//! sound mailbox.

use laminator::adapters::eeprom::EepromImage;
use laminator::app::commands::{AppCommand, CalibrationSlot};
use laminator::app::events::AppEvent;
use laminator::app::ports::ConfigError;
use laminator::app::service::AppService;
use laminator::config::{CalibrationParams, MAX_SET_TEMP, OperatingParams};
use laminator::control::alerts::Alert;
use laminator::control::context::{ButtonSet, Direction, LedSet};
use laminator::control::heater::HeaterMode;
use laminator::drivers::melodies;
use laminator::drivers::sound::{SoundCommand, SoundHandoff};
use laminator::error::SensorFault;
use laminator::safety::SafetyTransition;
use laminator::scheduler::TEN_SECONDS_PERIOD;
use laminator::storage::{DefaultsUsed, LoadedParams, ParamStore};

use super::mock_hw::{MockHardware, RecordingSink, leak_handoff};

/// Cycles per minute of scheduler time.
const ONE_MINUTE: u32 = TEN_SECONDS_PERIOD as u32 * 6;

struct Rig {
    app: AppService,
    hw: MockHardware,
    sink: RecordingSink,
    store: ParamStore<EepromImage>,
    sound: &'static SoundHandoff,
}

impl Rig {
    fn new() -> Self {
        Self::with_params(OperatingParams::default())
    }

    fn with_params(operating: OperatingParams) -> Self {
        let loaded = LoadedParams {
            operating,
            calibration: CalibrationParams::default(),
            defaults_used: DefaultsUsed::NONE,
        };
        let sound = leak_handoff();
        let mut rig = Self {
            app: AppService::new(loaded, sound),
            hw: MockHardware::new(),
            sink: RecordingSink::new(),
            store: ParamStore::new(EepromImage::erased()),
            sound,
        };
        rig.app.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    fn tick(&mut self) {
        self.app.tick(&mut self.hw, &mut self.sink);
    }

    fn ticks(&mut self, n: u32) {
        for _ in 0..n {
            self.tick();
        }
    }

    fn command(&mut self, cmd: AppCommand) {
        self.app.handle_command(cmd, &mut self.store, &mut self.sink);
    }
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_starts_roller_and_beeps() {
    let rig = Rig::new();
    assert_eq!(rig.hw.motor(), Direction::Forward);
    assert!(rig.hw.leds().contains(LedSet::FORWARD));
    assert_eq!(rig.hw.heater_duty(), 0);
    assert_eq!(rig.sink.events, vec![AppEvent::Started(DefaultsUsed::NONE)]);
    assert_eq!(rig.sound.take(), Some(SoundCommand::Play(melodies::BOOT)));
}

#[test]
fn first_cycle_emits_telemetry() {
    let mut rig = Rig::new();
    rig.tick();
    let telemetry = rig.sink.events.iter().find_map(|e| match e {
        AppEvent::Telemetry(t) => Some(*t),
        _ => None,
    });
    let t = telemetry.expect("telemetry on first cycle");
    assert_eq!(t.celsius, 25);
    assert_eq!(t.setpoint_c, 50);
    assert_eq!(t.motor, Direction::Forward);
    assert_eq!(t.heater_mode, HeaterMode::Disabled);
}

// ── Heater ────────────────────────────────────────────────────

#[test]
fn heat_button_toggles_heater_immediately() {
    let mut rig = Rig::new();
    rig.hw.press(ButtonSet::HEAT);
    rig.tick();
    assert_eq!(rig.app.heater().mode(), HeaterMode::Enabled);
    assert_eq!(rig.hw.heater_duty(), 100, "cold start drives full power");
    assert!(rig.hw.leds().contains(LedSet::HEATER));
    assert_eq!(rig.sound.take(), Some(SoundCommand::Play(melodies::KEY_PRESS)));

    rig.hw.press(ButtonSet::HEAT);
    rig.tick();
    assert_eq!(rig.app.heater().mode(), HeaterMode::Disabled);
    assert_eq!(rig.hw.heater_duty(), 0);
    assert!(!rig.hw.leds().contains(LedSet::HEATER));
}

#[test]
fn heater_output_falls_as_temperature_reaches_setpoint() {
    let mut rig = Rig::new();
    rig.hw.press(ButtonSet::HEAT);
    rig.tick();
    rig.hw.set_celsius(60);
    rig.ticks(40);
    assert_eq!(rig.hw.heater_duty(), 0, "above setpoint the duty drops to zero");
}

#[test]
fn max_setpoint_runs_unregulated() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetSetpoint(MAX_SET_TEMP + 50));
    assert_eq!(rig.app.params().setpoint_c, MAX_SET_TEMP);
    rig.hw.set_celsius(250);
    rig.hw.press(ButtonSet::HEAT);
    rig.tick();
    assert_eq!(rig.hw.heater_duty(), 100);
}

// ── Sensor faults ─────────────────────────────────────────────

#[test]
fn sensor_fault_forces_heater_off_and_alarms_through_mute() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetSound(false));
    rig.hw.press(ButtonSet::HEAT);
    rig.tick();
    assert_eq!(rig.app.heater().mode(), HeaterMode::Enabled);

    rig.hw.set_fault(Some(SensorFault::NoSensor));
    rig.tick();
    assert_eq!(rig.app.heater().mode(), HeaterMode::Disabled);
    assert_eq!(rig.hw.heater_duty(), 0);
    assert!(rig.sink.events.contains(&AppEvent::SensorFaults(SensorFault::NoSensor.mask())));

    let _ = rig.sound.take();
    rig.ticks(TEN_SECONDS_PERIOD as u32);
    assert_eq!(
        rig.sink.count(|e| *e == AppEvent::Alert(Alert::SensorFault)),
        1
    );
    assert_eq!(
        rig.sound.take(),
        Some(SoundCommand::Play(melodies::SENSOR_FAULT)),
        "alarm bypasses mute"
    );

    // Heater stays off after the fault clears until re-enabled.
    rig.hw.set_fault(None);
    rig.tick();
    assert!(rig.sink.events.contains(&AppEvent::SensorFaults(0)));
    assert_eq!(rig.app.heater().mode(), HeaterMode::Disabled);
}

// ── Roll ──────────────────────────────────────────────────────

#[test]
fn both_direction_buttons_stop_the_roller() {
    let mut rig = Rig::new();
    rig.hw.press(ButtonSet::FORWARD | ButtonSet::REVERSE);
    rig.tick();
    assert_eq!(rig.hw.motor(), Direction::Stopped);
    assert!(!rig.hw.leds().contains(LedSet::FORWARD));
    assert!(!rig.hw.leds().contains(LedSet::REVERSE));
}

#[test]
fn reverse_button_changes_direction_with_feedback() {
    let mut rig = Rig::new();
    let _ = rig.sound.take();
    rig.hw.press(ButtonSet::REVERSE);
    rig.tick();
    assert_eq!(rig.hw.motor(), Direction::Reverse);
    assert!(rig.hw.leds().contains(LedSet::REVERSE));
    assert_eq!(rig.sound.take(), Some(SoundCommand::Play(melodies::ROLL_ACTION)));
}

#[test]
fn cycle_without_endpoints_is_refused() {
    let mut rig = Rig::new();
    rig.tick();
    let _ = rig.sound.take();
    rig.hw.short_release(ButtonSet::CYCLE);
    rig.tick();
    assert!(!rig.app.roll().cycle_active());
    assert_eq!(rig.hw.motor(), Direction::Forward, "no state change");
    assert_eq!(
        rig.sound.take(),
        Some(SoundCommand::Play(melodies::ROLL_START_FAILED))
    );
}

#[test]
fn cycle_rolling_reverses_and_completes() {
    let mut rig = Rig::with_params(OperatingParams {
        roll_cycles: 1,
        ..OperatingParams::default()
    });
    // Learn a span of 30 cycles of forward travel.
    rig.ticks(30);
    rig.hw.short_release(ButtonSet::CYCLE);
    rig.tick();
    assert!(rig.app.roll().cycle_active());

    let mut reversed = false;
    for _ in 0..200 {
        rig.tick();
        if rig.hw.motor() == Direction::Reverse {
            reversed = true;
        }
        if !rig.app.roll().cycle_active() {
            break;
        }
    }
    assert!(reversed, "cycle must reverse at the far endpoint");
    assert!(!rig.app.roll().cycle_active());
    assert_eq!(rig.hw.motor(), Direction::Stopped);
    assert_eq!(
        rig.sound.take(),
        Some(SoundCommand::Play(melodies::ROLL_CYCLE_DONE))
    );
}

// ── Auto-power-off ────────────────────────────────────────────

#[test]
fn auto_power_off_stops_cool_rollers_and_resumes_on_input() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetPowerOffTimeout(2));
    rig.hw.press(ButtonSet::HEAT);
    rig.tick();

    rig.ticks(ONE_MINUTE);
    assert!(rig.sink.events.contains(&AppEvent::PowerOff(SafetyTransition::PowerOffSoon)));
    assert_eq!(rig.sound.take(), Some(SoundCommand::Play(melodies::POWER_OFF_SOON)));

    rig.ticks(ONE_MINUTE);
    assert!(rig.sink.events.contains(&AppEvent::PowerOff(SafetyTransition::PowerOffActivated)));
    assert!(rig.app.context().auto_power_off);
    assert_eq!(rig.app.heater().mode(), HeaterMode::Disabled);
    assert_eq!(rig.hw.heater_duty(), 0);
    assert_eq!(rig.hw.motor(), Direction::Stopped, "25 C rollers stop");
    assert_eq!(rig.app.roll().resume_direction(), Some(Direction::Forward));

    rig.hw.press(ButtonSet::MENU);
    rig.tick();
    assert!(rig.sink.events.contains(&AppEvent::PowerOff(SafetyTransition::PowerOffCancelled)));
    assert!(!rig.app.context().auto_power_off);
    assert_eq!(rig.hw.motor(), Direction::Forward, "resume applied once");
    assert_eq!(rig.app.roll().resume_direction(), None);
    assert_eq!(rig.app.heater().mode(), HeaterMode::Disabled, "heater stays off");
    assert_eq!(
        rig.sound.take(),
        Some(SoundCommand::Play(melodies::KEY_PRESS)),
        "waking key still beeps"
    );
}

#[test]
fn muted_cancel_silences_warning() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetSound(false));
    rig.command(AppCommand::SetPowerOffTimeout(1));
    let _ = rig.sound.take();
    rig.ticks(ONE_MINUTE);
    assert!(rig.app.context().auto_power_off);

    rig.hw.press(ButtonSet::MENU);
    rig.tick();
    assert!(!rig.app.context().auto_power_off);
    assert_eq!(rig.sound.take(), Some(SoundCommand::Stop));
}

#[test]
fn auto_power_off_keeps_hot_rollers_turning() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetPowerOffTimeout(1));
    rig.hw.set_celsius(120);
    rig.hw.press(ButtonSet::FORWARD | ButtonSet::REVERSE);
    rig.tick();
    assert_eq!(rig.hw.motor(), Direction::Stopped);

    rig.ticks(ONE_MINUTE);
    assert!(rig.app.context().auto_power_off);
    assert_eq!(rig.hw.motor(), Direction::Forward, "hot stopped rollers restart");
}

#[test]
fn button_activity_postpones_auto_power_off() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetPowerOffTimeout(2));
    rig.ticks(2 * ONE_MINUTE - 10);
    rig.hw.press(ButtonSet::MENU);
    rig.ticks(20);
    assert!(!rig.app.context().auto_power_off);
    assert_eq!(
        rig.sink.count(|e| *e == AppEvent::PowerOff(SafetyTransition::PowerOffSoon)),
        2,
        "the restarted interval warns again"
    );
}

// ── Alerts ────────────────────────────────────────────────────

#[test]
fn reaching_setpoint_alerts_once() {
    let mut rig = Rig::new();
    rig.hw.press(ButtonSet::HEAT);
    rig.tick();
    rig.hw.set_celsius(49);
    rig.ticks(50);
    assert_eq!(
        rig.sink.count(|e| *e == AppEvent::Alert(Alert::TemperatureReached)),
        1
    );
}

#[test]
fn rising_temperature_with_heater_off_raises_anomaly() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetSound(false));
    rig.hw.set_celsius(30);
    rig.ticks(TEN_SECONDS_PERIOD as u32);
    rig.hw.set_celsius(45);
    rig.ticks(TEN_SECONDS_PERIOD as u32);
    assert!(rig.sink.events.contains(&AppEvent::Alert(Alert::ThermalAnomaly)));
    assert_eq!(
        rig.sound.take(),
        Some(SoundCommand::Play(melodies::THERMAL_ANOMALY))
    );
}

// ── Commands and persistence ──────────────────────────────────

#[test]
fn save_params_persists_live_values() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetSetpoint(135));
    rig.command(AppCommand::SetRollCycles(0));
    rig.command(AppCommand::SetPowerOffTimeout(250));
    rig.command(AppCommand::SaveParams);
    assert!(rig.sink.events.contains(&AppEvent::ParamsSaved));

    let loaded = rig.store.load().unwrap();
    assert_eq!(loaded.operating.setpoint_c, 135);
    assert_eq!(loaded.operating.roll_cycles, 1, "clamped to the minimum");
    assert_eq!(loaded.operating.power_off_timeout_min, 120);
    assert!(!loaded.defaults_used.contains(DefaultsUsed::OPERATING));
}

#[test]
fn calibration_procedure_stores_and_applies_points() {
    let mut rig = Rig::new();
    rig.command(AppCommand::BeginCalibration);
    assert!(rig.app.context().calibrating);

    rig.hw.set_raw(180);
    rig.tick();
    rig.command(AppCommand::SetCalibrationPoint {
        slot: CalibrationSlot::Low,
        celsius: 30,
    });
    rig.hw.set_raw(470);
    rig.tick();
    rig.command(AppCommand::SetCalibrationPoint {
        slot: CalibrationSlot::High,
        celsius: 160,
    });
    rig.command(AppCommand::EndCalibration);

    assert!(!rig.app.context().calibrating);
    assert!(rig.sink.events.contains(&AppEvent::CalibrationApplied));
    let cal = *rig.app.calibration();
    assert_eq!((cal.low.celsius, cal.low.raw), (30, 180));
    assert_eq!((cal.high.celsius, cal.high.raw), (160, 470));
    assert_eq!(rig.app.context().calibration.raw_to_celsius(470), 160);

    let loaded = rig.store.load().unwrap();
    assert_eq!(loaded.calibration, cal);
}

#[test]
fn degenerate_calibration_is_rejected() {
    let mut rig = Rig::new();
    rig.command(AppCommand::BeginCalibration);
    rig.hw.set_raw(300);
    rig.tick();
    rig.command(AppCommand::SetCalibrationPoint {
        slot: CalibrationSlot::Low,
        celsius: 30,
    });
    rig.command(AppCommand::SetCalibrationPoint {
        slot: CalibrationSlot::High,
        celsius: 160,
    });
    rig.command(AppCommand::EndCalibration);

    assert!(rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::SaveFailed(ConfigError::ValidationFailed(_)))));
    assert_eq!(*rig.app.calibration(), CalibrationParams::default());
}
