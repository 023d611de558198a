//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the scheduler, the safety supervisor, the three
//! control components and the shared context.  All I/O flows through port
//! traits passed in at call sites, so the whole service is testable with
//! mock adapters.
//!
//! ```text
//!   ButtonPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!   SensorPort ──▶ │          AppService           │
//! ActuatorPort ◀── │ Safety · Roll · Heater · Alert │ ──▶ SoundHandoff
//!                  └──────────────────────────────┘
//! ```
//!
//! One [`tick`](AppService::tick) is one coarse cycle:
//!
//! 1. poll buttons, key feedback, reset the auto-power-off counter
//! 2. advance the scheduler
//! 3. read temperature (Celsius only on Celsius-update cycles)
//! 4. safety: sensor faults, auto-power-off
//! 5. roll → heater → alerts
//! 6. apply actuators, telemetry

use log::{info, warn};

use crate::config::{
    CalibrationParams, MAX_POWEROFF_TIMEOUT, MAX_ROLL_CYCLES, MAX_SET_TEMP, MIN_SET_TEMP,
    OperatingParams,
};
use crate::control::alerts::AlertEngine;
use crate::control::context::{ButtonSet, ControlContext, Direction};
use crate::control::heater::HeaterController;
use crate::control::roll::RollController;
use crate::drivers::melodies;
use crate::drivers::sound::{Beeper, SoundHandoff};
use crate::safety::{SafetySupervisor, SafetyTransition};
use crate::scheduler::{TickScheduler, TimerFlags};
use crate::sensors::OVERSAMPLE_FACTOR;
use crate::sensors::calibration::TwoPointCalibration;
use crate::storage::{DefaultsUsed, LoadedParams, ParamStore};

use super::commands::{AppCommand, CalibrationSlot};
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, ButtonPort, EventSink, SensorPort, StoragePort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    ctx: ControlContext,
    scheduler: TickScheduler,
    safety: SafetySupervisor,
    roll: RollController,
    heater: HeaterController,
    alerts: AlertEngine,
    beeper: Beeper,
    defaults_used: DefaultsUsed,
    /// Calibration currently applied.
    calibration: CalibrationParams,
    /// Points being recorded during the calibration procedure.
    calibration_draft: Option<CalibrationParams>,
    menu_long_latched: bool,
    last_faults: u8,
    cycle_count: u32,
}

impl AppService {
    /// Construct the service from the parameters loaded at boot.
    ///
    /// Does **not** touch hardware.  Call [`start`](Self::start) next.
    pub fn new(loaded: LoadedParams, handoff: &'static SoundHandoff) -> Self {
        Self {
            ctx: ControlContext::new(loaded.operating, &loaded.calibration),
            scheduler: TickScheduler::new(),
            safety: SafetySupervisor::new(),
            roll: RollController::new(),
            heater: HeaterController::new(),
            alerts: AlertEngine::new(),
            beeper: Beeper::new(handoff, loaded.operating.sound_enabled),
            defaults_used: loaded.defaults_used,
            calibration: loaded.calibration,
            calibration_draft: None,
            menu_long_latched: false,
            last_faults: 0,
            cycle_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot sequence: first reading, start beep, PID priming, roller on.
    pub fn start(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        let snap = hw.read_temperature();
        self.ctx.temperature = snap;
        self.ctx.celsius = snap.celsius;
        self.heater.prime(&self.ctx);

        self.beeper.play(melodies::BOOT);
        self.roll.start(Direction::Forward, &mut self.ctx);
        self.apply_actuators(hw);

        if !self.defaults_used.is_empty() {
            warn!(
                "AppService: parameter defaults in use (0b{:02b})",
                self.defaults_used.bits()
            );
        }
        sink.emit(&AppEvent::Started(self.defaults_used));
        info!("AppService started, setpoint {} C", self.ctx.params.setpoint_c);
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one coarse cycle.
    ///
    /// The `hw` parameter satisfies every hardware port at once, avoiding
    /// a double mutable borrow while keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ButtonPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        self.cycle_count = self.cycle_count.wrapping_add(1);
        self.beeper.set_enabled(self.ctx.params.sound_enabled);

        // 1. Buttons
        let buttons = hw.poll();
        self.ctx.buttons = buttons;
        let key_tone = self.key_feedback();
        let user_input = buttons.any_pressed();
        if user_input {
            self.scheduler.reset_auto_power_off();
        }

        // 2. Scheduler
        let flags = self
            .scheduler
            .advance(self.ctx.params.power_off_timeout_min);
        self.ctx.flags = flags;

        // 3. Temperature
        let snap = hw.read_temperature();
        self.ctx.temperature = snap;
        if flags.contains(TimerFlags::CELSIUS_UPDATE) {
            self.ctx.celsius = snap.celsius;
        }

        // 4. Safety
        if let Some(transition) = self
            .safety
            .evaluate(snap.status, flags, user_input, &mut self.ctx)
        {
            match transition {
                SafetyTransition::PowerOffSoon => {
                    self.beeper.play(melodies::POWER_OFF_SOON);
                }
                SafetyTransition::PowerOffActivated => {
                    self.beeper.play(melodies::POWER_OFF_ACTIVE);
                }
                // The key beep already replaces the warning tone.
                SafetyTransition::PowerOffCancelled if !key_tone => self.beeper.stop(),
                SafetyTransition::PowerOffCancelled => {}
            }
            sink.emit(&AppEvent::PowerOff(transition));
        }
        let faults = self.safety.faults();
        if faults != self.last_faults {
            self.last_faults = faults;
            sink.emit(&AppEvent::SensorFaults(faults));
        }

        // 5. Control: roll → heater → alerts
        if let Some(feedback) = self.roll.update(&mut self.ctx) {
            self.beeper.play(feedback.sound());
        }
        self.heater.update(&mut self.ctx);
        if let Some(alert) = self.alerts.update(&self.ctx) {
            if alert.is_forced() {
                self.beeper.play_forced(alert.sound());
            } else {
                self.beeper.play(alert.sound());
            }
            sink.emit(&AppEvent::Alert(alert));
        }

        // 6. Outputs
        self.apply_actuators(hw);
        if flags.contains(TimerFlags::LOG) {
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a menu command.
    pub fn handle_command<S: StoragePort>(
        &mut self,
        cmd: AppCommand,
        store: &mut ParamStore<S>,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::SetSetpoint(c) => {
                self.ctx.params.setpoint_c = c.clamp(MIN_SET_TEMP, MAX_SET_TEMP);
            }
            AppCommand::SetRollCycles(n) => {
                self.ctx.params.roll_cycles = n.clamp(1, MAX_ROLL_CYCLES);
            }
            AppCommand::SetSound(on) => {
                self.ctx.params.sound_enabled = on;
                self.beeper.set_enabled(on);
            }
            AppCommand::SetPowerOffTimeout(min) => {
                self.ctx.params.power_off_timeout_min = min.min(MAX_POWEROFF_TIMEOUT);
            }
            AppCommand::SaveParams => match store.save_operating(&self.ctx.params) {
                Ok(()) => {
                    info!("params saved");
                    sink.emit(&AppEvent::ParamsSaved);
                }
                Err(e) => {
                    warn!("params save failed: {}", e);
                    sink.emit(&AppEvent::SaveFailed(e));
                }
            },
            AppCommand::BeginCalibration => {
                info!("calibration started");
                self.calibration_draft = Some(self.calibration);
                self.ctx.calibrating = true;
            }
            AppCommand::SetCalibrationPoint { slot, celsius } => {
                let raw = self.ctx.temperature.filtered / OVERSAMPLE_FACTOR;
                if let Some(draft) = self.calibration_draft.as_mut() {
                    let point = match slot {
                        CalibrationSlot::Low => &mut draft.low,
                        CalibrationSlot::High => &mut draft.high,
                    };
                    point.celsius = celsius;
                    point.raw = raw;
                    info!("calibration: {:?} = {} C at raw {}", slot, celsius, raw);
                }
            }
            AppCommand::EndCalibration => {
                self.ctx.calibrating = false;
                let Some(draft) = self.calibration_draft.take() else {
                    return;
                };
                match store.save_calibration(&draft) {
                    Ok(()) => {
                        self.calibration = draft;
                        self.ctx.calibration = TwoPointCalibration::from_params(&draft);
                        info!("calibration applied");
                        sink.emit(&AppEvent::CalibrationApplied);
                    }
                    Err(e) => {
                        warn!("calibration rejected: {}", e);
                        sink.emit(&AppEvent::SaveFailed(e));
                    }
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            filtered: self.ctx.temperature.filtered,
            celsius: self.ctx.celsius,
            setpoint_c: self.ctx.params.setpoint_c,
            heater_mode: self.heater.mode(),
            heater_duty: self.ctx.commands.heater_duty,
            pid: self.heater.pid().last_terms(),
            motor: self.ctx.commands.motor,
            cycle_active: self.roll.cycle_active(),
            auto_power_off: self.ctx.auto_power_off,
            sensor_faults: self.safety.faults(),
        }
    }

    /// Live operating parameters.
    pub fn params(&self) -> &OperatingParams {
        &self.ctx.params
    }

    /// Calibration currently applied.
    pub fn calibration(&self) -> &CalibrationParams {
        &self.calibration
    }

    pub fn context(&self) -> &ControlContext {
        &self.ctx
    }

    pub fn roll(&self) -> &RollController {
        &self.roll
    }

    pub fn heater(&self) -> &HeaterController {
        &self.heater
    }

    /// Coarse cycles executed since startup.
    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    // ── Internal ──────────────────────────────────────────────

    /// Keypress confirmation for buttons the roll logic does not answer.
    /// Returns true when a tone was queued.
    fn key_feedback(&mut self) -> bool {
        let buttons = self.ctx.buttons;
        let menu_long = buttons.long_held.contains(ButtonSet::MENU);
        let menu_long_edge = menu_long && !self.menu_long_latched;
        self.menu_long_latched = menu_long;

        if menu_long_edge {
            self.beeper.play(melodies::KEY_LONG)
        } else if buttons.pressed.intersects(ButtonSet::MENU | ButtonSet::HEAT) {
            self.beeper.play(melodies::KEY_PRESS)
        } else {
            false
        }
    }

    /// Translate context commands into port calls.
    fn apply_actuators(&self, hw: &mut impl ActuatorPort) {
        let cmds = &self.ctx.commands;
        hw.set_motor(cmds.motor);
        hw.set_heater_duty(cmds.heater_duty);
        hw.set_leds(cmds.leds);
    }
}
