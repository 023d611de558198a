//! Laminator Firmware: Main Entry Point
//!
//! Hexagonal architecture around one cooperative coarse cycle.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter            LogEventSink      EepromImage      │
//! │  (Sensor+Button+Actuator)   (EventSink)       (StoragePort)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Scheduler · Safety · Roll · Heater/PID · Alerts       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  1 ms tick (esp_timer): sound sequencer · coarse cycle gate    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::FromValueType;
use log::{error, info, warn};

use laminator::adapters::eeprom::EepromImage;
use laminator::adapters::hardware::HardwareAdapter;
use laminator::adapters::log_sink::LogEventSink;
use laminator::app::ports::ActuatorPort;
use laminator::app::service::AppService;
use laminator::drivers::heater::HeaterDriver;
use laminator::drivers::hw_init;
use laminator::drivers::hw_timer::{self, CYCLE_GATE};
use laminator::drivers::motor::MotorDriver;
use laminator::drivers::watchdog::Watchdog;
use laminator::error::Error;
use laminator::pins;
use laminator::power;
use laminator::storage::{LoadedParams, ParamStore};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Laminator v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}", e);
        hw_init::release_outputs();
        return Err(Error::from(e).into());
    }

    // ── 3. Parameters ─────────────────────────────────────────
    let image = EepromImage::open().unwrap_or_else(|e| {
        warn!("EEPROM open failed ({}), running without persistence", e);
        EepromImage::erased()
    });
    let mut store = ParamStore::new(image);
    let loaded = store.load().unwrap_or_else(|e| {
        warn!("parameter load failed ({}), using defaults", e);
        LoadedParams::defaults()
    });
    info!(
        "params: setpoint {} C, {} roll cycles, sound {}, auto-off {} min",
        loaded.operating.setpoint_c,
        loaded.operating.roll_cycles,
        loaded.operating.sound_enabled,
        loaded.operating.power_off_timeout_min,
    );

    // ── 4. Actuator drivers ───────────────────────────────────
    let peripherals = Peripherals::take()?;
    // GPIO1/GPIO2: pins::MOTOR_IN1_GPIO / MOTOR_IN2_GPIO
    let motor = MotorDriver::new(
        PinDriver::output(peripherals.pins.gpio1)?,
        PinDriver::output(peripherals.pins.gpio2)?,
    );
    let heater_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new()
            .frequency(pins::HEATER_PWM_FREQ_HZ.Hz().into())
            .resolution(Resolution::Bits14),
    )?;
    // GPIO3: pins::HEATER_SSR_GPIO
    let heater_pwm = LedcDriver::new(peripherals.ledc.channel0, &heater_timer, peripherals.pins.gpio3)?;

    let mut hw = HardwareAdapter::new(&loaded.calibration, motor, HeaterDriver::new(heater_pwm));
    let mut log_sink = LogEventSink::new();

    // ── 5. Application service + tick ─────────────────────────
    let mut app = AppService::new(loaded, &hw_timer::SOUND);
    hw_timer::start_tick().map_err(|rc| anyhow!("tick timer start failed (rc={})", rc))?;
    let watchdog = Watchdog::new();
    app.start(&mut hw, &mut log_sink);

    let mut applied_calibration = *app.calibration();
    info!("System ready. Entering control loop.");

    // ── 6. Coarse cycle loop ──────────────────────────────────
    loop {
        CYCLE_GATE.wait();

        if !power::mains_present() {
            let params = *app.params();
            power::power_loss(
                Some(&mut hw as &mut dyn ActuatorPort),
                Some(&mut store),
                &params,
                Some(watchdog),
            );
        }

        app.tick(&mut hw, &mut log_sink);
        if *app.calibration() != applied_calibration {
            applied_calibration = *app.calibration();
            hw.set_calibration(&applied_calibration);
        }
        watchdog.feed();
        CYCLE_GATE.clear();
    }
}
