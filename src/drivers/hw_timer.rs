//! 1 ms tick: sound sequencer and coarse-cycle gate.
//!
//! [`TickHandler`] is everything that runs on the fast tick.  It takes at
//! most one pending sound command per tick, steps the sequencer, then
//! advances the [`CycleGate`] the main loop waits on.  It never logs.
//!
//! On ESP-IDF the handler lives in a critical-section mutex and is driven
//! by a periodic `esp_timer`.  On host builds tests call
//! [`TickHandler::on_tick`] directly.

use crate::scheduler::{COARSE_CYCLE_MS, CycleGate};

use super::sound::{SoundHandoff, SoundSequencer, TONE_CLOCK_HZ, ToneOutput};

#[cfg(target_os = "espidf")]
use core::cell::RefCell;

#[cfg(target_os = "espidf")]
use embassy_sync::blocking_mutex::Mutex;
#[cfg(target_os = "espidf")]
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Gate between the tick and the main loop.
pub static CYCLE_GATE: CycleGate = CycleGate::new(COARSE_CYCLE_MS);
/// Sound requests from the main loop.
pub static SOUND: SoundHandoff = SoundHandoff::new();

/// Tick period.
pub const TICK_US: u64 = 1_000;

pub struct TickHandler<T> {
    gate: &'static CycleGate,
    sound: &'static SoundHandoff,
    sequencer: SoundSequencer,
    output: T,
}

impl<T: ToneOutput> TickHandler<T> {
    pub fn new(gate: &'static CycleGate, sound: &'static SoundHandoff, output: T) -> Self {
        Self {
            gate,
            sound,
            sequencer: SoundSequencer::new(),
            output,
        }
    }

    pub fn on_tick(&mut self) {
        if let Some(command) = self.sound.take() {
            self.sequencer.apply(command, &mut self.output);
        }
        self.sequencer.tick(&mut self.output);
        self.gate.on_tick();
    }

    pub fn sequencer(&self) -> &SoundSequencer {
        &self.sequencer
    }

    pub fn output(&self) -> &T {
        &self.output
    }
}

/// Buzzer on the LEDC peripheral.
pub struct LedcTone;

impl ToneOutput for LedcTone {
    fn set_period(&mut self, period: u16) {
        let freq = if period == 0 {
            0
        } else {
            TONE_CLOCK_HZ / u32::from(period)
        };
        super::hw_init::buzzer_set(freq);
    }
}

// ── ESP-IDF timer glue ───────────────────────────────────────

#[cfg(target_os = "espidf")]
static TICK: Mutex<CriticalSectionRawMutex, RefCell<Option<TickHandler<LedcTone>>>> =
    Mutex::new(RefCell::new(None));

#[cfg(target_os = "espidf")]
static mut TICK_TIMER: esp_timer_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn tick_cb(_arg: *mut core::ffi::c_void) {
    TICK.lock(|cell| {
        if let Some(handler) = cell.borrow_mut().as_mut() {
            handler.on_tick();
        }
    });
}

/// Install the tick handler and start the 1 ms timer.
#[cfg(target_os = "espidf")]
pub fn start_tick() -> Result<(), i32> {
    TICK.lock(|cell| {
        cell.replace(Some(TickHandler::new(&CYCLE_GATE, &SOUND, LedcTone)));
    });
    // SAFETY: TICK_TIMER is written here once at boot from the main task,
    // before the callback can fire.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"tick".as_ptr(),
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&args, &raw mut TICK_TIMER);
        if ret != ESP_OK {
            return Err(ret);
        }
        let ret = esp_timer_start_periodic(TICK_TIMER, TICK_US);
        if ret != ESP_OK {
            return Err(ret);
        }
    }
    log::info!("hw_timer: 1 ms tick started");
    Ok(())
}

/// Stop the tick timer.  Safe to call when it was never started.
#[cfg(target_os = "espidf")]
pub fn stop_tick() {
    // SAFETY: TICK_TIMER is null or a handle created by start_tick().
    unsafe {
        let timer = TICK_TIMER;
        if !timer.is_null() {
            esp_timer_stop(timer);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_tick() {}
