//! Power-loss handler.
//!
//! Entered from the main loop as soon as the mains-sense input drops.  The
//! bulk capacitor holds the rails up long enough to:
//!
//! 1. stop the 1 ms tick (silences the sequencer, ends the cycle gate)
//! 2. switch the heater and motor off and release every driven pin to
//!    high impedance
//! 3. write the operating parameters (with CRC) one last time
//! 4. release the watchdog and halt
//!
//! Each step tolerates the state it needs being absent, so the handler can
//! run at any point of boot.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{error, info, warn};

use crate::app::ports::{ActuatorPort, ConfigError, StoragePort};
use crate::config::OperatingParams;
use crate::drivers::watchdog::Watchdog;
use crate::drivers::{hw_init, hw_timer};
use crate::pins;
use crate::storage::ParamStore;

static ENTERED: AtomicBool = AtomicBool::new(false);

/// True while mains is present.
pub fn mains_present() -> bool {
    hw_init::gpio_read(pins::MAINS_SENSE_GPIO)
}

/// Has the handler run?
pub fn power_loss_entered() -> bool {
    ENTERED.load(Ordering::Acquire)
}

/// Quiesce all I/O and persist the operating parameters.
///
/// Returns the save result; the caller halts regardless.  `actuators` and
/// `store` are `None` when power fails before they were constructed.
pub fn quiesce_and_persist<S: StoragePort>(
    actuators: Option<&mut dyn ActuatorPort>,
    store: Option<&mut ParamStore<S>>,
    params: &OperatingParams,
) -> Result<(), ConfigError> {
    if ENTERED.swap(true, Ordering::AcqRel) {
        warn!("power loss: handler re-entered");
    }

    hw_timer::stop_tick();
    hw_init::buzzer_set(0);
    if let Some(hw) = actuators {
        hw.all_off();
    }
    hw_init::release_outputs();

    match store {
        Some(store) => {
            let result = store.save_operating(params);
            match result {
                Ok(()) => info!("power loss: parameters saved"),
                Err(e) => error!("power loss: parameter save failed: {}", e),
            }
            result
        }
        None => {
            warn!("power loss: no parameter store, nothing saved");
            Ok(())
        }
    }
}

/// Terminal power-loss routine.  Never returns.
pub fn power_loss<S: StoragePort>(
    actuators: Option<&mut dyn ActuatorPort>,
    store: Option<&mut ParamStore<S>>,
    params: &OperatingParams,
    watchdog: Option<Watchdog>,
) -> ! {
    error!("POWER LOSS");
    let _ = quiesce_and_persist(actuators, store, params);
    if let Some(wdt) = watchdog {
        wdt.release();
    }
    halt()
}

#[cfg(target_os = "espidf")]
fn halt() -> ! {
    loop {
        // SAFETY: suspending the calling task is always valid.
        unsafe { esp_idf_svc::sys::vTaskSuspend(core::ptr::null_mut()) };
    }
}

#[cfg(not(target_os = "espidf"))]
fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
