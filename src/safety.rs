//! Safety supervisor.
//!
//! Runs at the start of every coarse cycle, before the control components,
//! and owns the two safety inputs they consult:
//!
//! - **Sensor faults**: latched per fault in a bitmask from the sensor
//!   status reported by the ADC front-end.  A bit is set while the
//!   condition holds and cleared as soon as it disappears.
//! - **Auto-power-off**: activated when the scheduler reports the timeout
//!   expired, deactivated by any button press.
//!
//! Both are written into [`ControlContext`] so the roll and heater state
//! machines apply their overrides in the same cycle.

use log::{error, info, warn};

use crate::control::context::ControlContext;
use crate::error::SensorFault;
use crate::scheduler::TimerFlags;
use crate::sensors::SensorStatus;

/// Safety-relevant transition observed this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyTransition {
    PowerOffSoon,
    PowerOffActivated,
    PowerOffCancelled,
}

#[derive(Default)]
pub struct SafetySupervisor {
    /// Latched fault bitmask.
    faults: u8,
    auto_power_off: bool,
}

impl SafetySupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate sensor status and auto-power-off for this cycle.
    ///
    /// `user_input` is true when any button was pressed.  It wins over an
    /// expiry reported in the same cycle, since the scheduler counter was
    /// already reset by that input.
    pub fn evaluate(
        &mut self,
        status: SensorStatus,
        flags: TimerFlags,
        user_input: bool,
        ctx: &mut ControlContext,
    ) -> Option<SafetyTransition> {
        for fault in SensorFault::ALL {
            self.eval_fault(fault, status.has(fault));
        }

        let mut transition = None;
        if user_input {
            if self.auto_power_off {
                info!("auto power-off cancelled by user");
                transition = Some(SafetyTransition::PowerOffCancelled);
            }
            self.auto_power_off = false;
        } else if flags.contains(TimerFlags::POWER_OFF_EXPIRED) {
            if !self.auto_power_off {
                warn!("auto power-off activated");
                transition = Some(SafetyTransition::PowerOffActivated);
            }
            self.auto_power_off = true;
        } else if flags.contains(TimerFlags::POWER_OFF_SOON) {
            info!("auto power-off in one minute");
            transition = Some(SafetyTransition::PowerOffSoon);
        }

        ctx.sensor_error = self.has_faults();
        ctx.auto_power_off = self.auto_power_off;
        transition
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    pub fn has_fault(&self, fault: SensorFault) -> bool {
        self.faults & fault.mask() != 0
    }

    pub fn auto_power_off(&self) -> bool {
        self.auto_power_off
    }

    // ── Internal ──────────────────────────────────────────────────

    fn eval_fault(&mut self, fault: SensorFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("SENSOR FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("SENSOR FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
