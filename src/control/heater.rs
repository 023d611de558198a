//! Heater state machine.
//!
//! ```text
//!            HEAT press                HEAT long-held
//!   Disabled ─────────▶ Enabled ──────────────────▶ EnabledResetRequested
//!      ▲     ◀─────────    ▲    ◀── HEAT released ──┘
//!      │      HEAT press   │
//!      └── auto-power-off / sensor error (forced, from any state)
//! ```
//!
//! Runs after the roll state machine each coarse cycle.  The PID is only
//! invoked on PID-update cycles, or immediately when the heat button was
//! toggled or the setpoint changed.  A setpoint at `MAX_SET_TEMP` bypasses
//! the PID and drives full power.

use log::{info, warn};

use super::context::{ButtonSet, ControlContext, LedSet};
use super::pid::{PidController, PidFlags};
use crate::config::MAX_SET_TEMP;
use crate::scheduler::TimerFlags;

/// Duty applied in the unregulated calibration mode.
pub const FULL_POWER: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterMode {
    Disabled,
    Enabled,
    EnabledResetRequested,
}

pub struct HeaterController {
    enabled: bool,
    reset_requested: bool,
    last_setpoint: Option<u16>,
    /// Setpoint change not yet seen by the PID.
    retarget_pending: bool,
    pid: PidController,
    duty: u8,
}

impl Default for HeaterController {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaterController {
    pub fn new() -> Self {
        Self {
            enabled: false,
            reset_requested: false,
            last_setpoint: None,
            retarget_pending: false,
            pid: PidController::new(),
            duty: 0,
        }
    }

    /// Seed the derivative window at boot.
    pub fn prime(&mut self, ctx: &ControlContext) {
        self.pid.prime(ctx.process_value_pid());
    }

    pub fn mode(&self) -> HeaterMode {
        match (self.enabled, self.reset_requested) {
            (false, _) => HeaterMode::Disabled,
            (true, false) => HeaterMode::Enabled,
            (true, true) => HeaterMode::EnabledResetRequested,
        }
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    /// Run one coarse cycle.
    pub fn update(&mut self, ctx: &mut ControlContext) -> HeaterMode {
        let was_enabled = self.enabled;
        let mut force_update = false;

        // ── Buttons ───────────────────────────────────────────────
        if ctx.buttons.pressed.contains(ButtonSet::HEAT) {
            self.enabled = !self.enabled;
            force_update = true;
        }
        self.reset_requested = ctx.buttons.long_held.contains(ButtonSet::HEAT);

        // ── Safety overrides ──────────────────────────────────────
        if ctx.auto_power_off || ctx.sensor_error {
            if self.enabled {
                warn!(
                    "heater: forced off ({})",
                    if ctx.sensor_error { "sensor error" } else { "auto power-off" }
                );
            }
            self.enabled = false;
        }

        // ── Setpoint tracking ─────────────────────────────────────
        let setpoint = ctx.params.setpoint_c;
        if self.last_setpoint.is_some_and(|last| last != setpoint) {
            self.retarget_pending = true;
            force_update = true;
        }
        self.last_setpoint = Some(setpoint);

        if was_enabled != self.enabled {
            info!("heater: {}", if self.enabled { "enabled" } else { "disabled" });
            force_update = true;
        }

        // ── Output ────────────────────────────────────────────────
        if ctx.flags.contains(TimerFlags::PID_UPDATE) || force_update {
            self.duty = self.compute(ctx);
            ctx.commands.heater_duty = self.duty;
        }

        ctx.heater_enabled = self.enabled;
        ctx.commands.leds.set(LedSet::HEATER, self.enabled);
        self.mode()
    }

    fn compute(&mut self, ctx: &ControlContext) -> u8 {
        if !self.enabled {
            // Paused: state is kept unless a reset was asked for.
            if self.reset_requested {
                self.pid.reset();
            }
            return 0;
        }
        if ctx.params.setpoint_c >= MAX_SET_TEMP {
            return FULL_POWER;
        }
        let flags = PidFlags {
            reset: self.reset_requested,
            setpoint_changed: core::mem::take(&mut self.retarget_pending),
        };
        self.pid
            .update(ctx.setpoint_pid(), ctx.process_value_pid(), flags)
    }
}
