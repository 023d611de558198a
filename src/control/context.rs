//! Shared mutable context threaded through every control component.
//!
//! `ControlContext` is the single struct the roll, heater and alert logic
//! read from each coarse cycle.  It holds the latest inputs (temperature,
//! button edges, expired timer events), the safety state, the live
//! parameters and the actuator commands the components produce.  The main
//! loop owns it; tests build one directly with synthetic inputs.

use crate::config::{CalibrationParams, OperatingParams};
use crate::scheduler::TimerFlags;
use crate::sensors::calibration::TwoPointCalibration;
use crate::sensors::{OVERSAMPLE_FACTOR, TemperatureSnapshot};

// ---------------------------------------------------------------------------
// Buttons (written by the button collaborator; read-only to components)
// ---------------------------------------------------------------------------

/// Set of logical buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub const NONE: Self = Self(0);
    pub const FORWARD: Self = Self(1 << 0);
    pub const REVERSE: Self = Self(1 << 1);
    pub const CYCLE: Self = Self(1 << 2);
    pub const MENU: Self = Self(1 << 3);
    pub const HEAT: Self = Self(1 << 4);

    /// Every logical button, one bit each.
    pub const ALL: [Self; 5] = [
        Self::FORWARD,
        Self::REVERSE,
        Self::CYCLE,
        Self::MENU,
        Self::HEAT,
    ];

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Buttons in `self` but not in `other`.
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl core::ops::BitOr for ButtonSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Per-cycle button edges from the debouncer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonEdges {
    /// Went down this cycle.
    pub pressed: ButtonSet,
    /// Released this cycle after a short hold.
    pub released_short: ButtonSet,
    /// Held past the long-press threshold (level, not edge).
    pub long_held: ButtonSet,
    /// Instantaneous debounced state.
    pub held: ButtonSet,
}

impl ButtonEdges {
    /// Any user input observed this cycle.
    pub fn any_pressed(&self) -> bool {
        !self.pressed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Actuator commands (written by components; applied by the service)
// ---------------------------------------------------------------------------

/// Roller motor direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Stopped,
    Forward,
    Reverse,
}

impl Direction {
    pub fn is_rotating(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

/// Front-panel indicator LEDs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedSet(u8);

impl LedSet {
    pub const NONE: Self = Self(0);
    pub const HEATER: Self = Self(1 << 0);
    pub const FORWARD: Self = Self(1 << 1);
    pub const REVERSE: Self = Self(1 << 2);

    pub fn set(&mut self, led: Self, on: bool) {
        if on {
            self.0 |= led.0;
        } else {
            self.0 &= !led.0;
        }
    }

    pub fn contains(self, led: Self) -> bool {
        led.0 != 0 && self.0 & led.0 == led.0
    }
}

/// Commands the components request; the service pushes them to the
/// [`ActuatorPort`](crate::app::ports::ActuatorPort) each cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommands {
    pub motor: Direction,
    /// Heater duty (0–100 %).  Only changes on PID update cycles.
    pub heater_duty: u8,
    pub leds: LedSet,
}

// ---------------------------------------------------------------------------
// ControlContext
// ---------------------------------------------------------------------------

/// The shared context passed to every control component.
pub struct ControlContext {
    // -- Parameters --
    /// Live operating parameters (menu-mutable).
    pub params: OperatingParams,
    /// Linear raw↔Celsius mapping derived from the calibration block.
    pub calibration: TwoPointCalibration,

    // -- Inputs --
    /// Latest temperature snapshot (filtered reading refreshed every cycle).
    pub temperature: TemperatureSnapshot,
    /// Temperature used by the control logic.  Refreshed only on
    /// Celsius-update cycles.
    pub celsius: i16,
    /// Button edges for this cycle.
    pub buttons: ButtonEdges,
    /// Timer events that expired this cycle.
    pub flags: TimerFlags,

    // -- Safety --
    /// Auto-power-off is active.
    pub auto_power_off: bool,
    /// Sensor reports a fault.
    pub sensor_error: bool,

    // -- Shared state --
    /// Heater enabled, as decided by the heater state machine this cycle.
    pub heater_enabled: bool,
    /// Calibration procedure in progress (set by the menu).
    pub calibrating: bool,

    // -- Outputs --
    pub commands: ActuatorCommands,
}

impl ControlContext {
    pub fn new(params: OperatingParams, calibration: &CalibrationParams) -> Self {
        Self {
            params,
            calibration: TwoPointCalibration::from_params(calibration),
            temperature: TemperatureSnapshot::default(),
            celsius: 0,
            buttons: ButtonEdges::default(),
            flags: TimerFlags::NONE,
            auto_power_off: false,
            sensor_error: false,
            heater_enabled: false,
            calibrating: false,
            commands: ActuatorCommands::default(),
        }
    }

    /// Setpoint in PID units (2.5 × raw).
    pub fn setpoint_pid(&self) -> u16 {
        let raw = u32::from(self.calibration.celsius_to_raw(i32::from(self.params.setpoint_c)));
        (raw * u32::from(OVERSAMPLE_FACTOR) / 2).min(u32::from(u16::MAX)) as u16
    }

    /// Process value in PID units (2.5 × raw).
    pub fn process_value_pid(&self) -> u16 {
        self.temperature.filtered / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setpoint_and_process_value_share_scale() {
        let mut ctx = ControlContext::new(OperatingParams::default(), &CalibrationParams::default());
        let raw = ctx.calibration.celsius_to_raw(i32::from(ctx.params.setpoint_c));
        ctx.temperature.filtered = raw * OVERSAMPLE_FACTOR;
        assert_eq!(ctx.setpoint_pid(), ctx.process_value_pid());
    }

    #[test]
    fn button_set_membership() {
        let set = ButtonSet::FORWARD | ButtonSet::HEAT;
        assert!(set.contains(ButtonSet::FORWARD));
        assert!(!set.contains(ButtonSet::REVERSE));
        assert!(!set.contains(ButtonSet::FORWARD | ButtonSet::REVERSE));
        assert!(set.intersects(ButtonSet::FORWARD | ButtonSet::REVERSE));
    }
}
