//! Roller motor state machine.
//!
//! Evaluated first in every coarse cycle, in strict priority order:
//!
//! 1. **Interlock**: forward and reverse commanded together stops the motor.
//! 2. **Auto-power-off**: cycle rolling is cancelled; hot or unmonitored
//!    rollers keep turning so they do not dwell against each other, cool
//!    ones stop and remember `Forward` for when the user comes back.
//! 3. **Manual**: direction buttons, cycle button, one-shot resume.
//!
//! Cycle rolling reverses the motor between two endpoints learned from
//! manual rolling.  The position is dead-reckoned: it moves by one unit per
//! coarse cycle while the motor turns.

use log::{debug, info};

use super::context::{ButtonSet, ControlContext, Direction, LedSet};
use crate::drivers::melodies;
use crate::drivers::sound::SoundRequest;

/// Below this temperature (°C) the rollers may stop in auto-power-off.
pub const POWER_OFF_MOTOR_THRESHOLD: i16 = 50;
/// Margin above the threshold before a stopped roller is restarted.
pub const POWER_OFF_MOTOR_HYSTERESIS: i16 = 5;
/// Shortest usable endpoint span, in coarse cycles of travel.
pub const MIN_ROLL_SPAN: i16 = 20;

/// Audible feedback requested by a roll evaluation, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RollFeedback {
    CycleDone,
    StartFailed,
    PointsReset,
    Action,
}

impl RollFeedback {
    pub fn sound(self) -> SoundRequest {
        match self {
            Self::CycleDone => melodies::ROLL_CYCLE_DONE,
            Self::StartFailed => melodies::ROLL_START_FAILED,
            Self::PointsReset => melodies::ROLL_POINTS_RESET,
            Self::Action => melodies::ROLL_ACTION,
        }
    }

    /// Keep the higher-priority of two requests.
    fn merge(current: Option<Self>, new: Self) -> Option<Self> {
        Some(current.map_or(new, |c| c.min(new)))
    }
}

// ── Position tracking ────────────────────────────────────────

/// Dead-reckoned roller position and the extremes reached since the last
/// point reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollTracker {
    position: i16,
    min: i16,
    max: i16,
}

impl RollTracker {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn advance(&mut self, direction: Direction) {
        match direction {
            Direction::Forward => self.position = self.position.saturating_add(1),
            Direction::Reverse => self.position = self.position.saturating_sub(1),
            Direction::Stopped => return,
        }
        self.min = self.min.min(self.position);
        self.max = self.max.max(self.position);
    }

    pub fn position(&self) -> i16 {
        self.position
    }

    pub fn endpoints(&self) -> (i16, i16) {
        (self.min, self.max)
    }

    pub fn has_valid_endpoints(&self) -> bool {
        self.max - self.min >= MIN_ROLL_SPAN
    }
}

/// An active cycle-rolling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CycleRun {
    low: i16,
    high: i16,
    /// Endpoint arrivals left; two per back-and-forth pass.
    arrivals_left: u16,
}

// ── State machine ────────────────────────────────────────────

pub struct RollController {
    direction: Direction,
    cycle: Option<CycleRun>,
    tracker: RollTracker,
    /// Direction to apply once when auto-power-off is left.
    resume: Option<Direction>,
    /// Edge: cycle logic reversed the motor.
    direction_changed: bool,
    /// Edge: the configured number of passes finished.
    cycle_complete: bool,
    /// Long-press on the cycle button already handled.
    long_press_latched: bool,
}

impl Default for RollController {
    fn default() -> Self {
        Self::new()
    }
}

impl RollController {
    pub fn new() -> Self {
        Self {
            direction: Direction::Stopped,
            cycle: None,
            tracker: RollTracker::default(),
            resume: None,
            direction_changed: false,
            cycle_complete: false,
            long_press_latched: false,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn cycle_active(&self) -> bool {
        self.cycle.is_some()
    }

    pub fn resume_direction(&self) -> Option<Direction> {
        self.resume
    }

    pub fn tracker(&self) -> &RollTracker {
        &self.tracker
    }

    /// Drive the motor without feedback (boot).
    pub fn start(&mut self, direction: Direction, ctx: &mut ControlContext) {
        self.set_direction(direction);
        self.publish(ctx);
    }

    /// Run one coarse cycle.  Returns the feedback tone to play, if any.
    pub fn update(&mut self, ctx: &mut ControlContext) -> Option<RollFeedback> {
        self.tracker.advance(self.direction);
        self.run_cycle();

        let buttons = ctx.buttons;
        let long_cycle = buttons.long_held.contains(ButtonSet::CYCLE);
        let long_cycle_edge = long_cycle && !self.long_press_latched;
        self.long_press_latched = long_cycle;

        let mut feedback = None;

        // ── 1. Interlock ──────────────────────────────────────────
        let commanded = buttons.held | buttons.pressed;
        if commanded.contains(ButtonSet::FORWARD | ButtonSet::REVERSE) {
            if self.direction.is_rotating() {
                info!("roll: interlock, both directions commanded");
            }
            self.stop_cycle(false);
            self.set_direction(Direction::Stopped);
            self.resume = None;
        }
        // ── 2. Auto-power-off ─────────────────────────────────────
        else if ctx.auto_power_off {
            self.stop_cycle(true);
            self.direction_changed = false;
            self.cycle_complete = false;
            let celsius = ctx.celsius;
            if ctx.sensor_error
                || celsius > POWER_OFF_MOTOR_THRESHOLD + POWER_OFF_MOTOR_HYSTERESIS
            {
                if !self.direction.is_rotating() {
                    info!("roll: keeping hot rollers moving");
                    self.set_direction(Direction::Forward);
                }
                self.resume = None;
            } else if celsius <= POWER_OFF_MOTOR_THRESHOLD && self.direction.is_rotating() {
                info!("roll: rollers cool, stopping");
                self.set_direction(Direction::Stopped);
                self.resume = Some(Direction::Forward);
            }
        }
        // ── 3. Manual ─────────────────────────────────────────────
        else {
            if buttons.pressed.contains(ButtonSet::FORWARD) {
                self.manual_direction(Direction::Forward);
                feedback = RollFeedback::merge(feedback, RollFeedback::Action);
            } else if buttons.pressed.contains(ButtonSet::REVERSE) {
                self.manual_direction(Direction::Reverse);
                feedback = RollFeedback::merge(feedback, RollFeedback::Action);
            } else if long_cycle_edge {
                self.stop_cycle(true);
                info!("roll: endpoints reset");
                feedback = RollFeedback::merge(feedback, RollFeedback::PointsReset);
            } else if let Some(dir) = self.resume {
                debug!("roll: resuming {:?}", dir);
                self.set_direction(dir);
            }
            self.resume = None;

            if buttons.released_short.contains(ButtonSet::CYCLE) {
                if self.cycle.is_some() {
                    self.stop_cycle(false);
                    feedback = RollFeedback::merge(feedback, RollFeedback::Action);
                } else if self.start_cycle(ctx.params.roll_cycles) {
                    feedback = RollFeedback::merge(feedback, RollFeedback::Action);
                } else {
                    feedback = RollFeedback::merge(feedback, RollFeedback::StartFailed);
                }
            }

            if core::mem::take(&mut self.direction_changed) {
                feedback = RollFeedback::merge(feedback, RollFeedback::Action);
            }
            if core::mem::take(&mut self.cycle_complete) {
                feedback = RollFeedback::merge(feedback, RollFeedback::CycleDone);
            }
        }

        self.publish(ctx);
        feedback
    }

    // ── internals ─────────────────────────────────────────────

    fn publish(&self, ctx: &mut ControlContext) {
        ctx.commands.motor = self.direction;
        ctx.commands
            .leds
            .set(LedSet::FORWARD, self.direction == Direction::Forward);
        ctx.commands
            .leds
            .set(LedSet::REVERSE, self.direction == Direction::Reverse);
    }

    fn set_direction(&mut self, direction: Direction) {
        if direction != self.direction {
            debug!("roll: {:?} -> {:?}", self.direction, direction);
        }
        self.direction = direction;
    }

    fn manual_direction(&mut self, direction: Direction) {
        if self.cycle.is_some() {
            self.stop_cycle(false);
        }
        self.set_direction(direction);
    }

    fn start_cycle(&mut self, roll_cycles: u8) -> bool {
        if !self.tracker.has_valid_endpoints() {
            info!("roll: cycle start refused, no valid endpoints");
            return false;
        }
        let (low, high) = self.tracker.endpoints();
        self.cycle = Some(CycleRun {
            low,
            high,
            arrivals_left: u16::from(roll_cycles.max(1)) * 2,
        });
        if !self.direction.is_rotating() {
            let toward_high = self.tracker.position() < high;
            self.set_direction(if toward_high {
                Direction::Forward
            } else {
                Direction::Reverse
            });
        }
        info!("roll: cycle started, {} passes", roll_cycles);
        true
    }

    fn stop_cycle(&mut self, reset_points: bool) {
        if self.cycle.take().is_some() {
            info!("roll: cycle stopped");
        }
        if reset_points {
            self.tracker.reset();
        }
    }

    /// Reverse at the endpoints and count arrivals.
    fn run_cycle(&mut self) {
        let Some(run) = self.cycle.as_mut() else {
            return;
        };
        let position = self.tracker.position();
        let arrived = match self.direction {
            Direction::Forward => position >= run.high,
            Direction::Reverse => position <= run.low,
            Direction::Stopped => false,
        };
        if !arrived {
            return;
        }
        run.arrivals_left = run.arrivals_left.saturating_sub(1);
        if run.arrivals_left == 0 {
            self.cycle = None;
            self.cycle_complete = true;
            self.set_direction(Direction::Stopped);
            info!("roll: cycle complete");
        } else {
            let next = match self.direction {
                Direction::Forward => Direction::Reverse,
                _ => Direction::Forward,
            };
            self.set_direction(next);
            self.direction_changed = true;
        }
    }
}
