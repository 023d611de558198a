//! Fixed-point PID controller for heater power.
//!
//! All arithmetic is integer.  Each term is bounded before it is
//! multiplied by its gain so nothing can overflow:
//!
//! - P: the error is replaced by ±`P_TERM_LIMIT` once |error| exceeds
//!   `P_ERROR_THRESHOLD`, bounding the kick from a setpoint jump.
//! - I: the accumulator is clamped to ±`INTEGRAL_LIMIT` (anti-windup).  A
//!   setpoint change re-clamps the accumulator before it is used.
//! - D: computed from a 4-sample moving sum of the process value instead of
//!   a raw first difference, which smooths sensor noise.
//!
//! Output is `(P + I + D) / SCALING_FACTOR` clamped to `0..=100` percent.

use heapless::HistoryBuffer;

/// Proportional gain.
pub const KP: i32 = 20;
/// Integral gain (applied as `acc * KI / 20`).
pub const KI: i32 = 10;
/// Derivative gain.
pub const KD: i32 = 10;
/// Divider from the summed terms to percent duty.
pub const SCALING_FACTOR: i32 = 20;

/// |error| above which the P term saturates.
pub const P_ERROR_THRESHOLD: i32 = 100;
/// Saturated P term.
pub const P_TERM_LIMIT: i32 = 2000;
/// Integral accumulator clamp.
pub const INTEGRAL_LIMIT: i32 = 1000;

/// Depth of the derivative smoothing window.
pub const DTERM_DEPTH: usize = 4;

/// Per-call control flags from the heater state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PidFlags {
    /// Clear the accumulator and derivative window before computing.
    pub reset: bool,
    /// The setpoint differs from the previous call's.
    pub setpoint_changed: bool,
}

/// Breakdown of the last computation, for telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PidTerms {
    pub p: i32,
    pub i: i32,
    pub d: i32,
    pub output: u8,
}

/// PID controller with private filter state.
#[derive(Debug, Clone)]
pub struct PidController {
    integral: i32,
    window: HistoryBuffer<u16, DTERM_DEPTH>,
    window_sum: i32,
    last: PidTerms,
}

impl Default for PidController {
    fn default() -> Self {
        Self::new()
    }
}

impl PidController {
    pub fn new() -> Self {
        Self {
            integral: 0,
            window: HistoryBuffer::new(),
            window_sum: 0,
            last: PidTerms::default(),
        }
    }

    /// Compute the heater duty (0–100 %).  `setpoint` and `process_value`
    /// are both in PID units.
    pub fn update(&mut self, setpoint: u16, process_value: u16, flags: PidFlags) -> u8 {
        if flags.reset {
            self.reset();
        }
        if flags.setpoint_changed {
            self.retarget();
        }
        let limit = self.integral_limit();

        let error = i32::from(setpoint) - i32::from(process_value);

        let p = if error > P_ERROR_THRESHOLD {
            P_TERM_LIMIT
        } else if error < -P_ERROR_THRESHOLD {
            -P_TERM_LIMIT
        } else {
            error * KP
        };

        self.integral = (self.integral + error).clamp(-limit, limit);
        let i = self.integral * KI / 20;

        let previous_sum = self.push_sample(process_value);
        let d = KD * (previous_sum - self.window_sum);

        let output = ((p + i + d) / SCALING_FACTOR).clamp(0, 100) as u8;
        self.last = PidTerms { p, i, d, output };
        output
    }

    /// Clear accumulator and derivative window.  The next update behaves
    /// like the first update of a fresh controller.
    pub fn reset(&mut self) {
        self.integral = 0;
        self.window.clear();
        self.window_sum = 0;
    }

    /// Seed the derivative window with the current reading so the first
    /// live update has no derivative kick.
    pub fn prime(&mut self, process_value: u16) {
        self.window.clear();
        self.window_sum = 0;
        self.push_sample(process_value);
    }

    pub fn integral(&self) -> i32 {
        self.integral
    }

    pub fn integral_limit(&self) -> i32 {
        INTEGRAL_LIMIT
    }

    pub fn last_terms(&self) -> PidTerms {
        self.last
    }

    /// Pull the accumulator inside the anti-windup bound after a setpoint
    /// jump.
    fn retarget(&mut self) {
        let limit = self.integral_limit();
        self.integral = self.integral.clamp(-limit, limit);
    }

    /// Insert a sample, keeping the running sum in step.  An empty window
    /// is filled with the sample.  Returns the sum before insertion.
    fn push_sample(&mut self, sample: u16) -> i32 {
        if self.window.len() == 0 {
            for _ in 0..DTERM_DEPTH {
                self.window.write(sample);
            }
            self.window_sum = i32::from(sample) * DTERM_DEPTH as i32;
        }
        let previous_sum = self.window_sum;
        let evicted = self.window.oldest_ordered().next().copied().unwrap_or(sample);
        self.window.write(sample);
        self.window_sum += i32::from(sample) - i32::from(evicted);
        previous_sum
    }
}
