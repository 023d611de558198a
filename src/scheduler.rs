//! Multi-rate tick scheduler.
//!
//! Two layers turn the fixed 1 ms hardware tick into application events:
//!
//! ```text
//!  1 ms tick ISR ──▶ CycleGate ──[ready every COARSE_CYCLE_MS]──▶ main loop
//!                                                                 │
//!                                               TickScheduler::advance()
//!                                                                 │
//!   celsius ──▶ pid            10 s ──▶ 1 min ──▶ auto-power-off  │
//!   (nested)                   (nested)  (count-up)               ▼
//!                                                           TimerFlags
//! ```
//!
//! Nested counters only decrement when their parent expires, so slow events
//! always land on a cycle where the faster one fired too.  Flags are
//! recomputed from scratch on every [`TickScheduler::advance`]; a cycle the
//! main loop misses is simply lost.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::config::MAX_POWEROFF_TIMEOUT;

// ═══════════════════════════════════════════════════════════════
//  Periods (in coarse cycles unless noted)
// ═══════════════════════════════════════════════════════════════

/// Coarse application cycle length in hardware ticks (ms).
pub const COARSE_CYCLE_MS: u16 = 50;
/// Celsius refresh period.
pub const CELSIUS_UPDATE_PERIOD: u16 = 5;
/// PID period, counted in Celsius refreshes.
pub const PID_UPDATE_PERIOD: u16 = 2;
/// Telemetry log period.
pub const LOG_PERIOD: u16 = 20;
/// Cycles per 10 seconds.
pub const TEN_SECONDS_PERIOD: u16 = (10_000 / COARSE_CYCLE_MS as u32) as u16;
/// 10-second periods per minute.
pub const ONE_MINUTE_PERIOD: u16 = 6;

// ═══════════════════════════════════════════════════════════════
//  Flags
// ═══════════════════════════════════════════════════════════════

/// Events that expired during the last coarse cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerFlags(u8);

impl TimerFlags {
    pub const NONE: Self = Self(0);
    pub const CELSIUS_UPDATE: Self = Self(1 << 0);
    pub const PID_UPDATE: Self = Self(1 << 1);
    pub const LOG: Self = Self(1 << 2);
    pub const TEN_SECONDS: Self = Self(1 << 3);
    pub const ONE_MINUTE: Self = Self(1 << 4);
    pub const POWER_OFF_SOON: Self = Self(1 << 5);
    pub const POWER_OFF_EXPIRED: Self = Self(1 << 6);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl core::ops::BitOr for TimerFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Coarse-rate scheduler
// ═══════════════════════════════════════════════════════════════

/// Countdown state for every periodic event.  Owned by the main loop.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    celsius: u16,
    pid: u16,
    log: u16,
    ten_seconds: u16,
    one_minute: u16,
    /// Minutes since the last user input (count-up, saturating at
    /// `MAX_POWEROFF_TIMEOUT`).
    power_off_minutes: u8,
    flags: TimerFlags,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickScheduler {
    /// Celsius and log counters start at 1 so the first cycle refreshes
    /// the display temperature and emits a log line immediately.
    pub fn new() -> Self {
        Self {
            celsius: 1,
            pid: PID_UPDATE_PERIOD,
            log: 1,
            ten_seconds: TEN_SECONDS_PERIOD,
            one_minute: ONE_MINUTE_PERIOD,
            power_off_minutes: 0,
            flags: TimerFlags::NONE,
        }
    }

    /// Advance one coarse cycle and recompute the expired-event flags.
    ///
    /// `power_off_timeout_min` is compared against the minute counter to
    /// derive the one-shot "soon" (timeout − 1) and "expired" flags; 0
    /// disables both.
    pub fn advance(&mut self, power_off_timeout_min: u8) -> TimerFlags {
        let mut flags = TimerFlags::NONE;

        if countdown(&mut self.celsius, CELSIUS_UPDATE_PERIOD) {
            flags.insert(TimerFlags::CELSIUS_UPDATE);
            if countdown(&mut self.pid, PID_UPDATE_PERIOD) {
                flags.insert(TimerFlags::PID_UPDATE);
            }
        }

        if countdown(&mut self.log, LOG_PERIOD) {
            flags.insert(TimerFlags::LOG);
        }

        if countdown(&mut self.ten_seconds, TEN_SECONDS_PERIOD) {
            flags.insert(TimerFlags::TEN_SECONDS);
            if countdown(&mut self.one_minute, ONE_MINUTE_PERIOD) {
                flags.insert(TimerFlags::ONE_MINUTE);
                // Once saturated the counter stops moving, so neither
                // flag can repeat.
                let counted = self.power_off_minutes < MAX_POWEROFF_TIMEOUT;
                if counted {
                    self.power_off_minutes += 1;
                }
                if counted && power_off_timeout_min != 0 {
                    if self.power_off_minutes == power_off_timeout_min - 1 {
                        flags.insert(TimerFlags::POWER_OFF_SOON);
                    }
                    if self.power_off_minutes == power_off_timeout_min {
                        flags.insert(TimerFlags::POWER_OFF_EXPIRED);
                    }
                }
            }
        }

        self.flags = flags;
        flags
    }

    /// Restart the auto-power-off interval (any user input).
    pub fn reset_auto_power_off(&mut self) {
        self.power_off_minutes = 0;
    }

    /// Flags computed by the last [`advance`](Self::advance).
    pub fn flags(&self) -> TimerFlags {
        self.flags
    }

    pub fn power_off_minutes(&self) -> u8 {
        self.power_off_minutes
    }
}

/// Decrement `counter`; on reaching zero reload it and report expiry.
fn countdown(counter: &mut u16, period: u16) -> bool {
    *counter = counter.saturating_sub(1);
    if *counter == 0 {
        *counter = period;
        true
    } else {
        false
    }
}

// ═══════════════════════════════════════════════════════════════
//  Hardware tick → coarse cycle gate
// ═══════════════════════════════════════════════════════════════

/// Sole coupling between the 1 ms tick handler and the cooperative main
/// loop.  The tick side only calls [`on_tick`](Self::on_tick); the main
/// loop only calls [`wait`](Self::wait) / [`is_ready`](Self::is_ready) and
/// [`clear`](Self::clear).  Both fields are single atomics, so no lock is
/// needed in either direction.
pub struct CycleGate {
    interval_ms: u16,
    elapsed_ms: AtomicU16,
    ready: AtomicBool,
}

impl CycleGate {
    pub const fn new(interval_ms: u16) -> Self {
        Self {
            interval_ms,
            elapsed_ms: AtomicU16::new(0),
            ready: AtomicBool::new(false),
        }
    }

    /// Tick-handler side: count one millisecond.
    pub fn on_tick(&self) {
        let elapsed = self.elapsed_ms.load(Ordering::Relaxed) + 1;
        if elapsed >= self.interval_ms {
            self.elapsed_ms.store(0, Ordering::Relaxed);
            self.ready.store(true, Ordering::Release);
        } else {
            self.elapsed_ms.store(elapsed, Ordering::Relaxed);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Busy-poll until the next coarse cycle is due.
    pub fn wait(&self) {
        while !self.is_ready() {
            core::hint::spin_loop();
        }
    }

    /// Main-loop side: acknowledge the finished cycle.  A ready edge raised
    /// while the cycle was still running is dropped here.
    pub fn clear(&self) {
        self.ready.store(false, Ordering::Release);
    }

    pub fn interval_ms(&self) -> u16 {
        self.interval_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
