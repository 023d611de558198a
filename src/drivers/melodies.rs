//! Compile-time tone sequences and the fixed beeps used by the firmware.

use super::sound::{SoundRequest, Tone};

/// Rising and falling sweep.
pub static SIREN_SWEEP: [Tone; 18] = [
    Tone::new(800, 200),
    Tone::new(900, 200),
    Tone::new(1000, 200),
    Tone::new(1100, 200),
    Tone::new(1200, 200),
    Tone::new(1100, 200),
    Tone::new(1000, 200),
    Tone::new(900, 200),
    Tone::new(800, 200),
    Tone::new(900, 200),
    Tone::new(1000, 200),
    Tone::new(1100, 200),
    Tone::new(1200, 200),
    Tone::new(1100, 200),
    Tone::new(1000, 200),
    Tone::new(900, 200),
    Tone::new(800, 200),
    Tone::END,
];

/// Broken two-note alarm with a rest.
pub static SIREN_ALARM: [Tone; 8] = [
    Tone::new(700, 250),
    Tone::new(900, 250),
    Tone::new(800, 250),
    Tone::new(1000, 250),
    Tone::rest(250),
    Tone::new(900, 250),
    Tone::new(1000, 500),
    Tone::END,
];

// ── Fixed beeps ──────────────────────────────────────────────

pub const BOOT: SoundRequest = SoundRequest::beep(1000, 200);
pub const KEY_PRESS: SoundRequest = SoundRequest::beep(1000, 40);
pub const KEY_LONG: SoundRequest = SoundRequest::beep(800, 40);
pub const POWER_OFF_SOON: SoundRequest = SoundRequest::beep(1200, 200);
pub const POWER_OFF_ACTIVE: SoundRequest = SoundRequest::Melody(&SIREN_SWEEP);

pub const ROLL_ACTION: SoundRequest = SoundRequest::beep(1000, 50);
pub const ROLL_POINTS_RESET: SoundRequest = SoundRequest::beep(800, 50);
pub const ROLL_START_FAILED: SoundRequest = SoundRequest::beep(500, 50);
pub const ROLL_CYCLE_DONE: SoundRequest = SoundRequest::beep(1000, 200);

pub const TEMPERATURE_REACHED: SoundRequest = SoundRequest::beep(1000, 400);
pub const THERMAL_ANOMALY: SoundRequest = SoundRequest::beep(1500, 5000);
pub const SENSOR_FAULT: SoundRequest = SoundRequest::Melody(&SIREN_ALARM);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_are_terminated() {
        for seq in [&SIREN_SWEEP[..], &SIREN_ALARM[..]] {
            assert_eq!(seq.last(), Some(&Tone::END));
            assert!(seq[..seq.len() - 1].iter().all(|t| !t.is_end()));
        }
    }

    #[test]
    fn alarm_contains_a_rest() {
        assert!(SIREN_ALARM.iter().any(|t| t.period == 0 && t.duration > 0));
    }
}
