//! Tone sequencer driven by the 1 ms hardware tick.
//!
//! ```text
//!   main loop                      tick handler (1 ms)
//!   ─────────                      ───────────────────
//!   Beeper::play() ──▶ SoundHandoff ──▶ SoundSequencer::tick() ──▶ ToneOutput
//! ```
//!
//! The main loop never touches sequencer state.  A request is a single
//! value written into [`SoundHandoff`] inside a critical section; the tick
//! handler takes it the same way at the start of its next tick, so the
//! sequencer cannot observe a half-written request.
//!
//! Sequencer states per tick:
//!
//! | State         | Action                                              |
//! |---------------|-----------------------------------------------------|
//! | `StartNew`    | rewind to the first entry (or `DoBeep` for a beep)  |
//! | `DoBeep`      | load the single beep tone                           |
//! | `GetNextTone` | read the next entry                                 |
//! | `ApplyTone`   | sentinel: silence and go `Off`; else program output |
//! | `Play`        | count down, then `GetNextTone`                      |
//!
//! The two bookkeeping ticks between one `ApplyTone` and the next are
//! taken out of the countdown, so an entry with duration `d` keeps the
//! output programmed for exactly `d * TONE_DURATION_SCALE` ticks.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Ticks per duration unit (10 ms at a 1 ms tick).
pub const TONE_DURATION_SCALE: u16 = 10;
/// Tone generator clock; a period is expressed in its cycles (8 µs).
pub const TONE_CLOCK_HZ: u32 = 125_000;

/// Ticks spent in `GetNextTone` + `ApplyTone` between two tones.
const STEP_OVERHEAD: u16 = 2;

/// One entry of a tone sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    /// Tone period in tone-clock cycles.  0 is a rest.
    pub period: u16,
    /// Duration in `TONE_DURATION_SCALE` tick units.  0 ends the sequence.
    pub duration: u16,
}

impl Tone {
    /// Sequence terminator.
    pub const END: Self = Self {
        period: 0,
        duration: 0,
    };

    /// A tone of `freq_hz` lasting `ms` milliseconds.
    pub const fn new(freq_hz: u32, ms: u16) -> Self {
        Self {
            period: period_for(freq_hz),
            duration: ms / TONE_DURATION_SCALE,
        }
    }

    /// Silence lasting `ms` milliseconds.
    pub const fn rest(ms: u16) -> Self {
        Self {
            period: 0,
            duration: ms / TONE_DURATION_SCALE,
        }
    }

    pub const fn is_end(self) -> bool {
        self.duration == 0
    }
}

/// Tone-clock period for a frequency.  0 Hz maps to silence.
pub const fn period_for(freq_hz: u32) -> u16 {
    if freq_hz == 0 {
        return 0;
    }
    let p = TONE_CLOCK_HZ / freq_hz;
    if p > u16::MAX as u32 { u16::MAX } else { p as u16 }
}

/// What to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundRequest {
    /// A stored sequence terminated by [`Tone::END`].
    Melody(&'static [Tone]),
    /// A single tone.
    Beep(Tone),
}

impl SoundRequest {
    pub const fn beep(freq_hz: u32, ms: u16) -> Self {
        Self::Beep(Tone::new(freq_hz, ms))
    }
}

/// Message from the main loop to the tick handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCommand {
    Play(SoundRequest),
    Stop,
}

/// Hardware tone generator.
pub trait ToneOutput {
    /// Program the generator.  `period == 0` silences it.
    fn set_period(&mut self, period: u16);
}

// ───────────────────────────────────────────────────────────────
// Handoff cell
// ───────────────────────────────────────────────────────────────

/// Single-slot mailbox between the main loop and the tick handler.  A newer
/// request overwrites an untaken older one.
pub struct SoundHandoff {
    slot: Mutex<CriticalSectionRawMutex, Cell<Option<SoundCommand>>>,
}

impl SoundHandoff {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    pub fn post(&self, command: SoundCommand) {
        self.slot.lock(|slot| slot.set(Some(command)));
    }

    pub fn take(&self) -> Option<SoundCommand> {
        self.slot.lock(Cell::take)
    }
}

impl Default for SoundHandoff {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Sequencer (tick side)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundState {
    Off,
    StartNew,
    DoBeep,
    GetNextTone,
    ApplyTone,
    Play,
}

pub struct SoundSequencer {
    state: SoundState,
    melody: &'static [Tone],
    beep: Option<Tone>,
    index: usize,
    current: Tone,
    countdown: u16,
}

impl Default for SoundSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundSequencer {
    pub const fn new() -> Self {
        Self {
            state: SoundState::Off,
            melody: &[],
            beep: None,
            index: 0,
            current: Tone::END,
            countdown: 0,
        }
    }

    pub fn state(&self) -> SoundState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state != SoundState::Off
    }

    /// Accept a command, abandoning whatever was playing.
    pub fn apply(&mut self, command: SoundCommand, out: &mut impl ToneOutput) {
        match command {
            SoundCommand::Play(SoundRequest::Melody(melody)) => {
                self.melody = melody;
                self.beep = None;
                self.state = SoundState::StartNew;
            }
            SoundCommand::Play(SoundRequest::Beep(tone)) => {
                self.melody = &[];
                self.beep = Some(tone);
                self.state = SoundState::StartNew;
            }
            SoundCommand::Stop => {
                out.set_period(0);
                self.state = SoundState::Off;
            }
        }
    }

    /// Advance one tick.
    pub fn tick(&mut self, out: &mut impl ToneOutput) {
        match self.state {
            SoundState::Off => {}
            SoundState::StartNew => {
                self.index = 0;
                self.state = if self.beep.is_some() {
                    SoundState::DoBeep
                } else {
                    SoundState::GetNextTone
                };
            }
            SoundState::DoBeep => {
                self.current = self.beep.take().unwrap_or(Tone::END);
                self.state = SoundState::ApplyTone;
            }
            SoundState::GetNextTone => {
                // A slice without its sentinel still terminates.
                self.current = self.melody.get(self.index).copied().unwrap_or(Tone::END);
                self.index += 1;
                self.state = SoundState::ApplyTone;
            }
            SoundState::ApplyTone => {
                if self.current.is_end() {
                    out.set_period(0);
                    self.state = SoundState::Off;
                } else {
                    out.set_period(self.current.period);
                    self.countdown = self
                        .current
                        .duration
                        .saturating_mul(TONE_DURATION_SCALE)
                        .saturating_sub(STEP_OVERHEAD)
                        .max(1);
                    self.state = SoundState::Play;
                }
            }
            SoundState::Play => {
                self.countdown = self.countdown.saturating_sub(1);
                if self.countdown == 0 {
                    self.state = SoundState::GetNextTone;
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Beeper (main-loop side)
// ───────────────────────────────────────────────────────────────

/// Main-loop front end of the sequencer.  Honours the user's sound setting
/// unless the next request is forced.
pub struct Beeper {
    handoff: &'static SoundHandoff,
    enabled: bool,
    force_next: bool,
}

impl Beeper {
    pub fn new(handoff: &'static SoundHandoff, enabled: bool) -> Self {
        Self {
            handoff,
            enabled,
            force_next: false,
        }
    }

    /// Track the user's sound setting.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Let the next [`play`](Self::play) through regardless of the sound
    /// setting.  Cleared by that call.
    pub fn override_mute(&mut self) {
        self.force_next = true;
    }

    /// Request playback.  Returns whether it was accepted.
    pub fn play(&mut self, request: SoundRequest) -> bool {
        let accepted = self.enabled || self.force_next;
        self.force_next = false;
        if accepted {
            self.handoff.post(SoundCommand::Play(request));
        }
        accepted
    }

    /// Play a safety alarm; ignores the sound setting.
    pub fn play_forced(&mut self, request: SoundRequest) {
        self.override_mute();
        self.play(request);
    }

    pub fn stop(&mut self) {
        self.handoff.post(SoundCommand::Stop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every programmed period with the tick it happened on.
    #[derive(Default)]
    struct Recorder {
        now: u32,
        writes: Vec<(u32, u16)>,
    }

    impl ToneOutput for Recorder {
        fn set_period(&mut self, period: u16) {
            self.writes.push((self.now, period));
        }
    }

    fn run(seq: &mut SoundSequencer, out: &mut Recorder, ticks: u32) {
        for _ in 0..ticks {
            seq.tick(out);
            out.now += 1;
        }
    }

    static TWO_TONES: [Tone; 3] = [
        Tone {
            period: 125,
            duration: 3,
        },
        Tone {
            period: 250,
            duration: 5,
        },
        Tone::END,
    ];

    #[test]
    fn two_entry_sequence_timing() {
        let mut seq = SoundSequencer::new();
        let mut out = Recorder::default();
        seq.apply(SoundCommand::Play(SoundRequest::Melody(&TWO_TONES)), &mut out);
        run(&mut seq, &mut out, 200);

        assert_eq!(out.writes.len(), 3);
        let (t1, p1) = out.writes[0];
        let (t2, p2) = out.writes[1];
        let (t3, p3) = out.writes[2];
        assert_eq!((p1, p2, p3), (125, 250, 0));
        assert_eq!(t2 - t1, 3 * u32::from(TONE_DURATION_SCALE));
        assert_eq!(t3 - t2, 5 * u32::from(TONE_DURATION_SCALE));
        assert_eq!(seq.state(), SoundState::Off);
    }

    #[test]
    fn replay_abandons_previous_sequence() {
        static OTHER: [Tone; 2] = [
            Tone {
                period: 99,
                duration: 1,
            },
            Tone::END,
        ];
        let mut seq = SoundSequencer::new();
        let mut out = Recorder::default();
        seq.apply(SoundCommand::Play(SoundRequest::Melody(&TWO_TONES)), &mut out);
        run(&mut seq, &mut out, 10);
        seq.apply(SoundCommand::Play(SoundRequest::Melody(&OTHER)), &mut out);
        assert_eq!(seq.state(), SoundState::StartNew);
        run(&mut seq, &mut out, 100);

        let periods: Vec<u16> = out.writes.iter().map(|w| w.1).collect();
        assert_eq!(periods, vec![125, 99, 0]);
    }

    #[test]
    fn beep_plays_single_tone() {
        let mut seq = SoundSequencer::new();
        let mut out = Recorder::default();
        seq.apply(SoundCommand::Play(SoundRequest::beep(1000, 50)), &mut out);
        run(&mut seq, &mut out, 100);
        assert_eq!(out.writes, vec![(2, 125), (52, 0)]);
    }

    #[test]
    fn rest_is_silent_but_timed() {
        static WITH_REST: [Tone; 3] = [Tone::rest(30), Tone::new(500, 20), Tone::END];
        let mut seq = SoundSequencer::new();
        let mut out = Recorder::default();
        seq.apply(SoundCommand::Play(SoundRequest::Melody(&WITH_REST)), &mut out);
        run(&mut seq, &mut out, 100);
        assert_eq!(out.writes, vec![(2, 0), (32, 250), (52, 0)]);
    }

    #[test]
    fn stop_silences_immediately() {
        let mut seq = SoundSequencer::new();
        let mut out = Recorder::default();
        seq.apply(SoundCommand::Play(SoundRequest::Melody(&TWO_TONES)), &mut out);
        run(&mut seq, &mut out, 5);
        seq.apply(SoundCommand::Stop, &mut out);
        assert!(!seq.is_playing());
        assert_eq!(out.writes.last().map(|w| w.1), Some(0));
    }

    #[test]
    fn muted_beeper_drops_requests_unless_forced() {
        static HANDOFF: SoundHandoff = SoundHandoff::new();
        let mut beeper = Beeper::new(&HANDOFF, false);
        assert!(!beeper.play(SoundRequest::beep(1000, 50)));
        assert_eq!(HANDOFF.take(), None);

        beeper.play_forced(SoundRequest::beep(1500, 500));
        assert_eq!(
            HANDOFF.take(),
            Some(SoundCommand::Play(SoundRequest::beep(1500, 500)))
        );
        // Override was consumed.
        assert!(!beeper.play(SoundRequest::beep(1000, 50)));
    }

    #[test]
    fn frequency_to_period() {
        assert_eq!(period_for(1000), 125);
        assert_eq!(period_for(0), 0);
        assert_eq!(period_for(1), u16::MAX);
    }
}
