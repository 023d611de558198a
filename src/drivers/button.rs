//! Front-panel button debouncer.
//!
//! Sampled once per coarse cycle from the main loop.  Each button runs its
//! own small state machine over the raw (active) level:
//!
//! | Gesture        | Condition                                   | Edge set         |
//! |----------------|---------------------------------------------|------------------|
//! | Press          | level stable for `DEBOUNCE_CYCLES` samples  | `pressed`        |
//! | Short release  | released before `LONG_HOLD_CYCLES`          | `released_short` |
//! | Long hold      | held `LONG_HOLD_CYCLES` or more (level)     | `long_held`      |
//!
//! A release after a long hold produces no edge.

use crate::control::context::{ButtonEdges, ButtonSet};

/// Consecutive equal samples before a level change is accepted.
const DEBOUNCE_CYCLES: u8 = 2;
/// Hold time (coarse cycles) that turns a press into a long hold.
pub const LONG_HOLD_CYCLES: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    DebounceWait { samples: u8 },
    Pressed { held: u16 },
    ReleaseWait { held: u16, samples: u8 },
}

pub struct ButtonDebouncer {
    states: [GestureState; ButtonSet::ALL.len()],
}

impl Default for ButtonDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonDebouncer {
    pub fn new() -> Self {
        Self {
            states: [GestureState::Idle; ButtonSet::ALL.len()],
        }
    }

    /// Feed one sample of the raw button levels and return this cycle's
    /// edges.
    pub fn sample(&mut self, raw: ButtonSet) -> ButtonEdges {
        let mut edges = ButtonEdges::default();
        for (state, button) in self.states.iter_mut().zip(ButtonSet::ALL) {
            let down = raw.contains(button);
            *state = match *state {
                GestureState::Idle if down => {
                    Self::debounced(GestureState::DebounceWait { samples: 1 }, button, &mut edges)
                }
                GestureState::Idle => GestureState::Idle,
                GestureState::DebounceWait { samples } if down => Self::debounced(
                    GestureState::DebounceWait { samples: samples + 1 },
                    button,
                    &mut edges,
                ),
                GestureState::DebounceWait { .. } => GestureState::Idle,
                GestureState::Pressed { held } if down => GestureState::Pressed {
                    held: held.saturating_add(1),
                },
                GestureState::Pressed { held } => {
                    Self::released(GestureState::ReleaseWait { held, samples: 1 }, button, &mut edges)
                }
                GestureState::ReleaseWait { held, .. } if down => GestureState::Pressed {
                    held: held.saturating_add(1),
                },
                GestureState::ReleaseWait { held, samples } => Self::released(
                    GestureState::ReleaseWait {
                        held,
                        samples: samples + 1,
                    },
                    button,
                    &mut edges,
                ),
            };
            if let GestureState::Pressed { held } | GestureState::ReleaseWait { held, .. } = *state {
                edges.held.insert(button);
                if held >= LONG_HOLD_CYCLES {
                    edges.long_held.insert(button);
                }
            }
        }
        edges
    }

    fn debounced(next: GestureState, button: ButtonSet, edges: &mut ButtonEdges) -> GestureState {
        match next {
            GestureState::DebounceWait { samples } if samples >= DEBOUNCE_CYCLES => {
                edges.pressed.insert(button);
                GestureState::Pressed { held: 0 }
            }
            other => other,
        }
    }

    fn released(next: GestureState, button: ButtonSet, edges: &mut ButtonEdges) -> GestureState {
        match next {
            GestureState::ReleaseWait { held, samples } if samples >= DEBOUNCE_CYCLES => {
                if held < LONG_HOLD_CYCLES {
                    edges.released_short.insert(button);
                }
                GestureState::Idle
            }
            other => other,
        }
    }
}

/// Read the five button inputs (active low).
#[cfg(target_os = "espidf")]
pub fn read_raw() -> ButtonSet {
    use crate::drivers::hw_init::gpio_read;
    use crate::pins;

    let mut raw = ButtonSet::NONE;
    for (pin, button) in [
        pins::BUTTON_FORWARD_GPIO,
        pins::BUTTON_REVERSE_GPIO,
        pins::BUTTON_CYCLE_GPIO,
        pins::BUTTON_MENU_GPIO,
        pins::BUTTON_HEAT_GPIO,
    ]
    .into_iter()
    .zip(ButtonSet::ALL)
    {
        if !gpio_read(pin) {
            raw.insert(button);
        }
    }
    raw
}
