use crate::drivers::utils::keyboard_normalizer::{label, priority};
use crate::input::RawInputEvent;

use super::KeyPress;

pub const WHEEL_UP: &str = "WheelUp";
pub const WHEEL_DOWN: &str = "WheelDown";

/// Press flag per display label, in first-seen order.
///
/// First-seen order is the tie-break when two labels share a priority, so the
/// rendering order of a chord stays stable across events.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyState {
    keys: Vec<(String, bool)>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, label: &str, pressed: bool) {
        if let Some(slot) = self.keys.iter_mut().find(|(l, _)| l == label) {
            slot.1 = pressed;
        } else {
            self.keys.push((label.to_string(), pressed));
        }
    }

    pub fn is_pressed(&self, label: &str) -> bool {
        self.keys.iter().any(|(l, pressed)| *pressed && l == label)
    }

    pub fn any_pressed<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> bool {
        labels.into_iter().any(|l| self.is_pressed(l))
    }

    /// Pressed labels sorted by descending priority, ties in first-seen order.
    pub fn snapshot(&self) -> ChordSnapshot {
        let mut keys: Vec<KeyPress> = self
            .keys
            .iter()
            .filter(|(_, pressed)| *pressed)
            .map(|(l, _)| KeyPress::new(l.clone(), true))
            .collect();
        // `sort_by_key` is stable.
        keys.sort_by_key(|k| -priority(&k.label));
        ChordSnapshot { keys }
    }
}

/// The chord derived from `KeyState` after one event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChordSnapshot {
    keys: Vec<KeyPress>,
}

impl ChordSnapshot {
    pub fn keys(&self) -> &[KeyPress] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.label.as_str())
    }

    /// Labels joined with single spaces, e.g. `"Ctrl Shift A"`.
    pub fn joined(&self) -> String {
        super::join_labels(&self.keys)
    }

    /// True when every label of this chord already appears in `keys`.
    pub fn is_subset_of(&self, keys: &[KeyPress]) -> bool {
        self.labels()
            .all(|l| keys.iter().any(|other| other.label == l))
    }
}

/// Derives the current chord from the raw event stream.
#[derive(Debug, Default)]
pub struct ChordTracker {
    state: KeyState,
}

impl ChordTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &KeyState {
        &self.state
    }

    /// Fold one raw event into the key state and return the resulting chord.
    ///
    /// The wheel labels are pulses: they are cleared before every event and
    /// only a `Wheel` event sets one of them.
    pub fn apply(&mut self, event: &RawInputEvent) -> ChordSnapshot {
        self.state.set(WHEEL_UP, false);
        self.state.set(WHEEL_DOWN, false);
        match event {
            RawInputEvent::ButtonPress(id) | RawInputEvent::KeyPress(id) => {
                self.state.set(&label(id), true);
            }
            RawInputEvent::ButtonRelease(id) | RawInputEvent::KeyRelease(id) => {
                self.state.set(&label(id), false);
            }
            RawInputEvent::Wheel { delta_y, .. } => {
                let up = *delta_y >= 0.0;
                self.state.set(WHEEL_UP, up);
                self.state.set(WHEEL_DOWN, !up);
            }
        }
        self.state.snapshot()
    }
}
