//! Chord tracking and the time-decaying card stack.

pub mod stack;
pub mod tracker;

pub use stack::{EntryId, PushOutcome, Stack, StackEntry};
pub use tracker::{ChordSnapshot, ChordTracker, KeyState, WHEEL_DOWN, WHEEL_UP};

/// One label of a chord and whether it is currently held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub label: String,
    pub pressed: bool,
}

impl KeyPress {
    pub fn new(label: impl Into<String>, pressed: bool) -> Self {
        Self {
            label: label.into(),
            pressed,
        }
    }
}

pub(crate) fn join_labels(keys: &[KeyPress]) -> String {
    keys.iter()
        .map(|k| k.label.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
