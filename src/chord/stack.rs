use std::fmt;
use std::time::{Duration, Instant};

use crate::config::OverlayConfig;

use super::{ChordSnapshot, KeyPress, KeyState, join_labels};

/// Identity of one stack entry.
///
/// Built from the chord's joined labels and its creation time relative to the
/// stack epoch. The sequence number keeps two occurrences of the same chord
/// distinct even when they are created within the same millisecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    chord: String,
    created_ms: u64,
    seq: u64,
}

impl EntryId {
    pub fn chord(&self) -> &str {
        &self.chord
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}#{}", self.chord, self.created_ms, self.seq)
    }
}

/// A chord card: its keys, timestamps and the geometry assigned by layout.
#[derive(Debug, Clone, PartialEq)]
pub struct StackEntry {
    pub id: EntryId,
    pub keys: Vec<KeyPress>,
    pub created_at: Instant,
    pub last_activity_at: Instant,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl StackEntry {
    pub fn joined(&self) -> String {
        join_labels(&self.keys)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.label.as_str())
    }

    /// Idle strictly longer than `max_live_time` at `now`.
    pub fn is_expired(&self, now: Instant, max_live_time: Duration) -> bool {
        now.saturating_duration_since(self.last_activity_at) > max_live_time
    }

    /// Layout produced a non-empty size, so the card can be shown.
    pub fn is_measured(&self) -> bool {
        self.w > 0 && self.h > 0
    }

    fn sync_press_flags(&mut self, state: &KeyState) {
        for key in &mut self.keys {
            key.pressed = state.is_pressed(&key.label);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// A new entry was appended.
    Created(EntryId),
    /// The chord was folded into the newest entry.
    Merged(EntryId),
    /// Empty chords are never displayed.
    Ignored,
}

/// Bounded, time-decaying sequence of chord entries, oldest first.
#[derive(Debug)]
pub struct Stack {
    entries: Vec<StackEntry>,
    max_size: usize,
    max_live_time: Duration,
    epoch: Instant,
    next_seq: u64,
}

impl Stack {
    pub fn new(max_size: usize, max_live_time: Duration, epoch: Instant) -> Self {
        Self {
            entries: Vec::with_capacity(max_size + 1),
            max_size: max_size.max(1),
            max_live_time,
            epoch,
            next_seq: 0,
        }
    }

    pub fn from_config(config: &OverlayConfig, epoch: Instant) -> Self {
        Self::new(config.stack_max_size, config.max_live_time, epoch)
    }

    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [StackEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The newest entry; the only one that receives live press updates.
    pub fn top(&self) -> Option<&StackEntry> {
        self.entries.last()
    }

    /// Record a chord at `now`.
    ///
    /// The chord merges into the newest entry when it has the same labels or
    /// only labels that entry already shows (a partial release). Otherwise a
    /// new entry is appended and the oldest entries are dropped until the cap
    /// holds again.
    pub fn push(
        &mut self,
        snapshot: &ChordSnapshot,
        state: &KeyState,
        now: Instant,
    ) -> PushOutcome {
        if snapshot.is_empty() {
            return PushOutcome::Ignored;
        }

        if let Some(top) = self.entries.last_mut() {
            let same = top.joined() == snapshot.joined();
            if same || snapshot.is_subset_of(&top.keys) {
                top.last_activity_at = now;
                top.sync_press_flags(state);
                return PushOutcome::Merged(top.id.clone());
            }
        }

        let entry = self.new_entry(snapshot, now);
        let id = entry.id.clone();
        tracing::debug!(entry = %id, "chord entry created");
        self.entries.push(entry);

        if self.entries.len() > self.max_size {
            let excess = self.entries.len() - self.max_size;
            for evicted in self.entries.drain(..excess) {
                tracing::debug!(entry = %evicted.id, "chord entry evicted by capacity");
            }
        }
        PushOutcome::Created(id)
    }

    /// Remove every entry idle for longer than the live time. Returns the ids
    /// that were removed, oldest first.
    pub fn tick(&mut self, now: Instant) -> Vec<EntryId> {
        let max_live_time = self.max_live_time;
        let mut expired = Vec::new();
        self.entries.retain(|entry| {
            if entry.is_expired(now, max_live_time) {
                expired.push(entry.id.clone());
                false
            } else {
                true
            }
        });
        for id in &expired {
            tracing::debug!(entry = %id, "chord entry expired");
        }
        expired
    }

    /// Copy the current press state into the newest entry.
    ///
    /// When one of `sticky` is still held the entry's activity time is
    /// refreshed too, so a held mouse button keeps its card alive. Returns
    /// true when that happened.
    pub fn refresh_top<S: AsRef<str>>(
        &mut self,
        now: Instant,
        state: &KeyState,
        sticky: &[S],
    ) -> bool {
        let Some(top) = self.entries.last_mut() else {
            return false;
        };
        top.sync_press_flags(state);
        let held = state.any_pressed(sticky.iter().map(|s| s.as_ref()));
        if held {
            top.last_activity_at = now;
        }
        held
    }

    fn new_entry(&mut self, snapshot: &ChordSnapshot, now: Instant) -> StackEntry {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        let created_ms = now.saturating_duration_since(self.epoch).as_millis() as u64;
        StackEntry {
            id: EntryId {
                chord: snapshot.joined(),
                created_ms,
                seq,
            },
            keys: snapshot.keys().to_vec(),
            created_at: now,
            last_activity_at: now,
            x: 0,
            y: 0,
            w: 0,
            h: 0,
        }
    }
}
