use std::collections::{HashSet, VecDeque};

use crate::chord::{EntryId, StackEntry};
use crate::layout::{Position, Size};

use super::{CardContent, SlotId, SlotMessage, SurfaceCommand};

/// A pooled surface and the entry currently bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSlot {
    pub id: SlotId,
    pub bound: Option<EntryId>,
}

/// Live entry -> slot, in stack order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pairs: Vec<(EntryId, SlotId)>,
}

impl Assignment {
    pub fn get(&self, entry: &EntryId) -> Option<SlotId> {
        self.pairs
            .iter()
            .find_map(|(id, slot)| (id == entry).then_some(*slot))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntryId, SlotId)> {
        self.pairs.iter().map(|(id, slot)| (id, *slot))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn insert(&mut self, entry: EntryId, slot: SlotId) {
        self.pairs.push((entry, slot));
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub assignment: Assignment,
    pub commands: Vec<SurfaceCommand>,
    /// Entries left without a surface because the stack outgrew the pool.
    pub dropped: Vec<EntryId>,
}

/// Fixed set of reusable surfaces, one per stack row.
#[derive(Debug)]
pub struct WindowPool {
    slots: Vec<WindowSlot>,
}

impl WindowPool {
    pub fn new(size: usize) -> Self {
        Self {
            slots: (0..size)
                .map(|i| WindowSlot {
                    id: SlotId(i),
                    bound: None,
                })
                .collect(),
        }
    }

    pub fn slots(&self) -> &[WindowSlot] {
        &self.slots
    }

    pub fn slot_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.slots.iter().map(|s| s.id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bind `entries` (oldest first) to slots and emit the surface commands
    /// for this tick.
    ///
    /// A slot bound to an entry that is still live keeps it, so a card does
    /// not jump between surfaces as the stack shifts. New entries take the
    /// lowest free slot. Slots nobody claimed are hidden and cleared. An
    /// entry that could not be measured keeps its slot but stays hidden.
    pub fn reconcile(&mut self, entries: &[StackEntry]) -> Reconciliation {
        let mut out = Reconciliation::default();

        let capacity = self.slots.len();
        let displayed = if entries.len() > capacity {
            let cut = entries.len() - capacity;
            tracing::warn!(
                live = entries.len(),
                pool = capacity,
                "stack outgrew the surface pool; dropping oldest cards from display"
            );
            out.dropped = entries[..cut].iter().map(|e| e.id.clone()).collect();
            &entries[cut..]
        } else {
            entries
        };

        let live: HashSet<&EntryId> = displayed.iter().map(|e| &e.id).collect();
        let mut free: VecDeque<usize> = VecDeque::new();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let reusable = slot.bound.as_ref().is_some_and(|id| live.contains(id));
            if !reusable {
                slot.bound = None;
                free.push_back(idx);
            }
        }

        let newest = displayed.last().map(|e| &e.id);
        for entry in displayed {
            let idx = match self.slots.iter().position(|s| s.bound.as_ref() == Some(&entry.id)) {
                Some(idx) => idx,
                None => match free.pop_front() {
                    Some(idx) => {
                        tracing::debug!(
                            entry = %entry.id,
                            slot = %self.slots[idx].id,
                            "bound card to slot"
                        );
                        self.slots[idx].bound = Some(entry.id.clone());
                        idx
                    }
                    None => {
                        tracing::warn!(entry = %entry.id, "no free surface for card");
                        out.dropped.push(entry.id.clone());
                        continue;
                    }
                },
            };
            let slot = self.slots[idx].id;
            out.assignment.insert(entry.id.clone(), slot);
            out.commands.push(SurfaceCommand::Send {
                slot,
                message: SlotMessage::Update(CardContent {
                    entry: entry.id.clone(),
                    keys: entry.keys.clone(),
                    emphasize: Some(&entry.id) == newest,
                }),
            });
            if entry.is_measured() {
                out.commands.push(SurfaceCommand::SetSize {
                    slot,
                    size: Size::new(entry.w, entry.h),
                });
                out.commands.push(SurfaceCommand::SetPosition {
                    slot,
                    position: Position {
                        x: entry.x,
                        y: entry.y,
                    },
                });
                out.commands.push(SurfaceCommand::Show(slot));
            } else {
                out.commands.push(SurfaceCommand::Hide(slot));
            }
        }

        for idx in free {
            let slot = self.slots[idx].id;
            out.commands.push(SurfaceCommand::Hide(slot));
            out.commands.push(SurfaceCommand::Send {
                slot,
                message: SlotMessage::Clear,
            });
        }
        out
    }

    /// Unbind every slot and emit hide/clear for all of them.
    pub fn release_all(&mut self) -> Vec<SurfaceCommand> {
        let mut commands = Vec::with_capacity(self.slots.len() * 2);
        for slot in &mut self.slots {
            slot.bound = None;
            commands.push(SurfaceCommand::Hide(slot.id));
            commands.push(SurfaceCommand::Send {
                slot: slot.id,
                message: SlotMessage::Clear,
            });
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::{ChordTracker, Stack};
    use crate::input::RawInputEvent;
    use std::time::{Duration, Instant};

    fn type_keys(stack: &mut Stack, tracker: &mut ChordTracker, keys: &[&str], now: Instant) {
        for key in keys {
            let s = tracker.apply(&RawInputEvent::key_press(*key));
            stack.push(&s, tracker.state(), now);
            tracker.apply(&RawInputEvent::key_release(*key));
        }
        for entry in stack.entries_mut() {
            entry.w = 10;
            entry.h = 3;
        }
    }

    fn slots_of(rec: &Reconciliation) -> Vec<usize> {
        rec.assignment.iter().map(|(_, s)| s.0).collect()
    }

    #[test]
    fn new_entries_take_lowest_free_slots() {
        let t0 = Instant::now();
        let mut stack = Stack::new(6, Duration::from_secs(3), t0);
        let mut tracker = ChordTracker::new();
        type_keys(&mut stack, &mut tracker, &["KeyA", "KeyB", "KeyC"], t0);
        let mut pool = WindowPool::new(6);
        let rec = pool.reconcile(stack.entries());
        assert_eq!(slots_of(&rec), vec![0, 1, 2]);
        // three free slots get hide + clear
        let hides = rec
            .commands
            .iter()
            .filter(|c| matches!(c, SurfaceCommand::Hide(_)))
            .count();
        assert_eq!(hides, 3);
    }

    #[test]
    fn live_entries_keep_their_slot_when_the_stack_shifts() {
        let t0 = Instant::now();
        let mut stack = Stack::new(3, Duration::from_secs(3), t0);
        let mut tracker = ChordTracker::new();
        type_keys(&mut stack, &mut tracker, &["KeyA", "KeyB", "KeyC"], t0);
        let mut pool = WindowPool::new(3);
        let first = pool.reconcile(stack.entries());

        // "A" is evicted by capacity; "B" and "C" must not move.
        type_keys(&mut stack, &mut tracker, &["KeyD"], t0);
        let second = pool.reconcile(stack.entries());
        for (id, slot) in second.assignment.iter() {
            if let Some(prev) = first.assignment.get(id) {
                assert_eq!(prev, slot, "entry {id} moved");
            }
        }
        let d = &stack.entries()[2].id;
        assert_eq!(second.assignment.get(d), Some(SlotId(0)));
    }

    #[test]
    fn only_the_newest_card_is_emphasized() {
        let t0 = Instant::now();
        let mut stack = Stack::new(6, Duration::from_secs(3), t0);
        let mut tracker = ChordTracker::new();
        type_keys(&mut stack, &mut tracker, &["KeyA", "KeyB"], t0);
        let mut pool = WindowPool::new(6);
        let rec = pool.reconcile(stack.entries());
        let flags: Vec<bool> = rec
            .commands
            .iter()
            .filter_map(|c| match c {
                SurfaceCommand::Send {
                    message: SlotMessage::Update(content),
                    ..
                } => Some(content.emphasize),
                _ => None,
            })
            .collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn assigned_slot_commands_follow_update_size_position_show() {
        let t0 = Instant::now();
        let mut stack = Stack::new(1, Duration::from_secs(3), t0);
        let mut tracker = ChordTracker::new();
        type_keys(&mut stack, &mut tracker, &["KeyA"], t0);
        let mut pool = WindowPool::new(1);
        let rec = pool.reconcile(stack.entries());
        assert!(matches!(rec.commands[0], SurfaceCommand::Send { .. }));
        assert!(matches!(rec.commands[1], SurfaceCommand::SetSize { .. }));
        assert!(matches!(rec.commands[2], SurfaceCommand::SetPosition { .. }));
        assert_eq!(rec.commands[3], SurfaceCommand::Show(SlotId(0)));
        assert_eq!(rec.commands.len(), 4);
    }

    #[test]
    fn unmeasured_entry_is_bound_but_hidden() {
        let t0 = Instant::now();
        let mut stack = Stack::new(6, Duration::from_secs(3), t0);
        let mut tracker = ChordTracker::new();
        type_keys(&mut stack, &mut tracker, &["KeyA"], t0);
        stack.entries_mut()[0].w = 0;
        let mut pool = WindowPool::new(2);
        let rec = pool.reconcile(stack.entries());
        assert_eq!(rec.assignment.len(), 1);
        assert!(rec.commands.contains(&SurfaceCommand::Hide(SlotId(0))));
        assert!(!rec.commands.contains(&SurfaceCommand::Show(SlotId(0))));
    }

    #[test]
    fn oversized_stack_drops_oldest_from_display() {
        let t0 = Instant::now();
        let mut stack = Stack::new(4, Duration::from_secs(3), t0);
        let mut tracker = ChordTracker::new();
        type_keys(&mut stack, &mut tracker, &["KeyA", "KeyB", "KeyC", "KeyD"], t0);
        let mut pool = WindowPool::new(2);
        let rec = pool.reconcile(stack.entries());
        assert_eq!(rec.assignment.len(), 2);
        let dropped: Vec<&str> = rec.dropped.iter().map(|id| id.chord()).collect();
        assert_eq!(dropped, vec!["A", "B"]);
    }

    #[test]
    fn release_all_frees_every_slot() {
        let t0 = Instant::now();
        let mut stack = Stack::new(6, Duration::from_secs(3), t0);
        let mut tracker = ChordTracker::new();
        type_keys(&mut stack, &mut tracker, &["KeyA"], t0);
        let mut pool = WindowPool::new(3);
        pool.reconcile(stack.entries());
        let commands = pool.release_all();
        assert_eq!(commands.len(), 6);
        assert!(pool.slots().iter().all(|s| s.bound.is_none()));
    }
}
