//! The chord engine: owns the key state, the card stack and the surface pool,
//! and turns raw input plus timer ticks into surface commands.
//!
//! Everything here runs on one logical thread. Each method runs to completion
//! before the next event or timer is dispatched, so a reconciliation pass is
//! never observed half-applied.

use std::time::Instant;

use crate::chord::{ChordSnapshot, ChordTracker, EntryId, PushOutcome, Stack};
use crate::config::OverlayConfig;
use crate::input::RawInputEvent;
use crate::layout::{self, Measure, MonitorSource};
use crate::window::{Assignment, SurfaceCommand, WindowPool, WindowSystem};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    pub shown: usize,
    pub commands: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct ChordEngine {
    config: OverlayConfig,
    tracker: ChordTracker,
    stack: Stack,
    pool: WindowPool,
    assignment: Assignment,
    suspended: bool,
}

impl ChordEngine {
    pub fn new(config: OverlayConfig, epoch: Instant) -> Self {
        let stack = Stack::from_config(&config, epoch);
        // One surface per row so the pool can never run dry while the cap holds.
        let pool = WindowPool::new(stack.max_size());
        Self {
            config,
            tracker: ChordTracker::new(),
            stack,
            pool,
            assignment: Assignment::default(),
            suspended: false,
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Entry -> slot mapping from the last reconciliation.
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Hide every card without dropping state. Input keeps being tracked.
    pub fn set_suspended(&mut self, suspended: bool) {
        if self.suspended != suspended {
            tracing::debug!(suspended, "overlay visibility toggled");
            self.suspended = suspended;
        }
    }

    pub fn toggle_suspended(&mut self) {
        self.set_suspended(!self.suspended);
    }

    /// Create every pooled surface. Safe to call again; creation is
    /// idempotent on the window-system side.
    pub fn create_surfaces<W: WindowSystem + ?Sized>(&self, windows: &mut W) {
        for slot in self.pool.slot_ids() {
            if let Err(err) = windows.create(slot) {
                tracing::warn!(%slot, %err, "failed to create card surface");
            }
        }
    }

    /// Fold one raw event into the key state and push the resulting chord.
    pub fn handle_input(&mut self, event: &RawInputEvent, now: Instant) -> PushOutcome {
        let snapshot: ChordSnapshot = self.tracker.apply(event);
        if snapshot.is_empty() {
            return PushOutcome::Ignored;
        }
        self.stack.push(&snapshot, self.tracker.state(), now)
    }

    /// Short-period sweep: refresh the newest card's press flags, then drop
    /// idle cards.
    pub fn refresh(&mut self, now: Instant) -> Vec<EntryId> {
        self.stack
            .refresh_top(now, self.tracker.state(), &self.config.sticky_labels);
        self.stack.tick(now)
    }

    /// Eviction-only sweep for the slower timer.
    pub fn evict(&mut self, now: Instant) -> Vec<EntryId> {
        self.stack.tick(now)
    }

    /// Lay out the live cards and push the result to the window system.
    ///
    /// Returns `None` when the monitor is unavailable; nothing changes and the
    /// next tick tries again.
    pub fn reconcile<W, S, M>(
        &mut self,
        windows: &mut W,
        monitor: &S,
        measure: &M,
    ) -> Option<ReconcileReport>
    where
        W: WindowSystem + ?Sized,
        S: MonitorSource + ?Sized,
        M: Measure + ?Sized,
    {
        let Some(primary) = monitor.primary_monitor() else {
            tracing::trace!("monitor unavailable; skipping layout");
            return None;
        };

        let commands = if self.suspended {
            self.assignment = Assignment::default();
            self.pool.release_all()
        } else {
            layout::layout(self.stack.entries_mut(), &primary, measure, &self.config);
            let rec = self.pool.reconcile(self.stack.entries());
            self.assignment = rec.assignment;
            rec.commands
        };
        Some(apply_commands(windows, commands))
    }

    /// Hide and clear every surface, e.g. before exit.
    pub fn shutdown<W: WindowSystem + ?Sized>(&mut self, windows: &mut W) -> ReconcileReport {
        self.assignment = Assignment::default();
        let commands = self.pool.release_all();
        apply_commands(windows, commands)
    }
}

fn apply_commands<W: WindowSystem + ?Sized>(
    windows: &mut W,
    commands: Vec<SurfaceCommand>,
) -> ReconcileReport {
    let mut report = ReconcileReport {
        commands: commands.len(),
        ..ReconcileReport::default()
    };
    for command in commands {
        let slot = command.slot();
        let is_show = matches!(command, SurfaceCommand::Show(_));
        match windows.apply(command) {
            Ok(()) => {
                if is_show {
                    report.shown += 1;
                }
            }
            Err(err) => {
                // Commands are re-issued every tick, so the next pass retries.
                tracing::warn!(%slot, %err, "surface command failed");
                report.failed += 1;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::KeyPress;
    use crate::layout::{Monitor, Position, Size};
    use crate::window::{SlotId, SlotMessage, SurfaceError};
    use std::collections::HashSet;
    use std::time::Duration;

    struct FixedMonitor(Option<Monitor>);

    impl MonitorSource for FixedMonitor {
        fn primary_monitor(&self) -> Option<Monitor> {
            self.0
        }
    }

    struct CharMeasure;

    impl Measure for CharMeasure {
        fn measure(&self, keys: &[KeyPress]) -> Option<Size> {
            let chars: usize = keys.iter().map(|k| k.label.len() + 2).sum();
            Some(Size::new(chars as u32, 3))
        }
    }

    #[derive(Default)]
    struct FakeWindows {
        created: HashSet<SlotId>,
        visible: HashSet<SlotId>,
        fail_show: bool,
    }

    impl WindowSystem for FakeWindows {
        fn create(&mut self, slot: SlotId) -> Result<(), SurfaceError> {
            self.created.insert(slot);
            Ok(())
        }
        fn set_position(&mut self, _: SlotId, _: Position) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn set_size(&mut self, _: SlotId, _: Size) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn show(&mut self, slot: SlotId) -> Result<(), SurfaceError> {
            if self.fail_show {
                return Err(SurfaceError::Backend("show refused".into()));
            }
            self.visible.insert(slot);
            Ok(())
        }
        fn hide(&mut self, slot: SlotId) -> Result<(), SurfaceError> {
            self.visible.remove(&slot);
            Ok(())
        }
        fn send_to_slot(&mut self, _: SlotId, _: SlotMessage) -> Result<(), SurfaceError> {
            Ok(())
        }
    }

    fn monitor() -> FixedMonitor {
        FixedMonitor(Some(Monitor {
            width: 120,
            height: 40,
            scale_factor: 1.0,
        }))
    }

    fn engine(t0: Instant) -> ChordEngine {
        let config = OverlayConfig {
            margin: 1,
            gap: 0,
            ..OverlayConfig::default()
        };
        ChordEngine::new(config, t0)
    }

    fn tap(engine: &mut ChordEngine, key: &str, now: Instant) {
        engine.handle_input(&RawInputEvent::key_press(key), now);
        engine.handle_input(&RawInputEvent::key_release(key), now);
    }

    #[test]
    fn creates_one_surface_per_stack_row() {
        let t0 = Instant::now();
        let engine = engine(t0);
        let mut windows = FakeWindows::default();
        engine.create_surfaces(&mut windows);
        assert_eq!(windows.created.len(), 6);
    }

    #[test]
    fn release_only_events_are_ignored() {
        let t0 = Instant::now();
        let mut engine = engine(t0);
        let outcome = engine.handle_input(&RawInputEvent::key_release("KeyA"), t0);
        assert_eq!(outcome, PushOutcome::Ignored);
        assert!(engine.stack().is_empty());
    }

    #[test]
    fn reconcile_shows_live_cards() {
        let t0 = Instant::now();
        let mut engine = engine(t0);
        let mut windows = FakeWindows::default();
        engine.create_surfaces(&mut windows);
        tap(&mut engine, "KeyA", t0);
        tap(&mut engine, "KeyB", t0);
        let report = engine
            .reconcile(&mut windows, &monitor(), &CharMeasure)
            .unwrap();
        assert_eq!(report.shown, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(windows.visible.len(), 2);
        assert_eq!(engine.assignment().len(), 2);
    }

    #[test]
    fn missing_monitor_skips_the_tick() {
        let t0 = Instant::now();
        let mut engine = engine(t0);
        let mut windows = FakeWindows::default();
        tap(&mut engine, "KeyA", t0);
        let report = engine.reconcile(&mut windows, &FixedMonitor(None), &CharMeasure);
        assert!(report.is_none());
        assert!(engine.assignment().is_empty());
    }

    #[test]
    fn failed_commands_are_counted_and_retried() {
        let t0 = Instant::now();
        let mut engine = engine(t0);
        let mut windows = FakeWindows {
            fail_show: true,
            ..FakeWindows::default()
        };
        engine.create_surfaces(&mut windows);
        tap(&mut engine, "KeyA", t0);
        let report = engine
            .reconcile(&mut windows, &monitor(), &CharMeasure)
            .unwrap();
        assert_eq!(report.failed, 1);
        assert!(windows.visible.is_empty());

        windows.fail_show = false;
        let report = engine
            .reconcile(&mut windows, &monitor(), &CharMeasure)
            .unwrap();
        assert_eq!(report.failed, 0);
        assert_eq!(windows.visible.len(), 1);
    }

    #[test]
    fn expired_cards_are_hidden_on_next_reconcile() {
        let t0 = Instant::now();
        let mut engine = engine(t0);
        let mut windows = FakeWindows::default();
        engine.create_surfaces(&mut windows);
        tap(&mut engine, "KeyA", t0);
        engine.reconcile(&mut windows, &monitor(), &CharMeasure);
        assert_eq!(windows.visible.len(), 1);

        let expired = engine.refresh(t0 + Duration::from_millis(3001));
        assert_eq!(expired.len(), 1);
        engine.reconcile(&mut windows, &monitor(), &CharMeasure);
        assert!(windows.visible.is_empty());
    }

    #[test]
    fn suspend_hides_everything_but_keeps_state() {
        let t0 = Instant::now();
        let mut engine = engine(t0);
        let mut windows = FakeWindows::default();
        engine.create_surfaces(&mut windows);
        tap(&mut engine, "KeyA", t0);
        engine.reconcile(&mut windows, &monitor(), &CharMeasure);
        engine.toggle_suspended();
        engine.reconcile(&mut windows, &monitor(), &CharMeasure);
        assert!(windows.visible.is_empty());
        assert_eq!(engine.stack().len(), 1);

        engine.toggle_suspended();
        engine.reconcile(&mut windows, &monitor(), &CharMeasure);
        assert_eq!(windows.visible.len(), 1);
    }

    #[test]
    fn shutdown_hides_all_slots() {
        let t0 = Instant::now();
        let mut engine = engine(t0);
        let mut windows = FakeWindows::default();
        engine.create_surfaces(&mut windows);
        tap(&mut engine, "KeyA", t0);
        engine.reconcile(&mut windows, &monitor(), &CharMeasure);
        let report = engine.shutdown(&mut windows);
        assert_eq!(report.commands, 12);
        assert!(windows.visible.is_empty());
    }
}
