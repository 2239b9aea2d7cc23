use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chord_overlay::chord::{EntryId, PushOutcome};
use chord_overlay::config::OverlayConfig;
use chord_overlay::engine::ChordEngine;
use chord_overlay::input::RawInputEvent;
use chord_overlay::layout::{EstimatedMeasure, Monitor, MonitorSource, Position, Size};
use chord_overlay::window::{SlotId, SlotMessage, SurfaceError, WindowSystem};
use clap::Parser;

const KEYS: [&str; 16] = [
    "KeyA", "KeyS", "KeyD", "KeyF", "KeyJ", "KeyK", "Num1", "Num2", "Space", "Return",
    "UpArrow", "Kp5", "Slash", "Tab", "Escape", "F5",
];
const MODIFIERS: [&str; 4] = ["ControlLeft", "ShiftLeft", "Alt", "MetaLeft"];
const BUTTONS: [&str; 3] = ["Left", "Right", "Middle"];

#[derive(Parser, Debug)]
#[command(
    name = "chord-bench",
    version = env!("CARGO_PKG_VERSION"),
    about = "Replay synthetic input through the chord engine and report throughput"
)]
struct BenchCli {
    /// Number of raw input events to replay.
    #[arg(short = 'n', long = "events", value_name = "COUNT", default_value_t = 200_000)]
    events: u64,

    /// Simulated time between two input events.
    #[arg(long = "step-ms", value_name = "MS", default_value_t = 35)]
    step_ms: u64,

    /// Seed for the event generator. Defaults to the clock.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Number of cards kept on screen.
    #[arg(long = "stack-size", value_name = "N", default_value_t = 6)]
    stack_size: usize,
}

struct BenchConfig {
    events: u64,
    step: Duration,
    seed: u64,
    overlay: OverlayConfig,
}

impl TryFrom<&BenchCli> for BenchConfig {
    type Error = String;

    fn try_from(cli: &BenchCli) -> Result<Self, Self::Error> {
        if !(1..=50_000_000).contains(&cli.events) {
            return Err("events must be between 1 and 50,000,000".to_string());
        }
        if !(1..=10_000).contains(&cli.step_ms) {
            return Err("step must be between 1 and 10,000 ms".to_string());
        }
        let overlay = OverlayConfig {
            stack_max_size: cli.stack_size,
            ..OverlayConfig::default()
        };
        overlay.validate().map_err(|err| err.to_string())?;
        Ok(Self {
            events: cli.events,
            step: Duration::from_millis(cli.step_ms),
            seed: cli.seed.unwrap_or_else(seed_from_clock),
            overlay,
        })
    }
}

fn main() -> io::Result<()> {
    let args = BenchCli::parse();
    let config = BenchConfig::try_from(&args)
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let stats = run_benchmark(&config);
    println!("{}", stats.final_report(&config));
    if stats.slot_moves > 0 || stats.shared_slots > 0 {
        return Err(io::Error::other("slot assignment was not stable"));
    }
    Ok(())
}

fn run_benchmark(config: &BenchConfig) -> BenchStats {
    let epoch = Instant::now();
    let mut engine = ChordEngine::new(config.overlay.clone(), epoch);
    let mut windows = NullWindows::default();
    let monitor = FixedMonitor;
    let measure = EstimatedMeasure::default();
    let mut input = InputScript::new(config.seed);
    let mut stats = BenchStats::default();
    let mut previous: HashMap<EntryId, SlotId> = HashMap::new();

    engine.create_surfaces(&mut windows);

    let refresh = config.overlay.refresh_interval;
    let evict = config.overlay.evict_interval;
    let mut now = epoch;
    let mut next_refresh = epoch + refresh;
    let mut next_evict = epoch + evict;
    let started = Instant::now();

    for _ in 0..config.events {
        now += config.step;
        while next_refresh <= now || next_evict <= now {
            if next_refresh <= next_evict {
                stats.expired += engine.refresh(next_refresh).len() as u64;
                if let Some(report) = engine.reconcile(&mut windows, &monitor, &measure) {
                    stats.reconciles += 1;
                    stats.commands += report.commands as u64;
                    stats.failed += report.failed as u64;
                }
                stats.check_assignment(&engine, &mut previous);
                next_refresh += refresh;
            } else {
                stats.expired += engine.evict(next_evict).len() as u64;
                next_evict += evict;
            }
        }

        let event = input.next_event();
        match engine.handle_input(&event, now) {
            PushOutcome::Created(_) => stats.created += 1,
            PushOutcome::Merged(_) => stats.merged += 1,
            PushOutcome::Ignored => stats.ignored += 1,
        }
        stats.events += 1;
        stats.max_live = stats.max_live.max(engine.stack().len());
    }

    engine.shutdown(&mut windows);
    stats.elapsed = started.elapsed();
    stats.simulated = now.duration_since(epoch);
    stats.surface_calls = windows.calls;
    stats
}

/// Window system that only counts calls.
#[derive(Default)]
struct NullWindows {
    calls: u64,
}

impl WindowSystem for NullWindows {
    fn create(&mut self, _slot: SlotId) -> Result<(), SurfaceError> {
        self.calls += 1;
        Ok(())
    }

    fn set_position(&mut self, _slot: SlotId, _position: Position) -> Result<(), SurfaceError> {
        self.calls += 1;
        Ok(())
    }

    fn set_size(&mut self, _slot: SlotId, _size: Size) -> Result<(), SurfaceError> {
        self.calls += 1;
        Ok(())
    }

    fn show(&mut self, _slot: SlotId) -> Result<(), SurfaceError> {
        self.calls += 1;
        Ok(())
    }

    fn hide(&mut self, _slot: SlotId) -> Result<(), SurfaceError> {
        self.calls += 1;
        Ok(())
    }

    fn send_to_slot(&mut self, _slot: SlotId, _message: SlotMessage) -> Result<(), SurfaceError> {
        self.calls += 1;
        Ok(())
    }
}

struct FixedMonitor;

impl MonitorSource for FixedMonitor {
    fn primary_monitor(&self) -> Option<Monitor> {
        Some(Monitor {
            width: 1920,
            height: 1080,
            scale_factor: 1.0,
        })
    }
}

/// Plausible typing: modifiers are held across a few keys, keys are tapped,
/// buttons are clicked and the wheel spins now and then.
struct InputScript {
    state: u64,
    held: Vec<&'static str>,
    pending_release: Option<&'static str>,
}

impl InputScript {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0xA5A5_A5A5_1234_5678,
            held: Vec::new(),
            pending_release: None,
        }
    }

    fn next(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.next() as usize % items.len()]
    }

    fn next_event(&mut self) -> RawInputEvent {
        if let Some(id) = self.pending_release.take() {
            return if BUTTONS.contains(&id) {
                RawInputEvent::button_release(id)
            } else {
                RawInputEvent::key_release(id)
            };
        }
        match self.next() % 20 {
            0..=2 => {
                let modifier = self.pick(&MODIFIERS);
                if let Some(idx) = self.held.iter().position(|m| *m == modifier) {
                    self.held.swap_remove(idx);
                    RawInputEvent::key_release(modifier)
                } else {
                    self.held.push(modifier);
                    RawInputEvent::key_press(modifier)
                }
            }
            3 => {
                let button = self.pick(&BUTTONS);
                self.pending_release = Some(button);
                RawInputEvent::button_press(button)
            }
            4 => {
                let up = self.next() % 2 == 0;
                RawInputEvent::wheel(0.0, if up { 1.0 } else { -1.0 })
            }
            _ => {
                let key = self.pick(&KEYS);
                self.pending_release = Some(key);
                RawInputEvent::key_press(key)
            }
        }
    }
}

#[derive(Default)]
struct BenchStats {
    events: u64,
    created: u64,
    merged: u64,
    ignored: u64,
    expired: u64,
    reconciles: u64,
    commands: u64,
    failed: u64,
    surface_calls: u64,
    max_live: usize,
    slot_moves: u64,
    shared_slots: u64,
    elapsed: Duration,
    simulated: Duration,
}

impl BenchStats {
    /// Count live entries that changed slot since the previous tick and slots
    /// bound to more than one entry.
    fn check_assignment(&mut self, engine: &ChordEngine, previous: &mut HashMap<EntryId, SlotId>) {
        let mut current = HashMap::new();
        let mut used = Vec::new();
        for (entry, slot) in engine.assignment().iter() {
            if previous.get(entry).is_some_and(|prev| *prev != slot) {
                self.slot_moves += 1;
            }
            if used.contains(&slot) {
                self.shared_slots += 1;
            }
            used.push(slot);
            current.insert(entry.clone(), slot);
        }
        *previous = current;
    }

    fn events_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.events as f64 / secs
        } else {
            0.0
        }
    }

    fn final_report(&self, config: &BenchConfig) -> String {
        indoc::formatdoc!(
            r#"
            Chord bench finished (seed {seed}).
            Events: {events} in {elapsed:.3}s (~{rate:.0}/s), {simulated:.1}s simulated
            Pushes: {created} created | {merged} merged | {ignored} ignored
            Cards expired: {expired} | Peak live: {max_live}/{cap}
            Reconciles: {reconciles} | Commands: {commands} ({failed} failed) | Surface calls: {calls}
            Slot moves: {moves} | Shared slots: {shared}
            "#,
            seed = config.seed,
            events = self.events,
            elapsed = self.elapsed.as_secs_f64(),
            rate = self.events_per_second(),
            simulated = self.simulated.as_secs_f64(),
            created = self.created,
            merged = self.merged,
            ignored = self.ignored,
            expired = self.expired,
            max_live = self.max_live,
            cap = config.overlay.stack_max_size,
            reconciles = self.reconciles,
            commands = self.commands,
            failed = self.failed,
            calls = self.surface_calls,
            moves = self.slot_moves,
            shared = self.shared_slots,
        )
    }
}

fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
