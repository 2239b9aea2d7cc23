use std::time::{Duration, Instant};

use chord_overlay::chord::{ChordTracker, PushOutcome, Stack, WHEEL_DOWN, WHEEL_UP};
use chord_overlay::drivers::utils::keyboard_normalizer::label;
use chord_overlay::input::RawInputEvent;

const LIVE: Duration = Duration::from_millis(3000);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

struct Session {
    t0: Instant,
    tracker: ChordTracker,
    stack: Stack,
}

impl Session {
    fn new() -> Self {
        let t0 = Instant::now();
        Self {
            t0,
            tracker: ChordTracker::new(),
            stack: Stack::new(6, LIVE, t0),
        }
    }

    fn at(&self, offset_ms: u64) -> Instant {
        self.t0 + ms(offset_ms)
    }

    fn feed(&mut self, event: RawInputEvent, offset_ms: u64) -> PushOutcome {
        let now = self.at(offset_ms);
        let snapshot = self.tracker.apply(&event);
        self.stack.push(&snapshot, self.tracker.state(), now)
    }

    fn chords(&self) -> Vec<String> {
        self.stack.entries().iter().map(|e| e.joined()).collect()
    }
}

#[test]
fn label_examples() {
    assert_eq!(label("Return"), "Enter");
    assert_eq!(label("KeyA"), "A");
    assert_eq!(label("NumArrow"), "Arrow");
    assert_eq!(label("Num7"), "7");
    assert_eq!(label("UpArrow"), "Up");
    assert_eq!(label("NumLock"), "Lock");
    assert_eq!(label("KpReturn"), "Return");
    assert_eq!(label("SomethingNew"), "SomethingNew");
    assert_eq!(label("KeyA"), label("KeyA"));
}

#[test]
fn ctrl_a_leaves_ctrl_card_then_one_merged_ctrl_a_card() {
    let mut s = Session::new();
    let first = s.feed(RawInputEvent::key_press("ControlLeft"), 0);
    let PushOutcome::Created(ctrl) = first else {
        panic!("expected a new entry, got {first:?}");
    };
    let created = s.feed(RawInputEvent::key_press("KeyA"), 40);
    let PushOutcome::Created(id) = created else {
        panic!("expected a new entry, got {created:?}");
    };
    assert_eq!(id.chord(), "Ctrl A");

    assert_eq!(
        s.feed(RawInputEvent::key_release("KeyA"), 120),
        PushOutcome::Merged(id.clone())
    );
    // Everything released: nothing to show, the card stays as it was.
    assert_eq!(
        s.feed(RawInputEvent::key_release("ControlLeft"), 180),
        PushOutcome::Ignored
    );

    // The lone Ctrl press gets its own card; Ctrl A never merges into it.
    assert_eq!(s.chords(), vec!["Ctrl", "Ctrl A"]);
    let top = s.stack.top().unwrap();
    assert_eq!(top.id, id);
    assert_eq!(top.labels().collect::<Vec<_>>(), vec!["Ctrl", "A"]);
    assert!(top.keys.iter().all(|k| !k.pressed || k.label == "Ctrl"));

    // The Ctrl card was last touched at 0ms, Ctrl A at the 120ms merge.
    assert!(s.stack.tick(s.at(3000)).is_empty());
    assert_eq!(s.stack.tick(s.at(3001)), vec![ctrl]);
    assert!(s.stack.tick(s.at(120 + 3000)).is_empty());
    assert_eq!(s.stack.tick(s.at(120 + 3001)), vec![id]);
    assert!(s.stack.is_empty());
}

#[test]
fn six_distinct_presses_then_seventh_evicts_first() {
    let mut s = Session::new();
    let keys = ["KeyQ", "KeyW", "KeyE", "KeyR", "KeyT", "KeyY"];
    for (i, key) in keys.iter().enumerate() {
        let t = i as u64 * 20;
        s.feed(RawInputEvent::key_press(*key), t);
        s.feed(RawInputEvent::key_release(*key), t + 10);
    }
    assert_eq!(s.chords(), vec!["Q", "W", "E", "R", "T", "Y"]);

    s.feed(RawInputEvent::key_press("KeyU"), 200);
    assert_eq!(s.chords(), vec!["W", "E", "R", "T", "Y", "U"]);
}

#[test]
fn repeated_identical_chord_never_grows_the_stack() {
    let mut s = Session::new();
    s.feed(RawInputEvent::key_press("ShiftLeft"), 0);
    for i in 1..50 {
        // Auto-repeat of a held key re-sends the press.
        let outcome = s.feed(RawInputEvent::key_press("ShiftLeft"), i * 50);
        assert!(matches!(outcome, PushOutcome::Merged(_)));
        assert_eq!(s.stack.len(), 1);
    }
    let top = s.stack.top().unwrap();
    assert_eq!(top.last_activity_at, s.at(49 * 50));
}

#[test]
fn stack_never_exceeds_cap_for_mixed_input() {
    let mut s = Session::new();
    let script = [
        RawInputEvent::key_press("ControlLeft"),
        RawInputEvent::key_press("KeyC"),
        RawInputEvent::key_release("KeyC"),
        RawInputEvent::key_press("KeyV"),
        RawInputEvent::key_release("KeyV"),
        RawInputEvent::key_release("ControlLeft"),
        RawInputEvent::button_press("Left"),
        RawInputEvent::button_release("Left"),
        RawInputEvent::wheel(0.0, 3.0),
        RawInputEvent::wheel(0.0, -3.0),
        RawInputEvent::key_press("Alt"),
        RawInputEvent::key_press("Tab"),
        RawInputEvent::key_release("Tab"),
        RawInputEvent::key_release("Alt"),
    ];
    for round in 0..20u64 {
        for (i, event) in script.iter().enumerate() {
            s.feed(event.clone(), round * 1000 + i as u64 * 10);
            assert!(s.stack.len() <= 6);
        }
    }
}

#[test]
fn eviction_is_strictly_after_live_time() {
    let mut s = Session::new();
    s.feed(RawInputEvent::key_press("KeyZ"), 0);
    s.feed(RawInputEvent::key_release("KeyZ"), 0);
    s.feed(RawInputEvent::key_press("KeyX"), 1000);
    assert!(s.stack.tick(s.at(3000)).is_empty());
    assert_eq!(s.stack.tick(s.at(3001)).len(), 1);
    assert_eq!(s.chords(), vec!["X"]);
    assert!(s.stack.tick(s.at(4000)).is_empty());
    assert_eq!(s.stack.tick(s.at(4001)).len(), 1);
}

#[test]
fn wheel_labels_are_single_event_pulses() {
    let mut tracker = ChordTracker::new();
    let snapshot = tracker.apply(&RawInputEvent::wheel(0.0, -5.0));
    assert_eq!(snapshot.labels().collect::<Vec<_>>(), vec![WHEEL_DOWN]);
    assert!(tracker.state().is_pressed(WHEEL_DOWN));
    assert!(!tracker.state().is_pressed(WHEEL_UP));

    let snapshot = tracker.apply(&RawInputEvent::key_press("KeyK"));
    assert_eq!(snapshot.labels().collect::<Vec<_>>(), vec!["K"]);
    assert!(!tracker.state().is_pressed(WHEEL_DOWN));
    assert!(!tracker.state().is_pressed(WHEEL_UP));
}

#[test]
fn held_button_keeps_card_alive_through_refresh() {
    let mut s = Session::new();
    s.feed(RawInputEvent::button_press("Left"), 0);
    let sticky = ["LeftClick", "RightClick", "WheelClick"];
    for t in (100..=5000).step_by(100) {
        assert!(s.stack.refresh_top(s.at(t), s.tracker.state(), &sticky));
        assert!(s.stack.tick(s.at(t)).is_empty());
    }
    s.feed(RawInputEvent::button_release("Left"), 5050);
    assert!(!s.stack.refresh_top(s.at(5100), s.tracker.state(), &sticky));
    assert!(!s.stack.top().unwrap().keys[0].pressed);
    assert_eq!(s.stack.tick(s.at(8101)).len(), 1);
}
